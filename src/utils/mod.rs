pub mod hash;
pub mod ip;
pub mod origin;
pub mod password;
pub mod slug;
pub mod url_validator;

pub use hash::{hash_editor_token, hash_ip, hash_user_agent, sha256_hex};
pub use slug::{
    generate_editor_token, generate_slug, is_reserved_slug, is_valid_slug, normalize_slug,
};
pub use url_validator::{UrlValidationError, extract_domain, validate_url};
