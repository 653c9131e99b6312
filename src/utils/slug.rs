//! Slug 与编辑令牌
//!
//! slug 统一小写，生成时使用 base58 字母表中的小写子集；
//! 编辑令牌为 24 字节随机数的 base58 编码。

/// 与内部路由冲突的保留 slug
pub const RESERVED_SLUGS: &[&str] = &[
    "_next",
    "api",
    "qr",
    "short",
    "l",
    "lp",
    "slp",
    "s",
    "e",
    "health",
    "favicon.ico",
];

/// 生成 slug 的长度
pub const GENERATED_SLUG_LEN: usize = 8;

/// slug 最大长度
pub const MAX_SLUG_LEN: usize = 64;

/// 编辑令牌的随机字节数
const EDITOR_TOKEN_BYTES: usize = 24;

/// base58 字母表中的数字与小写字母（去掉易混淆的 0 和 l）
const SLUG_ALPHABET: &[u8] = b"123456789abcdefghijkmnopqrstuvwxyz";

pub fn is_reserved_slug(slug: &str) -> bool {
    RESERVED_SLUGS.contains(&slug.to_ascii_lowercase().as_str())
}

/// 校验 slug 格式：小写字母、数字、`-`、`_`，首字符为字母或数字
pub fn is_valid_slug(slug: &str) -> bool {
    if slug.is_empty() || slug.len() > MAX_SLUG_LEN {
        return false;
    }
    let mut chars = slug.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if !(first.is_ascii_lowercase() || first.is_ascii_digit()) {
        return false;
    }
    chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_')
}

/// 规范化用户输入的 slug（去空白、转小写）
pub fn normalize_slug(raw: &str) -> String {
    raw.trim().to_lowercase()
}

pub fn generate_slug() -> String {
    std::iter::repeat_with(|| SLUG_ALPHABET[rand::random_range(0..SLUG_ALPHABET.len())] as char)
        .take(GENERATED_SLUG_LEN)
        .collect()
}

pub fn generate_editor_token() -> String {
    let bytes: [u8; EDITOR_TOKEN_BYTES] = rand::random();
    bs58::encode(bytes).into_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reserved_slugs() {
        for slug in ["api", "l", "lp", "slp", "_next", "favicon.ico", "API"] {
            assert!(is_reserved_slug(slug), "{} should be reserved", slug);
        }
        assert!(!is_reserved_slug("promo"));
    }

    #[test]
    fn test_valid_slug_shape() {
        assert!(is_valid_slug("promo-2026"));
        assert!(is_valid_slug("a"));
        assert!(is_valid_slug("9lives_x"));
        assert!(!is_valid_slug(""));
        assert!(!is_valid_slug("Promo"));
        assert!(!is_valid_slug("-lead"));
        assert!(!is_valid_slug("has space"));
        assert!(!is_valid_slug("a/b"));
        assert!(!is_valid_slug(&"a".repeat(MAX_SLUG_LEN + 1)));
    }

    #[test]
    fn test_generated_slug_is_valid() {
        for _ in 0..50 {
            let slug = generate_slug();
            assert_eq!(slug.len(), GENERATED_SLUG_LEN);
            assert!(is_valid_slug(&slug));
            assert!(!is_reserved_slug(&slug));
        }
    }

    #[test]
    fn test_editor_token_decodes_to_24_bytes() {
        let token = generate_editor_token();
        let decoded = bs58::decode(&token).into_vec().expect("valid base58");
        assert_eq!(decoded.len(), 24);
        assert_ne!(token, generate_editor_token());
    }

    #[test]
    fn test_normalize_slug() {
        assert_eq!(normalize_slug("  MyPromo "), "mypromo");
    }
}
