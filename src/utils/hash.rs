//! 哈希工具
//!
//! 扫描事件只保存哈希值，编辑令牌也只保存哈希值。

use sha2::{Digest, Sha256};

/// IP 缺失时参与哈希的占位值
pub const UNKNOWN_IP: &str = "unknown";

/// 计算 SHA-256 并输出小写十六进制
pub fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// 对客户端 IP 加盐哈希：sha256("{ip}:{salt}")
///
/// IP 缺失时对 "unknown" 哈希，保证事件总有 ip_hash。
pub fn hash_ip(ip: Option<&str>, salt: &str) -> String {
    let ip = ip.map(str::trim).filter(|s| !s.is_empty()).unwrap_or(UNKNOWN_IP);
    sha256_hex(&format!("{}:{}", ip, salt))
}

pub fn hash_user_agent(user_agent: &str) -> String {
    sha256_hex(user_agent)
}

pub fn hash_editor_token(token: &str) -> String {
    sha256_hex(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_known_vector() {
        assert_eq!(
            sha256_hex("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_hash_ip_deterministic_for_same_salt() {
        let a = hash_ip(Some("203.0.113.7"), "salt-1");
        let b = hash_ip(Some("203.0.113.7"), "salt-1");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert!(!a.contains("203.0.113.7"));
    }

    #[test]
    fn test_hash_ip_differs_across_salts() {
        assert_ne!(
            hash_ip(Some("203.0.113.7"), "salt-1"),
            hash_ip(Some("203.0.113.7"), "salt-2")
        );
    }

    #[test]
    fn test_hash_ip_matches_salted_format() {
        assert_eq!(
            hash_ip(Some("10.0.0.1"), "pepper"),
            sha256_hex("10.0.0.1:pepper")
        );
    }

    #[test]
    fn test_missing_ip_hashes_unknown() {
        assert_eq!(hash_ip(None, "s"), sha256_hex("unknown:s"));
        assert_eq!(hash_ip(Some("  "), "s"), sha256_hex("unknown:s"));
    }
}
