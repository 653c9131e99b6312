//! IP 地址处理工具
//!
//! 提供统一的客户端 IP 提取功能，支持：
//! - 可信代理配置（trusted_proxies）
//! - CIDR 匹配
//! - 私有 IP 自动检测

use std::net::{IpAddr, SocketAddr};

use actix_web::HttpRequest;
use actix_web::http::header::HeaderMap;
use tracing::debug;

/// 检查 IP 是否为私有地址或 localhost
pub fn is_private_or_local(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => v4.is_private() || v4.is_loopback() || v4.is_link_local(),
        IpAddr::V6(v6) => {
            // IPv6 私有地址：
            // - fc00::/7 (ULA, RFC 4193)
            // - fe80::/10 (Link-local)
            // - ::1 (Loopback)
            v6.is_loopback()
                || (v6.segments()[0] & 0xfe00) == 0xfc00
                || (v6.segments()[0] & 0xffc0) == 0xfe80
        }
    }
}

/// 字符串形式的 IP 是否为私有地址；无法解析时返回 false
pub fn is_private_ip_str(ip: &str) -> bool {
    ip.parse::<IpAddr>()
        .map(|addr| is_private_or_local(&addr))
        .unwrap_or(false)
}

/// 检查 IP 是否在可信代理列表中
pub fn is_trusted_proxy(ip: &str, trusted_proxies: &[String]) -> bool {
    // 先尝试解析为 SocketAddr（支持 ip:port），如果失败再尝试纯 IpAddr
    let ip_addr = if let Ok(socket_addr) = ip.parse::<SocketAddr>() {
        socket_addr.ip()
    } else if let Ok(ip_addr) = ip.parse::<IpAddr>() {
        ip_addr
    } else {
        return false;
    };

    trusted_proxies.iter().any(|proxy| {
        if proxy.contains('/') {
            ip_in_cidr(&ip_addr, proxy)
        } else {
            proxy
                .parse::<IpAddr>()
                .map(|proxy_addr| proxy_addr == ip_addr)
                .unwrap_or(false)
        }
    })
}

/// CIDR 检查
pub fn ip_in_cidr(ip: &IpAddr, cidr: &str) -> bool {
    let Some((network, prefix_len)) = cidr.split_once('/') else {
        return false;
    };

    let Ok(prefix_len): Result<u8, _> = prefix_len.parse() else {
        return false;
    };

    let Ok(network_addr) = network.parse::<IpAddr>() else {
        return false;
    };

    match (ip, network_addr) {
        (IpAddr::V4(ip), IpAddr::V4(net)) => {
            if prefix_len > 32 {
                return false;
            }
            let mask = u32::MAX.checked_shl(32 - prefix_len as u32).unwrap_or(0);
            let ip_bits = u32::from_be_bytes(ip.octets());
            let net_bits = u32::from_be_bytes(net.octets());
            (ip_bits & mask) == (net_bits & mask)
        }
        (IpAddr::V6(ip), IpAddr::V6(net)) => {
            if prefix_len > 128 {
                return false;
            }
            let mask = u128::MAX.checked_shl(128 - prefix_len as u32).unwrap_or(0);
            let ip_bits = u128::from_be_bytes(ip.octets());
            let net_bits = u128::from_be_bytes(net.octets());
            (ip_bits & mask) == (net_bits & mask)
        }
        _ => false,
    }
}

/// 由连接地址和请求头决定客户端 IP（核心逻辑）
///
/// 策略（按优先级）：
/// 1. 显式配置 trusted_proxies 且匹配 → 使用转发头
/// 2. 未配置 trusted_proxies 且连接来自私有 IP → 自动检测代理，使用转发头
/// 3. 默认 → 使用连接 IP（公网直连场景，防止伪造）
pub fn resolve_client_ip(
    peer_ip: Option<IpAddr>,
    headers: &HeaderMap,
    trusted_proxies: &[String],
) -> Option<String> {
    let Some(peer_ip) = peer_ip else {
        // 无连接信息（例如测试环境），只能相信转发头
        return extract_forwarded_ip_from_headers(headers);
    };
    let peer_str = peer_ip.to_string();

    if !trusted_proxies.is_empty() {
        if is_trusted_proxy(&peer_str, trusted_proxies) {
            let real_ip = extract_forwarded_ip_from_headers(headers).unwrap_or(peer_str.clone());
            debug!("Trusted proxy (explicit): {} -> {}", peer_str, real_ip);
            return Some(real_ip);
        }
        debug!(
            "Connection from {}, not in trusted_proxies, using peer IP",
            peer_str
        );
        return Some(peer_str);
    }

    if is_private_or_local(&peer_ip)
        && let Some(real_ip) = extract_forwarded_ip_from_headers(headers)
    {
        debug!(
            "Auto-detect proxy (private IP {}): using forwarded IP {}",
            peer_str, real_ip
        );
        return Some(real_ip);
    }

    Some(peer_str)
}

/// 从 HttpRequest 提取真实客户端 IP
pub fn extract_client_ip(req: &HttpRequest, trusted_proxies: &[String]) -> Option<String> {
    resolve_client_ip(
        req.peer_addr().map(|addr| addr.ip()),
        req.headers(),
        trusted_proxies,
    )
}

/// 从 HeaderMap 提取转发的 IP
///
/// 顺序：cf-connecting-ip → X-Forwarded-For 第一项 → X-Real-IP。
/// 无法解析为 IP 的值会被跳过。
pub fn extract_forwarded_ip_from_headers(headers: &HeaderMap) -> Option<String> {
    let header_ip = |name: &str| -> Option<String> {
        headers
            .get(name)
            .and_then(|h| h.to_str().ok())
            .map(str::trim)
            .filter(|s| s.parse::<IpAddr>().is_ok())
            .map(String::from)
    };

    header_ip("cf-connecting-ip")
        .or_else(|| {
            headers
                .get("x-forwarded-for")
                .and_then(|h| h.to_str().ok())
                .and_then(|s| s.split(',').next())
                .map(str::trim)
                .filter(|s| s.parse::<IpAddr>().is_ok())
                .map(String::from)
        })
        .or_else(|| header_ip("x-real-ip"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::header::{HeaderName, HeaderValue};

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (k, v) in pairs {
            map.insert(
                HeaderName::from_static(k),
                HeaderValue::from_static(v),
            );
        }
        map
    }

    #[test]
    fn test_is_private_or_local_ipv4() {
        assert!(is_private_or_local(&"10.0.0.1".parse().unwrap()));
        assert!(is_private_or_local(&"172.16.0.1".parse().unwrap()));
        assert!(is_private_or_local(&"192.168.1.1".parse().unwrap()));
        assert!(is_private_or_local(&"127.0.0.1".parse().unwrap()));
        assert!(!is_private_or_local(&"8.8.8.8".parse().unwrap()));
        assert!(!is_private_or_local(&"1.1.1.1".parse().unwrap()));
    }

    #[test]
    fn test_is_private_or_local_ipv6() {
        assert!(is_private_or_local(&"::1".parse().unwrap()));
        assert!(is_private_or_local(&"fd00::1".parse().unwrap()));
        assert!(is_private_or_local(&"fe80::1".parse().unwrap()));
        assert!(!is_private_or_local(
            &"2001:4860:4860::8888".parse().unwrap()
        ));
    }

    #[test]
    fn test_ip_in_cidr() {
        let ip: IpAddr = "192.168.1.100".parse().unwrap();
        assert!(ip_in_cidr(&ip, "192.168.1.0/24"));
        assert!(!ip_in_cidr(&ip, "192.168.2.0/24"));
        let ip6: IpAddr = "2001:db8::1".parse().unwrap();
        assert!(ip_in_cidr(&ip6, "2001:db8::/32"));
        assert!(!ip_in_cidr(&ip6, "10.0.0.0/8"));
    }

    #[test]
    fn test_is_trusted_proxy() {
        let proxies = vec!["127.0.0.1".to_string(), "192.168.1.0/24".to_string()];
        assert!(is_trusted_proxy("127.0.0.1", &proxies));
        assert!(is_trusted_proxy("127.0.0.1:8080", &proxies));
        assert!(is_trusted_proxy("192.168.1.50", &proxies));
        assert!(!is_trusted_proxy("8.8.8.8", &proxies));
    }

    #[test]
    fn test_forwarded_header_precedence() {
        let h = headers(&[
            ("cf-connecting-ip", "198.51.100.1"),
            ("x-forwarded-for", "203.0.113.5, 10.0.0.1"),
            ("x-real-ip", "192.0.2.9"),
        ]);
        assert_eq!(
            extract_forwarded_ip_from_headers(&h).as_deref(),
            Some("198.51.100.1")
        );

        let h = headers(&[
            ("x-forwarded-for", "203.0.113.5, 10.0.0.1"),
            ("x-real-ip", "192.0.2.9"),
        ]);
        assert_eq!(
            extract_forwarded_ip_from_headers(&h).as_deref(),
            Some("203.0.113.5")
        );

        let h = headers(&[("x-forwarded-for", "garbage"), ("x-real-ip", "192.0.2.9")]);
        assert_eq!(
            extract_forwarded_ip_from_headers(&h).as_deref(),
            Some("192.0.2.9")
        );
    }

    #[test]
    fn test_public_peer_ignores_forwarded_headers() {
        let h = headers(&[("x-forwarded-for", "203.0.113.5")]);
        let ip = resolve_client_ip(Some("8.8.8.8".parse().unwrap()), &h, &[]);
        assert_eq!(ip.as_deref(), Some("8.8.8.8"));
    }

    #[test]
    fn test_private_peer_auto_detects_proxy() {
        let h = headers(&[("x-forwarded-for", "203.0.113.5")]);
        let ip = resolve_client_ip(Some("10.0.0.2".parse().unwrap()), &h, &[]);
        assert_eq!(ip.as_deref(), Some("203.0.113.5"));
    }

    #[test]
    fn test_explicit_proxy_list_overrides_auto_detect() {
        let h = headers(&[("x-forwarded-for", "203.0.113.5")]);
        let trusted = vec!["172.20.0.0/16".to_string()];

        let via_proxy = resolve_client_ip(Some("172.20.1.1".parse().unwrap()), &h, &trusted);
        assert_eq!(via_proxy.as_deref(), Some("203.0.113.5"));

        // 私有地址但不在列表中 → 不信任转发头
        let direct = resolve_client_ip(Some("10.0.0.2".parse().unwrap()), &h, &trusted);
        assert_eq!(direct.as_deref(), Some("10.0.0.2"));
    }
}
