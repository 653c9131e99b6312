//! 反向代理后的站点 origin 重建
//!
//! host：x-forwarded-host → cf-connecting-host → host
//! scheme：cf-visitor JSON 的 scheme → x-forwarded-proto → 请求 URI 的 scheme → https

use actix_web::HttpRequest;
use actix_web::http::header::HeaderMap;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct CfVisitor {
    scheme: Option<String>,
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn normalize_scheme(raw: &str) -> Option<String> {
    let scheme = raw.split(',').next()?.trim().to_ascii_lowercase();
    matches!(scheme.as_str(), "http" | "https").then_some(scheme)
}

/// 对外可见的 host（可能带端口）
pub fn forwarded_host(headers: &HeaderMap) -> Option<String> {
    ["x-forwarded-host", "cf-connecting-host", "host"]
        .iter()
        .find_map(|name| header_str(headers, name))
        .and_then(|value| value.split(',').next())
        .map(|host| host.trim().to_string())
        .filter(|host| !host.is_empty())
}

/// 对外可见的 scheme
///
/// cf-visitor 解析失败时忽略，继续后面的来源。
pub fn forwarded_scheme(headers: &HeaderMap, uri_scheme: Option<&str>) -> String {
    header_str(headers, "cf-visitor")
        .and_then(|raw| serde_json::from_str::<CfVisitor>(raw).ok())
        .and_then(|visitor| visitor.scheme)
        .and_then(|s| normalize_scheme(&s))
        .or_else(|| header_str(headers, "x-forwarded-proto").and_then(normalize_scheme))
        .or_else(|| uri_scheme.and_then(normalize_scheme))
        .unwrap_or_else(|| "https".to_string())
}

/// 从请求头重建 origin；没有 host 时返回 None
pub fn origin_from_headers(headers: &HeaderMap, uri_scheme: Option<&str>) -> Option<String> {
    let host = forwarded_host(headers)?;
    Some(format!("{}://{}", forwarded_scheme(headers, uri_scheme), host))
}

/// 从 HttpRequest 重建 origin
pub fn request_origin(req: &HttpRequest) -> Option<String> {
    origin_from_headers(req.headers(), req.uri().scheme_str())
}

/// 把路径拼接成绝对地址；origin 缺失时返回相对路径
pub fn absolute_url(origin: Option<&str>, path: &str) -> String {
    match origin {
        Some(origin) => format!("{}{}", origin.trim_end_matches('/'), path),
        None => path.to_string(),
    }
}

/// origin 是否指向本机（本地开发地址不作为记录的公开 origin）
pub fn is_localhost_origin(origin: &str) -> bool {
    url::Url::parse(origin)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.to_ascii_lowercase()))
        .map(|host| {
            host == "localhost"
                || host.ends_with(".localhost")
                || host == "127.0.0.1"
                || host == "[::1]"
                || host == "0.0.0.0"
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::header::{HeaderName, HeaderValue};

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (k, v) in pairs {
            map.insert(HeaderName::from_static(k), HeaderValue::from_static(v));
        }
        map
    }

    #[test]
    fn test_forwarded_host_precedence() {
        let h = headers(&[
            ("x-forwarded-host", "edge.example.com"),
            ("cf-connecting-host", "cdn.example.com"),
            ("host", "internal:8080"),
        ]);
        assert_eq!(forwarded_host(&h).as_deref(), Some("edge.example.com"));

        let h = headers(&[
            ("cf-connecting-host", "cdn.example.com"),
            ("host", "internal:8080"),
        ]);
        assert_eq!(forwarded_host(&h).as_deref(), Some("cdn.example.com"));

        let h = headers(&[("host", "internal:8080")]);
        assert_eq!(forwarded_host(&h).as_deref(), Some("internal:8080"));
    }

    #[test]
    fn test_cf_visitor_wins_over_forwarded_proto() {
        let h = headers(&[
            ("cf-visitor", r#"{"scheme":"http"}"#),
            ("x-forwarded-proto", "https"),
        ]);
        assert_eq!(forwarded_scheme(&h, None), "http");
    }

    #[test]
    fn test_malformed_cf_visitor_is_ignored() {
        let h = headers(&[("cf-visitor", "{not json"), ("x-forwarded-proto", "http")]);
        assert_eq!(forwarded_scheme(&h, Some("https")), "http");
    }

    #[test]
    fn test_scheme_falls_back_to_uri_then_https() {
        let h = HeaderMap::new();
        assert_eq!(forwarded_scheme(&h, Some("http")), "http");
        assert_eq!(forwarded_scheme(&h, None), "https");
    }

    #[test]
    fn test_origin_requires_host() {
        assert_eq!(origin_from_headers(&HeaderMap::new(), Some("http")), None);
        let h = headers(&[("host", "qr.example.com")]);
        assert_eq!(
            origin_from_headers(&h, None).as_deref(),
            Some("https://qr.example.com")
        );
    }

    #[test]
    fn test_absolute_url() {
        assert_eq!(
            absolute_url(Some("https://a.example/"), "/lp/abc"),
            "https://a.example/lp/abc"
        );
        assert_eq!(absolute_url(None, "/lp/abc"), "/lp/abc");
    }

    #[test]
    fn test_localhost_detection() {
        assert!(is_localhost_origin("http://localhost:3000"));
        assert!(is_localhost_origin("http://127.0.0.1:8080"));
        assert!(!is_localhost_origin("https://qr.example.com"));
        assert!(!is_localhost_origin("not a url"));
    }
}
