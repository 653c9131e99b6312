//! 公开跳转
//!
//! `/{slug}`、`/s/{slug}`（短链接）和 `/l/{slug}`（二维码）。
//! 未找到时软跳转到回退地址，数据库故障时返回 503。

use std::sync::Arc;

use actix_web::http::{Method, StatusCode};
use actix_web::{HttpRequest, HttpResponse, web};
use serde::Deserialize;
use tracing::{debug, error, trace};

use crate::analytics::{ScanRecorder, ScanRequest};
use crate::config::StaticConfig;
use crate::resolver::{Resolution, resolve};
use crate::storage::{RecordKind, SeaOrmStorage, ShortRecord};
use crate::utils::ip::extract_client_ip;
use crate::utils::origin::{absolute_url, request_origin};
use crate::utils::{is_reserved_slug, is_valid_slug, normalize_slug};

/// 公开路由的响应设置（启动时从配置生成）
#[derive(Debug, Clone)]
pub struct RedirectSettings {
    pub cache_control: String,
    pub not_found_fallback: String,
    pub trusted_proxies: Vec<String>,
    pub country_header: String,
}

impl RedirectSettings {
    pub fn from_config(config: &StaticConfig) -> Self {
        Self {
            cache_control: format!(
                "public, max-age={}, stale-while-revalidate={}",
                config.redirect.cache_max_age, config.redirect.stale_while_revalidate
            ),
            not_found_fallback: config.redirect.not_found_fallback.clone(),
            trusted_proxies: config.server.trusted_proxies.clone(),
            country_header: config.analytics.country_header.to_ascii_lowercase(),
        }
    }
}

impl Default for RedirectSettings {
    fn default() -> Self {
        Self::from_config(&StaticConfig::default())
    }
}

/// 目的地选择参数 `?destination={id}`
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SelectorQuery {
    pub destination: Option<String>,
}

impl SelectorQuery {
    /// 解析失败时视为没有选择器
    pub fn from_request(req: &HttpRequest) -> Self {
        web::Query::<SelectorQuery>::from_query(req.query_string())
            .map(web::Query::into_inner)
            .unwrap_or_default()
    }
}

/// 公开路由使用的 slug；保留名或格式非法时返回 None
pub fn public_slug(raw: &str) -> Option<String> {
    let slug = normalize_slug(raw);
    (is_valid_slug(&slug) && !is_reserved_slug(&slug)).then_some(slug)
}

pub struct RedirectService;

impl RedirectService {
    pub async fn handle_short(
        req: HttpRequest,
        path: web::Path<String>,
        storage: web::Data<Arc<SeaOrmStorage>>,
        recorder: web::Data<ScanRecorder>,
        settings: web::Data<RedirectSettings>,
    ) -> HttpResponse {
        Self::handle(RecordKind::Short, req, &path, &storage, &recorder, &settings).await
    }

    pub async fn handle_qr(
        req: HttpRequest,
        path: web::Path<String>,
        storage: web::Data<Arc<SeaOrmStorage>>,
        recorder: web::Data<ScanRecorder>,
        settings: web::Data<RedirectSettings>,
    ) -> HttpResponse {
        Self::handle(RecordKind::Qr, req, &path, &storage, &recorder, &settings).await
    }

    async fn handle(
        kind: RecordKind,
        req: HttpRequest,
        raw_slug: &str,
        storage: &SeaOrmStorage,
        recorder: &ScanRecorder,
        settings: &RedirectSettings,
    ) -> HttpResponse {
        let Some(slug) = public_slug(raw_slug) else {
            trace!("Rejected public slug: {}", raw_slug);
            return Self::not_found_response(settings);
        };

        let record = match storage.get_record_by_slug(kind, &slug).await {
            Ok(record) => record,
            Err(e) => {
                error!("Record lookup failed for '{}': {}", slug, e);
                return Self::unavailable_response();
            }
        };

        let selector = SelectorQuery::from_request(&req).destination;
        let resolution = resolve(record.as_ref(), selector.as_deref());
        debug!("Resolved {} '{}' -> {:?}", kind, slug, resolution);

        match (resolution, record) {
            (Resolution::Redirect { url, destination_id }, Some(record)) => {
                Self::record_scan(&req, &record, destination_id, recorder, settings);
                Self::redirect_response(&url, settings)
            }
            (Resolution::Landing { slug }, Some(record)) => {
                Self::record_scan(&req, &record, None, recorder, settings);
                let origin = request_origin(&req);
                let location = absolute_url(origin.as_deref(), &kind.landing_path(&slug));
                Self::redirect_response(&location, settings)
            }
            _ => Self::not_found_response(settings),
        }
    }

    /// 派发扫描事件（HEAD 请求不记录）
    fn record_scan(
        req: &HttpRequest,
        record: &ShortRecord,
        destination_id: Option<String>,
        recorder: &ScanRecorder,
        settings: &RedirectSettings,
    ) {
        if req.method() == Method::HEAD || !recorder.is_enabled() {
            return;
        }

        let header = |name: &str| {
            req.headers()
                .get(name)
                .and_then(|h| h.to_str().ok())
                .map(String::from)
        };

        recorder.record(ScanRequest {
            record_id: record.id.clone(),
            slug: record.slug.clone(),
            client_ip: extract_client_ip(req, &settings.trusted_proxies),
            user_agent: header("user-agent"),
            referrer: header("referer"),
            country_hint: header(&settings.country_header),
            destination_id,
        });
    }

    pub fn redirect_response(location: &str, settings: &RedirectSettings) -> HttpResponse {
        HttpResponse::build(StatusCode::FOUND)
            .insert_header(("Location", location))
            .insert_header(("Cache-Control", settings.cache_control.as_str()))
            .finish()
    }

    /// 公开路由未找到：软跳转到回退地址
    pub fn not_found_response(settings: &RedirectSettings) -> HttpResponse {
        HttpResponse::build(StatusCode::FOUND)
            .insert_header(("Location", settings.not_found_fallback.as_str()))
            .insert_header(("Cache-Control", "no-store"))
            .finish()
    }

    pub fn unavailable_response() -> HttpResponse {
        HttpResponse::build(StatusCode::SERVICE_UNAVAILABLE)
            .insert_header(("Content-Type", "text/plain; charset=utf-8"))
            .insert_header(("Cache-Control", "no-store"))
            .body("Service Unavailable")
    }
}

/// 公开跳转路由配置
///
/// `/{slug}` 必须最后注册，避免吞掉其他路由。
pub fn redirect_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/s/{slug}", web::get().to(RedirectService::handle_short))
        .route("/s/{slug}", web::head().to(RedirectService::handle_short))
        .route("/l/{slug}", web::get().to(RedirectService::handle_qr))
        .route("/l/{slug}", web::head().to(RedirectService::handle_qr))
        .route("/{slug}", web::get().to(RedirectService::handle_short))
        .route("/{slug}", web::head().to(RedirectService::handle_short));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_slug() {
        assert_eq!(public_slug(" Promo ").as_deref(), Some("promo"));
        assert_eq!(public_slug("api"), None);
        assert_eq!(public_slug("favicon.ico"), None);
        assert_eq!(public_slug("bad slug"), None);
        assert_eq!(public_slug(""), None);
    }

    #[test]
    fn test_settings_from_config() {
        let mut config = StaticConfig::default();
        config.redirect.cache_max_age = 120;
        config.redirect.stale_while_revalidate = 30;
        config.analytics.country_header = "CF-IPCountry".to_string();

        let settings = RedirectSettings::from_config(&config);
        assert_eq!(
            settings.cache_control,
            "public, max-age=120, stale-while-revalidate=30"
        );
        assert_eq!(settings.country_header, "cf-ipcountry");
    }

    #[test]
    fn test_selector_query_is_lenient() {
        let req = actix_web::test::TestRequest::get()
            .uri("/abc?destination=d1&utm_source=x")
            .to_http_request();
        assert_eq!(
            SelectorQuery::from_request(&req).destination.as_deref(),
            Some("d1")
        );

        let req = actix_web::test::TestRequest::get()
            .uri("/abc")
            .to_http_request();
        assert!(SelectorQuery::from_request(&req).destination.is_none());
    }
}
