//! 多目的地落地页（`/slp/{slug}` 与 `/lp/{slug}`）
//!
//! 每个目的地的链接都回到公开跳转路由并带上 `?destination=`，
//! 这样访客的选择会记录为 destination 事件。

use std::fmt::Write;
use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, web};
use tracing::error;

use super::redirect::{RedirectService, RedirectSettings, public_slug};
use crate::resolver::sort_destinations;
use crate::storage::{RecordKind, SeaOrmStorage, ShortRecord};

/// HTML 转义
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// 图片地址只接受 http(s)
fn safe_image_url(raw: &str) -> Option<&str> {
    let raw = raw.trim();
    url::Url::parse(raw)
        .ok()
        .filter(|u| matches!(u.scheme(), "http" | "https"))
        .map(|_| raw)
}

/// 渲染落地页
pub fn render_landing_page(record: &ShortRecord) -> String {
    let mut destinations = record.destinations.clone();
    sort_destinations(&mut destinations);

    let title = escape_html(&record.title);
    let public_path = record.kind.public_path(&record.slug);

    let mut html = String::with_capacity(2048);
    let _ = write!(
        html,
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
         <meta name=\"robots\" content=\"noindex\">\n<title>{title}</title>\n\
         <style>body{{font-family:system-ui,sans-serif;max-width:32rem;margin:2rem auto;padding:0 1rem}}\
         ul{{list-style:none;padding:0}}li{{margin:.75rem 0}}\
         a.dest{{display:flex;gap:.75rem;align-items:center;padding:.9rem 1rem;border:1px solid #ddd;\
         border-radius:.75rem;text-decoration:none;color:inherit}}\
         a.dest img{{width:3rem;height:3rem;object-fit:cover;border-radius:.5rem}}\
         .hero{{width:100%;border-radius:1rem}}</style>\n</head>\n<body>\n"
    );

    if let Some(hero) = record.hero_image.as_deref().and_then(safe_image_url) {
        let _ = writeln!(
            html,
            "<img class=\"hero\" src=\"{}\" alt=\"\">",
            escape_html(hero)
        );
    }
    let _ = writeln!(html, "<h1>{title}</h1>\n<ul>");

    for dest in &destinations {
        let id: String = url::form_urlencoded::byte_serialize(dest.id.as_bytes()).collect();
        let href = format!("{}?destination={}", public_path, id);
        let _ = write!(
            html,
            "<li><a class=\"dest\" rel=\"nofollow\" href=\"{}\">",
            escape_html(&href)
        );
        if let Some(image) = dest.image.as_deref().and_then(safe_image_url) {
            let _ = write!(html, "<img src=\"{}\" alt=\"\">", escape_html(image));
        }
        let _ = writeln!(html, "<span>{}</span></a></li>", escape_html(&dest.title));
    }

    html.push_str("</ul>\n</body>\n</html>\n");
    html
}

pub struct LandingService;

impl LandingService {
    pub async fn short_landing(
        path: web::Path<String>,
        storage: web::Data<Arc<SeaOrmStorage>>,
        settings: web::Data<RedirectSettings>,
    ) -> HttpResponse {
        Self::handle(RecordKind::Short, &path, &storage, &settings).await
    }

    pub async fn qr_landing(
        path: web::Path<String>,
        storage: web::Data<Arc<SeaOrmStorage>>,
        settings: web::Data<RedirectSettings>,
    ) -> HttpResponse {
        Self::handle(RecordKind::Qr, &path, &storage, &settings).await
    }

    async fn handle(
        kind: RecordKind,
        raw_slug: &str,
        storage: &SeaOrmStorage,
        settings: &RedirectSettings,
    ) -> HttpResponse {
        let Some(slug) = public_slug(raw_slug) else {
            return RedirectService::not_found_response(settings);
        };

        match storage.get_record_by_slug(kind, &slug).await {
            Ok(Some(record)) if !record.destinations.is_empty() => {
                HttpResponse::build(StatusCode::OK)
                    .insert_header(("Content-Type", "text/html; charset=utf-8"))
                    .insert_header(("Cache-Control", settings.cache_control.as_str()))
                    .body(render_landing_page(&record))
            }
            Ok(_) => RedirectService::not_found_response(settings),
            Err(e) => {
                error!("Landing lookup failed for '{}': {}", slug, e);
                RedirectService::unavailable_response()
            }
        }
    }
}

pub fn landing_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/slp/{slug}", web::get().to(LandingService::short_landing))
        .route("/lp/{slug}", web::get().to(LandingService::qr_landing));
}
