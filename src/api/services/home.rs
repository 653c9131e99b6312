//! 首页

use actix_web::{HttpResponse, web};

const HOME_PAGE: &str = "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
<title>QR-Gen Studio</title>\n</head>\n<body>\n<h1>QR-Gen Studio</h1>\n\
<p>Dynamic QR codes and short links with multi-destination landing pages.</p>\n\
<ul>\n<li><code>POST /api/short</code> creates a short link</li>\n\
<li><code>POST /api/qr</code> creates a QR code</li>\n</ul>\n</body>\n</html>\n";

pub async fn home() -> HttpResponse {
    HttpResponse::Ok()
        .insert_header(("Content-Type", "text/html; charset=utf-8"))
        .insert_header(("Cache-Control", "public, max-age=300"))
        .body(HOME_PAGE)
}

pub fn home_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(home))
        .route("/", web::head().to(home));
}
