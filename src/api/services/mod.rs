pub mod error_code;
pub mod health;
pub mod helpers;
pub mod home;
pub mod landing;
pub mod qr;
pub mod redirect;
pub mod short;

use actix_web::web;

pub use error_code::ErrorCode;
pub use health::{AppStartTime, HealthService, health_routes};
pub use helpers::{ApiResponse, EDITOR_PASSWORD_HEADER, json_config};
pub use home::home_routes;
pub use landing::{LandingService, landing_routes};
pub use redirect::{RedirectService, RedirectSettings, redirect_routes};

/// 编辑 API 路由 `/api`
pub fn api_routes() -> actix_web::Scope {
    web::scope("/api")
        .service(short::short_routes())
        .service(qr::qr_routes())
}

/// 注册全部路由
///
/// 需要的 app_data：`Arc<SeaOrmStorage>`、`Arc<RecordService>`、`ScanRecorder`、
/// `RedirectSettings`、`AppStartTime`。
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(api_routes())
        .configure(health_routes)
        .configure(home_routes)
        .configure(landing_routes)
        .configure(redirect_routes);
}
