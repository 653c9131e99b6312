//! 短链接编辑 API

use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, web};
use std::sync::Arc;
use tracing::{info, trace};

use crate::services::{RecordService, SaveShortLinkRequest};
use crate::storage::RecordKind;
use crate::utils::origin::request_origin;

use super::error_code::ErrorCode;
use super::helpers::{
    editor_password, error_from_studio, error_response, json_response, success_response,
};

/// 创建或更新短链接（请求体带 editor_token 时为更新）
pub async fn save_short_link(
    req: HttpRequest,
    body: web::Json<SaveShortLinkRequest>,
    service: web::Data<Arc<RecordService>>,
) -> HttpResponse {
    trace!("Editor API: save short link");
    let origin = request_origin(&req);

    match service.save_short_link(body.into_inner(), origin.as_deref()).await {
        Ok(result) if result.created => {
            info!("Editor API: short link created: {}", result.slug);
            json_response(StatusCode::CREATED, ErrorCode::Success, "Created", Some(result))
        }
        Ok(result) => success_response(result),
        Err(e) => error_from_studio(&e),
    }
}

/// 编辑视图
pub async fn get_short_link(
    req: HttpRequest,
    token: web::Path<String>,
    service: web::Data<Arc<RecordService>>,
) -> HttpResponse {
    let origin = request_origin(&req);
    match service
        .editor_view(RecordKind::Short, &token, origin.as_deref())
        .await
    {
        Ok(Some(view)) => success_response(view),
        Ok(None) => error_response(
            StatusCode::NOT_FOUND,
            ErrorCode::RecordNotFound,
            "Short link not found",
        ),
        Err(e) => error_from_studio(&e),
    }
}

/// 软删除
pub async fn archive_short_link(
    req: HttpRequest,
    token: web::Path<String>,
    service: web::Data<Arc<RecordService>>,
) -> HttpResponse {
    let password = editor_password(&req);
    match service
        .archive(RecordKind::Short, &token, password.as_deref())
        .await
    {
        Ok(()) => json_response::<()>(StatusCode::OK, ErrorCode::Success, "Archived", None),
        Err(e) => error_from_studio(&e),
    }
}

/// 短链接路由 `/api/short`
pub fn short_routes() -> actix_web::Scope {
    web::scope("/short")
        .route("", web::post().to(save_short_link))
        .route("/{token}", web::get().to(get_short_link))
        .route("/{token}", web::delete().to(archive_short_link))
}
