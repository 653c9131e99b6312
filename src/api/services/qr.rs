//! 二维码编辑 API 与资源下载

use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, web};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, trace};

use crate::services::qr::{AssetFormat, PNG_SIZES};
use crate::services::{RecordService, SaveQrRequest, UpdateStyleRequest};
use crate::storage::RecordKind;
use crate::utils::origin::request_origin;

use super::error_code::ErrorCode;
use super::helpers::{
    editor_password, error_from_studio, error_response, json_response, success_response,
};

/// 下载参数 `?format=svg|png|pdf&size=512|2048`
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DownloadQuery {
    pub format: Option<AssetFormat>,
    pub size: Option<u32>,
}

/// 创建或更新二维码
///
/// 更新受密码保护的记录时需要 `x-editor-password`。
pub async fn save_qr(
    req: HttpRequest,
    body: web::Json<SaveQrRequest>,
    service: web::Data<Arc<RecordService>>,
) -> HttpResponse {
    trace!("Editor API: save QR");
    let origin = request_origin(&req);
    let password = editor_password(&req);

    match service
        .save_qr(body.into_inner(), password.as_deref(), origin.as_deref())
        .await
    {
        Ok(result) if result.created => {
            info!("Editor API: QR created: {}", result.slug);
            json_response(StatusCode::CREATED, ErrorCode::Success, "Created", Some(result))
        }
        Ok(result) => success_response(result),
        Err(e) => error_from_studio(&e),
    }
}

pub async fn get_qr(
    req: HttpRequest,
    token: web::Path<String>,
    service: web::Data<Arc<RecordService>>,
) -> HttpResponse {
    let origin = request_origin(&req);
    match service
        .editor_view(RecordKind::Qr, &token, origin.as_deref())
        .await
    {
        Ok(Some(view)) => success_response(view),
        Ok(None) => error_response(
            StatusCode::NOT_FOUND,
            ErrorCode::RecordNotFound,
            "QR code not found",
        ),
        Err(e) => error_from_studio(&e),
    }
}

pub async fn archive_qr(
    req: HttpRequest,
    token: web::Path<String>,
    service: web::Data<Arc<RecordService>>,
) -> HttpResponse {
    let password = editor_password(&req);
    match service
        .archive(RecordKind::Qr, &token, password.as_deref())
        .await
    {
        Ok(()) => json_response::<()>(StatusCode::OK, ErrorCode::Success, "Archived", None),
        Err(e) => error_from_studio(&e),
    }
}

pub async fn update_qr_style(
    req: HttpRequest,
    token: web::Path<String>,
    body: web::Json<UpdateStyleRequest>,
    service: web::Data<Arc<RecordService>>,
) -> HttpResponse {
    let password = editor_password(&req);
    match service
        .update_qr_style(&token, password.as_deref(), body.into_inner())
        .await
    {
        Ok(style) => success_response(style),
        Err(e) => error_from_studio(&e),
    }
}

/// 下载二维码资源
pub async fn download_qr(
    req: HttpRequest,
    slug: web::Path<String>,
    service: web::Data<Arc<RecordService>>,
) -> HttpResponse {
    let query = match web::Query::<DownloadQuery>::from_query(req.query_string()) {
        Ok(q) => q.into_inner(),
        Err(_) => {
            return error_response(
                StatusCode::BAD_REQUEST,
                ErrorCode::QrInvalidFormat,
                "format must be one of svg, png, pdf",
            );
        }
    };

    let format = query.format.unwrap_or_default();
    let size = query.size.unwrap_or(PNG_SIZES[0]);
    if format == AssetFormat::Png && !PNG_SIZES.contains(&size) {
        return error_response(
            StatusCode::BAD_REQUEST,
            ErrorCode::QrInvalidFormat,
            "size must be 512 or 2048",
        );
    }

    let origin = request_origin(&req);
    match service
        .render_qr_asset(&slug, format, size, origin.as_deref())
        .await
    {
        Ok(Some(asset)) => HttpResponse::Ok()
            .insert_header(("Content-Type", asset.format.content_type()))
            .insert_header((
                "Content-Disposition",
                format!("attachment; filename=\"{}\"", asset.filename),
            ))
            .insert_header(("Cache-Control", "no-store"))
            .body(asset.bytes),
        Ok(None) => error_response(
            StatusCode::NOT_FOUND,
            ErrorCode::RecordNotFound,
            "QR code not found",
        ),
        Err(e) => error_from_studio(&e),
    }
}

/// 二维码路由 `/api/qr`
///
/// `/{slug}/download` 与 `/{token}` 段数不同，不会冲突。
pub fn qr_routes() -> actix_web::Scope {
    web::scope("/qr")
        .route("", web::post().to(save_qr))
        .route("/{slug}/download", web::get().to(download_qr))
        .route("/{token}/style", web::put().to(update_qr_style))
        .route("/{token}", web::get().to(get_qr))
        .route("/{token}", web::delete().to(archive_qr))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_download_query_parsing() {
        let q = web::Query::<DownloadQuery>::from_query("format=pdf").unwrap();
        assert_eq!(q.format, Some(AssetFormat::Pdf));
        assert_eq!(q.size, None);

        let q = web::Query::<DownloadQuery>::from_query("format=png&size=2048").unwrap();
        assert_eq!(q.format, Some(AssetFormat::Png));
        assert_eq!(q.size, Some(2048));

        assert!(web::Query::<DownloadQuery>::from_query("format=gif").is_err());
    }
}
