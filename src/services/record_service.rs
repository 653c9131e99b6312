//! 记录编辑服务
//!
//! 短链接与二维码记录的创建、更新、归档和编辑视图。
//! 没有账户体系：持有编辑令牌即拥有记录，受密码保护的二维码还需要编辑密码。

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use super::qr::{self, AssetFormat, QrAsset};
use super::safety::UrlSafetyCheck;
use crate::errors::{Result, StudioError};
use crate::resolver::effective_mode;
use crate::storage::models::{
    Destination, LogoUpdate, NewDestination, NewRecord, QrStyle, RecordKind, RecordMode,
    RecordStatus, SavedRecord, ScanSummary, ShortRecord,
};
use crate::storage::SeaOrmStorage;
use crate::utils::origin::{absolute_url, is_localhost_origin};
use crate::utils::password::{process_new_password, verify_password};
use crate::utils::{
    generate_editor_token, generate_slug, hash_editor_token, is_reserved_slug, is_valid_slug,
    normalize_slug, validate_url,
};

/// 客户端提供的编辑令牌长度范围
const MIN_EDITOR_TOKEN_LEN: usize = 16;
const MAX_EDITOR_TOKEN_LEN: usize = 128;
const MAX_TITLE_LEN: usize = 200;
const DEFAULT_TITLE: &str = "Untitled";

// ============ Request/Response DTOs ============

/// 目的地输入
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DestinationInput {
    /// 已有目的地的 id（保留扫描统计的关联）
    pub id: Option<String>,
    pub title: Option<String>,
    pub url: String,
    pub position: Option<i32>,
    pub image: Option<String>,
}

/// 创建或更新短链接
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SaveShortLinkRequest {
    pub title: Option<String>,
    pub slug: Option<String>,
    /// 为空时生成新令牌（即新建记录）
    pub editor_token: Option<String>,
    pub destinations: Vec<DestinationInput>,
    pub hero_image: Option<String>,
    pub origin: Option<String>,
}

/// 创建或更新二维码
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SaveQrRequest {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub editor_token: Option<String>,
    pub destinations: Vec<DestinationInput>,
    pub hero_image: Option<String>,
    pub origin: Option<String>,
    pub style: Option<QrStyle>,
    /// base64 图片（可带 data URL 前缀）
    pub logo: Option<String>,
    /// 新的编辑密码；为空时保留原密码
    pub password: Option<String>,
}

/// 更新二维码样式
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UpdateStyleRequest {
    pub style: QrStyle,
    pub logo: Option<String>,
    pub remove_logo: bool,
}

/// 保存结果
#[derive(Debug, Clone, Serialize)]
pub struct SaveResult {
    pub id: String,
    pub kind: RecordKind,
    pub slug: String,
    /// 只在此处返回明文令牌，服务端只保存其哈希
    pub editor_token: String,
    pub created: bool,
    pub public_url: String,
    pub landing_url: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DestinationView {
    #[serde(flatten)]
    pub destination: Destination,
    pub scans: u64,
}

/// 编辑视图
#[derive(Debug, Clone, Serialize)]
pub struct EditorView {
    pub id: String,
    pub kind: RecordKind,
    pub title: String,
    pub slug: String,
    pub mode: RecordMode,
    pub default_url: Option<String>,
    pub hero_image: Option<String>,
    pub origin: Option<String>,
    pub status: RecordStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub public_url: String,
    pub landing_url: String,
    pub password_protected: bool,
    pub destinations: Vec<DestinationView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<QrStyle>,
    pub analytics: ScanSummary,
}

/// 记录字段（两种类型共用）
struct RecordDraft<'a> {
    kind: RecordKind,
    title: Option<&'a str>,
    slug: Option<&'a str>,
    editor_token: Option<&'a str>,
    destinations: &'a [DestinationInput],
    hero_image: Option<&'a str>,
    origin: Option<&'a str>,
}

/// 规范化后的目的地：去掉空 URL、补默认标题和位置，按位置稳定排序
pub fn normalize_destinations(inputs: &[DestinationInput]) -> Result<Vec<NewDestination>> {
    let mut destinations: Vec<NewDestination> = inputs
        .iter()
        .filter(|d| !d.url.trim().is_empty())
        .enumerate()
        .map(|(idx, d)| NewDestination {
            id: d.id.clone().filter(|id| !id.trim().is_empty()),
            title: d
                .title
                .as_deref()
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(String::from)
                .unwrap_or_else(|| format!("Destination {}", idx + 1)),
            url: d.url.trim().to_string(),
            position: d.position.unwrap_or(idx as i32),
            image: d.image.clone().filter(|i| !i.trim().is_empty()),
        })
        .collect();

    if destinations.is_empty() {
        return Err(StudioError::validation(
            "At least one destination is required",
        ));
    }

    for (idx, dest) in destinations.iter().enumerate() {
        validate_url(&dest.url).map_err(|e| {
            StudioError::validation(format!("Destination {}: {}", idx + 1, e))
        })?;
    }

    destinations.sort_by_key(|d| d.position);
    Ok(destinations)
}

/// 规范化 slug；为空时生成
pub fn resolve_slug(raw: Option<&str>) -> Result<(String, bool)> {
    match raw.map(normalize_slug).filter(|s| !s.is_empty()) {
        Some(slug) => {
            if !is_valid_slug(&slug) {
                return Err(StudioError::validation(
                    "Slug may only contain lowercase letters, digits, '-' and '_' (max 64 chars)",
                ));
            }
            if is_reserved_slug(&slug) {
                return Err(StudioError::validation(format!(
                    "Slug '{}' is reserved",
                    slug
                )));
            }
            Ok((slug, false))
        }
        None => Ok((generate_slug(), true)),
    }
}

fn resolve_editor_token(raw: Option<&str>) -> Result<String> {
    match raw.map(str::trim).filter(|t| !t.is_empty()) {
        Some(token) => {
            if token.len() < MIN_EDITOR_TOKEN_LEN || token.len() > MAX_EDITOR_TOKEN_LEN {
                return Err(StudioError::validation(format!(
                    "Editor token must be {}-{} characters",
                    MIN_EDITOR_TOKEN_LEN, MAX_EDITOR_TOKEN_LEN
                )));
            }
            Ok(token.to_string())
        }
        None => Ok(generate_editor_token()),
    }
}

/// 记录保存的 origin：优先使用请求体中的非本地 origin，否则使用请求重建的 origin
fn choose_origin(payload_origin: Option<&str>, request_origin: Option<&str>) -> Option<String> {
    payload_origin
        .map(|o| o.trim().trim_end_matches('/'))
        .filter(|o| !o.is_empty() && !is_localhost_origin(o))
        .or(request_origin)
        .map(String::from)
}

fn title_or_default(raw: Option<&str>) -> String {
    let title = raw.map(str::trim).filter(|t| !t.is_empty()).unwrap_or(DEFAULT_TITLE);
    title.chars().take(MAX_TITLE_LEN).collect()
}

/// 检查编辑密码
fn authorize(record: &ShortRecord, password: Option<&str>) -> Result<()> {
    let Some(hash) = record.password_hash.as_deref() else {
        return Ok(());
    };
    let Some(password) = password.filter(|p| !p.is_empty()) else {
        return Err(StudioError::unauthorized("Editor password required"));
    };
    match verify_password(password, hash) {
        Ok(true) => Ok(()),
        Ok(false) => Err(StudioError::unauthorized("Invalid editor password")),
        Err(e) => {
            error!("Stored editor password hash is unreadable: {}", e);
            Err(StudioError::unauthorized("Invalid editor password"))
        }
    }
}

// ============ RecordService Implementation ============

pub struct RecordService {
    storage: Arc<SeaOrmStorage>,
    safety: Arc<dyn UrlSafetyCheck>,
    public_origin: Option<String>,
    max_logo_bytes: usize,
    pdf_jpeg_quality: u8,
}

impl RecordService {
    pub fn new(storage: Arc<SeaOrmStorage>, safety: Arc<dyn UrlSafetyCheck>) -> Self {
        let config = crate::config::try_get_config().unwrap_or_default();
        Self {
            storage,
            safety,
            public_origin: config
                .server
                .public_origin
                .as_deref()
                .map(|o| o.trim().trim_end_matches('/').to_string())
                .filter(|o| !o.is_empty()),
            max_logo_bytes: config.qr.max_logo_bytes,
            pdf_jpeg_quality: config.qr.pdf_jpeg_quality,
        }
    }

    pub fn storage(&self) -> &Arc<SeaOrmStorage> {
        &self.storage
    }

    /// 公开地址使用的 origin：配置 → 记录保存的 origin → 当前请求
    fn origin_for<'a>(
        &'a self,
        record_origin: Option<&'a str>,
        request_origin: Option<&'a str>,
    ) -> Option<&'a str> {
        self.public_origin
            .as_deref()
            .or(record_origin)
            .or(request_origin)
    }

    /// 目的地 URL 安全检查（检查本身失败时放行）
    async fn check_destinations(&self, destinations: &[NewDestination]) -> Result<()> {
        for dest in destinations {
            let verdict = self.safety.check(&dest.url).await;
            if !verdict.safe {
                warn!(
                    "Rejected unsafe destination {} ({}): {:?}",
                    dest.url,
                    self.safety.name(),
                    verdict.threats
                );
                return Err(StudioError::validation(format!(
                    "Destination URL flagged as unsafe: {}",
                    verdict.threats.join(", ")
                )));
            }
        }
        Ok(())
    }

    async fn save_draft(
        &self,
        draft: RecordDraft<'_>,
        password_hash: Option<String>,
        request_origin: Option<&str>,
    ) -> Result<(SavedRecord, String, Option<String>)> {
        let (slug, generated) = resolve_slug(draft.slug)?;
        let destinations = normalize_destinations(draft.destinations)?;
        self.check_destinations(&destinations).await?;
        let editor_token = resolve_editor_token(draft.editor_token)?;
        let origin = choose_origin(draft.origin, request_origin);

        let new_record = NewRecord {
            kind: draft.kind,
            title: title_or_default(draft.title),
            slug,
            default_url: destinations.first().map(|d| d.url.clone()),
            hero_image: draft
                .hero_image
                .map(str::trim)
                .filter(|h| !h.is_empty())
                .map(String::from),
            origin: origin.clone(),
            editor_token_hash: hash_editor_token(&editor_token),
            password_hash,
            destinations,
        };

        let saved = match self.storage.save_record(new_record.clone()).await {
            // 生成的 slug 撞车时换一个再试一次
            Err(StudioError::SlugConflict(_)) if generated => {
                debug!("Generated slug collided, retrying with a new one");
                self.storage
                    .save_record(NewRecord {
                        slug: generate_slug(),
                        ..new_record
                    })
                    .await?
            }
            other => other?,
        };

        Ok((saved, editor_token, origin))
    }

    fn save_result(
        &self,
        kind: RecordKind,
        saved: SavedRecord,
        editor_token: String,
        origin: Option<&str>,
    ) -> SaveResult {
        let base = self.origin_for(origin, None);
        SaveResult {
            public_url: absolute_url(base, &kind.public_path(&saved.slug)),
            landing_url: absolute_url(base, &kind.landing_path(&saved.slug)),
            id: saved.id,
            kind,
            slug: saved.slug,
            editor_token,
            created: saved.created,
        }
    }

    /// 创建或更新短链接
    pub async fn save_short_link(
        &self,
        request: SaveShortLinkRequest,
        request_origin: Option<&str>,
    ) -> Result<SaveResult> {
        let draft = RecordDraft {
            kind: RecordKind::Short,
            title: request.title.as_deref(),
            slug: request.slug.as_deref(),
            editor_token: request.editor_token.as_deref(),
            destinations: &request.destinations,
            hero_image: request.hero_image.as_deref(),
            origin: request.origin.as_deref(),
        };
        let (saved, token, origin) = self.save_draft(draft, None, request_origin).await?;
        info!("Short link saved: {}", saved.slug);
        Ok(self.save_result(RecordKind::Short, saved, token, origin.as_deref()))
    }

    /// 创建或更新二维码（含样式与 logo）
    ///
    /// 更新受密码保护的记录时需要提供当前密码（已归档的记录也一样）。
    pub async fn save_qr(
        &self,
        request: SaveQrRequest,
        editor_password: Option<&str>,
        request_origin: Option<&str>,
    ) -> Result<SaveResult> {
        if let Some(token) = request.editor_token.as_deref()
            && let Some(existing) = self
                .storage
                .get_record_by_editor_token_any_status(RecordKind::Qr, token)
                .await?
        {
            authorize(&existing, editor_password)?;
        }

        let style = qr::validate_style(&request.style.clone().unwrap_or_default())?;
        let logo = match request.logo.as_deref().filter(|l| !l.trim().is_empty()) {
            Some(raw) => LogoUpdate::Replace(qr::process_logo(raw, self.max_logo_bytes)?),
            None => LogoUpdate::Keep,
        };
        let password_hash = process_new_password(request.password.as_deref())
            .map_err(|e| StudioError::validation(e.to_string()))?;

        let draft = RecordDraft {
            kind: RecordKind::Qr,
            title: request.title.as_deref(),
            slug: request.slug.as_deref(),
            editor_token: request.editor_token.as_deref(),
            destinations: &request.destinations,
            hero_image: request.hero_image.as_deref(),
            origin: request.origin.as_deref(),
        };
        let (saved, token, origin) = self.save_draft(draft, password_hash, request_origin).await?;

        let stored_logo = self.storage.get_qr_style(&saved.id).await?;
        let has_logo = match &logo {
            LogoUpdate::Replace(_) => true,
            LogoUpdate::Remove => false,
            LogoUpdate::Keep => stored_logo.is_some_and(|s| s.logo_png.is_some()),
        };
        let style = QrStyle {
            with_logo: has_logo,
            ..style
        };
        self.storage.save_qr_style(&saved.id, &style, logo).await?;

        info!("QR saved: {}", saved.slug);
        Ok(self.save_result(RecordKind::Qr, saved, token, origin.as_deref()))
    }

    /// 更新二维码样式
    pub async fn update_qr_style(
        &self,
        token: &str,
        editor_password: Option<&str>,
        request: UpdateStyleRequest,
    ) -> Result<QrStyle> {
        let record = self
            .storage
            .get_record_by_editor_token(RecordKind::Qr, token)
            .await?
            .ok_or_else(|| StudioError::not_found("QR code not found"))?;
        authorize(&record, editor_password)?;

        let style = qr::validate_style(&request.style)?;
        let logo = match request.logo.as_deref().filter(|l| !l.trim().is_empty()) {
            Some(raw) => LogoUpdate::Replace(qr::process_logo(raw, self.max_logo_bytes)?),
            None if request.remove_logo => LogoUpdate::Remove,
            None => LogoUpdate::Keep,
        };
        let with_logo = match &logo {
            LogoUpdate::Replace(_) => true,
            LogoUpdate::Remove => false,
            LogoUpdate::Keep => self
                .storage
                .get_qr_style(&record.id)
                .await?
                .is_some_and(|s| s.logo_png.is_some()),
        };
        let style = QrStyle { with_logo, ..style };

        self.storage.save_qr_style(&record.id, &style, logo).await?;
        info!("QR style updated: {}", record.slug);
        Ok(style)
    }

    /// 软删除
    pub async fn archive(
        &self,
        kind: RecordKind,
        token: &str,
        editor_password: Option<&str>,
    ) -> Result<()> {
        let record = self
            .storage
            .get_record_by_editor_token(kind, token)
            .await?
            .ok_or_else(|| StudioError::not_found("Record not found"))?;
        authorize(&record, editor_password)?;

        if !self.storage.archive_record(kind, token).await? {
            return Err(StudioError::not_found("Record not found"));
        }
        Ok(())
    }

    /// 编辑视图：记录、带扫描数的目的地、样式与统计
    pub async fn editor_view(
        &self,
        kind: RecordKind,
        token: &str,
        request_origin: Option<&str>,
    ) -> Result<Option<EditorView>> {
        let Some(record) = self.storage.get_record_by_editor_token(kind, token).await? else {
            return Ok(None);
        };

        let analytics = self.storage.scan_summary(&record.id).await?;
        let style = match kind {
            RecordKind::Qr => Some(
                self.storage
                    .get_qr_style(&record.id)
                    .await?
                    .map(|s| s.style)
                    .unwrap_or_default(),
            ),
            RecordKind::Short => None,
        };

        let base = self.origin_for(record.origin.as_deref(), request_origin);
        let public_url = absolute_url(base, &kind.public_path(&record.slug));
        let landing_url = absolute_url(base, &kind.landing_path(&record.slug));
        let password_protected = record.is_password_protected();
        let mode = effective_mode(&record.destinations);

        let destinations = record
            .destinations
            .into_iter()
            .map(|destination| DestinationView {
                scans: analytics.count_for_destination(&destination.id),
                destination,
            })
            .collect();

        Ok(Some(EditorView {
            id: record.id,
            kind,
            title: record.title,
            slug: record.slug,
            mode,
            default_url: record.default_url,
            hero_image: record.hero_image,
            origin: record.origin,
            status: record.status,
            created_at: record.created_at,
            updated_at: record.updated_at,
            public_url,
            landing_url,
            password_protected,
            destinations,
            style,
            analytics,
        }))
    }

    /// 生成二维码下载资源；记录不存在时返回 None
    pub async fn render_qr_asset(
        &self,
        slug: &str,
        format: AssetFormat,
        size: u32,
        request_origin: Option<&str>,
    ) -> Result<Option<QrAsset>> {
        let Some(record) = self.storage.get_record_by_slug(RecordKind::Qr, slug).await? else {
            return Ok(None);
        };
        let stored = self.storage.get_qr_style(&record.id).await?;
        let (style, logo_png) = match stored {
            Some(s) => (s.style, s.logo_png),
            None => (QrStyle::default(), None),
        };

        let public_url =
            qr::public_qr_url(self.origin_for(record.origin.as_deref(), request_origin), &record.slug);
        let jpeg_quality = self.pdf_jpeg_quality;

        let asset = tokio::task::spawn_blocking(move || {
            qr::render_asset(
                &record,
                &public_url,
                &style,
                logo_png.as_deref(),
                format,
                size,
                jpeg_quality,
            )
        })
        .await
        .map_err(|e| StudioError::render(format!("Render task failed: {}", e)))??;

        Ok(Some(asset))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(url: &str, title: Option<&str>, position: Option<i32>) -> DestinationInput {
        DestinationInput {
            url: url.to_string(),
            title: title.map(String::from),
            position,
            ..Default::default()
        }
    }

    #[test]
    fn test_normalize_destinations_defaults() {
        let list = normalize_destinations(&[
            input("  ", None, None),
            input(" https://a.example ", None, None),
            input("https://b.example", Some("B"), None),
        ])
        .unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].title, "Destination 1");
        assert_eq!(list[0].url, "https://a.example");
        assert_eq!(list[0].position, 0);
        assert_eq!(list[1].title, "B");
        assert_eq!(list[1].position, 1);
    }

    #[test]
    fn test_normalize_destinations_sorts_by_position() {
        let list = normalize_destinations(&[
            input("https://late.example", None, Some(5)),
            input("https://early.example", None, Some(1)),
        ])
        .unwrap();
        assert_eq!(list[0].url, "https://early.example");
    }

    #[test]
    fn test_normalize_destinations_rejects_empty_and_bad_urls() {
        assert!(normalize_destinations(&[input("", None, None)]).is_err());
        let err = normalize_destinations(&[input("javascript:alert(1)", None, None)]).unwrap_err();
        assert!(matches!(err, StudioError::Validation(_)));
        assert!(normalize_destinations(&[input("ftp://x.example", None, None)]).is_err());
    }

    #[test]
    fn test_resolve_slug() {
        assert_eq!(resolve_slug(Some(" My-Menu ")).unwrap(), ("my-menu".to_string(), false));
        assert!(resolve_slug(Some("api")).is_err());
        assert!(resolve_slug(Some("LP")).is_err());
        assert!(resolve_slug(Some("has space")).is_err());
        let (generated, was_generated) = resolve_slug(None).unwrap();
        assert!(was_generated);
        assert_eq!(generated.len(), 8);
        assert!(resolve_slug(Some("   ")).unwrap().1);
    }

    #[test]
    fn test_editor_token_rules() {
        assert!(resolve_editor_token(Some("short")).is_err());
        assert_eq!(
            resolve_editor_token(Some("abcdefghijklmnopqrstuvwxyz")).unwrap(),
            "abcdefghijklmnopqrstuvwxyz"
        );
        assert!(resolve_editor_token(None).unwrap().len() >= MIN_EDITOR_TOKEN_LEN);
    }

    #[test]
    fn test_choose_origin() {
        assert_eq!(
            choose_origin(Some("https://brand.example/"), Some("https://req.example")).as_deref(),
            Some("https://brand.example")
        );
        assert_eq!(
            choose_origin(Some("http://localhost:3000"), Some("https://req.example")).as_deref(),
            Some("https://req.example")
        );
        assert_eq!(choose_origin(None, None), None);
    }

    #[test]
    fn test_title_default_and_truncation() {
        assert_eq!(title_or_default(Some("  ")), DEFAULT_TITLE);
        assert_eq!(title_or_default(Some(&"x".repeat(500))).len(), MAX_TITLE_LEN);
    }
}
