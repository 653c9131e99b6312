//! Query operations for SeaOrmStorage
//!
//! 读路径：按 slug 或编辑令牌查找记录、读取二维码样式。

use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder};
use tracing::error;

use super::converters::{model_to_destination, model_to_qr_style, model_to_record};
use super::{SeaOrmStorage, retry};
use crate::errors::{Result, StudioError};
use crate::storage::models::{Destination, RecordKind, RecordStatus, ShortRecord, StoredQrStyle};
use crate::utils::{hash_editor_token, normalize_slug};

use migration::entities::{destination, qr_style, record};

/// 按 (position, seq) 加载目的地
pub(super) async fn load_destinations<C: ConnectionTrait>(
    db: &C,
    record_id: &str,
) -> std::result::Result<Vec<Destination>, sea_orm::DbErr> {
    let models = destination::Entity::find()
        .filter(destination::Column::RecordId.eq(record_id))
        .order_by_asc(destination::Column::Position)
        .order_by_asc(destination::Column::Seq)
        .all(db)
        .await?;
    Ok(models.into_iter().map(model_to_destination).collect())
}

impl SeaOrmStorage {
    /// 按 slug 查找启用中的记录
    ///
    /// 不存在返回 `Ok(None)`；只有数据库故障才返回错误。
    pub async fn get_record_by_slug(
        &self,
        kind: RecordKind,
        slug: &str,
    ) -> Result<Option<ShortRecord>> {
        let slug = normalize_slug(slug);
        if slug.is_empty() {
            return Ok(None);
        }
        let db = &self.db;

        let result = retry::with_retry(
            &format!("get_record_by_slug({})", slug),
            self.retry_config,
            || async {
                let found = record::Entity::find()
                    .filter(record::Column::Slug.eq(slug.as_str()))
                    .filter(record::Column::Kind.eq(kind.to_string()))
                    .filter(record::Column::Status.eq(RecordStatus::Active.to_string()))
                    .one(db)
                    .await?;
                match found {
                    Some(model) => {
                        let destinations = load_destinations(db, &model.id).await?;
                        Ok(Some(model_to_record(model, destinations)))
                    }
                    None => Ok(None),
                }
            },
        )
        .await;

        result.map_err(|e| {
            error!("查询记录失败（重试后仍失败）: {}", e);
            StudioError::database_connection(format!("Record lookup failed: {}", e))
        })
    }

    /// 按编辑令牌查找启用中的记录（比对 sha256(token)）
    pub async fn get_record_by_editor_token(
        &self,
        kind: RecordKind,
        token: &str,
    ) -> Result<Option<ShortRecord>> {
        self.find_by_editor_token(kind, token, true).await
    }

    /// 按编辑令牌查找记录，包括已归档的
    ///
    /// 写入前的密码校验使用：归档后再保存会重新启用记录，同样需要密码。
    pub async fn get_record_by_editor_token_any_status(
        &self,
        kind: RecordKind,
        token: &str,
    ) -> Result<Option<ShortRecord>> {
        self.find_by_editor_token(kind, token, false).await
    }

    async fn find_by_editor_token(
        &self,
        kind: RecordKind,
        token: &str,
        active_only: bool,
    ) -> Result<Option<ShortRecord>> {
        let token = token.trim();
        if token.is_empty() {
            return Ok(None);
        }
        let token_hash = hash_editor_token(token);
        let db = &self.db;

        let result = retry::with_retry("get_record_by_editor_token", self.retry_config, || async {
            let mut query = record::Entity::find()
                .filter(record::Column::EditorTokenHash.eq(token_hash.as_str()))
                .filter(record::Column::Kind.eq(kind.to_string()));
            if active_only {
                query = query.filter(record::Column::Status.eq(RecordStatus::Active.to_string()));
            }
            match query.one(db).await? {
                Some(model) => {
                    let destinations = load_destinations(db, &model.id).await?;
                    Ok(Some(model_to_record(model, destinations)))
                }
                None => Ok(None),
            }
        })
        .await;

        result.map_err(|e| {
            error!("按令牌查询记录失败（重试后仍失败）: {}", e);
            StudioError::database_connection(format!("Record lookup failed: {}", e))
        })
    }

    /// 读取记录的二维码样式；未保存过时返回 None
    pub async fn get_qr_style(&self, record_id: &str) -> Result<Option<StoredQrStyle>> {
        let db = &self.db;
        let id = record_id.to_string();

        let result = retry::with_retry(
            &format!("get_qr_style({})", record_id),
            self.retry_config,
            || async { qr_style::Entity::find_by_id(id.clone()).one(db).await },
        )
        .await
        .map_err(|e| StudioError::database_operation(format!("读取二维码样式失败: {}", e)))?;

        Ok(result.map(model_to_qr_style))
    }
}
