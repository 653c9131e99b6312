//! Mutation operations for SeaOrmStorage
//!
//! 编辑写路径：按编辑令牌 upsert 记录、替换目的地、软删除、保存二维码样式。
//! 并发写入以最后一次提交为准。

use std::collections::HashSet;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QuerySelect, SqlErr, TransactionTrait, sea_query::Expr, sea_query::OnConflict,
};
use tracing::{info, warn};

use super::{SeaOrmStorage, retry};
use crate::errors::{Result, StudioError};
use crate::storage::models::{
    LogoUpdate, NewRecord, QrStyle, RecordKind, RecordMode, RecordStatus, SavedRecord,
};
use crate::utils::{hash_editor_token, normalize_slug};

use migration::entities::{destination, qr_style, record};

enum SaveOutcome {
    Saved(SavedRecord),
    KindMismatch,
}

fn map_write_error(err: DbErr, action: &str) -> StudioError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(detail)) => {
            warn!("{}: unique constraint violation: {}", action, detail);
            StudioError::slug_conflict("Slug already in use")
        }
        _ => StudioError::database_operation(format!("{}失败: {}", action, err)),
    }
}

/// 单个事务内完成记录 upsert 与目的地替换
async fn save_record_txn(
    db: &DatabaseConnection,
    new: &NewRecord,
) -> std::result::Result<SaveOutcome, DbErr> {
    let txn = db.begin().await?;
    let now = Utc::now();
    let slug = normalize_slug(&new.slug);
    let mode = if new.destinations.len() > 1 {
        RecordMode::Multi
    } else {
        RecordMode::Single
    };

    let existing = record::Entity::find()
        .filter(record::Column::EditorTokenHash.eq(new.editor_token_hash.as_str()))
        .one(&txn)
        .await?;

    let (record_id, created) = match existing {
        Some(model) => {
            if model.kind != new.kind.to_string() {
                // txn 未提交，drop 时回滚
                return Ok(SaveOutcome::KindMismatch);
            }
            let id = model.id.clone();
            let previous_password = model.password_hash.clone();

            let mut active: record::ActiveModel = model.into();
            active.title = Set(new.title.clone());
            active.slug = Set(slug.clone());
            active.mode = Set(mode.to_string());
            active.default_url = Set(new.default_url.clone());
            active.hero_image = Set(new.hero_image.clone());
            active.origin = Set(new.origin.clone());
            active.status = Set(RecordStatus::Active.to_string());
            active.password_hash = Set(new.password_hash.clone().or(previous_password));
            active.updated_at = Set(now);
            active.update(&txn).await?;
            (id, false)
        }
        None => {
            let id = uuid::Uuid::new_v4().to_string();
            let active = record::ActiveModel {
                id: Set(id.clone()),
                kind: Set(new.kind.to_string()),
                title: Set(new.title.clone()),
                slug: Set(slug.clone()),
                mode: Set(mode.to_string()),
                default_url: Set(new.default_url.clone()),
                hero_image: Set(new.hero_image.clone()),
                origin: Set(new.origin.clone()),
                status: Set(RecordStatus::Active.to_string()),
                editor_token_hash: Set(new.editor_token_hash.clone()),
                password_hash: Set(new.password_hash.clone()),
                created_at: Set(now),
                updated_at: Set(now),
            };
            record::Entity::insert(active).exec(&txn).await?;
            (id, true)
        }
    };

    // 只有本记录已有的目的地 id 才会被沿用
    let owned_ids: HashSet<String> = destination::Entity::find()
        .select_only()
        .column(destination::Column::Id)
        .filter(destination::Column::RecordId.eq(record_id.as_str()))
        .into_tuple::<String>()
        .all(&txn)
        .await?
        .into_iter()
        .collect();

    destination::Entity::delete_many()
        .filter(destination::Column::RecordId.eq(record_id.as_str()))
        .exec(&txn)
        .await?;

    let mut used_ids = HashSet::new();
    let rows: Vec<destination::ActiveModel> = new
        .destinations
        .iter()
        .enumerate()
        .map(|(seq, dest)| {
            let id = dest
                .id
                .as_ref()
                .filter(|id| owned_ids.contains(*id) && !used_ids.contains(*id))
                .cloned()
                .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
            used_ids.insert(id.clone());
            destination::ActiveModel {
                id: Set(id),
                record_id: Set(record_id.clone()),
                title: Set(dest.title.clone()),
                url: Set(dest.url.clone()),
                position: Set(dest.position),
                seq: Set(seq as i32),
                image: Set(dest.image.clone()),
            }
        })
        .collect();

    if !rows.is_empty() {
        destination::Entity::insert_many(rows).exec(&txn).await?;
    }

    txn.commit().await?;

    Ok(SaveOutcome::Saved(SavedRecord {
        id: record_id,
        slug,
        created,
    }))
}

impl SeaOrmStorage {
    /// 按编辑令牌哈希 upsert 记录并整体替换目的地
    ///
    /// 已有记录会被重新置为 active；`password_hash` 为 None 时保留原密码。
    pub async fn save_record(&self, new: NewRecord) -> Result<SavedRecord> {
        let db = &self.db;

        let outcome = retry::with_retry(
            &format!("save_record({})", new.slug),
            self.retry_config,
            || async { save_record_txn(db, &new).await },
        )
        .await
        .map_err(|e| map_write_error(e, "保存记录"))?;

        match outcome {
            SaveOutcome::Saved(saved) => {
                info!(
                    "{} record saved: {} (created: {})",
                    new.kind, saved.slug, saved.created
                );
                Ok(saved)
            }
            SaveOutcome::KindMismatch => Err(StudioError::validation(
                "Editor token belongs to a different record type",
            )),
        }
    }

    /// 软删除：状态置为 archived，返回是否命中
    pub async fn archive_record(&self, kind: RecordKind, token: &str) -> Result<bool> {
        let token_hash = hash_editor_token(token.trim());
        let db = &self.db;

        let result = retry::with_retry("archive_record", self.retry_config, || async {
            record::Entity::update_many()
                .col_expr(
                    record::Column::Status,
                    Expr::value(RecordStatus::Archived.to_string()),
                )
                .col_expr(record::Column::UpdatedAt, Expr::value(Utc::now()))
                .filter(record::Column::EditorTokenHash.eq(token_hash.as_str()))
                .filter(record::Column::Kind.eq(kind.to_string()))
                .filter(record::Column::Status.eq(RecordStatus::Active.to_string()))
                .exec(db)
                .await
        })
        .await
        .map_err(|e| map_write_error(e, "归档记录"))?;

        if result.rows_affected > 0 {
            info!("{} record archived", kind);
        }
        Ok(result.rows_affected > 0)
    }

    /// 保存二维码样式（每条记录一行）
    pub async fn save_qr_style(
        &self,
        record_id: &str,
        style: &QrStyle,
        logo: LogoUpdate,
    ) -> Result<()> {
        let db = &self.db;
        let gradient_json = style
            .gradient
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        let mut update_columns = vec![
            qr_style::Column::FgColor,
            qr_style::Column::BgColor,
            qr_style::Column::GradientJson,
            qr_style::Column::ModuleStyle,
            qr_style::Column::EyeStyle,
            qr_style::Column::QuietZone,
            qr_style::Column::EccLevel,
            qr_style::Column::LogoSizeRatio,
            qr_style::Column::UpdatedAt,
        ];
        let logo_png = match &logo {
            LogoUpdate::Keep => None,
            LogoUpdate::Remove => {
                update_columns.push(qr_style::Column::LogoPng);
                None
            }
            LogoUpdate::Replace(bytes) => {
                update_columns.push(qr_style::Column::LogoPng);
                Some(bytes.clone())
            }
        };

        retry::with_retry(
            &format!("save_qr_style({})", record_id),
            self.retry_config,
            || async {
                let active = qr_style::ActiveModel {
                    record_id: Set(record_id.to_string()),
                    fg_color: Set(style.fg_color.clone()),
                    bg_color: Set(style.bg_color.clone()),
                    gradient_json: Set(gradient_json.clone()),
                    module_style: Set(style.module_style.to_string()),
                    eye_style: Set(style.eye_style.to_string()),
                    quiet_zone: Set(style.quiet_zone as i32),
                    ecc_level: Set(style.ecc.to_string()),
                    logo_size_ratio: Set(style.logo_size_ratio),
                    logo_png: Set(logo_png.clone()),
                    updated_at: Set(Utc::now()),
                };
                qr_style::Entity::insert(active)
                    .on_conflict(
                        OnConflict::column(qr_style::Column::RecordId)
                            .update_columns(update_columns.clone())
                            .to_owned(),
                    )
                    .exec(db)
                    .await
                    .map(|_| ())
            },
        )
        .await
        .map_err(|e| StudioError::database_operation(format!("保存二维码样式失败: {}", e)))
    }
}
