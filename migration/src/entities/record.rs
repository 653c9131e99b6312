//! Short link / QR record entity

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "records")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// "short" 或 "qr"
    pub kind: String,
    pub title: String,
    #[sea_orm(unique)]
    pub slug: String,
    /// 存储的模式提示，读取时以目的地数量为准
    pub mode: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub default_url: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub hero_image: Option<String>,
    pub origin: Option<String>,
    pub status: String,
    #[sea_orm(unique)]
    pub editor_token_hash: String,
    pub password_hash: Option<String>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
