use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "qr_styles")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub record_id: String,
    pub fg_color: String,
    pub bg_color: String,
    /// JSON 数组 ["#RRGGBB", "#RRGGBB"]
    pub gradient_json: Option<String>,
    pub module_style: String,
    pub eye_style: String,
    pub quiet_zone: i32,
    pub ecc_level: String,
    pub logo_size_ratio: f64,
    #[sea_orm(column_type = "Blob", nullable)]
    pub logo_png: Option<Vec<u8>>,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
