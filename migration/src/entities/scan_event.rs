//! Scan event entity for privacy-preserving scan analytics

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "scan_events")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub record_id: String,
    pub slug_snapshot: String,
    /// sha256("{ip}:{salt}")
    pub ip_hash: String,
    pub user_agent_hash: String,
    pub country_iso: Option<String>,
    pub city_name: Option<String>,
    pub referrer_domain: Option<String>,
    /// mobile / tablet / desktop
    pub device_category: String,
    pub destination_id: Option<String>,
    /// scan / destination
    pub event_kind: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
