//! 扫描统计查询
//!
//! 为编辑视图提供单条记录的汇总数据。

use sea_orm::{
    ColumnTrait, EntityTrait, FromQueryResult, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, sea_query::Expr,
};

use super::{SeaOrmStorage, retry};
use crate::errors::{Result, StudioError};
use crate::storage::models::{
    CountryCount, DestinationCount, DeviceCount, EventKind, ScanSummary,
};

use migration::entities::scan_event;

/// 国家分布最多返回的条目数
const TOP_COUNTRIES_LIMIT: u64 = 5;

// ============ 查询结果类型 ============

#[derive(Debug, FromQueryResult)]
struct CountryRow {
    country_iso: Option<String>,
    count: i64,
}

#[derive(Debug, FromQueryResult)]
struct DeviceRow {
    device_category: String,
    count: i64,
}

#[derive(Debug, FromQueryResult)]
struct DestinationRow {
    destination_id: Option<String>,
    count: i64,
}

impl SeaOrmStorage {
    /// 汇总单条记录的扫描数据
    pub async fn scan_summary(&self, record_id: &str) -> Result<ScanSummary> {
        let db = &self.db;
        let id = record_id.to_string();

        let summary = retry::with_retry(
            &format!("scan_summary({})", record_id),
            self.retry_config,
            || async {
                let total_scans = scan_event::Entity::find()
                    .filter(scan_event::Column::RecordId.eq(id.as_str()))
                    .count(db)
                    .await?;

                let unique_scans = scan_event::Entity::find()
                    .select_only()
                    .column(scan_event::Column::IpHash)
                    .distinct()
                    .filter(scan_event::Column::RecordId.eq(id.as_str()))
                    .count(db)
                    .await?;

                let countries = scan_event::Entity::find()
                    .select_only()
                    .column(scan_event::Column::CountryIso)
                    .column_as(scan_event::Column::Id.count(), "count")
                    .filter(scan_event::Column::RecordId.eq(id.as_str()))
                    .filter(scan_event::Column::CountryIso.is_not_null())
                    .group_by(scan_event::Column::CountryIso)
                    .order_by_desc(Expr::cust("count"))
                    .limit(TOP_COUNTRIES_LIMIT)
                    .into_model::<CountryRow>()
                    .all(db)
                    .await?;

                let devices = scan_event::Entity::find()
                    .select_only()
                    .column(scan_event::Column::DeviceCategory)
                    .column_as(scan_event::Column::Id.count(), "count")
                    .filter(scan_event::Column::RecordId.eq(id.as_str()))
                    .group_by(scan_event::Column::DeviceCategory)
                    .order_by_desc(Expr::cust("count"))
                    .into_model::<DeviceRow>()
                    .all(db)
                    .await?;

                let destinations = scan_event::Entity::find()
                    .select_only()
                    .column(scan_event::Column::DestinationId)
                    .column_as(scan_event::Column::Id.count(), "count")
                    .filter(scan_event::Column::RecordId.eq(id.as_str()))
                    .filter(scan_event::Column::EventKind.eq(EventKind::Destination.to_string()))
                    .filter(scan_event::Column::DestinationId.is_not_null())
                    .group_by(scan_event::Column::DestinationId)
                    .order_by_desc(Expr::cust("count"))
                    .into_model::<DestinationRow>()
                    .all(db)
                    .await?;

                Ok(ScanSummary {
                    total_scans,
                    unique_scans,
                    top_countries: countries
                        .into_iter()
                        .filter_map(|row| {
                            row.country_iso.map(|country| CountryCount {
                                country,
                                count: row.count.max(0) as u64,
                            })
                        })
                        .collect(),
                    devices: devices
                        .into_iter()
                        .map(|row| DeviceCount {
                            device: row.device_category,
                            count: row.count.max(0) as u64,
                        })
                        .collect(),
                    destination_counts: destinations
                        .into_iter()
                        .filter_map(|row| {
                            row.destination_id.map(|destination_id| DestinationCount {
                                destination_id,
                                count: row.count.max(0) as u64,
                            })
                        })
                        .collect(),
                })
            },
        )
        .await
        .map_err(|e| StudioError::database_operation(format!("统计查询失败: {}", e)))?;

        Ok(summary)
    }
}
