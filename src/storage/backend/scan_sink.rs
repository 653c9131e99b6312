//! 扫描事件落库

use async_trait::async_trait;
use sea_orm::{ActiveValue::Set, EntityTrait};

use super::{SeaOrmStorage, retry};
use crate::analytics::ScanSink;
use crate::storage::models::NewScanEvent;

use migration::entities::scan_event;

#[async_trait]
impl ScanSink for SeaOrmStorage {
    async fn record_scan(&self, event: NewScanEvent) -> anyhow::Result<()> {
        let db = &self.db;

        retry::with_retry("record_scan", self.retry_config, || async {
            let active = scan_event::ActiveModel {
                record_id: Set(event.record_id.clone()),
                slug_snapshot: Set(event.slug_snapshot.clone()),
                ip_hash: Set(event.ip_hash.clone()),
                user_agent_hash: Set(event.user_agent_hash.clone()),
                country_iso: Set(event.country_iso.clone()),
                city_name: Set(event.city_name.clone()),
                referrer_domain: Set(event.referrer_domain.clone()),
                device_category: Set(event.device_category.to_string()),
                destination_id: Set(event.destination_id.clone()),
                event_kind: Set(event.event_kind.to_string()),
                created_at: Set(event.created_at),
                ..Default::default()
            };
            scan_event::Entity::insert(active).exec(db).await.map(|_| ())
        })
        .await?;

        Ok(())
    }
}
