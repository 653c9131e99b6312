pub use sea_orm_migration::prelude::*;

pub mod entities;
mod m20260301_000001_records;
mod m20260301_000002_destinations;
mod m20260301_000003_scan_events;
mod m20260305_000001_qr_styles;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260301_000001_records::Migration),
            Box::new(m20260301_000002_destinations::Migration),
            Box::new(m20260301_000003_scan_events::Migration),
            Box::new(m20260305_000001_qr_styles::Migration),
        ]
    }
}
