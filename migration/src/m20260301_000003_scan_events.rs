//! 扫描事件表迁移
//!
//! 只追加、不修改。IP 与 UserAgent 只保存哈希。
//! 索引覆盖按记录聚合与按记录 + 时间范围查询。

use sea_orm_migration::prelude::*;

use super::m20260301_000001_records::Records;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ScanEvents::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ScanEvents::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ScanEvents::RecordId)
                            .string_len(36)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ScanEvents::SlugSnapshot)
                            .string_len(64)
                            .not_null(),
                    )
                    .col(ColumnDef::new(ScanEvents::IpHash).string_len(64).not_null())
                    .col(
                        ColumnDef::new(ScanEvents::UserAgentHash)
                            .string_len(64)
                            .not_null(),
                    )
                    .col(ColumnDef::new(ScanEvents::CountryIso).string_len(2).null())
                    .col(ColumnDef::new(ScanEvents::CityName).string_len(100).null())
                    .col(
                        ColumnDef::new(ScanEvents::ReferrerDomain)
                            .string_len(255)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(ScanEvents::DeviceCategory)
                            .string_len(16)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ScanEvents::DestinationId)
                            .string_len(64)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(ScanEvents::EventKind)
                            .string_len(16)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ScanEvents::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_scan_events_record_id")
                            .from(ScanEvents::Table, ScanEvents::RecordId)
                            .to(Records::Table, Records::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_scan_events_record_id")
                    .table(ScanEvents::Table)
                    .col(ScanEvents::RecordId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_scan_events_record_time")
                    .table(ScanEvents::Table)
                    .col(ScanEvents::RecordId)
                    .col(ScanEvents::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_scan_events_record_time").to_owned())
            .await?;

        manager
            .drop_index(Index::drop().name("idx_scan_events_record_id").to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(ScanEvents::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum ScanEvents {
    #[sea_orm(iden = "scan_events")]
    Table,
    Id,
    RecordId,
    SlugSnapshot,
    IpHash,
    UserAgentHash,
    CountryIso,
    CityName,
    ReferrerDomain,
    DeviceCategory,
    DestinationId,
    EventKind,
    CreatedAt,
}
