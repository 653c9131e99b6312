//! 目的地表迁移
//!
//! 每条记录的有序目的地列表。position 不要求唯一，
//! seq 保存写入顺序，用于 position 相同时的稳定排序。

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
                    .table(Destinations::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Destinations::Id)
                            .string_len(64)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Destinations::RecordId)
                            .string_len(36)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Destinations::Title)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Destinations::Url).text().not_null())
                    .col(
                        ColumnDef::new(Destinations::Position)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Destinations::Seq)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Destinations::Image).text().null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_destinations_record_id")
                            .from(Destinations::Table, Destinations::RecordId)
                            .to(Records::Table, Records::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // 按记录读取有序目的地
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_destinations_record_position")
                    .table(Destinations::Table)
                    .col(Destinations::RecordId)
                    .col(Destinations::Position)
                    .col(Destinations::Seq)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_destinations_record_position")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(Destinations::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Destinations {
    #[sea_orm(iden = "destinations")]
    Table,
    Id,
    RecordId,
    Title,
    Url,
    Position,
    Seq,
    Image,
}
