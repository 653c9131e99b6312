//! QR 样式表迁移
//!
//! 每条 QR 记录一行，保存渲染参数和处理后的 logo PNG。

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
                    .table(QrStyles::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(QrStyles::RecordId)
                            .string_len(36)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(QrStyles::FgColor)
                            .string_len(7)
                            .not_null()
                            .default("#000000"),
                    )
                    .col(
                        ColumnDef::new(QrStyles::BgColor)
                            .string_len(7)
                            .not_null()
                            .default("#FFFFFF"),
                    )
                    .col(ColumnDef::new(QrStyles::GradientJson).string_len(64).null())
                    .col(
                        ColumnDef::new(QrStyles::ModuleStyle)
                            .string_len(16)
                            .not_null()
                            .default("dot"),
                    )
                    .col(
                        ColumnDef::new(QrStyles::EyeStyle)
                            .string_len(16)
                            .not_null()
                            .default("rounded"),
                    )
                    .col(
                        ColumnDef::new(QrStyles::QuietZone)
                            .integer()
                            .not_null()
                            .default(4),
                    )
                    .col(
                        ColumnDef::new(QrStyles::EccLevel)
                            .string_len(1)
                            .not_null()
                            .default("H"),
                    )
                    .col(
                        ColumnDef::new(QrStyles::LogoSizeRatio)
                            .double()
                            .not_null()
                            .default(0.22),
                    )
                    .col(ColumnDef::new(QrStyles::LogoPng).blob().null())
                    .col(
                        ColumnDef::new(QrStyles::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_qr_styles_record_id")
                            .from(QrStyles::Table, QrStyles::RecordId)
                            .to(Records::Table, Records::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(QrStyles::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum QrStyles {
    #[sea_orm(iden = "qr_styles")]
    Table,
    RecordId,
    FgColor,
    BgColor,
    GradientJson,
    ModuleStyle,
    EyeStyle,
    QuietZone,
    EccLevel,
    LogoSizeRatio,
    LogoPng,
    UpdatedAt,
}
