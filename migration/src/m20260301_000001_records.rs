//! 记录表迁移
//!
//! short link 与 QR 记录共用一张表，通过 kind 区分。
//! slug 全局唯一，editor_token_hash 唯一（一个令牌对应一条记录）。

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Records::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Records::Id)
                            .string_len(36)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Records::Kind).string_len(16).not_null())
                    .col(ColumnDef::new(Records::Title).string_len(255).not_null())
                    .col(ColumnDef::new(Records::Slug).string_len(64).not_null())
                    .col(
                        ColumnDef::new(Records::Mode)
                            .string_len(16)
                            .not_null()
                            .default("single"),
                    )
                    .col(ColumnDef::new(Records::DefaultUrl).text().null())
                    .col(ColumnDef::new(Records::HeroImage).text().null())
                    .col(ColumnDef::new(Records::Origin).string_len(255).null())
                    .col(
                        ColumnDef::new(Records::Status)
                            .string_len(16)
                            .not_null()
                            .default("active"),
                    )
                    .col(
                        ColumnDef::new(Records::EditorTokenHash)
                            .string_len(64)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Records::PasswordHash).string_len(255).null())
                    .col(
                        ColumnDef::new(Records::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Records::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_records_slug")
                    .table(Records::Table)
                    .col(Records::Slug)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_records_editor_token_hash")
                    .table(Records::Table)
                    .col(Records::EditorTokenHash)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_records_editor_token_hash").to_owned())
            .await?;

        manager
            .drop_index(Index::drop().name("idx_records_slug").to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Records::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub(crate) enum Records {
    #[sea_orm(iden = "records")]
    Table,
    Id,
    Kind,
    Title,
    Slug,
    Mode,
    DefaultUrl,
    HeroImage,
    Origin,
    Status,
    EditorTokenHash,
    PasswordHash,
    CreatedAt,
    UpdatedAt,
}
