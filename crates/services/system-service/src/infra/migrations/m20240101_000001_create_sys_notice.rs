//! Migration: Create the audited notice table.

use lean_repository::schema;
use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let mut table = Table::create();
        table
            .table(SysNotice::Table)
            .if_not_exists()
            .col(
                ColumnDef::new(SysNotice::Id)
                    .big_integer()
                    .not_null()
                    .auto_increment()
                    .primary_key(),
            )
            .col(ColumnDef::new(SysNotice::Title).string_len(200).not_null())
            .col(ColumnDef::new(SysNotice::Content).text().not_null())
            .col(ColumnDef::new(SysNotice::Level).integer().not_null().default(0));
        schema::audit_columns(&mut table);

        manager.create_table(table).await?;

        // Every audited read filters on the delete flag
        manager
            .create_index(schema::soft_delete_index(&SysNotice::Table.to_string()))
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(schema::drop_soft_delete_index(&SysNotice::Table.to_string()))
            .await?;

        manager
            .drop_table(Table::drop().table(SysNotice::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum SysNotice {
    Table,
    Id,
    Title,
    Content,
    Level,
}
