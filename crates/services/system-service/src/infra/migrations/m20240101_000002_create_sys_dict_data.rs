//! Migration: Create the dictionary entry table.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(SysDictData::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SysDictData::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(SysDictData::DictType).string_len(100).not_null())
                    .col(ColumnDef::new(SysDictData::DictLabel).string_len(100).not_null())
                    .col(ColumnDef::new(SysDictData::DictValue).string_len(100).not_null())
                    .col(ColumnDef::new(SysDictData::DictSort).integer().not_null().default(0))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_sys_dict_data_dict_type")
                    .table(SysDictData::Table)
                    .col(SysDictData::DictType)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(SysDictData::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum SysDictData {
    Table,
    Id,
    DictType,
    DictLabel,
    DictValue,
    DictSort,
}
