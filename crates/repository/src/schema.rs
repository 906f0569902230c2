//! Migration helpers for tables carrying the audit contract.

use sea_orm_migration::prelude::*;

use domain::{
    COLUMN_AUDIT_BY, COLUMN_AUDIT_STATUS, COLUMN_AUDIT_TIME, COLUMN_CREATE_BY, COLUMN_CREATE_TIME,
    COLUMN_DELETE_BY, COLUMN_DELETE_TIME, COLUMN_IS_DELETED, COLUMN_TENANT_ID, COLUMN_UPDATE_BY,
    COLUMN_UPDATE_TIME, AUDIT_STATUS_UNAUDITED, NOT_DELETED,
};

fn timestamp(name: &str) -> ColumnDef {
    ColumnDef::new(Alias::new(name))
        .timestamp_with_time_zone()
        .null()
        .to_owned()
}

fn actor(name: &str) -> ColumnDef {
    ColumnDef::new(Alias::new(name)).string_len(64).null().to_owned()
}

fn flag(name: &str, default: i32) -> ColumnDef {
    ColumnDef::new(Alias::new(name))
        .integer()
        .not_null()
        .default(default)
        .to_owned()
}

/// Add the audit-contract columns to a table definition
pub fn audit_columns(table: &mut TableCreateStatement) -> &mut TableCreateStatement {
    table
        .col(timestamp(COLUMN_CREATE_TIME))
        .col(actor(COLUMN_CREATE_BY))
        .col(timestamp(COLUMN_UPDATE_TIME))
        .col(actor(COLUMN_UPDATE_BY))
        .col(flag(COLUMN_AUDIT_STATUS, AUDIT_STATUS_UNAUDITED))
        .col(timestamp(COLUMN_AUDIT_TIME))
        .col(actor(COLUMN_AUDIT_BY))
        .col(flag(COLUMN_IS_DELETED, NOT_DELETED))
        .col(timestamp(COLUMN_DELETE_TIME))
        .col(actor(COLUMN_DELETE_BY))
        .col(ColumnDef::new(Alias::new(COLUMN_TENANT_ID)).big_integer().null())
}

/// Name of the soft-delete index on `table`
pub fn soft_delete_index_name(table: &str) -> String {
    format!("idx_{table}_{COLUMN_IS_DELETED}")
}

/// Index backing the `is_deleted = 0` filter every audited read carries
pub fn soft_delete_index(table: &str) -> IndexCreateStatement {
    Index::create()
        .name(soft_delete_index_name(table))
        .table(Alias::new(table))
        .col(Alias::new(COLUMN_IS_DELETED))
        .to_owned()
}

/// Drop statement matching [`soft_delete_index`]
pub fn drop_soft_delete_index(table: &str) -> IndexDropStatement {
    Index::drop()
        .name(soft_delete_index_name(table))
        .table(Alias::new(table))
        .to_owned()
}
