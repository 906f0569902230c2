//! System notice entity for SeaORM.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use domain::Persisted;

#[derive(Clone, Debug, Default, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "sys_notice")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub content: String,
    /// 0 = info, 1 = warning, 2 = urgent
    pub level: i32,
    pub create_time: Option<DateTimeUtc>,
    pub create_by: Option<String>,
    pub update_time: Option<DateTimeUtc>,
    pub update_by: Option<String>,
    pub audit_status: i32,
    pub audit_time: Option<DateTimeUtc>,
    pub audit_by: Option<String>,
    pub is_deleted: i32,
    pub delete_time: Option<DateTimeUtc>,
    pub delete_by: Option<String>,
    pub tenant_id: Option<i64>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Persisted for Model {
    type Key = i64;

    fn key(&self) -> i64 {
        self.id
    }
}

domain::impl_audited!(Model);
