//! Dictionary entry entity for SeaORM.
//!
//! Plain lookup data: no audit contract, deletes are physical.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use domain::Persisted;

#[derive(Clone, Debug, Default, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "sys_dict_data")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub dict_type: String,
    pub dict_label: String,
    pub dict_value: String,
    pub dict_sort: i32,
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
