//! Repository layer for data access.

pub mod entities;

use std::sync::Arc;

use sea_orm::DatabaseConnection;

use domain::ActorContext;
use lean_repository::{AuditedRepository, Repository, SeaOrmStore};

use self::entities::{dict_data, notice};

/// SeaORM store for `sys_notice`
pub type NoticeStore = SeaOrmStore<notice::Entity, notice::ActiveModel>;

/// SeaORM store for `sys_dict_data`
pub type DictDataStore = SeaOrmStore<dict_data::Entity, dict_data::ActiveModel>;

/// Audited notice repository over the database
pub fn notice_repository(
    db: DatabaseConnection,
    actor: Arc<dyn ActorContext>,
) -> AuditedRepository<notice::Model> {
    AuditedRepository::new(Arc::new(NoticeStore::new(db)), actor)
}

pub fn dict_data_repository(db: DatabaseConnection) -> Repository<dict_data::Model> {
    Repository::new(Arc::new(DictDataStore::new(db)))
}
