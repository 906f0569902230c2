//! System Service Library
//!
//! System notices (audited, soft-deleted) and dictionary data (plain lookup
//! rows) on top of the generic repository layer, plus the database wrapper
//! and migrations the admin binary drives.

pub mod infra;
pub mod repository;
pub mod service;

use std::sync::Arc;

use tracing::info;

use common::{AppResult, DatabaseConfig};
use domain::ActorContext;

use crate::infra::Database;
use crate::repository::{dict_data_repository, notice_repository};
use crate::service::{DictManager, DictService, NoticeManager, NoticeService};

/// Services wired against one database connection.
#[derive(Clone)]
pub struct SystemServices {
    pub notices: Arc<dyn NoticeService>,
    pub dicts: Arc<dyn DictService>,
}

impl SystemServices {
    pub fn new(db: &Database, actor: Arc<dyn ActorContext>) -> Self {
        let notices = Arc::new(notice_repository(db.get_connection(), actor));
        let dicts = Arc::new(dict_data_repository(db.get_connection()));

        Self {
            notices: Arc::new(NoticeManager::new(notices)),
            dicts: Arc::new(DictManager::new(dicts)),
        }
    }
}

/// Migration action type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrateAction {
    Up,
    Down,
    Status,
    Fresh,
}

/// Run migrations (for CLI commands).
pub async fn run_migrations(config: &DatabaseConfig, action: MigrateAction) -> AppResult<()> {
    let db = Database::connect_without_migrations(config).await?;

    match action {
        MigrateAction::Up => {
            db.run_migrations().await?;
            info!("Migrations applied successfully");
        }
        MigrateAction::Down => {
            db.rollback_migration().await?;
            info!("Rolled back last migration");
        }
        MigrateAction::Status => {
            let status = db.migration_status().await?;
            for (name, applied) in status {
                let marker = if applied { "[x]" } else { "[ ]" };
                println!("{} {}", marker, name);
            }
        }
        MigrateAction::Fresh => {
            db.fresh_migrations().await?;
            info!("Database reset and migrations applied");
        }
    }

    Ok(())
}

/// Check database connectivity.
pub async fn check(config: &DatabaseConfig) -> AppResult<()> {
    let db = Database::connect_without_migrations(config).await?;
    db.ping().await?;
    info!("Database reachable");
    Ok(())
}
