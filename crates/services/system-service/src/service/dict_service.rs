//! Dictionary service - Lookup values grouped by dictionary type.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use common::{AppError, AppResult};
use lean_repository::{col, CrudRepository, OrderBy, ReadRepository, WriteRepository};

use crate::repository::entities::dict_data;

/// Input for a new dictionary entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewDictData {
    pub dict_type: String,
    pub dict_label: String,
    pub dict_value: String,
    #[serde(default)]
    pub dict_sort: i32,
}

impl From<NewDictData> for dict_data::Model {
    fn from(input: NewDictData) -> Self {
        Self {
            id: 0,
            dict_type: input.dict_type,
            dict_label: input.dict_label,
            dict_value: input.dict_value,
            dict_sort: input.dict_sort,
        }
    }
}

/// Dictionary service trait for dependency injection.
#[async_trait]
pub trait DictService: Send + Sync {
    /// Entries of one type, by sort order
    async fn list_by_type(&self, dict_type: &str) -> AppResult<Vec<dict_data::Model>>;

    /// Insert entries in one round-trip; `false` for an empty batch
    async fn create_batch(&self, entries: Vec<NewDictData>) -> AppResult<bool>;

    async fn update_entry(&self, entry: dict_data::Model) -> AppResult<()>;

    async fn remove(&self, id: i64) -> AppResult<()>;

    /// Remove every entry of a type
    async fn remove_type(&self, dict_type: &str) -> AppResult<bool>;
}

/// Concrete implementation of DictService using repository.
pub struct DictManager {
    repo: Arc<dyn CrudRepository<dict_data::Model>>,
}

impl DictManager {
    pub fn new(repo: Arc<dyn CrudRepository<dict_data::Model>>) -> Self {
        Self { repo }
    }
}

#[async_trait]
impl DictService for DictManager {
    async fn list_by_type(&self, dict_type: &str) -> AppResult<Vec<dict_data::Model>> {
        self.repo
            .get_list_ordered(col("dict_type").eq(dict_type), OrderBy::asc("dict_sort"))
            .await
    }

    async fn create_batch(&self, entries: Vec<NewDictData>) -> AppResult<bool> {
        if entries.iter().any(|e| e.dict_type.trim().is_empty()) {
            return Err(AppError::validation("Dictionary type must not be empty"));
        }

        let count = entries.len();
        let created = self
            .repo
            .create_range(entries.into_iter().map(Into::into).collect())
            .await?;
        tracing::debug!(count, "Dictionary entries created");
        Ok(created)
    }

    async fn update_entry(&self, entry: dict_data::Model) -> AppResult<()> {
        if !self.repo.update(entry).await? {
            return Err(AppError::NotFound);
        }
        Ok(())
    }

    async fn remove(&self, id: i64) -> AppResult<()> {
        let entry = self.repo.get(id).await?.ok_or(AppError::NotFound)?;
        self.repo.delete(entry).await?;
        Ok(())
    }

    async fn remove_type(&self, dict_type: &str) -> AppResult<bool> {
        self.repo.delete_where(col("dict_type").eq(dict_type)).await
    }
}
