//! Notice service - Handles system notice use cases.
//!
//! Notices are audited rows: every write is stamped with the current actor,
//! publication goes through approve/revoke, and deleted notices stay in the
//! table but disappear from every query.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use common::{AppError, AppResult, OptionExt, Paginated, PaginationParams};
use domain::COLUMN_ID;
use lean_repository::{
    col, AuditRepository, AuditedCrudRepository, OrderBy, Predicate, ReadRepository, WriteRepository,
};

use crate::repository::entities::notice;

/// Input for publishing a notice
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewNotice {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub level: i32,
}

/// Partial update of a notice
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NoticeChanges {
    pub title: Option<String>,
    pub content: Option<String>,
    pub level: Option<i32>,
}

/// Search filters; unset fields don't restrict
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NoticeQuery {
    /// Substring of the title
    pub title: Option<String>,
    pub level: Option<i32>,
    /// Only approved (`true`) or only pending (`false`) notices
    pub audited: Option<bool>,
}

impl NoticeQuery {
    fn predicate(&self) -> Predicate<notice::Model> {
        let mut predicate = Predicate::all();
        if let Some(title) = &self.title {
            predicate = predicate.and(col("title").contains(title.as_str()));
        }
        if let Some(level) = self.level {
            predicate = predicate.and(col("level").eq(level));
        }
        match self.audited {
            Some(true) => predicate = predicate.and(col("audit_status").ne(0)),
            Some(false) => predicate = predicate.and(col("audit_status").eq(0)),
            None => {}
        }
        predicate
    }
}

/// Notice service trait for dependency injection.
#[async_trait]
pub trait NoticeService: Send + Sync {
    /// Create a pending notice; titles are unique among live notices
    async fn publish(&self, notice: NewNotice) -> AppResult<notice::Model>;

    async fn get_notice(&self, id: i64) -> AppResult<notice::Model>;

    /// Newest first
    async fn search(
        &self,
        query: NoticeQuery,
        page: PaginationParams,
    ) -> AppResult<Paginated<notice::Model>>;

    async fn update_notice(&self, id: i64, changes: NoticeChanges) -> AppResult<notice::Model>;

    async fn approve(&self, id: i64) -> AppResult<notice::Model>;

    /// Withdraw an approval
    async fn revoke(&self, id: i64) -> AppResult<notice::Model>;

    /// Soft delete by id
    async fn delete_notice(&self, id: i64) -> AppResult<()>;

    /// Soft delete every live notice with this exact title
    async fn delete_by_title(&self, title: &str) -> AppResult<bool>;
}

/// Concrete implementation of NoticeService using repository.
pub struct NoticeManager {
    repo: Arc<dyn AuditedCrudRepository<notice::Model>>,
}

impl NoticeManager {
    pub fn new(repo: Arc<dyn AuditedCrudRepository<notice::Model>>) -> Self {
        Self { repo }
    }

    async fn title_taken(&self, title: &str, except: Option<i64>) -> AppResult<bool> {
        let mut predicate = col("title").eq(title);
        if let Some(id) = except {
            predicate = predicate.and(col(COLUMN_ID).ne(id));
        }
        self.repo.any(predicate).await
    }
}

fn validate_title(title: &str) -> AppResult<()> {
    if title.trim().is_empty() {
        return Err(AppError::validation("Notice title must not be empty"));
    }
    Ok(())
}

#[async_trait]
impl NoticeService for NoticeManager {
    async fn publish(&self, input: NewNotice) -> AppResult<notice::Model> {
        validate_title(&input.title)?;
        if self.title_taken(&input.title, None).await? {
            return Err(AppError::conflict("Notice title"));
        }

        let id = self
            .repo
            .create(notice::Model {
                title: input.title,
                content: input.content,
                level: input.level,
                ..Default::default()
            })
            .await?;

        self.get_notice(id).await
    }

    async fn get_notice(&self, id: i64) -> AppResult<notice::Model> {
        self.repo.get_by_id(id).await?.ok_or_not_found()
    }

    async fn search(
        &self,
        query: NoticeQuery,
        page: PaginationParams,
    ) -> AppResult<Paginated<notice::Model>> {
        self.repo
            .get_page_list(query.predicate(), page.capped(), Some(OrderBy::desc(COLUMN_ID)))
            .await
    }

    async fn update_notice(&self, id: i64, changes: NoticeChanges) -> AppResult<notice::Model> {
        let mut current = self.get_notice(id).await?;

        if let Some(title) = changes.title {
            validate_title(&title)?;
            if title != current.title && self.title_taken(&title, Some(id)).await? {
                return Err(AppError::conflict("Notice title"));
            }
            current.title = title;
        }
        if let Some(content) = changes.content {
            current.content = content;
        }
        if let Some(level) = changes.level {
            current.level = level;
        }

        self.repo.update(current).await?;
        self.get_notice(id).await
    }

    async fn approve(&self, id: i64) -> AppResult<notice::Model> {
        let current = self.get_notice(id).await?;
        self.repo.audit(current).await?;
        self.get_notice(id).await
    }

    async fn revoke(&self, id: i64) -> AppResult<notice::Model> {
        let current = self.get_notice(id).await?;
        self.repo.revoke(current).await?;
        self.get_notice(id).await
    }

    async fn delete_notice(&self, id: i64) -> AppResult<()> {
        let current = self.get_notice(id).await?;
        if !self.repo.delete(current).await? {
            return Err(AppError::NotFound);
        }
        Ok(())
    }

    async fn delete_by_title(&self, title: &str) -> AppResult<bool> {
        self.repo.delete_where(col("title").eq(title)).await
    }
}
