//! Relational store abstraction.
//!
//! Repositories never talk to a database directly; they issue [`Query`]s and
//! batch writes against a [`Store`]. Two implementations ship with the crate:
//! [`SeaOrmStore`] for real databases and [`MemoryStore`] for tests.

mod memory;
mod orm;

use async_trait::async_trait;

use common::AppResult;
use domain::Persisted;

use crate::predicate::Predicate;

pub use memory::MemoryStore;
pub use orm::SeaOrmStore;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Sort key for a query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub column: String,
    pub ascending: bool,
}

impl OrderBy {
    pub fn asc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            ascending: true,
        }
    }

    pub fn desc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            ascending: false,
        }
    }

    pub fn new(column: impl Into<String>, ascending: bool) -> Self {
        Self {
            column: column.into(),
            ascending,
        }
    }
}

/// A read request against a store
#[derive(Debug, Clone)]
pub struct Query<E> {
    pub filter: Predicate<E>,
    pub order: Option<OrderBy>,
    pub offset: Option<u64>,
    pub limit: Option<u64>,
}

impl<E> Query<E> {
    pub fn filter(filter: Predicate<E>) -> Self {
        Self {
            filter,
            order: None,
            offset: None,
            limit: None,
        }
    }

    pub fn order_by(mut self, order: Option<OrderBy>) -> Self {
        self.order = order;
        self
    }

    pub fn page(mut self, offset: u64, limit: u64) -> Self {
        self.offset = Some(offset);
        self.limit = Some(limit);
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Which columns an update writes. The key column is never written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateColumns {
    All,
    Ignore(&'static [&'static str]),
    Only(&'static [&'static str]),
}

impl UpdateColumns {
    pub fn includes(&self, column: &str) -> bool {
        match self {
            UpdateColumns::All => true,
            UpdateColumns::Ignore(columns) => !columns.contains(&column),
            UpdateColumns::Only(columns) => columns.contains(&column),
        }
    }
}

/// Relational store client for one entity type.
///
/// Implementations translate predicates to their native query form, assign
/// keys on insert and report affected-row counts. Failures are returned as
/// they are; callers see connectivity and constraint errors unchanged.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait Store<E: Persisted>: Send + Sync {
    async fn find_by_key(&self, key: E::Key) -> AppResult<Option<E>>;

    async fn find(&self, query: Query<E>) -> AppResult<Vec<E>>;

    async fn count(&self, filter: Predicate<E>) -> AppResult<u64>;

    /// Insert one row and return its assigned key
    async fn insert(&self, entity: E) -> AppResult<E::Key>;

    /// Insert rows, returning the affected-row count
    async fn insert_many(&self, entities: Vec<E>) -> AppResult<u64>;

    /// Update rows by key, writing the selected columns only
    async fn update_many(&self, entities: Vec<E>, columns: UpdateColumns) -> AppResult<u64>;

    /// Physically delete rows by key
    async fn delete_many(&self, entities: Vec<E>) -> AppResult<u64>;
}
