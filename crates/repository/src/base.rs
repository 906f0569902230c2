//! Base repository traits following Interface Segregation Principle (ISP).
//!
//! `ReadRepository` and `WriteRepository` are the capability surface every
//! domain service programs against. [`Repository`] implements both over a
//! [`Store`] with no opinion on soft delete or audit fields.

use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};

use common::{AppError, AppResult, Paginated, PaginationParams};
use domain::Persisted;

use crate::predicate::{col, Predicate};
use crate::store::{OrderBy, Query, Store, UpdateColumns};

/// Read operations (Query) - Single Responsibility
#[async_trait]
pub trait ReadRepository<E: Persisted>: Send + Sync {
    /// Find entity by key; `None` when absent
    async fn get(&self, id: E::Key) -> AppResult<Option<E>>;

    async fn get_by_id(&self, id: E::Key) -> AppResult<Option<E>> {
        self.get(id).await
    }

    /// First match, or `None`
    async fn first_or_default(&self, predicate: Predicate<E>) -> AppResult<Option<E>>;

    async fn get_where(&self, predicate: Predicate<E>) -> AppResult<Option<E>> {
        self.first_or_default(predicate).await
    }

    /// All rows, in store order
    async fn get_list(&self) -> AppResult<Vec<E>> {
        self.get_list_where(Predicate::all()).await
    }

    /// All matches, in store order
    async fn get_list_where(&self, predicate: Predicate<E>) -> AppResult<Vec<E>>;

    /// All matches, sorted
    async fn get_list_ordered(&self, predicate: Predicate<E>, order: OrderBy) -> AppResult<Vec<E>>;

    async fn any(&self, predicate: Predicate<E>) -> AppResult<bool> {
        Ok(self.count(predicate).await? > 0)
    }

    async fn count(&self, predicate: Predicate<E>) -> AppResult<u64>;

    /// One page of matches plus the total number of matches.
    ///
    /// Without an explicit order the store's default order applies.
    async fn get_page_list(
        &self,
        predicate: Predicate<E>,
        page: PaginationParams,
        order: Option<OrderBy>,
    ) -> AppResult<Paginated<E>>;

    /// Walk all matches in pages of at most `batch_size` rows, one
    /// round-trip per page, issued sequentially.
    fn stream_batches(
        &self,
        predicate: Predicate<E>,
        batch_size: u64,
    ) -> BoxStream<'_, AppResult<Vec<E>>>;

    /// All matches, fetched through [`ReadRepository::stream_batches`]
    async fn get_batch(&self, predicate: Predicate<E>, batch_size: u64) -> AppResult<Vec<E>> {
        self.stream_batches(predicate, batch_size)
            .try_concat()
            .await
    }
}

/// Write operations (Command) - Single Responsibility
#[async_trait]
pub trait WriteRepository<E: Persisted>: Send + Sync {
    /// Insert and return the assigned key
    async fn create(&self, entity: E) -> AppResult<E::Key>;

    /// `true` when at least one row was inserted; empty input is a no-op
    async fn create_range(&self, entities: Vec<E>) -> AppResult<bool>;

    async fn update(&self, entity: E) -> AppResult<bool>;

    async fn update_range(&self, entities: Vec<E>) -> AppResult<bool>;

    async fn delete(&self, entity: E) -> AppResult<bool>;

    /// Delete every match; `false` when nothing matched
    async fn delete_where(&self, predicate: Predicate<E>) -> AppResult<bool>;

    async fn delete_range(&self, entities: Vec<E>) -> AppResult<bool>;
}

/// Full CRUD repository - Combines all operations
/// Follows Open/Closed Principle: extend by implementing individual traits
pub trait CrudRepository<E: Persisted>: ReadRepository<E> + WriteRepository<E> {}

// Auto-implement CrudRepository for types implementing all traits
impl<T, E> CrudRepository<E> for T
where
    T: ReadRepository<E> + WriteRepository<E>,
    E: Persisted,
{
}

/// Sequential fixed-size page walk over a store, ordered by key.
pub(crate) fn batches<'a, E: Persisted>(
    store: &'a dyn Store<E>,
    predicate: Predicate<E>,
    batch_size: u64,
) -> BoxStream<'a, AppResult<Vec<E>>> {
    if batch_size == 0 {
        let error = AppError::validation("batch size must be greater than zero");
        return stream::once(async move { Err::<Vec<E>, _>(error) }).boxed();
    }

    stream::try_unfold(Some(0u64), move |offset| {
        let predicate = predicate.clone();
        async move {
            let Some(offset) = offset else {
                return Ok::<_, AppError>(None);
            };

            let query = Query::filter(predicate)
                .order_by(Some(OrderBy::asc(E::KEY_COLUMN)))
                .page(offset, batch_size);
            let rows = store.find(query).await?;
            if rows.is_empty() {
                return Ok(None);
            }

            let next = (rows.len() as u64 == batch_size).then_some(offset + batch_size);
            Ok(Some((rows, next)))
        }
    })
    .boxed()
}

/// Plain store-backed repository.
pub struct Repository<E: Persisted> {
    store: Arc<dyn Store<E>>,
}

impl<E: Persisted> Clone for Repository<E> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}

impl<E: Persisted> Repository<E> {
    pub fn new(store: Arc<dyn Store<E>>) -> Self {
        Self { store }
    }

    /// Underlying store, for queries this surface doesn't cover
    pub fn store(&self) -> &Arc<dyn Store<E>> {
        &self.store
    }

    /// Update rows writing only the selected columns
    pub(crate) async fn update_columns(
        &self,
        entities: Vec<E>,
        columns: UpdateColumns,
    ) -> AppResult<bool> {
        if entities.is_empty() {
            return Ok(false);
        }
        Ok(self.store.update_many(entities, columns).await? > 0)
    }
}

#[async_trait]
impl<E: Persisted> ReadRepository<E> for Repository<E> {
    async fn get(&self, id: E::Key) -> AppResult<Option<E>> {
        self.store.find_by_key(id).await
    }

    async fn first_or_default(&self, predicate: Predicate<E>) -> AppResult<Option<E>> {
        let rows = self.store.find(Query::filter(predicate).limit(1)).await?;
        Ok(rows.into_iter().next())
    }

    async fn get_list_where(&self, predicate: Predicate<E>) -> AppResult<Vec<E>> {
        self.store.find(Query::filter(predicate)).await
    }

    async fn get_list_ordered(&self, predicate: Predicate<E>, order: OrderBy) -> AppResult<Vec<E>> {
        self.store
            .find(Query::filter(predicate).order_by(Some(order)))
            .await
    }

    async fn count(&self, predicate: Predicate<E>) -> AppResult<u64> {
        self.store.count(predicate).await
    }

    async fn get_page_list(
        &self,
        predicate: Predicate<E>,
        page: PaginationParams,
        order: Option<OrderBy>,
    ) -> AppResult<Paginated<E>> {
        if page.per_page == 0 {
            return Err(AppError::validation("page size must be greater than zero"));
        }

        let total = self.store.count(predicate.clone()).await?;
        let data = if page.offset() < total {
            let query = Query::filter(predicate)
                .order_by(order)
                .page(page.offset(), page.per_page);
            self.store.find(query).await?
        } else {
            Vec::new()
        };

        Ok(Paginated::new(data, page.page.max(1), page.per_page, total))
    }

    fn stream_batches(
        &self,
        predicate: Predicate<E>,
        batch_size: u64,
    ) -> BoxStream<'_, AppResult<Vec<E>>> {
        batches(self.store.as_ref(), predicate, batch_size)
    }
}

#[async_trait]
impl<E: Persisted> WriteRepository<E> for Repository<E> {
    async fn create(&self, entity: E) -> AppResult<E::Key> {
        self.store.insert(entity).await
    }

    async fn create_range(&self, entities: Vec<E>) -> AppResult<bool> {
        if entities.is_empty() {
            return Ok(false);
        }
        Ok(self.store.insert_many(entities).await? > 0)
    }

    async fn update(&self, entity: E) -> AppResult<bool> {
        self.update_columns(vec![entity], UpdateColumns::All).await
    }

    async fn update_range(&self, entities: Vec<E>) -> AppResult<bool> {
        self.update_columns(entities, UpdateColumns::All).await
    }

    async fn delete(&self, entity: E) -> AppResult<bool> {
        self.delete_range(vec![entity]).await
    }

    async fn delete_where(&self, predicate: Predicate<E>) -> AppResult<bool> {
        let targets = self.get_list_where(predicate).await?;
        self.delete_range(targets).await
    }

    async fn delete_range(&self, entities: Vec<E>) -> AppResult<bool> {
        if entities.is_empty() {
            return Ok(false);
        }
        Ok(self.store.delete_many(entities).await? > 0)
    }
}

/// Key-equality predicate for `E`
pub(crate) fn by_key<E: Persisted>(key: E::Key) -> Predicate<E> {
    col(E::KEY_COLUMN).eq(key)
}
