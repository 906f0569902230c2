//! Audited repository: soft delete, audit workflow and actor stamping.
//!
//! [`AuditedRepository`] decorates a [`Repository`] for entity types that
//! carry the audit contract. Every read is restricted to rows that are not
//! soft-deleted, every write is stamped with the current actor, and deletes
//! only ever flip the delete flag.

use std::any::type_name;
use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use futures::stream::BoxStream;

use common::{AppError, AppResult, Paginated, PaginationParams};
use domain::{
    Actor, ActorContext, AuditFields, Audited, AUDIT_COLUMNS, COLUMN_IS_DELETED, DELETE_COLUMNS,
    NOT_DELETED, UPDATE_PROTECTED_COLUMNS,
};

use crate::base::{by_key, CrudRepository, ReadRepository, Repository, WriteRepository};
use crate::predicate::{col, combine, Predicate};
use crate::store::{OrderBy, Store, UpdateColumns};

/// Audit workflow operations
#[async_trait]
pub trait AuditRepository<E: Audited>: Send + Sync {
    /// Mark as audited by the current actor
    async fn audit(&self, entity: E) -> AppResult<bool>;

    async fn audit_range(&self, entities: Vec<E>) -> AppResult<bool>;

    /// Reset to the never-audited state
    async fn revoke(&self, entity: E) -> AppResult<bool>;

    async fn revoke_range(&self, entities: Vec<E>) -> AppResult<bool>;
}

/// CRUD plus audit workflow
pub trait AuditedCrudRepository<E: Audited>: CrudRepository<E> + AuditRepository<E> {}

impl<T, E> AuditedCrudRepository<E> for T
where
    T: CrudRepository<E> + AuditRepository<E>,
    E: Audited,
{
}

/// Restrict `predicate` to rows that are not soft-deleted
pub fn not_deleted<E: Audited>(predicate: Predicate<E>) -> Predicate<E> {
    combine(predicate, col(COLUMN_IS_DELETED).eq(NOT_DELETED))
}

fn stamp<E: Audited>(entity: &mut E, f: impl FnOnce(&mut AuditFields)) {
    let mut fields = entity.audit_fields();
    f(&mut fields);
    entity.set_audit_fields(fields);
}

/// Repository for entities carrying the audit contract.
pub struct AuditedRepository<E: Audited> {
    inner: Repository<E>,
    actor: Arc<dyn ActorContext>,
}

impl<E: Audited> Clone for AuditedRepository<E> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            actor: self.actor.clone(),
        }
    }
}

impl<E: Audited> AuditedRepository<E> {
    pub fn new(store: Arc<dyn Store<E>>, actor: Arc<dyn ActorContext>) -> Self {
        Self::from_repository(Repository::new(store), actor)
    }

    pub fn from_repository(inner: Repository<E>, actor: Arc<dyn ActorContext>) -> Self {
        Self { inner, actor }
    }

    /// Underlying store. Reads through it see soft-deleted rows.
    pub fn store(&self) -> &Arc<dyn Store<E>> {
        self.inner.store()
    }

    fn require_actor(&self, operation: &str) -> AppResult<Actor> {
        self.actor
            .current_actor()
            .ok_or_else(|| AppError::missing_actor(operation))
    }

    /// Visible rows among `entities`, as currently stored
    async fn resolve(&self, entities: &[E]) -> AppResult<Vec<E>> {
        let keys: Vec<i64> = entities.iter().map(|e| e.key()).collect();
        self.inner
            .get_list_where(not_deleted(col(E::KEY_COLUMN).is_in(keys)))
            .await
    }

    /// Keep the caller's copies of rows that are still visible
    async fn retain_visible(&self, mut entities: Vec<E>) -> AppResult<Vec<E>> {
        let visible: HashSet<i64> = self
            .resolve(&entities)
            .await?
            .iter()
            .map(|e| e.key())
            .collect();
        entities.retain(|e| visible.contains(&e.key()));
        Ok(entities)
    }

    /// Soft-delete already resolved rows
    async fn mark_deleted(&self, actor: &Actor, mut targets: Vec<E>) -> AppResult<bool> {
        if targets.is_empty() {
            return Ok(false);
        }

        let now = Utc::now();
        for target in &mut targets {
            stamp(target, |f| f.mark_deleted(actor, now));
        }

        let count = targets.len();
        let deleted = self
            .inner
            .update_columns(targets, UpdateColumns::Only(DELETE_COLUMNS))
            .await?;
        tracing::debug!(entity = type_name::<E>(), count, by = %actor.user_id, "Soft-deleted rows");
        Ok(deleted)
    }

    async fn write_audit_columns(&self, entities: Vec<E>) -> AppResult<bool> {
        self.inner
            .update_columns(entities, UpdateColumns::Only(AUDIT_COLUMNS))
            .await
    }
}

#[async_trait]
impl<E: Audited> ReadRepository<E> for AuditedRepository<E> {
    async fn get(&self, id: i64) -> AppResult<Option<E>> {
        self.inner.first_or_default(not_deleted(by_key(id))).await
    }

    async fn first_or_default(&self, predicate: Predicate<E>) -> AppResult<Option<E>> {
        self.inner.first_or_default(not_deleted(predicate)).await
    }

    async fn get_list_where(&self, predicate: Predicate<E>) -> AppResult<Vec<E>> {
        self.inner.get_list_where(not_deleted(predicate)).await
    }

    async fn get_list_ordered(&self, predicate: Predicate<E>, order: OrderBy) -> AppResult<Vec<E>> {
        self.inner
            .get_list_ordered(not_deleted(predicate), order)
            .await
    }

    async fn count(&self, predicate: Predicate<E>) -> AppResult<u64> {
        self.inner.count(not_deleted(predicate)).await
    }

    async fn get_page_list(
        &self,
        predicate: Predicate<E>,
        page: PaginationParams,
        order: Option<OrderBy>,
    ) -> AppResult<Paginated<E>> {
        self.inner
            .get_page_list(not_deleted(predicate), page, order)
            .await
    }

    fn stream_batches(
        &self,
        predicate: Predicate<E>,
        batch_size: u64,
    ) -> BoxStream<'_, AppResult<Vec<E>>> {
        self.inner.stream_batches(not_deleted(predicate), batch_size)
    }
}

#[async_trait]
impl<E: Audited> WriteRepository<E> for AuditedRepository<E> {
    async fn create(&self, mut entity: E) -> AppResult<i64> {
        let actor = self.require_actor("create")?;
        stamp(&mut entity, |f| f.mark_created(&actor, Utc::now()));

        let id = self.inner.create(entity).await?;
        tracing::debug!(entity = type_name::<E>(), id, by = %actor.user_id, "Created row");
        Ok(id)
    }

    async fn create_range(&self, mut entities: Vec<E>) -> AppResult<bool> {
        if entities.is_empty() {
            return Ok(false);
        }
        let actor = self.require_actor("create")?;

        let now = Utc::now();
        for entity in &mut entities {
            stamp(entity, |f| f.mark_created(&actor, now));
        }

        let count = entities.len();
        let created = self.inner.create_range(entities).await?;
        tracing::debug!(entity = type_name::<E>(), count, by = %actor.user_id, "Created rows");
        Ok(created)
    }

    async fn update(&self, entity: E) -> AppResult<bool> {
        self.update_range(vec![entity]).await
    }

    async fn update_range(&self, entities: Vec<E>) -> AppResult<bool> {
        if entities.is_empty() {
            return Ok(false);
        }
        let actor = self.require_actor("update")?;
        let mut entities = self.retain_visible(entities).await?;
        if entities.is_empty() {
            return Ok(false);
        }

        let now = Utc::now();
        for entity in &mut entities {
            stamp(entity, |f| f.mark_updated(&actor, now));
        }

        let count = entities.len();
        let updated = self
            .inner
            .update_columns(entities, UpdateColumns::Ignore(UPDATE_PROTECTED_COLUMNS))
            .await?;
        tracing::debug!(entity = type_name::<E>(), count, by = %actor.user_id, "Updated rows");
        Ok(updated)
    }

    async fn delete(&self, entity: E) -> AppResult<bool> {
        self.delete_range(vec![entity]).await
    }

    async fn delete_where(&self, predicate: Predicate<E>) -> AppResult<bool> {
        let actor = self.require_actor("delete")?;
        let targets = self.inner.get_list_where(not_deleted(predicate)).await?;
        self.mark_deleted(&actor, targets).await
    }

    async fn delete_range(&self, entities: Vec<E>) -> AppResult<bool> {
        if entities.is_empty() {
            return Ok(false);
        }
        let actor = self.require_actor("delete")?;
        let targets = self.resolve(&entities).await?;
        self.mark_deleted(&actor, targets).await
    }
}

#[async_trait]
impl<E: Audited> AuditRepository<E> for AuditedRepository<E> {
    async fn audit(&self, entity: E) -> AppResult<bool> {
        self.audit_range(vec![entity]).await
    }

    async fn audit_range(&self, entities: Vec<E>) -> AppResult<bool> {
        if entities.is_empty() {
            return Ok(false);
        }
        let actor = self.require_actor("audit")?;
        let mut entities = self.retain_visible(entities).await?;
        if entities.is_empty() {
            return Ok(false);
        }

        let now = Utc::now();
        for entity in &mut entities {
            stamp(entity, |f| f.mark_audited(&actor, now));
        }

        let count = entities.len();
        let audited = self.write_audit_columns(entities).await?;
        tracing::debug!(entity = type_name::<E>(), count, by = %actor.user_id, "Audited rows");
        Ok(audited)
    }

    async fn revoke(&self, entity: E) -> AppResult<bool> {
        self.revoke_range(vec![entity]).await
    }

    async fn revoke_range(&self, entities: Vec<E>) -> AppResult<bool> {
        if entities.is_empty() {
            return Ok(false);
        }
        let mut entities = self.retain_visible(entities).await?;
        if entities.is_empty() {
            return Ok(false);
        }

        for entity in &mut entities {
            stamp(entity, AuditFields::mark_revoked);
        }

        let count = entities.len();
        let revoked = self.write_audit_columns(entities).await?;
        tracing::debug!(entity = type_name::<E>(), count, "Revoked audits");
        Ok(revoked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::ScopedActor;
    use crate::store::{MemoryStore, MockStore, Query};
    use chrono::{DateTime, Utc};
    use domain::{Anonymous, Persisted, AUDIT_STATUS_APPROVED, DELETED};
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    struct Memo {
        id: i64,
        name: String,
        create_time: Option<DateTime<Utc>>,
        create_by: Option<String>,
        update_time: Option<DateTime<Utc>>,
        update_by: Option<String>,
        audit_status: i32,
        audit_time: Option<DateTime<Utc>>,
        audit_by: Option<String>,
        is_deleted: i32,
        delete_time: Option<DateTime<Utc>>,
        delete_by: Option<String>,
        tenant_id: Option<i64>,
    }

    impl Persisted for Memo {
        type Key = i64;

        fn key(&self) -> i64 {
            self.id
        }
    }

    domain::impl_audited!(Memo);

    fn memo(name: &str) -> Memo {
        Memo {
            name: name.to_string(),
            ..Default::default()
        }
    }

    fn actor(user: &str) -> Arc<dyn ActorContext> {
        Arc::new(Actor::new(user, Some(9)).unwrap())
    }

    fn repo() -> (Arc<MemoryStore<Memo>>, AuditedRepository<Memo>) {
        let store: Arc<MemoryStore<Memo>> = Arc::new(MemoryStore::new());
        let repo: AuditedRepository<Memo> = AuditedRepository::new(store.clone(), actor("admin"));
        (store, repo)
    }

    async fn raw(store: &MemoryStore<Memo>) -> Vec<Memo> {
        store.find(Query::filter(Predicate::all())).await.unwrap()
    }

    #[tokio::test]
    async fn create_stamps_actor_and_resets_workflow_fields() {
        let (_, repo) = repo();
        let mut input = memo("A");
        input.audit_status = 4;
        input.is_deleted = DELETED;
        input.create_by = Some("forged".into());

        let id = repo.create(input).await.unwrap();
        let stored = repo.get(id).await.unwrap().unwrap();

        assert_eq!(stored.create_by.as_deref(), Some("admin"));
        assert_eq!(stored.tenant_id, Some(9));
        assert!(stored.create_time.is_some());
        assert_eq!(stored.audit_status, 0);
        assert_eq!(stored.is_deleted, NOT_DELETED);
    }

    #[tokio::test]
    async fn delete_where_is_soft() {
        let (store, repo) = repo();
        repo.create(memo("A")).await.unwrap();

        assert!(repo.delete_where(col("name").eq("A")).await.unwrap());
        assert!(repo.get_list().await.unwrap().is_empty());

        let rows = raw(&store).await;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].is_deleted, DELETED);
        assert_eq!(rows[0].delete_by.as_deref(), Some("admin"));
        assert!(rows[0].delete_time.is_some());
    }

    #[tokio::test]
    async fn soft_deleted_rows_are_invisible_to_every_read() {
        let (_, repo) = repo();
        let kept = repo.create(memo("keep")).await.unwrap();
        let gone = repo.create(memo("gone")).await.unwrap();
        let row = repo.get(gone).await.unwrap().unwrap();
        assert!(repo.delete(row).await.unwrap());

        assert!(repo.get(gone).await.unwrap().is_none());
        assert!(repo.get_by_id(gone).await.unwrap().is_none());
        assert!(repo.get_where(col("name").eq("gone")).await.unwrap().is_none());
        assert!(!repo.any(col("name").eq("gone")).await.unwrap());
        assert_eq!(repo.count(Predicate::all()).await.unwrap(), 1);

        let ordered = repo
            .get_list_ordered(Predicate::all(), OrderBy::desc("name"))
            .await
            .unwrap();
        assert_eq!(ordered.iter().map(|m| m.id).collect::<Vec<_>>(), vec![kept]);

        let page = repo
            .get_page_list(Predicate::all(), PaginationParams::new(1, 10), None)
            .await
            .unwrap();
        assert_eq!(page.total(), 1);
        assert_eq!(page.data.len(), 1);

        let batch = repo.get_batch(Predicate::all(), 1).await.unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].id, kept);
    }

    #[tokio::test]
    async fn update_never_rewrites_creation_audit_or_delete_columns() {
        let (_, repo) = repo();
        let id = repo.create(memo("A")).await.unwrap();
        let original = repo.get(id).await.unwrap().unwrap();

        let mut edited = original.clone();
        edited.name = "B".into();
        edited.create_by = Some("mallory".into());
        edited.create_time = None;
        edited.tenant_id = Some(666);
        edited.audit_status = 7;
        edited.is_deleted = DELETED;

        let editor = AuditedRepository::from_repository(repo.inner.clone(), actor("editor"));
        assert!(editor.update(edited).await.unwrap());

        let stored = repo.get(id).await.unwrap().unwrap();
        assert_eq!(stored.name, "B");
        assert_eq!(stored.create_by, original.create_by);
        assert_eq!(stored.create_time, original.create_time);
        assert_eq!(stored.tenant_id, original.tenant_id);
        assert_eq!(stored.audit_status, 0);
        assert_eq!(stored.is_deleted, NOT_DELETED);
        assert_eq!(stored.update_by.as_deref(), Some("editor"));
        assert!(stored.update_time.is_some());
    }

    #[tokio::test]
    async fn audit_then_revoke_restores_baseline() {
        let (_, repo) = repo();
        let id = repo.create(memo("A")).await.unwrap();
        let baseline = repo.get(id).await.unwrap().unwrap();

        assert!(repo.audit(baseline.clone()).await.unwrap());
        let audited = repo.get(id).await.unwrap().unwrap();
        assert_eq!(audited.audit_status, AUDIT_STATUS_APPROVED);
        assert_eq!(audited.audit_by.as_deref(), Some("admin"));
        assert!(audited.audit_time.is_some());
        assert_eq!(audited.is_deleted, NOT_DELETED);

        let reviewer = AuditedRepository::from_repository(repo.inner.clone(), Arc::new(Anonymous));
        assert!(reviewer.revoke(audited).await.unwrap());
        let revoked = repo.get(id).await.unwrap().unwrap();
        assert_eq!(revoked.audit_fields(), baseline.audit_fields());
    }

    #[tokio::test]
    async fn audit_keeps_caller_status_and_writes_audit_columns_only() {
        let (_, repo) = repo();
        let id = repo.create(memo("A")).await.unwrap();

        let mut row = repo.get(id).await.unwrap().unwrap();
        row.audit_status = 2;
        row.name = "not persisted".into();
        assert!(repo.audit(row).await.unwrap());

        let stored = repo.get(id).await.unwrap().unwrap();
        assert_eq!(stored.audit_status, 2);
        assert_eq!(stored.name, "A");
    }

    #[tokio::test]
    async fn delete_where_is_idempotent() {
        let (store, repo) = repo();
        repo.create(memo("A")).await.unwrap();

        assert!(repo.delete_where(col("name").eq("A")).await.unwrap());
        let first_stamp = raw(&store).await[0].delete_time;

        let other = AuditedRepository::from_repository(repo.inner.clone(), actor("other"));
        assert!(!other.delete_where(col("name").eq("A")).await.unwrap());

        let row = &raw(&store).await[0];
        assert_eq!(row.delete_time, first_stamp);
        assert_eq!(row.delete_by.as_deref(), Some("admin"));
    }

    #[tokio::test]
    async fn deleting_a_missing_row_reports_false() {
        let (_, repo) = repo();
        let ghost = Memo {
            id: 41,
            ..memo("ghost")
        };
        assert!(!repo.delete(ghost).await.unwrap());
        assert!(!repo.delete_where(col("name").eq("nobody")).await.unwrap());
    }

    #[tokio::test]
    async fn stale_copies_of_deleted_rows_are_not_written() {
        let (store, repo) = repo();
        let id = repo.create(memo("A")).await.unwrap();
        let stale = repo.get(id).await.unwrap().unwrap();
        assert!(repo.delete(stale.clone()).await.unwrap());

        let mut edited = stale.clone();
        edited.name = "B".into();
        assert!(!repo.update(edited).await.unwrap());
        assert!(!repo.audit(stale.clone()).await.unwrap());
        assert!(!repo.revoke(stale).await.unwrap());

        let row = &raw(&store).await[0];
        assert_eq!(row.name, "A");
        assert_eq!(row.audit_status, 0);
        assert!(row.update_by.is_none());
        assert_eq!(row.is_deleted, DELETED);
    }

    #[tokio::test]
    async fn mixed_ranges_only_write_visible_rows() {
        let (store, repo) = repo();
        let live = repo.create(memo("live")).await.unwrap();
        let gone = repo.create(memo("gone")).await.unwrap();
        let live_row = repo.get(live).await.unwrap().unwrap();
        let gone_row = repo.get(gone).await.unwrap().unwrap();
        assert!(repo.delete(gone_row.clone()).await.unwrap());

        assert!(repo.audit_range(vec![live_row, gone_row]).await.unwrap());

        let rows = raw(&store).await;
        assert_eq!(rows[0].audit_status, AUDIT_STATUS_APPROVED);
        assert_eq!(rows[1].audit_status, 0);
        assert!(rows[1].audit_by.is_none());
    }

    #[tokio::test]
    async fn empty_ranges_touch_neither_store_nor_actor() {
        let mut store = MockStore::<Memo>::new();
        store.expect_insert_many().never();
        store.expect_update_many().never();
        store.expect_find().never();

        let repo: AuditedRepository<Memo> = AuditedRepository::new(Arc::new(store), Arc::new(Anonymous));
        assert!(!repo.create_range(vec![]).await.unwrap());
        assert!(!repo.update_range(vec![]).await.unwrap());
        assert!(!repo.delete_range(vec![]).await.unwrap());
        assert!(!repo.audit_range(vec![]).await.unwrap());
        assert!(!repo.revoke_range(vec![]).await.unwrap());
    }

    #[tokio::test]
    async fn stamped_writes_without_actor_fail_before_the_store() {
        let mut store = MockStore::<Memo>::new();
        store.expect_insert().never();
        store.expect_insert_many().never();
        store.expect_update_many().never();
        store.expect_find().never();

        let repo: AuditedRepository<Memo> = AuditedRepository::new(Arc::new(store), Arc::new(Anonymous));
        let row = Memo {
            id: 1,
            ..memo("A")
        };

        let results = vec![
            repo.create(row.clone()).await,
            repo.create_range(vec![row.clone()]).await.map(|_| 0),
            repo.update(row.clone()).await.map(|_| 0),
            repo.audit(row.clone()).await.map(|_| 0),
            repo.delete(row).await.map(|_| 0),
            repo.delete_where(Predicate::all()).await.map(|_| 0),
        ];
        for result in results {
            assert!(matches!(result, Err(ref e) if e.is_configuration()), "{result:?}");
        }
    }

    #[tokio::test]
    async fn scoped_actor_is_read_per_call() {
        let store: Arc<MemoryStore<Memo>> = Arc::new(MemoryStore::new());
        let repo: AuditedRepository<Memo> = AuditedRepository::new(store, Arc::new(ScopedActor));

        let alice = Actor::new("alice", Some(1)).unwrap();
        let bob = Actor::new("bob", Some(2)).unwrap();

        let id = ScopedActor::scope(alice, repo.create(memo("A"))).await.unwrap();
        let row = repo.get(id).await.unwrap().unwrap();
        ScopedActor::scope(bob, repo.update(row)).await.unwrap();

        let stored = repo.get(id).await.unwrap().unwrap();
        assert_eq!(stored.create_by.as_deref(), Some("alice"));
        assert_eq!(stored.tenant_id, Some(1));
        assert_eq!(stored.update_by.as_deref(), Some("bob"));

        assert!(repo.create(memo("outside")).await.is_err());
    }

    #[tokio::test]
    async fn read_failures_propagate() {
        let mut store = MockStore::<Memo>::new();
        store
            .expect_count()
            .returning(|_| Err(AppError::internal("pool timed out")));

        let repo: AuditedRepository<Memo> = AuditedRepository::new(Arc::new(store), actor("admin"));
        assert!(matches!(
            repo.any(Predicate::all()).await,
            Err(AppError::Internal(_))
        ));
    }

    #[tokio::test]
    async fn reads_always_carry_the_not_deleted_filter() {
        let mut store = MockStore::<Memo>::new();
        store.expect_count().returning(|filter| {
            let visible: Predicate<Memo> = not_deleted(col("name").eq("A"));
            assert_eq!(filter, visible);
            Ok(0)
        });

        let repo: AuditedRepository<Memo> = AuditedRepository::new(Arc::new(store), actor("admin"));
        assert_eq!(repo.count(col("name").eq("A")).await.unwrap(), 0);
    }
}
