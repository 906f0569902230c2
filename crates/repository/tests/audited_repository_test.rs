//! Audited repository tests through the public API.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use serde::{Deserialize, Serialize};

use common::{AppError, PaginationParams};
use lean_repository::{
    col, Actor, AuditRepository, AuditedCrudRepository, AuditedRepository, MemoryStore, OrderBy,
    Persisted, Predicate, Query, ReadRepository, Store, WriteRepository,
};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct Article {
    id: i64,
    name: String,
    views: i64,
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

impl Persisted for Article {
    type Key = i64;

    fn key(&self) -> i64 {
        self.id
    }
}

lean_repository::impl_audited!(Article);

fn article(name: &str, views: i64) -> Article {
    Article {
        name: name.to_string(),
        views,
        ..Default::default()
    }
}

fn setup() -> (Arc<MemoryStore<Article>>, Arc<dyn AuditedCrudRepository<Article>>) {
    let store: Arc<MemoryStore<Article>> = Arc::new(MemoryStore::new());
    let actor = Arc::new(Actor::new("editor", Some(3)).unwrap());
    let repo: AuditedRepository<Article> = AuditedRepository::new(store.clone(), actor);
    (store, Arc::new(repo))
}

#[tokio::test]
async fn test_deleted_row_stays_in_store() {
    let (store, repo) = setup();

    repo.create(article("A", 0)).await.unwrap();
    assert!(repo.delete_where(col("name").eq("A")).await.unwrap());

    assert!(repo.get_list().await.unwrap().is_empty());

    let raw = store.find(Query::filter(Predicate::all())).await.unwrap();
    assert_eq!(raw.len(), 1);
    assert_eq!(raw[0].name, "A");
    assert_eq!(raw[0].is_deleted, 1);
}

#[tokio::test]
async fn test_caller_predicate_is_anded_with_visibility() {
    let (_, repo) = setup();
    for (name, views) in [("a", 10), ("b", 20), ("c", 30), ("d", 40)] {
        repo.create(article(name, views)).await.unwrap();
    }
    assert!(repo.delete_where(col("name").eq("c")).await.unwrap());

    let popular = repo
        .get_list_ordered(col("views").ge(20), OrderBy::asc("views"))
        .await
        .unwrap();
    let names: Vec<&str> = popular.iter().map(|a| a.name.as_str()).collect();
    assert_eq!(names, vec!["b", "d"]);

    let either = col("name").eq("a").or(col("name").eq("c"));
    assert_eq!(repo.count(either).await.unwrap(), 1);
}

#[tokio::test]
async fn test_misspelled_column_is_an_error_not_an_empty_result() {
    let (store, repo) = setup();
    repo.create(article("a", 1)).await.unwrap();

    let read = repo.get_list_where(col("nmae").eq("a")).await;
    assert!(matches!(read, Err(AppError::Configuration(_))));

    let delete = repo.delete_where(col("nmae").eq("a")).await;
    assert!(matches!(delete, Err(AppError::Configuration(_))));
    assert_eq!(repo.count(Predicate::all()).await.unwrap(), 1);
    assert_eq!(store.len().await, 1);
}

#[tokio::test]
async fn test_page_totals_exclude_deleted_rows() {
    let (_, repo) = setup();
    for i in 0..10 {
        repo.create(article(&format!("n{i}"), i)).await.unwrap();
    }
    assert!(repo.delete_where(col("views").lt(3)).await.unwrap());

    let page = repo
        .get_page_list(
            Predicate::all(),
            PaginationParams::new(2, 4),
            Some(OrderBy::desc("views")),
        )
        .await
        .unwrap();

    assert_eq!(page.total(), 7);
    assert_eq!(page.meta.total_pages, 2);
    let views: Vec<i64> = page.data.iter().map(|a| a.views).collect();
    assert_eq!(views, vec![5, 4, 3]);
}

#[tokio::test]
async fn test_stream_batches_skip_deleted_rows() {
    let (_, repo) = setup();
    for i in 0..9 {
        repo.create(article(&format!("n{i}"), i)).await.unwrap();
    }
    assert!(repo.delete_where(col("views").is_in([0, 4, 8])).await.unwrap());

    let pages: Vec<Vec<Article>> = repo
        .stream_batches(Predicate::all(), 4)
        .try_collect()
        .await
        .unwrap();

    assert_eq!(pages.iter().map(Vec::len).collect::<Vec<_>>(), vec![4, 2]);
    assert!(pages.iter().flatten().all(|a| a.is_deleted == 0));
}

#[tokio::test]
async fn test_delete_range_only_stamps_live_rows() {
    let (store, repo) = setup();
    let first = repo.create(article("first", 1)).await.unwrap();
    let second = repo.create(article("second", 2)).await.unwrap();

    let first_row = repo.get(first).await.unwrap().unwrap();
    assert!(repo.delete(first_row.clone()).await.unwrap());
    let stamped = store.find_by_key(first).await.unwrap().unwrap();

    let second_row = repo.get(second).await.unwrap().unwrap();
    assert!(repo.delete_range(vec![first_row, second_row]).await.unwrap());

    let again = store.find_by_key(first).await.unwrap().unwrap();
    assert_eq!(again.delete_time, stamped.delete_time);
    assert_eq!(repo.count(Predicate::all()).await.unwrap(), 0);
    assert_eq!(store.len().await, 2);
}

#[tokio::test]
async fn test_audit_range_and_revoke_range() {
    let (_, repo) = setup();
    repo.create_range(vec![article("x", 1), article("y", 2)])
        .await
        .unwrap();

    let rows = repo.get_list().await.unwrap();
    assert!(repo.audit_range(rows.clone()).await.unwrap());
    assert_eq!(repo.count(col("audit_status").eq(1)).await.unwrap(), 2);

    assert!(repo.revoke_range(rows).await.unwrap());
    assert_eq!(repo.count(col("audit_status").eq(0)).await.unwrap(), 2);
    assert!(!repo.any(col("audit_by").is_not_null()).await.unwrap());
}
