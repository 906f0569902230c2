//! In-process store for `i64`-keyed entities.
//!
//! Rows are kept in their serialized form, so filters, ordering and column
//! selection follow exactly the field names the database adapter uses.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::marker::PhantomData;

use async_trait::async_trait;
use chrono::DateTime;
use serde_json::{Map, Value as Json};
use tokio::sync::RwLock;

use common::{AppError, AppResult};
use domain::Persisted;

use super::{OrderBy, Query, Store, UpdateColumns};
use crate::predicate::Predicate;

type Row = Map<String, Json>;

struct Table {
    rows: BTreeMap<i64, Row>,
    next_key: i64,
}

/// Store backed by an ordered map; keys are assigned from 1 upwards.
pub struct MemoryStore<E> {
    table: RwLock<Table>,
    _entity: PhantomData<fn() -> E>,
}

impl<E> Default for MemoryStore<E> {
    fn default() -> Self {
        Self {
            table: RwLock::new(Table {
                rows: BTreeMap::new(),
                next_key: 1,
            }),
            _entity: PhantomData,
        }
    }
}

impl<E> MemoryStore<E>
where
    E: Persisted<Key = i64>,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored rows, deleted or not
    pub async fn len(&self) -> usize {
        self.table.read().await.rows.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    fn to_row(entity: &E) -> AppResult<Row> {
        match serde_json::to_value(entity)? {
            Json::Object(row) => Ok(row),
            other => Err(AppError::internal(format!(
                "entity serialized to a non-object value: {other}"
            ))),
        }
    }

    fn from_row(row: &Row) -> AppResult<E> {
        Ok(serde_json::from_value(Json::Object(row.clone()))?)
    }

    fn matching<'a>(table: &'a Table, filter: &'a Predicate<E>) -> impl Iterator<Item = &'a Row> + 'a {
        table.rows.values().filter(move |row| filter.matches_row(row))
    }
}

/// Reject column names the stored rows don't carry. Every row of a table
/// serializes the same fields, so any one of them describes the shape; an
/// empty table has nothing to check against.
fn check_columns<'a>(table: &Table, mut names: impl Iterator<Item = &'a str>) -> AppResult<()> {
    let Some(sample) = table.rows.values().next() else {
        return Ok(());
    };
    match names.find(|name| !sample.contains_key(*name)) {
        Some(name) => Err(AppError::unknown_column(name)),
        None => Ok(()),
    }
}

fn compare_cells(a: &Json, b: &Json) -> Ordering {
    match (a, b) {
        (Json::Null, Json::Null) => Ordering::Equal,
        (Json::Null, _) => Ordering::Less,
        (_, Json::Null) => Ordering::Greater,
        (Json::Bool(x), Json::Bool(y)) => x.cmp(y),
        (Json::Number(x), Json::Number(y)) => match (x.as_i64(), y.as_i64()) {
            (Some(x), Some(y)) => x.cmp(&y),
            _ => x
                .as_f64()
                .partial_cmp(&y.as_f64())
                .unwrap_or(Ordering::Equal),
        },
        (Json::String(x), Json::String(y)) => {
            match (DateTime::parse_from_rfc3339(x), DateTime::parse_from_rfc3339(y)) {
                (Ok(x), Ok(y)) => x.cmp(&y),
                _ => x.cmp(y),
            }
        }
        _ => Ordering::Equal,
    }
}

fn sort_rows(rows: &mut [&Row], order: &OrderBy) {
    rows.sort_by(|a, b| {
        let ordering = compare_cells(
            a.get(&order.column).unwrap_or(&Json::Null),
            b.get(&order.column).unwrap_or(&Json::Null),
        );
        if order.ascending {
            ordering
        } else {
            ordering.reverse()
        }
    });
}

#[async_trait]
impl<E> Store<E> for MemoryStore<E>
where
    E: Persisted<Key = i64>,
{
    async fn find_by_key(&self, key: i64) -> AppResult<Option<E>> {
        let table = self.table.read().await;
        table.rows.get(&key).map(Self::from_row).transpose()
    }

    async fn find(&self, query: Query<E>) -> AppResult<Vec<E>> {
        let table = self.table.read().await;
        let order_column = query.order.as_ref().map(|o| o.column.as_str());
        check_columns(
            &table,
            query.filter.expr().fields().into_iter().chain(order_column),
        )?;

        let mut rows: Vec<&Row> = Self::matching(&table, &query.filter).collect();
        if let Some(order) = &query.order {
            sort_rows(&mut rows, order);
        }

        let offset = query.offset.unwrap_or(0) as usize;
        let limit = query.limit.map_or(usize::MAX, |l| l as usize);

        rows.into_iter()
            .skip(offset)
            .take(limit)
            .map(Self::from_row)
            .collect()
    }

    async fn count(&self, filter: Predicate<E>) -> AppResult<u64> {
        let table = self.table.read().await;
        check_columns(&table, filter.expr().fields().into_iter())?;
        Ok(Self::matching(&table, &filter).count() as u64)
    }

    async fn insert(&self, entity: E) -> AppResult<i64> {
        let mut table = self.table.write().await;
        let mut row = Self::to_row(&entity)?;

        let key = table.next_key;
        table.next_key += 1;
        row.insert(E::KEY_COLUMN.to_string(), Json::from(key));
        table.rows.insert(key, row);

        Ok(key)
    }

    async fn insert_many(&self, entities: Vec<E>) -> AppResult<u64> {
        let rows = entities.iter().map(Self::to_row).collect::<AppResult<Vec<_>>>()?;

        let mut table = self.table.write().await;
        let mut affected = 0;
        for mut row in rows {
            let key = table.next_key;
            table.next_key += 1;
            row.insert(E::KEY_COLUMN.to_string(), Json::from(key));
            table.rows.insert(key, row);
            affected += 1;
        }

        Ok(affected)
    }

    async fn update_many(&self, entities: Vec<E>, columns: UpdateColumns) -> AppResult<u64> {
        let updates = entities
            .iter()
            .map(|e| Ok((e.key(), Self::to_row(e)?)))
            .collect::<AppResult<Vec<_>>>()?;

        let mut table = self.table.write().await;
        let mut affected = 0;
        for (key, incoming) in updates {
            let Some(stored) = table.rows.get_mut(&key) else {
                continue;
            };
            for (column, value) in incoming {
                if column != E::KEY_COLUMN && columns.includes(&column) {
                    stored.insert(column, value);
                }
            }
            affected += 1;
        }

        Ok(affected)
    }

    async fn delete_many(&self, entities: Vec<E>) -> AppResult<u64> {
        let mut table = self.table.write().await;
        let affected = entities
            .iter()
            .filter(|e| table.rows.remove(&e.key()).is_some())
            .count();

        Ok(affected as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predicate::col;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Tag {
        id: i64,
        label: String,
        weight: i32,
    }

    impl Persisted for Tag {
        type Key = i64;

        fn key(&self) -> i64 {
            self.id
        }
    }

    fn tag(label: &str, weight: i32) -> Tag {
        Tag {
            id: 0,
            label: label.to_string(),
            weight,
        }
    }

    #[tokio::test]
    async fn insert_assigns_increasing_keys() {
        let store = MemoryStore::new();
        let first = store.insert(tag("a", 1)).await.unwrap();
        let second = store.insert(tag("b", 2)).await.unwrap();

        assert_eq!((first, second), (1, 2));
        assert_eq!(store.find_by_key(2).await.unwrap().unwrap().label, "b");
    }

    #[tokio::test]
    async fn find_filters_orders_and_pages() {
        let store = MemoryStore::new();
        store
            .insert_many(vec![tag("a", 3), tag("b", 1), tag("c", 2), tag("d", 9)])
            .await
            .unwrap();

        let query = Query::filter(col("weight").lt(5))
            .order_by(Some(OrderBy::desc("weight")))
            .page(1, 2);
        let labels: Vec<String> = store
            .find(query)
            .await
            .unwrap()
            .into_iter()
            .map(|t: Tag| t.label)
            .collect();

        assert_eq!(labels, vec!["c", "b"]);
    }

    #[tokio::test]
    async fn ordering_by_unknown_column_fails() {
        let store = MemoryStore::new();
        store.insert(tag("a", 1)).await.unwrap();

        let query: Query<Tag> = Query::filter(Predicate::all()).order_by(Some(OrderBy::asc("nope")));
        let result = store.find(query).await;

        assert!(matches!(result, Err(AppError::Configuration(_))));
    }

    #[tokio::test]
    async fn filtering_by_unknown_column_fails() {
        let store = MemoryStore::new();
        store.insert(tag("a", 1)).await.unwrap();

        let misspelled: Predicate<Tag> = col("lable").eq("a");
        let found = store.find(Query::filter(misspelled.clone())).await;
        assert!(matches!(found, Err(AppError::Configuration(msg)) if msg.contains("lable")));

        let nested: Predicate<Tag> = col("weight").gt(0).and(!col("wieght").is_null());
        assert!(matches!(store.count(nested).await, Err(AppError::Configuration(_))));

        let known: Predicate<Tag> = col("label").eq("zzz");
        assert!(store.find(Query::filter(known)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_respects_column_selection() {
        let store = MemoryStore::new();
        let id = store.insert(tag("a", 1)).await.unwrap();

        let changed = Tag {
            id,
            label: "renamed".into(),
            weight: 50,
        };
        let affected = store
            .update_many(vec![changed], UpdateColumns::Only(&["weight"]))
            .await
            .unwrap();

        let stored = store.find_by_key(id).await.unwrap().unwrap();
        assert_eq!(affected, 1);
        assert_eq!(stored.label, "a");
        assert_eq!(stored.weight, 50);
    }

    #[tokio::test]
    async fn update_and_delete_skip_unknown_keys() {
        let store: MemoryStore<Tag> = MemoryStore::new();
        let ghost = Tag {
            id: 42,
            label: "ghost".into(),
            weight: 0,
        };

        assert_eq!(store.update_many(vec![ghost.clone()], UpdateColumns::All).await.unwrap(), 0);
        assert_eq!(store.delete_many(vec![ghost]).await.unwrap(), 0);
    }
}
