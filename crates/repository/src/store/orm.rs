//! SeaORM-backed store.
//!
//! Filter ASTs are translated into `sea_orm::Condition`s; field names are
//! resolved against the entity's column names.

use std::marker::PhantomData;

use async_trait::async_trait;
use sea_orm::sea_query::{Expr as SqlExpr, SimpleExpr};
use sea_orm::{
    ActiveModelBehavior, ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait,
    IdenStatic, IntoActiveModel, Iterable, Order, PaginatorTrait, PrimaryKeyToColumn,
    PrimaryKeyTrait, QueryFilter, QueryOrder, QuerySelect, Select, TransactionTrait,
    Value as DbValue,
};

use common::{AppError, AppResult};
use domain::{Persisted, Value};

use super::{Query, Store, UpdateColumns};
use crate::predicate::{CompareOp, Expr, Predicate};

/// Store over a SeaORM entity `E` with active model `A`.
pub struct SeaOrmStore<E, A> {
    db: DatabaseConnection,
    _entity: PhantomData<fn() -> (E, A)>,
}

impl<E, A> SeaOrmStore<E, A> {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            db,
            _entity: PhantomData,
        }
    }
}

impl<E, A> Clone for SeaOrmStore<E, A> {
    fn clone(&self) -> Self {
        Self::new(self.db.clone())
    }
}

fn column<E: EntityTrait>(name: &str) -> AppResult<E::Column> {
    E::Column::iter()
        .find(|c| c.as_str() == name)
        .ok_or_else(|| AppError::unknown_column(name))
}

fn is_key<E: EntityTrait>(name: &str) -> bool {
    E::PrimaryKey::iter().any(|k| k.into_column().as_str() == name)
}

fn db_value(value: &Value) -> DbValue {
    match value {
        Value::Null => DbValue::String(None),
        Value::Bool(b) => DbValue::from(*b),
        Value::Int(i) => DbValue::from(*i),
        Value::Float(f) => DbValue::from(*f),
        Value::Text(s) => DbValue::from(s.clone()),
        Value::Time(t) => DbValue::from(*t),
    }
}

fn comparison<E: EntityTrait>(field: &str, op: CompareOp, value: &Value) -> AppResult<SimpleExpr> {
    let col = column::<E>(field)?;
    let expr = match (op, value) {
        (CompareOp::Eq, Value::Null) => col.is_null(),
        (CompareOp::Ne, Value::Null) => col.is_not_null(),
        (CompareOp::Eq, v) => col.eq(db_value(v)),
        (CompareOp::Ne, v) => col.ne(db_value(v)),
        (CompareOp::Gt, v) => col.gt(db_value(v)),
        (CompareOp::Ge, v) => col.gte(db_value(v)),
        (CompareOp::Lt, v) => col.lt(db_value(v)),
        (CompareOp::Le, v) => col.lte(db_value(v)),
        (CompareOp::Contains, Value::Text(s)) => col.contains(s.as_str()),
        (CompareOp::StartsWith, Value::Text(s)) => col.starts_with(s.as_str()),
        (CompareOp::EndsWith, Value::Text(s)) => col.ends_with(s.as_str()),
        (op, v) => {
            return Err(AppError::validation(format!(
                "{op:?} on `{field}` needs a text operand, got {v:?}"
            )))
        }
    };
    Ok(expr)
}

/// Translate a filter expression into a SeaORM condition.
fn condition<E: EntityTrait>(expr: &Expr) -> AppResult<Condition> {
    let cond = match expr {
        Expr::True => Condition::all(),
        Expr::Compare { field, op, value } => Condition::all().add(comparison::<E>(field, *op, value)?),
        Expr::In { field, values } => {
            Condition::all().add(column::<E>(field)?.is_in(values.iter().map(db_value)))
        }
        Expr::IsNull { field } => Condition::all().add(column::<E>(field)?.is_null()),
        Expr::And(left, right) => Condition::all()
            .add(condition::<E>(left)?)
            .add(condition::<E>(right)?),
        Expr::Or(left, right) => Condition::any()
            .add(condition::<E>(left)?)
            .add(condition::<E>(right)?),
        // An empty condition renders as nothing, so NOT(TRUE) needs an explicit falsehood
        Expr::Not(inner) if matches!(**inner, Expr::True) => {
            Condition::all().add(SqlExpr::val(1).eq(2))
        }
        Expr::Not(inner) => condition::<E>(inner)?.not(),
    };
    Ok(cond)
}

/// Build the SELECT for a store query.
///
/// Offset paging appends the primary key after any caller order, so rows
/// tying on the order column keep one position across pages.
fn select<E: EntityTrait>(query: &Query<E::Model>) -> AppResult<Select<E>> {
    let mut select = E::find().filter(condition::<E>(query.filter.expr())?);

    let mut ordered_by_key = false;
    if let Some(order) = &query.order {
        let direction = if order.ascending { Order::Asc } else { Order::Desc };
        select = select.order_by(column::<E>(&order.column)?, direction);
        ordered_by_key = is_key::<E>(&order.column) && E::PrimaryKey::iter().count() == 1;
    }
    if (query.offset.is_some() || query.limit.is_some()) && !ordered_by_key {
        for key in E::PrimaryKey::iter() {
            select = select.order_by(key.into_column(), Order::Asc);
        }
    }

    if let Some(offset) = query.offset {
        select = select.offset(offset);
    }
    if let Some(limit) = query.limit {
        select = select.limit(limit);
    }
    Ok(select)
}

/// Primary-key equality for the row an active model represents
fn key_condition<E, A>(am: &A) -> AppResult<Condition>
where
    E: EntityTrait,
    A: ActiveModelTrait<Entity = E>,
{
    let mut cond = Condition::all();
    for key in E::PrimaryKey::iter() {
        let col = key.into_column();
        let value = am
            .get(col)
            .into_value()
            .ok_or_else(|| AppError::internal(format!("missing key column `{}`", col.as_str())))?;
        cond = cond.add(col.eq(value));
    }
    Ok(cond)
}

/// Mark the columns accepted by `write` for writing and drop the rest
fn select_columns<E, A>(mut am: A, write: impl Fn(&str) -> bool) -> A
where
    E: EntityTrait,
    A: ActiveModelTrait<Entity = E>,
{
    for col in E::Column::iter() {
        if write(col.as_str()) {
            if let Some(value) = am.get(col).into_value() {
                am.set(col, value);
            }
        } else {
            am.not_set(col);
        }
    }
    am
}

#[async_trait]
impl<E, A> Store<E::Model> for SeaOrmStore<E, A>
where
    E: EntityTrait,
    E::Model: Persisted<Key = <E::PrimaryKey as PrimaryKeyTrait>::ValueType> + IntoActiveModel<A>,
    A: ActiveModelTrait<Entity = E> + ActiveModelBehavior + Send + Sync + 'static,
{
    async fn find_by_key(&self, key: <E::Model as Persisted>::Key) -> AppResult<Option<E::Model>> {
        Ok(E::find_by_id(key).one(&self.db).await?)
    }

    async fn find(&self, query: Query<E::Model>) -> AppResult<Vec<E::Model>> {
        Ok(select::<E>(&query)?.all(&self.db).await?)
    }

    async fn count(&self, filter: Predicate<E::Model>) -> AppResult<u64> {
        let count = E::find()
            .filter(condition::<E>(filter.expr())?)
            .count(&self.db)
            .await?;
        Ok(count)
    }

    async fn insert(&self, entity: E::Model) -> AppResult<<E::Model as Persisted>::Key> {
        let auto_increment = <E::PrimaryKey as PrimaryKeyTrait>::auto_increment();
        let am = select_columns::<E, A>(entity.into_active_model(), |c| {
            !(auto_increment && is_key::<E>(c))
        });

        let result = E::insert(am).exec(&self.db).await?;
        Ok(result.last_insert_id)
    }

    async fn insert_many(&self, entities: Vec<E::Model>) -> AppResult<u64> {
        if entities.is_empty() {
            return Ok(0);
        }

        let auto_increment = <E::PrimaryKey as PrimaryKeyTrait>::auto_increment();
        let models: Vec<A> = entities
            .into_iter()
            .map(|e| {
                select_columns::<E, A>(e.into_active_model(), |c| {
                    !(auto_increment && is_key::<E>(c))
                })
            })
            .collect();

        Ok(E::insert_many(models).exec_without_returning(&self.db).await?)
    }

    async fn update_many(&self, entities: Vec<E::Model>, columns: UpdateColumns) -> AppResult<u64> {
        if entities.is_empty() {
            return Ok(0);
        }

        let txn = self.db.begin().await?;
        let mut affected = 0;
        for entity in entities {
            let am: A = entity.into_active_model();
            let filter = key_condition::<E, A>(&am)?;
            let am = select_columns::<E, A>(am, |c| !is_key::<E>(c) && columns.includes(c));

            affected += E::update_many().set(am).filter(filter).exec(&txn).await?.rows_affected;
        }
        txn.commit().await?;

        Ok(affected)
    }

    async fn delete_many(&self, entities: Vec<E::Model>) -> AppResult<u64> {
        if entities.is_empty() {
            return Ok(0);
        }

        let mut filter = Condition::any();
        for entity in entities {
            let am: A = entity.into_active_model();
            filter = filter.add(key_condition::<E, A>(&am)?);
        }

        Ok(E::delete_many().filter(filter).exec(&self.db).await?.rows_affected)
    }
}
