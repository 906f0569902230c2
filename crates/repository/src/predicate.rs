//! Filter predicates over an entity type.
//!
//! A predicate is a small boolean AST over named fields. Store adapters
//! translate it to their native query form; [`Predicate::matches_row`]
//! evaluates it in memory with the same three-valued semantics SQL uses.

use std::cmp::Ordering;
use std::fmt;
use std::marker::PhantomData;
use std::ops::Not;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value as Json};

use domain::Value;

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
    Contains,
    StartsWith,
    EndsWith,
}

/// Untyped filter expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Matches every row
    True,
    Compare {
        field: String,
        op: CompareOp,
        value: Value,
    },
    In {
        field: String,
        values: Vec<Value>,
    },
    IsNull {
        field: String,
    },
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Not(Box<Expr>),
}

impl Expr {
    /// Evaluate against a serialized row. `None` is SQL's UNKNOWN.
    pub fn evaluate(&self, row: &Map<String, Json>) -> Option<bool> {
        match self {
            Expr::True => Some(true),
            Expr::Compare { field, op, value } => compare(cell(row, field), *op, value),
            Expr::In { field, values } => {
                let cell = cell(row, field);
                if cell.is_null() {
                    return None;
                }
                let mut unknown = false;
                for value in values {
                    if value.is_null() {
                        unknown = true;
                    } else if order(cell, value) == Some(Ordering::Equal) {
                        return Some(true);
                    }
                }
                if unknown {
                    None
                } else {
                    Some(false)
                }
            }
            Expr::IsNull { field } => Some(cell(row, field).is_null()),
            Expr::And(left, right) => match (left.evaluate(row), right.evaluate(row)) {
                (Some(false), _) | (_, Some(false)) => Some(false),
                (Some(true), Some(true)) => Some(true),
                _ => None,
            },
            Expr::Or(left, right) => match (left.evaluate(row), right.evaluate(row)) {
                (Some(true), _) | (_, Some(true)) => Some(true),
                (Some(false), Some(false)) => Some(false),
                _ => None,
            },
            Expr::Not(inner) => inner.evaluate(row).map(|b| !b),
        }
    }

    /// Field names referenced anywhere in the expression, in visit order
    pub fn fields(&self) -> Vec<&str> {
        let mut fields = Vec::new();
        self.collect_fields(&mut fields);
        fields
    }

    fn collect_fields<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Expr::True => {}
            Expr::Compare { field, .. } | Expr::In { field, .. } | Expr::IsNull { field } => {
                out.push(field)
            }
            Expr::And(left, right) | Expr::Or(left, right) => {
                left.collect_fields(out);
                right.collect_fields(out);
            }
            Expr::Not(inner) => inner.collect_fields(out),
        }
    }
}

fn cell<'a>(row: &'a Map<String, Json>, field: &str) -> &'a Json {
    row.get(field).unwrap_or(&Json::Null)
}

fn compare(cell: &Json, op: CompareOp, value: &Value) -> Option<bool> {
    if cell.is_null() || value.is_null() {
        return None;
    }

    let text_op = |f: fn(&str, &str) -> bool| match (cell, value) {
        (Json::String(text), Value::Text(needle)) => Some(f(text, needle)),
        _ => None,
    };

    match op {
        CompareOp::Contains => text_op(|t, n| t.contains(n)),
        CompareOp::StartsWith => text_op(|t, n| t.starts_with(n)),
        CompareOp::EndsWith => text_op(|t, n| t.ends_with(n)),
        CompareOp::Eq => order(cell, value).map(|o| o == Ordering::Equal),
        CompareOp::Ne => order(cell, value).map(|o| o != Ordering::Equal),
        CompareOp::Gt => order(cell, value).map(|o| o == Ordering::Greater),
        CompareOp::Ge => order(cell, value).map(|o| o != Ordering::Less),
        CompareOp::Lt => order(cell, value).map(|o| o == Ordering::Less),
        CompareOp::Le => order(cell, value).map(|o| o != Ordering::Greater),
    }
}

/// Order a stored cell against a literal; `None` when the types don't compare.
fn order(cell: &Json, value: &Value) -> Option<Ordering> {
    match (cell, value) {
        (Json::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        (Json::Number(a), Value::Int(b)) => match a.as_i64() {
            Some(a) => Some(a.cmp(b)),
            None => a.as_f64()?.partial_cmp(&(*b as f64)),
        },
        (Json::Number(a), Value::Float(b)) => a.as_f64()?.partial_cmp(b),
        (Json::String(a), Value::Text(b)) => Some(a.as_str().cmp(b.as_str())),
        (Json::String(a), Value::Time(b)) => DateTime::parse_from_rfc3339(a)
            .ok()
            .map(|a| a.with_timezone(&Utc).cmp(b)),
        _ => None,
    }
}

/// A filter over rows of `E`.
pub struct Predicate<E> {
    expr: Expr,
    _entity: PhantomData<fn(&E) -> bool>,
}

impl<E> Predicate<E> {
    /// The match-everything predicate
    pub fn all() -> Self {
        Self::from_expr(Expr::True)
    }

    pub fn from_expr(expr: Expr) -> Self {
        Self {
            expr,
            _entity: PhantomData,
        }
    }

    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    pub fn into_expr(self) -> Expr {
        self.expr
    }

    pub fn is_all(&self) -> bool {
        matches!(self.expr, Expr::True)
    }

    /// Logical AND, see [`combine`]
    pub fn and(self, other: Self) -> Self {
        combine(self, other)
    }

    /// Logical OR. Either side matching everything makes the whole match everything.
    pub fn or(self, other: Self) -> Self {
        if self.is_all() || other.is_all() {
            return Self::all();
        }
        Self::from_expr(Expr::Or(Box::new(self.expr), Box::new(other.expr)))
    }

    /// True only when the predicate is definitely true for the row
    pub fn matches_row(&self, row: &Map<String, Json>) -> bool {
        self.expr.evaluate(row) == Some(true)
    }
}

impl<E: Serialize> Predicate<E> {
    /// Evaluate against an entity through its serialized form
    pub fn matches(&self, entity: &E) -> Result<bool, serde_json::Error> {
        match serde_json::to_value(entity)? {
            Json::Object(row) => Ok(self.matches_row(&row)),
            _ => Ok(false),
        }
    }
}

/// Conjunction of two predicates over the same entity type.
///
/// Combining with [`Predicate::all`] returns the other operand untouched.
/// Fields are referenced by name, so predicates built independently combine
/// without any rewriting.
pub fn combine<E>(left: Predicate<E>, right: Predicate<E>) -> Predicate<E> {
    match (left.is_all(), right.is_all()) {
        (true, _) => right,
        (_, true) => left,
        _ => Predicate::from_expr(Expr::And(Box::new(left.expr), Box::new(right.expr))),
    }
}

impl<E> Not for Predicate<E> {
    type Output = Self;

    fn not(self) -> Self {
        Self::from_expr(Expr::Not(Box::new(self.expr)))
    }
}

impl<E> Clone for Predicate<E> {
    fn clone(&self) -> Self {
        Self::from_expr(self.expr.clone())
    }
}

impl<E> PartialEq for Predicate<E> {
    fn eq(&self, other: &Self) -> bool {
        self.expr == other.expr
    }
}

impl<E> Default for Predicate<E> {
    fn default() -> Self {
        Self::all()
    }
}

impl<E> fmt::Debug for Predicate<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Predicate").field(&self.expr).finish()
    }
}

/// Reference to a field of `E`, the starting point for building predicates.
pub struct Field<E> {
    name: String,
    _entity: PhantomData<fn(&E) -> bool>,
}

/// Field reference by column name
pub fn col<E>(name: impl Into<String>) -> Field<E> {
    Field {
        name: name.into(),
        _entity: PhantomData,
    }
}

impl<E> Field<E> {
    pub fn name(&self) -> &str {
        &self.name
    }

    fn compare(self, op: CompareOp, value: Value) -> Predicate<E> {
        Predicate::from_expr(Expr::Compare {
            field: self.name,
            op,
            value,
        })
    }

    /// Equality; comparing with a null value means `IS NULL`
    pub fn eq(self, value: impl Into<Value>) -> Predicate<E> {
        let value = value.into();
        if value.is_null() {
            return self.is_null();
        }
        self.compare(CompareOp::Eq, value)
    }

    /// Inequality; comparing with a null value means `IS NOT NULL`
    pub fn ne(self, value: impl Into<Value>) -> Predicate<E> {
        let value = value.into();
        if value.is_null() {
            return self.is_not_null();
        }
        self.compare(CompareOp::Ne, value)
    }

    pub fn gt(self, value: impl Into<Value>) -> Predicate<E> {
        self.compare(CompareOp::Gt, value.into())
    }

    pub fn ge(self, value: impl Into<Value>) -> Predicate<E> {
        self.compare(CompareOp::Ge, value.into())
    }

    pub fn lt(self, value: impl Into<Value>) -> Predicate<E> {
        self.compare(CompareOp::Lt, value.into())
    }

    pub fn le(self, value: impl Into<Value>) -> Predicate<E> {
        self.compare(CompareOp::Le, value.into())
    }

    pub fn contains(self, text: impl Into<String>) -> Predicate<E> {
        self.compare(CompareOp::Contains, Value::Text(text.into()))
    }

    pub fn starts_with(self, text: impl Into<String>) -> Predicate<E> {
        self.compare(CompareOp::StartsWith, Value::Text(text.into()))
    }

    pub fn ends_with(self, text: impl Into<String>) -> Predicate<E> {
        self.compare(CompareOp::EndsWith, Value::Text(text.into()))
    }

    pub fn is_in<V: Into<Value>>(self, values: impl IntoIterator<Item = V>) -> Predicate<E> {
        Predicate::from_expr(Expr::In {
            field: self.name,
            values: values.into_iter().map(Into::into).collect(),
        })
    }

    pub fn is_null(self) -> Predicate<E> {
        Predicate::from_expr(Expr::IsNull { field: self.name })
    }

    pub fn is_not_null(self) -> Predicate<E> {
        !self.is_null()
    }
}
