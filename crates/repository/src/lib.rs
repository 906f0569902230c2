//! Generic repository layer.
//!
//! - [`predicate`]: name-based filter predicates and their conjunction
//! - [`store`]: the relational store seam, with SeaORM and in-memory adapters
//! - [`base`]: read/write repository traits and the plain [`Repository`]
//! - [`audited`]: soft delete, audit workflow and actor stamping on top
//! - [`actor`]: task-scoped actor context
//! - [`schema`]: migration helpers for audited tables

pub mod actor;
pub mod audited;
pub mod base;
pub mod predicate;
pub mod schema;
pub mod store;

pub use actor::ScopedActor;
pub use audited::{not_deleted, AuditRepository, AuditedCrudRepository, AuditedRepository};
pub use base::{CrudRepository, ReadRepository, Repository, WriteRepository};
pub use predicate::{col, combine, CompareOp, Expr, Field, Predicate};
pub use store::{MemoryStore, OrderBy, Query, SeaOrmStore, Store, UpdateColumns};

#[cfg(any(test, feature = "test-utils"))]
pub use store::MockStore;

pub use domain::{impl_audited, Actor, ActorContext, Anonymous, AuditFields, Audited, Persisted, Value};
