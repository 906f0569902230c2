//! Domain layer - Entity contracts shared by every repository.
//!
//! This crate has no infrastructure dependencies. It defines what a
//! persisted row must look like, the audit-contract fields and their
//! transitions, and who the acting user is.

pub mod actor;
pub mod audit;
pub mod constants;
pub mod entity;
pub mod error;
pub mod value;

pub use actor::{Actor, ActorContext, Anonymous};
pub use audit::AuditFields;
pub use constants::*;
pub use entity::{Audited, Persisted};
pub use error::{DomainError, DomainResult};
pub use value::Value;
