//! Common utilities shared across all crates.
//!
//! This crate provides:
//! - Unified error handling
//! - Configuration structures
//! - Pagination request/response types

pub mod config;
pub mod error;
pub mod pagination;

pub use config::*;
pub use error::{AppError, AppResult, OptionExt};
pub use pagination::{Paginated, PaginationMeta, PaginationParams};
