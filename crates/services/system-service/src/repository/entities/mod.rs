//! SeaORM entities for the system tables.

pub mod dict_data;
pub mod notice;
