//! Domain-level constants.
//!
//! Column names and status values shared by every entity that carries the
//! audit contract. Column names match the serialized field names of the
//! entity models.

// =============================================================================
// Key
// =============================================================================

/// Default surrogate key column
pub const COLUMN_ID: &str = "id";

// =============================================================================
// Creation
// =============================================================================

pub const COLUMN_CREATE_TIME: &str = "create_time";
pub const COLUMN_CREATE_BY: &str = "create_by";
pub const COLUMN_TENANT_ID: &str = "tenant_id";

// =============================================================================
// Update
// =============================================================================

pub const COLUMN_UPDATE_TIME: &str = "update_time";
pub const COLUMN_UPDATE_BY: &str = "update_by";

// =============================================================================
// Audit workflow
// =============================================================================

pub const COLUMN_AUDIT_STATUS: &str = "audit_status";
pub const COLUMN_AUDIT_TIME: &str = "audit_time";
pub const COLUMN_AUDIT_BY: &str = "audit_by";

/// Never audited, or revoked back to the baseline
pub const AUDIT_STATUS_UNAUDITED: i32 = 0;

/// Status written by an audit when the caller did not choose one
pub const AUDIT_STATUS_APPROVED: i32 = 1;

// =============================================================================
// Soft delete
// =============================================================================

pub const COLUMN_IS_DELETED: &str = "is_deleted";
pub const COLUMN_DELETE_TIME: &str = "delete_time";
pub const COLUMN_DELETE_BY: &str = "delete_by";

/// Row is visible
pub const NOT_DELETED: i32 = 0;

/// Row is logically removed
pub const DELETED: i32 = 1;

// =============================================================================
// Column groups
// =============================================================================

/// Written only by audit and revoke
pub const AUDIT_COLUMNS: &[&str] = &[COLUMN_AUDIT_STATUS, COLUMN_AUDIT_TIME, COLUMN_AUDIT_BY];

/// Written only by soft delete
pub const DELETE_COLUMNS: &[&str] = &[COLUMN_IS_DELETED, COLUMN_DELETE_TIME, COLUMN_DELETE_BY];

/// Columns a plain update must leave untouched
pub const UPDATE_PROTECTED_COLUMNS: &[&str] = &[
    COLUMN_CREATE_TIME,
    COLUMN_CREATE_BY,
    COLUMN_TENANT_ID,
    COLUMN_AUDIT_STATUS,
    COLUMN_AUDIT_TIME,
    COLUMN_AUDIT_BY,
    COLUMN_IS_DELETED,
    COLUMN_DELETE_TIME,
    COLUMN_DELETE_BY,
];
