//! Entity contracts.
//!
//! `Persisted` is the minimum a row type needs to go through a repository.
//! `Audited` opts a row type into stamping, audit workflow and soft delete.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Debug;

use crate::audit::AuditFields;
use crate::constants::COLUMN_ID;
use crate::value::Value;

/// A row type stored behind a repository.
///
/// Field names used in filters are the serialized field names of the type,
/// which are expected to match the store's column names.
pub trait Persisted: Clone + Debug + Send + Sync + Serialize + DeserializeOwned + 'static {
    /// Surrogate key type
    type Key: Clone + Debug + PartialEq + Send + Sync + Into<Value> + 'static;

    /// Column holding the surrogate key
    const KEY_COLUMN: &'static str = COLUMN_ID;

    /// Current key value (unassigned before insert)
    fn key(&self) -> Self::Key;
}

/// A row type carrying the full audit contract.
pub trait Audited: Persisted<Key = i64> {
    /// Snapshot of the audit-contract fields
    fn audit_fields(&self) -> AuditFields;

    /// Overwrite the audit-contract fields
    fn set_audit_fields(&mut self, fields: AuditFields);
}

/// Implement [`Audited`] for a struct with the standard audit field names.
///
/// ```ignore
/// domain::impl_audited!(Model);
/// ```
#[macro_export]
macro_rules! impl_audited {
    ($model:ty) => {
        impl $crate::Audited for $model {
            fn audit_fields(&self) -> $crate::AuditFields {
                $crate::AuditFields {
                    create_time: self.create_time,
                    create_by: self.create_by.clone(),
                    update_time: self.update_time,
                    update_by: self.update_by.clone(),
                    audit_status: self.audit_status,
                    audit_time: self.audit_time,
                    audit_by: self.audit_by.clone(),
                    is_deleted: self.is_deleted,
                    delete_time: self.delete_time,
                    delete_by: self.delete_by.clone(),
                    tenant_id: self.tenant_id,
                }
            }

            fn set_audit_fields(&mut self, fields: $crate::AuditFields) {
                self.create_time = fields.create_time;
                self.create_by = fields.create_by;
                self.update_time = fields.update_time;
                self.update_by = fields.update_by;
                self.audit_status = fields.audit_status;
                self.audit_time = fields.audit_time;
                self.audit_by = fields.audit_by;
                self.is_deleted = fields.is_deleted;
                self.delete_time = fields.delete_time;
                self.delete_by = fields.delete_by;
                self.tenant_id = fields.tenant_id;
            }
        }
    };
}
