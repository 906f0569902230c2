//! Audit-contract fields and their lifecycle transitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::actor::Actor;
use crate::constants::{AUDIT_STATUS_APPROVED, AUDIT_STATUS_UNAUDITED, DELETED, NOT_DELETED};

/// Actor/time metadata carried by every audited row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditFields {
    pub create_time: Option<DateTime<Utc>>,
    pub create_by: Option<String>,
    pub update_time: Option<DateTime<Utc>>,
    pub update_by: Option<String>,
    pub audit_status: i32,
    pub audit_time: Option<DateTime<Utc>>,
    pub audit_by: Option<String>,
    pub is_deleted: i32,
    pub delete_time: Option<DateTime<Utc>>,
    pub delete_by: Option<String>,
    pub tenant_id: Option<i64>,
}

impl AuditFields {
    /// Stamp creation and reset workflow state to the baseline.
    ///
    /// A freshly created row is unaudited, not deleted, and has never been
    /// updated, whatever the caller put into those fields.
    pub fn mark_created(&mut self, actor: &Actor, now: DateTime<Utc>) {
        self.create_time = Some(now);
        self.create_by = Some(actor.user_id.clone());
        self.tenant_id = actor.tenant_id;
        self.update_time = None;
        self.update_by = None;
        self.mark_revoked();
        self.is_deleted = NOT_DELETED;
        self.delete_time = None;
        self.delete_by = None;
    }

    pub fn mark_updated(&mut self, actor: &Actor, now: DateTime<Utc>) {
        self.update_time = Some(now);
        self.update_by = Some(actor.user_id.clone());
    }

    /// Move to the audited state. A caller-chosen non-zero status is kept.
    pub fn mark_audited(&mut self, actor: &Actor, now: DateTime<Utc>) {
        if self.audit_status == AUDIT_STATUS_UNAUDITED {
            self.audit_status = AUDIT_STATUS_APPROVED;
        }
        self.audit_time = Some(now);
        self.audit_by = Some(actor.user_id.clone());
    }

    /// Full reset to the never-audited baseline.
    pub fn mark_revoked(&mut self) {
        self.audit_status = AUDIT_STATUS_UNAUDITED;
        self.audit_time = None;
        self.audit_by = None;
    }

    pub fn mark_deleted(&mut self, actor: &Actor, now: DateTime<Utc>) {
        self.is_deleted = DELETED;
        self.delete_time = Some(now);
        self.delete_by = Some(actor.user_id.clone());
    }

    pub fn is_audited(&self) -> bool {
        self.audit_status != AUDIT_STATUS_UNAUDITED
    }

    pub fn is_deleted(&self) -> bool {
        self.is_deleted != NOT_DELETED
    }
}
