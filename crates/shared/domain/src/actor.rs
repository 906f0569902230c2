//! The acting user and tenant for stamped writes.

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// Who is performing the current operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub user_id: String,
    pub tenant_id: Option<i64>,
}

impl Actor {
    /// Create an actor; the user identifier must not be blank.
    pub fn new(user_id: impl Into<String>, tenant_id: Option<i64>) -> DomainResult<Self> {
        let user_id = user_id.into();
        if user_id.trim().is_empty() {
            return Err(DomainError::validation("Actor user id must not be empty"));
        }
        Ok(Self { user_id, tenant_id })
    }
}

/// Source of the current actor.
///
/// Consulted once per repository call and never cached, so stamping reflects
/// whoever is active when the write happens. Must not perform I/O.
pub trait ActorContext: Send + Sync {
    fn current_actor(&self) -> Option<Actor>;
}

/// A fixed actor, for jobs and tests.
impl ActorContext for Actor {
    fn current_actor(&self) -> Option<Actor> {
        Some(self.clone())
    }
}

/// No actor available; every stamped write fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct Anonymous;

impl ActorContext for Anonymous {
    fn current_actor(&self) -> Option<Actor> {
        None
    }
}
