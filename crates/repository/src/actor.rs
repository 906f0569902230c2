//! Task-scoped actor context.
//!
//! Request handlers wrap their work in [`ScopedActor::scope`]; repositories
//! built with [`ScopedActor`] then stamp writes with whoever the enclosing
//! scope names, without the actor being threaded through every call.

use std::future::Future;

use domain::{Actor, ActorContext};

tokio::task_local! {
    static CURRENT_ACTOR: Actor;
}

/// Reads the actor of the enclosing [`ScopedActor::scope`], if any.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScopedActor;

impl ScopedActor {
    /// Run `f` with `actor` as the current actor
    pub async fn scope<F: Future>(actor: Actor, f: F) -> F::Output {
        CURRENT_ACTOR.scope(actor, f).await
    }
}

impl ActorContext for ScopedActor {
    fn current_actor(&self) -> Option<Actor> {
        CURRENT_ACTOR.try_with(Clone::clone).ok()
    }
}
