//! Per-turn execution context and its attachment guard.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

use chrono::{DateTime, Utc};
use tracing::Span;
use uuid::Uuid;

/// Live request scope of one turn.
///
/// The invoker holds the only strong reference while the turn runs;
/// once it is dropped every [`TurnContext`] pointing at it goes stale.
#[derive(Debug)]
pub struct SessionScope {
    session_id: String,
    turn_id: Uuid,
    started_at: DateTime<Utc>,
}

impl SessionScope {
    pub fn new(session_id: impl Into<String>, turn_id: Uuid) -> Self {
        Self {
            session_id: session_id.into(),
            turn_id,
            started_at: Utc::now(),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn turn_id(&self) -> Uuid {
        self.turn_id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }
}

/// Context captured once per turn and carried by value into workers.
#[derive(Debug, Clone)]
pub struct TurnContext {
    turn_id: Uuid,
    scope: Weak<SessionScope>,
    span: Span,
}

impl TurnContext {
    /// Capture the scope and the currently entered tracing span.
    ///
    /// Must be called from the originating turn, while both are live.
    pub fn capture(scope: &Arc<SessionScope>) -> Self {
        Self {
            turn_id: scope.turn_id(),
            scope: Arc::downgrade(scope),
            span: Span::current(),
        }
    }

    /// A context with no session scope behind it.
    pub fn detached(turn_id: Uuid) -> Self {
        Self {
            turn_id,
            scope: Weak::new(),
            span: Span::none(),
        }
    }

    pub fn turn_id(&self) -> Uuid {
        self.turn_id
    }

    pub fn span(&self) -> &Span {
        &self.span
    }

    /// Whether the originating turn is still running.
    pub fn is_live(&self) -> bool {
        self.scope.strong_count() > 0
    }

    pub(crate) fn upgrade_scope(&self) -> Option<Arc<SessionScope>> {
        self.scope.upgrade()
    }
}

/// The turn context as seen by a handler during one call.
///
/// Dropping it exits the turn span and releases the attachment.
pub struct AttachedContext<'a> {
    turn_id: Uuid,
    scope: Option<Arc<SessionScope>>,
    _attachment: Attachment<'a>,
    _entered: tracing::span::Entered<'a>,
}

impl<'a> AttachedContext<'a> {
    pub(crate) fn new(context: &'a TurnContext, active: &'a AtomicUsize) -> Self {
        let entered = context.span.enter();
        active.fetch_add(1, Ordering::SeqCst);
        Self {
            turn_id: context.turn_id,
            scope: context.upgrade_scope(),
            _attachment: Attachment { active },
            _entered: entered,
        }
    }

    pub fn turn_id(&self) -> Uuid {
        self.turn_id
    }

    /// The live session scope, or `None` once the turn has completed.
    pub fn scope(&self) -> Option<&SessionScope> {
        self.scope.as_deref()
    }

    pub fn is_degraded(&self) -> bool {
        self.scope.is_none()
    }
}

impl std::fmt::Debug for AttachedContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AttachedContext")
            .field("turn_id", &self.turn_id)
            .field("scope", &self.scope)
            .finish()
    }
}

struct Attachment<'a> {
    active: &'a AtomicUsize,
}

impl Drop for Attachment<'_> {
    fn drop(&mut self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
    }
}
