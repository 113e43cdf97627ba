//! Context propagation for event handlers invoked from graph workers.
//!
//! The agent graph may fire events from tasks or threads it spawned
//! itself, which carry none of the originating turn's identity. A
//! [`CallbackContextBridge`] captures a [`TurnContext`] once, when the turn
//! starts, and re-attaches it around every handler call no matter where
//! that call comes from:
//!
//! ```
//! use std::sync::Arc;
//! use conductor::bridge::{AttachedContext, CallbackContextBridge, SessionScope, TurnContext};
//! use conductor::events::{EventHandler, GraphEvent};
//!
//! struct Print;
//! impl EventHandler for Print {
//!     fn on_event(&self, ctx: &AttachedContext<'_>, event: &GraphEvent) {
//!         println!("[{}] {}", ctx.turn_id(), event.kind());
//!     }
//! }
//!
//! let scope = Arc::new(SessionScope::new("demo", uuid::Uuid::new_v4()));
//! let bridge = CallbackContextBridge::wrap(Arc::new(Print), TurnContext::capture(&scope));
//!
//! let worker = bridge.clone();
//! std::thread::spawn(move || worker.notify(GraphEvent::token("hi")))
//!     .join()
//!     .unwrap();
//! assert_eq!(bridge.active_attachments(), 0);
//! ```

pub mod context;

pub use context::{AttachedContext, SessionScope, TurnContext};

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use uuid::Uuid;

use crate::events::{EventHandler, GraphEvent};

/// Handler wrapper that carries the originating turn's context.
///
/// Cheap to clone; graphs pass clones by value into every worker they
/// spawn.
#[derive(Clone)]
pub struct CallbackContextBridge {
    inner: Arc<BridgeInner>,
}

struct BridgeInner {
    handler: Arc<dyn EventHandler>,
    context: TurnContext,
    active: AtomicUsize,
    degraded: AtomicU64,
    warned: AtomicBool,
}

impl CallbackContextBridge {
    /// Wrap `handler` so every call runs under `context`.
    pub fn wrap(handler: Arc<dyn EventHandler>, context: TurnContext) -> Self {
        Self {
            inner: Arc::new(BridgeInner {
                handler,
                context,
                active: AtomicUsize::new(0),
                degraded: AtomicU64::new(0),
                warned: AtomicBool::new(false),
            }),
        }
    }

    /// Deliver a protocol event to the wrapped handler.
    pub fn notify(&self, event: GraphEvent) {
        let ctx = self.attach(event.kind());
        self.inner.handler.on_event(&ctx, &event);
    }

    /// Announce the active agent through the wrapped handler.
    pub fn announce_agent(&self, name: &str) {
        let ctx = self.attach("announce_agent");
        self.inner.handler.announce_agent(&ctx, name);
    }

    pub fn turn_id(&self) -> Uuid {
        self.inner.context.turn_id()
    }

    /// Whether the originating turn is still running.
    pub fn is_live(&self) -> bool {
        self.inner.context.is_live()
    }

    /// Number of handler calls currently holding the context.
    pub fn active_attachments(&self) -> usize {
        self.inner.active.load(Ordering::SeqCst)
    }

    /// Number of calls delivered without a live session scope.
    pub fn degraded_events(&self) -> u64 {
        self.inner.degraded.load(Ordering::SeqCst)
    }

    fn attach(&self, operation: &str) -> AttachedContext<'_> {
        let ctx = AttachedContext::new(&self.inner.context, &self.inner.active);
        if ctx.is_degraded() {
            self.inner.degraded.fetch_add(1, Ordering::SeqCst);
            if !self.inner.warned.swap(true, Ordering::SeqCst) {
                tracing::warn!(
                    turn_id = %ctx.turn_id(),
                    operation,
                    "turn context no longer live; context-dependent output will be skipped"
                );
            } else {
                tracing::debug!(turn_id = %ctx.turn_id(), operation, "degraded event delivery");
            }
        }
        ctx
    }
}

impl fmt::Debug for CallbackContextBridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackContextBridge")
            .field("turn_id", &self.turn_id())
            .field("live", &self.is_live())
            .field("active_attachments", &self.active_attachments())
            .field("degraded_events", &self.degraded_events())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<(Uuid, bool, usize, String)>>,
        probe: Mutex<Option<CallbackContextBridge>>,
    }

    impl EventHandler for Recorder {
        fn on_event(&self, ctx: &AttachedContext<'_>, event: &GraphEvent) {
            let active = self
                .probe
                .lock()
                .unwrap()
                .as_ref()
                .map(|b| b.active_attachments())
                .unwrap_or_default();
            self.seen.lock().unwrap().push((
                ctx.turn_id(),
                ctx.scope().is_some(),
                active,
                event.kind().to_string(),
            ));
        }

        fn announce_agent(&self, ctx: &AttachedContext<'_>, name: &str) {
            self.seen
                .lock()
                .unwrap()
                .push((ctx.turn_id(), ctx.scope().is_some(), 0, format!("agent:{name}")));
        }
    }

    fn bridge_with_scope() -> (CallbackContextBridge, Arc<Recorder>, Arc<SessionScope>) {
        let scope = Arc::new(SessionScope::new("s", Uuid::new_v4()));
        let recorder = Arc::new(Recorder::default());
        let bridge = CallbackContextBridge::wrap(recorder.clone(), TurnContext::capture(&scope));
        *recorder.probe.lock().unwrap() = Some(bridge.clone());
        (bridge, recorder, scope)
    }

    #[test]
    fn attaches_exactly_once_per_call_and_detaches_after() {
        let (bridge, recorder, _scope) = bridge_with_scope();
        bridge.notify(GraphEvent::token("a"));
        bridge.notify(GraphEvent::token("b"));

        let seen = recorder.seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert!(seen.iter().all(|(_, live, active, _)| *live && *active == 1));
        drop(seen);
        assert_eq!(bridge.active_attachments(), 0);
        *recorder.probe.lock().unwrap() = None;
    }

    #[test]
    fn stale_context_still_runs_handler() {
        let (bridge, recorder, scope) = bridge_with_scope();
        drop(scope);

        bridge.notify(GraphEvent::Text { text: "late".into() });
        bridge.announce_agent("Researcher");

        let seen = recorder.seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert!(seen.iter().all(|(_, live, _, _)| !live));
        assert_eq!(seen[1].3, "agent:Researcher");
        drop(seen);
        assert_eq!(bridge.degraded_events(), 2);
        assert!(!bridge.is_live());
        *recorder.probe.lock().unwrap() = None;
    }

    #[test]
    fn debug_output_names_turn() {
        let (bridge, recorder, _scope) = bridge_with_scope();
        let rendered = format!("{bridge:?}");
        assert!(rendered.contains(&bridge.turn_id().to_string()));
        *recorder.probe.lock().unwrap() = None;
    }
}
