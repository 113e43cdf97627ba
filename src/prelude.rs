//! Convenience re-exports for common use.

pub use crate::bridge::{AttachedContext, CallbackContextBridge, SessionScope, TurnContext};
pub use crate::config::ConductorConfig;
pub use crate::error::{ConductorError, Result};
pub use crate::events::{EventHandler, GraphEvent};
pub use crate::graph::{
    AgentGraph, EchoGraph, InvocationRequest, InvocationResult, InvokeOptions, RecursionBudget,
};
pub use crate::history::ConversationHistory;
pub use crate::invoker::{AgentGraphInvoker, TurnOutcome, FALLBACK_MESSAGE};
pub use crate::session::{ChatSession, Exchange};
pub use crate::sink::{BufferSurface, RenderBlock, StreamingEventSink, Surface, WriterSurface};
pub use crate::types::{Message, ModelProvider, Role, Settings};
