//! Conductor: bounded turn orchestration for multi-agent conversation graphs.
//!
//! Turns a user query plus conversation history into a single bounded
//! invocation of an external agent graph, streams the graph's progress to a
//! display surface while it runs, and reduces the result to either an
//! updated history or a fixed fallback message.
//!
//! # Quick Start
//!
//! ```
//! use std::sync::Arc;
//! use conductor::prelude::*;
//!
//! # async fn example() -> conductor::error::Result<()> {
//! let surface = Arc::new(BufferSurface::new());
//! let invoker = AgentGraphInvoker::new(Arc::new(EchoGraph::new()), surface.clone());
//! let mut session = ChatSession::new(invoker);
//!
//! let outcome = session.submit("Summarize my resume").await?;
//! assert!(outcome.is_success());
//! assert_eq!(session.history().len(), 2);
//! # Ok(())
//! # }
//! ```

pub mod bridge;
pub mod config;
pub mod error;
pub mod events;
pub mod graph;
pub mod history;
pub mod invoker;
pub mod prelude;
pub mod session;
pub mod sink;
pub mod types;
pub mod util;

#[cfg(feature = "cli")]
pub mod cli;
