//! Chat session: one history, one invoker, and the visible transcript.

use serde::{Deserialize, Serialize};

use crate::error::{ConductorError, Result};
use crate::history::ConversationHistory;
use crate::invoker::{AgentGraphInvoker, TurnOutcome};

/// A query and the text shown in reply to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exchange {
    pub query: String,
    pub response: String,
    pub succeeded: bool,
}

/// Owner of the conversation state for one user.
///
/// Turns are run one at a time through `&mut self`, so the history never
/// has more than one writer.
#[derive(Debug)]
pub struct ChatSession {
    invoker: AgentGraphInvoker,
    history: ConversationHistory,
    transcript: Vec<Exchange>,
}

impl ChatSession {
    pub fn new(invoker: AgentGraphInvoker) -> Self {
        Self::with_history(invoker, ConversationHistory::new())
    }

    /// Resume from an existing history. The transcript starts empty.
    pub fn with_history(invoker: AgentGraphInvoker, history: ConversationHistory) -> Self {
        Self {
            invoker,
            history,
            transcript: Vec::new(),
        }
    }

    /// Run one turn for `query`.
    ///
    /// Blank input is rejected before the graph is called. Otherwise the
    /// outcome is recorded in the transcript whether or not it succeeded.
    pub async fn submit(&mut self, query: &str) -> Result<TurnOutcome> {
        if query.trim().is_empty() {
            return Err(ConductorError::InvalidArgument("query must not be empty".into()));
        }
        let outcome = self.invoker.invoke(&mut self.history, query).await;
        self.transcript.push(Exchange {
            query: query.to_string(),
            response: outcome.text().to_string(),
            succeeded: outcome.is_success(),
        });
        Ok(outcome)
    }

    /// Drop all conversation state.
    pub fn clear(&mut self) {
        self.history.clear();
        self.transcript.clear();
        tracing::debug!(session_id = self.invoker.session_id(), "session cleared");
    }

    pub fn history(&self) -> &ConversationHistory {
        &self.history
    }

    pub fn transcript(&self) -> &[Exchange] {
        &self.transcript
    }

    pub fn invoker(&self) -> &AgentGraphInvoker {
        &self.invoker
    }
}
