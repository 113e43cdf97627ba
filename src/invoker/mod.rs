//! Turn loop: one bounded graph invocation per user query.

use std::sync::Arc;
use std::time::Duration;

use tracing::Instrument;
use uuid::Uuid;

use crate::bridge::{CallbackContextBridge, SessionScope, TurnContext};
use crate::config::{ConductorConfig, DEFAULT_SESSION_ID};
use crate::error::{ConductorError, Result};
use crate::graph::{AgentGraph, InvocationRequest, InvocationResult, InvokeOptions, RecursionBudget};
use crate::history::ConversationHistory;
use crate::sink::{StreamingEventSink, Surface};
use crate::types::{Message, Role, Settings};
use crate::util::timeout::with_deadline;

/// User-facing text returned for every failed turn.
pub const FALLBACK_MESSAGE: &str = "Sorry, an error occurred. Please try again.";

/// Result of one turn as seen by the surrounding application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// The graph's response text.
    Success(String),
    /// The fallback text; history was left unchanged.
    Failure(String),
}

impl TurnOutcome {
    /// Text to show the user, whichever way the turn went.
    pub fn text(&self) -> &str {
        match self {
            Self::Success(text) | Self::Failure(text) => text,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    fn fallback() -> Self {
        Self::Failure(FALLBACK_MESSAGE.to_string())
    }
}

/// Runs conversational turns against an [`AgentGraph`].
///
/// The invoker holds no conversation state of its own: each call to
/// [`invoke`](Self::invoke) borrows the caller's history, and replaces it
/// wholesale only when the graph returns a well-formed result.
pub struct AgentGraphInvoker {
    graph: Arc<dyn AgentGraph>,
    settings: Settings,
    recursion_limit: RecursionBudget,
    surface: Arc<dyn Surface>,
    session_id: String,
    turn_timeout: Option<Duration>,
}

impl AgentGraphInvoker {
    pub fn new(graph: Arc<dyn AgentGraph>, surface: Arc<dyn Surface>) -> Self {
        Self {
            graph,
            settings: Settings::default(),
            recursion_limit: RecursionBudget::default(),
            surface,
            session_id: DEFAULT_SESSION_ID.to_string(),
            turn_timeout: None,
        }
    }

    /// Invoker configured from a loaded [`ConductorConfig`].
    pub fn from_config(
        graph: Arc<dyn AgentGraph>,
        surface: Arc<dyn Surface>,
        config: &ConductorConfig,
    ) -> Self {
        Self {
            graph,
            settings: config.settings.clone(),
            recursion_limit: config.recursion_limit,
            surface,
            session_id: config.session_id.clone(),
            turn_timeout: config.turn_timeout(),
        }
    }

    pub fn with_settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_recursion_limit(mut self, limit: RecursionBudget) -> Self {
        self.recursion_limit = limit;
        self
    }

    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = session_id.into();
        self
    }

    /// Bound each turn by `timeout`. Unbounded by default.
    pub fn with_turn_timeout(mut self, timeout: Duration) -> Self {
        self.turn_timeout = Some(timeout);
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn recursion_limit(&self) -> RecursionBudget {
        self.recursion_limit
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Run one turn.
    ///
    /// Never fails: every error is logged and reduced to
    /// [`TurnOutcome::Failure`] with `history` left exactly as it was.
    pub async fn invoke(&self, history: &mut ConversationHistory, user_input: &str) -> TurnOutcome {
        let turn_id = Uuid::new_v4();
        let span = tracing::info_span!("turn", %turn_id, session_id = %self.session_id);
        self.run_turn(turn_id, history, user_input)
            .instrument(span)
            .await
    }

    async fn run_turn(
        &self,
        turn_id: Uuid,
        history: &mut ConversationHistory,
        user_input: &str,
    ) -> TurnOutcome {
        let mut candidate = history.snapshot();
        candidate.push(Message::user(user_input));
        tracing::debug!(%turn_id, history_len = history.len(), "turn started");

        // Lives exactly as long as the turn; workers that outlive it see a
        // stale context.
        let scope = Arc::new(SessionScope::new(self.session_id.clone(), turn_id));
        let sink = Arc::new(StreamingEventSink::new(self.surface.clone()));
        let callback = CallbackContextBridge::wrap(sink.clone(), TurnContext::capture(&scope));
        let request = InvocationRequest {
            messages: candidate.clone(),
            user_input: user_input.to_string(),
            config: self.settings.clone(),
            callback,
        };
        let options = InvokeOptions {
            recursion_limit: self.recursion_limit,
        };

        let outcome = self
            .call_graph(request, options)
            .await
            .and_then(|result| validate(&candidate, result));
        drop(scope);

        match outcome {
            Ok(messages) => {
                let response = messages
                    .last()
                    .map(|m| m.content().to_string())
                    .unwrap_or_default();
                tracing::debug!(
                    %turn_id,
                    result_len = messages.len(),
                    rendered = sink.rendered_blocks(),
                    skipped = sink.skipped_blocks(),
                    "turn completed"
                );
                history.replace(messages);
                TurnOutcome::Success(response)
            }
            Err(err) => {
                tracing::error!(
                    %turn_id,
                    error = %err,
                    category = ?err.category(),
                    "agent graph invocation failed"
                );
                TurnOutcome::fallback()
            }
        }
    }

    /// Run the graph on its own task so a panicking collaborator ends the
    /// turn with an error instead of unwinding through the caller.
    async fn call_graph(
        &self,
        request: InvocationRequest,
        options: InvokeOptions,
    ) -> Result<InvocationResult> {
        let graph = self.graph.clone();
        let turn_timeout = self.turn_timeout;
        let task = async move {
            let call = graph.invoke(request, options);
            match turn_timeout {
                Some(deadline) => with_deadline(deadline, call).await,
                None => call.await,
            }
        };
        tokio::spawn(task.in_current_span())
            .await
            .map_err(|e| ConductorError::graph_with_source("agent graph task failed", e))?
    }
}

impl std::fmt::Debug for AgentGraphInvoker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentGraphInvoker")
            .field("settings", &self.settings)
            .field("recursion_limit", &self.recursion_limit)
            .field("session_id", &self.session_id)
            .field("turn_timeout", &self.turn_timeout)
            .finish_non_exhaustive()
    }
}

/// Check that the graph preserved and extended the candidate sequence.
fn validate(candidate: &[Message], result: InvocationResult) -> Result<Vec<Message>> {
    let messages = result.messages;
    let Some(last) = messages.last() else {
        return Err(ConductorError::ContractViolation("graph returned no messages".into()));
    };
    if messages.len() < candidate.len() {
        return Err(ConductorError::ContractViolation(format!(
            "graph pruned history from {} to {} messages",
            candidate.len(),
            messages.len()
        )));
    }
    if let Some(index) = candidate
        .iter()
        .zip(&messages)
        .position(|(sent, returned)| !sent.same_turn_content(returned))
    {
        return Err(ConductorError::ContractViolation(format!(
            "graph rewrote message {index} of the conversation"
        )));
    }
    if last.role() == Role::User {
        return Err(ConductorError::ContractViolation(
            "graph returned no response to the user message".into(),
        ));
    }
    Ok(messages)
}
