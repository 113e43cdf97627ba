//! Invocation contract of the external agent graph.
//!
//! The graph is opaque: this crate hands it an [`InvocationRequest`] and a
//! [`RecursionBudget`], and gets back either the full updated conversation
//! or an error.

pub mod echo;

pub use echo::EchoGraph;

use std::fmt;
use std::num::NonZeroU32;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::bridge::CallbackContextBridge;
use crate::error::{ConductorError, Result};
use crate::types::{Message, Settings};

/// Default ceiling on agent-to-agent hops per invocation.
pub const DEFAULT_RECURSION_LIMIT: u32 = 30;

/// Input state for one graph invocation.
///
/// Built fresh for every turn and consumed by the graph; it cannot be
/// cloned or reused.
pub struct InvocationRequest {
    /// Prior history followed by the new user message.
    pub messages: Vec<Message>,
    pub user_input: String,
    pub config: Settings,
    /// Context-bridged event sink for progress notifications.
    pub callback: CallbackContextBridge,
}

impl fmt::Debug for InvocationRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InvocationRequest")
            .field("messages", &self.messages.len())
            .field("user_input", &self.user_input)
            .field("config", &self.config)
            .field("callback", &self.callback)
            .finish()
    }
}

/// Output state of a successful invocation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InvocationResult {
    /// The full updated conversation; the last entry is the turn's response.
    pub messages: Vec<Message>,
}

impl InvocationResult {
    pub fn new(messages: Vec<Message>) -> Self {
        Self { messages }
    }
}

/// Execution options passed alongside the request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InvokeOptions {
    pub recursion_limit: RecursionBudget,
}

/// Positive ceiling on internal hops for one invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct RecursionBudget(NonZeroU32);

impl RecursionBudget {
    pub fn new(limit: u32) -> Result<Self> {
        NonZeroU32::new(limit).map(Self).ok_or_else(|| {
            ConductorError::Configuration("recursion limit must be a positive integer".into())
        })
    }

    pub fn get(&self) -> u32 {
        self.0.get()
    }

    /// Fresh hop counter against this budget.
    pub fn guard(&self) -> RecursionGuard {
        RecursionGuard {
            limit: self.get(),
            steps: AtomicU32::new(0),
        }
    }
}

impl Default for RecursionBudget {
    fn default() -> Self {
        Self(NonZeroU32::new(DEFAULT_RECURSION_LIMIT).unwrap_or(NonZeroU32::MIN))
    }
}

impl TryFrom<u32> for RecursionBudget {
    type Error = ConductorError;

    fn try_from(value: u32) -> Result<Self> {
        Self::new(value)
    }
}

impl From<RecursionBudget> for u32 {
    fn from(budget: RecursionBudget) -> Self {
        budget.get()
    }
}

impl fmt::Display for RecursionBudget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Hop counter for graph implementations.
///
/// Shared by reference between concurrent workers of one invocation.
#[derive(Debug)]
pub struct RecursionGuard {
    limit: u32,
    steps: AtomicU32,
}

impl RecursionGuard {
    /// Record one hop; fails once the budget is exhausted.
    pub fn step(&self) -> Result<u32> {
        let taken = self.steps.fetch_add(1, Ordering::SeqCst) + 1;
        if taken > self.limit {
            return Err(ConductorError::RecursionLimit { limit: self.limit });
        }
        Ok(taken)
    }

    pub fn steps_taken(&self) -> u32 {
        self.steps.load(Ordering::SeqCst).min(self.limit)
    }

    pub fn remaining(&self) -> u32 {
        self.limit.saturating_sub(self.steps.load(Ordering::SeqCst))
    }
}

/// The external multi-step agent pipeline.
#[async_trait]
pub trait AgentGraph: Send + Sync {
    /// Run one conversational turn to completion.
    ///
    /// Implementations must preserve and extend `request.messages` and
    /// fail with [`ConductorError::RecursionLimit`] once
    /// `options.recursion_limit` hops are exceeded.
    async fn invoke(
        &self,
        request: InvocationRequest,
        options: InvokeOptions,
    ) -> Result<InvocationResult>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_budget_is_thirty() {
        assert_eq!(RecursionBudget::default().get(), 30);
        assert_eq!(InvokeOptions::default().recursion_limit.get(), 30);
    }

    #[test]
    fn zero_budget_is_rejected() {
        let err = RecursionBudget::new(0).unwrap_err();
        assert!(matches!(err, ConductorError::Configuration(_)));
        assert!(serde_json::from_str::<RecursionBudget>("0").is_err());
        assert_eq!(serde_json::from_str::<RecursionBudget>("12").unwrap().get(), 12);
    }

    #[test]
    fn guard_fails_after_limit() {
        let guard = RecursionBudget::new(3).unwrap().guard();
        assert_eq!(guard.step().unwrap(), 1);
        assert_eq!(guard.step().unwrap(), 2);
        assert_eq!(guard.step().unwrap(), 3);
        assert_eq!(guard.remaining(), 0);

        let err = guard.step().unwrap_err();
        assert!(matches!(err, ConductorError::RecursionLimit { limit: 3 }));
        assert_eq!(guard.steps_taken(), 3);
    }
}
