//! Event protocol between the agent graph and its progress handlers.

use serde::{Deserialize, Deserializer, Serialize};

use crate::bridge::AttachedContext;

/// Prefix shared by every event kind name.
pub const EVENT_PREFIX: &str = "on_";

/// Progress notification emitted by the agent graph while a turn runs.
///
/// New kinds are added as variants; graphs that need a kind this crate
/// does not know yet can use [`GraphEvent::custom`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
#[non_exhaustive]
pub enum GraphEvent {
    ChainStart {
        name: String,
    },
    ChainEnd {
        #[serde(default)]
        outputs: serde_json::Value,
    },
    ChainError {
        message: String,
    },
    LlmStart {
        #[serde(default)]
        prompts: Vec<String>,
    },
    LlmNewToken {
        token: String,
    },
    LlmEnd {
        #[serde(default)]
        text: String,
    },
    LlmError {
        message: String,
    },
    ToolStart {
        tool: String,
        input: String,
    },
    ToolEnd {
        output: String,
    },
    ToolError {
        message: String,
    },
    AgentAction {
        tool: String,
        tool_input: String,
        #[serde(default)]
        log: String,
    },
    AgentFinish {
        output: String,
    },
    Text {
        text: String,
    },
    /// Graph-defined event; build it with [`GraphEvent::custom`].
    #[non_exhaustive]
    Custom {
        #[serde(deserialize_with = "prefixed_kind")]
        kind: String,
        #[serde(default)]
        payload: serde_json::Value,
    },
}

impl GraphEvent {
    /// Build a graph-defined event. The kind gains the `on_` prefix if it
    /// lacks one.
    pub fn custom(kind: impl Into<String>, payload: serde_json::Value) -> Self {
        Self::Custom {
            kind: with_prefix(kind.into()),
            payload,
        }
    }

    pub fn token(token: impl Into<String>) -> Self {
        Self::LlmNewToken {
            token: token.into(),
        }
    }

    /// Protocol name of this event, e.g. `on_llm_new_token`.
    pub fn kind(&self) -> &str {
        match self {
            Self::ChainStart { .. } => "on_chain_start",
            Self::ChainEnd { .. } => "on_chain_end",
            Self::ChainError { .. } => "on_chain_error",
            Self::LlmStart { .. } => "on_llm_start",
            Self::LlmNewToken { .. } => "on_llm_new_token",
            Self::LlmEnd { .. } => "on_llm_end",
            Self::LlmError { .. } => "on_llm_error",
            Self::ToolStart { .. } => "on_tool_start",
            Self::ToolEnd { .. } => "on_tool_end",
            Self::ToolError { .. } => "on_tool_error",
            Self::AgentAction { .. } => "on_agent_action",
            Self::AgentFinish { .. } => "on_agent_finish",
            Self::Text { .. } => "on_text",
            Self::Custom { kind, .. } => kind,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(
            self,
            Self::ChainError { .. } | Self::LlmError { .. } | Self::ToolError { .. }
        )
    }
}

fn with_prefix(kind: String) -> String {
    if kind.starts_with(EVENT_PREFIX) {
        kind
    } else {
        format!("{EVENT_PREFIX}{kind}")
    }
}

fn prefixed_kind<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    String::deserialize(deserializer).map(with_prefix)
}

/// Receiver of graph progress notifications.
///
/// Handlers are always invoked through a
/// [`CallbackContextBridge`](crate::bridge::CallbackContextBridge), which
/// attaches the originating turn's context for the duration of each call.
/// Nothing a handler returns is consumed by the graph.
pub trait EventHandler: Send + Sync {
    /// Handle one protocol event.
    fn on_event(&self, ctx: &AttachedContext<'_>, event: &GraphEvent);

    /// Announce which named agent is now active.
    fn announce_agent(&self, ctx: &AttachedContext<'_>, name: &str) {
        let _ = (ctx, name);
    }
}
