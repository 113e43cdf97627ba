//! Echo graph: replies with the user's input, streaming it token by token
//! from a worker task. Used by the CLI and for wiring checks.

use serde_json::json;

use crate::error::{ConductorError, Result};
use crate::events::GraphEvent;
use crate::types::Message;

use super::{AgentGraph, InvocationRequest, InvocationResult, InvokeOptions};

/// Minimal reference graph.
///
/// Each invocation routes through `hops` agents (a supervisor, then echo
/// agents), spending one unit of recursion budget per hop.
#[derive(Debug, Clone)]
pub struct EchoGraph {
    hops: u32,
    prefix: String,
}

impl Default for EchoGraph {
    fn default() -> Self {
        Self {
            hops: 2,
            prefix: String::new(),
        }
    }
}

impl EchoGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of agent hops per invocation.
    pub fn with_hops(mut self, hops: u32) -> Self {
        self.hops = hops;
        self
    }

    /// Text placed before the echoed input.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    fn agent_name(hop: u32) -> &'static str {
        if hop == 0 {
            "Supervisor"
        } else {
            "EchoAgent"
        }
    }
}

#[async_trait::async_trait]
impl AgentGraph for EchoGraph {
    async fn invoke(
        &self,
        request: InvocationRequest,
        options: InvokeOptions,
    ) -> Result<InvocationResult> {
        let guard = options.recursion_limit.guard();
        let callback = request.callback;
        callback.notify(GraphEvent::ChainStart {
            name: "EchoGraph".into(),
        });

        let mut last_agent = Self::agent_name(0);
        for hop in 0..self.hops {
            guard.step()?;
            last_agent = Self::agent_name(hop);
            callback.announce_agent(last_agent);
        }

        let reply = format!("{}{}", self.prefix, request.user_input);
        let worker = callback.clone();
        let text = reply.clone();
        tokio::spawn(async move {
            worker.notify(GraphEvent::LlmStart {
                prompts: vec![text.clone()],
            });
            for token in text.split_inclusive(' ') {
                worker.notify(GraphEvent::token(token));
            }
            worker.notify(GraphEvent::LlmEnd { text });
        })
        .await
        .map_err(|e| ConductorError::graph_with_source("echo worker failed", e))?;

        callback.notify(GraphEvent::ChainEnd {
            outputs: json!({ "output": reply }),
        });

        let mut messages = request.messages;
        messages.push(Message::assistant(reply).with_name(last_agent));
        Ok(InvocationResult::new(messages))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::bridge::{CallbackContextBridge, SessionScope, TurnContext};
    use crate::graph::RecursionBudget;
    use crate::sink::{BufferSurface, RenderBlock, StreamingEventSink};
    use crate::types::Settings;

    fn request(
        input: &str,
        surface: Arc<BufferSurface>,
        scope: &Arc<SessionScope>,
    ) -> InvocationRequest {
        let sink = Arc::new(StreamingEventSink::new(surface));
        InvocationRequest {
            messages: vec![Message::user(input)],
            user_input: input.to_string(),
            config: Settings::default(),
            callback: CallbackContextBridge::wrap(sink, TurnContext::capture(scope)),
        }
    }

    #[tokio::test]
    async fn echoes_input_and_streams_tokens() {
        let surface = Arc::new(BufferSurface::new());
        let scope = Arc::new(SessionScope::new("s", uuid::Uuid::new_v4()));
        let graph = EchoGraph::new().with_prefix("echo: ");

        let result = graph
            .invoke(request("hello there", surface.clone(), &scope), InvokeOptions::default())
            .await
            .unwrap();

        assert_eq!(result.messages.len(), 2);
        assert_eq!(result.messages[1].content(), "echo: hello there");
        assert_eq!(result.messages[1].name(), Some("EchoAgent"));
        assert_eq!(surface.streamed_text(), "echo: hello there");
        let blocks = surface.blocks();
        assert_eq!(blocks[0], RenderBlock::AgentName("Supervisor".into()));
        assert_eq!(blocks[1], RenderBlock::AgentName("EchoAgent".into()));
    }

    #[tokio::test]
    async fn exceeding_budget_fails() {
        let surface = Arc::new(BufferSurface::new());
        let scope = Arc::new(SessionScope::new("s", uuid::Uuid::new_v4()));
        let graph = EchoGraph::new().with_hops(5);
        let options = InvokeOptions {
            recursion_limit: RecursionBudget::new(4).unwrap(),
        };

        let err = graph
            .invoke(request("hi", surface, &scope), options)
            .await
            .unwrap_err();
        assert!(matches!(err, ConductorError::RecursionLimit { limit: 4 }));
    }
}
