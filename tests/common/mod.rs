//! Shared test helpers: a scripted agent graph and a recording handler.
#![allow(dead_code)]

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;

use conductor::bridge::{AttachedContext, CallbackContextBridge};
use conductor::error::{ConductorError, Result};
use conductor::events::{EventHandler, GraphEvent};
use conductor::graph::{AgentGraph, InvocationRequest, InvocationResult, InvokeOptions};
use conductor::types::{Message, Settings};

/// What the scripted graph does when invoked.
#[derive(Debug, Clone)]
pub enum Script {
    /// Append an assistant reply, streaming it from worker threads.
    Respond(String),
    /// Fail with a graph error.
    Fail(String),
    /// Hop between agents until the recursion budget runs out.
    LoopForever,
    /// Return these messages verbatim.
    Raw(Vec<Message>),
    /// Sleep before replying.
    Sleep(Duration, String),
    /// Index past the end of the conversation, as a buggy graph would.
    OutOfBounds,
}

/// A request as the graph received it.
#[derive(Debug, Clone)]
pub struct SeenRequest {
    pub messages: Vec<Message>,
    pub user_input: String,
    pub config: Settings,
    pub recursion_limit: u32,
}

/// A mock graph that replays a fixed script.
pub struct ScriptedGraph {
    script: Mutex<Script>,
    requests: Mutex<Vec<SeenRequest>>,
    hops: AtomicU32,
    kept_callback: Mutex<Option<CallbackContextBridge>>,
}

impl ScriptedGraph {
    pub fn new(script: Script) -> Self {
        Self {
            script: Mutex::new(script),
            requests: Mutex::new(Vec::new()),
            hops: AtomicU32::new(0),
            kept_callback: Mutex::new(None),
        }
    }

    pub fn respond(text: &str) -> Self {
        Self::new(Script::Respond(text.to_string()))
    }

    pub fn set_script(&self, script: Script) {
        *self.script.lock().unwrap() = script;
    }

    pub fn requests(&self) -> Vec<SeenRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Hops taken across all invocations.
    pub fn hops(&self) -> u32 {
        self.hops.load(Ordering::SeqCst)
    }

    /// The callback of the most recent invocation, kept alive past the
    /// end of its turn the way a straggling worker would.
    pub fn kept_callback(&self) -> Option<CallbackContextBridge> {
        self.kept_callback.lock().unwrap().clone()
    }
}

#[async_trait]
impl AgentGraph for ScriptedGraph {
    async fn invoke(
        &self,
        request: InvocationRequest,
        options: InvokeOptions,
    ) -> Result<InvocationResult> {
        self.requests.lock().unwrap().push(SeenRequest {
            messages: request.messages.clone(),
            user_input: request.user_input.clone(),
            config: request.config.clone(),
            recursion_limit: options.recursion_limit.get(),
        });
        *self.kept_callback.lock().unwrap() = Some(request.callback.clone());

        let script = self.script.lock().unwrap().clone();
        let callback = request.callback;
        let mut messages = request.messages;
        match script {
            Script::Respond(text) => {
                callback.announce_agent("Supervisor");
                stream_from_workers(&callback, &text).await?;
                messages.push(Message::assistant(text).with_name("ResumeAnalyzer"));
                Ok(InvocationResult::new(messages))
            }
            Script::Fail(reason) => {
                callback.notify(GraphEvent::ChainError {
                    message: reason.clone(),
                });
                Err(ConductorError::graph(reason))
            }
            Script::LoopForever => {
                let guard = options.recursion_limit.guard();
                loop {
                    guard.step()?;
                    self.hops.fetch_add(1, Ordering::SeqCst);
                    callback.announce_agent("Supervisor");
                }
            }
            Script::Raw(raw) => Ok(InvocationResult::new(raw)),
            Script::OutOfBounds => {
                let past_end = messages.len() + 3;
                let reply = messages[past_end].content().to_string();
                messages.push(Message::assistant(reply));
                Ok(InvocationResult::new(messages))
            }
            Script::Sleep(delay, text) => {
                tokio::time::sleep(delay).await;
                messages.push(Message::assistant(text));
                Ok(InvocationResult::new(messages))
            }
        }
    }
}

/// Emit the agent name from a tokio task and the tokens from a blocking
/// worker thread, as a real graph's executor would.
async fn stream_from_workers(callback: &CallbackContextBridge, text: &str) -> Result<()> {
    let announcer = callback.clone();
    tokio::spawn(async move { announcer.announce_agent("ResumeAnalyzer") })
        .await
        .map_err(|e| ConductorError::graph_with_source("announcer failed", e))?;

    let worker = callback.clone();
    let text = text.to_string();
    tokio::task::spawn_blocking(move || {
        worker.notify(GraphEvent::LlmStart { prompts: vec![] });
        for token in text.split_inclusive(' ') {
            worker.notify(GraphEvent::token(token));
        }
        worker.notify(GraphEvent::LlmEnd { text });
    })
    .await
    .map_err(|e| ConductorError::graph_with_source("token worker failed", e))
}

/// One handler call as observed by [`RecordingHandler`].
#[derive(Debug, Clone, PartialEq)]
pub struct Observed {
    pub turn_id: Uuid,
    pub degraded: bool,
    pub kind: String,
    pub thread: std::thread::ThreadId,
}

/// Handler that records every call with the context it ran under.
#[derive(Default)]
pub struct RecordingHandler {
    seen: Mutex<Vec<Observed>>,
}

impl RecordingHandler {
    pub fn seen(&self) -> Vec<Observed> {
        self.seen.lock().unwrap().clone()
    }

    fn record(&self, ctx: &AttachedContext<'_>, kind: &str) {
        self.seen.lock().unwrap().push(Observed {
            turn_id: ctx.turn_id(),
            degraded: ctx.is_degraded(),
            kind: kind.to_string(),
            thread: std::thread::current().id(),
        });
    }
}

impl EventHandler for RecordingHandler {
    fn on_event(&self, ctx: &AttachedContext<'_>, event: &GraphEvent) {
        self.record(ctx, event.kind());
    }

    fn announce_agent(&self, ctx: &AttachedContext<'_>, name: &str) {
        self.record(ctx, &format!("agent:{name}"));
    }
}
