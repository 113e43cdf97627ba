//! Streaming event sink: renders graph progress onto a bound surface.

pub mod surface;

pub use surface::{BufferSurface, RenderBlock, RenderedBlock, Surface, WriterSurface};

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::bridge::AttachedContext;
use crate::events::{EventHandler, GraphEvent};

/// Event handler that writes each notification to one output surface,
/// in the order received.
pub struct StreamingEventSink {
    surface: Arc<dyn Surface>,
    rendered: AtomicU64,
    skipped: AtomicU64,
}

impl StreamingEventSink {
    pub fn new(surface: Arc<dyn Surface>) -> Self {
        Self {
            surface,
            rendered: AtomicU64::new(0),
            skipped: AtomicU64::new(0),
        }
    }

    /// Blocks written to the surface so far.
    pub fn rendered_blocks(&self) -> u64 {
        self.rendered.load(Ordering::SeqCst)
    }

    /// Blocks dropped because the turn context was stale or the surface
    /// refused them.
    pub fn skipped_blocks(&self) -> u64 {
        self.skipped.load(Ordering::SeqCst)
    }

    fn write(&self, ctx: &AttachedContext<'_>, block: RenderBlock) {
        let Some(scope) = ctx.scope() else {
            self.skipped.fetch_add(1, Ordering::SeqCst);
            tracing::debug!(turn_id = %ctx.turn_id(), "no live session scope, render skipped");
            return;
        };
        match self.surface.render(scope, block) {
            Ok(()) => {
                self.rendered.fetch_add(1, Ordering::SeqCst);
            }
            Err(err) => {
                self.skipped.fetch_add(1, Ordering::SeqCst);
                tracing::warn!(turn_id = %ctx.turn_id(), error = %err, "surface render failed");
            }
        }
    }
}

impl EventHandler for StreamingEventSink {
    fn on_event(&self, ctx: &AttachedContext<'_>, event: &GraphEvent) {
        match render_block(event) {
            Some(block) => self.write(ctx, block),
            None => tracing::trace!(kind = event.kind(), "event has no visible output"),
        }
    }

    fn announce_agent(&self, ctx: &AttachedContext<'_>, name: &str) {
        self.write(ctx, RenderBlock::AgentName(name.to_string()));
    }
}

fn render_block(event: &GraphEvent) -> Option<RenderBlock> {
    let block = match event {
        GraphEvent::ChainStart { .. } | GraphEvent::ChainEnd { .. } => return None,
        GraphEvent::LlmStart { .. } => RenderBlock::Step {
            label: "Thinking...".into(),
            detail: None,
        },
        GraphEvent::LlmNewToken { token } => RenderBlock::Token(token.clone()),
        GraphEvent::LlmEnd { .. } => return None,
        GraphEvent::ToolStart { tool, input } => RenderBlock::Step {
            label: format!("Using tool: {tool}"),
            detail: (!input.is_empty()).then(|| input.clone()),
        },
        GraphEvent::ToolEnd { output } => RenderBlock::Step {
            label: "Tool output".into(),
            detail: Some(output.clone()),
        },
        GraphEvent::AgentAction { log, .. } if log.is_empty() => return None,
        GraphEvent::AgentAction { log, .. } => RenderBlock::Markdown(log.clone()),
        GraphEvent::AgentFinish { output } => RenderBlock::Markdown(output.clone()),
        GraphEvent::Text { text } => RenderBlock::Markdown(text.clone()),
        GraphEvent::ChainError { message }
        | GraphEvent::LlmError { message }
        | GraphEvent::ToolError { message } => RenderBlock::Error(message.clone()),
        GraphEvent::Custom { kind, payload, .. } => RenderBlock::Step {
            label: kind.clone(),
            detail: (!payload.is_null()).then(|| payload.to_string()),
        },
    };
    Some(block)
}
