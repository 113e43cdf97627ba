//! Output surfaces the streaming sink renders into.

use std::io::Write;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::bridge::SessionScope;
use crate::error::{ConductorError, Result};

/// One unit of incremental output.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum RenderBlock {
    /// The named agent that is now active.
    AgentName(String),
    /// A streamed model token.
    Token(String),
    /// A step description such as a tool call.
    Step {
        label: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        detail: Option<String>,
    },
    Markdown(String),
    Error(String),
}

/// Display target bound to a sink.
///
/// Rendering requires the live session scope of the turn that owns the
/// output.
pub trait Surface: Send + Sync {
    fn render(&self, scope: &SessionScope, block: RenderBlock) -> Result<()>;
}

/// A block together with the turn it was rendered for.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedBlock {
    pub session_id: String,
    pub turn_id: Uuid,
    pub block: RenderBlock,
}

/// In-memory surface; embedders read it back, tests inspect it.
#[derive(Debug, Default)]
pub struct BufferSurface {
    entries: Mutex<Vec<RenderedBlock>>,
    closed: Mutex<bool>,
}

impl BufferSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<RenderedBlock> {
        self.lock_entries().clone()
    }

    pub fn blocks(&self) -> Vec<RenderBlock> {
        self.lock_entries().iter().map(|e| e.block.clone()).collect()
    }

    /// Concatenation of all streamed tokens.
    pub fn streamed_text(&self) -> String {
        self.lock_entries()
            .iter()
            .filter_map(|e| match &e.block {
                RenderBlock::Token(t) => Some(t.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.lock_entries().clear();
    }

    /// Refuse further writes, as a torn-down display would.
    pub fn close(&self) {
        *self.closed.lock().unwrap_or_else(|p| p.into_inner()) = true;
    }

    fn lock_entries(&self) -> std::sync::MutexGuard<'_, Vec<RenderedBlock>> {
        self.entries.lock().unwrap_or_else(|p| p.into_inner())
    }
}

impl Surface for BufferSurface {
    fn render(&self, scope: &SessionScope, block: RenderBlock) -> Result<()> {
        if *self.closed.lock().unwrap_or_else(|p| p.into_inner()) {
            return Err(ConductorError::Surface("surface closed".into()));
        }
        self.lock_entries().push(RenderedBlock {
            session_id: scope.session_id().to_string(),
            turn_id: scope.turn_id(),
            block,
        });
        Ok(())
    }
}

/// Plain-text surface over any writer, e.g. a terminal.
pub struct WriterSurface<W: Write + Send> {
    writer: Mutex<W>,
}

impl WriterSurface<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write + Send> WriterSurface<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer.into_inner().unwrap_or_else(|p| p.into_inner())
    }
}

impl<W: Write + Send> Surface for WriterSurface<W> {
    fn render(&self, _scope: &SessionScope, block: RenderBlock) -> Result<()> {
        let mut w = self
            .writer
            .lock()
            .map_err(|_| ConductorError::Surface("writer lock poisoned".into()))?;
        match block {
            RenderBlock::AgentName(name) => writeln!(w, "\n[{name}]")?,
            RenderBlock::Token(token) => write!(w, "{token}")?,
            RenderBlock::Step { label, detail } => {
                writeln!(w, "\n> {label}")?;
                if let Some(detail) = detail {
                    for line in detail.lines() {
                        writeln!(w, "  {line}")?;
                    }
                }
            }
            RenderBlock::Markdown(text) => writeln!(w, "\n{text}")?,
            RenderBlock::Error(message) => writeln!(w, "\n! {message}")?,
        }
        w.flush()?;
        Ok(())
    }
}
