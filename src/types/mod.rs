//! Core types for conductor.

pub mod message;
pub mod settings;

pub use message::*;
pub use settings::*;
