//! Error types for conductor.

pub mod unified;

pub use unified::{ErrorCategory, RecoverySuggestion};

use thiserror::Error;

/// Primary error type for all conductor operations.
#[derive(Error, Debug)]
pub enum ConductorError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Agent graph error: {message}")]
    Graph {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Recursion limit of {limit} reached without hitting a stop condition.")]
    RecursionLimit { limit: u32 },

    #[error("Agent graph contract violation: {0}")]
    ContractViolation(String),

    #[error("Timeout after {0}ms")]
    Timeout(u64),

    #[error("Surface error: {0}")]
    Surface(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Config file parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

impl ConductorError {
    /// Create a graph error from a message.
    pub fn graph(message: impl Into<String>) -> Self {
        Self::Graph {
            message: message.into(),
            source: None,
        }
    }

    /// Create a graph error wrapping an underlying cause.
    pub fn graph_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Graph {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Classify this error into a category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Graph { .. } => ErrorCategory::Graph,
            Self::RecursionLimit { .. } => ErrorCategory::RecursionLimit,
            Self::ContractViolation(_) => ErrorCategory::Contract,
            Self::Timeout(_) => ErrorCategory::Timeout,
            Self::Surface(_) => ErrorCategory::Surface,
            Self::Configuration(_) | Self::TomlParse(_) => ErrorCategory::Configuration,
            Self::Serialization(_) => ErrorCategory::Serialization,
            Self::Io(_) => ErrorCategory::Io,
            Self::InvalidArgument(_) => ErrorCategory::Unknown,
        }
    }

    /// Whether this error ends a turn with the fallback response.
    ///
    /// Turn-level failures never touch the conversation history, so the
    /// caller may simply resubmit.
    pub fn is_turn_failure(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::Graph
                | ErrorCategory::RecursionLimit
                | ErrorCategory::Contract
                | ErrorCategory::Timeout
        )
    }

    /// Suggest recovery actions.
    pub fn recovery_suggestion(&self) -> RecoverySuggestion {
        match self.category() {
            ErrorCategory::Graph => RecoverySuggestion::Resubmit,
            ErrorCategory::RecursionLimit => RecoverySuggestion::IncreaseRecursionLimit,
            ErrorCategory::Timeout => RecoverySuggestion::IncreaseTimeout,
            ErrorCategory::Configuration => RecoverySuggestion::CheckConfiguration,
            ErrorCategory::Contract => RecoverySuggestion::CheckGraphImplementation,
            _ => RecoverySuggestion::ContactSupport,
        }
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, ConductorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recursion_limit_message_names_the_limit() {
        let err = ConductorError::RecursionLimit { limit: 30 };
        assert_eq!(
            err.to_string(),
            "Recursion limit of 30 reached without hitting a stop condition."
        );
    }

    #[test]
    fn turn_failures_cover_graph_side_errors_only() {
        assert!(ConductorError::graph("boom").is_turn_failure());
        assert!(ConductorError::RecursionLimit { limit: 3 }.is_turn_failure());
        assert!(ConductorError::ContractViolation("empty".into()).is_turn_failure());
        assert!(ConductorError::Timeout(10).is_turn_failure());
        assert!(!ConductorError::Configuration("bad".into()).is_turn_failure());
        assert!(!ConductorError::Surface("closed".into()).is_turn_failure());
    }

    #[test]
    fn graph_error_keeps_its_source() {
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe");
        let err = ConductorError::graph_with_source("worker crashed", io);
        let source = std::error::Error::source(&err).map(|s| s.to_string());
        assert_eq!(source.as_deref(), Some("pipe"));
    }

    #[test]
    fn recovery_suggestions_follow_category() {
        assert_eq!(
            ConductorError::RecursionLimit { limit: 1 }.recovery_suggestion(),
            RecoverySuggestion::IncreaseRecursionLimit
        );
        assert_eq!(
            ConductorError::ContractViolation("x".into()).recovery_suggestion(),
            RecoverySuggestion::CheckGraphImplementation
        );
        assert_eq!(
            ConductorError::Configuration("x".into()).recovery_suggestion(),
            RecoverySuggestion::CheckConfiguration
        );
    }
}
