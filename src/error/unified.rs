//! Error classification and recovery hints.

/// Broad error category for routing recovery logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The agent graph itself failed.
    Graph,
    /// The graph ran out of recursion budget.
    RecursionLimit,
    /// The graph broke its output contract.
    Contract,
    /// The turn deadline expired.
    Timeout,
    /// Rendering to the output surface failed.
    Surface,
    Configuration,
    Serialization,
    Io,
    Unknown,
}

/// Suggested recovery action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoverySuggestion {
    /// Resubmit the query; the history was left untouched.
    Resubmit,
    /// Raise the recursion limit or simplify the query.
    IncreaseRecursionLimit,
    IncreaseTimeout,
    CheckConfiguration,
    /// The graph implementation needs fixing.
    CheckGraphImplementation,
    ContactSupport,
}
