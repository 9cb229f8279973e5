//! Error types.
//!
//! - `ResolveError`: typed failures of the taxonomy/dataset join. Every variant
//!   except `CycleDetected` means "no data for this selection".
//! - `AppError`: the binary-level error carrying a process exit code.

use thiserror::Error;

use crate::taxonomy::PathKey;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ResolveError {
    #[error("taxonomy node not found: {0}")]
    NodeNotFound(i64),

    #[error("taxonomy cycle detected at node {node} (chain: {chain:?})")]
    CycleDetected { node: i64, chain: Vec<i64> },

    #[error("taxonomy node {node} references missing parent {parent}")]
    DanglingParent { node: i64, parent: i64 },

    #[error("dataset entry {entry} has a malformed stream {stream:?}")]
    MalformedStream { entry: i64, stream: String },

    #[error("dataset entry {entry} references stream {stream} which is not a path in the taxonomy")]
    UnresolvedReference { entry: i64, stream: PathKey },

    #[error("no dataset for path key {0}")]
    NoDataset(PathKey),

    #[error("dataset entry {entry} has no series matching {label:?}")]
    NoSeries { entry: i64, label: Option<String> },

    #[error("no taxonomy node matches {0:?}")]
    NoMatchingNode(String),
}

impl ResolveError {
    /// Whether the caller should render "no data" instead of failing.
    ///
    /// A cycle means the taxonomy snapshot itself is inconsistent.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, ResolveError::CycleDetected { .. })
    }
}

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl From<ResolveError> for AppError {
    fn from(err: ResolveError) -> Self {
        let code = if err.is_recoverable() { 3 } else { 4 };
        AppError::new(code, err.to_string())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_cycles_are_fatal() {
        let cycle = ResolveError::CycleDetected { node: 1, chain: vec![1, 2, 1] };
        assert!(!cycle.is_recoverable());
        assert_eq!(AppError::from(cycle).exit_code(), 4);

        let missing = ResolveError::NodeNotFound(7);
        assert!(missing.is_recoverable());
        assert_eq!(AppError::from(missing).exit_code(), 3);
    }
}
