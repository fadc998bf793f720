use std::fmt;

use serde::{Deserialize, Serialize};

/// Coarse failure taxonomy shared by every pipeline stage.
///
/// Cancellation is deliberately absent: a cancelled stage reports
/// [`StageOutcome::Cancelled`] instead of an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureKind {
    /// Fetch or download failure
    Network,
    /// Corrupt archive or missing/ambiguous member
    Archive,
    /// Malformed dataset content
    Parse,
    /// Schema or transaction failure during build or query
    Store,
    /// Local file could not be written or moved
    Io,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FailureKind::Network => "network error",
            FailureKind::Archive => "archive error",
            FailureKind::Parse => "parse error",
            FailureKind::Store => "store error",
            FailureKind::Io => "file error",
        };
        f.write_str(name)
    }
}

/// Result of a stage that honours a cancellation token
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageOutcome<T> {
    Completed(T),
    Cancelled,
}

impl<T> StageOutcome<T> {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, StageOutcome::Cancelled)
    }

    pub fn completed(self) -> Option<T> {
        match self {
            StageOutcome::Completed(value) => Some(value),
            StageOutcome::Cancelled => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> StageOutcome<U> {
        match self {
            StageOutcome::Completed(value) => StageOutcome::Completed(f(value)),
            StageOutcome::Cancelled => StageOutcome::Cancelled,
        }
    }
}
