use serde::Serialize;
use thiserror::Error;

/// Everything that can go wrong between resolving the SQL endpoint and
/// extracting per-table results. The orchestrator funnels each variant into a
/// `SyncReport::Failure` with the matching [`FailureKind`]; no variant escapes
/// a run.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("workspace or lakehouse not found ({path})")]
    NotFound { path: String },

    #[error("{path} returned HTTP {status}: {body}")]
    Transport {
        path: String,
        status: u16,
        body: String,
    },

    #[error("request to {path} failed: {source}")]
    Request {
        path: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("unexpected response shape from {context}: {reason}")]
    Schema { context: String, reason: String },

    #[error("invalid timestamp {value:?}: {source}")]
    Timestamp {
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("refresh batch still running after {attempts} status checks")]
    Timeout { attempts: u32 },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SyncError {
    pub fn kind(&self) -> FailureKind {
        match self {
            SyncError::NotFound { .. } => FailureKind::NotFound,
            SyncError::Transport { .. } => FailureKind::Transport,
            SyncError::Schema { .. } => FailureKind::Schema,
            SyncError::Timestamp { .. } => FailureKind::Format,
            SyncError::Timeout { .. } => FailureKind::Timeout,
            SyncError::Request { .. } | SyncError::Other(_) => FailureKind::Unclassified,
        }
    }
}

/// Distinguishing label attached to every failed run.
///
/// `RefreshFailed` and `AmbiguousState` are server-reported business outcomes
/// rather than client faults; the rest mirror [`SyncError`] variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    NotFound,
    Transport,
    Schema,
    Format,
    Timeout,
    RefreshFailed,
    AmbiguousState,
    Unclassified,
}

impl FailureKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FailureKind::NotFound => "not_found",
            FailureKind::Transport => "transport",
            FailureKind::Schema => "schema",
            FailureKind::Format => "format",
            FailureKind::Timeout => "timeout",
            FailureKind::RefreshFailed => "refresh_failed",
            FailureKind::AmbiguousState => "ambiguous_state",
            FailureKind::Unclassified => "unclassified",
        }
    }
}
