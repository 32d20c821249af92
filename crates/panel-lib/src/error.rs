//! Error types surfaced by the fetchers and the readiness wait

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Failure of a single backend request
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// Network error, or a non-2xx answer without a usable body
    #[error("transport error: {0}")]
    Transport(String),
    /// Backend answered but reported the query as failed
    #[error("backend rejected query: {0}")]
    BackendRejected(String),
    /// Body was not JSON or did not have the expected shape
    #[error("malformed response: {0}")]
    Parse(String),
}

/// Classification used in diagnostics and metrics labels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchErrorKind {
    Transport,
    BackendRejected,
    Parse,
}

impl FetchErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FetchErrorKind::Transport => "transport",
            FetchErrorKind::BackendRejected => "backend_rejected",
            FetchErrorKind::Parse => "parse",
        }
    }
}

impl FetchError {
    pub fn kind(&self) -> FetchErrorKind {
        match self {
            FetchError::Transport(_) => FetchErrorKind::Transport,
            FetchError::BackendRejected(_) => FetchErrorKind::BackendRejected,
            FetchError::Parse(_) => FetchErrorKind::Parse,
        }
    }

    /// Parse failures make a series just as unusable as transport failures
    pub fn is_transport_class(&self) -> bool {
        matches!(self, FetchError::Transport(_) | FetchError::Parse(_))
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            FetchError::Parse(err.to_string())
        } else {
            FetchError::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        FetchError::Parse(err.to_string())
    }
}

/// Readiness wait gave up
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReadyError {
    #[error("not ready after {attempts} attempts within {timeout:?}")]
    TimedOut { attempts: u32, timeout: Duration },
}
