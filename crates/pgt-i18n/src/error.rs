#![forbid(unsafe_code)]

//! Engine error types.
//!
//! Missing translations are never errors: lookup misses resolve to the
//! default value or the key itself. Errors here cover configuration and
//! backend loading only, and they propagate to callers unchanged.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, EngineError>;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid engine options: {0}")]
    InvalidOptions(#[from] serde_json::Error),

    #[error("backend load failed for {lng}/{ns}: {source}")]
    Load {
        lng: String,
        ns: String,
        #[source]
        source: BackendError,
    },
}

/// Failure reported by a [`Backend`](crate::backend::Backend).
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("no bundle for {lng}/{ns}")]
    NotFound { lng: String, ns: String },

    #[error("{message}")]
    Failed { message: String },
}

impl BackendError {
    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
        }
    }
}
