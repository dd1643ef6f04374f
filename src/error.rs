//! Error taxonomy for the pipeline.
//!
//! Every failure that can abort a sync or an analysis is one of the
//! [`PipelineError`] variants. A missing object in the store is not an
//! error; see [`crate::store::Lookup`].

use thiserror::Error;

/// Failure reported by an [`crate::store::ObjectStore`] adapter.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid object key '{0}'")]
    InvalidKey(String),

    #[error("I/O error on '{key}': {message}")]
    Io { key: String, message: String },
}

/// Failure reported by a [`crate::notify::Notifier`] adapter.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("cannot encode message: {0}")]
    Encode(String),

    #[error("cannot reach notification endpoint: {0}")]
    Transport(String),

    #[error("notification endpoint rejected message with status {status}: {body}")]
    Rejected { status: u16, body: String },
}

/// Top-level error for sync and analysis operations.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Network/HTTP failure or malformed payload from an origin source.
    #[error("origin fetch failed for {url}: {message}")]
    OriginFetch { url: String, message: String },

    /// Failure reading or writing the object store.
    #[error("object store error: {0}")]
    Store(#[from] StoreError),

    /// Failure publishing to the notification channel.
    #[error("notification failed: {0}")]
    Notification(#[from] NotifyError),

    /// Malformed or missing data preventing a computation.
    #[error("analysis failed: {0}")]
    Analysis(String),

    /// Inbound event that could not be decoded.
    #[error("invalid trigger: {0}")]
    InvalidTrigger(String),
}

impl PipelineError {
    pub fn origin(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::OriginFetch {
            url: url.into(),
            message: message.into(),
        }
    }

    pub fn analysis(message: impl Into<String>) -> Self {
        Self::Analysis(message.into())
    }
}

pub type PipelineResult<T> = Result<T, PipelineError>;
