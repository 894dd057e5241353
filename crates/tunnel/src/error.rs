//! Failures of one streaming operation.
//!
//! Variants carry owned strings so an error can both terminate the operation
//! and travel down the byte channel to whoever is consuming it.

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StreamError {
    #[error("stream cancelled")]
    Cancelled,

    #[error("client disconnected")]
    ClientGone,

    #[error("invalid plan: {reason}")]
    InvalidPlan { reason: String },

    #[error("metadata tag `{name}` is not in the allow list")]
    MetadataTag { name: String },

    #[error("upstream request failed: {reason}")]
    Network { reason: String },

    #[error("upstream returned HTTP {status} for {url}")]
    UpstreamStatus { status: u16, url: String },

    #[error("failed to spawn `{program}`: {reason}")]
    Spawn { program: String, reason: String },

    #[error("download failed: {reason}")]
    Download { reason: String },

    #[error("process exited with status {code:?}")]
    ProcessExit { code: Option<i32> },

    #[error("I/O error: {reason}")]
    Io { reason: String },

    #[error("operation deadline exceeded")]
    DeadlineExceeded,
}

impl StreamError {
    pub fn invalid_plan(reason: impl Into<String>) -> Self {
        Self::InvalidPlan {
            reason: reason.into(),
        }
    }

    pub fn download(reason: impl Into<String>) -> Self {
        Self::Download {
            reason: reason.into(),
        }
    }
}

impl From<reqwest::Error> for StreamError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network {
            reason: err.to_string(),
        }
    }
}

impl From<std::io::Error> for StreamError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            reason: err.to_string(),
        }
    }
}
