//! Error types for the network and storage steps.
//!
//! The pipeline reports typed errors from each step; the batch runner and the
//! CLI convert them to `anyhow` with context.

use thiserror::Error;

/// Failure while talking to the results site or the backend API.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Curl reported an error (timeout, connection, DNS, etc.).
    #[error("{url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: curl::Error,
    },
    /// HTTP response had a non-2xx status.
    #[error("GET {url} returned HTTP {code}")]
    Status { url: String, code: u32 },
    /// Stub endpoint answered but the body held no archive path.
    #[error("stub endpoint {url} returned an empty archive path")]
    EmptyStub { url: String },
    /// Local write failed while streaming (disk full, permission denied).
    #[error("storage: {0}")]
    Storage(#[from] std::io::Error),
}

impl FetchError {
    pub(crate) fn transport(url: &str, source: curl::Error) -> Self {
        FetchError::Transport {
            url: url.to_string(),
            source,
        }
    }

    /// HTTP status code, if the failure was a non-2xx response.
    pub fn status_code(&self) -> Option<u32> {
        match self {
            FetchError::Status { code, .. } => Some(*code),
            _ => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, FetchError::Transport { source, .. } if source.is_operation_timedout())
    }
}

/// A team data URL without a usable `(CompetitionID, TeamID)` pair.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IdentifierError {
    #[error("invalid team data URL {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("team data URL {url:?} has no {param} parameter")]
    MissingParam { url: String, param: &'static str },
}
