//! Error types for mailbox-sync

use thiserror::Error;

/// Why a remote call was rejected by the service itself.
///
/// The display messages are fixed so callers can match on them
/// regardless of which operation failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Fault {
    /// The service returned no response at all.
    #[error("Null response from mail service.")]
    NullResponse,

    /// The service answered with a non-success status code.
    #[error("Service response contained an error.")]
    ErrorResponse(String),
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TLS error: {0}")]
    Tls(String),

    #[error("{0}")]
    ServiceFault(#[from] Fault),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Message parsing error: {0}")]
    Parse(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Item has no '{0}' header to key on")]
    MissingKey(String),
}

impl Error {
    /// Whether the error came from reaching the service rather than
    /// from the service's answer.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Io(_) | Self::Tls(_))
    }

    /// The fault carried by a `ServiceFault`, if any.
    #[must_use]
    pub const fn fault(&self) -> Option<&Fault> {
        match self {
            Self::ServiceFault(fault) => Some(fault),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
