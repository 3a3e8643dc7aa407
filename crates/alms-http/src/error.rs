//! The normalized failure every rejected request produces.

use serde::Serialize;
use thiserror::Error;

/// The four failure classes. Anything unrecognized is `Server`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    /// No response arrived (connect failure, timeout).
    Network,
    /// 401 or 403.
    Auth,
    /// 4xx carrying a structured message.
    Validation,
    /// Everything else.
    Server,
}

/// A classified request failure.
///
/// Only [`crate::classify`] builds these; `Display` is the user-facing
/// message.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("{message}")]
pub struct ErrorRecord {
    kind: ErrorKind,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<u16>,
}

impl ErrorRecord {
    pub(crate) const fn new(kind: ErrorKind, message: String, status: Option<u16>) -> Self {
        Self {
            kind,
            message,
            status,
        }
    }

    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        self.status
    }

    /// Connectivity failures are recoverable: callers keep rendering with
    /// whatever state they already have.
    #[must_use]
    pub fn is_network(&self) -> bool {
        self.kind == ErrorKind::Network
    }
}
