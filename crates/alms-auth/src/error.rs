use alms_http::ErrorRecord;
use thiserror::Error;

/// Token or session persistence failure.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("{backend} token store: {reason}")]
    Backend { backend: String, reason: String },

    #[error("persisted session is unreadable: {0}")]
    Corrupt(String),
}

impl StorageError {
    pub(crate) fn backend(backend: &str, reason: impl Into<String>) -> Self {
        Self::Backend {
            backend: backend.to_string(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    /// The backend call failed or answered with an unusable payload.
    #[error(transparent)]
    Request(#[from] ErrorRecord),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("session token could not be confirmed in storage after {attempts} attempts")]
    PersistenceUnconfirmed { attempts: u32 },
}

impl SessionError {
    /// The classified request failure, if that is what this is.
    #[must_use]
    pub const fn record(&self) -> Option<&ErrorRecord> {
        match self {
            Self::Request(record) => Some(record),
            Self::Storage(_) | Self::PersistenceUnconfirmed { .. } => None,
        }
    }
}
