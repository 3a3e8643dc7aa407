use alms_auth::StorageError;
use alms_config::ConfigError;
use alms_http::TransportError;
use thiserror::Error;

/// Failure to assemble the stores from configuration.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("http client: {0}")]
    Transport(#[from] TransportError),
}
