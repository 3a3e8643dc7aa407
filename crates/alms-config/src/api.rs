//! Backend API configuration.

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Base address used in development when no override is set.
pub const LOCAL_BASE_URL: &str = "http://localhost:5000/api";

fn default_environment() -> String {
    "development".to_string()
}

fn default_dev_origins() -> Vec<String> {
    vec![
        "http://localhost:5000".to_string(),
        "http://127.0.0.1:5000".to_string(),
    ]
}

const fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
    /// Explicit backend base address (e.g. `https://api.example.org/api`).
    /// Wins over everything else when set.
    #[serde(default)]
    pub base_url: String,

    /// Execution context: `development` talks to the local backend,
    /// anything else to `public_origin`.
    #[serde(default = "default_environment")]
    pub environment: String,

    /// Public origin of the hosted backend (e.g. `https://api.example.org`).
    /// Also the target of media URL rewriting.
    #[serde(default)]
    pub public_origin: String,

    /// Development backend origins whose absolute URLs are rewritten to
    /// `public_origin` in responses.
    #[serde(default = "default_dev_origins")]
    pub dev_origins: Vec<String>,

    /// Per-request timeout ceiling.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            environment: default_environment(),
            public_origin: String::new(),
            dev_origins: default_dev_origins(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ApiConfig {
    #[must_use]
    pub fn is_development(&self) -> bool {
        self.environment.eq_ignore_ascii_case("development")
    }

    /// Check that the configured values can produce a base address.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for a zero timeout, or for a
    /// hosted environment with neither `base_url` nor `public_origin`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "api.timeout_secs".into(),
                reason: "must be greater than zero".into(),
            });
        }
        if self.base_url.is_empty() && !self.is_development() && self.public_origin.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "api.public_origin".into(),
                reason: format!(
                    "required when environment is '{}' and api.base_url is unset",
                    self.environment
                ),
            });
        }
        Ok(())
    }
}
