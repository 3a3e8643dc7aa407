//! Session persistence configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

const fn default_cookie_max_age_days() -> u32 {
    7
}

fn default_keyring_service() -> String {
    "almoner".to_string()
}

const fn default_use_keyring() -> bool {
    true
}

const fn default_confirm_attempts() -> u32 {
    3
}

const fn default_confirm_base_delay_ms() -> u64 {
    100
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SessionConfig {
    /// Directory holding the cookie jar, the credentials fallback file and
    /// the persisted session. Empty means `~/.almoner`.
    #[serde(default)]
    pub state_dir: String,

    /// Lifetime of the short-lived cookie copy of the token.
    #[serde(default = "default_cookie_max_age_days")]
    pub cookie_max_age_days: u32,

    /// Keyring service name for the durable copy.
    #[serde(default = "default_keyring_service")]
    pub keyring_service: String,

    /// Disable to keep the durable copy in a plain file (headless CI).
    #[serde(default = "default_use_keyring")]
    pub use_keyring: bool,

    /// Read-back attempts after writing the token.
    #[serde(default = "default_confirm_attempts")]
    pub confirm_attempts: u32,

    /// Delay before the first re-check; doubled on each retry.
    #[serde(default = "default_confirm_base_delay_ms")]
    pub confirm_base_delay_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            state_dir: String::new(),
            cookie_max_age_days: default_cookie_max_age_days(),
            keyring_service: default_keyring_service(),
            use_keyring: default_use_keyring(),
            confirm_attempts: default_confirm_attempts(),
            confirm_base_delay_ms: default_confirm_base_delay_ms(),
        }
    }
}

impl SessionConfig {
    /// Resolved state directory.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] when `state_dir` is empty and
    /// no home directory can be found.
    pub fn state_path(&self) -> Result<PathBuf, ConfigError> {
        if !self.state_dir.is_empty() {
            return Ok(PathBuf::from(&self.state_dir));
        }
        dirs::home_dir()
            .map(|home| home.join(".almoner"))
            .ok_or_else(|| ConfigError::InvalidValue {
                field: "session.state_dir".into(),
                reason: "home directory not found; set it explicitly".into(),
            })
    }

    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for zero confirmation attempts
    /// or a zero cookie lifetime.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.confirm_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                field: "session.confirm_attempts".into(),
                reason: "must be at least 1".into(),
            });
        }
        if self.cookie_max_age_days == 0 {
            return Err(ConfigError::InvalidValue {
                field: "session.cookie_max_age_days".into(),
                reason: "must be at least 1".into(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_state_dir_wins() {
        let config = SessionConfig {
            state_dir: "/tmp/almoner-test".into(),
            ..Default::default()
        };
        assert_eq!(
            config.state_path().unwrap(),
            PathBuf::from("/tmp/almoner-test")
        );
    }

    #[test]
    fn zero_attempts_rejected() {
        let config = SessionConfig {
            confirm_attempts: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
