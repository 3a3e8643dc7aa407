//! # alms-config
//!
//! Layered configuration loading for Almoner using figment.
//!
//! Configuration sources (in priority order, highest wins):
//! 1. Environment variables (`ALMS_*` prefix, `__` as separator)
//! 2. Project-level `.almoner/config.toml`
//! 3. User-level `~/.config/almoner/config.toml`
//! 4. Built-in defaults
//!
//! # Environment Variable Mapping
//!
//! Figment maps `ALMS_API__BASE_URL` -> `api.base_url`,
//! `ALMS_CACHE__TTL_SECS` -> `cache.ttl_secs`, etc.
//!
//! # Usage
//!
//! ```no_run
//! use alms_config::AlmsConfig;
//!
//! let config = AlmsConfig::load_with_dotenv().expect("config");
//! println!("cache ttl: {}s", config.cache.ttl_secs);
//! ```

mod api;
mod cache;
mod error;
mod session;

pub use api::{ApiConfig, LOCAL_BASE_URL};
pub use cache::CacheConfig;
pub use error::ConfigError;
pub use session::SessionConfig;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AlmsConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

impl AlmsConfig {
    /// Load and validate configuration from TOML files and environment
    /// variables.
    ///
    /// Does NOT call `dotenvy`; use [`Self::load_with_dotenv`] for `.env`
    /// support.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if extraction fails or a section is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_figment(&Self::figment())
    }

    /// Load configuration after reading `.env` from the current directory.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if extraction fails or a section is invalid.
    pub fn load_with_dotenv() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::load()
    }

    /// Extract and validate from an arbitrary figment (tests layer their own
    /// providers on top of [`Self::figment`]).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if extraction fails or a section is invalid.
    pub fn from_figment(figment: &Figment) -> Result<Self, ConfigError> {
        let config: Self = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Build the figment provider chain.
    #[must_use]
    pub fn figment() -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Layer 1: User-global config
        if let Some(global_path) = Self::global_config_path()
            && global_path.exists()
        {
            figment = figment.merge(Toml::file(global_path));
        }

        // Layer 2: Project-local config
        let local_path = PathBuf::from(".almoner/config.toml");
        if local_path.exists() {
            figment = figment.merge(Toml::file(local_path));
        }

        // Layer 3: Environment variables (highest priority)
        figment.merge(Env::prefixed("ALMS_").split("__"))
    }

    /// Validate every section.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError::InvalidValue`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.api.validate()?;
        self.cache.validate()?;
        self.session.validate()
    }

    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("almoner").join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = AlmsConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.cache.ttl_secs, 30);
        assert_eq!(config.cache.capacity, 50);
        assert_eq!(config.session.cookie_max_age_days, 7);
    }

    #[test]
    fn figment_builds_without_files() {
        let figment = AlmsConfig::figment();
        let config: AlmsConfig = figment.extract().expect("should extract defaults");
        assert_eq!(config.api.timeout_secs, 30);
    }
}
