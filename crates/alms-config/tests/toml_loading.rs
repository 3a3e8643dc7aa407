//! Integration tests for layered configuration loading.
//!
//! Uses `figment::Jail` for sandboxed file and env var manipulation.

use alms_config::{AlmsConfig, ConfigError};
use figment::{
    Figment, Jail,
    providers::{Env, Format, Serialized, Toml},
};
use pretty_assertions::assert_eq;

fn layered(file: &str) -> Figment {
    Figment::from(Serialized::defaults(AlmsConfig::default()))
        .merge(Toml::file(file))
        .merge(Env::prefixed("ALMS_").split("__"))
}

#[test]
fn loads_sections_from_toml() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "config.toml",
            r#"
[api]
environment = "production"
public_origin = "https://api.example.org"
timeout_secs = 15

[cache]
ttl_secs = 10
capacity = 5

[session]
state_dir = "./state"
use_keyring = false
"#,
        )?;

        let config: AlmsConfig = layered("config.toml").extract()?;

        assert_eq!(config.api.environment, "production");
        assert_eq!(config.api.public_origin, "https://api.example.org");
        assert_eq!(config.api.timeout_secs, 15);
        assert_eq!(config.cache.ttl_secs, 10);
        assert_eq!(config.cache.capacity, 5);
        assert_eq!(config.session.state_dir, "./state");
        assert!(!config.session.use_keyring);
        assert_eq!(config.session.confirm_attempts, 3);
        assert!(config.validate().is_ok());
        Ok(())
    });
}

#[test]
fn env_overrides_toml() {
    Jail::expect_with(|jail| {
        jail.create_file("config.toml", "[api]\nbase_url = \"http://from-toml/api\"\n")?;
        jail.set_env("ALMS_API__BASE_URL", "https://from-env.example.org/api");
        jail.set_env("ALMS_CACHE__TTL_SECS", "5");

        let config: AlmsConfig = layered("config.toml").extract()?;

        assert_eq!(config.api.base_url, "https://from-env.example.org/api");
        assert_eq!(config.cache.ttl_secs, 5);
        Ok(())
    });
}

#[test]
fn invalid_section_fails_validation() {
    Jail::expect_with(|jail| {
        jail.create_file("config.toml", "[cache]\ncapacity = 0\n")?;

        let result = AlmsConfig::from_figment(&layered("config.toml"));

        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue { ref field, .. }) if field == "cache.capacity"
        ));
        Ok(())
    });
}
