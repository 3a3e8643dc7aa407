use anyhow::Context;
use alms_config::AlmsConfig;
use alms_store::Stores;

/// Load layered configuration, picking up a `.env` in the working directory.
pub fn load_config() -> anyhow::Result<AlmsConfig> {
    AlmsConfig::load_with_dotenv().context("failed to load almoner configuration")
}

/// Wire the stores over the configured backend and state directory.
pub fn init(config: &AlmsConfig) -> anyhow::Result<Stores> {
    Stores::from_config(config).context("failed to initialize almoner stores")
}
