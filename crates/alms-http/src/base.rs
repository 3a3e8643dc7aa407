//! Backend base address resolution.

use std::sync::OnceLock;

use alms_config::{ApiConfig, LOCAL_BASE_URL};

static PROCESS_BASE: OnceLock<BaseAddress> = OnceLock::new();

/// The resolved backend base address (e.g. `https://api.example.org/api`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseAddress {
    url: String,
    local: bool,
}

impl BaseAddress {
    #[must_use]
    pub fn new(url: &str) -> Self {
        let url = url.trim_end_matches('/').to_string();
        let local = is_loopback(&url);
        Self { url, local }
    }

    /// Resolve from configuration: the explicit override if set, otherwise
    /// the local backend in development and the public origin elsewhere.
    #[must_use]
    pub fn resolve(api: &ApiConfig) -> Self {
        if !api.base_url.trim().is_empty() {
            return Self::new(&api.base_url);
        }
        if api.is_development() || api.public_origin.trim().is_empty() {
            return Self::new(LOCAL_BASE_URL);
        }
        Self::new(&format!("{}/api", api.public_origin.trim_end_matches('/')))
    }

    /// Resolve once per process. Later calls return the first resolution
    /// regardless of `api`.
    pub fn process_wide(api: &ApiConfig) -> &'static Self {
        PROCESS_BASE.get_or_init(|| {
            let base = Self::resolve(api);
            tracing::debug!(url = %base.url, local = base.local, "resolved backend base address");
            base
        })
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Whether the backend runs on this machine.
    #[must_use]
    pub const fn is_local(&self) -> bool {
        self.local
    }

    /// Absolute URL for an API path (`/campaigns` → `<base>/campaigns`).
    #[must_use]
    pub fn join(&self, path: &str) -> String {
        format!("{}/{}", self.url, path.trim_start_matches('/'))
    }
}

fn is_loopback(url: &str) -> bool {
    reqwest::Url::parse(url)
        .ok()
        .and_then(|parsed| parsed.host_str().map(str::to_ascii_lowercase))
        .is_some_and(|host| matches!(host.as_str(), "localhost" | "127.0.0.1" | "[::1]"))
}
