//! Transactional token storage across several backends.

use std::sync::Arc;

use alms_config::SessionConfig;
use alms_http::CredentialStore;

use crate::backend::{CookieJarBackend, DurableBackend, TokenBackend};
use crate::error::StorageError;

const COOKIE_FILE_NAME: &str = "cookies.json";
const CREDENTIALS_FILE_NAME: &str = "credentials";

/// Every backend holds the same token, or none does.
pub struct TokenVault {
    backends: Vec<Arc<dyn TokenBackend>>,
}

impl TokenVault {
    #[must_use]
    pub fn new(backends: Vec<Arc<dyn TokenBackend>>) -> Self {
        Self { backends }
    }

    /// Cookie jar plus durable store under the configured state directory.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the state directory cannot be resolved.
    pub fn from_config(config: &SessionConfig) -> Result<Self, StorageError> {
        let dir = config
            .state_path()
            .map_err(|e| StorageError::backend("vault", e.to_string()))?;
        let keyring = config
            .use_keyring
            .then(|| config.keyring_service.clone());
        Ok(Self::new(vec![
            Arc::new(CookieJarBackend::new(
                dir.join(COOKIE_FILE_NAME),
                config.cookie_max_age_days,
            )),
            Arc::new(DurableBackend::new(keyring, dir.join(CREDENTIALS_FILE_NAME))),
        ]))
    }

    /// The token from the first backend that has one. Unreadable backends
    /// are skipped.
    #[must_use]
    pub fn load(&self) -> Option<String> {
        self.backends.iter().find_map(|backend| match backend.read() {
            Ok(token) => token,
            Err(error) => {
                tracing::warn!(backend = backend.name(), %error, "token read failed");
                None
            }
        })
    }

    /// Whether every backend currently reads back `token`.
    #[must_use]
    pub fn holds(&self, token: &str) -> bool {
        self.backends
            .iter()
            .all(|backend| matches!(backend.read(), Ok(Some(stored)) if stored == token))
    }

    /// Write `token` to every backend. If any write fails, backends already
    /// written are restored to their previous contents.
    ///
    /// # Errors
    ///
    /// Returns the [`StorageError`] of the failing backend.
    pub fn store(&self, token: &str) -> Result<(), StorageError> {
        let mut written: Vec<(&Arc<dyn TokenBackend>, Option<String>)> = Vec::new();
        for backend in &self.backends {
            let previous = backend.read().unwrap_or_default();
            if let Err(error) = backend.write(token) {
                tracing::warn!(backend = backend.name(), %error, "token write failed; rolling back");
                Self::roll_back(&written);
                return Err(error);
            }
            written.push((backend, previous));
        }
        Ok(())
    }

    /// Remove the token from every backend, attempting all of them.
    ///
    /// # Errors
    ///
    /// Returns the first [`StorageError`] encountered.
    pub fn clear_all(&self) -> Result<(), StorageError> {
        let mut first_error = None;
        for backend in &self.backends {
            if let Err(error) = backend.clear() {
                tracing::warn!(backend = backend.name(), %error, "token clear failed");
                first_error.get_or_insert(error);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Copy the token into backends that lack it (or disagree), taking the
    /// first backend's copy as authoritative. Returns the reconciled token.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if a missing copy cannot be written.
    pub fn reconcile(&self) -> Result<Option<String>, StorageError> {
        let Some(token) = self.load() else {
            return Ok(None);
        };
        for backend in &self.backends {
            let stored = backend.read().unwrap_or_default();
            if stored.as_deref() != Some(token.as_str()) {
                tracing::debug!(backend = backend.name(), "restoring missing token copy");
                backend.write(&token)?;
            }
        }
        Ok(Some(token))
    }

    fn roll_back(written: &[(&Arc<dyn TokenBackend>, Option<String>)]) {
        for (backend, previous) in written {
            let result = match previous {
                Some(token) => backend.write(token),
                None => backend.clear(),
            };
            if let Err(error) = result {
                tracing::warn!(backend = backend.name(), %error, "rollback failed");
            }
        }
    }
}

impl CredentialStore for TokenVault {
    fn token(&self) -> Option<String> {
        self.load()
    }

    fn clear(&self) {
        if let Err(error) = self.clear_all() {
            tracing::warn!(%error, "could not clear every token copy");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;

    fn vault(backends: &[&MemoryBackend]) -> TokenVault {
        TokenVault::new(
            backends
                .iter()
                .map(|b| Arc::new((*b).clone()) as Arc<dyn TokenBackend>)
                .collect(),
        )
    }

    #[test]
    fn store_writes_every_backend() {
        let (cookie, durable) = (MemoryBackend::new(), MemoryBackend::new());
        let vault = vault(&[&cookie, &durable]);

        vault.store("tok").unwrap();

        assert_eq!(cookie.get().as_deref(), Some("tok"));
        assert_eq!(durable.get().as_deref(), Some("tok"));
        assert!(vault.holds("tok"));
    }

    #[test]
    fn failed_write_rolls_back_earlier_backends() {
        let cookie = MemoryBackend::with_token("previous");
        let durable = MemoryBackend::failing();
        let vault = vault(&[&cookie, &durable]);

        assert!(vault.store("next").is_err());

        assert_eq!(cookie.get().as_deref(), Some("previous"));
        assert_eq!(durable.get(), None);
    }

    #[test]
    fn rollback_clears_when_nothing_was_there() {
        let cookie = MemoryBackend::new();
        let durable = MemoryBackend::failing();
        let vault = vault(&[&cookie, &durable]);

        assert!(vault.store("next").is_err());
        assert_eq!(cookie.get(), None);
    }

    #[test]
    fn reconcile_restores_missing_copy() {
        let cookie = MemoryBackend::new();
        let durable = MemoryBackend::with_token("durable-only");
        let vault = vault(&[&cookie, &durable]);

        assert_eq!(vault.reconcile().unwrap().as_deref(), Some("durable-only"));
        assert_eq!(cookie.get().as_deref(), Some("durable-only"));
    }

    #[test]
    fn clear_all_empties_everything() {
        let cookie = MemoryBackend::with_token("a");
        let durable = MemoryBackend::with_token("a");
        let vault = vault(&[&cookie, &durable]);

        CredentialStore::clear(&vault);

        assert_eq!(vault.token(), None);
        assert_eq!(cookie.get(), None);
        assert_eq!(durable.get(), None);
    }

    #[test]
    fn from_config_uses_state_dir_files() {
        let tmp = tempfile::TempDir::new().expect("tmp dir");
        let config = SessionConfig {
            state_dir: tmp.path().display().to_string(),
            use_keyring: false,
            ..Default::default()
        };
        let vault = TokenVault::from_config(&config).unwrap();

        vault.store("file-token").unwrap();

        assert!(tmp.path().join(COOKIE_FILE_NAME).exists());
        assert_eq!(
            std::fs::read_to_string(tmp.path().join(CREDENTIALS_FILE_NAME)).unwrap(),
            "file-token"
        );
        assert!(vault.holds("file-token"));
    }
}
