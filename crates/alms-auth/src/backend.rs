//! Token storage backends.
//!
//! - [`CookieJarBackend`]: short-lived copy with an expiry (default 7 days)
//! - [`DurableBackend`]: OS keychain, falling back to a `0600` file
//! - [`MemoryBackend`]: in-process, for tests and ephemeral sessions

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StorageError;

const KEYRING_USER: &str = "session-token";

/// One place a session token can live.
pub trait TokenBackend: Send + Sync {
    fn name(&self) -> &'static str;

    /// # Errors
    ///
    /// Returns [`StorageError`] if the backend cannot be read.
    fn read(&self) -> Result<Option<String>, StorageError>;

    /// # Errors
    ///
    /// Returns [`StorageError`] if the token cannot be written.
    fn write(&self, token: &str) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns [`StorageError`] if an existing token cannot be removed.
    fn clear(&self) -> Result<(), StorageError>;
}

// ── Cookie jar ─────────────────────────────────────────────────────

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Cookie {
    token: String,
    expires_at: DateTime<Utc>,
}

/// Expiring token copy, stored as `{token, expiresAt}` JSON.
pub struct CookieJarBackend {
    path: PathBuf,
    max_age: Duration,
}

impl CookieJarBackend {
    #[must_use]
    pub fn new(path: PathBuf, max_age_days: u32) -> Self {
        Self {
            path,
            max_age: Duration::days(i64::from(max_age_days)),
        }
    }
}

impl TokenBackend for CookieJarBackend {
    fn name(&self) -> &'static str {
        "cookie"
    }

    fn read(&self) -> Result<Option<String>, StorageError> {
        let Some(text) = read_optional(&self.path, self.name())? else {
            return Ok(None);
        };
        let cookie: Cookie = match serde_json::from_str(&text) {
            Ok(cookie) => cookie,
            Err(error) => {
                tracing::warn!(%error, path = %self.path.display(), "ignoring unreadable cookie jar");
                return Ok(None);
            }
        };
        if cookie.expires_at <= Utc::now() || cookie.token.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(cookie.token))
    }

    fn write(&self, token: &str) -> Result<(), StorageError> {
        let cookie = Cookie {
            token: token.to_string(),
            expires_at: Utc::now() + self.max_age,
        };
        let text = serde_json::to_string(&cookie)
            .map_err(|e| StorageError::backend(self.name(), e.to_string()))?;
        write_private(&self.path, &text, self.name())
    }

    fn clear(&self) -> Result<(), StorageError> {
        remove_if_exists(&self.path, self.name())
    }
}

// ── Durable ────────────────────────────────────────────────────────

/// Long-lived token copy: OS keychain first, `credentials` file otherwise.
pub struct DurableBackend {
    keyring_service: Option<String>,
    file: PathBuf,
}

impl DurableBackend {
    /// `keyring_service = None` keeps the token in `file` only.
    #[must_use]
    pub const fn new(keyring_service: Option<String>, file: PathBuf) -> Self {
        Self {
            keyring_service,
            file,
        }
    }

    fn entry(&self) -> Option<keyring::Entry> {
        let service = self.keyring_service.as_deref()?;
        match keyring::Entry::new(service, KEYRING_USER) {
            Ok(entry) => Some(entry),
            Err(error) => {
                tracing::warn!(%error, "keyring unavailable; using credentials file");
                None
            }
        }
    }
}

impl TokenBackend for DurableBackend {
    fn name(&self) -> &'static str {
        "durable"
    }

    fn read(&self) -> Result<Option<String>, StorageError> {
        if let Some(entry) = self.entry()
            && let Ok(token) = entry.get_password()
            && !token.trim().is_empty()
        {
            return Ok(Some(token));
        }
        Ok(read_optional(&self.file, self.name())?
            .map(|text| text.trim().to_string())
            .filter(|token| !token.is_empty()))
    }

    fn write(&self, token: &str) -> Result<(), StorageError> {
        if let Some(entry) = self.entry() {
            match entry.set_password(token) {
                Ok(()) => {
                    // Drop any file copy left by an earlier fallback.
                    return remove_if_exists(&self.file, self.name());
                }
                Err(error) => {
                    tracing::warn!(%error, "keyring store failed; falling back to file");
                }
            }
        }
        write_private(&self.file, token, self.name())
    }

    fn clear(&self) -> Result<(), StorageError> {
        if let Some(entry) = self.entry() {
            // May not exist.
            let _ = entry.delete_credential();
        }
        remove_if_exists(&self.file, self.name())
    }
}

// ── Memory ─────────────────────────────────────────────────────────

/// In-process backend. Clones share the same slot.
///
/// `dropping_writes(n)` acknowledges the first `n` writes without storing
/// them, modelling storage that commits asynchronously; `failing()` rejects
/// every write.
#[derive(Clone, Default)]
pub struct MemoryBackend {
    slot: Arc<Mutex<Option<String>>>,
    dropped_writes: Arc<AtomicU32>,
    fail_writes: Arc<AtomicBool>,
}

impl MemoryBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_token(token: &str) -> Self {
        let backend = Self::default();
        backend.set(Some(token));
        backend
    }

    #[must_use]
    pub fn dropping_writes(count: u32) -> Self {
        let backend = Self::default();
        backend.dropped_writes.store(count, Ordering::SeqCst);
        backend
    }

    #[must_use]
    pub fn failing() -> Self {
        let backend = Self::default();
        backend.fail_writes.store(true, Ordering::SeqCst);
        backend
    }

    /// Current slot content, bypassing failure injection.
    #[must_use]
    pub fn get(&self) -> Option<String> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Overwrite the slot, bypassing failure injection.
    pub fn set(&self, token: Option<&str>) {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = token.map(ToString::to_string);
    }
}

impl TokenBackend for MemoryBackend {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn read(&self) -> Result<Option<String>, StorageError> {
        Ok(self.get())
    }

    fn write(&self, token: &str) -> Result<(), StorageError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::backend(self.name(), "write rejected"));
        }
        let pending = self.dropped_writes.load(Ordering::SeqCst);
        if pending > 0 {
            self.dropped_writes.store(pending - 1, Ordering::SeqCst);
            return Ok(());
        }
        self.set(Some(token));
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        self.set(None);
        Ok(())
    }
}

// --- Private file helpers ---

fn read_optional(path: &Path, backend: &str) -> Result<Option<String>, StorageError> {
    match fs::read_to_string(path) {
        Ok(text) => Ok(Some(text)),
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(error) => Err(StorageError::backend(
            backend,
            format!("read {}: {error}", path.display()),
        )),
    }
}

fn write_private(path: &Path, contents: &str, backend: &str) -> Result<(), StorageError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            StorageError::backend(backend, format!("mkdir {}: {e}", parent.display()))
        })?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Err(e) = fs::set_permissions(parent, fs::Permissions::from_mode(0o700)) {
                tracing::warn!("failed to chmod 0700 {}: {e}", parent.display());
            }
        }
    }
    fs::write(path, contents)
        .map_err(|e| StorageError::backend(backend, format!("write {}: {e}", path.display())))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o600)).map_err(|e| {
            StorageError::backend(backend, format!("chmod {}: {e}", path.display()))
        })?;
    }

    Ok(())
}

fn remove_if_exists(path: &Path, backend: &str) -> Result<(), StorageError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(error) => Err(StorageError::backend(
            backend,
            format!("delete {}: {error}", path.display()),
        )),
    }
}
