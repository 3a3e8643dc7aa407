//! The persisted session object (`session.json`): token, user and the
//! authenticated flag as last committed, used to rehydrate on restart.

use std::fs;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

use alms_core::entities::User;
use serde::{Deserialize, Serialize};

use crate::error::StorageError;

const SESSION_FILE_NAME: &str = "session.json";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PersistedSession {
    pub token: Option<String>,
    pub user: Option<User>,
    pub is_authenticated: bool,
}

enum Location {
    File(PathBuf),
    Memory(Mutex<Option<PersistedSession>>),
}

pub struct SessionFile {
    location: Location,
}

impl SessionFile {
    /// `session.json` inside `state_dir`.
    #[must_use]
    pub fn in_dir(state_dir: &std::path::Path) -> Self {
        Self {
            location: Location::File(state_dir.join(SESSION_FILE_NAME)),
        }
    }

    /// A session object that lives only as long as this value.
    #[must_use]
    pub const fn in_memory() -> Self {
        Self {
            location: Location::Memory(Mutex::new(None)),
        }
    }

    /// # Errors
    ///
    /// Returns [`StorageError`] if the file exists but cannot be read or
    /// parsed.
    pub fn load(&self) -> Result<Option<PersistedSession>, StorageError> {
        match &self.location {
            Location::Memory(slot) => Ok(slot.lock().unwrap_or_else(PoisonError::into_inner).clone()),
            Location::File(path) => {
                let text = match fs::read_to_string(path) {
                    Ok(text) => text,
                    Err(error) if error.kind() == std::io::ErrorKind::NotFound => return Ok(None),
                    Err(error) => {
                        return Err(StorageError::Corrupt(format!("read {}: {error}", path.display())));
                    }
                };
                serde_json::from_str(&text)
                    .map(Some)
                    .map_err(|e| StorageError::Corrupt(format!("{}: {e}", path.display())))
            }
        }
    }

    /// # Errors
    ///
    /// Returns [`StorageError`] if the file cannot be written.
    pub fn save(&self, session: &PersistedSession) -> Result<(), StorageError> {
        match &self.location {
            Location::Memory(slot) => {
                *slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(session.clone());
                Ok(())
            }
            Location::File(path) => {
                let text = serde_json::to_string_pretty(session)
                    .map_err(|e| StorageError::Corrupt(e.to_string()))?;
                if let Some(parent) = path.parent() {
                    fs::create_dir_all(parent).map_err(|e| {
                        StorageError::backend("session", format!("mkdir {}: {e}", parent.display()))
                    })?;
                }
                fs::write(path, text).map_err(|e| {
                    StorageError::backend("session", format!("write {}: {e}", path.display()))
                })
            }
        }
    }

    /// # Errors
    ///
    /// Returns [`StorageError`] if an existing file cannot be removed.
    pub fn remove(&self) -> Result<(), StorageError> {
        match &self.location {
            Location::Memory(slot) => {
                *slot.lock().unwrap_or_else(PoisonError::into_inner) = None;
                Ok(())
            }
            Location::File(path) => match fs::remove_file(path) {
                Ok(()) => Ok(()),
                Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(()),
                Err(error) => Err(StorageError::backend(
                    "session",
                    format!("delete {}: {error}", path.display()),
                )),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_round_trip() {
        let tmp = tempfile::TempDir::new().expect("tmp dir");
        let file = SessionFile::in_dir(tmp.path());
        assert_eq!(file.load().unwrap(), None);

        let session = PersistedSession {
            token: Some("t".into()),
            user: Some(User {
                id: "u1".into(),
                ..Default::default()
            }),
            is_authenticated: true,
        };
        file.save(&session).unwrap();
        assert_eq!(file.load().unwrap(), Some(session));

        file.remove().unwrap();
        assert_eq!(file.load().unwrap(), None);
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let tmp = tempfile::TempDir::new().expect("tmp dir");
        fs::write(tmp.path().join(SESSION_FILE_NAME), "{not json").unwrap();
        let err = SessionFile::in_dir(tmp.path()).load().unwrap_err();
        assert!(matches!(err, StorageError::Corrupt(_)));
    }
}
