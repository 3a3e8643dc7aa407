//! # alms-auth
//!
//! Session management for the Almoner client.
//!
//! The session token is kept in two places at once, a short-lived cookie
//! jar and a durable store (OS keychain with a file fallback), through a
//! [`TokenVault`] that writes both or neither. [`SessionManager`] owns
//! login, registration, logout and startup re-validation, and keeps the
//! in-memory [`Session`] consistent with the vault and with the persisted
//! session object.

pub mod backend;
pub mod confirm;
pub mod error;
pub mod expiry;
pub mod persisted;
pub mod session;
pub mod vault;

pub use backend::{CookieJarBackend, DurableBackend, MemoryBackend, TokenBackend};
pub use confirm::ConfirmPolicy;
pub use error::{SessionError, StorageError};
pub use persisted::{PersistedSession, SessionFile};
pub use session::{RegisterOutcome, Session, SessionManager, SessionStatus};
pub use vault::TokenVault;
