//! The session manager: who is logged in, and keeping that consistent with
//! the token vault and the persisted session object.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use alms_core::entities::{Credentials, Registration, User};
use alms_http::normalize::{self, lookup};
use alms_http::{CacheMode, RequestOptions, RequestPipeline, classify};
use chrono::Utc;
use serde::Serialize;
use serde_json::Value;

use crate::confirm::{ConfirmPolicy, confirm};
use crate::error::SessionError;
use crate::expiry;
use crate::persisted::{PersistedSession, SessionFile};
use crate::vault::TokenVault;

pub const INVALID_LOGIN_RESPONSE: &str = "Invalid login response: missing token or user";
pub const PENDING_APPROVAL_MESSAGE: &str =
    "Registration successful. Your account is pending admin approval.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Anonymous,
    /// A stored token was found; the user record is being re-validated.
    Verifying,
    Authenticated,
}

/// In-memory session. Authenticated iff both token and user are present.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    token: Option<String>,
    user: Option<User>,
}

impl Session {
    #[must_use]
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    #[must_use]
    pub const fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.token.is_some() && self.user.is_some()
    }

    #[must_use]
    pub const fn status(&self) -> SessionStatus {
        match (&self.token, &self.user) {
            (Some(_), Some(_)) => SessionStatus::Authenticated,
            (Some(_), None) => SessionStatus::Verifying,
            (None, _) => SessionStatus::Anonymous,
        }
    }

    fn persisted(&self) -> PersistedSession {
        PersistedSession {
            token: self.token.clone(),
            user: self.user.clone(),
            is_authenticated: self.is_authenticated(),
        }
    }
}

/// Result of a registration that the backend accepted.
#[derive(Debug, Clone, PartialEq)]
pub enum RegisterOutcome {
    SignedIn(User),
    /// No token was granted; an admin must approve the account first.
    PendingApproval { message: String },
}

impl RegisterOutcome {
    #[must_use]
    pub const fn requires_approval(&self) -> bool {
        matches!(self, Self::PendingApproval { .. })
    }
}

pub struct SessionManager {
    pipeline: Arc<RequestPipeline>,
    vault: Arc<TokenVault>,
    persisted: SessionFile,
    confirm: ConfirmPolicy,
    state: Mutex<Session>,
}

impl SessionManager {
    /// `vault` must be the credential store `pipeline` was built with.
    #[must_use]
    pub fn new(pipeline: Arc<RequestPipeline>, vault: Arc<TokenVault>, persisted: SessionFile) -> Self {
        Self {
            pipeline,
            vault,
            persisted,
            confirm: ConfirmPolicy::default(),
            state: Mutex::new(Session::default()),
        }
    }

    #[must_use]
    pub fn with_confirm_policy(mut self, policy: ConfirmPolicy) -> Self {
        self.confirm = policy;
        self
    }

    #[must_use]
    pub const fn vault(&self) -> &Arc<TokenVault> {
        &self.vault
    }

    #[must_use]
    pub const fn pipeline(&self) -> &Arc<RequestPipeline> {
        &self.pipeline
    }

    #[must_use]
    pub const fn persisted(&self) -> &SessionFile {
        &self.persisted
    }

    /// Snapshot of the current session.
    ///
    /// A token cleared from the vault behind the manager's back (the
    /// pipeline does this on 401/403) ends the session here too.
    #[must_use]
    pub fn session(&self) -> Session {
        self.sync_with_vault();
        self.lock().clone()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.session().is_authenticated()
    }

    #[must_use]
    pub fn current_user(&self) -> Option<User> {
        self.session().user
    }

    /// Log in and persist the granted token to every backend.
    ///
    /// # Errors
    ///
    /// - [`SessionError::Request`] if the call fails, or with
    ///   [`INVALID_LOGIN_RESPONSE`] if the response lacks a token or user
    /// - [`SessionError::Storage`] / [`SessionError::PersistenceUnconfirmed`]
    ///   if the token cannot be committed; the session is left logged out
    pub async fn login(&self, credentials: &Credentials) -> Result<User, SessionError> {
        let payload = self.pipeline.post("/auth/login", credentials).await?;
        let (Some(token), Some(user)) = (token_of(&payload), user_of(&payload)) else {
            tracing::warn!("login response missing token or user");
            return Err(classify::invalid_payload(INVALID_LOGIN_RESPONSE).into());
        };
        self.establish(token, user.clone()).await?;
        tracing::info!(user_id = %user.id, role = ?user.role, "logged in");
        Ok(user)
    }

    /// Register an account. Accounts created without a token (pending
    /// approval) are a successful outcome, not an error.
    ///
    /// # Errors
    ///
    /// Same as [`Self::login`] for responses that do grant a token.
    pub async fn register(&self, registration: &Registration) -> Result<RegisterOutcome, SessionError> {
        let payload = self.pipeline.post("/auth/register", registration).await?;
        match (token_of(&payload), user_of(&payload)) {
            (Some(token), Some(user)) => {
                self.establish(token, user.clone()).await?;
                tracing::info!(user_id = %user.id, "registered and logged in");
                Ok(RegisterOutcome::SignedIn(user))
            }
            (Some(_), None) => Err(classify::invalid_payload(
                "Invalid registration response: missing user",
            )
            .into()),
            (None, _) => {
                let message = classify::body_message(&payload)
                    .or_else(|| lookup(&payload, "message").and_then(Value::as_str).map(ToString::to_string))
                    .unwrap_or_else(|| PENDING_APPROVAL_MESSAGE.to_string());
                tracing::info!(email = %registration.email, "registration pending approval");
                Ok(RegisterOutcome::PendingApproval { message })
            }
        }
    }

    /// Tell the backend (best effort), then clear every local copy of the
    /// session and the response cache.
    pub async fn logout(&self) {
        if let Err(error) = self.pipeline.post("/auth/logout", &serde_json::json!({})).await {
            tracing::warn!(%error, "logout call failed; clearing local session anyway");
        }
        self.teardown();
        tracing::info!("logged out");
    }

    /// Restore a persisted session and re-validate it against the backend.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Storage`] if a missing token copy cannot be
    /// restored. A rejected verification is not an error: the session is
    /// cleared and `Anonymous` returned.
    pub async fn initialize(&self) -> Result<SessionStatus, SessionError> {
        match self.restore()? {
            SessionStatus::Anonymous => Ok(SessionStatus::Anonymous),
            SessionStatus::Verifying | SessionStatus::Authenticated => self.verify().await,
        }
    }

    /// Optimistically restore the session from storage without touching the
    /// network, reconciling the backends with the persisted session object.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Storage`] if a missing copy cannot be written.
    pub fn restore(&self) -> Result<SessionStatus, SessionError> {
        let persisted = self.persisted.load().unwrap_or_else(|error| {
            tracing::warn!(%error, "discarding unreadable persisted session");
            None
        });
        let persisted = persisted.unwrap_or_default();
        let persisted_token = persisted.token.clone().filter(|t| !t.trim().is_empty());

        let token = match (self.vault.reconcile()?, persisted_token.clone()) {
            (Some(token), _) => Some(token),
            (None, Some(token)) => {
                tracing::debug!("token only in persisted session; restoring backends");
                self.vault.store(&token)?;
                Some(token)
            }
            (None, None) => None,
        };

        let Some(token) = token else {
            self.teardown();
            return Ok(SessionStatus::Anonymous);
        };

        if expiry::is_expired(&token, Utc::now()) {
            tracing::info!("stored token has expired; clearing session");
            self.teardown();
            return Ok(SessionStatus::Anonymous);
        }

        let user = persisted
            .user
            .filter(|_| persisted_token.as_deref() == Some(token.as_str()));
        let session = Session {
            token: Some(token),
            user,
        };
        let status = session.status();
        *self.lock() = session;
        self.persist()?;
        Ok(status)
    }

    /// Re-validate the current token by fetching the user record.
    ///
    /// Connectivity loss keeps the optimistic state; any other failure ends
    /// the session.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Storage`] if the refreshed session cannot be
    /// persisted.
    pub async fn verify(&self) -> Result<SessionStatus, SessionError> {
        match self.refresh().await {
            Ok(_) => Ok(SessionStatus::Authenticated),
            Err(SessionError::Request(record)) if record.is_network() => {
                tracing::warn!("backend unreachable; session left unverified");
                Ok(self.session().status())
            }
            Err(SessionError::Request(record)) => {
                tracing::warn!(error = %record, "session verification rejected; clearing session");
                self.teardown();
                Ok(SessionStatus::Anonymous)
            }
            Err(error) => Err(error),
        }
    }

    /// Fetch `/auth/me` and replace the stored user record.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Request`] if the call fails or the response
    /// carries no user.
    pub async fn refresh(&self) -> Result<User, SessionError> {
        let payload = self
            .pipeline
            .get_with("/auth/me", RequestOptions::new().cache(CacheMode::Bypass))
            .await?;
        let user = user_of(&payload)
            .or_else(|| normalize::one::<User>(payload, "user").ok().filter(|u| !u.id.is_empty()))
            .ok_or_else(|| classify::invalid_payload("Invalid session response: missing user"))?;
        self.replace_user(user.clone())?;
        Ok(user)
    }

    /// Store an updated user record for the current session.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Storage`] if the session cannot be persisted.
    pub fn replace_user(&self, user: User) -> Result<(), SessionError> {
        {
            let mut state = self.lock();
            if state.token.is_none() {
                state.token = self.vault.load();
            }
            if state.token.is_none() {
                return Ok(());
            }
            state.user = Some(user);
        }
        self.persist()
    }

    async fn establish(&self, token: String, user: User) -> Result<(), SessionError> {
        self.vault.store(&token)?;
        *self.lock() = Session {
            token: Some(token.clone()),
            user: Some(user),
        };
        if let Err(error) = self.persist() {
            self.teardown();
            return Err(error);
        }
        match confirm(&self.vault, &token, &self.confirm).await {
            Ok(attempt) => {
                tracing::debug!(attempt, "session token confirmed in storage");
                Ok(())
            }
            Err(error) => {
                self.teardown();
                Err(error)
            }
        }
    }

    fn persist(&self) -> Result<(), SessionError> {
        let snapshot = self.lock().persisted();
        self.persisted.save(&snapshot)?;
        Ok(())
    }

    fn teardown(&self) {
        if let Err(error) = self.vault.clear_all() {
            tracing::warn!(%error, "could not clear every token copy");
        }
        if let Err(error) = self.persisted.remove() {
            tracing::warn!(%error, "could not remove persisted session");
        }
        *self.lock() = Session::default();
        self.pipeline.cache().clear();
    }

    fn sync_with_vault(&self) {
        let revoked = self.lock().token.is_some() && self.vault.load().is_none();
        if revoked {
            tracing::debug!("token cleared from storage; ending session");
            if let Err(error) = self.persisted.remove() {
                tracing::warn!(%error, "could not remove persisted session");
            }
            *self.lock() = Session::default();
        }
    }

    fn lock(&self) -> MutexGuard<'_, Session> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn token_of(payload: &Value) -> Option<String> {
    lookup(payload, "token")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(ToString::to_string)
}

fn user_of(payload: &Value) -> Option<User> {
    lookup(payload, "user")
        .and_then(|user| serde_json::from_value::<User>(user.clone()).ok())
        .filter(|user| !user.id.is_empty())
}
