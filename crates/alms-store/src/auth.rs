//! Auth store: the session as the UI sees it, plus profile updates.

use std::sync::Arc;

use alms_auth::{RegisterOutcome, SessionError, SessionManager, SessionStatus};
use alms_core::entities::{Credentials, ProfileUpdate, Registration, User};
use alms_http::normalize::{self, lookup};
use alms_http::{ErrorRecord, classify};
use serde::Serialize;
use serde_json::Value;

use crate::cell::{Lifecycle, StoreCell};

const SESSION: &str = "session";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthState {
    pub user: Option<User>,
    pub is_authenticated: bool,
    pub status: SessionStatus,
    /// Set after a registration that awaits admin approval.
    pub notice: Option<String>,
    pub is_loading: bool,
    pub error: Option<String>,
}

impl Default for AuthState {
    fn default() -> Self {
        Self {
            user: None,
            is_authenticated: false,
            status: SessionStatus::Anonymous,
            notice: None,
            is_loading: false,
            error: None,
        }
    }
}

impl Lifecycle for AuthState {
    fn begin(&mut self) {
        self.is_loading = true;
        self.error = None;
        self.notice = None;
    }

    fn succeed(&mut self) {
        self.is_loading = false;
    }

    fn fail(&mut self, message: Option<String>) {
        self.is_loading = false;
        self.error = message;
    }

    fn set_loading(&mut self, loading: bool) {
        self.is_loading = loading;
    }
}

pub struct AuthStore {
    session: Arc<SessionManager>,
    cell: StoreCell<AuthState>,
}

impl AuthStore {
    #[must_use]
    pub fn new(session: Arc<SessionManager>) -> Self {
        Self {
            session,
            cell: StoreCell::new(),
        }
    }

    #[must_use]
    pub const fn session(&self) -> &Arc<SessionManager> {
        &self.session
    }

    /// Current state, reflecting session changes made elsewhere (a 401 from
    /// another store ends the session here too).
    #[must_use]
    pub fn state(&self) -> AuthState {
        self.sync();
        self.cell.snapshot()
    }

    /// # Errors
    ///
    /// Returns the [`ErrorRecord`] of a failed login.
    pub async fn login(&self, credentials: &Credentials) -> Result<User, ErrorRecord> {
        let ticket = self.cell.start(SESSION);
        let result = self.session.login(credentials).await.map_err(into_record);
        self.sync();
        self.cell.finish(ticket, result, |_, _| {})
    }

    /// # Errors
    ///
    /// Returns the [`ErrorRecord`] of a failed registration. An account
    /// pending approval is not a failure.
    pub async fn register(&self, registration: &Registration) -> Result<RegisterOutcome, ErrorRecord> {
        let ticket = self.cell.start(SESSION);
        let result = self.session.register(registration).await.map_err(into_record);
        self.sync();
        self.cell.finish(ticket, result, |state, outcome| {
            if let RegisterOutcome::PendingApproval { message } = outcome {
                state.notice = Some(message.clone());
            }
        })
    }

    pub async fn logout(&self) {
        let ticket = self.cell.start(SESSION);
        self.session.logout().await;
        self.sync();
        let _ = self.cell.finish(ticket, Ok(()), |_, _| {});
    }

    /// Restore and re-validate a persisted session.
    ///
    /// # Errors
    ///
    /// Returns an [`ErrorRecord`] if stored credentials cannot be restored.
    pub async fn initialize(&self) -> Result<SessionStatus, ErrorRecord> {
        let ticket = self.cell.start(SESSION);
        let result = self.session.initialize().await.map_err(into_record);
        self.sync();
        self.cell.finish(ticket, result, |_, _| {})
    }

    /// # Errors
    ///
    /// Returns the [`ErrorRecord`] of a failed `/auth/me` call.
    pub async fn refresh_user(&self) -> Result<User, ErrorRecord> {
        let ticket = self.cell.start(SESSION);
        let result = self.session.refresh().await.map_err(into_record);
        self.sync();
        self.cell.finish(ticket, result, |_, _| {})
    }

    /// Update the profile and store the returned user record.
    ///
    /// # Errors
    ///
    /// Returns the classified [`ErrorRecord`] of a failed call.
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<User, ErrorRecord> {
        let ticket = self.cell.start(SESSION);
        let result = match self
            .session
            .pipeline()
            .put("/auth/profile", update)
            .await
            .and_then(profile_user)
        {
            Ok(user) => self
                .session
                .replace_user(user.clone())
                .map(|()| user)
                .map_err(into_record),
            Err(error) => Err(error),
        };
        self.sync();
        self.cell.finish(ticket, result, |_, _| {})
    }

    fn sync(&self) {
        let session = self.session.session();
        self.cell.update(|state| {
            state.user = session.user().cloned();
            state.is_authenticated = session.is_authenticated();
            state.status = session.status();
        });
    }
}

/// `PUT /auth/profile` answers with `{user}` (possibly inside `data`) or
/// the user record itself.
fn profile_user(payload: Value) -> Result<User, ErrorRecord> {
    let nested = lookup(&payload, "user").cloned();
    match nested {
        Some(user) => normalize::one::<User>(user, "user"),
        None => normalize::one::<User>(payload, "user"),
    }
}

/// Storage failures reach the UI as server-side errors with their own text.
fn into_record(error: SessionError) -> ErrorRecord {
    match error {
        SessionError::Request(record) => record,
        other => classify::internal(Some(other.to_string())),
    }
}
