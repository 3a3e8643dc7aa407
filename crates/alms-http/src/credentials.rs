//! The pipeline's view of the session's token storage.

/// Source of the bearer token attached to outbound calls.
///
/// Implemented by the session vault; the pipeline reads the token before
/// every call and clears it when the backend rejects the session.
pub trait CredentialStore: Send + Sync {
    /// The current token, if any backend holds one.
    fn token(&self) -> Option<String>;

    /// Remove the token from every backend. Failures are logged, not
    /// returned: the caller is already handling a rejected request.
    fn clear(&self);
}
