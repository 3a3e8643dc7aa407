//! Read-back confirmation of a token write.
//!
//! Some storage commits lag the write call. After writing, the vault is read
//! back; on mismatch the write is repeated with exponential backoff until
//! every backend agrees or the attempts run out.

use std::time::Duration;

use alms_config::SessionConfig;

use crate::error::SessionError;
use crate::vault::TokenVault;

#[derive(Debug, Clone)]
pub struct ConfirmPolicy {
    /// Maximum number of read-backs (including the first).
    pub max_attempts: u32,
    /// Delay before the first rewrite.
    pub base_delay: Duration,
    /// Backoff is capped here.
    pub max_delay: Duration,
}

impl Default for ConfirmPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(2),
        }
    }
}

impl From<&SessionConfig> for ConfirmPolicy {
    fn from(config: &SessionConfig) -> Self {
        Self {
            max_attempts: config.confirm_attempts.max(1),
            base_delay: Duration::from_millis(config.confirm_base_delay_ms),
            ..Self::default()
        }
    }
}

impl ConfirmPolicy {
    /// Delay after the `attempt`-th failed read-back (1-based).
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 1_u32 << attempt.saturating_sub(1).min(16);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

/// Confirm that every backend holds `token`. Returns the attempt on which
/// the read-back matched.
///
/// # Errors
///
/// Returns [`SessionError::PersistenceUnconfirmed`] when the attempts are
/// exhausted.
pub async fn confirm(
    vault: &TokenVault,
    token: &str,
    policy: &ConfirmPolicy,
) -> Result<u32, SessionError> {
    let max_attempts = policy.max_attempts.max(1);
    for attempt in 1..=max_attempts {
        if vault.holds(token) {
            return Ok(attempt);
        }
        if attempt == max_attempts {
            break;
        }
        let delay = policy.delay_for(attempt);
        tracing::warn!(attempt, delay_ms = delay.as_millis(), "token not yet readable; rewriting");
        tokio::time::sleep(delay).await;
        if let Err(error) = vault.store(token) {
            tracing::warn!(%error, attempt, "token rewrite failed");
        }
    }
    Err(SessionError::PersistenceUnconfirmed {
        attempts: max_attempts,
    })
}
