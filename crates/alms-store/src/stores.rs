//! The store container handed to every consumer.

use std::sync::Arc;

use alms_auth::{ConfirmPolicy, SessionFile, SessionManager, TokenVault};
use alms_config::AlmsConfig;
use alms_http::RequestPipeline;

use crate::admin::AdminStore;
use crate::auth::AuthStore;
use crate::campaign::CampaignStore;
use crate::donation::DonationStore;
use crate::error::BuildError;

/// All domain stores over one shared pipeline and session manager.
pub struct Stores {
    pub auth: AuthStore,
    pub campaigns: CampaignStore,
    pub donations: DonationStore,
    pub admin: AdminStore,
}

impl Stores {
    /// `session` must have been built over `pipeline`.
    #[must_use]
    pub fn new(pipeline: Arc<RequestPipeline>, session: Arc<SessionManager>) -> Self {
        Self {
            auth: AuthStore::new(session),
            campaigns: CampaignStore::new(pipeline.clone()),
            donations: DonationStore::new(pipeline.clone()),
            admin: AdminStore::new(pipeline),
        }
    }

    /// Production wiring: token vault and session file under the state
    /// directory, `reqwest` pipeline reading its token from the vault.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError`] if the state directory, token storage or HTTP
    /// client cannot be set up.
    pub fn from_config(config: &AlmsConfig) -> Result<Self, BuildError> {
        let state_dir = config.session.state_path()?;
        let vault = Arc::new(TokenVault::from_config(&config.session)?);
        let pipeline = Arc::new(RequestPipeline::from_config(config, vault.clone())?);
        tracing::debug!(
            base_url = pipeline.base().url(),
            state_dir = %state_dir.display(),
            "stores configured"
        );
        let session = Arc::new(
            SessionManager::new(pipeline.clone(), vault, SessionFile::in_dir(&state_dir))
                .with_confirm_policy(ConfirmPolicy::from(&config.session)),
        );
        Ok(Self::new(pipeline, session))
    }

    #[must_use]
    pub const fn session(&self) -> &Arc<SessionManager> {
        self.auth.session()
    }
}
