mod admin;
mod auth;
mod campaigns;
mod donations;

use alms_store::Stores;

use crate::cli::{Commands, GlobalFlags};

/// Restore the persisted session, then run one command.
pub async fn dispatch(command: Commands, stores: &Stores, flags: &GlobalFlags) -> anyhow::Result<()> {
    match stores.auth.initialize().await {
        Ok(status) => tracing::debug!(?status, "session restored"),
        Err(error) => tracing::warn!(%error, "could not restore stored session"),
    }

    match command {
        Commands::Auth { action } => auth::handle(action, stores, flags).await,
        Commands::Campaigns { action } => campaigns::handle(action, stores, flags).await,
        Commands::Donations { action } => donations::handle(action, stores, flags).await,
        Commands::Admin { action } => admin::handle(action, stores, flags).await,
    }
}
