use alms_core::Pagination;
use alms_core::entities::{Donation, DonationDraft};
use alms_store::Stores;
use anyhow::Context;
use serde::Serialize;

use crate::cli::GlobalFlags;
use crate::cli::subcommands::DonationCommands;
use crate::output::output;

#[derive(Serialize)]
struct DonationListResponse {
    donations: Vec<Donation>,
    pagination: Pagination,
}

#[derive(Serialize)]
struct DonationResponse {
    donation: Donation,
}

pub async fn handle(action: DonationCommands, stores: &Stores, flags: &GlobalFlags) -> anyhow::Result<()> {
    let store = &stores.donations;
    match action {
        DonationCommands::Mine { page } => {
            store
                .fetch_my_donations(page)
                .await
                .context("failed to list your donations")?;
            let state = store.state();
            output(
                &DonationListResponse {
                    donations: state.base.items,
                    pagination: state.base.pagination,
                },
                flags.format,
            )
        }
        DonationCommands::Give {
            campaign_id,
            amount,
            message,
            anonymous,
        } => {
            anyhow::ensure!(amount > 0.0, "donation amount must be positive");
            let donation = store
                .create_donation(&DonationDraft {
                    campaign_id,
                    amount,
                    message,
                    anonymous,
                })
                .await
                .context("donation failed")?;
            output(&DonationResponse { donation }, flags.format)
        }
    }
}
