use alms_core::Pagination;
use alms_core::entities::{Campaign, Donation};
use alms_store::Stores;
use anyhow::Context;
use serde::Serialize;

use crate::cli::GlobalFlags;
use crate::cli::subcommands::CampaignCommands;
use crate::output::output;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CampaignListResponse {
    campaigns: Vec<Campaign>,
    pagination: Pagination,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FeaturedResponse {
    featured_campaigns: Vec<Campaign>,
}

#[derive(Serialize)]
struct CampaignDetailResponse {
    campaign: Campaign,
    #[serde(skip_serializing_if = "Option::is_none")]
    donations: Option<Vec<Donation>>,
}

pub async fn handle(action: CampaignCommands, stores: &Stores, flags: &GlobalFlags) -> anyhow::Result<()> {
    let store = &stores.campaigns;
    match action {
        CampaignCommands::List(args) => {
            store
                .fetch_campaigns(&args.into())
                .await
                .context("failed to list campaigns")?;
            let state = store.state();
            output(
                &CampaignListResponse {
                    campaigns: state.base.items,
                    pagination: state.base.pagination,
                },
                flags.format,
            )
        }
        CampaignCommands::Featured => {
            store
                .fetch_featured_campaigns()
                .await
                .context("failed to list featured campaigns")?;
            output(
                &FeaturedResponse {
                    featured_campaigns: store.state().featured_campaigns,
                },
                flags.format,
            )
        }
        CampaignCommands::Show { id, donations } => {
            let campaign = store
                .fetch_campaign(&id)
                .await
                .with_context(|| format!("failed to load campaign {id}"))?;
            let donations = if donations {
                Some(
                    stores
                        .donations
                        .fetch_campaign_donations(&id)
                        .await
                        .with_context(|| format!("failed to list donations for campaign {id}"))?,
                )
            } else {
                None
            };
            output(&CampaignDetailResponse { campaign, donations }, flags.format)
        }
    }
}
