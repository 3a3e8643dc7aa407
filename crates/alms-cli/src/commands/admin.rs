use alms_core::Pagination;
use alms_core::entities::{Coupon, Partner, User};
use alms_store::Stores;
use anyhow::Context;
use serde::Serialize;

use crate::cli::GlobalFlags;
use crate::cli::subcommands::AdminCommands;
use crate::output::output;

#[derive(Serialize)]
struct CouponsResponse {
    coupons: Vec<Coupon>,
}

#[derive(Serialize)]
struct UsersResponse {
    users: Vec<User>,
    pagination: Pagination,
}

#[derive(Serialize)]
struct PartnersResponse {
    partners: Vec<Partner>,
}

pub async fn handle(action: AdminCommands, stores: &Stores, flags: &GlobalFlags) -> anyhow::Result<()> {
    let store = &stores.admin;
    match action {
        AdminCommands::Stats => {
            let stats = store
                .fetch_dashboard_stats()
                .await
                .context("failed to load dashboard")?;
            output(&stats, flags.format)
        }
        AdminCommands::Coupons { status } => {
            store
                .fetch_coupons(status.map(Into::into))
                .await
                .context("failed to list coupons")?;
            output(
                &CouponsResponse {
                    coupons: store.state().coupons,
                },
                flags.format,
            )
        }
        AdminCommands::Users { page, approve } => {
            store.fetch_users(page).await.context("failed to list users")?;
            if let Some(id) = approve {
                store
                    .approve_user(&id)
                    .await
                    .with_context(|| format!("failed to approve user {id}"))?;
            }
            let state = store.state();
            output(
                &UsersResponse {
                    users: state.users,
                    pagination: state.pagination,
                },
                flags.format,
            )
        }
        AdminCommands::Partners => {
            store
                .fetch_partners()
                .await
                .context("failed to list partners")?;
            output(
                &PartnersResponse {
                    partners: store.state().partners,
                },
                flags.format,
            )
        }
    }
}
