use clap::Subcommand;

use super::subcommands::{AdminCommands, AuthCommands, CampaignCommands, DonationCommands};

/// Top-level command groups.
#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    /// Log in, register, log out, inspect the session.
    Auth {
        #[command(subcommand)]
        action: AuthCommands,
    },
    /// Browse campaigns.
    Campaigns {
        #[command(subcommand)]
        action: CampaignCommands,
    },
    /// Give and review donations.
    Donations {
        #[command(subcommand)]
        action: DonationCommands,
    },
    /// Admin dashboard.
    Admin {
        #[command(subcommand)]
        action: AdminCommands,
    },
}
