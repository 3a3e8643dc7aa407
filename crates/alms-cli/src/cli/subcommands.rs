use alms_core::entities::{CampaignQuery, CouponStatus, UserRole};
use clap::{Args, Subcommand, ValueEnum};

/// Session commands.
#[derive(Clone, Debug, Subcommand)]
pub enum AuthCommands {
    /// Log in and store the session token.
    Login(LoginArgs),
    /// Create an account. Partner accounts wait for admin approval.
    Register(RegisterArgs),
    /// End the session and clear stored credentials.
    Logout,
    /// Show the current session.
    Status,
}

#[derive(Clone, Debug, Args)]
pub struct LoginArgs {
    #[arg(long)]
    pub email: String,
    /// Password (falls back to `ALMS_PASSWORD`).
    #[arg(long)]
    pub password: Option<String>,
}

#[derive(Clone, Debug, Args)]
pub struct RegisterArgs {
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub email: String,
    /// Password (falls back to `ALMS_PASSWORD`).
    #[arg(long)]
    pub password: Option<String>,
    #[arg(long, value_enum, default_value = "donor")]
    pub role: RoleArg,
    #[arg(long)]
    pub phone: Option<String>,
    /// Organization name for partner accounts.
    #[arg(long)]
    pub organization: Option<String>,
}

/// Roles that can self-register.
#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum RoleArg {
    Donor,
    Volunteer,
    Partner,
}

impl From<RoleArg> for UserRole {
    fn from(role: RoleArg) -> Self {
        match role {
            RoleArg::Donor => Self::Donor,
            RoleArg::Volunteer => Self::Volunteer,
            RoleArg::Partner => Self::Partner,
        }
    }
}

/// Campaign commands.
#[derive(Clone, Debug, Subcommand)]
pub enum CampaignCommands {
    /// List campaigns.
    List(CampaignListArgs),
    /// List featured campaigns.
    Featured,
    /// Show one campaign.
    Show {
        id: String,
        /// Also list the campaign's donations.
        #[arg(long)]
        donations: bool,
    },
}

#[derive(Clone, Debug, Default, Args)]
pub struct CampaignListArgs {
    #[arg(long)]
    pub page: Option<u32>,
    #[arg(long)]
    pub limit: Option<u32>,
    #[arg(long)]
    pub category: Option<String>,
    #[arg(long)]
    pub search: Option<String>,
    #[arg(long)]
    pub status: Option<String>,
}

impl From<CampaignListArgs> for CampaignQuery {
    fn from(args: CampaignListArgs) -> Self {
        Self {
            page: args.page,
            limit: args.limit,
            category: args.category,
            search: args.search,
            status: args.status,
        }
    }
}

/// Donation commands.
#[derive(Clone, Debug, Subcommand)]
pub enum DonationCommands {
    /// List your donations.
    Mine {
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    /// Donate to a campaign.
    Give {
        campaign_id: String,
        amount: f64,
        #[arg(long)]
        message: Option<String>,
        #[arg(long)]
        anonymous: bool,
    },
}

/// Admin commands.
#[derive(Clone, Debug, Subcommand)]
pub enum AdminCommands {
    /// Dashboard counters.
    Stats,
    /// List coupons, optionally by status.
    Coupons {
        #[arg(long, value_enum)]
        status: Option<CouponFilter>,
    },
    /// List accounts.
    Users {
        #[arg(long, default_value_t = 1)]
        page: u32,
        /// Approve this user id before listing.
        #[arg(long)]
        approve: Option<String>,
    },
    /// List partner organizations.
    Partners,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum CouponFilter {
    Active,
    Redeemed,
    Expired,
}

impl From<CouponFilter> for CouponStatus {
    fn from(filter: CouponFilter) -> Self {
        match filter {
            CouponFilter::Active => Self::Active,
            CouponFilter::Redeemed => Self::Redeemed,
            CouponFilter::Expired => Self::Expired,
        }
    }
}
