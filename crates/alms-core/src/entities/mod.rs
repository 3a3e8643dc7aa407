//! Entity structs for the donation platform's domain objects.
//!
//! Field names follow the backend's JSON (`_id`, camelCase). Every struct is
//! `#[serde(default)]` so partially-populated records from list endpoints
//! still deserialize.

mod campaign;
mod coupon;
mod donation;
mod partner;
mod stats;
mod user;

pub use campaign::{Campaign, CampaignDraft, CampaignQuery, CampaignStatus};
pub use coupon::{Coupon, CouponDraft, CouponStatus};
pub use donation::{Donation, DonationDraft};
pub use partner::Partner;
pub use stats::DashboardStats;
pub use user::{Credentials, ProfileUpdate, Registration, User, UserRole};

use serde::{Deserialize, Serialize};

/// A reference to another entity that the backend may or may not populate.
///
/// `donation.campaign` arrives as a bare id from some endpoints and as the
/// full campaign document from others.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityRef<T> {
    Populated(Box<T>),
    Id(String),
}

impl<T> EntityRef<T> {
    /// The populated entity, if the backend sent one.
    #[must_use]
    pub fn populated(&self) -> Option<&T> {
        match self {
            Self::Populated(entity) => Some(entity),
            Self::Id(_) => None,
        }
    }
}

impl<T> Default for EntityRef<T> {
    fn default() -> Self {
        Self::Id(String::new())
    }
}
