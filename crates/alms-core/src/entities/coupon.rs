use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{EntityRef, Partner};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CouponStatus {
    #[default]
    Active,
    Redeemed,
    Expired,
    #[serde(other)]
    Other,
}

impl CouponStatus {
    /// Wire name, as used in the `status` query filter.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Redeemed => "redeemed",
            Self::Expired => "expired",
            Self::Other => "other",
        }
    }
}

/// A partner-funded coupon issued to volunteers and donors.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Coupon {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    pub code: String,
    pub title: String,
    pub discount: f64,
    pub partner: Option<EntityRef<Partner>>,
    pub status: CouponStatus,
    pub expires_at: Option<DateTime<Utc>>,
    pub redeemed_at: Option<DateTime<Utc>>,
}

/// Payload for `POST /coupons`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CouponDraft {
    pub title: String,
    pub discount: f64,
    pub partner_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}
