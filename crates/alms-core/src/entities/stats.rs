use serde::{Deserialize, Serialize};

/// Admin dashboard counters.
///
/// `Default` is the zeroed structure shown when the backing resources are
/// unreachable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_users: u64,
    pub pending_approvals: u64,
    pub total_campaigns: u64,
    pub active_campaigns: u64,
    pub total_donations: u64,
    pub total_raised: f64,
    pub active_coupons: u64,
    pub total_partners: u64,
}
