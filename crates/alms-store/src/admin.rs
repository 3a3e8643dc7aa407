//! Admin dashboard: aggregate counters, user approval, coupons, partners.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use alms_core::Pagination;
use alms_core::entities::{
    Campaign, CampaignStatus, Coupon, CouponDraft, CouponStatus, DashboardStats, Donation, Partner,
    User,
};
use alms_http::normalize::{self, Page};
use alms_http::{ErrorKind, ErrorRecord, RequestOptions, RequestPipeline};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::json;

use crate::cell::{Lifecycle, StoreCell, segment};

const STATS: &str = "stats";
const USERS: &str = "users";
const COUPONS: &str = "coupons";
const PARTNERS: &str = "partners";

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminState {
    pub stats: DashboardStats,
    pub users: Vec<User>,
    /// Pagination of `users`.
    pub pagination: Pagination,
    pub coupons: Vec<Coupon>,
    pub partners: Vec<Partner>,
    pub is_loading: bool,
    pub error: Option<String>,
}

impl Lifecycle for AdminState {
    fn begin(&mut self) {
        self.is_loading = true;
        self.error = None;
    }

    fn succeed(&mut self) {
        self.is_loading = false;
    }

    fn fail(&mut self, message: Option<String>) {
        self.is_loading = false;
        self.error = message;
    }

    fn set_loading(&mut self, loading: bool) {
        self.is_loading = loading;
    }
}

pub struct AdminStore {
    pipeline: Arc<RequestPipeline>,
    cell: StoreCell<AdminState>,
    users_page: AtomicU32,
    coupon_filter: Mutex<Option<CouponStatus>>,
}

impl AdminStore {
    #[must_use]
    pub fn new(pipeline: Arc<RequestPipeline>) -> Self {
        Self {
            pipeline,
            cell: StoreCell::new(),
            users_page: AtomicU32::new(1),
            coupon_filter: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn state(&self) -> AdminState {
        self.cell.snapshot()
    }

    /// Aggregate dashboard counters from every resource concurrently.
    ///
    /// A resource that cannot be read contributes zeroes instead of failing
    /// the dashboard. Counters reported by `/admin/stats` take precedence over
    /// ones derived from the resource lists.
    ///
    /// Derived totals come from list pagination. The derived
    /// `pending_approvals`, `active_campaigns`, `active_coupons` and
    /// `total_raised` are counted over the first page of each list only, so
    /// they are lower bounds when a list spans several pages.
    ///
    /// # Errors
    ///
    /// Returns an `Auth` [`ErrorRecord`] if any resource rejected the session.
    pub async fn fetch_dashboard_stats(&self) -> Result<DashboardStats, ErrorRecord> {
        let ticket = self.cell.start(STATS);
        let (reported, users, campaigns, donations, coupons, partners) = tokio::join!(
            self.read_summary::<DashboardStats>("/admin/stats", "dashboard stats"),
            self.read_list::<User>("/admin/users", "user"),
            self.read_list::<Campaign>("/campaigns", "campaign"),
            self.read_list::<Donation>("/donations", "donation"),
            self.read_list::<Coupon>("/coupons", "coupon"),
            self.read_list::<Partner>("/partners", "partner"),
        );

        let mut rejected = None;
        let mut stats = tolerate(reported, "stats", &mut rejected).unwrap_or_default();
        if let Some(page) = tolerate(users, "users", &mut rejected) {
            fill(&mut stats.total_users, page.pagination.total);
            fill(&mut stats.pending_approvals, count(&page.items, |u| !u.is_approved));
        }
        if let Some(page) = tolerate(campaigns, "campaigns", &mut rejected) {
            fill(&mut stats.total_campaigns, page.pagination.total);
            fill(
                &mut stats.active_campaigns,
                count(&page.items, |c| c.status == CampaignStatus::Active),
            );
            if stats.total_raised.abs() < f64::EPSILON {
                stats.total_raised = page.items.iter().map(|c| c.raised_amount).sum();
            }
        }
        if let Some(page) = tolerate(donations, "donations", &mut rejected) {
            fill(&mut stats.total_donations, page.pagination.total);
        }
        if let Some(page) = tolerate(coupons, "coupons", &mut rejected) {
            fill(
                &mut stats.active_coupons,
                count(&page.items, |c| c.status == CouponStatus::Active),
            );
        }
        if let Some(page) = tolerate(partners, "partners", &mut rejected) {
            fill(&mut stats.total_partners, page.pagination.total);
        }

        let result = rejected.map_or(Ok(stats), Err);
        self.cell.finish(ticket, result, |state, stats| {
            state.stats = stats.clone();
        })
    }

    /// # Errors
    ///
    /// Returns the classified [`ErrorRecord`] of a failed call.
    pub async fn fetch_users(&self, page: u32) -> Result<Page<User>, ErrorRecord> {
        let page = page.max(1);
        self.users_page.store(page, Ordering::Relaxed);
        self.load_users(RequestOptions::new().param("page", page.to_string()))
            .await
    }

    /// Approve a pending account, then reload the user list.
    ///
    /// # Errors
    ///
    /// Returns the classified [`ErrorRecord`] of a failed call.
    pub async fn approve_user(&self, id: &str) -> Result<User, ErrorRecord> {
        let ticket = self.cell.start(USERS);
        let result = self
            .pipeline
            .put(&format!("/admin/users/{}/approve", segment(id)), &json!({}))
            .await
            .and_then(|payload| normalize::one::<User>(payload, "user"));
        let approved = self.cell.finish(ticket, result, |_, _| {})?;
        tracing::info!(user_id = id, "user approved");

        let page = self.users_page.load(Ordering::Relaxed);
        if let Err(error) = self
            .load_users(RequestOptions::fresh().param("page", page.to_string()))
            .await
        {
            tracing::warn!(%error, "user list refresh after approval failed");
        }
        Ok(approved)
    }

    /// # Errors
    ///
    /// Returns the classified [`ErrorRecord`] of a failed call.
    pub async fn fetch_coupons(&self, status: Option<CouponStatus>) -> Result<Vec<Coupon>, ErrorRecord> {
        *self.coupon_filter.lock().unwrap_or_else(PoisonError::into_inner) = status;
        self.load_coupons(RequestOptions::new()).await
    }

    /// # Errors
    ///
    /// Returns the classified [`ErrorRecord`] of a failed call.
    pub async fn create_coupon(&self, draft: &CouponDraft) -> Result<Coupon, ErrorRecord> {
        let ticket = self.cell.start(COUPONS);
        let result = self
            .pipeline
            .post("/coupons", draft)
            .await
            .and_then(|payload| normalize::one::<Coupon>(payload, "coupon"));
        let created = self.cell.finish(ticket, result, |_, _| {})?;
        tracing::info!(coupon = %created.code, "coupon created");
        self.refetch_coupons().await;
        Ok(created)
    }

    /// # Errors
    ///
    /// Returns the classified [`ErrorRecord`] of a failed call.
    pub async fn redeem_coupon(&self, code: &str) -> Result<Coupon, ErrorRecord> {
        let ticket = self.cell.start(COUPONS);
        let result = self
            .pipeline
            .post(&format!("/coupons/{}/redeem", segment(code)), &json!({}))
            .await
            .and_then(|payload| normalize::one::<Coupon>(payload, "coupon"));
        let redeemed = self.cell.finish(ticket, result, |_, _| {})?;
        tracing::info!(coupon = code, "coupon redeemed");
        self.refetch_coupons().await;
        Ok(redeemed)
    }

    /// # Errors
    ///
    /// Returns the classified [`ErrorRecord`] of a failed call.
    pub async fn fetch_partners(&self) -> Result<Vec<Partner>, ErrorRecord> {
        let ticket = self.cell.start(PARTNERS);
        let result = self
            .read_list::<Partner>("/partners", "partner")
            .await
            .map(|page| page.items);
        self.cell.finish(ticket, result, |state, partners| {
            state.partners.clone_from(partners);
        })
    }

    async fn load_users(&self, options: RequestOptions) -> Result<Page<User>, ErrorRecord> {
        let ticket = self.cell.start(USERS);
        let result = self
            .pipeline
            .get_with("/admin/users", options)
            .await
            .and_then(|payload| normalize::list::<User>(payload, "user"));
        self.cell.finish(ticket, result, |state, page| {
            state.users.clone_from(&page.items);
            state.pagination = page.pagination;
        })
    }

    async fn load_coupons(&self, options: RequestOptions) -> Result<Vec<Coupon>, ErrorRecord> {
        let filter = *self.coupon_filter.lock().unwrap_or_else(PoisonError::into_inner);
        let options = match filter {
            Some(status) => options.param("status", status.as_str()),
            None => options,
        };
        let ticket = self.cell.start(COUPONS);
        let result = self
            .pipeline
            .get_with("/coupons", options)
            .await
            .and_then(|payload| normalize::list::<Coupon>(payload, "coupon").map(|page| page.items));
        self.cell.finish(ticket, result, |state, coupons| {
            state.coupons.clone_from(coupons);
        })
    }

    async fn refetch_coupons(&self) {
        if let Err(error) = self.load_coupons(RequestOptions::fresh()).await {
            tracing::warn!(%error, "coupon list refresh after mutation failed");
        }
    }

    async fn read_list<T: DeserializeOwned>(&self, path: &str, entity: &str) -> Result<Page<T>, ErrorRecord> {
        self.pipeline
            .get(path)
            .await
            .and_then(|payload| normalize::list::<T>(payload, entity))
    }

    async fn read_summary<T: DeserializeOwned>(&self, path: &str, entity: &str) -> Result<T, ErrorRecord> {
        self.pipeline
            .get(path)
            .await
            .and_then(|payload| normalize::summary::<T>(payload, entity))
    }
}

/// Keep a readable resource; log and drop an unreadable one. The first
/// session rejection is kept so the dashboard can report it.
fn tolerate<T>(
    result: Result<T, ErrorRecord>,
    resource: &str,
    rejected: &mut Option<ErrorRecord>,
) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(error) => {
            tracing::warn!(resource, kind = ?error.kind(), %error, "dashboard resource unavailable");
            if error.kind() == ErrorKind::Auth && rejected.is_none() {
                *rejected = Some(error);
            }
            None
        }
    }
}

fn fill(counter: &mut u64, derived: u64) {
    if *counter == 0 {
        *counter = derived;
    }
}

fn count<T>(items: &[T], predicate: impl Fn(&T) -> bool) -> u64 {
    u64::try_from(items.iter().filter(|item| predicate(item)).count()).unwrap_or(u64::MAX)
}
