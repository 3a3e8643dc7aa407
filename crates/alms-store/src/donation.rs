//! Donations: giving, history, and per-campaign listings.

use std::sync::Arc;

use alms_core::StoreState;
use alms_core::entities::{Donation, DonationDraft};
use alms_http::normalize::{self, Page};
use alms_http::{ErrorRecord, RequestOptions, RequestPipeline};
use serde::Serialize;

use crate::cell::{Lifecycle, StoreCell, segment};

const MINE: &str = "mine";
const BY_CAMPAIGN: &str = "by_campaign";
const CURRENT: &str = "current";

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DonationState {
    /// `items` holds the logged-in user's donations.
    #[serde(flatten)]
    pub base: StoreState<Donation>,
    pub campaign_donations: Vec<Donation>,
}

impl Lifecycle for DonationState {
    fn begin(&mut self) {
        self.base.begin();
    }

    fn succeed(&mut self) {
        self.base.succeed();
    }

    fn fail(&mut self, message: Option<String>) {
        self.base.fail(message);
    }

    fn set_loading(&mut self, loading: bool) {
        self.base.is_loading = loading;
    }
}

pub struct DonationStore {
    pipeline: Arc<RequestPipeline>,
    cell: StoreCell<DonationState>,
}

impl DonationStore {
    #[must_use]
    pub fn new(pipeline: Arc<RequestPipeline>) -> Self {
        Self {
            pipeline,
            cell: StoreCell::new(),
        }
    }

    #[must_use]
    pub fn state(&self) -> DonationState {
        self.cell.snapshot()
    }

    /// Give to a campaign, then reload the donation history.
    ///
    /// # Errors
    ///
    /// Returns the classified [`ErrorRecord`] of a failed call.
    pub async fn create_donation(&self, draft: &DonationDraft) -> Result<Donation, ErrorRecord> {
        let ticket = self.cell.start(CURRENT);
        let result = self
            .pipeline
            .post("/donations", draft)
            .await
            .and_then(|payload| normalize::one::<Donation>(payload, "donation"));
        let donation = self.cell.finish(ticket, result, |state, donation| {
            state.base.current = Some(donation.clone());
        })?;
        tracing::info!(
            donation_id = %donation.id,
            campaign_id = %draft.campaign_id,
            amount = draft.amount,
            "donation recorded"
        );
        if let Err(error) = self.load_mine(RequestOptions::fresh().param("page", "1")).await {
            tracing::warn!(%error, "donation history refresh after donating failed");
        }
        Ok(donation)
    }

    /// # Errors
    ///
    /// Returns the classified [`ErrorRecord`] of a failed call.
    pub async fn fetch_my_donations(&self, page: u32) -> Result<Page<Donation>, ErrorRecord> {
        self.load_mine(RequestOptions::new().param("page", page.max(1).to_string()))
            .await
    }

    /// # Errors
    ///
    /// Returns the classified [`ErrorRecord`] of a failed call.
    pub async fn fetch_campaign_donations(&self, campaign_id: &str) -> Result<Vec<Donation>, ErrorRecord> {
        let ticket = self.cell.start(BY_CAMPAIGN);
        let result = self
            .pipeline
            .get(&format!("/campaigns/{}/donations", segment(campaign_id)))
            .await
            .and_then(|payload| normalize::list::<Donation>(payload, "donation").map(|page| page.items));
        self.cell.finish(ticket, result, |state, items| {
            state.campaign_donations.clone_from(items);
        })
    }

    /// # Errors
    ///
    /// Returns the classified [`ErrorRecord`] of a failed call.
    pub async fn fetch_donation(&self, id: &str) -> Result<Donation, ErrorRecord> {
        let ticket = self.cell.start(CURRENT);
        let result = self
            .pipeline
            .get(&format!("/donations/{}", segment(id)))
            .await
            .and_then(|payload| normalize::one::<Donation>(payload, "donation"));
        self.cell.finish(ticket, result, |state, donation| {
            state.base.current = Some(donation.clone());
        })
    }

    async fn load_mine(&self, options: RequestOptions) -> Result<Page<Donation>, ErrorRecord> {
        let ticket = self.cell.start(MINE);
        let result = self
            .pipeline
            .get_with("/donations/my", options)
            .await
            .and_then(|payload| normalize::list::<Donation>(payload, "donation"));
        self.cell.finish(ticket, result, |state, page| {
            state.base.items.clone_from(&page.items);
            state.base.pagination = page.pagination;
        })
    }
}
