//! Campaign listing, detail and management.

use std::sync::{Arc, Mutex, PoisonError};

use alms_core::StoreState;
use alms_core::entities::{Campaign, CampaignDraft, CampaignQuery};
use alms_http::normalize::{self, Page};
use alms_http::{ErrorRecord, RequestOptions, RequestPipeline};
use serde::Serialize;

use crate::cell::{Lifecycle, StoreCell, segment};

const LIST: &str = "campaigns";
const FEATURED: &str = "featured";
const MINE: &str = "mine";
const CURRENT: &str = "current";

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignState {
    #[serde(flatten)]
    pub base: StoreState<Campaign>,
    pub featured_campaigns: Vec<Campaign>,
    pub my_campaigns: Vec<Campaign>,
}

impl Lifecycle for CampaignState {
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

pub struct CampaignStore {
    pipeline: Arc<RequestPipeline>,
    cell: StoreCell<CampaignState>,
    last_query: Mutex<CampaignQuery>,
}

impl CampaignStore {
    #[must_use]
    pub fn new(pipeline: Arc<RequestPipeline>) -> Self {
        Self {
            pipeline,
            cell: StoreCell::new(),
            last_query: Mutex::new(CampaignQuery::default()),
        }
    }

    #[must_use]
    pub fn state(&self) -> CampaignState {
        self.cell.snapshot()
    }

    /// # Errors
    ///
    /// Returns the classified [`ErrorRecord`] of a failed call.
    pub async fn fetch_campaigns(&self, query: &CampaignQuery) -> Result<Page<Campaign>, ErrorRecord> {
        self.remember(query);
        self.load_list(RequestOptions::new().params(query.to_params())).await
    }

    /// # Errors
    ///
    /// Returns the classified [`ErrorRecord`] of a failed call.
    pub async fn fetch_featured_campaigns(&self) -> Result<Vec<Campaign>, ErrorRecord> {
        let ticket = self.cell.start(FEATURED);
        let result = self
            .pipeline
            .get("/campaigns/featured")
            .await
            .and_then(|payload| normalize::list::<Campaign>(payload, "campaign").map(|page| page.items));
        self.cell.finish(ticket, result, |state, items| {
            state.featured_campaigns.clone_from(items);
        })
    }

    /// # Errors
    ///
    /// Returns the classified [`ErrorRecord`] of a failed call.
    pub async fn fetch_campaign(&self, id: &str) -> Result<Campaign, ErrorRecord> {
        let ticket = self.cell.start(CURRENT);
        let result = self
            .pipeline
            .get(&format!("/campaigns/{}", segment(id)))
            .await
            .and_then(|payload| normalize::one::<Campaign>(payload, "campaign"));
        self.cell.finish(ticket, result, |state, campaign| {
            state.base.current = Some(campaign.clone());
        })
    }

    /// Campaigns created by the logged-in user.
    ///
    /// # Errors
    ///
    /// Returns the classified [`ErrorRecord`] of a failed call.
    pub async fn fetch_my_campaigns(&self) -> Result<Vec<Campaign>, ErrorRecord> {
        let ticket = self.cell.start(MINE);
        let result = self
            .pipeline
            .get("/campaigns/my")
            .await
            .and_then(|payload| normalize::list::<Campaign>(payload, "campaign").map(|page| page.items));
        self.cell.finish(ticket, result, |state, items| {
            state.my_campaigns.clone_from(items);
        })
    }

    /// # Errors
    ///
    /// Returns the classified [`ErrorRecord`] of a failed call.
    pub async fn create_campaign(&self, draft: &CampaignDraft) -> Result<Campaign, ErrorRecord> {
        let ticket = self.cell.start(CURRENT);
        let result = self
            .pipeline
            .post("/campaigns", draft)
            .await
            .and_then(|payload| normalize::one::<Campaign>(payload, "campaign"));
        let created = self.cell.finish(ticket, result, |state, campaign| {
            state.base.current = Some(campaign.clone());
        })?;
        tracing::info!(campaign_id = %created.id, "campaign created");
        self.refetch().await;
        Ok(created)
    }

    /// # Errors
    ///
    /// Returns the classified [`ErrorRecord`] of a failed call.
    pub async fn update_campaign(&self, id: &str, draft: &CampaignDraft) -> Result<Campaign, ErrorRecord> {
        let ticket = self.cell.start(CURRENT);
        let result = self
            .pipeline
            .put(&format!("/campaigns/{}", segment(id)), draft)
            .await
            .and_then(|payload| normalize::one::<Campaign>(payload, "campaign"));
        let updated = self.cell.finish(ticket, result, |state, campaign| {
            state.base.current = Some(campaign.clone());
        })?;
        self.refetch().await;
        Ok(updated)
    }

    /// # Errors
    ///
    /// Returns the classified [`ErrorRecord`] of a failed call.
    pub async fn delete_campaign(&self, id: &str) -> Result<(), ErrorRecord> {
        let ticket = self.cell.start(CURRENT);
        let result = self
            .pipeline
            .delete(&format!("/campaigns/{}", segment(id)))
            .await
            .map(|_| ());
        self.cell.finish(ticket, result, |state, _| {
            if state.base.current.as_ref().is_some_and(|c| c.id == id) {
                state.base.current = None;
            }
        })?;
        tracing::info!(campaign_id = id, "campaign deleted");
        self.refetch().await;
        Ok(())
    }

    async fn load_list(&self, options: RequestOptions) -> Result<Page<Campaign>, ErrorRecord> {
        let ticket = self.cell.start(LIST);
        let result = self
            .pipeline
            .get_with("/campaigns", options)
            .await
            .and_then(|payload| normalize::list::<Campaign>(payload, "campaign"));
        self.cell.finish(ticket, result, |state, page| {
            state.base.items.clone_from(&page.items);
            state.base.pagination = page.pagination;
        })
    }

    /// Reload the last requested list from the network after a mutation.
    async fn refetch(&self) {
        let query = self
            .last_query
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Err(error) = self
            .load_list(RequestOptions::fresh().params(query.to_params()))
            .await
        {
            tracing::warn!(%error, "campaign list refresh after mutation failed");
        }
    }

    fn remember(&self, query: &CampaignQuery) {
        *self.last_query.lock().unwrap_or_else(PoisonError::into_inner) = query.clone();
    }
}
