use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{EntityRef, User};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CampaignStatus {
    #[default]
    Active,
    Draft,
    Completed,
    Cancelled,
    #[serde(other)]
    Other,
}

/// A fundraising campaign.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Campaign {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    pub title: String,
    pub description: String,
    pub category: String,
    pub goal_amount: f64,
    pub raised_amount: f64,
    pub image: Option<String>,
    pub status: CampaignStatus,
    pub featured: bool,
    pub end_date: Option<DateTime<Utc>>,
    pub created_by: Option<EntityRef<User>>,
}

impl Campaign {
    /// Funding progress in percent, capped at 100.
    #[must_use]
    pub fn progress_percent(&self) -> f64 {
        if self.goal_amount <= 0.0 {
            return 0.0;
        }
        (self.raised_amount / self.goal_amount * 100.0).min(100.0)
    }
}

/// Create/update payload for a campaign.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignDraft {
    pub title: String,
    pub description: String,
    pub category: String,
    pub goal_amount: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<DateTime<Utc>>,
}

/// List filters for `GET /campaigns`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CampaignQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub category: Option<String>,
    pub search: Option<String>,
    pub status: Option<String>,
}

impl CampaignQuery {
    /// Query parameters with unset filters omitted.
    #[must_use]
    pub fn to_params(&self) -> BTreeMap<String, String> {
        let mut params = BTreeMap::new();
        if let Some(page) = self.page {
            params.insert("page".to_string(), page.to_string());
        }
        if let Some(limit) = self.limit {
            params.insert("limit".to_string(), limit.to_string());
        }
        let text = [
            ("category", &self.category),
            ("search", &self.search),
            ("status", &self.status),
        ];
        for (key, value) in text {
            if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
                params.insert(key.to_string(), value.to_string());
            }
        }
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn deserializes_backend_document() {
        let json = r#"{
            "_id": "c1",
            "title": "Clean Water",
            "goalAmount": 5000,
            "raisedAmount": 1250.5,
            "featured": true,
            "createdBy": "u9"
        }"#;
        let campaign: Campaign = serde_json::from_str(json).unwrap();
        assert_eq!(campaign.id, "c1");
        assert_eq!(campaign.title, "Clean Water");
        assert_eq!(campaign.status, CampaignStatus::Active);
        assert_eq!(campaign.created_by, Some(EntityRef::Id("u9".into())));
        assert!(campaign.featured);
    }

    #[test]
    fn progress_is_capped() {
        let campaign = Campaign {
            goal_amount: 100.0,
            raised_amount: 250.0,
            ..Default::default()
        };
        assert!((campaign.progress_percent() - 100.0).abs() < f64::EPSILON);
        assert!(Campaign::default().progress_percent().abs() < f64::EPSILON);
    }

    #[test]
    fn query_omits_empty_filters() {
        let query = CampaignQuery {
            page: Some(2),
            category: Some(String::new()),
            search: Some("water".into()),
            ..Default::default()
        };
        let params = query.to_params();
        assert_eq!(params.len(), 2);
        assert_eq!(params.get("page").map(String::as_str), Some("2"));
        assert_eq!(params.get("search").map(String::as_str), Some("water"));
    }
}
