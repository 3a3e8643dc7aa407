use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Campaign, EntityRef, User};

/// A donation made to a campaign.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Donation {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    pub campaign: EntityRef<Campaign>,
    pub donor: Option<EntityRef<User>>,
    pub amount: f64,
    pub message: Option<String>,
    pub anonymous: bool,
    pub status: String,
    pub created_at: Option<DateTime<Utc>>,
}

impl Donation {
    /// Campaign id whether or not the backend populated the reference.
    #[must_use]
    pub fn campaign_id(&self) -> &str {
        match &self.campaign {
            EntityRef::Populated(campaign) => &campaign.id,
            EntityRef::Id(id) => id,
        }
    }
}

/// Payload for `POST /donations`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DonationDraft {
    pub campaign_id: String,
    pub amount: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub anonymous: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn campaign_id_from_either_reference_shape() {
        let bare: Donation = serde_json::from_str(r#"{"_id":"d1","campaign":"c1","amount":10}"#)
            .unwrap();
        assert_eq!(bare.campaign_id(), "c1");

        let populated: Donation = serde_json::from_str(
            r#"{"_id":"d2","campaign":{"_id":"c2","title":"Food Bank"},"amount":25}"#,
        )
        .unwrap();
        assert_eq!(populated.campaign_id(), "c2");
        assert_eq!(
            populated.campaign.populated().map(|c| c.title.as_str()),
            Some("Food Bank")
        );
    }
}
