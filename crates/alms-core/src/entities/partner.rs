use serde::{Deserialize, Serialize};

/// A business listed in the partner directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Partner {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    pub name: String,
    pub category: String,
    pub logo: Option<String>,
    pub website: Option<String>,
    pub description: Option<String>,
}
