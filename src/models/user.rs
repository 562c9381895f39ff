use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Session record returned by the self-info endpoint. Absent fields leave state untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUserInfo {
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub email_unconfirmed: Option<String>,
    #[serde(default)]
    pub event_last_seen_ts: Option<i64>,
}

/// Public Liker profile looked up by wallet address.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikerProfile {
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassMetadata {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub uri: String,
    #[serde(default)]
    pub data: Value,
}

/// Price and memo of a platform-mediated sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleRecord {
    pub tx_hash: String,
    pub class_id: String,
    pub price: f64,
    #[serde(default)]
    pub granter_memo: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LikeBalance {
    pub denom: String,
    /// Amount in the chain's minimal denomination.
    pub amount: u128,
}

impl LikeBalance {
    const NANO_PER_LIKE: f64 = 1_000_000_000.0;

    pub fn as_like(&self) -> f64 {
        self.amount as f64 / Self::NANO_PER_LIKE
    }
}
