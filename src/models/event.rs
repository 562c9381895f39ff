use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Action recorded when a creator mints a new NFT class.
pub const ACTION_NEW_CLASS: &str = "new_class";

/// Action recorded for NFT transfers.
pub const ACTION_MSG_SEND: &str = "/cosmos.nft.v1beta1.MsgSend";

/// NFT event as returned by the chain event search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawNftEvent {
    pub tx_hash: String,
    pub class_id: String,
    #[serde(default)]
    pub nft_id: String,
    #[serde(default)]
    pub sender: String,
    #[serde(default)]
    pub receiver: String,
    pub action: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    MintNft,
    PurchaseNft,
    NftSale,
    ReceiveNft,
    SendNft,
    TransferNft,
}

impl EventType {
    /// Kinds that count toward the unseen notification badge.
    pub fn is_notification(&self) -> bool {
        matches!(self, Self::NftSale | Self::ReceiveNft)
    }
}

/// Feed entry after timestamp parsing, classification and sale enrichment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NftEvent {
    pub tx_hash: String,
    pub class_id: String,
    pub nft_id: String,
    pub sender: String,
    pub receiver: String,
    pub action: String,
    pub timestamp: DateTime<Utc>,
    pub event_type: EventType,
    pub price: Option<f64>,
    pub granter_memo: Option<String>,
}

impl NftEvent {
    pub fn key(&self) -> EventKey {
        EventKey {
            tx_hash: self.tx_hash.clone(),
            class_id: self.class_id.clone(),
            nft_id: self.nft_id.clone(),
            event_type: self.event_type,
        }
    }

    pub fn timestamp_millis(&self) -> i64 {
        self.timestamp.timestamp_millis()
    }
}

/// Identity of a feed entry; two events with equal keys are the same entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EventKey {
    pub tx_hash: String,
    pub class_id: String,
    pub nft_id: String,
    pub event_type: EventType,
}
