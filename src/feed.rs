//! Event feed building blocks: classification, normalization, merging and ordering.
//!
//! Everything here is pure; the store drives the network side and commits the result.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};

use crate::error::{WalletError, WalletResult};
use crate::models::{
    ACTION_MSG_SEND, ACTION_NEW_CLASS, EventKey, EventType, NftEvent, RawNftEvent, SaleRecord,
};

/// Classifies an event from the viewer's point of view. First matching rule wins.
pub fn classify(event: &RawNftEvent, viewer: &str, platform_wallet: &str) -> EventType {
    if event.action == ACTION_NEW_CLASS {
        EventType::MintNft
    } else if event.sender == platform_wallet {
        if event.receiver == viewer {
            EventType::PurchaseNft
        } else {
            EventType::NftSale
        }
    } else if event.receiver == viewer {
        EventType::ReceiveNft
    } else if event.sender == viewer {
        EventType::SendNft
    } else {
        EventType::TransferNft
    }
}

pub fn normalize(raw: RawNftEvent, viewer: &str, platform_wallet: &str) -> WalletResult<NftEvent> {
    let timestamp = parse_timestamp(&raw)?;
    let event_type = classify(&raw, viewer, platform_wallet);
    Ok(NftEvent {
        tx_hash: raw.tx_hash,
        class_id: raw.class_id,
        nft_id: raw.nft_id,
        sender: raw.sender,
        receiver: raw.receiver,
        action: raw.action,
        timestamp,
        event_type,
        price: None,
        granter_memo: None,
    })
}

fn parse_timestamp(raw: &RawNftEvent) -> WalletResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw.timestamp.trim())
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|_| WalletError::InvalidTimestamp {
            tx_hash: raw.tx_hash.clone(),
            value: raw.timestamp.clone(),
        })
}

/// Collapses entries sharing an [`EventKey`]. A later duplicate replaces the earlier
/// one in place, so first-seen order is kept for the survivors.
pub fn merge_events(events: impl IntoIterator<Item = NftEvent>) -> Vec<NftEvent> {
    let mut positions: HashMap<EventKey, usize> = HashMap::new();
    let mut merged: Vec<NftEvent> = Vec::new();
    for event in events {
        match positions.get(&event.key()) {
            Some(&index) => merged[index] = event,
            None => {
                positions.insert(event.key(), merged.len());
                merged.push(event);
            }
        }
    }
    merged
}

/// Transfers the platform wallet made on behalf of a buyer carry a price and memo.
pub fn needs_sale_lookup(event: &NftEvent, platform_wallet: &str) -> bool {
    event.action == ACTION_MSG_SEND && event.sender == platform_wallet
}

pub fn attach_sale(event: &mut NftEvent, records: &HashMap<String, SaleRecord>) {
    if let Some(record) = records.get(&event.tx_hash) {
        event.price = Some(record.price);
        event.granter_memo = record.granter_memo.clone();
    }
}

/// Newest first; equal timestamps keep their relative order.
pub fn sort_newest_first(events: &mut [NftEvent]) {
    events.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
}

/// Distinct non-empty senders and receivers in first-seen order.
pub fn participants(events: &[NftEvent]) -> Vec<String> {
    let mut seen = HashSet::new();
    events
        .iter()
        .flat_map(|event| [event.sender.as_str(), event.receiver.as_str()])
        .filter(|address| !address.is_empty() && seen.insert(*address))
        .map(str::to_string)
        .collect()
}

pub fn class_ids(events: &[NftEvent]) -> Vec<String> {
    let mut seen = HashSet::new();
    events
        .iter()
        .map(|event| event.class_id.as_str())
        .filter(|class_id| !class_id.is_empty() && seen.insert(*class_id))
        .map(str::to_string)
        .collect()
}
