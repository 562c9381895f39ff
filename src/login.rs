//! Login challenge construction.
//!
//! The challenge is a zero-fee, zero-gas, zero-sequence amino document whose memo
//! carries the login marker and a JSON stamp of `{ts, address}`. The server verifies
//! the signature against the canonical (key-sorted) encoding of whatever the signer
//! reports as signed.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::config::ChainConfig;
use crate::error::WalletResult;
use crate::models::{Coin, LoginRequest, SignDoc, SignResponse, StdFee};

#[derive(Serialize)]
struct LoginStamp<'a> {
    ts: i64,
    address: &'a str,
}

pub fn build_sign_doc(
    chain: &ChainConfig,
    address: &str,
    now: DateTime<Utc>,
) -> WalletResult<SignDoc> {
    let stamp = serde_json::to_string(&LoginStamp {
        ts: now.timestamp_millis(),
        address,
    })?;
    let memo = format!("{}: {}", chain.login_message, stamp);

    Ok(SignDoc {
        chain_id: chain.chain_id.clone(),
        memo,
        msgs: Vec::new(),
        fee: StdFee {
            gas: "0".to_string(),
            amount: vec![Coin {
                denom: chain.min_denom.clone(),
                amount: "0".to_string(),
            }],
        },
        sequence: "0".to_string(),
        account_number: "0".to_string(),
    })
}

pub fn build_login_request(address: &str, response: &SignResponse) -> WalletResult<LoginRequest> {
    Ok(LoginRequest {
        signature: response.signature.signature.clone(),
        public_key: response.signature.pub_key.value.clone(),
        message: canonical_json(&response.signed)?,
        from: address.to_string(),
    })
}

/// Serializes with object keys sorted at every depth, independent of map ordering features.
pub fn canonical_json(value: &Value) -> WalletResult<String> {
    Ok(serde_json::to_string(&sort_keys(value))?)
}

fn sort_keys(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            let mut sorted = Map::with_capacity(entries.len());
            for (key, inner) in entries {
                sorted.insert(key.clone(), sort_keys(inner));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(sort_keys).collect()),
        other => other.clone(),
    }
}
