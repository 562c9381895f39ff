//! Wallet store error types.

use thiserror::Error;

/// Message the wallet signer reports when the user dismisses a signature request.
pub const REQUEST_REJECTED_MESSAGE: &str = "Request rejected";

/// Errors surfaced by wallet store actions.
///
/// Cloneable so a single in-flight balance request can hand the same outcome to
/// every caller awaiting it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WalletError {
    /// Transport or server failure from a backend call.
    #[error("{endpoint} failed{}: {message}", status_suffix(status))]
    Api {
        endpoint: String,
        status: Option<u16>,
        message: String,
    },

    /// Response body did not match the expected shape.
    #[error("Failed to decode {endpoint} response: {message}")]
    Decode { endpoint: String, message: String },

    /// External signer failure.
    #[error("Signer error: {0}")]
    Signer(String),

    /// Wallet connector failure.
    #[error("Connector error: {0}")]
    Connector(String),

    /// No wallet is connected.
    #[error("Wallet not connected")]
    NotConnected,

    /// An event carried a timestamp that is not RFC 3339.
    #[error("Invalid timestamp {value:?} on transaction {tx_hash}")]
    InvalidTimestamp { tx_hash: String, value: String },

    /// Canonical JSON encoding failed.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl WalletError {
    pub fn api(
        endpoint: impl Into<String>,
        status: Option<u16>,
        message: impl Into<String>,
    ) -> Self {
        Self::Api {
            endpoint: endpoint.into(),
            status,
            message: message.into(),
        }
    }

    /// True when the user declined the signature prompt.
    pub fn is_user_rejection(&self) -> bool {
        matches!(self, Self::Signer(message) if message == REQUEST_REJECTED_MESSAGE)
    }
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" with status {s}")).unwrap_or_default()
}

impl From<serde_json::Error> for WalletError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Result type for wallet store operations.
pub type WalletResult<T> = Result<T, WalletError>;
