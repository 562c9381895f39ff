//! Wallet connector collaborators.
//!
//! The connector owns account discovery, transport to the wallet and the signer
//! handle. The store only ever holds these behind trait objects and replaces them
//! wholesale on reconnect.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

use crate::error::WalletResult;
use crate::models::{SignDoc, SignResponse};

/// Connection method reported by watch-only sessions.
pub const WATCH_ONLY_METHOD: &str = "watch_only";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub bech32_address: Option<String>,
}

impl Account {
    pub fn bech32(address: impl Into<String>) -> Self {
        Self {
            address: None,
            bech32_address: Some(address.into()),
        }
    }

    /// Bech32 form when present, falling back to the raw address.
    pub fn wallet_address(&self) -> Option<&str> {
        self.bech32_address
            .as_deref()
            .or(self.address.as_deref())
            .filter(|address| !address.is_empty())
    }
}

#[derive(Clone, Default)]
pub struct Connection {
    pub method: Option<String>,
    pub accounts: Vec<Account>,
    pub signer: Option<Arc<dyn Signer>>,
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("method", &self.method)
            .field("accounts", &self.accounts)
            .field("has_signer", &self.signer.is_some())
            .finish()
    }
}

#[async_trait]
pub trait Signer: Send + Sync {
    async fn sign(&self, address: &str, doc: &SignDoc) -> WalletResult<SignResponse>;
}

#[async_trait]
pub trait Connector: Send + Sync {
    /// Shows the method picker and connects with whatever the user chooses.
    async fn open_selection_dialog(&self, language: Option<&str>)
    -> WalletResult<Option<Connection>>;

    /// Accounts remembered from a previous visit. Never carries a signer.
    fn restore_session(&self) -> Option<Connection>;

    /// Reconnects silently when the wallet allows it.
    async fn init_if_necessary(&self) -> WalletResult<Option<Connection>>;

    /// Connects with a specific method, used after the wallet reports an account switch.
    async fn init(&self, method: &str) -> WalletResult<Option<Connection>>;

    fn disconnect(&self);

    /// Resolves once with the active method when the wallet switches accounts.
    /// A closed channel means no further notifications will arrive.
    fn once_account_change(&self) -> oneshot::Receiver<String>;
}

pub trait ConnectorFactory: Send + Sync {
    fn create(&self) -> Arc<dyn Connector>;
}

impl<F> ConnectorFactory for F
where
    F: Fn() -> Arc<dyn Connector> + Send + Sync,
{
    fn create(&self) -> Arc<dyn Connector> {
        self()
    }
}

/// Foreground probe; signature prompts are never raised from a hidden page.
pub trait PageVisibility: Send + Sync {
    fn is_hidden(&self) -> bool;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysVisible;

impl PageVisibility for AlwaysVisible {
    fn is_hidden(&self) -> bool {
        false
    }
}

/// Connector for a fixed address with no signing capability.
#[derive(Debug, Clone)]
pub struct WatchOnlyConnector {
    address: String,
}

impl WatchOnlyConnector {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
        }
    }

    fn connection(&self) -> Connection {
        Connection {
            method: Some(WATCH_ONLY_METHOD.to_string()),
            accounts: vec![Account::bech32(self.address.clone())],
            signer: None,
        }
    }
}

#[async_trait]
impl Connector for WatchOnlyConnector {
    async fn open_selection_dialog(
        &self,
        _language: Option<&str>,
    ) -> WalletResult<Option<Connection>> {
        Ok(Some(self.connection()))
    }

    fn restore_session(&self) -> Option<Connection> {
        Some(self.connection())
    }

    async fn init_if_necessary(&self) -> WalletResult<Option<Connection>> {
        Ok(Some(self.connection()))
    }

    async fn init(&self, _method: &str) -> WalletResult<Option<Connection>> {
        Ok(Some(self.connection()))
    }

    fn disconnect(&self) {}

    fn once_account_change(&self) -> oneshot::Receiver<String> {
        let (_tx, rx) = oneshot::channel();
        rx
    }
}
