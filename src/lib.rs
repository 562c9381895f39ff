//! Wallet session, followee and NFT event feed state for the Liker Land client.

pub mod api;
pub mod config;
pub mod connector;
pub mod enrich;
pub mod error;
pub mod feed;
pub mod login;
pub mod models;
pub mod state;
pub mod store;
pub mod telemetry;

#[cfg(test)]
mod testing;

pub use api::{EventQuery, HttpWalletApi, WalletApi};
pub use config::WalletConfig;
pub use connector::{Connection, Connector, ConnectorFactory, Signer, WatchOnlyConnector};
pub use error::{WalletError, WalletResult};
pub use models::{EventType, NftEvent};
pub use store::{WalletStore, WalletStoreBuilder};
