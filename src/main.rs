use std::sync::Arc;

use anyhow::{Context, Result, bail};
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use wallet_store::connector::Connector;
use wallet_store::{HttpWalletApi, NftEvent, WalletConfig, WalletStore, WatchOnlyConnector};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FeedReport {
    address: String,
    balance_like: Option<f64>,
    latest_event_timestamp: Option<i64>,
    events: Vec<NftEvent>,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let address = wallet_address()?;
    let config = WalletConfig::load().context("Failed to load configuration")?;
    let api = HttpWalletApi::new(&config).context("Failed to initialize wallet API client")?;

    let watched = address.clone();
    let connectors =
        move || Arc::new(WatchOnlyConnector::new(watched.clone())) as Arc<dyn Connector>;
    let store = WalletStore::builder(config, Arc::new(api), Arc::new(connectors)).build();

    if !store.restore_session().await {
        bail!("No usable account for {address}");
    }
    info!(address = %address, events = store.events().len(), "Wallet feed loaded");

    let balance_like = match store.fetch_like_balance().await {
        Ok(balance) => Some(balance.as_like()),
        Err(err) => {
            warn!(address = %address, "Balance unavailable: {err}");
            None
        }
    };

    let report = FeedReport {
        address,
        balance_like,
        latest_event_timestamp: store.latest_event_timestamp(),
        events: store.events(),
    };
    println!(
        "{}",
        serde_json::to_string_pretty(&report).context("Failed to encode feed report")?
    );

    store.shutdown();
    Ok(())
}

fn wallet_address() -> Result<String> {
    let address = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("WALLET_ADDRESS").ok())
        .context("Usage: wallet-feed <address> (or set WALLET_ADDRESS)")?;
    if address.trim().is_empty() {
        bail!("Wallet address must be non-empty");
    }
    Ok(address.trim().to_string())
}

fn init_tracing() {
    let default_filter = "info";
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| default_filter.to_string());
    assert!(!filter.is_empty(), "Tracing filter must not be empty");
    assert!(filter.len() < 256, "Tracing filter length exceeds bounds");

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}
