use async_trait::async_trait;
use tracing::info;

/// Receives the wallet identity each time a wallet is initialized.
#[async_trait]
pub trait SessionLogger: Send + Sync {
    async fn set_user(&self, wallet: &str, method: Option<&str>);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSessionLogger;

#[async_trait]
impl SessionLogger for TracingSessionLogger {
    async fn set_user(&self, wallet: &str, method: Option<&str>) {
        info!(wallet = %wallet, method = method.unwrap_or("unknown"), "Wallet session user set");
    }
}
