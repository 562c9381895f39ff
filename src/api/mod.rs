//! Backend collaborators: the Liker Land REST API and the chain event/bank endpoints.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::WalletResult;
use crate::models::{
    ClassMetadata, LikeBalance, LikerProfile, LoginRequest, RawNftEvent, SaleRecord,
    SessionUserInfo,
};

mod http;

pub use http::HttpWalletApi;

#[async_trait]
pub trait WalletApi: Send + Sync {
    async fn profile_by_address(&self, address: &str) -> WalletResult<LikerProfile>;

    /// `None` when the server has a session cookie but no user record for it.
    async fn session_user_info(&self) -> WalletResult<Option<SessionUserInfo>>;

    async fn login(&self, request: &LoginRequest) -> WalletResult<()>;

    async fn logout(&self) -> WalletResult<()>;

    async fn followees(&self) -> WalletResult<Vec<String>>;

    async fn add_followee(&self, creator: &str) -> WalletResult<()>;

    async fn remove_followee(&self, creator: &str) -> WalletResult<()>;

    async fn post_wallet_email(&self, email: &str) -> WalletResult<()>;

    async fn verify_wallet_email(&self, wallet: &str, token: &str) -> WalletResult<()>;

    async fn nft_events(&self, query: &EventQuery) -> WalletResult<Vec<RawNftEvent>>;

    async fn balance(&self, address: &str) -> WalletResult<LikeBalance>;

    /// Sale records for one class/transaction pair, keyed by transaction hash.
    async fn sale_history(
        &self,
        class_id: &str,
        tx_hash: &str,
    ) -> WalletResult<HashMap<String, SaleRecord>>;

    async fn class_metadata(&self, class_id: &str) -> WalletResult<ClassMetadata>;
}

/// Parameters of the chain NFT event search.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventQuery {
    pub involver: Option<String>,
    pub senders: Vec<String>,
    pub action_type: Option<String>,
    pub ignore_to_list: Vec<String>,
    pub limit: usize,
    pub reverse: bool,
}

impl EventQuery {
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::with_capacity(4 + self.senders.len() + self.ignore_to_list.len());
        if let Some(involver) = &self.involver {
            pairs.push(("involver", involver.clone()));
        }
        for sender in &self.senders {
            pairs.push(("sender", sender.clone()));
        }
        if let Some(action_type) = &self.action_type {
            pairs.push(("action_type", action_type.clone()));
        }
        for ignored in &self.ignore_to_list {
            pairs.push(("ignore_to_list", ignored.clone()));
        }
        pairs.push(("limit", self.limit.to_string()));
        pairs.push(("reverse", self.reverse.to_string()));
        pairs
    }
}
