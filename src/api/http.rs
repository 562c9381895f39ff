use std::collections::HashMap;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::{EventQuery, WalletApi};
use crate::config::WalletConfig;
use crate::error::{WalletError, WalletResult};
use crate::models::{
    ClassMetadata, LikeBalance, LikerProfile, LoginRequest, RawNftEvent, SaleRecord,
    SessionUserInfo,
};

/// REST client for the Liker Land backend and the chain endpoints it sits beside.
///
/// Holds a cookie store so the session established by `login` rides along on every
/// later call.
#[derive(Clone)]
pub struct HttpWalletApi {
    inner: Client,
    base_url: String,
    chain_api_url: String,
    min_denom: String,
    timeout: Duration,
}

impl HttpWalletApi {
    pub fn new(config: &WalletConfig) -> Result<Self> {
        let timeout = config.api.request_timeout();
        assert!(
            timeout >= Duration::from_millis(100),
            "Timeout below 100ms is unsafe"
        );

        let client = Client::builder()
            .timeout(timeout)
            .cookie_store(true)
            .build()
            .with_context(|| format!("Failed to build HTTP client for {}", config.api.base_url))?;

        Ok(Self {
            inner: client,
            base_url: config.api.base_url.trim_end_matches('/').to_string(),
            chain_api_url: config.api.chain_api_url.trim_end_matches('/').to_string(),
            min_denom: config.chain.min_denom.clone(),
            timeout,
        })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn api(&self, method: Method, path: &str) -> (RequestBuilder, String) {
        let url = format!("{}{}", self.base_url, path);
        (self.inner.request(method.clone(), &url), format!("{method} {path}"))
    }

    fn chain(&self, method: Method, path: &str) -> (RequestBuilder, String) {
        let url = format!("{}{}", self.chain_api_url, path);
        (self.inner.request(method.clone(), &url), format!("{method} {path}"))
    }

    async fn send(request: RequestBuilder, endpoint: &str) -> WalletResult<Response> {
        let response = request
            .send()
            .await
            .map_err(|err| WalletError::api(endpoint, None, err.to_string()))?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        debug!(%endpoint, status = status.as_u16(), "Request rejected by server");
        Err(WalletError::api(
            endpoint,
            Some(status.as_u16()),
            if body.is_empty() {
                status.to_string()
            } else {
                body
            },
        ))
    }

    async fn send_json<T: DeserializeOwned>(
        request: RequestBuilder,
        endpoint: &str,
    ) -> WalletResult<T> {
        let response = Self::send(request, endpoint).await?;
        response.json::<T>().await.map_err(|err| WalletError::Decode {
            endpoint: endpoint.to_string(),
            message: err.to_string(),
        })
    }

    async fn send_empty(request: RequestBuilder, endpoint: &str) -> WalletResult<()> {
        Self::send(request, endpoint).await.map(|_| ())
    }
}

#[async_trait]
impl WalletApi for HttpWalletApi {
    async fn profile_by_address(&self, address: &str) -> WalletResult<LikerProfile> {
        let (request, endpoint) = self.api(Method::GET, &format!("/users/addr/{address}/min"));
        Self::send_json(request, &endpoint).await
    }

    async fn session_user_info(&self) -> WalletResult<Option<SessionUserInfo>> {
        let (request, endpoint) = self.api(Method::GET, "/v2/users/self");
        let response = Self::send(request, &endpoint).await?;
        let body = response
            .text()
            .await
            .map_err(|err| WalletError::api(&endpoint, None, err.to_string()))?;
        if body.trim().is_empty() {
            return Ok(None);
        }
        serde_json::from_str(&body).map_err(|err| WalletError::Decode {
            endpoint,
            message: err.to_string(),
        })
    }

    async fn login(&self, request: &LoginRequest) -> WalletResult<()> {
        let (builder, endpoint) = self.api(Method::POST, "/v2/users/login");
        Self::send_empty(builder.json(request), &endpoint).await
    }

    async fn logout(&self) -> WalletResult<()> {
        let (request, endpoint) = self.api(Method::POST, "/v2/users/logout");
        Self::send_empty(request, &endpoint).await
    }

    async fn followees(&self) -> WalletResult<Vec<String>> {
        let (request, endpoint) = self.api(Method::GET, "/v2/users/followees");
        let response: FolloweesResponse = Self::send_json(request, &endpoint).await?;
        Ok(response.followees)
    }

    async fn add_followee(&self, creator: &str) -> WalletResult<()> {
        let (request, endpoint) = self.api(Method::POST, "/v2/users/followees");
        Self::send_empty(request.query(&[("creator", creator)]), &endpoint).await
    }

    async fn remove_followee(&self, creator: &str) -> WalletResult<()> {
        let (request, endpoint) = self.api(Method::DELETE, "/v2/users/followees");
        Self::send_empty(request.query(&[("creator", creator)]), &endpoint).await
    }

    async fn post_wallet_email(&self, email: &str) -> WalletResult<()> {
        let (request, endpoint) = self.api(Method::POST, "/v2/users/email");
        Self::send_empty(request.query(&[("email", email)]), &endpoint).await
    }

    async fn verify_wallet_email(&self, wallet: &str, token: &str) -> WalletResult<()> {
        let (request, endpoint) = self.api(Method::PUT, "/v2/users/email");
        Self::send_empty(
            request.query(&[("wallet", wallet), ("token", token)]),
            &endpoint,
        )
        .await
    }

    async fn nft_events(&self, query: &EventQuery) -> WalletResult<Vec<RawNftEvent>> {
        let (request, endpoint) = self.chain(Method::GET, "/likechain/likenft/v1/event");
        let response: EventsResponse =
            Self::send_json(request.query(&query.to_query_pairs()), &endpoint).await?;
        Ok(response.events)
    }

    async fn balance(&self, address: &str) -> WalletResult<LikeBalance> {
        let (request, endpoint) = self.chain(
            Method::GET,
            &format!("/cosmos/bank/v1beta1/balances/{address}/by_denom"),
        );
        let response: BalanceResponse =
            Self::send_json(request.query(&[("denom", self.min_denom.as_str())]), &endpoint)
                .await?;
        let amount = response.balance.amount.parse::<u128>().map_err(|err| {
            WalletError::Decode {
                endpoint: endpoint.clone(),
                message: format!("balance amount {:?}: {err}", response.balance.amount),
            }
        })?;
        Ok(LikeBalance {
            denom: response.balance.denom,
            amount,
        })
    }

    async fn sale_history(
        &self,
        class_id: &str,
        tx_hash: &str,
    ) -> WalletResult<HashMap<String, SaleRecord>> {
        let (request, endpoint) = self.api(Method::GET, "/nft/history");
        let response: SaleHistoryResponse = Self::send_json(
            request.query(&[("class_id", class_id), ("tx_hash", tx_hash)]),
            &endpoint,
        )
        .await?;
        Ok(response
            .list
            .into_iter()
            .map(|record| (record.tx_hash.clone(), record))
            .collect())
    }

    async fn class_metadata(&self, class_id: &str) -> WalletResult<ClassMetadata> {
        let (request, endpoint) =
            self.chain(Method::GET, &format!("/cosmos/nft/v1beta1/classes/{class_id}"));
        let response: ClassResponse = Self::send_json(request, &endpoint).await?;
        Ok(response.class)
    }
}

#[derive(Debug, Deserialize)]
struct FolloweesResponse {
    #[serde(default)]
    followees: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct EventsResponse {
    #[serde(default)]
    events: Vec<RawNftEvent>,
}

#[derive(Debug, Deserialize)]
struct BalanceResponse {
    balance: CoinAmount,
}

#[derive(Debug, Deserialize)]
struct CoinAmount {
    denom: String,
    amount: String,
}

#[derive(Debug, Deserialize)]
struct SaleHistoryResponse {
    #[serde(default)]
    list: Vec<SaleRecord>,
}

#[derive(Debug, Deserialize)]
struct ClassResponse {
    class: ClassMetadata,
}
