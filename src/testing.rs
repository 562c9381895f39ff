//! In-memory collaborators for store tests.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::{Semaphore, oneshot};

use crate::api::{EventQuery, WalletApi};
use crate::config::WalletConfig;
use crate::connector::{Account, Connection, Connector, PageVisibility, Signer};
use crate::error::{WalletError, WalletResult};
use crate::models::{
    ACTION_MSG_SEND, ClassMetadata, LikeBalance, LikerProfile, LoginRequest, PubKey, RawNftEvent,
    SaleRecord, SessionUserInfo, SignDoc, SignResponse, StdSignature,
};
use crate::store::WalletStore;
use crate::telemetry::SessionLogger;

pub const PLATFORM_WALLET: &str = "like1platform";

pub fn test_config() -> WalletConfig {
    let source = format!(
        r#"
        [api]
        base_url = "http://127.0.0.1:1"
        chain_api_url = "http://127.0.0.1:2"

        [chain]
        chain_id = "likecoin-testnet"
        login_message = "Login - Reinventing the Like"
        platform_wallet = "{PLATFORM_WALLET}"

        [enrichment]
        queue_capacity = 64
        "#
    );
    WalletConfig::from_toml(&source).expect("test config is valid")
}

pub fn raw_event(tx_hash: &str, sender: &str, receiver: &str, timestamp: &str) -> RawNftEvent {
    RawNftEvent {
        tx_hash: tx_hash.to_string(),
        class_id: "likenft1class".to_string(),
        nft_id: "nft-1".to_string(),
        sender: sender.to_string(),
        receiver: receiver.to_string(),
        action: ACTION_MSG_SEND.to_string(),
        timestamp: timestamp.to_string(),
    }
}

/// Polls until the condition holds, yielding to spawned tasks in between.
pub async fn eventually(mut condition: impl FnMut() -> bool) {
    for _ in 0..400 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition not met within two seconds");
}

#[derive(Default)]
pub struct FakeApi {
    calls: Mutex<HashMap<String, usize>>,
    failures: Mutex<HashSet<String>>,
    gates: Mutex<HashMap<String, Arc<Semaphore>>>,
    followees: Mutex<Vec<String>>,
    session: Mutex<Option<SessionUserInfo>>,
    involver_events: Mutex<Vec<RawNftEvent>>,
    mint_events: Mutex<Vec<RawNftEvent>>,
    sales: Mutex<Vec<SaleRecord>>,
    balance: Mutex<u128>,
    balances: Mutex<HashMap<String, u128>>,
    queries: Mutex<Vec<EventQuery>>,
    logins: Mutex<Vec<LoginRequest>>,
}

impl FakeApi {
    pub fn calls(&self, name: &str) -> usize {
        self.calls.lock().get(name).copied().unwrap_or(0)
    }

    pub fn reset_calls(&self) {
        self.calls.lock().clear();
        self.queries.lock().clear();
    }

    pub fn fail(&self, name: &str) {
        self.failures.lock().insert(name.to_string());
    }

    pub fn clear_failure(&self, name: &str) {
        self.failures.lock().remove(name);
    }

    /// Parks every call to `name` until [`FakeApi::release`].
    pub fn hold(&self, name: &str) {
        self.gates
            .lock()
            .insert(name.to_string(), Arc::new(Semaphore::new(0)));
    }

    /// Lets the oldest parked call to `name` through.
    pub fn admit(&self, name: &str) {
        if let Some(gate) = self.gates.lock().get(name) {
            gate.add_permits(1);
        }
    }

    pub fn release(&self, name: &str) {
        if let Some(gate) = self.gates.lock().remove(name) {
            gate.close();
        }
    }

    pub fn set_followees(&self, followees: &[&str]) {
        *self.followees.lock() = followees.iter().map(|f| f.to_string()).collect();
    }

    pub fn set_session(&self, session: Option<SessionUserInfo>) {
        *self.session.lock() = session;
    }

    pub fn push_involver_event(&self, event: RawNftEvent) {
        self.involver_events.lock().push(event);
    }

    pub fn push_transfer(&self, tx_hash: &str, sender: &str, receiver: &str, timestamp: &str) {
        self.push_involver_event(raw_event(tx_hash, sender, receiver, timestamp));
    }

    pub fn push_mint_event(&self, event: RawNftEvent) {
        self.mint_events.lock().push(event);
    }

    pub fn clear_events(&self) {
        self.involver_events.lock().clear();
        self.mint_events.lock().clear();
    }

    pub fn add_sale(&self, record: SaleRecord) {
        self.sales.lock().push(record);
    }

    pub fn set_balance(&self, amount: u128) {
        *self.balance.lock() = amount;
    }

    pub fn set_balance_of(&self, address: &str, amount: u128) {
        self.balances.lock().insert(address.to_string(), amount);
    }

    pub fn event_queries(&self) -> Vec<EventQuery> {
        self.queries.lock().clone()
    }

    pub fn last_login(&self) -> Option<LoginRequest> {
        self.logins.lock().last().cloned()
    }

    async fn enter(&self, name: &str) -> WalletResult<()> {
        *self.calls.lock().entry(name.to_string()).or_default() += 1;
        let gate = self.gates.lock().get(name).cloned();
        if let Some(gate) = gate {
            if let Ok(permit) = gate.acquire().await {
                permit.forget();
            }
        }
        if self.failures.lock().contains(name) {
            return Err(WalletError::api(name, Some(500), "injected failure"));
        }
        Ok(())
    }
}

#[async_trait]
impl WalletApi for FakeApi {
    async fn profile_by_address(&self, address: &str) -> WalletResult<LikerProfile> {
        self.enter("profile_by_address").await?;
        Ok(LikerProfile {
            user: Some(address.to_string()),
            ..LikerProfile::default()
        })
    }

    async fn session_user_info(&self) -> WalletResult<Option<SessionUserInfo>> {
        self.enter("session_user_info").await?;
        Ok(self.session.lock().clone())
    }

    async fn login(&self, request: &LoginRequest) -> WalletResult<()> {
        self.enter("login").await?;
        self.logins.lock().push(request.clone());
        Ok(())
    }

    async fn logout(&self) -> WalletResult<()> {
        self.enter("logout").await
    }

    async fn followees(&self) -> WalletResult<Vec<String>> {
        self.enter("followees").await?;
        Ok(self.followees.lock().clone())
    }

    async fn add_followee(&self, _creator: &str) -> WalletResult<()> {
        self.enter("add_followee").await
    }

    async fn remove_followee(&self, _creator: &str) -> WalletResult<()> {
        self.enter("remove_followee").await
    }

    async fn post_wallet_email(&self, _email: &str) -> WalletResult<()> {
        self.enter("post_wallet_email").await
    }

    async fn verify_wallet_email(&self, _wallet: &str, _token: &str) -> WalletResult<()> {
        self.enter("verify_wallet_email").await
    }

    async fn nft_events(&self, query: &EventQuery) -> WalletResult<Vec<RawNftEvent>> {
        self.enter("nft_events").await?;
        self.queries.lock().push(query.clone());
        let source = if query.involver.is_some() {
            &self.involver_events
        } else {
            &self.mint_events
        };
        Ok(source.lock().clone())
    }

    async fn balance(&self, address: &str) -> WalletResult<LikeBalance> {
        self.enter("balance").await?;
        assert!(!address.is_empty());
        let amount = self
            .balances
            .lock()
            .get(address)
            .copied()
            .unwrap_or(*self.balance.lock());
        Ok(LikeBalance {
            denom: "nanolike".to_string(),
            amount,
        })
    }

    async fn sale_history(
        &self,
        class_id: &str,
        tx_hash: &str,
    ) -> WalletResult<HashMap<String, SaleRecord>> {
        self.enter("sale_history").await?;
        Ok(self
            .sales
            .lock()
            .iter()
            .filter(|record| record.class_id == class_id && record.tx_hash == tx_hash)
            .map(|record| (record.tx_hash.clone(), record.clone()))
            .collect())
    }

    async fn class_metadata(&self, class_id: &str) -> WalletResult<ClassMetadata> {
        self.enter("class_metadata").await?;
        Ok(ClassMetadata {
            id: class_id.to_string(),
            ..ClassMetadata::default()
        })
    }
}

#[derive(Default)]
pub struct FakeSigner {
    pub calls: AtomicUsize,
    failure: Mutex<Option<String>>,
}

impl FakeSigner {
    pub fn fail_with(&self, message: &str) {
        *self.failure.lock() = Some(message.to_string());
    }
}

#[async_trait]
impl Signer for FakeSigner {
    async fn sign(&self, _address: &str, doc: &SignDoc) -> WalletResult<SignResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = self.failure.lock().clone() {
            return Err(WalletError::Signer(message));
        }
        Ok(SignResponse {
            signed: serde_json::to_value(doc)?,
            signature: StdSignature {
                signature: "c2lnbmF0dXJl".to_string(),
                pub_key: PubKey {
                    key_type: "tendermint/PubKeySecp256k1".to_string(),
                    value: "cHVia2V5".to_string(),
                },
            },
        })
    }
}

#[derive(Default)]
pub struct FakeConnector {
    pub disconnects: AtomicUsize,
    pub subscriptions: AtomicUsize,
    listeners: Mutex<Vec<oneshot::Sender<String>>>,
    restore: Mutex<Option<Connection>>,
    init_if_necessary: Mutex<Option<Connection>>,
    on_init: Mutex<Option<Connection>>,
}

impl FakeConnector {
    pub fn set_restore(&self, connection: Connection) {
        *self.restore.lock() = Some(connection);
    }

    pub fn set_init_if_necessary(&self, connection: Connection) {
        *self.init_if_necessary.lock() = Some(connection);
    }

    pub fn set_on_init(&self, connection: Connection) {
        *self.on_init.lock() = Some(connection);
    }

    /// Subscriptions whose receiving side is still alive.
    pub fn open_subscriptions(&self) -> usize {
        self.listeners
            .lock()
            .iter()
            .filter(|sender| !sender.is_closed())
            .count()
    }

    /// Notifies every live subscriber. Returns whether anyone was listening.
    pub fn fire_account_change(&self, method: &str) -> bool {
        let listeners = std::mem::take(&mut *self.listeners.lock());
        let mut delivered = false;
        for sender in listeners {
            delivered |= sender.send(method.to_string()).is_ok();
        }
        delivered
    }
}

#[async_trait]
impl Connector for FakeConnector {
    async fn open_selection_dialog(
        &self,
        _language: Option<&str>,
    ) -> WalletResult<Option<Connection>> {
        Ok(self.on_init.lock().clone())
    }

    fn restore_session(&self) -> Option<Connection> {
        self.restore.lock().clone()
    }

    async fn init_if_necessary(&self) -> WalletResult<Option<Connection>> {
        Ok(self.init_if_necessary.lock().clone())
    }

    async fn init(&self, _method: &str) -> WalletResult<Option<Connection>> {
        Ok(self.on_init.lock().clone())
    }

    fn disconnect(&self) {
        self.disconnects.fetch_add(1, Ordering::SeqCst);
    }

    fn once_account_change(&self) -> oneshot::Receiver<String> {
        self.subscriptions.fetch_add(1, Ordering::SeqCst);
        let (sender, receiver) = oneshot::channel();
        self.listeners.lock().push(sender);
        receiver
    }
}

#[derive(Default)]
pub struct FakeVisibility {
    pub hidden: AtomicBool,
}

impl PageVisibility for FakeVisibility {
    fn is_hidden(&self) -> bool {
        self.hidden.load(Ordering::SeqCst)
    }
}

#[derive(Default)]
pub struct RecordingLogger {
    users: Mutex<Vec<(String, Option<String>)>>,
}

impl RecordingLogger {
    pub fn users(&self) -> Vec<(String, Option<String>)> {
        self.users.lock().clone()
    }
}

#[async_trait]
impl SessionLogger for RecordingLogger {
    async fn set_user(&self, wallet: &str, method: Option<&str>) {
        self.users
            .lock()
            .push((wallet.to_string(), method.map(str::to_string)));
    }
}

/// A store wired to fakes, plus handles on each fake.
pub struct Harness {
    pub store: WalletStore,
    pub api: Arc<FakeApi>,
    pub signer: Arc<FakeSigner>,
    pub connector: Arc<FakeConnector>,
    pub visibility: Arc<FakeVisibility>,
    pub logger: Arc<RecordingLogger>,
}

impl Harness {
    pub fn new() -> Self {
        let api = Arc::new(FakeApi::default());
        let signer = Arc::new(FakeSigner::default());
        let connector = Arc::new(FakeConnector::default());
        let visibility = Arc::new(FakeVisibility::default());
        let logger = Arc::new(RecordingLogger::default());

        let factory_connector = connector.clone();
        let factory = move || factory_connector.clone() as Arc<dyn Connector>;
        let store = WalletStore::builder(test_config(), api.clone(), Arc::new(factory))
            .session_logger(logger.clone())
            .visibility(visibility.clone())
            .build();

        Self {
            store,
            api,
            signer,
            connector,
            visibility,
            logger,
        }
    }

    pub fn signing_connection(&self, address: &str) -> Connection {
        Connection {
            method: Some("keplr".to_string()),
            accounts: vec![Account::bech32(address)],
            signer: Some(self.signer.clone() as Arc<dyn Signer>),
        }
    }
}
