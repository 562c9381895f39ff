//! The wallet store: one shared state container plus the actions that drive it.
//!
//! State lives behind a short-lived lock that is never held across an await; every
//! action reads what it needs, suspends on the network or signer, then commits in a
//! single write.

use std::sync::Arc;
use std::sync::atomic::AtomicU64;

use parking_lot::{Mutex, RwLock};
use tokio::task::AbortHandle;

use crate::api::WalletApi;
use crate::config::WalletConfig;
use crate::connector::{AlwaysVisible, Connector, ConnectorFactory, PageVisibility, Signer};
use crate::enrich::Enricher;
use crate::models::{ClassMetadata, LikeBalance, LikerProfile, NftEvent};
use crate::state::{BalanceFuture, LookupCache, WalletState};
use crate::telemetry::{SessionLogger, TracingSessionLogger};

mod balance;
mod feed;
mod followees;
mod session;

#[derive(Clone)]
pub struct WalletStore {
    inner: Arc<StoreInner>,
}

struct StoreInner {
    config: WalletConfig,
    api: Arc<dyn WalletApi>,
    connectors: Arc<dyn ConnectorFactory>,
    logger: Arc<dyn SessionLogger>,
    visibility: Arc<dyn PageVisibility>,
    cache: Arc<LookupCache>,
    enricher: Enricher,
    state: RwLock<WalletState>,
    account_listener: Mutex<Option<AccountListener>>,
    listener_generation: AtomicU64,
    balance_generation: AtomicU64,
}

struct AccountListener {
    generation: u64,
    handle: AbortHandle,
}

pub struct WalletStoreBuilder {
    config: WalletConfig,
    api: Arc<dyn WalletApi>,
    connectors: Arc<dyn ConnectorFactory>,
    logger: Arc<dyn SessionLogger>,
    visibility: Arc<dyn PageVisibility>,
}

impl WalletStoreBuilder {
    pub fn session_logger(mut self, logger: Arc<dyn SessionLogger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn visibility(mut self, visibility: Arc<dyn PageVisibility>) -> Self {
        self.visibility = visibility;
        self
    }

    /// Must run inside a tokio runtime; the enrichment worker is spawned here.
    pub fn build(self) -> WalletStore {
        let cache = Arc::new(LookupCache::new(&self.config.cache));
        let enricher = Enricher::spawn(self.api.clone(), cache.clone(), &self.config.enrichment);
        WalletStore {
            inner: Arc::new(StoreInner {
                config: self.config,
                api: self.api,
                connectors: self.connectors,
                logger: self.logger,
                visibility: self.visibility,
                cache,
                enricher,
                state: RwLock::new(WalletState::default()),
                account_listener: Mutex::new(None),
                listener_generation: AtomicU64::new(0),
                balance_generation: AtomicU64::new(0),
            }),
        }
    }
}

impl WalletStore {
    pub fn builder(
        config: WalletConfig,
        api: Arc<dyn WalletApi>,
        connectors: Arc<dyn ConnectorFactory>,
    ) -> WalletStoreBuilder {
        WalletStoreBuilder {
            config,
            api,
            connectors,
            logger: Arc::new(TracingSessionLogger),
            visibility: Arc::new(AlwaysVisible),
        }
    }

    pub fn config(&self) -> &WalletConfig {
        &self.inner.config
    }

    fn read<R>(&self, f: impl FnOnce(&WalletState) -> R) -> R {
        f(&self.inner.state.read())
    }

    fn write<R>(&self, f: impl FnOnce(&mut WalletState) -> R) -> R {
        f(&mut self.inner.state.write())
    }

    /// Stops background work owned by the store.
    pub fn shutdown(&self) {
        self.cancel_account_listener();
        self.inner.enricher.shutdown();
    }

    pub fn address(&self) -> String {
        self.read(|s| s.address.clone())
    }

    pub fn signer(&self) -> Option<Arc<dyn Signer>> {
        self.read(|s| s.signer.clone())
    }

    /// The connector currently held, without creating one.
    pub fn current_connector(&self) -> Option<Arc<dyn Connector>> {
        self.read(|s| s.connector.clone())
    }

    pub fn login_address(&self) -> String {
        self.read(|s| s.login_address.clone())
    }

    pub fn is_logged_in(&self) -> bool {
        self.read(WalletState::is_logged_in)
    }

    pub fn is_matched_session(&self) -> bool {
        self.read(WalletState::is_matched_session)
    }

    pub fn liker_info(&self) -> Option<LikerProfile> {
        self.read(|s| s.liker_info.clone())
    }

    pub fn followees(&self) -> Vec<String> {
        self.read(|s| s.followees.iter().cloned().collect())
    }

    pub fn is_fetching_followees(&self) -> bool {
        self.read(|s| s.is_fetching_followees)
    }

    pub fn is_fetching_event(&self) -> bool {
        self.read(WalletState::is_fetching_event)
    }

    /// Feed entries up to the configured display limit, newest first.
    pub fn events(&self) -> Vec<NftEvent> {
        let limit = self.inner.config.feed.event_limit;
        self.read(|s| s.capped_events(limit).to_vec())
    }

    pub fn latest_event_timestamp(&self) -> Option<i64> {
        self.read(WalletState::latest_event_timestamp)
    }

    pub fn event_last_seen_ts(&self) -> i64 {
        self.read(|s| s.event_last_seen_ts)
    }

    pub fn has_unseen_events(&self) -> bool {
        self.read(WalletState::has_unseen_events)
    }

    pub fn notification_count(&self) -> usize {
        let limit = self.inner.config.feed.event_limit;
        self.read(|s| s.notification_count(limit))
    }

    pub fn method_type(&self) -> Option<String> {
        self.read(|s| s.method_type.clone())
    }

    pub fn email(&self) -> String {
        self.read(|s| s.email.clone())
    }

    pub fn email_unverified(&self) -> String {
        self.read(|s| s.email_unverified.clone())
    }

    pub fn has_verified_email(&self) -> bool {
        self.read(WalletState::has_verified_email)
    }

    pub fn is_logging_in(&self) -> bool {
        self.read(|s| s.is_logging_in)
    }

    pub fn is_inited(&self) -> bool {
        self.read(|s| s.is_inited)
    }

    pub fn like_balance(&self) -> Option<LikeBalance> {
        self.read(|s| s.like_balance.clone())
    }

    pub fn balance_fetch_in_flight(&self) -> Option<BalanceFuture> {
        self.read(|s| s.balance_fetch.as_ref().map(|f| f.future.clone()))
    }

    pub async fn cached_profile(&self, address: &str) -> Option<Arc<LikerProfile>> {
        self.inner.cache.profiles.get(address).await
    }

    pub async fn cached_class(&self, class_id: &str) -> Option<Arc<ClassMetadata>> {
        self.inner.cache.classes.get(class_id).await
    }

    pub fn update_event_last_seen_ts(&self, timestamp: i64) {
        self.write(|s| s.event_last_seen_ts = timestamp);
    }
}

/// Raises a boolean state flag and lowers it again on every exit path.
struct FlagGuard<'a> {
    store: &'a WalletStore,
    flag: fn(&mut WalletState) -> &mut bool,
}

impl<'a> FlagGuard<'a> {
    fn raise(store: &'a WalletStore, flag: fn(&mut WalletState) -> &mut bool) -> Self {
        store.write(|s| *flag(s) = true);
        Self { store, flag }
    }

    /// Like [`FlagGuard::raise`], but yields nothing when the flag is already up.
    fn try_raise(store: &'a WalletStore, flag: fn(&mut WalletState) -> &mut bool) -> Option<Self> {
        let raised = store.write(|s| {
            let slot = flag(s);
            if *slot {
                false
            } else {
                *slot = true;
                true
            }
        });
        raised.then(|| Self { store, flag })
    }
}

impl Drop for FlagGuard<'_> {
    fn drop(&mut self) {
        let flag = self.flag;
        self.store.write(|s| *flag(s) = false);
    }
}

/// Holds the event-fetching flag up until the last overlapping fetch finishes.
struct EventFetch<'a> {
    store: &'a WalletStore,
}

impl<'a> EventFetch<'a> {
    fn begin(store: &'a WalletStore) -> Self {
        store.write(|s| s.event_fetches += 1);
        Self { store }
    }
}

impl Drop for EventFetch<'_> {
    fn drop(&mut self) {
        self.store.write(|s| s.event_fetches = s.event_fetches.saturating_sub(1));
    }
}

fn logging_in_flag(state: &mut WalletState) -> &mut bool {
    &mut state.is_logging_in
}

fn fetching_followees_flag(state: &mut WalletState) -> &mut bool {
    &mut state.is_fetching_followees
}
