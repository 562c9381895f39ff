use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use futures::future::{BoxFuture, Shared};
use moka::future::Cache;

use crate::config::CacheConfig;
use crate::connector::{Connector, Signer};
use crate::error::WalletResult;
use crate::models::{ClassMetadata, LikeBalance, LikerProfile, NftEvent, SessionUserInfo};

mod view;

/// Last-seen marker before any session info arrived.
pub const LAST_SEEN_UNSET: i64 = 0;
/// Last-seen marker after the identity was cleared.
pub const LAST_SEEN_RESET: i64 = -1;

pub type BalanceFuture = Shared<BoxFuture<'static, WalletResult<LikeBalance>>>;

/// Outstanding balance request shared by every caller that arrives before it settles.
#[derive(Clone)]
pub struct InFlightBalance {
    pub generation: u64,
    /// Address the request was issued for.
    pub address: String,
    pub future: BalanceFuture,
}

/// Everything the wallet UI reads. Mutated only by the store.
#[derive(Default)]
pub struct WalletState {
    // session
    pub(crate) address: String,
    pub(crate) signer: Option<Arc<dyn Signer>>,
    pub(crate) connector: Option<Arc<dyn Connector>>,
    pub(crate) method_type: Option<String>,
    pub(crate) is_logging_in: bool,
    pub(crate) is_inited: bool,

    // identity
    pub(crate) liker_info: Option<LikerProfile>,
    pub(crate) login_address: String,
    pub(crate) email: String,
    pub(crate) email_unverified: String,

    pub(crate) followees: BTreeSet<String>,
    pub(crate) is_fetching_followees: bool,

    pub(crate) events: Vec<NftEvent>,
    /// Event fetches currently running.
    pub(crate) event_fetches: usize,
    pub(crate) event_last_seen_ts: i64,

    pub(crate) like_balance: Option<LikeBalance>,
    pub(crate) balance_fetch: Option<InFlightBalance>,
}

impl WalletState {
    /// Applies a session record. Fields the record omits are left alone; a missing
    /// record clears the identity and marks the last-seen timestamp as reset.
    pub fn apply_user_info(&mut self, info: Option<&SessionUserInfo>) {
        let Some(info) = info else {
            self.login_address.clear();
            self.email.clear();
            self.email_unverified.clear();
            self.event_last_seen_ts = LAST_SEEN_RESET;
            return;
        };
        if let Some(user) = &info.user {
            self.login_address = user.clone();
        }
        if let Some(email) = &info.email {
            self.email = email.clone();
        }
        if let Some(unconfirmed) = &info.email_unconfirmed {
            self.email_unverified = unconfirmed.clone();
        }
        if let Some(ts) = info.event_last_seen_ts.filter(|ts| *ts != 0) {
            self.event_last_seen_ts = ts;
        }
    }

    /// Drops the wallet connection but keeps followees and feed for the logout step.
    pub fn clear_connection(&mut self) {
        self.address.clear();
        self.signer = None;
        self.connector = None;
        self.liker_info = None;
    }

    /// Identity, followees, feed and last-seen marker, in that order.
    pub fn clear_identity(&mut self) {
        self.apply_user_info(None);
        self.followees.clear();
        self.events.clear();
        self.event_last_seen_ts = LAST_SEEN_UNSET;
    }

    /// Adds a followee. Returns false when it was already followed.
    pub fn follow(&mut self, creator: &str) -> bool {
        self.followees.insert(creator.to_string())
    }

    pub fn unfollow(&mut self, creator: &str) -> bool {
        self.followees.remove(creator)
    }
}

/// Lookups that the feed and followee list dispatch in the background.
pub struct LookupCache {
    pub profiles: Cache<String, Arc<LikerProfile>>,
    pub classes: Cache<String, Arc<ClassMetadata>>,
}

impl LookupCache {
    pub fn new(config: &CacheConfig) -> Self {
        assert!(
            config.profiles_max_capacity >= 10,
            "Profile cache capacity threshold"
        );
        assert!(
            config.classes_max_capacity >= 10,
            "Class cache capacity threshold"
        );

        let profiles = Cache::builder()
            .max_capacity(config.profiles_max_capacity)
            .time_to_live(Duration::from_secs(config.profiles_ttl_seconds))
            .time_to_idle(Duration::from_secs(config.profiles_ttl_seconds / 2 + 1))
            .build();

        let classes = Cache::builder()
            .max_capacity(config.classes_max_capacity)
            .time_to_live(Duration::from_secs(config.classes_ttl_seconds))
            .time_to_idle(Duration::from_secs(config.classes_ttl_seconds / 2 + 1))
            .build();

        Self { profiles, classes }
    }
}
