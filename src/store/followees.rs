use std::collections::BTreeSet;

use tracing::{debug, info, warn};

use super::{FlagGuard, WalletStore, fetching_followees_flag};
use crate::error::WalletResult;

impl WalletStore {
    /// Replaces the followee set from the server. A call made while another fetch is
    /// still running returns immediately without touching state.
    pub async fn fetch_followees(&self) -> WalletResult<()> {
        let Some(_fetching) = FlagGuard::try_raise(self, fetching_followees_flag) else {
            debug!("Followee fetch already in flight, skipping");
            return Ok(());
        };

        let followees: BTreeSet<String> = self.inner.api.followees().await?.into_iter().collect();
        let count = followees.len();
        let lookups: Vec<String> = followees.iter().cloned().collect();
        self.write(|s| s.followees = followees);
        debug!(followees = count, "Followees refreshed");

        self.inner.enricher.dispatch_profiles(lookups);
        Ok(())
    }

    /// Adds the creator locally before the server confirms; a failed request restores
    /// the previous set.
    pub async fn follow_creator(&self, creator: &str) -> WalletResult<()> {
        let snapshot = self.write(|s| {
            let snapshot = s.followees.clone();
            s.follow(creator);
            snapshot
        });
        if let Err(err) = self.inner.api.add_followee(creator).await {
            warn!(creator = %creator, "Follow request failed, rolling back: {err}");
            self.write(|s| s.followees = snapshot);
            return Err(err);
        }
        info!(creator = %creator, "Creator followed");
        Ok(())
    }

    pub async fn unfollow_creator(&self, creator: &str) -> WalletResult<()> {
        let snapshot = self.write(|s| {
            let snapshot = s.followees.clone();
            s.unfollow(creator);
            snapshot
        });
        if let Err(err) = self.inner.api.remove_followee(creator).await {
            warn!(creator = %creator, "Unfollow request failed, rolling back: {err}");
            self.write(|s| s.followees = snapshot);
            return Err(err);
        }
        info!(creator = %creator, "Creator unfollowed");
        Ok(())
    }
}
