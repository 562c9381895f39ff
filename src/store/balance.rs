use std::sync::atomic::Ordering;

use futures::FutureExt;
use tracing::{debug, warn};

use super::WalletStore;
use crate::error::{WalletError, WalletResult};
use crate::models::LikeBalance;
use crate::state::InFlightBalance;

impl WalletStore {
    /// Fetches the LIKE balance of the connected address. Callers arriving while a
    /// request for the same address is outstanding share its result instead of
    /// issuing another one.
    pub async fn fetch_like_balance(&self) -> WalletResult<LikeBalance> {
        let address = self.address();
        if address.is_empty() {
            return Err(WalletError::NotConnected);
        }

        let (generation, future, owner) = self.write(|s| {
            let joinable = s.balance_fetch.as_ref().filter(|f| f.address == address);
            if let Some(in_flight) = joinable {
                return (in_flight.generation, in_flight.future.clone(), false);
            }
            let generation = self.inner.balance_generation.fetch_add(1, Ordering::SeqCst);
            let api = self.inner.api.clone();
            let request = address.clone();
            let future = async move { api.balance(&request).await }.boxed().shared();
            s.balance_fetch = Some(InFlightBalance {
                generation,
                address: address.clone(),
                future: future.clone(),
            });
            (generation, future, true)
        });
        if !owner {
            debug!(address = %address, "Joining in-flight balance request");
        }

        let _release = BalanceRelease {
            store: self,
            generation,
        };
        let balance = future.await.inspect_err(|err| {
            warn!(address = %address, "Balance fetch failed: {err}");
        })?;
        self.write(|s| {
            if s.address == address {
                s.like_balance = Some(balance.clone());
            }
        });
        Ok(balance)
    }
}

/// Clears the in-flight marker once its request settles, unless a newer request
/// already took the slot.
struct BalanceRelease<'a> {
    store: &'a WalletStore,
    generation: u64,
}

impl Drop for BalanceRelease<'_> {
    fn drop(&mut self) {
        let generation = self.generation;
        self.store.write(|s| {
            if s.balance_fetch.as_ref().is_some_and(|f| f.generation == generation) {
                s.balance_fetch = None;
            }
        });
    }
}
