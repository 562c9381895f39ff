use futures::future::try_join_all;
use tracing::{debug, info};

use super::{EventFetch, WalletStore};
use crate::api::EventQuery;
use crate::error::WalletResult;
use crate::feed;
use crate::models::{ACTION_MSG_SEND, ACTION_NEW_CLASS};

impl WalletStore {
    /// Rebuilds the event feed for the connected address: its own transfers plus
    /// class creations by followees, merged, priced, classified and sorted, then
    /// committed in one replacement. The fetching flag stays up while any fetch runs.
    pub async fn fetch_wallet_events(&self) -> WalletResult<()> {
        let (address, followees) = self.read(|s| {
            (
                s.address.clone(),
                s.followees.iter().cloned().collect::<Vec<_>>(),
            )
        });
        if address.is_empty() {
            return Ok(());
        }
        let _fetching = EventFetch::begin(self);

        let api = &self.inner.api;
        let limit = self.inner.config.feed.event_limit;
        let platform_wallet = self.inner.config.chain.platform_wallet.as_str();

        let involver_query = EventQuery {
            involver: Some(address.clone()),
            action_type: Some(ACTION_MSG_SEND.to_string()),
            ignore_to_list: vec![platform_wallet.to_string()],
            limit,
            reverse: true,
            ..EventQuery::default()
        };
        let involved = api.nft_events(&involver_query);
        let minted = async {
            if followees.is_empty() {
                return Ok(Vec::new());
            }
            let mint_query = EventQuery {
                senders: followees.clone(),
                action_type: Some(ACTION_NEW_CLASS.to_string()),
                limit,
                reverse: true,
                ..EventQuery::default()
            };
            api.nft_events(&mint_query).await
        };
        let (involved, minted) = futures::try_join!(involved, minted)?;

        let normalized = involved
            .into_iter()
            .chain(minted)
            .map(|raw| feed::normalize(raw, &address, platform_wallet))
            .collect::<WalletResult<Vec<_>>>()?;
        let mut events = feed::merge_events(normalized);

        self.inner
            .enricher
            .dispatch_profiles(feed::participants(&events));

        let lookups = events
            .iter()
            .enumerate()
            .filter(|(_, event)| feed::needs_sale_lookup(event, platform_wallet))
            .map(|(index, event)| async move {
                api.sale_history(&event.class_id, &event.tx_hash)
                    .await
                    .map(|records| (index, records))
            });
        let sales = try_join_all(lookups).await?;
        for (index, records) in sales {
            feed::attach_sale(&mut events[index], &records);
        }

        feed::sort_newest_first(&mut events);
        let class_ids = feed::class_ids(&events);
        let count = events.len();

        let committed = self.write(|s| {
            if s.address != address {
                return false;
            }
            s.events = events;
            true
        });
        if !committed {
            debug!(address = %address, "Wallet changed during event fetch, discarding feed");
            return Ok(());
        }
        info!(address = %address, events = count, "Wallet event feed refreshed");

        self.inner.enricher.dispatch_classes(class_ids);
        Ok(())
    }
}
