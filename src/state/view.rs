use super::{LAST_SEEN_UNSET, WalletState};
use crate::models::NftEvent;

impl WalletState {
    pub fn is_logged_in(&self) -> bool {
        !self.login_address.is_empty()
    }

    /// The server session belongs to the wallet that is connected right now.
    pub fn is_matched_session(&self) -> bool {
        self.is_logged_in() && self.address == self.login_address
    }

    pub fn is_fetching_event(&self) -> bool {
        self.event_fetches > 0
    }

    pub fn has_verified_email(&self) -> bool {
        !self.email.is_empty()
    }

    /// Feed capped to the display limit.
    pub fn capped_events(&self, limit: usize) -> &[NftEvent] {
        &self.events[..self.events.len().min(limit)]
    }

    pub fn latest_event_timestamp(&self) -> Option<i64> {
        self.events.first().map(NftEvent::timestamp_millis)
    }

    /// Only the unset marker means "never seen"; the reset marker compares as a
    /// timestamp older than any event.
    fn last_seen(&self) -> Option<i64> {
        match self.event_last_seen_ts {
            LAST_SEEN_UNSET => None,
            ts => Some(ts),
        }
    }

    pub fn has_unseen_events(&self) -> bool {
        match (self.last_seen(), self.latest_event_timestamp()) {
            (Some(last_seen), Some(latest)) => last_seen < latest,
            _ => false,
        }
    }

    /// Sales and receipts newer than the last-seen marker, within the display limit.
    pub fn notification_count(&self, limit: usize) -> usize {
        let Some(last_seen) = self.last_seen() else {
            return 0;
        };
        if !self.is_logged_in() {
            return 0;
        }
        self.capped_events(limit)
            .iter()
            .filter(|event| {
                event.event_type.is_notification() && event.timestamp_millis() > last_seen
            })
            .count()
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::models::EventType;
    use crate::state::LAST_SEEN_RESET;

    fn event(millis: i64, event_type: EventType) -> NftEvent {
        NftEvent {
            tx_hash: format!("tx{millis}"),
            class_id: "likenft1class".to_string(),
            nft_id: "nft-1".to_string(),
            sender: "like1a".to_string(),
            receiver: "like1b".to_string(),
            action: "/cosmos.nft.v1beta1.MsgSend".to_string(),
            timestamp: Utc.timestamp_millis_opt(millis).unwrap(),
            event_type,
            price: None,
            granter_memo: None,
        }
    }

    fn logged_in(last_seen: i64, events: Vec<NftEvent>) -> WalletState {
        WalletState {
            address: "like1me".to_string(),
            login_address: "like1me".to_string(),
            event_last_seen_ts: last_seen,
            events,
            ..WalletState::default()
        }
    }

    #[test]
    fn matched_session_requires_equal_non_empty_addresses() {
        let cases = [
            ("", "", false),
            ("like1me", "", false),
            ("", "like1me", false),
            ("like1me", "like1other", false),
            ("like1me", "like1me", true),
        ];
        for (address, login_address, expected) in cases {
            let state = WalletState {
                address: address.to_string(),
                login_address: login_address.to_string(),
                ..WalletState::default()
            };
            assert_eq!(
                state.is_matched_session(),
                expected,
                "address={address:?} login={login_address:?}"
            );
        }
    }

    #[test]
    fn notification_count_is_zero_without_last_seen_marker() {
        let events = vec![event(2_000, EventType::NftSale)];
        assert_eq!(logged_in(LAST_SEEN_UNSET, events).notification_count(100), 0);
    }

    #[test]
    fn reset_marker_counts_every_event_as_unseen() {
        let state = logged_in(
            LAST_SEEN_RESET,
            vec![event(2_000, EventType::NftSale), event(1_000, EventType::SendNft)],
        );
        assert!(state.has_unseen_events());
        assert_eq!(state.notification_count(100), 1);

        let never_loaded = logged_in(LAST_SEEN_UNSET, vec![event(2_000, EventType::NftSale)]);
        assert!(!never_loaded.has_unseen_events());
    }

    #[test]
    fn notification_count_only_counts_newer_sales_and_receipts() {
        let state = logged_in(
            1_000,
            vec![
                event(3_000, EventType::NftSale),
                event(2_500, EventType::ReceiveNft),
                event(2_000, EventType::SendNft),
                event(1_500, EventType::PurchaseNft),
                event(1_000, EventType::ReceiveNft),
                event(500, EventType::NftSale),
            ],
        );
        assert_eq!(state.notification_count(100), 2);
        assert_eq!(state.notification_count(1), 1);
    }

    #[test]
    fn notification_count_requires_login() {
        let mut state = logged_in(1_000, vec![event(3_000, EventType::NftSale)]);
        state.login_address.clear();
        assert_eq!(state.notification_count(100), 0);
    }

    #[test]
    fn unseen_events_compare_against_newest_entry() {
        let state = logged_in(1_000, vec![event(3_000, EventType::SendNft)]);
        assert!(state.has_unseen_events());
        assert_eq!(state.latest_event_timestamp(), Some(3_000));

        let seen = logged_in(3_000, vec![event(3_000, EventType::SendNft)]);
        assert!(!seen.has_unseen_events());

        let empty = logged_in(1_000, Vec::new());
        assert!(!empty.has_unseen_events());
        assert_eq!(empty.latest_event_timestamp(), None);
    }

    #[test]
    fn capped_events_truncates_to_limit() {
        let events = (0..5).map(|i| event(i, EventType::TransferNft)).collect();
        let state = logged_in(1, events);
        assert_eq!(state.capped_events(3).len(), 3);
        assert_eq!(state.capped_events(10).len(), 5);
    }
}
