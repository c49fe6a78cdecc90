//! Market Detector (C4, §4.4).
//!
//! Produces `Market` events deterministically by polling the exchange's
//! metadata service for each configured asset's next epoch-aligned slot,
//! rather than subscribing to a feed.

use chrono::Utc;
use polymarket_core::api::MetadataClient;
use polymarket_core::types::Market;
use polymarket_core::Error;
use std::collections::HashSet;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Freshness window: a slot more than this many seconds past its own open
/// time is dropped rather than emitted (§4.4).
const FRESHNESS_WINDOW_SECS: i64 = 15;

pub struct Detector {
    metadata: MetadataClient,
    assets: Vec<String>,
    slot_seconds: i64,
    poll_interval: Duration,
    /// Dedup set of `(asset, slot_start)` already emitted or discarded.
    seen: HashSet<(String, i64)>,
}

impl Detector {
    pub fn new(
        metadata: MetadataClient,
        assets: Vec<String>,
        slot_seconds: i64,
        poll_interval_secs: u64,
    ) -> Self {
        Self {
            metadata,
            assets,
            slot_seconds,
            poll_interval: Duration::from_secs(poll_interval_secs),
            seen: HashSet::new(),
        }
    }

    /// Poll forever until cancelled, emitting at most one `Market` per
    /// `(asset, next_slot)` to `tx`. Never fatal: a per-asset poll failure is
    /// logged and retried next tick (§7).
    pub async fn run(mut self, tx: mpsc::Sender<Market>, shutdown: CancellationToken) {
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    debug!("detector: shutdown requested");
                    return;
                }
                _ = tokio::time::sleep(self.poll_interval) => {}
            }

            let assets = self.assets.clone();
            for asset in assets {
                if let Err(e) = self.poll_asset(&asset, &tx).await {
                    warn!(asset = %asset, error = %e, "detector: poll failed, retrying next tick");
                }
            }

            self.prune_seen();
        }
    }

    /// Drop `(asset, slot_start)` entries more than two slot durations
    /// stale, so `seen` stays bounded across an indefinitely running
    /// process (§4.4.1).
    fn prune_seen(&mut self) {
        let current_slot = (Utc::now().timestamp() / self.slot_seconds) * self.slot_seconds;
        let cutoff = current_slot - 2 * self.slot_seconds;
        self.seen.retain(|(_, slot_start)| *slot_start >= cutoff);
    }

    async fn poll_asset(&mut self, asset: &str, tx: &mpsc::Sender<Market>) -> polymarket_core::Result<()> {
        let now = Utc::now();
        let current_slot = (now.timestamp() / self.slot_seconds) * self.slot_seconds;
        let next_slot = current_slot + self.slot_seconds;
        let key = (asset.to_string(), next_slot);

        if self.seen.contains(&key) {
            return Ok(());
        }

        let slug = slug_for(asset, self.slot_seconds, next_slot);
        let market = match self.metadata.get_by_slug(&slug, asset).await {
            Ok(Some(m)) => m,
            Ok(None) => return Ok(()), // not live yet, try again next poll
            Err(Error::InvalidMarket(reason)) => {
                warn!(asset = %asset, slug = %slug, reason = %reason, "detector: market missing usable token ids, discarding");
                self.seen.insert(key);
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        self.seen.insert(key);

        let age = (now - market.open_time).num_seconds();
        if age > FRESHNESS_WINDOW_SECS {
            debug!(asset = %asset, slug = %slug, age, "detector: stale slot dropped");
            return Ok(());
        }

        debug!(asset = %asset, slug = %slug, "detector: emitting market");
        let _ = tx.send(market).await;
        Ok(())
    }
}

/// Deterministic slug the venue uses for its up/down markets (§4.4).
fn slug_for(asset: &str, slot_seconds: i64, slot_start: i64) -> String {
    let duration = match slot_seconds {
        300 => "5m",
        900 => "15m",
        other => {
            debug_assert!(false, "unexpected slot_seconds {other}");
            return format!("{asset}-updown-{other}-{slot_start}");
        }
    };
    format!("{asset}-updown-{duration}-{slot_start}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slug_for_5m() {
        assert_eq!(slug_for("btc", 300, 1700000400), "btc-updown-5m-1700000400");
    }

    #[test]
    fn test_slug_for_15m() {
        assert_eq!(slug_for("eth", 900, 1700000000), "eth-updown-15m-1700000000");
    }

    fn detector_with_seen(slot_seconds: i64, seen: HashSet<(String, i64)>) -> Detector {
        Detector {
            metadata: MetadataClient::new(String::new()),
            assets: vec![],
            slot_seconds,
            poll_interval: Duration::from_secs(1),
            seen,
        }
    }

    #[test]
    fn test_prune_seen_drops_entries_older_than_two_slots() {
        let current_slot = (Utc::now().timestamp() / 300) * 300;
        let stale = current_slot - 3 * 300;
        let fresh = current_slot - 300;
        let mut detector = detector_with_seen(
            300,
            HashSet::from([("btc".to_string(), stale), ("btc".to_string(), fresh)]),
        );

        detector.prune_seen();

        assert!(!detector.seen.contains(&("btc".to_string(), stale)));
        assert!(detector.seen.contains(&("btc".to_string(), fresh)));
    }

    #[test]
    fn test_prune_seen_keeps_set_bounded_over_many_ticks() {
        let mut detector = detector_with_seen(300, HashSet::new());
        let current_slot = (Utc::now().timestamp() / 300) * 300;
        for i in 0..1000 {
            detector.seen.insert(("btc".to_string(), current_slot - i * 300));
        }
        detector.prune_seen();
        assert!(detector.seen.len() <= 3);
    }
}
