//! Position dispatcher (C5, §4.5, §5).
//!
//! Consumes `Market` events from the detector and enforces the per-asset
//! mutual-exclusion invariant: at most one position task runs per asset at a
//! time. This is a scheduling rule enforced here, not a lock, so it can
//! never deadlock (§5).

use crate::position::{self, PositionDeps, PositionOutcome};
use chrono::Utc;
use polymarket_core::types::Market;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

pub struct Dispatcher {
    deps: Arc<PositionDeps>,
    cut_loss_time_secs: i64,
}

impl Dispatcher {
    pub fn new(deps: Arc<PositionDeps>, cut_loss_time_secs: i64) -> Self {
        Self { deps, cut_loss_time_secs }
    }

    /// Runs until the detector channel closes or shutdown is requested.
    pub async fn run(self, mut markets: mpsc::Receiver<Market>, shutdown: CancellationToken) {
        let mut active: HashMap<String, JoinHandle<()>> = HashMap::new();
        let mut pending: HashMap<String, Market> = HashMap::new();
        let (done_tx, mut done_rx) = mpsc::channel::<PositionOutcome>(16);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("dispatcher: shutdown requested");
                    break;
                }
                maybe_market = markets.recv() => {
                    match maybe_market {
                        Some(market) => self.on_market(market, &mut active, &mut pending, &done_tx, &shutdown),
                        None => {
                            info!("dispatcher: detector channel closed");
                            break;
                        }
                    }
                }
                Some(outcome) = done_rx.recv() => {
                    active.remove(&outcome.asset);
                    info!(asset = %outcome.asset, status = ?outcome.status, pnl = ?outcome.pnl, "dispatcher: position terminated");
                    if let Some(market) = pending.remove(&outcome.asset) {
                        let remaining = market.lifetime_remaining_secs(Utc::now());
                        if remaining > self.cut_loss_time_secs {
                            self.spawn_position(market, &mut active, &done_tx, &shutdown);
                        } else {
                            debug!(asset = %outcome.asset, remaining, "dispatcher: discarding stale pending entry");
                        }
                    }
                }
            }
        }

        for (_, handle) in active.drain() {
            handle.abort();
        }
    }

    fn on_market(
        &self,
        market: Market,
        active: &mut HashMap<String, JoinHandle<()>>,
        pending: &mut HashMap<String, Market>,
        done_tx: &mpsc::Sender<PositionOutcome>,
        shutdown: &CancellationToken,
    ) {
        let asset = market.asset.clone();
        if active.contains_key(&asset) {
            debug!(asset = %asset, "dispatcher: asset busy, replacing pending entry");
            pending.insert(asset, market);
        } else {
            self.spawn_position(market, active, done_tx, shutdown);
        }
    }

    fn spawn_position(
        &self,
        market: Market,
        active: &mut HashMap<String, JoinHandle<()>>,
        done_tx: &mpsc::Sender<PositionOutcome>,
        shutdown: &CancellationToken,
    ) {
        let asset = market.asset.clone();
        let deps = self.deps.clone();
        let done_tx = done_tx.clone();
        let shutdown = shutdown.clone();
        info!(asset = %asset, "dispatcher: starting position task");
        let handle = tokio::spawn(async move {
            let outcome = position::run(market, deps, shutdown).await;
            let _ = done_tx.send(outcome).await;
        });
        active.insert(asset, handle);
    }
}
