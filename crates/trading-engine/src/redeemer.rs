//! Cleanup & Redeemer (C7, §4.7).
//!
//! Startup cleanup cancels stray orders and merges stranded tokens on
//! unresolved conditions; the periodic redeemer converts resolved
//! conditions back to collateral. Both run against the same held-positions
//! snapshot, grouped by `condition_id`.

use crate::ctf::CtfPrimitives;
use alloy_primitives::{Address, B256, U256};
use polymarket_core::api::{ClobClient, PositionsClient};
use polymarket_core::config::MIN_SHARES_PER_SIDE;
use polymarket_core::Result;
use rust_decimal::Decimal;
use std::time::Duration;
use tracing::{error, info, warn};

/// Below this on-chain balance a held position is dust, not worth a
/// redemption call (§4.7).
const DUST_THRESHOLD: Decimal = Decimal::from_parts(1, 0, 0, false, 3); // 0.001

pub struct Redeemer {
    clob: ClobClient,
    positions: PositionsClient,
    ctf: CtfPrimitives,
    wallet_address: Address,
}

impl Redeemer {
    pub fn new(
        clob: ClobClient,
        positions: PositionsClient,
        ctf: CtfPrimitives,
        wallet_address: Address,
    ) -> Self {
        Self {
            clob,
            positions,
            ctf,
            wallet_address,
        }
    }

    /// Cancel all open orders, then merge stranded balances on every
    /// unresolved condition holding at least `MIN_SHARES_PER_SIDE` on both
    /// outcomes. Runs once at process start, before any position task.
    pub async fn startup_cleanup(&self) -> Result<()> {
        let open = self.clob.open_orders(None).await?;
        for order in &open {
            if let Err(e) = self.clob.cancel(&order.order_id).await {
                warn!(order_id = %order.order_id, error = %e, "failed to cancel stray order at startup");
            }
        }
        info!(cancelled = open.len(), "startup cleanup: cancelled stray orders");

        let grouped = self.positions.get_positions_by_condition(self.wallet_address).await?;
        for (condition_id, held) in grouped {
            if self.ctf.payout_denominator(condition_id).await? != U256::ZERO {
                continue; // resolved; leave to the periodic redeemer
            }
            self.merge_stranded(condition_id, &held).await;
        }
        Ok(())
    }

    async fn merge_stranded(&self, condition_id: B256, held: &[polymarket_core::api::positions::HeldPosition]) {
        if held.len() < 2 {
            return;
        }
        let yes = held[0].size;
        let no = held.get(1).map(|p| p.size).unwrap_or(Decimal::ZERO);
        if yes < MIN_SHARES_PER_SIDE || no < MIN_SHARES_PER_SIDE {
            return;
        }
        let mergeable = yes.min(no);
        match self.ctf.merge(condition_id, mergeable).await {
            Ok(recovered) => info!(
                condition_id = %condition_id,
                recovered = %recovered,
                "startup cleanup: merged stranded tokens"
            ),
            Err(e) => error!(condition_id = %condition_id, error = %e, "failed to merge stranded tokens"),
        }
    }

    /// Run forever, redeeming resolved conditions every `interval`. Failures
    /// are logged and retried on the next tick, never fatal to the process
    /// (§7).
    pub async fn run_periodic(&self, interval: Duration) -> ! {
        loop {
            tokio::time::sleep(interval).await;
            if let Err(e) = self.redeem_tick().await {
                error!(error = %e, "redeemer tick failed, will retry next interval");
            }
        }
    }

    async fn redeem_tick(&self) -> Result<()> {
        let grouped = self.positions.get_positions_by_condition(self.wallet_address).await?;
        let mut redeemed = 0u32;
        for (condition_id, held) in grouped {
            let denominator = self.ctf.payout_denominator(condition_id).await?;
            if denominator == U256::ZERO {
                continue; // unresolved
            }
            let total: Decimal = held.iter().map(|p| p.size).sum();
            if total < DUST_THRESHOLD {
                continue;
            }
            if let Err(e) = self.ctf.redeem(condition_id).await {
                error!(condition_id = %condition_id, error = %e, "redeem failed");
                continue;
            }
            redeemed += 1;
            info!(condition_id = %condition_id, "redeemed resolved condition");
        }
        if redeemed > 0 {
            info!(redeemed, "periodic redeemer tick complete");
        }
        Ok(())
    }
}
