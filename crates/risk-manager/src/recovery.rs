//! Recovery Buy (§4.5.1), optional follow-on to a neither-filled merge.
//!
//! Samples both tokens' midpoints for 10 s at 1 Hz, looks for a side that
//! cleared the recovery threshold without declining, takes one FOK market
//! position in it, holds 30 s, then exits if the market turned against it.

use alloy_primitives::U256;
use polymarket_core::chain::Addresses;
use polymarket_core::config::MmConfig;
use polymarket_core::types::order::{OrderSide, TimeInForce};
use polymarket_core::{ClobClient, Result};
use rust_decimal::Decimal;
use std::time::Duration;
use tracing::info;

const SAMPLE_COUNT: usize = 10;
const SAMPLE_INTERVAL: Duration = Duration::from_secs(1);
const HOLD: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy)]
pub struct RecoveryResult {
    pub token_id: U256,
    pub fill_price: Decimal,
    /// `Some` if the position was sold back out before the hold expired.
    pub exit_price: Option<Decimal>,
}

/// Runs the full sub-routine. Returns `Ok(None)` when recovery-buy is
/// disabled, no candidate qualifies, or liquidity is unavailable.
#[allow(clippy::too_many_arguments)]
pub async fn run(
    clob: &ClobClient,
    addresses: &Addresses,
    cfg: &MmConfig,
    neg_risk: bool,
    yes_token: U256,
    no_token: U256,
    lifetime_remaining: impl Fn() -> i64,
) -> Result<Option<RecoveryResult>> {
    if !cfg.recovery_buy {
        return Ok(None);
    }

    let mut yes_samples = Vec::with_capacity(SAMPLE_COUNT);
    let mut no_samples = Vec::with_capacity(SAMPLE_COUNT);
    for _ in 0..SAMPLE_COUNT {
        yes_samples.push(clob.midpoint(yes_token).await?);
        no_samples.push(clob.midpoint(no_token).await?);
        tokio::time::sleep(SAMPLE_INTERVAL).await;
    }

    let candidate = pick_candidate(&yes_samples, cfg.recovery_threshold)
        .map(|_| yes_token)
        .or_else(|| pick_candidate(&no_samples, cfg.recovery_threshold).map(|_| no_token));

    let Some(token_id) = candidate else {
        info!("recovery buy: no qualifying candidate, skipping");
        return Ok(None);
    };

    let size = if cfg.recovery_size.is_zero() {
        cfg.trade_size
    } else {
        cfg.recovery_size
    };

    let bought = clob
        .post_market(
            token_id,
            OrderSide::Buy,
            size,
            Decimal::new(99, 2),
            addresses,
            neg_risk,
            TimeInForce::Fok,
        )
        .await?;
    if !bought.ok || bought.is_no_liquidity() {
        info!(token_id = %token_id, "recovery buy: no liquidity, skipping");
        return Ok(None);
    }
    let fill_price = bought.fill_price;
    info!(token_id = %token_id, fill_price = %fill_price, "recovery buy: entered");

    tokio::time::sleep(HOLD).await;

    if lifetime_remaining() < 5 {
        info!(token_id = %token_id, "recovery buy: near expiry, leaving to resolution");
        return Ok(Some(RecoveryResult {
            token_id,
            fill_price,
            exit_price: None,
        }));
    }

    let mid = clob.midpoint(token_id).await?;
    if mid < fill_price {
        let sold = clob
            .post_market(
                token_id,
                OrderSide::Sell,
                size,
                Decimal::new(1, 2),
                addresses,
                neg_risk,
                TimeInForce::Fok,
            )
            .await?;
        info!(token_id = %token_id, exit_price = %sold.fill_price, "recovery buy: exited on reversal");
        return Ok(Some(RecoveryResult {
            token_id,
            fill_price,
            exit_price: Some(sold.fill_price),
        }));
    }

    info!(token_id = %token_id, "recovery buy: holding, midpoint did not decline");
    Ok(Some(RecoveryResult {
        token_id,
        fill_price,
        exit_price: None,
    }))
}

/// A candidate qualifies if its last sample is at least `threshold` and no
/// lower than its first sample (non-declining) — §4.5.1.
fn pick_candidate(samples: &[Decimal], threshold: Decimal) -> Option<()> {
    let first = *samples.first()?;
    let last = *samples.last()?;
    (last >= threshold && last >= first).then_some(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pick_candidate_requires_threshold_and_non_decline() {
        assert!(pick_candidate(&[Decimal::new(50, 2), Decimal::new(60, 2)], Decimal::new(55, 2)).is_some());
        assert!(pick_candidate(&[Decimal::new(60, 2), Decimal::new(50, 2)], Decimal::new(55, 2)).is_none());
        assert!(pick_candidate(&[Decimal::new(50, 2), Decimal::new(52, 2)], Decimal::new(55, 2)).is_none());
    }
}
