//! Adaptive Cut-Loss Controller (C6, §4.6).
//!
//! Invoked when exactly one leg of a position has filled at price `p_f` and
//! the other leg `S` is still outstanding. Tries to chase a combined
//! (both-leg) sell price no worse than `mm_adaptive_min_combined` before the
//! deadline forces a market exit.

use alloy_primitives::U256;
use polymarket_core::chain::Addresses;
use polymarket_core::config::MmConfig;
use polymarket_core::types::order::{OrderSide, TimeInForce};
use polymarket_core::{ClobClient, Result};
use rust_decimal::Decimal;
use std::time::Duration;
use tracing::info;
use trading_engine::CtfPrimitives;

/// How the leg eventually cleared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CutLossOutcome {
    /// Filled by a posted limit at the reported price.
    Limit,
    /// Forced out at the deadline via market sell.
    Market,
}

#[derive(Debug, Clone, Copy)]
pub struct CutLossResult {
    pub leg_fill_price: Decimal,
    pub combined: Decimal,
    pub outcome: CutLossOutcome,
}

/// `floor = max(0, mm_adaptive_min_combined - p_f)` (§4.6).
pub fn profit_floor(adaptive_min_combined: Decimal, p_f: Decimal) -> Decimal {
    (adaptive_min_combined - p_f).max(Decimal::ZERO)
}

struct ActiveLimit {
    order_id: String,
    price: Decimal,
}

/// Run the monitor loop for the unfilled leg `token_id` until
/// `lifetime_remaining <= mm_cut_loss_time`, then force a market exit.
///
/// `initial_order_id` is S's original GTC sell, cancelled before the loop
/// starts. `shares` is the advisory leg size; balances are reconciled
/// against the chain before both the first post and the final market sell.
#[allow(clippy::too_many_arguments)]
pub async fn run(
    clob: &ClobClient,
    ctf: &CtfPrimitives,
    addresses: &Addresses,
    cfg: &MmConfig,
    token_id: U256,
    neg_risk: bool,
    initial_order_id: &str,
    p_f: Decimal,
    lifetime_remaining: impl Fn() -> i64,
) -> Result<CutLossResult> {
    let floor = profit_floor(cfg.adaptive_min_combined, p_f);
    clob.cancel(initial_order_id).await?;
    let shares = ctf.balance_of(token_id).await?;

    let mut active: Option<ActiveLimit> = None;
    let monitor_interval = Duration::from_secs(cfg.adaptive_monitor_secs);

    while lifetime_remaining() > cfg.cut_loss_time_secs {
        tokio::time::sleep(monitor_interval).await;

        if let Some(limit) = &active {
            let status = clob.order_status(&limit.order_id).await?;
            if status.status.is_filled(status.size_matched, shares) {
                let combined = p_f + limit.price;
                info!(token_id = %token_id, price = %limit.price, combined = %combined, "adaptive cut-loss filled by limit");
                return Ok(CutLossResult {
                    leg_fill_price: limit.price,
                    combined,
                    outcome: CutLossOutcome::Limit,
                });
            }
        }

        let mid = clob.midpoint(token_id).await?;

        match active.take() {
            Some(limit) => {
                if mid < floor || mid < Decimal::new(95, 2) * limit.price {
                    clob.cancel(&limit.order_id).await?;
                    // Stay unposted until the next tick decides whether to re-enter.
                } else {
                    let target = mid.min(cfg.sell_price);
                    if target > Decimal::new(102, 2) * limit.price {
                        clob.cancel(&limit.order_id).await?;
                        let posted = clob
                            .post_limit(
                                token_id,
                                OrderSide::Sell,
                                target,
                                shares,
                                addresses,
                                neg_risk,
                                TimeInForce::Gtc,
                            )
                            .await?;
                        active = Some(ActiveLimit {
                            order_id: posted.order_id,
                            price: target,
                        });
                    } else {
                        active = Some(limit);
                    }
                }
            }
            None if mid >= floor => {
                let target = mid.min(cfg.sell_price);
                let posted = clob
                    .post_limit(
                        token_id,
                        OrderSide::Sell,
                        target,
                        shares,
                        addresses,
                        neg_risk,
                        TimeInForce::Gtc,
                    )
                    .await?;
                active = Some(ActiveLimit {
                    order_id: posted.order_id,
                    price: target,
                });
            }
            None => {} // mid < floor: decline to sell below the profit floor
        }
    }

    if let Some(limit) = active {
        clob.cancel(&limit.order_id).await?;
    }

    let balance = ctf.balance_of(token_id).await?;
    let market = clob
        .post_market(
            token_id,
            OrderSide::Sell,
            balance,
            Decimal::new(1, 2),
            addresses,
            neg_risk,
            TimeInForce::Fok,
        )
        .await?;
    let combined = p_f + market.fill_price;
    info!(token_id = %token_id, price = %market.fill_price, combined = %combined, "adaptive cut-loss forced out at deadline");
    Ok(CutLossResult {
        leg_fill_price: market.fill_price,
        combined,
        outcome: CutLossOutcome::Market,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profit_floor_clamps_at_zero() {
        assert_eq!(profit_floor(Decimal::new(120, 2), Decimal::new(80, 2)), Decimal::ZERO);
    }

    #[test]
    fn test_profit_floor_subtracts_fill_price() {
        assert_eq!(profit_floor(Decimal::new(120, 2), Decimal::new(60, 2)), Decimal::new(60, 2));
    }
}
