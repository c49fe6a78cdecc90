//! Position State Machine (C5, §4.5): the per-position task flow from split
//! through terminal resolution. One task owns one `Position`; it is the only
//! mutator of that position's fields (§3, §5).

use alloy_primitives::U256;
use chrono::Utc;
use polymarket_core::chain::Addresses;
use polymarket_core::config::MmConfig;
use polymarket_core::types::order::{OrderSide, TimeInForce};
use polymarket_core::types::{Leg, Market, Position, PositionStatus};
use polymarket_core::{ClobClient, Result};
use rust_decimal::Decimal;
use risk_manager::{adaptive_cutloss, recovery};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use trading_engine::CtfPrimitives;

/// Monitor-tick cadence for the fill-check loop (§4.5 step 2).
const MONITOR_TICK: Duration = Duration::from_secs(10);

/// Below this on-chain balance a leg is dust, treated as already filled at
/// the target sell price rather than sold for nothing (§4.5 step 4).
const DUST_THRESHOLD: Decimal = Decimal::from_parts(1, 0, 0, false, 3); // 0.001

pub struct PositionDeps {
    pub clob: Arc<ClobClient>,
    pub ctf: Arc<CtfPrimitives>,
    pub addresses: Addresses,
    pub cfg: Arc<MmConfig>,
    pub dry_run: bool,
}

#[derive(Debug, Clone)]
pub struct PositionOutcome {
    pub asset: String,
    pub status: PositionStatus,
    pub pnl: Option<Decimal>,
}

/// Runs one position end to end. Never panics the caller: any error inside
/// ends this task with `Expired`, never the dispatcher (§7).
pub async fn run(market: Market, deps: Arc<PositionDeps>, shutdown: CancellationToken) -> PositionOutcome {
    let asset = market.asset.clone();
    match run_inner(market, &deps, &shutdown).await {
        Ok(outcome) => outcome,
        Err(e) => {
            error!(asset = %asset, error = %e, "position task failed, marking expired");
            PositionOutcome {
                asset,
                status: PositionStatus::Expired,
                pnl: None,
            }
        }
    }
}

async fn run_inner(
    market: Market,
    deps: &PositionDeps,
    shutdown: &CancellationToken,
) -> Result<PositionOutcome> {
    let asset = market.asset.clone();
    let neg_risk = market.neg_risk;
    let trade_size = deps.cfg.trade_size;
    let total = Decimal::from(2) * trade_size;

    // 1. Enter.
    if !deps.dry_run {
        let collateral = deps.ctf.collateral_balance().await?;
        if collateral < total {
            warn!(asset = %asset, collateral = %collateral, required = %total, "insufficient collateral, skipping entry");
            return Ok(PositionOutcome {
                asset,
                status: PositionStatus::Expired,
                pnl: None,
            });
        }
        deps.ctf.split(market.condition_id, total, neg_risk).await?;
    }

    let mut position = Position::new(market, trade_size);

    if !deps.dry_run {
        let yes = deps
            .clob
            .post_limit(
                position.yes.token_id,
                OrderSide::Sell,
                deps.cfg.sell_price,
                trade_size,
                &deps.addresses,
                neg_risk,
                TimeInForce::Gtc,
            )
            .await?;
        position.yes.order_id = Some(yes.order_id);

        let no = deps
            .clob
            .post_limit(
                position.no.token_id,
                OrderSide::Sell,
                deps.cfg.sell_price,
                trade_size,
                &deps.addresses,
                neg_risk,
                TimeInForce::Gtc,
            )
            .await?;
        position.no.order_id = Some(no.order_id);
    }
    position.mark_monitoring()?;
    info!(asset = %asset, "position: entered, monitoring for fills");

    // 2. Monitor.
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                info!(asset = %asset, "position: shutdown requested mid-monitor");
                return Ok(PositionOutcome { asset, status: position.status, pnl: position.total_pnl() });
            }
            _ = tokio::time::sleep(MONITOR_TICK) => {}
        }

        check_fill(&mut position.yes, deps).await?;
        check_fill(&mut position.no, deps).await?;

        let remaining = position.lifetime_remaining_secs(Utc::now());

        if position.both_filled() {
            position.mark_done()?;
            let pnl = position.total_pnl();
            info!(asset = %asset, ?pnl, "position: both legs filled");
            return Ok(PositionOutcome { asset, status: PositionStatus::Done, pnl });
        }
        if remaining <= 0 {
            position.mark_expired()?;
            warn!(asset = %asset, "position: expired before resolution");
            return Ok(PositionOutcome { asset, status: PositionStatus::Expired, pnl: None });
        }
        if position.exactly_one_filled() && deps.cfg.adaptive_cl {
            position.mark_cutting()?;
            return run_adaptive(position, deps).await;
        }
        if remaining <= deps.cfg.cut_loss_time_secs && !position.yes.filled && !position.no.filled {
            position.mark_cutting()?;
            return neither_filled_cut(position, deps).await;
        }
        if remaining <= deps.cfg.cut_loss_time_secs && position.exactly_one_filled() {
            position.mark_cutting()?;
            return immediate_cut(position, deps).await;
        }
    }
}

/// Real mode: `order_status` against the venue. Dry-run mode: compare
/// midpoint to the target sell price instead (§4.5 step 2, §6 `dry_run`).
async fn check_fill(leg: &mut Leg, deps: &PositionDeps) -> Result<()> {
    if leg.filled {
        return Ok(());
    }
    if deps.dry_run {
        let mid = deps.clob.midpoint(leg.token_id).await?;
        if mid >= deps.cfg.sell_price {
            leg.mark_filled(deps.cfg.sell_price);
        }
        return Ok(());
    }
    if let Some(order_id) = leg.order_id.clone() {
        let status = deps.clob.order_status(&order_id).await?;
        if status.status.is_filled(status.size_matched, leg.shares) {
            leg.mark_filled(deps.cfg.sell_price);
        }
    }
    Ok(())
}

/// On-chain balance is authoritative before any quantity-sensitive write;
/// in dry-run there is nothing on-chain to reconcile against, so the
/// advisory share count stands in (§3, §5).
async fn reconciled_shares(token_id: U256, leg_shares: Decimal, deps: &PositionDeps) -> Result<Decimal> {
    if deps.dry_run {
        return Ok(leg_shares);
    }
    deps.ctf.balance_of(token_id).await
}

/// 3. Neither-filled cut (§4.5 step 3).
async fn neither_filled_cut(mut position: Position, deps: &PositionDeps) -> Result<PositionOutcome> {
    let asset = position.market.asset.clone();
    if let Some(id) = &position.yes.order_id {
        deps.clob.cancel(id).await?;
    }
    if let Some(id) = &position.no.order_id {
        deps.clob.cancel(id).await?;
    }

    let yes_balance = reconciled_shares(position.market.yes_token_id, position.yes.shares, deps).await?;
    let no_balance = reconciled_shares(position.market.no_token_id, position.no.shares, deps).await?;
    let mergeable = yes_balance.min(no_balance);
    if !deps.dry_run && mergeable > Decimal::ZERO {
        deps.ctf.merge(position.market.condition_id, mergeable).await?;
    }
    info!(asset = %asset, recovered = %mergeable, "position: neither-filled cut, merged");

    if deps.cfg.recovery_buy {
        let end_time = position.market.end_time;
        let yes_token = position.market.yes_token_id;
        let no_token = position.market.no_token_id;
        let neg_risk = position.market.neg_risk;
        match recovery::run(&deps.clob, &deps.addresses, &deps.cfg, neg_risk, yes_token, no_token, move || {
            (end_time - Utc::now()).num_seconds()
        })
        .await
        {
            Ok(Some(r)) => info!(asset = %asset, token_id = %r.token_id, fill_price = %r.fill_price, exit_price = ?r.exit_price, "position: recovery buy ran"),
            Ok(None) => {}
            Err(e) => warn!(asset = %asset, error = %e, "position: recovery buy failed, ignoring"),
        }
    }

    position.mark_done()?;
    Ok(PositionOutcome {
        asset,
        status: PositionStatus::Done,
        pnl: Some(Decimal::ZERO),
    })
}

/// 4. One-leg-filled immediate cut, legacy branch used when adaptive
/// cut-loss is disabled (§4.5 step 4).
async fn immediate_cut(mut position: Position, deps: &PositionDeps) -> Result<PositionOutcome> {
    let asset = position.market.asset.clone();
    let unfilled_is_yes = !position.yes.filled;

    let (unfilled_token, unfilled_order_id, unfilled_shares) = if unfilled_is_yes {
        (position.market.yes_token_id, position.yes.order_id.clone(), position.yes.shares)
    } else {
        (position.market.no_token_id, position.no.order_id.clone(), position.no.shares)
    };

    if let Some(id) = &unfilled_order_id {
        deps.clob.cancel(id).await?;
    }

    let balance = reconciled_shares(unfilled_token, unfilled_shares, deps).await?;
    let leg_price = if balance < DUST_THRESHOLD {
        deps.cfg.sell_price
    } else if deps.dry_run {
        deps.clob.midpoint(unfilled_token).await?
    } else {
        let sold = deps
            .clob
            .post_market(
                unfilled_token,
                OrderSide::Sell,
                balance,
                Decimal::new(1, 2),
                &deps.addresses,
                position.market.neg_risk,
                TimeInForce::Fok,
            )
            .await?;
        sold.fill_price
    };

    if unfilled_is_yes {
        position.yes.mark_filled(leg_price);
    } else {
        position.no.mark_filled(leg_price);
    }
    position.mark_done()?;
    let pnl = position.total_pnl();
    info!(asset = %asset, leg_price = %leg_price, ?pnl, "position: immediate one-leg cut");
    Ok(PositionOutcome { asset, status: PositionStatus::Done, pnl })
}

/// Hand the unfilled leg to the Adaptive Cut-Loss Controller (C6, §4.6).
async fn run_adaptive(mut position: Position, deps: &PositionDeps) -> Result<PositionOutcome> {
    let asset = position.market.asset.clone();
    let neg_risk = position.market.neg_risk;
    let unfilled_is_yes = !position.yes.filled;

    let (unfilled_token, p_f, unfilled_order_id) = if unfilled_is_yes {
        (position.market.yes_token_id, position.no.fill_price.unwrap_or_default(), position.yes.order_id.clone())
    } else {
        (position.market.no_token_id, position.yes.fill_price.unwrap_or_default(), position.no.order_id.clone())
    };
    let unfilled_order_id = unfilled_order_id.unwrap_or_default();

    let end_time = position.market.end_time;
    let remaining_fn = move || (end_time - Utc::now()).num_seconds();

    let result = adaptive_cutloss::run(
        &deps.clob,
        &deps.ctf,
        &deps.addresses,
        &deps.cfg,
        unfilled_token,
        neg_risk,
        &unfilled_order_id,
        p_f,
        remaining_fn,
    )
    .await?;

    if unfilled_is_yes {
        position.yes.mark_filled(result.leg_fill_price);
    } else {
        position.no.mark_filled(result.leg_fill_price);
    }
    position.mark_done()?;
    let pnl = position.total_pnl();
    info!(asset = %asset, combined = %result.combined, outcome = ?result.outcome, ?pnl, "position: adaptive cut-loss resolved");
    Ok(PositionOutcome { asset, status: PositionStatus::Done, pnl })
}
