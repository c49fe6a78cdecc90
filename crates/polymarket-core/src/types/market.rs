//! Market and leg types (§3).

use alloy_primitives::{B256, U256};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A time-windowed binary market emitted by the detector. Immutable once
/// emitted; `condition_id` is the authoritative identity, never the slug.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Market {
    pub asset: String,
    pub condition_id: B256,
    pub question: String,
    pub open_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub yes_token_id: U256,
    pub no_token_id: U256,
    pub tick_size: Decimal,
    pub neg_risk: bool,
}

impl Market {
    pub fn lifetime_remaining(&self, now: DateTime<Utc>) -> chrono::Duration {
        self.end_time - now
    }

    pub fn lifetime_remaining_secs(&self, now: DateTime<Utc>) -> i64 {
        self.lifetime_remaining(now).num_seconds()
    }
}

/// One side (YES or NO) of a position's outcome-token holding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Leg {
    pub token_id: U256,
    /// Advisory share count; on-chain balance is authoritative before any
    /// quantity-sensitive write (§3 Lifecycles).
    pub shares: Decimal,
    pub entry_price: Decimal,
    pub entry_cost: Decimal,
    pub order_id: Option<String>,
    pub filled: bool,
    pub fill_price: Option<Decimal>,
}

impl Leg {
    pub fn new(token_id: U256, shares: Decimal, entry_price: Decimal) -> Self {
        Self {
            token_id,
            shares,
            entry_price,
            entry_cost: shares * entry_price,
            order_id: None,
            filled: false,
            fill_price: None,
        }
    }

    pub fn mark_filled(&mut self, fill_price: Decimal) {
        self.filled = true;
        self.fill_price = Some(fill_price);
    }

    /// `(fill_price - 0.5) * shares`, per §4.5 step 2.
    pub fn pnl(&self) -> Option<Decimal> {
        self.fill_price
            .map(|p| (p - Decimal::new(5, 1)) * self.shares)
    }
}
