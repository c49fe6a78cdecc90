//! Position life-cycle (§3, §4.5): entering → monitoring → (done | cutting | expired).

use super::market::{Leg, Market};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionStatus {
    /// Split submitted, limit sells not yet confirmed posted.
    Entering,
    /// Both legs live, polling for fills.
    Monitoring,
    /// Neither-filled or one-leg-filled cut in progress (§4.5 steps 3-4, §4.6).
    Cutting,
    /// Terminal: both legs resolved (filled, merged, or market-sold).
    Done,
    /// Terminal: ran out of lifetime before resolution.
    Expired,
}

impl PositionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, PositionStatus::Done | PositionStatus::Expired)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PositionError {
    #[error("cannot transition to {to:?} from {from:?} (expected {expected:?})")]
    InvalidTransition {
        from: PositionStatus,
        to: PositionStatus,
        expected: PositionStatus,
    },
    #[error("position is already terminal ({0:?})")]
    AlreadyTerminal(PositionStatus),
}

/// A live market-maker position: one split, two legs, one owning task (§3).
#[derive(Debug, Clone)]
pub struct Position {
    pub market: Market,
    pub status: PositionStatus,
    pub entered_at: DateTime<Utc>,
    pub yes: Leg,
    pub no: Leg,
}

impl Position {
    /// Construct a position immediately after a successful split: both legs
    /// at the invariant entry price of exactly 0.5 (§3 Invariants).
    pub fn new(market: Market, shares_per_side: Decimal) -> Self {
        let entry_price = Decimal::new(5, 1);
        Self {
            yes: Leg::new(market.yes_token_id, shares_per_side, entry_price),
            no: Leg::new(market.no_token_id, shares_per_side, entry_price),
            market,
            status: PositionStatus::Entering,
            entered_at: Utc::now(),
        }
    }

    pub fn lifetime_remaining_secs(&self, now: DateTime<Utc>) -> i64 {
        self.market.lifetime_remaining_secs(now)
    }

    pub fn both_filled(&self) -> bool {
        self.yes.filled && self.no.filled
    }

    pub fn exactly_one_filled(&self) -> bool {
        self.yes.filled != self.no.filled
    }

    pub fn mark_monitoring(&mut self) -> Result<(), PositionError> {
        self.require(PositionStatus::Entering, PositionStatus::Monitoring)?;
        self.status = PositionStatus::Monitoring;
        Ok(())
    }

    pub fn mark_cutting(&mut self) -> Result<(), PositionError> {
        self.require(PositionStatus::Monitoring, PositionStatus::Cutting)?;
        self.status = PositionStatus::Cutting;
        Ok(())
    }

    pub fn mark_done(&mut self) -> Result<(), PositionError> {
        if self.status.is_terminal() {
            return Err(PositionError::AlreadyTerminal(self.status));
        }
        self.status = PositionStatus::Done;
        Ok(())
    }

    pub fn mark_expired(&mut self) -> Result<(), PositionError> {
        if self.status.is_terminal() {
            return Err(PositionError::AlreadyTerminal(self.status));
        }
        self.status = PositionStatus::Expired;
        Ok(())
    }

    /// Total realized P&L once both legs have a fill price; `None` while
    /// either leg is outstanding.
    pub fn total_pnl(&self) -> Option<Decimal> {
        Some(self.yes.pnl()? + self.no.pnl()?)
    }

    fn require(
        &self,
        expected: PositionStatus,
        to: PositionStatus,
    ) -> Result<(), PositionError> {
        if self.status != expected {
            return Err(PositionError::InvalidTransition {
                from: self.status,
                to,
                expected,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{b256, U256};

    fn sample_position() -> Position {
        let market = Market {
            asset: "btc".to_string(),
            condition_id: b256!("111111111111111111111111111111111111111111111111111111111111110a"),
            question: "Will BTC be up?".to_string(),
            open_time: Utc::now(),
            end_time: Utc::now() + chrono::Duration::seconds(300),
            yes_token_id: U256::from(1u64),
            no_token_id: U256::from(2u64),
            tick_size: Decimal::new(1, 2),
            neg_risk: false,
        };
        Position::new(market, Decimal::new(5, 0))
    }

    #[test]
    fn test_new_position_has_equal_legs_at_half() {
        let pos = sample_position();
        assert_eq!(pos.yes.shares, pos.no.shares);
        assert_eq!(pos.yes.entry_price, Decimal::new(5, 1));
        assert_eq!(pos.no.entry_price, Decimal::new(5, 1));
        assert_eq!(pos.status, PositionStatus::Entering);
    }

    #[test]
    fn test_lifecycle_happy_path() {
        let mut pos = sample_position();
        pos.mark_monitoring().unwrap();
        assert_eq!(pos.status, PositionStatus::Monitoring);

        pos.yes.mark_filled(Decimal::new(6, 1));
        pos.no.mark_filled(Decimal::new(6, 1));
        assert!(pos.both_filled());

        pos.mark_done().unwrap();
        assert_eq!(pos.status, PositionStatus::Done);
        assert_eq!(pos.total_pnl(), Some(Decimal::new(1, 0)));
    }

    #[test]
    fn test_invalid_transition_rejected() {
        let mut pos = sample_position();
        assert!(pos.mark_cutting().is_err());
    }

    #[test]
    fn test_double_terminal_rejected() {
        let mut pos = sample_position();
        pos.mark_monitoring().unwrap();
        pos.mark_done().unwrap();
        assert!(pos.mark_done().is_err());
        assert!(pos.mark_expired().is_err());
    }

    #[test]
    fn test_exactly_one_filled() {
        let mut pos = sample_position();
        pos.mark_monitoring().unwrap();
        assert!(!pos.exactly_one_filled());
        pos.yes.mark_filled(Decimal::new(6, 1));
        assert!(pos.exactly_one_filled());
    }
}
