//! Order types for the CLOB Order Gateway (C3, §4.3).

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// §8 Testable Property / §9 Open Question: the venue's own fill-detection
/// tolerance. Preserved as named constant rather than inlined, per source.
pub const FILL_TOLERANCE: Decimal = Decimal::from_parts(99, 0, 0, false, 2); // 0.99

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderSide {
    Buy,
    Sell,
}

/// Time-in-force for order placement (§4.3, GLOSSARY).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeInForce {
    /// Good-till-canceled.
    Gtc,
    /// Fill-or-kill: must be fully filled or cancelled.
    Fok,
    /// Fill-and-kill: takes available liquidity, cancels the remainder.
    Fak,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Live,
    Matched,
    Cancelled,
    Unknown,
}

impl OrderStatus {
    /// An order is filled when status is `MATCHED` or the matched size meets
    /// the venue's tolerance — never on `Live`/`Cancelled` alone (§4.3).
    pub fn is_filled(&self, size_matched: Decimal, expected_size: Decimal) -> bool {
        *self == OrderStatus::Matched || size_matched >= FILL_TOLERANCE * expected_size
    }
}

/// Result of `post_limit` (§4.3).
#[derive(Debug, Clone)]
pub struct PostLimitResult {
    pub ok: bool,
    pub order_id: String,
}

/// Result of `post_market` (§4.3). `amount` on the request is in collateral
/// units for BUY, shares for SELL; the response reports what actually
/// matched.
#[derive(Debug, Clone)]
pub struct PostMarketResult {
    pub ok: bool,
    pub fill_price: Decimal,
    pub taking_amount: Decimal,
    pub making_amount: Decimal,
}

impl PostMarketResult {
    /// FAK filling zero shares is "no liquidity", not an error (§8 boundary).
    pub fn is_no_liquidity(&self) -> bool {
        self.taking_amount.is_zero() && self.making_amount.is_zero()
    }
}

/// An open order as returned by `open_orders`.
#[derive(Debug, Clone, Deserialize)]
pub struct Order {
    pub order_id: String,
    pub asset_id: String,
    pub side: OrderSide,
    pub price: Decimal,
    pub original_size: Decimal,
    pub size_matched: Decimal,
    pub status: OrderStatus,
}

/// `order_status` response shape.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderStatusResult {
    pub status: OrderStatus,
    pub size_matched: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_filled_by_matched_status() {
        let status = OrderStatus::Matched;
        assert!(status.is_filled(Decimal::ZERO, Decimal::new(5, 0)));
    }

    #[test]
    fn test_is_filled_by_tolerance() {
        let status = OrderStatus::Live;
        assert!(status.is_filled(Decimal::new(495, 2), Decimal::new(5, 0)));
        assert!(!status.is_filled(Decimal::new(4, 0), Decimal::new(5, 0)));
    }

    #[test]
    fn test_post_market_no_liquidity() {
        let result = PostMarketResult {
            ok: true,
            fill_price: Decimal::ZERO,
            taking_amount: Decimal::ZERO,
            making_amount: Decimal::ZERO,
        };
        assert!(result.is_no_liquidity());
    }
}
