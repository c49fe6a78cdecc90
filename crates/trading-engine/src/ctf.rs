//! CTF Primitives (C2, §4.2): split collateral into outcome tokens, merge
//! back, redeem on resolution, and the idempotent approval preflight every
//! split needs before its first call.

use crate::executor::WalletExecutor;
use alloy_primitives::{Address, B256, U256};
use polymarket_core::chain::calldata::{
    encode_approve, encode_merge_positions, encode_redeem_positions, encode_set_approval_for_all,
    encode_split_position,
};
use polymarket_core::chain::{Addresses, PolygonClient};
use polymarket_core::config::MIN_SHARES_PER_SIDE;
use polymarket_core::{Error, Result};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::info;

/// 6-fraction-digit collateral scale (§3 "money representation").
const COLLATERAL_SCALE: u32 = 6;

fn decimal_to_collateral_units(amount: Decimal) -> U256 {
    let scaled = amount.round_dp(COLLATERAL_SCALE) * Decimal::from(10u64.pow(COLLATERAL_SCALE));
    U256::from(scaled.trunc().to_string().parse::<u128>().unwrap_or(0))
}

fn collateral_units_to_decimal(units: U256) -> Decimal {
    let raw: u128 = units.try_into().unwrap_or(u128::MAX);
    Decimal::from(raw) / Decimal::from(10u64.pow(COLLATERAL_SCALE))
}

pub struct CtfPrimitives {
    polygon: Arc<PolygonClient>,
    executor: WalletExecutor,
    addresses: Addresses,
    wallet_address: Address,
}

impl CtfPrimitives {
    pub fn new(
        polygon: Arc<PolygonClient>,
        executor: WalletExecutor,
        addresses: Addresses,
        wallet_address: Address,
    ) -> Self {
        Self {
            polygon,
            executor,
            addresses,
            wallet_address,
        }
    }

    /// Ensure the USDC allowance and CTF operator approval for the given
    /// exchange are current before the first split, idempotently — never
    /// re-approve if the allowance already covers `amount` and the operator
    /// is already approved (§4.2).
    async fn ensure_approvals(&self, operator: Address, amount: U256) -> Result<()> {
        let allowance = self
            .polygon
            .check_erc20_allowance(&self.addresses, self.wallet_address, operator)
            .await?;
        if allowance < amount {
            info!(operator = %operator, "USDC allowance insufficient, approving");
            self.executor
                .exec(
                    self.addresses.usdc,
                    encode_approve(operator),
                    "ctf:approve_usdc",
                )
                .await?;
        }

        let approved = self
            .polygon
            .check_erc1155_approval(&self.addresses, self.wallet_address, operator)
            .await?;
        if !approved {
            info!(operator = %operator, "CTF operator not approved, approving");
            self.executor
                .exec(
                    self.addresses.conditional_tokens,
                    encode_set_approval_for_all(operator),
                    "ctf:approve_operator",
                )
                .await?;
        }
        Ok(())
    }

    /// Burn `collateral_amount` and mint `collateral_amount` units of each
    /// outcome token. Rejects below the venue minimum (§4.2) without ever
    /// reaching the chain.
    pub async fn split(
        &self,
        condition_id: B256,
        collateral_amount: Decimal,
        neg_risk: bool,
    ) -> Result<Decimal> {
        if collateral_amount < Decimal::from(2) * MIN_SHARES_PER_SIDE {
            return Err(Error::Position(format!(
                "split amount {collateral_amount} below minimum {}",
                Decimal::from(2) * MIN_SHARES_PER_SIDE
            )));
        }

        let operator = self.addresses.exchange_for(neg_risk);
        let amount = decimal_to_collateral_units(collateral_amount);
        self.ensure_approvals(operator, amount).await?;

        self.executor
            .exec(
                self.addresses.conditional_tokens,
                encode_split_position(self.addresses.usdc, condition_id, amount),
                "ctf:split",
            )
            .await?;

        // Split mints equal amounts of both outcome tokens (§3 invariant).
        Ok(collateral_amount)
    }

    /// Convert equal amounts of both outcome tokens back to collateral.
    pub async fn merge(&self, condition_id: B256, shares_per_side: Decimal) -> Result<Decimal> {
        let amount = decimal_to_collateral_units(shares_per_side);
        self.executor
            .exec(
                self.addresses.conditional_tokens,
                encode_merge_positions(self.addresses.usdc, condition_id, amount),
                "ctf:merge",
            )
            .await?;
        Ok(shares_per_side)
    }

    /// Redeem all held outcome tokens of a resolved condition to collateral.
    pub async fn redeem(&self, condition_id: B256) -> Result<()> {
        self.executor
            .exec(
                self.addresses.conditional_tokens,
                encode_redeem_positions(self.addresses.usdc, condition_id),
                "ctf:redeem",
            )
            .await?;
        Ok(())
    }

    pub async fn balance_of(&self, token_id: U256) -> Result<Decimal> {
        let units = self
            .polygon
            .balance_of(&self.addresses, self.wallet_address, token_id)
            .await?;
        Ok(collateral_units_to_decimal(units))
    }

    /// USDC collateral balance (§4.5 step 1: "confirm collateral balance").
    pub async fn collateral_balance(&self) -> Result<Decimal> {
        let units = self
            .polygon
            .usdc_balance(&self.addresses, self.wallet_address)
            .await?;
        Ok(collateral_units_to_decimal(units))
    }

    /// Zero denominator means unresolved (§4.2).
    pub async fn payout_denominator(&self, condition_id: B256) -> Result<U256> {
        self.polygon
            .payout_denominator(&self.addresses, condition_id)
            .await
    }

    pub async fn payout_numerator(&self, condition_id: B256, outcome_idx: u64) -> Result<U256> {
        self.polygon
            .payout_numerator(&self.addresses, condition_id, outcome_idx)
            .await
    }

    /// Exposed so callers can pre-check allowance/approval state without
    /// forcing a write (e.g. in tests or dry-run diagnostics).
    pub async fn is_operator_approved(&self, operator: Address) -> Result<bool> {
        self.polygon
            .check_erc1155_approval(&self.addresses, self.wallet_address, operator)
            .await
    }

    pub async fn allowance(&self, operator: Address) -> Result<U256> {
        self.polygon
            .check_erc20_allowance(&self.addresses, self.wallet_address, operator)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decimal_collateral_roundtrip() {
        let amount = Decimal::new(5_000_000, 6); // 5.0
        let units = decimal_to_collateral_units(amount);
        assert_eq!(units, U256::from(5_000_000u64));
        assert_eq!(collateral_units_to_decimal(units), amount);
    }

    #[test]
    fn test_decimal_collateral_respects_scale() {
        let amount = Decimal::new(25, 1); // 2.5
        let units = decimal_to_collateral_units(amount);
        assert_eq!(units, U256::from(2_500_000u64));
    }
}
