//! Positions HTTP client (C7, §6): `/positions?user={wallet}`.

use crate::{Error, Result};
use alloy_primitives::{Address, B256, U256};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;

pub struct PositionsClient {
    base_url: String,
    http: reqwest::Client,
}

/// A single held position row as returned by the venue.
#[derive(Debug, Clone)]
pub struct HeldPosition {
    pub condition_id: B256,
    pub token_id: U256,
    pub size: Decimal,
}

impl PositionsClient {
    pub fn new(base_url: String) -> Self {
        Self {
            base_url,
            http: reqwest::Client::new(),
        }
    }

    pub async fn get_positions(&self, wallet: Address) -> Result<Vec<HeldPosition>> {
        let url = format!("{}/positions?user={:?}", self.base_url, wallet);
        let response = self.http.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(Error::Api {
                message: format!("positions lookup failed: HTTP {}", response.status()),
                status: Some(response.status().as_u16()),
            });
        }

        let raw: Vec<RawPosition> = response.json().await?;
        raw.into_iter().map(RawPosition::into_held).collect()
    }

    /// Group held positions by condition id, summing per-token balances —
    /// what C2.merge/C2.redeem and the cleanup phase operate on (§4.7).
    pub async fn get_positions_by_condition(
        &self,
        wallet: Address,
    ) -> Result<HashMap<B256, Vec<HeldPosition>>> {
        let positions = self.get_positions(wallet).await?;
        let mut grouped: HashMap<B256, Vec<HeldPosition>> = HashMap::new();
        for position in positions {
            grouped.entry(position.condition_id).or_default().push(position);
        }
        Ok(grouped)
    }
}

#[derive(Debug, Deserialize)]
struct RawPosition {
    #[serde(rename = "conditionId")]
    condition_id: String,
    asset: String,
    size: String,
}

impl RawPosition {
    fn into_held(self) -> Result<HeldPosition> {
        let condition_id: B256 = self.condition_id.parse().map_err(|_| {
            Error::InvalidMarket(format!("malformed conditionId {:?}", self.condition_id))
        })?;
        let token_id = U256::from_str_radix(&self.asset, 10)
            .map_err(|_| Error::InvalidMarket(format!("malformed asset token id {:?}", self.asset)))?;
        let size: Decimal = self
            .size
            .parse()
            .map_err(|_| Error::InvalidMarket(format!("malformed size {:?}", self.size)))?;
        Ok(HeldPosition {
            condition_id,
            token_id,
            size,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_position_into_held() {
        let raw = RawPosition {
            condition_id: "0x1111111111111111111111111111111111111111111111111111111111111a"
                .to_string(),
            asset: "12345".to_string(),
            size: "5.0".to_string(),
        };
        let held = raw.into_held().unwrap();
        assert_eq!(held.token_id, U256::from(12345u64));
        assert_eq!(held.size, Decimal::new(50, 1));
    }
}
