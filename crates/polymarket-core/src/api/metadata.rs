//! Exchange metadata HTTP client (C4, §4.4, §6).
//!
//! Looks markets up by deterministic slug so the detector never needs a
//! push feed: `/markets/slug/{slug}`.

use crate::types::market::Market;
use crate::{Error, Result};
use alloy_primitives::{B256, U256};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;

pub struct MetadataClient {
    base_url: String,
    http: reqwest::Client,
}

impl MetadataClient {
    pub fn new(base_url: String) -> Self {
        Self {
            base_url,
            http: reqwest::Client::new(),
        }
    }

    /// Returns `Ok(None)` when the slug isn't live yet (404) — not an error,
    /// the detector just tries again next poll.
    pub async fn get_by_slug(&self, slug: &str, asset: &str) -> Result<Option<Market>> {
        let url = format!("{}/markets/slug/{}", self.base_url, slug);
        let response = self.http.get(&url).send().await?;

        if response.status().as_u16() == 404 {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(Error::Api {
                message: format!("metadata lookup failed: HTTP {}", response.status()),
                status: Some(response.status().as_u16()),
            });
        }

        let raw: RawMarket = response.json().await?;
        raw.into_market(asset).map(Some)
    }
}

/// Exchange metadata response shape (§6): `condition_id`, `clob_token_ids`
/// (array or JSON-encoded string — the venue is inconsistent), `question`,
/// `end_date_iso`, `event_start_time`, `neg_risk`, `minimum_tick_size`.
#[derive(Debug, Deserialize)]
struct RawMarket {
    condition_id: String,
    question: String,
    clob_token_ids: Value,
    end_date_iso: Option<String>,
    event_start_time: Option<String>,
    #[serde(default)]
    neg_risk: bool,
    #[serde(default = "default_tick_size")]
    minimum_tick_size: String,
}

fn default_tick_size() -> String {
    "0.01".to_string()
}

impl RawMarket {
    fn into_market(self, asset: &str) -> Result<Market> {
        let token_ids = parse_clob_token_ids(&self.clob_token_ids)?;
        if token_ids.len() != 2 {
            return Err(Error::InvalidMarket(format!(
                "expected 2 clob_token_ids, got {}",
                token_ids.len()
            )));
        }

        let condition_id: B256 = self.condition_id.parse().map_err(|_| {
            Error::InvalidMarket(format!("malformed condition_id {:?}", self.condition_id))
        })?;

        let end_time: DateTime<Utc> = self
            .end_date_iso
            .as_deref()
            .ok_or_else(|| Error::InvalidMarket("missing end_date_iso".to_string()))?
            .parse()
            .map_err(|_| Error::InvalidMarket("malformed end_date_iso".to_string()))?;

        let open_time: DateTime<Utc> = match self.event_start_time.as_deref() {
            Some(raw) => raw
                .parse()
                .map_err(|_| Error::InvalidMarket("malformed event_start_time".to_string()))?,
            None => Utc::now(),
        };

        let tick_size: Decimal = self.minimum_tick_size.parse().map_err(|_| {
            Error::InvalidMarket(format!(
                "malformed minimum_tick_size {:?}",
                self.minimum_tick_size
            ))
        })?;

        Ok(Market {
            asset: asset.to_string(),
            condition_id,
            question: self.question,
            open_time,
            end_time,
            yes_token_id: token_ids[0],
            no_token_id: token_ids[1],
            tick_size,
            neg_risk: self.neg_risk,
        })
    }
}

/// `clob_token_ids` arrives either as a JSON array of strings or as a single
/// JSON-encoded string containing that array.
fn parse_clob_token_ids(value: &Value) -> Result<Vec<U256>> {
    let array = match value {
        Value::Array(items) => items.clone(),
        Value::String(s) => serde_json::from_str::<Vec<String>>(s)
            .map_err(Error::Json)?
            .into_iter()
            .map(Value::String)
            .collect(),
        other => {
            return Err(Error::InvalidMarket(format!(
                "unexpected clob_token_ids shape: {other:?}"
            )))
        }
    };

    array
        .iter()
        .map(|v| {
            let s = v
                .as_str()
                .ok_or_else(|| Error::InvalidMarket("clob_token_ids entry not a string".into()))?;
            U256::from_str_radix(s, 10)
                .map_err(|_| Error::InvalidMarket(format!("malformed token id {s:?}")))
        })
        .collect()
}
