//! Polygon JSON-RPC client: on-chain reads and raw transaction submission.
//!
//! C1 (in `trading-engine`) owns the retry/fee-floor policy around writes;
//! this client is the transport plus the handful of typed reads C1/C2/C7
//! need (nonce, gas price, balances, payout numerators/denominator).

use crate::chain::addresses::Addresses;
use crate::chain::calldata;
use crate::error::Error;
use alloy_primitives::{Address, Bytes, B256, U256};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub struct PolygonClient {
    rpc_url: String,
    http: reqwest::Client,
}

impl PolygonClient {
    pub fn new(rpc_url: String) -> Self {
        Self {
            rpc_url,
            http: reqwest::Client::new(),
        }
    }

    pub fn with_alchemy(api_key: &str) -> Self {
        Self::new(format!("https://polygon-mainnet.g.alchemy.com/v2/{api_key}"))
    }

    async fn rpc_call<T: for<'de> Deserialize<'de>>(
        &self,
        method: &str,
        params: Value,
    ) -> Result<T, Error> {
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            id: 1,
            method,
            params,
        };

        let response = self.http.post(&self.rpc_url).json(&request).send().await;
        let response = response.map_err(classify_reqwest_error)?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            return Err(Error::Rpc {
                message: format!("RPC request failed: HTTP {status}"),
                transient: (500..600).contains(&status),
            });
        }

        let body: JsonRpcResponse<T> = response.json().await.map_err(Error::Http)?;
        if let Some(err) = body.error {
            return Err(Error::Rpc {
                transient: is_transient_message(&err.message),
                message: err.message,
            });
        }
        body.result.ok_or_else(|| Error::Rpc {
            message: "RPC response had neither result nor error".to_string(),
            transient: false,
        })
    }

    async fn eth_call(&self, to: Address, data: Bytes) -> Result<Bytes, Error> {
        let hex_result: String = self
            .rpc_call(
                "eth_call",
                serde_json::json!([
                    { "to": format!("{to:?}"), "data": format!("0x{}", hex::encode(&data)) },
                    "latest"
                ]),
            )
            .await?;
        hex::decode(hex_result.trim_start_matches("0x"))
            .map(Bytes::from)
            .map_err(|e| Error::Rpc {
                message: format!("malformed eth_call result: {e}"),
                transient: false,
            })
    }

    pub async fn get_nonce(&self, address: Address) -> Result<u64, Error> {
        let hex_result: String = self
            .rpc_call(
                "eth_getTransactionCount",
                serde_json::json!([format!("{address:?}"), "latest"]),
            )
            .await?;
        parse_hex_u64(&hex_result)
    }

    /// Read the proxy wallet's own sequence number via `nonce()` (§4.1 step
    /// 2) — distinct from `get_nonce`, which reads the EOA's account nonce
    /// for the outer transaction that carries the `exec` call.
    pub async fn get_wallet_nonce(&self, wallet_address: Address) -> Result<U256, Error> {
        let data = crate::chain::wallet_tx::encode_wallet_nonce();
        let result = self.eth_call(wallet_address, data).await?;
        Ok(decode_u256(&result))
    }

    pub async fn get_gas_price(&self) -> Result<u128, Error> {
        let hex_result: String = self.rpc_call("eth_gasPrice", serde_json::json!([])).await?;
        parse_hex_u128(&hex_result)
    }

    pub async fn get_native_balance(&self, address: Address) -> Result<u128, Error> {
        let hex_result: String = self
            .rpc_call(
                "eth_getBalance",
                serde_json::json!([format!("{address:?}"), "latest"]),
            )
            .await?;
        parse_hex_u128(&hex_result)
    }

    /// Submit a raw, already-signed transaction. "already known"/"nonce too
    /// low" responses are treated as a likely-already-mined duplicate, not an
    /// error — matching the source's approval-sender behavior.
    pub async fn send_raw_transaction(&self, raw_tx: &[u8]) -> Result<String, Error> {
        let raw_hex = format!("0x{}", hex::encode(raw_tx));
        let result: Result<String, Error> = self
            .rpc_call("eth_sendRawTransaction", serde_json::json!([raw_hex]))
            .await;
        match result {
            Ok(hash) => Ok(hash),
            Err(Error::Rpc { message, .. })
                if message.contains("already known") || message.contains("nonce too low") =>
            {
                Ok("already_mined".to_string())
            }
            Err(e) => Err(e),
        }
    }

    /// Poll every 2s for up to 120s. Returns terminal `Error::Rpc` with
    /// `transient: false` on revert, `transient: true` on timeout (still
    /// pending after the window — node may just be slow).
    pub async fn wait_for_receipt(&self, tx_hash: &str) -> Result<(), Error> {
        if tx_hash == "already_mined" {
            return Ok(());
        }
        for _ in 0..60 {
            tokio::time::sleep(std::time::Duration::from_secs(2)).await;
            let receipt: Value = self
                .rpc_call(
                    "eth_getTransactionReceipt",
                    serde_json::json!([tx_hash]),
                )
                .await
                .unwrap_or(Value::Null);
            if receipt.is_null() {
                continue;
            }
            let status = receipt["status"].as_str().unwrap_or("0x0");
            if status == "0x1" {
                return Ok(());
            }
            return Err(Error::Rpc {
                message: format!("transaction {tx_hash} reverted"),
                transient: false,
            });
        }
        Err(Error::Rpc {
            message: format!("transaction {tx_hash} not mined after 120s"),
            transient: true,
        })
    }

    /// USDC collateral balance, in raw (6-decimal) on-chain units.
    pub async fn usdc_balance(&self, addresses: &Addresses, owner: Address) -> Result<U256, Error> {
        let data = calldata::encode_erc20_balance_of(owner);
        let result = self.eth_call(addresses.usdc, data).await?;
        Ok(decode_u256(&result))
    }

    pub async fn check_erc20_allowance(
        &self,
        addresses: &Addresses,
        owner: Address,
        spender: Address,
    ) -> Result<U256, Error> {
        let data = calldata::encode_allowance(owner, spender);
        let result = self.eth_call(addresses.usdc, data).await?;
        Ok(decode_u256(&result))
    }

    pub async fn check_erc1155_approval(
        &self,
        addresses: &Addresses,
        owner: Address,
        operator: Address,
    ) -> Result<bool, Error> {
        let data = calldata::encode_is_approved_for_all(owner, operator);
        let result = self.eth_call(addresses.conditional_tokens, data).await?;
        Ok(!decode_u256(&result).is_zero())
    }

    pub async fn balance_of(
        &self,
        addresses: &Addresses,
        owner: Address,
        token_id: U256,
    ) -> Result<U256, Error> {
        let data = calldata::encode_balance_of(owner, token_id);
        let result = self.eth_call(addresses.conditional_tokens, data).await?;
        Ok(decode_u256(&result))
    }

    pub async fn payout_denominator(
        &self,
        addresses: &Addresses,
        condition_id: B256,
    ) -> Result<U256, Error> {
        let data = calldata::encode_payout_denominator(condition_id);
        let result = self.eth_call(addresses.conditional_tokens, data).await?;
        Ok(decode_u256(&result))
    }

    pub async fn payout_numerator(
        &self,
        addresses: &Addresses,
        condition_id: B256,
        outcome_idx: u64,
    ) -> Result<U256, Error> {
        let data = calldata::encode_payout_numerator(condition_id, outcome_idx);
        let result = self.eth_call(addresses.conditional_tokens, data).await?;
        Ok(decode_u256(&result))
    }
}

fn decode_u256(data: &[u8]) -> U256 {
    if data.len() < 32 {
        return U256::ZERO;
    }
    U256::from_be_slice(&data[data.len() - 32..])
}

fn parse_hex_u64(hex_str: &str) -> Result<u64, Error> {
    u64::from_str_radix(hex_str.trim_start_matches("0x"), 16).map_err(|e| Error::Rpc {
        message: format!("could not parse hex u64 {hex_str:?}: {e}"),
        transient: false,
    })
}

fn parse_hex_u128(hex_str: &str) -> Result<u128, Error> {
    u128::from_str_radix(hex_str.trim_start_matches("0x"), 16).map_err(|e| Error::Rpc {
        message: format!("could not parse hex u128 {hex_str:?}: {e}"),
        transient: false,
    })
}

/// Classifies the transient/terminal conditions named in §4.1/§7: timeout,
/// server error, network error, connection refused, stale node are
/// transient; everything else (revert, insufficient funds, unpredictable
/// gas, nonce-already-used) is terminal.
fn is_transient_message(message: &str) -> bool {
    let lower = message.to_lowercase();
    const TRANSIENT_NEEDLES: &[&str] = &[
        "timeout",
        "timed out",
        "server error",
        "network error",
        "connection refused",
        "header not found",
        "502",
        "503",
        "504",
    ];
    TRANSIENT_NEEDLES.iter().any(|n| lower.contains(n))
}

fn classify_reqwest_error(e: reqwest::Error) -> Error {
    let transient = e.is_timeout() || e.is_connect() || e.is_request();
    Error::Rpc {
        message: e.to_string(),
        transient,
    }
}

#[derive(Debug, Serialize)]
struct JsonRpcRequest<'a> {
    jsonrpc: &'a str,
    id: u64,
    method: &'a str,
    params: Value,
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse<T> {
    result: Option<T>,
    error: Option<JsonRpcError>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcError {
    #[allow(dead_code)]
    code: i64,
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_transient_message() {
        assert!(is_transient_message("Request timeout"));
        assert!(is_transient_message("connection refused"));
        assert!(!is_transient_message("execution reverted: insufficient balance"));
    }

    #[test]
    fn test_parse_hex_u64() {
        assert_eq!(parse_hex_u64("0x2a").unwrap(), 42);
    }

    #[test]
    fn test_decode_u256_short_input_is_zero() {
        assert_eq!(decode_u256(&[]), U256::ZERO);
    }
}
