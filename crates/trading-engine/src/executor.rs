//! Wallet-Tx Serializer (C1): a single-writer queue over the proxy wallet's
//! `exec` entry point.
//!
//! Wallet nonces are sequential integers; two concurrent reads would race
//! for the same value and produce one accepted transaction plus one
//! "nonce too low" at inclusion time. Serializing every write through one
//! task that owns the channel receiver is strictly simpler than nonce
//! bookkeeping, and a failed call must not poison the queue for the next one.

use alloy_consensus::transaction::RlpEcdsaTx;
use alloy_consensus::TxLegacy;
use alloy_network::TxSignerSync;
use alloy_primitives::{bytes::BytesMut, Address, Bytes, TxKind, U256};
use alloy_signer::Signer;
use alloy_signer_local::PrivateKeySigner;
use polymarket_core::chain::wallet_tx::{encode_wallet_exec, SmartWalletTx};
use polymarket_core::chain::PolygonClient;
use polymarket_core::signing::POLYGON_CHAIN_ID;
use polymarket_core::{Error, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tracing::{error, info, warn};

/// Priority-fee floor (§4.1.3): used whenever the node's fee oracle quotes
/// below this.
pub const PRIORITY_FEE_FLOOR_WEI: u128 = 30_000_000_000;

/// Fee cap (§4.1.3): never bid above this regardless of the oracle quote.
pub const FEE_CAP_WEI: u128 = 500_000_000_000;

const MAX_ATTEMPTS: u32 = 3;
const RETRY_BACKOFF: Duration = Duration::from_secs(3);

/// Gas limit for the outer `exec` transaction. The proxy wallet forwards the
/// call and re-derives/checks the signature on-chain; 300k covers every
/// calldata shape C2 produces (split/merge/redeem, approvals) with margin.
const EXEC_GAS_LIMIT: u64 = 300_000;

#[derive(Debug, Clone)]
pub struct TxReceipt {
    pub tx_hash: String,
    pub label: String,
}

struct ExecRequest {
    target: Address,
    calldata: Bytes,
    label: String,
    reply: oneshot::Sender<Result<TxReceipt>>,
}

/// Handle to the queue. Cheap to clone; every clone shares the same
/// single-consumer task, so cloning `WalletExecutor` does not parallelize
/// writes.
#[derive(Clone)]
pub struct WalletExecutor {
    tx: mpsc::Sender<ExecRequest>,
}

impl WalletExecutor {
    /// Spawn the owning task and return a handle. `dry_run` skips all
    /// on-chain submission and returns a synthetic receipt (§6).
    pub fn spawn(
        polygon: Arc<PolygonClient>,
        wallet_address: Address,
        signer: PrivateKeySigner,
        dry_run: bool,
    ) -> Self {
        let (tx, rx) = mpsc::channel(64);
        tokio::spawn(run_queue(rx, polygon, wallet_address, signer, dry_run));
        Self { tx }
    }

    /// Serialize `target.calldata` through the proxy wallet. `label` is
    /// carried through to logging and the returned receipt only; it plays
    /// no role in execution order.
    pub async fn exec(
        &self,
        target: Address,
        calldata: Bytes,
        label: impl Into<String>,
    ) -> Result<TxReceipt> {
        let (reply_tx, reply_rx) = oneshot::channel();
        let request = ExecRequest {
            target,
            calldata,
            label: label.into(),
            reply: reply_tx,
        };
        self.tx.send(request).await.map_err(|_| Error::Rpc {
            message: "wallet executor queue closed".to_string(),
            transient: false,
        })?;
        reply_rx.await.map_err(|_| Error::Rpc {
            message: "wallet executor dropped the reply channel".to_string(),
            transient: false,
        })?
    }
}

async fn run_queue(
    mut rx: mpsc::Receiver<ExecRequest>,
    polygon: Arc<PolygonClient>,
    wallet_address: Address,
    signer: PrivateKeySigner,
    dry_run: bool,
) {
    while let Some(request) = rx.recv().await {
        let result = execute_with_retry(
            &polygon,
            wallet_address,
            &signer,
            request.target,
            request.calldata.clone(),
            &request.label,
            dry_run,
        )
        .await;
        if let Err(e) = &result {
            error!(label = %request.label, error = %e, "wallet exec failed terminally");
        }
        // A dropped receiver (caller gave up) is not this queue's problem.
        let _ = request.reply.send(result);
    }
    warn!("wallet executor queue closed: no senders remain");
}

async fn execute_with_retry(
    polygon: &PolygonClient,
    wallet_address: Address,
    signer: &PrivateKeySigner,
    target: Address,
    calldata: Bytes,
    label: &str,
    dry_run: bool,
) -> Result<TxReceipt> {
    if dry_run {
        info!(label = %label, "dry run: on-chain exec skipped");
        return Ok(TxReceipt {
            tx_hash: "dry_run".to_string(),
            label: label.to_string(),
        });
    }

    let mut attempt = 0u32;
    loop {
        attempt += 1;
        match try_exec(polygon, wallet_address, signer, target, &calldata, label).await {
            Ok(receipt) => return Ok(receipt),
            Err(e) if e.is_transient() && attempt < MAX_ATTEMPTS => {
                warn!(
                    label = %label,
                    attempt,
                    error = %e,
                    "transient wallet exec error, retrying after backoff"
                );
                tokio::time::sleep(RETRY_BACKOFF).await;
            }
            Err(e) => return Err(e),
        }
    }
}

async fn try_exec(
    polygon: &PolygonClient,
    wallet_address: Address,
    signer: &PrivateKeySigner,
    target: Address,
    calldata: &Bytes,
    label: &str,
) -> Result<TxReceipt> {
    let wallet_nonce = polygon.get_wallet_nonce(wallet_address).await?;
    let wallet_tx = SmartWalletTx::new(target, calldata.clone(), wallet_nonce);
    let digest = wallet_tx.hash();

    let signature = signer.sign_hash(&digest).await.map_err(|e| Error::Rpc {
        message: format!("failed to sign wallet tx hash: {e}"),
        transient: false,
    })?;
    let exec_calldata = encode_wallet_exec(&wallet_tx, Bytes::from(signature.as_bytes().to_vec()));

    let eoa_nonce = polygon.get_nonce(signer.address()).await?;
    let gas_price = fee_for_submission(polygon.get_gas_price().await?);

    let mut outer_tx = TxLegacy {
        chain_id: Some(POLYGON_CHAIN_ID),
        nonce: eoa_nonce,
        gas_price,
        gas_limit: EXEC_GAS_LIMIT,
        to: TxKind::Call(wallet_address),
        value: U256::ZERO,
        input: exec_calldata,
    };

    let raw_signature = signer.sign_transaction_sync(&mut outer_tx).map_err(|e| Error::Rpc {
        message: format!("failed to sign outer transaction: {e}"),
        transient: false,
    })?;
    let mut encoded = BytesMut::new();
    outer_tx.rlp_encode_signed(&raw_signature, &mut encoded);

    let tx_hash = polygon.send_raw_transaction(&encoded).await?;
    info!(label = %label, tx_hash = %tx_hash, "wallet exec submitted");
    polygon.wait_for_receipt(&tx_hash).await?;
    Ok(TxReceipt {
        tx_hash,
        label: label.to_string(),
    })
}

/// Clamp the oracle's quote to `[PRIORITY_FEE_FLOOR_WEI, FEE_CAP_WEI]`
/// (§4.1.3). Polygon's gas oracle returns a single effective gas price
/// rather than a separate base/priority split, so the floor and cap apply
/// to that one figure directly.
fn fee_for_submission(oracle_price: u128) -> u128 {
    oracle_price.clamp(PRIORITY_FEE_FLOOR_WEI, FEE_CAP_WEI)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fee_floor_applies_below_minimum() {
        assert_eq!(fee_for_submission(1_000_000_000), PRIORITY_FEE_FLOOR_WEI);
    }

    #[test]
    fn test_fee_cap_applies_above_maximum() {
        assert_eq!(fee_for_submission(1_000_000_000_000), FEE_CAP_WEI);
    }

    #[test]
    fn test_fee_passthrough_within_bounds() {
        assert_eq!(fee_for_submission(60_000_000_000), 60_000_000_000);
    }
}
