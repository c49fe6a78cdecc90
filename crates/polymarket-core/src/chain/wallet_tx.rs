//! Smart-contract (proxy) wallet transaction hashing and `exec` calldata.
//!
//! The proxy wallet holds collateral but only executes calls signed by the
//! EOA key. C1 reads the wallet's nonce, builds a `SmartWalletTx`, hashes it,
//! signs the raw hash (no EIP-191 prefix), and submits the signature through
//! the wallet's `exec` entry point — mirroring the EIP-712 struct-hash idiom
//! the order signer already uses, but over the wallet's own tuple rather
//! than an order.

use alloy_primitives::{keccak256, Address, Bytes, B256, U256};
use alloy_sol_types::{sol, SolCall, SolValue};

/// Operation kind for a Safe-style proxy wallet call. `Call` is the only kind
/// this system ever submits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalletOperation {
    Call = 0,
}

/// The tuple C1 hashes and signs: `(target, value, calldata, operation,
/// safeTxGas, baseGas, gasPrice, gasToken, refundReceiver, payment, nonce)`.
#[derive(Debug, Clone)]
pub struct SmartWalletTx {
    pub target: Address,
    pub calldata: Bytes,
    pub nonce: U256,
}

impl SmartWalletTx {
    pub fn new(target: Address, calldata: Bytes, nonce: U256) -> Self {
        Self { target, calldata, nonce }
    }

    /// Hash over the full tuple, with every non-named field pinned to zero
    /// per the contract (no tip, no gas token, no refund receiver, no extra
    /// payment) — this system never customizes those.
    pub fn hash(&self) -> B256 {
        let encoded = (
            self.target,
            U256::ZERO,               // value
            self.calldata.clone(),
            WalletOperation::Call as u8,
            U256::ZERO,                // safeTxGas
            U256::ZERO,                // baseGas
            U256::ZERO,                // gasPrice
            Address::ZERO,             // gasToken
            Address::ZERO,             // refundReceiver
            U256::ZERO,                // payment
            self.nonce,
        )
            .abi_encode_packed();
        keccak256(&encoded)
    }
}

sol! {
    interface IProxyWallet {
        function nonce() external view returns (uint256);
        function exec(bytes calldata transaction, bytes calldata signature) external returns (bool);
    }
}

/// Encode `nonce()` calldata for an `eth_call`.
pub fn encode_wallet_nonce() -> Bytes {
    Bytes::from(IProxyWallet::nonceCall {}.abi_encode())
}

/// Encode the `exec(transaction, signature)` calldata the wallet expects.
/// `transaction` here is the ABI-packed tuple `hash()` was computed over,
/// matching what the wallet contract re-derives and checks the signature
/// against.
pub fn encode_wallet_exec(tx: &SmartWalletTx, signature: Bytes) -> Bytes {
    let transaction = (
        tx.target,
        U256::ZERO,
        tx.calldata.clone(),
        WalletOperation::Call as u8,
        U256::ZERO,
        U256::ZERO,
        U256::ZERO,
        Address::ZERO,
        Address::ZERO,
        U256::ZERO,
        tx.nonce,
    )
        .abi_encode_packed();

    Bytes::from(
        IProxyWallet::execCall {
            transaction: Bytes::from(transaction),
            signature,
        }
        .abi_encode(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_deterministic() {
        let tx = SmartWalletTx::new(Address::ZERO, Bytes::from(vec![1, 2, 3]), U256::from(1u64));
        assert_eq!(tx.hash(), tx.hash());
    }

    #[test]
    fn test_hash_changes_with_nonce() {
        let tx1 = SmartWalletTx::new(Address::ZERO, Bytes::from(vec![1, 2, 3]), U256::from(1u64));
        let tx2 = SmartWalletTx::new(Address::ZERO, Bytes::from(vec![1, 2, 3]), U256::from(2u64));
        assert_ne!(tx1.hash(), tx2.hash());
    }

    #[test]
    fn test_encode_wallet_nonce_has_selector() {
        let data = encode_wallet_nonce();
        assert_eq!(&data[0..4], &IProxyWallet::nonceCall::SELECTOR);
    }
}
