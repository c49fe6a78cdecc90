//! Trading Engine
//!
//! On-chain write path: the Wallet-Tx Serializer (C1), CTF split/merge/redeem
//! primitives (C2), and the startup-cleanup/periodic-redeemer (C7). CLOB
//! order placement itself lives in `polymarket_core::api::clob`; this crate
//! owns everything that writes to the chain.

pub mod ctf;
pub mod executor;
pub mod redeemer;

pub use ctf::CtfPrimitives;
pub use executor::{TxReceipt, WalletExecutor, FEE_CAP_WEI, PRIORITY_FEE_FLOOR_WEI};
pub use redeemer::Redeemer;
