//! Wallet key loading for order and transaction signing.

pub mod wallet;

pub use wallet::TradingWallet;
