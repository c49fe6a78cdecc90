//! Market-maker bot for short-lived binary prediction markets.
//!
//! This is the root crate that provides benchmark access to the internal
//! modules. For actual functionality, use the individual crates directly:
//!
//! - `polymarket-core`: data model, config, error, venue API clients, signing
//! - `trading-engine`: wallet-tx serializer, CTF primitives, CLOB gateway, redeemer
//! - `risk-manager`: adaptive cut-loss controller, recovery buy
//! - `auth`: trading wallet / signing key
//! - `mm-engine`: market detector, position state machine, binary entrypoint

// Re-export for benchmarks
pub use polymarket_core as core;
pub use risk_manager as risk;
pub use trading_engine as trading;
