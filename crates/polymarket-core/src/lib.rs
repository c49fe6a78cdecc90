//! Polymarket Core Library
//!
//! Data model, config, venue clients, on-chain transport/encoding and order
//! signing shared by the mm-bot crates.

pub mod api;
pub mod chain;
pub mod config;
pub mod error;
pub mod signing;
pub mod types;

pub use api::{ClobClient, MetadataClient, PositionsClient};
pub use chain::{Addresses, PolygonClient, SmartWalletTx};
pub use config::Config;
pub use error::{Error, Result};
pub use signing::OrderSigner;
pub use types::{Leg, Market, Position, PositionError, PositionStatus};
