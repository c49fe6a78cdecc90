//! On-chain transport and encoding: contract addresses, calldata encoders,
//! the proxy wallet's tx tuple, and the Polygon JSON-RPC client.

pub mod addresses;
pub mod calldata;
pub mod polygon;
pub mod wallet_tx;

pub use addresses::Addresses;
pub use polygon::PolygonClient;
pub use wallet_tx::{SmartWalletTx, WalletOperation};
