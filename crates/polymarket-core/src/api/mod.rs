//! HTTP clients for the Polymarket venue surfaces (CLOB, metadata, positions).
//! On-chain transport lives in [`crate::chain`].

pub mod clob;
pub mod metadata;
pub mod positions;

pub use clob::ClobClient;
pub use metadata::MetadataClient;
pub use positions::PositionsClient;
