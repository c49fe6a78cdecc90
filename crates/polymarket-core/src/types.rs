//! Core domain types: markets, orders and positions.

pub mod market;
pub mod order;
pub mod position;

pub use market::*;
pub use order::*;
pub use position::*;
