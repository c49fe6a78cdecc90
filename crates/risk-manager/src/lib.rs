//! Risk Manager
//!
//! The Adaptive Cut-Loss Controller (C6) and the optional recovery-buy
//! sub-routine (§4.5.1) invoked by the position state machine when a
//! market-making leg goes unfilled past the cut-loss window.

pub mod adaptive_cutloss;
pub mod recovery;

pub use adaptive_cutloss::{profit_floor, CutLossOutcome, CutLossResult};
pub use recovery::RecoveryResult;
