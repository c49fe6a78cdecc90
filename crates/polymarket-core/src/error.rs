//! Error types shared across the mm-bot crates.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid market data: {0}")]
    InvalidMarket(String),

    #[error("position error: {0}")]
    Position(String),

    #[error("venue API error: {message}")]
    Api { message: String, status: Option<u16> },

    /// An RPC or venue call failed. `transient` distinguishes the class C1's
    /// retry policy cares about (§4.1): timeouts, 5xx, connection errors and
    /// stale-node responses are transient; reverts, insufficient funds and
    /// unpredictable-gas are not.
    #[error("RPC error: {message}")]
    Rpc { message: String, transient: bool },
}

impl Error {
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::Rpc { transient: true, .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
