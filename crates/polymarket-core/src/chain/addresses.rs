//! Contract addresses as a strongly-typed record, built once.
//!
//! Replaces the address-booked singletons the source kept as free-floating
//! string constants scattered through the signing and approval modules: one
//! `Addresses` value is constructed in `Config::from_env` and threaded into
//! every component that needs a contract address.

use alloy_primitives::Address;

/// CTF Exchange contract address on Polygon mainnet.
pub const CTF_EXCHANGE_ADDRESS: &str = "0x4bFb41d5B3570DeFd03C39a9A4D8dE6Bd8B8982E";

/// Neg Risk CTF Exchange contract address on Polygon mainnet.
pub const NEG_RISK_CTF_EXCHANGE_ADDRESS: &str = "0xC5d563A36AE78145C45a50134d48A1215220f80a";

/// Neg Risk Adapter address on Polygon mainnet.
pub const NEG_RISK_ADAPTER_ADDRESS: &str = "0xd91E80cF2E7be2e162c6513ceD06f1dD0dA35296";

/// USDC.e contract address on Polygon mainnet.
pub const USDC_ADDRESS: &str = "0x2791Bca1f2de4661ED88A30C99A7a9449Aa84174";

/// Conditional Tokens Framework (CTF) contract address on Polygon mainnet.
pub const CTF_ADDRESS: &str = "0x4D97DCd97eC945f40cF65F87097ACe5EA0476045";

/// All contract addresses this system writes to or reads from, resolved once
/// at startup instead of re-parsed from string constants at every call site.
#[derive(Debug, Clone, Copy)]
pub struct Addresses {
    pub ctf_exchange: Address,
    pub neg_risk_ctf_exchange: Address,
    pub neg_risk_adapter: Address,
    pub conditional_tokens: Address,
    pub usdc: Address,
}

impl Addresses {
    pub fn polygon_mainnet() -> Self {
        Self {
            ctf_exchange: CTF_EXCHANGE_ADDRESS.parse().expect("valid CTF exchange address"),
            neg_risk_ctf_exchange: NEG_RISK_CTF_EXCHANGE_ADDRESS
                .parse()
                .expect("valid neg risk CTF exchange address"),
            neg_risk_adapter: NEG_RISK_ADAPTER_ADDRESS
                .parse()
                .expect("valid neg risk adapter address"),
            conditional_tokens: CTF_ADDRESS.parse().expect("valid CTF address"),
            usdc: USDC_ADDRESS.parse().expect("valid USDC address"),
        }
    }

    /// Exchange operator address to approve, selecting the neg-risk variant
    /// when the market requires it (§4.2).
    pub fn exchange_for(&self, neg_risk: bool) -> Address {
        if neg_risk {
            self.neg_risk_ctf_exchange
        } else {
            self.ctf_exchange
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_addresses_parse() {
        let addrs = Addresses::polygon_mainnet();
        assert_ne!(addrs.ctf_exchange, Address::ZERO);
        assert_ne!(addrs.conditional_tokens, Address::ZERO);
    }

    #[test]
    fn test_exchange_for_selects_neg_risk() {
        let addrs = Addresses::polygon_mainnet();
        assert_eq!(addrs.exchange_for(true), addrs.neg_risk_ctf_exchange);
        assert_eq!(addrs.exchange_for(false), addrs.ctf_exchange);
    }
}
