//! Configuration loading for the mm-bot.
//!
//! Every option recognized by the engine maps to exactly one field here, and
//! is validated at load time rather than defaulted silently. A value that is
//! present but malformed or out of bounds is a fatal startup error.

use crate::chain::addresses::Addresses;
use rust_decimal::Decimal;
use std::env;
use std::str::FromStr;

/// Venue minimum collateral per side for a split.
pub const MIN_SHARES_PER_SIDE: Decimal = Decimal::from_parts(25, 0, 0, false, 1); // 2.5

#[derive(Debug, Clone)]
pub struct Config {
    pub mm: MmConfig,
    pub polygon: PolygonConfig,
    pub venue: VenueConfig,
    pub addresses: Addresses,
    pub redeem_interval_secs: u64,
    pub dry_run: bool,
}

#[derive(Debug, Clone)]
pub struct MmConfig {
    /// `mm_assets` — one position-task slot per entry.
    pub assets: Vec<String>,
    /// Derived from `mm_duration` ("5m" -> 300, "15m" -> 900).
    pub slot_seconds: i64,
    /// `mm_trade_size` — collateral per side; must be >= MIN_SHARES_PER_SIDE.
    pub trade_size: Decimal,
    /// `mm_sell_price` — GTC limit target for both initial sells, in (0, 1).
    pub sell_price: Decimal,
    /// `mm_cut_loss_time` — seconds before end_time when cut-loss triggers.
    pub cut_loss_time_secs: i64,
    /// `mm_poll_interval` — detector poll period.
    pub poll_interval_secs: u64,
    /// `mm_adaptive_cl`.
    pub adaptive_cl: bool,
    /// `mm_adaptive_min_combined`.
    pub adaptive_min_combined: Decimal,
    /// `mm_adaptive_monitor_sec`.
    pub adaptive_monitor_secs: u64,
    /// `mm_recovery_buy`.
    pub recovery_buy: bool,
    /// `mm_recovery_threshold`.
    pub recovery_threshold: Decimal,
    /// `mm_recovery_size`; 0 means "use trade_size" (§4.5.1).
    pub recovery_size: Decimal,
}

#[derive(Debug, Clone)]
pub struct PolygonConfig {
    pub rpc_url: Option<String>,
    pub alchemy_api_key: Option<String>,
    pub chain_id: u64,
}

impl PolygonConfig {
    pub fn get_rpc_url(&self) -> Option<String> {
        self.rpc_url.clone().or_else(|| {
            self.alchemy_api_key
                .as_ref()
                .map(|key| format!("https://polygon-mainnet.g.alchemy.com/v2/{}", key))
        })
    }
}

#[derive(Debug, Clone)]
pub struct VenueConfig {
    pub clob_base_url: String,
    pub metadata_base_url: String,
    pub positions_base_url: String,
    /// L2 API credentials; derived on first run via `OrderSigner::sign_clob_auth_message`
    /// when absent (§4.3.1), so these start out optional.
    pub api_key: Option<String>,
    pub api_secret: Option<String>,
    pub api_passphrase: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),
    #[error("invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let assets = env_var("MM_ASSETS")
            .unwrap_or_else(|| "btc,eth".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>();
        if assets.is_empty() {
            return Err(ConfigError::Invalid {
                field: "MM_ASSETS",
                reason: "must list at least one asset".into(),
            });
        }

        let duration = env_var("MM_DURATION").unwrap_or_else(|| "5m".to_string());
        let slot_seconds = match duration.as_str() {
            "5m" => 300,
            "15m" => 900,
            other => {
                return Err(ConfigError::Invalid {
                    field: "MM_DURATION",
                    reason: format!("expected \"5m\" or \"15m\", got {other:?}"),
                })
            }
        };

        let trade_size = parse_decimal_field("MM_TRADE_SIZE", "5.0")?;
        if trade_size < MIN_SHARES_PER_SIDE {
            return Err(ConfigError::Invalid {
                field: "MM_TRADE_SIZE",
                reason: format!("must be >= {MIN_SHARES_PER_SIDE}"),
            });
        }

        let sell_price = parse_decimal_field("MM_SELL_PRICE", "0.60")?;
        if sell_price <= Decimal::ZERO || sell_price >= Decimal::ONE {
            return Err(ConfigError::Invalid {
                field: "MM_SELL_PRICE",
                reason: "must be in (0, 1)".into(),
            });
        }

        let cut_loss_time_secs = parse_field("MM_CUT_LOSS_TIME", "60")?;
        let poll_interval_secs = parse_field("MM_POLL_INTERVAL", "10")?;
        let adaptive_cl = parse_bool("MM_ADAPTIVE_CL", false)?;
        let adaptive_min_combined = parse_decimal_field("MM_ADAPTIVE_MIN_COMBINED", "1.0")?;
        let adaptive_monitor_secs = parse_field("MM_ADAPTIVE_MONITOR_SEC", "5")?;
        let recovery_buy = parse_bool("MM_RECOVERY_BUY", false)?;
        let recovery_threshold = parse_decimal_field("MM_RECOVERY_THRESHOLD", "0.55")?;
        let recovery_size = parse_decimal_field("MM_RECOVERY_SIZE", "0")?;

        let redeem_interval_secs = parse_field("REDEEM_INTERVAL", "60")?;
        let dry_run = parse_bool("DRY_RUN", true)?;

        let polygon = PolygonConfig {
            rpc_url: env_var("POLYGON_RPC_URL"),
            alchemy_api_key: env_var("ALCHEMY_API_KEY"),
            chain_id: 137,
        };
        if polygon.get_rpc_url().is_none() && !dry_run {
            return Err(ConfigError::Missing("POLYGON_RPC_URL or ALCHEMY_API_KEY"));
        }

        let venue = VenueConfig {
            clob_base_url: env_var("CLOB_BASE_URL")
                .unwrap_or_else(|| "https://clob.polymarket.com".to_string()),
            metadata_base_url: env_var("METADATA_BASE_URL")
                .unwrap_or_else(|| "https://gamma-api.polymarket.com".to_string()),
            positions_base_url: env_var("POSITIONS_BASE_URL")
                .unwrap_or_else(|| "https://data-api.polymarket.com".to_string()),
            api_key: env_var("CLOB_API_KEY"),
            api_secret: env_var("CLOB_API_SECRET"),
            api_passphrase: env_var("CLOB_API_PASSPHRASE"),
        };

        Ok(Self {
            mm: MmConfig {
                assets,
                slot_seconds,
                trade_size,
                sell_price,
                cut_loss_time_secs,
                poll_interval_secs,
                adaptive_cl,
                adaptive_min_combined,
                adaptive_monitor_secs,
                recovery_buy,
                recovery_threshold,
                recovery_size,
            },
            polygon,
            venue,
            addresses: Addresses::polygon_mainnet(),
            redeem_interval_secs,
            dry_run,
        })
    }

    #[cfg(test)]
    pub fn test_config() -> Self {
        Self {
            mm: MmConfig {
                assets: vec!["btc".to_string()],
                slot_seconds: 300,
                trade_size: Decimal::new(5, 0),
                sell_price: Decimal::new(60, 2),
                cut_loss_time_secs: 60,
                poll_interval_secs: 10,
                adaptive_cl: true,
                adaptive_min_combined: Decimal::new(120, 2),
                adaptive_monitor_secs: 5,
                recovery_buy: false,
                recovery_threshold: Decimal::new(55, 2),
                recovery_size: Decimal::ZERO,
            },
            polygon: PolygonConfig {
                rpc_url: Some("http://localhost:8545".to_string()),
                alchemy_api_key: None,
                chain_id: 137,
            },
            venue: VenueConfig {
                clob_base_url: "http://localhost:8080".to_string(),
                metadata_base_url: "http://localhost:8081".to_string(),
                positions_base_url: "http://localhost:8082".to_string(),
                api_key: None,
                api_secret: None,
                api_passphrase: None,
            },
            addresses: Addresses::polygon_mainnet(),
            redeem_interval_secs: 60,
            dry_run: true,
        }
    }
}

fn env_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.is_empty())
}

fn parse_field<T: FromStr>(name: &'static str, default: &str) -> Result<T, ConfigError> {
    let raw = env_var(name).unwrap_or_else(|| default.to_string());
    raw.parse::<T>().map_err(|_| ConfigError::Invalid {
        field: name,
        reason: format!("could not parse {raw:?}"),
    })
}

fn parse_decimal_field(name: &'static str, default: &str) -> Result<Decimal, ConfigError> {
    let raw = env_var(name).unwrap_or_else(|| default.to_string());
    Decimal::from_str(&raw).map_err(|_| ConfigError::Invalid {
        field: name,
        reason: format!("could not parse decimal {raw:?}"),
    })
}

fn parse_bool(name: &'static str, default: bool) -> Result<bool, ConfigError> {
    match env_var(name) {
        None => Ok(default),
        Some(raw) => match raw.to_lowercase().as_str() {
            "1" | "true" | "yes" => Ok(true),
            "0" | "false" | "no" => Ok(false),
            _ => Err(ConfigError::Invalid {
                field: name,
                reason: format!("expected a boolean, got {raw:?}"),
            }),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_has_sane_defaults() {
        let cfg = Config::test_config();
        assert_eq!(cfg.mm.slot_seconds, 300);
        assert!(cfg.mm.trade_size >= MIN_SHARES_PER_SIDE);
    }

    #[test]
    fn test_polygon_rpc_url_falls_back_to_alchemy() {
        let cfg = PolygonConfig {
            rpc_url: None,
            alchemy_api_key: Some("KEY".to_string()),
            chain_id: 137,
        };
        assert_eq!(
            cfg.get_rpc_url(),
            Some("https://polygon-mainnet.g.alchemy.com/v2/KEY".to_string())
        );
    }

    #[test]
    fn test_polygon_rpc_url_prefers_explicit_url() {
        let cfg = PolygonConfig {
            rpc_url: Some("https://example.test".to_string()),
            alchemy_api_key: Some("KEY".to_string()),
            chain_id: 137,
        };
        assert_eq!(cfg.get_rpc_url(), Some("https://example.test".to_string()));
    }
}
