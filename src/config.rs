//! Configuration loading and validation

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::Error;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub rpc: RpcConfig,
    #[serde(default)]
    pub base_asset: BaseAssetConfig,
    #[serde(default)]
    pub quality: QualityPolicy,
    #[serde(default)]
    pub exit: ExitPolicy,
    #[serde(default)]
    pub positions: PositionPolicy,
    #[serde(default)]
    pub trading: TradingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RpcConfig {
    #[serde(default = "default_rpc_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            endpoint: default_rpc_endpoint(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

/// The reference asset every pool is priced against
#[derive(Debug, Clone, Deserialize)]
pub struct BaseAssetConfig {
    #[serde(default = "default_base_address")]
    pub address: String,
    #[serde(default = "default_base_symbol")]
    pub symbol: String,
    /// USD price of one base-asset unit, used for market-cap estimation
    #[serde(default = "default_base_usd_price")]
    pub usd_price: f64,
}

impl Default for BaseAssetConfig {
    fn default() -> Self {
        Self {
            address: default_base_address(),
            symbol: default_base_symbol(),
            usd_price: default_base_usd_price(),
        }
    }
}

/// Points available to each scoring dimension. Must sum to exactly 100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreWeights {
    #[serde(default = "default_weight_liquidity")]
    pub liquidity: u32,
    #[serde(default = "default_weight_market_cap")]
    pub market_cap: u32,
    #[serde(default = "default_weight_security")]
    pub security: u32,
    #[serde(default = "default_weight_holders")]
    pub holders: u32,
    #[serde(default = "default_weight_contract")]
    pub contract: u32,
}

impl ScoreWeights {
    pub fn total(&self) -> u32 {
        self.liquidity + self.market_cap + self.security + self.holders + self.contract
    }
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            liquidity: default_weight_liquidity(),
            market_cap: default_weight_market_cap(),
            security: default_weight_security(),
            holders: default_weight_holders(),
            contract: default_weight_contract(),
        }
    }
}

/// Thresholds and named heuristics for the quality analyzer.
///
/// Liquidity values are denominated in base-asset units, market caps in USD,
/// and every `*_pct` field is a percentage (30 = 30%).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityPolicy {
    // Liquidity
    #[serde(default = "default_min_liquidity")]
    pub min_liquidity: f64,
    #[serde(default = "default_max_liquidity")]
    pub max_liquidity: f64,
    #[serde(default = "default_optimal_liquidity_min")]
    pub optimal_liquidity_min: f64,
    #[serde(default = "default_optimal_liquidity_max")]
    pub optimal_liquidity_max: f64,
    /// Credit for liquidity between the hard minimum and the optimal range
    #[serde(default = "default_liquidity_low_tier")]
    pub liquidity_low_tier_pct: u32,
    /// Credit for liquidity between the optimal range and the hard maximum
    #[serde(default = "default_liquidity_high_tier")]
    pub liquidity_high_tier_pct: u32,

    // Market cap
    #[serde(default = "default_market_cap_min")]
    pub market_cap_min_usd: f64,
    #[serde(default = "default_market_cap_max")]
    pub market_cap_max_usd: f64,
    #[serde(default = "default_market_cap_upper_limit")]
    pub market_cap_upper_limit_usd: f64,
    #[serde(default = "default_market_cap_decent_tier")]
    pub market_cap_decent_tier_pct: u32,
    #[serde(default = "default_market_cap_low_tier")]
    pub market_cap_low_tier_pct: u32,
    /// Supply estimate (as a multiple of pooled tokens) when the chain
    /// cannot report total supply
    #[serde(default = "default_fallback_supply_multiplier")]
    pub fallback_supply_multiplier: f64,

    // Security
    #[serde(default = "default_true")]
    pub check_honeypot: bool,
    #[serde(default = "default_max_buy_tax")]
    pub max_buy_tax_pct: f64,
    #[serde(default = "default_max_sell_tax")]
    pub max_sell_tax_pct: f64,
    #[serde(default)]
    pub require_mint_revoked: bool,
    #[serde(default)]
    pub require_freeze_revoked: bool,
    /// Security credit granted when authority status cannot be fetched
    #[serde(default)]
    pub authority_unknown_credit_pct: u32,

    // Holder distribution
    #[serde(default = "default_max_top_holder")]
    pub max_top_holder_pct: f64,
    #[serde(default = "default_holder_great_below")]
    pub holder_great_below_pct: f64,
    #[serde(default = "default_holder_good_below")]
    pub holder_good_below_pct: f64,
    #[serde(default = "default_holder_good_credit")]
    pub holder_good_credit_pct: u32,
    #[serde(default = "default_holder_moderate_credit")]
    pub holder_moderate_credit_pct: u32,
    /// Holder credit granted when concentration cannot be fetched
    #[serde(default = "default_holder_unknown_credit")]
    pub holder_unknown_credit_pct: u32,

    // Contract trust
    #[serde(default)]
    pub require_verified_contract: bool,
    #[serde(default = "default_unverified_credit")]
    pub unverified_credit_pct: u32,

    // Quick filter
    #[serde(default = "default_true")]
    pub filter_low_trust_factory: bool,
    #[serde(default = "default_low_trust_suffixes")]
    pub low_trust_address_suffixes: Vec<String>,

    // Decision
    #[serde(default = "default_minimum_score")]
    pub minimum_score: u32,
    #[serde(default)]
    pub auto_trade: bool,
    #[serde(default = "default_lookup_timeout_ms")]
    pub lookup_timeout_ms: u64,

    #[serde(default)]
    pub weights: ScoreWeights,
}

impl Default for QualityPolicy {
    fn default() -> Self {
        Self {
            min_liquidity: default_min_liquidity(),
            max_liquidity: default_max_liquidity(),
            optimal_liquidity_min: default_optimal_liquidity_min(),
            optimal_liquidity_max: default_optimal_liquidity_max(),
            liquidity_low_tier_pct: default_liquidity_low_tier(),
            liquidity_high_tier_pct: default_liquidity_high_tier(),
            market_cap_min_usd: default_market_cap_min(),
            market_cap_max_usd: default_market_cap_max(),
            market_cap_upper_limit_usd: default_market_cap_upper_limit(),
            market_cap_decent_tier_pct: default_market_cap_decent_tier(),
            market_cap_low_tier_pct: default_market_cap_low_tier(),
            fallback_supply_multiplier: default_fallback_supply_multiplier(),
            check_honeypot: true,
            max_buy_tax_pct: default_max_buy_tax(),
            max_sell_tax_pct: default_max_sell_tax(),
            require_mint_revoked: false,
            require_freeze_revoked: false,
            authority_unknown_credit_pct: 0,
            max_top_holder_pct: default_max_top_holder(),
            holder_great_below_pct: default_holder_great_below(),
            holder_good_below_pct: default_holder_good_below(),
            holder_good_credit_pct: default_holder_good_credit(),
            holder_moderate_credit_pct: default_holder_moderate_credit(),
            holder_unknown_credit_pct: default_holder_unknown_credit(),
            require_verified_contract: false,
            unverified_credit_pct: default_unverified_credit(),
            filter_low_trust_factory: true,
            low_trust_address_suffixes: default_low_trust_suffixes(),
            minimum_score: default_minimum_score(),
            auto_trade: false,
            lookup_timeout_ms: default_lookup_timeout_ms(),
            weights: ScoreWeights::default(),
        }
    }
}

impl QualityPolicy {
    /// Validate weights and range ordering. Called once at analyzer construction.
    pub fn validate(&self) -> crate::error::Result<()> {
        let thresholds = [
            ("min_liquidity", self.min_liquidity),
            ("max_liquidity", self.max_liquidity),
            ("optimal_liquidity_min", self.optimal_liquidity_min),
            ("optimal_liquidity_max", self.optimal_liquidity_max),
            ("market_cap_min_usd", self.market_cap_min_usd),
            ("market_cap_max_usd", self.market_cap_max_usd),
            ("market_cap_upper_limit_usd", self.market_cap_upper_limit_usd),
            ("fallback_supply_multiplier", self.fallback_supply_multiplier),
            ("max_buy_tax_pct", self.max_buy_tax_pct),
            ("max_sell_tax_pct", self.max_sell_tax_pct),
            ("max_top_holder_pct", self.max_top_holder_pct),
            ("holder_great_below_pct", self.holder_great_below_pct),
            ("holder_good_below_pct", self.holder_good_below_pct),
        ];
        if let Some((name, value)) = thresholds.iter().find(|(_, v)| !v.is_finite()) {
            return Err(Error::Config(format!("{} must be a finite number, got {}", name, value)));
        }

        let total = self.weights.total();
        if total != 100 {
            return Err(Error::Config(format!(
                "score weights must sum to 100, got {}",
                total
            )));
        }

        if self.min_liquidity < 0.0
            || self.min_liquidity > self.optimal_liquidity_min
            || self.optimal_liquidity_min > self.optimal_liquidity_max
            || self.optimal_liquidity_max > self.max_liquidity
        {
            return Err(Error::Config(format!(
                "liquidity bounds must satisfy min <= optimal_min <= optimal_max <= max, got {} / {} / {} / {}",
                self.min_liquidity,
                self.optimal_liquidity_min,
                self.optimal_liquidity_max,
                self.max_liquidity
            )));
        }

        if self.market_cap_min_usd < 0.0
            || self.market_cap_min_usd > self.market_cap_max_usd
            || self.market_cap_max_usd > self.market_cap_upper_limit_usd
        {
            return Err(Error::Config(format!(
                "market cap bounds must satisfy min <= max <= upper_limit, got {} / {} / {}",
                self.market_cap_min_usd, self.market_cap_max_usd, self.market_cap_upper_limit_usd
            )));
        }

        if self.holder_great_below_pct > self.holder_good_below_pct
            || self.holder_good_below_pct > self.max_top_holder_pct
            || self.max_top_holder_pct > 100.0
        {
            return Err(Error::Config(format!(
                "holder tiers must satisfy great <= good <= max <= 100, got {} / {} / {}",
                self.holder_great_below_pct, self.holder_good_below_pct, self.max_top_holder_pct
            )));
        }

        let tiers = [
            ("liquidity_low_tier_pct", self.liquidity_low_tier_pct),
            ("liquidity_high_tier_pct", self.liquidity_high_tier_pct),
            ("market_cap_decent_tier_pct", self.market_cap_decent_tier_pct),
            ("market_cap_low_tier_pct", self.market_cap_low_tier_pct),
            ("authority_unknown_credit_pct", self.authority_unknown_credit_pct),
            ("holder_good_credit_pct", self.holder_good_credit_pct),
            ("holder_moderate_credit_pct", self.holder_moderate_credit_pct),
            ("holder_unknown_credit_pct", self.holder_unknown_credit_pct),
            ("unverified_credit_pct", self.unverified_credit_pct),
        ];
        for (name, pct) in tiers {
            if pct > 100 {
                return Err(Error::Config(format!("{} cannot exceed 100, got {}", name, pct)));
            }
        }

        if self.minimum_score > 100 {
            return Err(Error::Config(format!(
                "minimum_score cannot exceed 100, got {}",
                self.minimum_score
            )));
        }

        if self.fallback_supply_multiplier <= 0.0 {
            return Err(Error::Config("fallback_supply_multiplier must be positive".into()));
        }

        Ok(())
    }
}

/// Exit thresholds applied to a position when it opens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExitPolicy {
    #[serde(default = "default_stop_loss_pct")]
    pub stop_loss_pct: f64,
    #[serde(default = "default_take_profit_pct")]
    pub take_profit_pct: f64,
    #[serde(default = "default_true")]
    pub trailing_stop_enabled: bool,
    /// Distance from peak to trigger sell (e.g., 20 = sell if drops 20% from peak)
    #[serde(default = "default_trailing_stop_pct")]
    pub trailing_stop_pct: f64,
    /// Take-profit only fires when unrealized P&L is at least this much
    #[serde(default = "default_min_profit_pct")]
    pub min_profit_pct: f64,
    #[serde(default = "default_max_hold_secs")]
    pub max_hold_secs: u64,
}

impl Default for ExitPolicy {
    fn default() -> Self {
        Self {
            stop_loss_pct: default_stop_loss_pct(),
            take_profit_pct: default_take_profit_pct(),
            trailing_stop_enabled: true,
            trailing_stop_pct: default_trailing_stop_pct(),
            min_profit_pct: default_min_profit_pct(),
            max_hold_secs: default_max_hold_secs(),
        }
    }
}

impl ExitPolicy {
    pub fn validate(&self) -> crate::error::Result<()> {
        // Written as positive range checks so NaN fails them
        if !(self.stop_loss_pct > 0.0 && self.stop_loss_pct < 100.0) {
            return Err(Error::Config(format!(
                "stop_loss_pct must be between 0 and 100, got {}",
                self.stop_loss_pct
            )));
        }
        if !(self.take_profit_pct > 0.0 && self.take_profit_pct.is_finite()) {
            return Err(Error::Config(format!(
                "take_profit_pct must be positive, got {}",
                self.take_profit_pct
            )));
        }
        if self.trailing_stop_enabled
            && !(self.trailing_stop_pct > 0.0 && self.trailing_stop_pct < 100.0)
        {
            return Err(Error::Config(format!(
                "trailing_stop_pct must be between 0 and 100, got {}",
                self.trailing_stop_pct
            )));
        }
        if !(self.min_profit_pct >= 0.0 && self.min_profit_pct.is_finite()) {
            return Err(Error::Config(format!(
                "min_profit_pct cannot be negative, got {}",
                self.min_profit_pct
            )));
        }
        if self.max_hold_secs == 0 {
            return Err(Error::Config("max_hold_secs must be positive".into()));
        }
        Ok(())
    }
}

/// Capacity, cadence and persistence of the position manager
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionPolicy {
    #[serde(default = "default_max_concurrent_positions")]
    pub max_concurrent_positions: usize,
    #[serde(default = "default_check_interval_secs")]
    pub check_interval_secs: u64,
    #[serde(default = "default_closed_history_limit")]
    pub closed_history_limit: usize,
    #[serde(default = "default_persistence_path")]
    pub persistence_path: String,
}

impl Default for PositionPolicy {
    fn default() -> Self {
        Self {
            max_concurrent_positions: default_max_concurrent_positions(),
            check_interval_secs: default_check_interval_secs(),
            closed_history_limit: default_closed_history_limit(),
            persistence_path: default_persistence_path(),
        }
    }
}

impl PositionPolicy {
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.max_concurrent_positions == 0 {
            return Err(Error::Config("max_concurrent_positions must be positive".into()));
        }
        if self.check_interval_secs == 0 {
            return Err(Error::Config("check_interval_secs must be positive".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TradingConfig {
    /// Base-asset amount committed per position
    #[serde(default = "default_buy_amount")]
    pub buy_amount: f64,
    /// Simulated fee charged by the paper trader on each fill
    #[serde(default = "default_paper_fee_pct")]
    pub paper_fee_pct: f64,
}

impl Default for TradingConfig {
    fn default() -> Self {
        Self {
            buy_amount: default_buy_amount(),
            paper_fee_pct: default_paper_fee_pct(),
        }
    }
}

// Default value functions
fn default_rpc_endpoint() -> String {
    std::env::var("RPC_ENDPOINT").unwrap_or_else(|_| "https://api.mainnet-beta.solana.com".into())
}

fn default_timeout_ms() -> u64 {
    30000
}

fn default_base_address() -> String {
    "So11111111111111111111111111111111111111112".into()
}

fn default_base_symbol() -> String {
    "SOL".into()
}

fn default_base_usd_price() -> f64 {
    150.0
}

fn default_weight_liquidity() -> u32 { 25 }
fn default_weight_market_cap() -> u32 { 20 }
fn default_weight_security() -> u32 { 30 }
fn default_weight_holders() -> u32 { 15 }
fn default_weight_contract() -> u32 { 10 }

fn default_min_liquidity() -> f64 { 10.0 }
fn default_max_liquidity() -> f64 { 500.0 }
fn default_optimal_liquidity_min() -> f64 { 20.0 }
fn default_optimal_liquidity_max() -> f64 { 100.0 }
fn default_liquidity_low_tier() -> u32 { 70 }
fn default_liquidity_high_tier() -> u32 { 60 }

fn default_market_cap_min() -> f64 { 5_000.0 }
fn default_market_cap_max() -> f64 { 300_000.0 }
fn default_market_cap_upper_limit() -> f64 { 500_000.0 }
fn default_market_cap_decent_tier() -> u32 { 60 }
fn default_market_cap_low_tier() -> u32 { 40 }
fn default_fallback_supply_multiplier() -> f64 { 10.0 }

fn default_max_buy_tax() -> f64 { 10.0 }
fn default_max_sell_tax() -> f64 { 15.0 }

fn default_max_top_holder() -> f64 { 70.0 }
fn default_holder_great_below() -> f64 { 30.0 }
fn default_holder_good_below() -> f64 { 50.0 }
fn default_holder_good_credit() -> u32 { 67 }
fn default_holder_moderate_credit() -> u32 { 34 }
fn default_holder_unknown_credit() -> u32 { 34 }

fn default_unverified_credit() -> u32 { 50 }

fn default_low_trust_suffixes() -> Vec<String> {
    vec!["pump".into()]
}

fn default_minimum_score() -> u32 { 70 }
fn default_lookup_timeout_ms() -> u64 { 5000 }

fn default_stop_loss_pct() -> f64 {
    30.0
}

fn default_take_profit_pct() -> f64 {
    100.0
}

fn default_trailing_stop_pct() -> f64 {
    20.0
}

fn default_min_profit_pct() -> f64 {
    10.0
}

fn default_max_hold_secs() -> u64 {
    6 * 60 * 60
}

fn default_max_concurrent_positions() -> usize {
    3
}

fn default_check_interval_secs() -> u64 {
    30
}

fn default_closed_history_limit() -> usize {
    100
}

fn default_persistence_path() -> String {
    "data/positions.json".into()
}

fn default_buy_amount() -> f64 {
    0.1
}

fn default_paper_fee_pct() -> f64 {
    0.25
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load configuration from file and environment variables
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let settings = config::Config::builder()
            // Load from file if exists
            .add_source(config::File::from(path).required(false))
            // Override with environment variables (prefix GEM__)
            .add_source(
                config::Environment::with_prefix("GEM")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to build configuration")?;

        let config: Config = settings
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        self.quality.validate().context("Invalid [quality] section")?;
        self.exit.validate().context("Invalid [exit] section")?;
        self.positions.validate().context("Invalid [positions] section")?;

        if self.base_asset.usd_price <= 0.0 {
            anyhow::bail!("base_asset.usd_price must be positive");
        }

        if self.trading.buy_amount <= 0.0 {
            anyhow::bail!("buy_amount must be positive");
        }

        if self.trading.paper_fee_pct < 0.0 || self.trading.paper_fee_pct >= 100.0 {
            anyhow::bail!("paper_fee_pct must be between 0 and 100");
        }

        if self.quality.auto_trade {
            tracing::warn!("auto_trade is enabled - accepted tokens will be bought automatically");
        }

        Ok(())
    }

    /// Get masked configuration for display (hide secrets)
    pub fn masked_display(&self) -> String {
        let w = &self.quality.weights;
        format!(
            r#"Configuration:
  RPC:
    endpoint: {}
    timeout: {}ms
  Base asset:
    {} ({}) @ ${}
  Quality:
    liquidity: {} - {} (optimal {} - {})
    market cap: ${} - ${} (upper limit ${})
    max top holder: {}%
    max tax: buy {}% / sell {}%
    minimum score: {}
    auto trade: {}
    weights: liquidity={} market_cap={} security={} holders={} contract={}
  Exit:
    stop_loss: {}%
    take_profit: {}% (min profit {}%)
    trailing_stop: {} ({}%)
    max_hold: {}s
  Positions:
    max_concurrent: {}
    check_interval: {}s
    persistence: {}
  Trading:
    buy_amount: {}
"#,
            mask_url(&self.rpc.endpoint),
            self.rpc.timeout_ms,
            self.base_asset.symbol,
            self.base_asset.address,
            self.base_asset.usd_price,
            self.quality.min_liquidity,
            self.quality.max_liquidity,
            self.quality.optimal_liquidity_min,
            self.quality.optimal_liquidity_max,
            self.quality.market_cap_min_usd,
            self.quality.market_cap_max_usd,
            self.quality.market_cap_upper_limit_usd,
            self.quality.max_top_holder_pct,
            self.quality.max_buy_tax_pct,
            self.quality.max_sell_tax_pct,
            self.quality.minimum_score,
            self.quality.auto_trade,
            w.liquidity,
            w.market_cap,
            w.security,
            w.holders,
            w.contract,
            self.exit.stop_loss_pct,
            self.exit.take_profit_pct,
            self.exit.min_profit_pct,
            self.exit.trailing_stop_enabled,
            self.exit.trailing_stop_pct,
            self.exit.max_hold_secs,
            self.positions.max_concurrent_positions,
            self.positions.check_interval_secs,
            self.positions.persistence_path,
            self.trading.buy_amount,
        )
    }
}

/// Mask URL for display (hide API keys in query params)
fn mask_url(url: &str) -> String {
    if let Some(idx) = url.find('?') {
        format!("{}?***", &url[..idx])
    } else {
        url.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.quality.weights.total(), 100);
        assert_eq!(config.positions.max_concurrent_positions, 3);
    }

    #[test]
    fn test_weights_must_sum_to_100() {
        let mut policy = QualityPolicy::default();
        policy.weights.contract = 15;
        let err = policy.validate().unwrap_err();
        assert!(err.to_string().contains("sum to 100"));
    }

    #[test]
    fn test_liquidity_bounds_must_be_ordered() {
        let policy = QualityPolicy {
            optimal_liquidity_min: 5.0,
            ..Default::default()
        };
        assert!(policy.validate().is_err());
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let policy = PositionPolicy {
            max_concurrent_positions: 0,
            ..Default::default()
        };
        assert!(policy.validate().is_err());
    }

    #[test]
    fn test_exit_policy_bounds() {
        let policy = ExitPolicy {
            stop_loss_pct: 100.0,
            ..Default::default()
        };
        assert!(policy.validate().is_err());
        assert!(ExitPolicy::default().validate().is_ok());
    }

    #[test]
    fn test_nan_thresholds_rejected() {
        for policy in [
            ExitPolicy {
                stop_loss_pct: f64::NAN,
                ..Default::default()
            },
            ExitPolicy {
                take_profit_pct: f64::INFINITY,
                ..Default::default()
            },
            ExitPolicy {
                trailing_stop_pct: f64::NAN,
                ..Default::default()
            },
            ExitPolicy {
                min_profit_pct: f64::NAN,
                ..Default::default()
            },
        ] {
            assert!(matches!(policy.validate(), Err(Error::Config(_))));
        }

        let quality = QualityPolicy {
            max_liquidity: f64::NAN,
            ..Default::default()
        };
        assert!(matches!(quality.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let toml = r#"
            [exit]
            stop_loss_pct = 25.0

            [quality.weights]
            liquidity = 30
            contract = 5
        "#;
        let settings = config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()
            .unwrap();
        let config: Config = settings.try_deserialize().unwrap();

        assert_eq!(config.exit.stop_loss_pct, 25.0);
        assert_eq!(config.exit.take_profit_pct, 100.0);
        assert_eq!(config.quality.weights.liquidity, 30);
        assert_eq!(config.quality.weights.total(), 100);
    }

    #[test]
    fn test_mask_url() {
        assert_eq!(
            mask_url("https://rpc.example.com?api-key=secret"),
            "https://rpc.example.com?***"
        );
        assert_eq!(mask_url("https://rpc.example.com"), "https://rpc.example.com");
    }
}
