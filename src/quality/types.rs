//! Candidate and report types for quality analysis

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// One side of a freshly created pool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PooledAsset {
    pub address: String,
    /// Pooled amount in UI units (decimals applied)
    pub amount: f64,
}

/// A newly detected pair handed over by the pair feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairCandidate {
    /// The new token being evaluated
    pub token_address: String,
    /// Liquidity pool / pair identifier
    pub pool_address: String,
    pub pooled: [PooledAsset; 2],
}

impl PairCandidate {
    pub fn new(
        token_address: impl Into<String>,
        pool_address: impl Into<String>,
        first: PooledAsset,
        second: PooledAsset,
    ) -> Self {
        Self {
            token_address: token_address.into(),
            pool_address: pool_address.into(),
            pooled: [first, second],
        }
    }

    /// Pooled `(base, token)` amounts, or `None` if neither side is the base asset
    pub fn base_and_token_amounts(&self, base_asset: &str) -> Option<(f64, f64)> {
        let [a, b] = &self.pooled;
        if a.address == base_asset {
            Some((a.amount, b.amount))
        } else if b.address == base_asset {
            Some((b.amount, a.amount))
        } else {
            None
        }
    }
}

/// Scoring dimensions, in evaluation order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Liquidity,
    MarketCap,
    Security,
    Holders,
    Contract,
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Dimension::Liquidity => "liquidity",
            Dimension::MarketCap => "market_cap",
            Dimension::Security => "security",
            Dimension::Holders => "holders",
            Dimension::Contract => "contract",
        };
        write!(f, "{}", s)
    }
}

/// Mint and freeze authority state of a token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorityStatus {
    pub mint_revoked: bool,
    pub freeze_revoked: bool,
}

/// Result of a buy/sell simulation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoneypotReport {
    pub is_honeypot: bool,
    pub buy_tax_pct: f64,
    pub sell_tax_pct: f64,
    pub reason: Option<String>,
}

/// What the security checks found. `None` means the lookup failed or was skipped.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SecurityFindings {
    pub honeypot: Option<bool>,
    pub buy_tax_pct: Option<f64>,
    pub sell_tax_pct: Option<f64>,
    pub mint_revoked: Option<bool>,
    pub freeze_revoked: Option<bool>,
    pub verified: Option<bool>,
}

/// Outcome of analyzing one candidate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityReport {
    pub token_address: String,
    pub pool_address: String,
    /// 0..=100
    pub score: u32,
    pub passed_hard_filters: bool,
    pub should_alert: bool,
    pub should_trade: bool,
    /// Every rule that fired, in order
    pub reasons: Vec<String>,
    /// Points per dimension evaluated before any hard rejection
    pub components: BTreeMap<Dimension, u32>,
    /// Pooled base-asset amount
    pub liquidity: f64,
    pub market_cap_usd: Option<f64>,
    pub top_holder_pct: Option<f64>,
    pub security: SecurityFindings,
    pub analyzed_at: DateTime<Utc>,
}

impl QualityReport {
    pub(crate) fn new(candidate: &PairCandidate) -> Self {
        Self {
            token_address: candidate.token_address.clone(),
            pool_address: candidate.pool_address.clone(),
            score: 0,
            passed_hard_filters: true,
            should_alert: false,
            should_trade: false,
            reasons: Vec::new(),
            components: BTreeMap::new(),
            liquidity: 0.0,
            market_cap_usd: None,
            top_holder_pct: None,
            security: SecurityFindings::default(),
            analyzed_at: Utc::now(),
        }
    }

    /// Mark the candidate as disqualified
    pub(crate) fn reject(&mut self, reason: String) {
        self.passed_hard_filters = false;
        self.score = 0;
        self.should_alert = false;
        self.should_trade = false;
        self.reasons.push(reason);
    }

    pub fn component(&self, dimension: Dimension) -> Option<u32> {
        self.components.get(&dimension).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WSOL: &str = "So11111111111111111111111111111111111111112";

    fn asset(address: &str, amount: f64) -> PooledAsset {
        PooledAsset {
            address: address.into(),
            amount,
        }
    }

    #[test]
    fn test_base_side_either_order() {
        let forward = PairCandidate::new("GEM", "POOL", asset(WSOL, 25.0), asset("GEM", 1e6));
        let reverse = PairCandidate::new("GEM", "POOL", asset("GEM", 1e6), asset(WSOL, 25.0));

        assert_eq!(forward.base_and_token_amounts(WSOL), Some((25.0, 1e6)));
        assert_eq!(reverse.base_and_token_amounts(WSOL), Some((25.0, 1e6)));
        assert_eq!(forward.base_and_token_amounts("USDC"), None);
    }

    #[test]
    fn test_components_serialize_as_named_map() {
        let candidate = PairCandidate::new("GEM", "POOL", asset(WSOL, 25.0), asset("GEM", 1e6));
        let mut report = QualityReport::new(&candidate);
        report.components.insert(Dimension::MarketCap, 20);
        report.components.insert(Dimension::Liquidity, 25);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["components"]["liquidity"], 25);
        assert_eq!(json["components"]["market_cap"], 20);
    }
}
