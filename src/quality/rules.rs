//! Scoring rules
//!
//! Each rule is a pure function of the policy and already-fetched data. Rules
//! append their reasons and return either the points awarded for their
//! dimension or a hard rejection. An input of `None` means the lookup failed;
//! the analyzer has already recorded why.

use crate::config::QualityPolicy;
use crate::quality::types::{AuthorityStatus, HoneypotReport, PairCandidate};

/// Outcome of a single rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleOutcome {
    Points(u32),
    Reject(String),
}

/// `pct` percent of `weight`, rounded down
pub fn credit(weight: u32, pct: u32) -> u32 {
    weight * pct / 100
}

/// Cheap pre-filter. Returns pooled `(base, token)` amounts when the candidate
/// is worth a full analysis, or the rejection reason.
pub fn quick_filter(
    policy: &QualityPolicy,
    base_asset: &str,
    base_symbol: &str,
    candidate: &PairCandidate,
) -> Result<(f64, f64), String> {
    let Some((base, token)) = candidate.base_and_token_amounts(base_asset) else {
        return Err(format!("No {} pair, skipping exotic pair", base_symbol));
    };

    if !base.is_finite() || !token.is_finite() || token <= 0.0 {
        return Err(format!(
            "Malformed pool amounts: {} {} / {} tokens",
            base, base_symbol, token
        ));
    }

    if base < policy.min_liquidity {
        return Err(format!(
            "Insufficient liquidity: {:.2} {} < {} {} minimum",
            base, base_symbol, policy.min_liquidity, base_symbol
        ));
    }

    if base > policy.max_liquidity {
        return Err(format!(
            "Liquidity too high: {:.2} {} > {} {} maximum",
            base, base_symbol, policy.max_liquidity, base_symbol
        ));
    }

    if policy.filter_low_trust_factory {
        if let Some(suffix) = policy
            .low_trust_address_suffixes
            .iter()
            .find(|s| !s.is_empty() && candidate.token_address.ends_with(s.as_str()))
        {
            return Err(format!(
                "Low-trust factory token (address ends with '{}')",
                suffix
            ));
        }
    }

    Ok((base, token))
}

pub fn liquidity(policy: &QualityPolicy, base: f64, symbol: &str, reasons: &mut Vec<String>) -> u32 {
    let weight = policy.weights.liquidity;

    if base >= policy.optimal_liquidity_min && base <= policy.optimal_liquidity_max {
        reasons.push(format!("Optimal liquidity: {:.2} {}", base, symbol));
        weight
    } else if base < policy.optimal_liquidity_min {
        reasons.push(format!("Decent liquidity: {:.2} {}", base, symbol));
        credit(weight, policy.liquidity_low_tier_pct)
    } else {
        reasons.push(format!("Deep liquidity: {:.2} {}", base, symbol));
        credit(weight, policy.liquidity_high_tier_pct)
    }
}

/// `(base_pooled / token_pooled) * supply * base_usd_price`
pub fn estimate_market_cap(base: f64, token: f64, supply: f64, base_usd_price: f64) -> Option<f64> {
    if token <= 0.0 || supply <= 0.0 {
        return None;
    }
    let market_cap = base / token * supply * base_usd_price;
    market_cap.is_finite().then_some(market_cap)
}

/// Above the upper limit scores zero but does not reject
pub fn market_cap(policy: &QualityPolicy, market_cap_usd: Option<f64>, reasons: &mut Vec<String>) -> u32 {
    let weight = policy.weights.market_cap;

    let Some(mcap) = market_cap_usd else {
        reasons.push("Could not estimate market cap".to_string());
        return 0;
    };

    if mcap > policy.market_cap_upper_limit_usd {
        reasons.push(format!(
            "High market cap: ${:.0} above ${:.0} (limited upside)",
            mcap, policy.market_cap_upper_limit_usd
        ));
        0
    } else if mcap >= policy.market_cap_min_usd && mcap <= policy.market_cap_max_usd {
        reasons.push(format!("Moonshot market cap: ${:.0}", mcap));
        weight
    } else if mcap > policy.market_cap_max_usd {
        reasons.push(format!("Decent market cap: ${:.0}", mcap));
        credit(weight, policy.market_cap_decent_tier_pct)
    } else {
        reasons.push(format!("Very low market cap: ${:.0} (high risk)", mcap));
        credit(weight, policy.market_cap_low_tier_pct)
    }
}

/// Honeypot and tax screen. Contributes no points, only rejections.
pub fn honeypot(policy: &QualityPolicy, report: &HoneypotReport, reasons: &mut Vec<String>) -> Option<String> {
    if report.is_honeypot {
        return Some(match &report.reason {
            Some(why) => format!("Honeypot detected: {}", why),
            None => "Honeypot detected".to_string(),
        });
    }
    reasons.push("Not a honeypot (sell simulation succeeded)".to_string());

    if report.buy_tax_pct > policy.max_buy_tax_pct {
        return Some(format!(
            "Buy tax too high: {}% > {}%",
            report.buy_tax_pct, policy.max_buy_tax_pct
        ));
    }
    if report.sell_tax_pct > policy.max_sell_tax_pct {
        return Some(format!(
            "Sell tax too high: {}% > {}%",
            report.sell_tax_pct, policy.max_sell_tax_pct
        ));
    }
    if report.buy_tax_pct > 0.0 || report.sell_tax_pct > 0.0 {
        reasons.push(format!(
            "Taxes: buy {}%, sell {}%",
            report.buy_tax_pct, report.sell_tax_pct
        ));
    }
    None
}

/// Mint revocation earns half the weight, freeze revocation the rest
pub fn authorities(
    policy: &QualityPolicy,
    status: Option<AuthorityStatus>,
    reasons: &mut Vec<String>,
) -> RuleOutcome {
    let weight = policy.weights.security;

    let Some(status) = status else {
        return RuleOutcome::Points(credit(weight, policy.authority_unknown_credit_pct));
    };

    let mint_share = weight / 2;
    let freeze_share = weight - mint_share;
    let mut points = 0;

    if status.mint_revoked {
        points += mint_share;
        reasons.push("Mint authority revoked (fixed supply)".to_string());
    } else {
        reasons.push("Mint authority NOT revoked (supply can be inflated)".to_string());
        if policy.require_mint_revoked {
            return RuleOutcome::Reject("Rejected: mint authority must be revoked".to_string());
        }
    }

    if status.freeze_revoked {
        points += freeze_share;
        reasons.push("Freeze authority revoked".to_string());
    } else {
        reasons.push("Freeze authority NOT revoked (holders can be frozen)".to_string());
        if policy.require_freeze_revoked {
            return RuleOutcome::Reject("Rejected: freeze authority must be revoked".to_string());
        }
    }

    RuleOutcome::Points(points)
}

/// Lower top-holder concentration scores higher
pub fn holders(policy: &QualityPolicy, top_holder_pct: Option<f64>, reasons: &mut Vec<String>) -> RuleOutcome {
    let weight = policy.weights.holders;

    let Some(pct) = top_holder_pct else {
        return RuleOutcome::Points(credit(weight, policy.holder_unknown_credit_pct));
    };

    if pct > policy.max_top_holder_pct {
        return RuleOutcome::Reject(format!(
            "High concentration: top holder {:.1}% > {}% (rug risk)",
            pct, policy.max_top_holder_pct
        ));
    }

    let points = if pct < policy.holder_great_below_pct {
        reasons.push(format!("Great distribution: top holder {:.1}%", pct));
        weight
    } else if pct < policy.holder_good_below_pct {
        reasons.push(format!("Good distribution: top holder {:.1}%", pct));
        credit(weight, policy.holder_good_credit_pct)
    } else {
        reasons.push(format!("Moderate concentration: top holder {:.1}%", pct));
        credit(weight, policy.holder_moderate_credit_pct)
    };
    RuleOutcome::Points(points)
}

pub fn contract(policy: &QualityPolicy, verified: Option<bool>, reasons: &mut Vec<String>) -> RuleOutcome {
    let weight = policy.weights.contract;

    match verified {
        Some(true) => {
            reasons.push("Contract verified".to_string());
            RuleOutcome::Points(weight)
        }
        Some(false) if policy.require_verified_contract => {
            RuleOutcome::Reject("Rejected: contract is not verified".to_string())
        }
        Some(false) => {
            reasons.push("Contract not verified".to_string());
            RuleOutcome::Points(credit(weight, policy.unverified_credit_pct))
        }
        None => {
            reasons.push("Contract verification unavailable".to_string());
            RuleOutcome::Points(credit(weight, policy.unverified_credit_pct))
        }
    }
}

/// Summary line appended after scoring
pub fn verdict(score: u32, minimum_score: u32) -> String {
    if score >= minimum_score {
        format!("HIGH QUALITY GEM: score {}/100", score)
    } else if score >= 50 {
        format!(
            "MODERATE QUALITY: score {}/100 (below threshold of {})",
            score, minimum_score
        )
    } else {
        format!("LOW QUALITY: score {}/100", score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quality::types::PooledAsset;

    const WSOL: &str = "So11111111111111111111111111111111111111112";

    fn candidate(token: &str, base: f64) -> PairCandidate {
        PairCandidate::new(
            token,
            "POOL",
            PooledAsset {
                address: WSOL.into(),
                amount: base,
            },
            PooledAsset {
                address: token.into(),
                amount: 1_000_000.0,
            },
        )
    }

    #[test]
    fn test_quick_filter_liquidity_bounds() {
        let policy = QualityPolicy::default();

        let err = quick_filter(&policy, WSOL, "SOL", &candidate("GEM", 8.0)).unwrap_err();
        assert!(err.starts_with("Insufficient liquidity"));

        let err = quick_filter(&policy, WSOL, "SOL", &candidate("GEM", 900.0)).unwrap_err();
        assert!(err.starts_with("Liquidity too high"));

        assert_eq!(
            quick_filter(&policy, WSOL, "SOL", &candidate("GEM", 50.0)),
            Ok((50.0, 1_000_000.0))
        );
    }

    #[test]
    fn test_quick_filter_malformed_amounts() {
        let policy = QualityPolicy::default();

        for base in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let err = quick_filter(&policy, WSOL, "SOL", &candidate("GEM", base)).unwrap_err();
            assert!(err.starts_with("Malformed pool amounts"), "{}", err);
        }

        let mut empty = candidate("GEM", 50.0);
        empty.pooled[1].amount = 0.0;
        assert!(quick_filter(&policy, WSOL, "SOL", &empty).is_err());

        empty.pooled[1].amount = f64::NAN;
        assert!(quick_filter(&policy, WSOL, "SOL", &empty).is_err());
    }

    #[test]
    fn test_quick_filter_exotic_pair() {
        let policy = QualityPolicy::default();
        let err = quick_filter(&policy, "USDC", "USDC", &candidate("GEM", 50.0)).unwrap_err();
        assert!(err.contains("exotic"));
    }

    #[test]
    fn test_quick_filter_low_trust_suffix() {
        let mut policy = QualityPolicy::default();
        assert!(quick_filter(&policy, WSOL, "SOL", &candidate("Abcpump", 50.0)).is_err());

        policy.filter_low_trust_factory = false;
        assert!(quick_filter(&policy, WSOL, "SOL", &candidate("Abcpump", 50.0)).is_ok());
    }

    #[test]
    fn test_liquidity_tiers() {
        let policy = QualityPolicy::default();
        let mut reasons = Vec::new();

        assert_eq!(liquidity(&policy, 50.0, "SOL", &mut reasons), 25);
        assert_eq!(liquidity(&policy, 15.0, "SOL", &mut reasons), 17);
        assert_eq!(liquidity(&policy, 200.0, "SOL", &mut reasons), 15);
        assert_eq!(reasons.len(), 3);
    }

    #[test]
    fn test_market_cap_tiers() {
        let policy = QualityPolicy::default();
        let mut reasons = Vec::new();

        assert_eq!(market_cap(&policy, Some(50_000.0), &mut reasons), 20);
        assert_eq!(market_cap(&policy, Some(400_000.0), &mut reasons), 12);
        assert_eq!(market_cap(&policy, Some(1_000.0), &mut reasons), 8);
        assert_eq!(market_cap(&policy, Some(2_000_000.0), &mut reasons), 0);
        assert_eq!(market_cap(&policy, None, &mut reasons), 0);
    }

    #[test]
    fn test_estimate_market_cap() {
        // 20 SOL against 1M tokens with 10M supply at $150
        let mcap = estimate_market_cap(20.0, 1_000_000.0, 10_000_000.0, 150.0).unwrap();
        assert!((mcap - 30_000.0).abs() < 1e-6);
        assert_eq!(estimate_market_cap(20.0, 0.0, 1.0, 150.0), None);
    }

    #[test]
    fn test_honeypot_and_taxes() {
        let policy = QualityPolicy::default();
        let mut reasons = Vec::new();
        let clean = HoneypotReport {
            is_honeypot: false,
            buy_tax_pct: 2.0,
            sell_tax_pct: 3.0,
            reason: None,
        };

        assert_eq!(honeypot(&policy, &clean, &mut reasons), None);
        assert!(reasons.iter().any(|r| r.starts_with("Taxes")));

        let trap = HoneypotReport {
            is_honeypot: true,
            ..clean.clone()
        };
        assert!(honeypot(&policy, &trap, &mut reasons).unwrap().contains("Honeypot"));

        let greedy = HoneypotReport {
            sell_tax_pct: 25.0,
            ..clean
        };
        assert!(honeypot(&policy, &greedy, &mut reasons)
            .unwrap()
            .starts_with("Sell tax too high"));
    }

    #[test]
    fn test_authority_split() {
        let mut policy = QualityPolicy::default();
        let mut reasons = Vec::new();
        let both = AuthorityStatus {
            mint_revoked: true,
            freeze_revoked: true,
        };
        let mint_only = AuthorityStatus {
            mint_revoked: true,
            freeze_revoked: false,
        };

        assert_eq!(authorities(&policy, Some(both), &mut reasons), RuleOutcome::Points(30));
        assert_eq!(authorities(&policy, Some(mint_only), &mut reasons), RuleOutcome::Points(15));
        assert_eq!(authorities(&policy, None, &mut reasons), RuleOutcome::Points(0));

        policy.require_freeze_revoked = true;
        assert!(matches!(
            authorities(&policy, Some(mint_only), &mut reasons),
            RuleOutcome::Reject(_)
        ));
    }

    #[test]
    fn test_holder_tiers() {
        let policy = QualityPolicy::default();
        let mut reasons = Vec::new();

        assert_eq!(holders(&policy, Some(10.0), &mut reasons), RuleOutcome::Points(15));
        assert_eq!(holders(&policy, Some(40.0), &mut reasons), RuleOutcome::Points(10));
        assert_eq!(holders(&policy, Some(65.0), &mut reasons), RuleOutcome::Points(5));
        assert_eq!(holders(&policy, None, &mut reasons), RuleOutcome::Points(5));
        assert!(matches!(
            holders(&policy, Some(85.0), &mut reasons),
            RuleOutcome::Reject(_)
        ));
    }

    #[test]
    fn test_contract_trust() {
        let mut policy = QualityPolicy::default();
        let mut reasons = Vec::new();

        assert_eq!(contract(&policy, Some(true), &mut reasons), RuleOutcome::Points(10));
        assert_eq!(contract(&policy, Some(false), &mut reasons), RuleOutcome::Points(5));
        assert_eq!(contract(&policy, None, &mut reasons), RuleOutcome::Points(5));

        policy.require_verified_contract = true;
        assert!(matches!(
            contract(&policy, Some(false), &mut reasons),
            RuleOutcome::Reject(_)
        ));
        assert_eq!(contract(&policy, None, &mut reasons), RuleOutcome::Points(5));
    }

    #[test]
    fn test_verdict() {
        assert!(verdict(85, 70).starts_with("HIGH QUALITY"));
        assert!(verdict(60, 70).starts_with("MODERATE"));
        assert!(verdict(20, 70).starts_with("LOW"));
    }
}
