//! Quality analyzer
//!
//! Two stages: a quick filter over data the pair feed already supplied, then
//! the full weighted analysis which needs chain lookups. Rules are applied in
//! dimension order and the first hard rejection ends evaluation, including any
//! lookups the remaining rules would have made.

use serde::Serialize;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::config::{BaseAssetConfig, QualityPolicy};
use crate::error::{Error, Result};
use crate::quality::lookup::TokenLookup;
use crate::quality::rules::{self, RuleOutcome};
use crate::quality::types::{Dimension, PairCandidate, QualityReport};

/// Counters since the analyzer was created
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AnalyzerStats {
    pub analyzed: u64,
    pub passed: u64,
    pub failed: u64,
    pub honeypots_detected: u64,
    pub high_tax_rejected: u64,
}

impl AnalyzerStats {
    pub fn pass_rate(&self) -> f64 {
        if self.analyzed == 0 {
            return 0.0;
        }
        self.passed as f64 / self.analyzed as f64 * 100.0
    }
}

#[derive(Default)]
struct Counters {
    analyzed: AtomicU64,
    passed: AtomicU64,
    failed: AtomicU64,
    honeypots_detected: AtomicU64,
    high_tax_rejected: AtomicU64,
}

enum Rejection {
    Honeypot,
    HighTax,
    Other,
}

pub struct QualityAnalyzer {
    policy: QualityPolicy,
    base: BaseAssetConfig,
    lookup: Arc<dyn TokenLookup>,
    lookup_timeout: Duration,
    counters: Counters,
}

impl QualityAnalyzer {
    /// Fails if the policy is inconsistent (e.g. weights not summing to 100)
    pub fn new(policy: QualityPolicy, base: BaseAssetConfig, lookup: Arc<dyn TokenLookup>) -> Result<Self> {
        policy.validate()?;
        if base.usd_price <= 0.0 {
            return Err(Error::Config("base asset USD price must be positive".into()));
        }

        Ok(Self {
            lookup_timeout: Duration::from_millis(policy.lookup_timeout_ms),
            policy,
            base,
            lookup,
            counters: Counters::default(),
        })
    }

    pub fn policy(&self) -> &QualityPolicy {
        &self.policy
    }

    pub fn stats(&self) -> AnalyzerStats {
        AnalyzerStats {
            analyzed: self.counters.analyzed.load(Ordering::Relaxed),
            passed: self.counters.passed.load(Ordering::Relaxed),
            failed: self.counters.failed.load(Ordering::Relaxed),
            honeypots_detected: self.counters.honeypots_detected.load(Ordering::Relaxed),
            high_tax_rejected: self.counters.high_tax_rejected.load(Ordering::Relaxed),
        }
    }

    /// Cheap rejection pass, no external calls
    pub fn quick_filter(&self, candidate: &PairCandidate) -> std::result::Result<(f64, f64), String> {
        rules::quick_filter(&self.policy, &self.base.address, &self.base.symbol, candidate)
    }

    async fn within<T>(&self, lookup: impl Future<Output = Result<T>>) -> Result<T> {
        match tokio::time::timeout(self.lookup_timeout, lookup).await {
            Ok(result) => result,
            Err(_) => Err(Error::LookupTimeout(self.lookup_timeout.as_millis() as u64)),
        }
    }

    /// Score a candidate. Never fails; every problem ends up in the report.
    pub async fn analyze(&self, candidate: &PairCandidate) -> QualityReport {
        self.counters.analyzed.fetch_add(1, Ordering::Relaxed);
        let mut report = QualityReport::new(candidate);

        let (base_pooled, token_pooled) = match self.quick_filter(candidate) {
            Ok(amounts) => amounts,
            Err(reason) => {
                debug!("Quick filter rejected {}: {}", candidate.token_address, reason);
                return self.rejected(report, reason, Rejection::Other);
            }
        };
        report.liquidity = base_pooled;

        // Supply and the honeypot check both precede the first rule that can
        // reject, so they are fetched together. Later lookups wait for their rule.
        let token = candidate.token_address.as_str();
        let (supply, honeypot) = tokio::join!(
            self.within(self.lookup.token_supply(token)),
            async {
                if self.policy.check_honeypot {
                    Some(self.within(self.lookup.honeypot_check(token)).await)
                } else {
                    None
                }
            },
        );

        let symbol = self.base.symbol.as_str();

        // Liquidity
        let points = rules::liquidity(&self.policy, base_pooled, symbol, &mut report.reasons);
        report.components.insert(Dimension::Liquidity, points);

        // Market cap
        let supply = match supply {
            Ok(Some(supply)) => supply,
            Ok(None) => {
                report.reasons.push("Total supply unavailable, estimating from pool".into());
                token_pooled * self.policy.fallback_supply_multiplier
            }
            Err(e) => {
                report
                    .reasons
                    .push(format!("Could not fetch total supply ({}), estimating from pool", e));
                token_pooled * self.policy.fallback_supply_multiplier
            }
        };
        report.market_cap_usd =
            rules::estimate_market_cap(base_pooled, token_pooled, supply, self.base.usd_price);
        let points = rules::market_cap(&self.policy, report.market_cap_usd, &mut report.reasons);
        report.components.insert(Dimension::MarketCap, points);

        // Security
        match honeypot {
            Some(Ok(Some(check))) => {
                report.security.honeypot = Some(check.is_honeypot);
                report.security.buy_tax_pct = Some(check.buy_tax_pct);
                report.security.sell_tax_pct = Some(check.sell_tax_pct);
                if let Some(reason) = rules::honeypot(&self.policy, &check, &mut report.reasons) {
                    let kind = if check.is_honeypot {
                        Rejection::Honeypot
                    } else {
                        Rejection::HighTax
                    };
                    return self.rejected(report, reason, kind);
                }
            }
            Some(Ok(None)) => report.reasons.push("Honeypot check unavailable".into()),
            Some(Err(e)) => report
                .reasons
                .push(format!("Honeypot check failed ({}), proceeding with caution", e)),
            None => {}
        }

        let authority = match self.within(self.lookup.authority_status(token)).await {
            Ok(status) => {
                report.security.mint_revoked = Some(status.mint_revoked);
                report.security.freeze_revoked = Some(status.freeze_revoked);
                Some(status)
            }
            Err(e) => {
                report
                    .reasons
                    .push(format!("Could not verify token authorities ({})", e));
                None
            }
        };
        match rules::authorities(&self.policy, authority, &mut report.reasons) {
            RuleOutcome::Points(points) => {
                report.components.insert(Dimension::Security, points);
            }
            RuleOutcome::Reject(reason) => return self.rejected(report, reason, Rejection::Other),
        }

        // Holders
        let top_holder = match self.within(self.lookup.top_holder_pct(token)).await {
            Ok(Some(pct)) => Some(pct),
            Ok(None) => {
                report.reasons.push("Could not verify holder distribution".into());
                None
            }
            Err(e) => {
                report
                    .reasons
                    .push(format!("Could not verify holder distribution ({})", e));
                None
            }
        };
        report.top_holder_pct = top_holder;
        match rules::holders(&self.policy, top_holder, &mut report.reasons) {
            RuleOutcome::Points(points) => {
                report.components.insert(Dimension::Holders, points);
            }
            RuleOutcome::Reject(reason) => return self.rejected(report, reason, Rejection::Other),
        }

        // Contract
        let verified = match self.within(self.lookup.verification(token)).await {
            Ok(v) => v,
            Err(e) => {
                report
                    .reasons
                    .push(format!("Could not check contract verification ({})", e));
                None
            }
        };
        report.security.verified = verified;
        match rules::contract(&self.policy, verified, &mut report.reasons) {
            RuleOutcome::Points(points) => {
                report.components.insert(Dimension::Contract, points);
            }
            RuleOutcome::Reject(reason) => return self.rejected(report, reason, Rejection::Other),
        }

        self.finish(report)
    }

    fn finish(&self, mut report: QualityReport) -> QualityReport {
        report.score = report.components.values().sum::<u32>().min(100);
        report.should_alert =
            report.passed_hard_filters && report.score >= self.policy.minimum_score;
        report.should_trade = report.should_alert && self.policy.auto_trade;
        report
            .reasons
            .push(rules::verdict(report.score, self.policy.minimum_score));

        if report.should_alert {
            self.counters.passed.fetch_add(1, Ordering::Relaxed);
            info!(
                "PASSED {} with score {}/100",
                report.token_address, report.score
            );
        } else {
            self.counters.failed.fetch_add(1, Ordering::Relaxed);
            info!(
                "Below threshold {}: score {}/100",
                report.token_address, report.score
            );
        }
        report
    }

    fn rejected(&self, mut report: QualityReport, reason: String, kind: Rejection) -> QualityReport {
        match kind {
            Rejection::Honeypot => {
                self.counters.honeypots_detected.fetch_add(1, Ordering::Relaxed);
            }
            Rejection::HighTax => {
                self.counters.high_tax_rejected.fetch_add(1, Ordering::Relaxed);
            }
            Rejection::Other => {}
        }
        self.counters.failed.fetch_add(1, Ordering::Relaxed);

        info!("REJECTED {}: {}", report.token_address, reason);
        report.reject(reason);
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quality::types::{AuthorityStatus, HoneypotReport, PooledAsset};
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;

    const WSOL: &str = "So11111111111111111111111111111111111111112";
    const GEM: &str = "GemMint1111111111111111111111111111111111111";

    #[derive(Clone, Default)]
    struct ScriptedLookup {
        supply: Option<f64>,
        authority: Option<AuthorityStatus>,
        top_holder: Option<f64>,
        honeypot: Option<HoneypotReport>,
        verified: Option<bool>,
        fail: bool,
        delay: Option<Duration>,
        calls: Arc<AtomicUsize>,
    }

    impl ScriptedLookup {
        fn healthy() -> Self {
            Self {
                supply: Some(10_000_000.0),
                authority: Some(AuthorityStatus {
                    mint_revoked: true,
                    freeze_revoked: true,
                }),
                top_holder: Some(10.0),
                ..Default::default()
            }
        }

        fn failing() -> Self {
            Self {
                fail: true,
                ..Default::default()
            }
        }

        async fn gate(&self) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if self.fail {
                return Err(Error::Rpc("connection refused".into()));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl TokenLookup for ScriptedLookup {
        async fn token_supply(&self, _token: &str) -> Result<Option<f64>> {
            self.gate().await?;
            Ok(self.supply)
        }

        async fn authority_status(&self, _token: &str) -> Result<AuthorityStatus> {
            self.gate().await?;
            self.authority
                .ok_or_else(|| Error::Rpc("mint account not found".into()))
        }

        async fn top_holder_pct(&self, _token: &str) -> Result<Option<f64>> {
            self.gate().await?;
            Ok(self.top_holder)
        }

        async fn honeypot_check(&self, _token: &str) -> Result<Option<HoneypotReport>> {
            self.gate().await?;
            Ok(self.honeypot.clone())
        }

        async fn verification(&self, _token: &str) -> Result<Option<bool>> {
            self.gate().await?;
            Ok(self.verified)
        }
    }

    fn analyzer(policy: QualityPolicy, lookup: ScriptedLookup) -> QualityAnalyzer {
        QualityAnalyzer::new(policy, BaseAssetConfig::default(), Arc::new(lookup)).unwrap()
    }

    fn candidate(base: f64) -> PairCandidate {
        PairCandidate::new(
            GEM,
            "Pool111",
            PooledAsset {
                address: GEM.into(),
                amount: 1_000_000.0,
            },
            PooledAsset {
                address: WSOL.into(),
                amount: base,
            },
        )
    }

    #[test]
    fn test_rejects_bad_weights() {
        let mut policy = QualityPolicy::default();
        policy.weights.contract = 20;

        let result = QualityAnalyzer::new(
            policy,
            BaseAssetConfig::default(),
            Arc::new(ScriptedLookup::healthy()),
        );
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[tokio::test]
    async fn test_high_quality_candidate() {
        let analyzer = analyzer(QualityPolicy::default(), ScriptedLookup::healthy());
        let report = analyzer.analyze(&candidate(50.0)).await;

        // 25 liquidity + 20 market cap ($75k) + 30 security + 15 holders + 5 contract
        assert_eq!(report.score, 95);
        assert!(report.passed_hard_filters);
        assert!(report.should_alert);
        assert!(!report.should_trade);
        assert_eq!(report.components.len(), 5);
        assert!((report.market_cap_usd.unwrap() - 75_000.0).abs() < 1e-6);
        assert_eq!(report.security.mint_revoked, Some(true));
        assert!(report.reasons.last().unwrap().starts_with("HIGH QUALITY"));
        assert_eq!(analyzer.stats().passed, 1);
    }

    #[tokio::test]
    async fn test_auto_trade_sets_should_trade() {
        let policy = QualityPolicy {
            auto_trade: true,
            ..QualityPolicy::default()
        };
        let report = analyzer(policy, ScriptedLookup::healthy())
            .analyze(&candidate(50.0))
            .await;

        assert!(report.should_trade);
    }

    #[tokio::test]
    async fn test_quick_filter_insufficient_liquidity() {
        let lookup = ScriptedLookup::healthy();
        let calls = lookup.calls.clone();
        let analyzer = analyzer(QualityPolicy::default(), lookup);
        let report = analyzer.analyze(&candidate(8.0)).await;

        assert_eq!(calls.load(Ordering::SeqCst), 0);

        assert_eq!(report.score, 0);
        assert!(!report.passed_hard_filters);
        assert!(!report.should_alert);
        assert!(report.components.is_empty());
        assert!(report
            .reasons
            .iter()
            .any(|r| r.starts_with("Insufficient liquidity")));
        assert_eq!(analyzer.stats().failed, 1);
    }

    #[tokio::test]
    async fn test_malformed_pool_never_trades() {
        let policy = QualityPolicy {
            auto_trade: true,
            ..QualityPolicy::default()
        };
        let lookup = ScriptedLookup::healthy();
        let calls = lookup.calls.clone();
        let analyzer = analyzer(policy, lookup);

        for base in [f64::NAN, f64::INFINITY] {
            let report = analyzer.analyze(&candidate(base)).await;

            assert_eq!(report.score, 0);
            assert!(!report.passed_hard_filters);
            assert!(!report.should_alert);
            assert!(!report.should_trade);
            assert!(report.components.is_empty());
        }
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(analyzer.stats().failed, 2);
    }

    #[tokio::test]
    async fn test_honeypot_is_hard_reject() {
        let lookup = ScriptedLookup {
            honeypot: Some(HoneypotReport {
                is_honeypot: true,
                buy_tax_pct: 0.0,
                sell_tax_pct: 100.0,
                reason: Some("sell reverts".into()),
            }),
            ..ScriptedLookup::healthy()
        };
        let calls = lookup.calls.clone();
        let analyzer = analyzer(QualityPolicy::default(), lookup);
        let report = analyzer.analyze(&candidate(50.0)).await;

        assert_eq!(report.score, 0);
        assert!(!report.passed_hard_filters);
        assert_eq!(report.security.honeypot, Some(true));
        // Supply and honeypot only; authority, holder and verification lookups are skipped
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(report.component(Dimension::Liquidity).is_some());
        assert!(report.component(Dimension::Security).is_none());
        assert_eq!(analyzer.stats().honeypots_detected, 1);
    }

    #[tokio::test]
    async fn test_high_tax_is_hard_reject() {
        let lookup = ScriptedLookup {
            honeypot: Some(HoneypotReport {
                is_honeypot: false,
                buy_tax_pct: 12.0,
                sell_tax_pct: 5.0,
                reason: None,
            }),
            ..ScriptedLookup::healthy()
        };
        let analyzer = analyzer(QualityPolicy::default(), lookup);
        let report = analyzer.analyze(&candidate(50.0)).await;

        assert!(!report.passed_hard_filters);
        assert!(report.reasons.iter().any(|r| r.starts_with("Buy tax too high")));
        assert_eq!(analyzer.stats().high_tax_rejected, 1);
    }

    #[tokio::test]
    async fn test_concentrated_holders_rejected() {
        let lookup = ScriptedLookup {
            top_holder: Some(90.0),
            ..ScriptedLookup::healthy()
        };
        let calls = lookup.calls.clone();
        let report = analyzer(QualityPolicy::default(), lookup)
            .analyze(&candidate(50.0))
            .await;

        // Verification is never asked for once holders reject
        assert_eq!(calls.load(Ordering::SeqCst), 4);

        assert_eq!(report.score, 0);
        assert!(!report.passed_hard_filters);
        assert_eq!(report.component(Dimension::Security), Some(30));
        assert!(report.component(Dimension::Holders).is_none());
        assert_eq!(report.top_holder_pct, Some(90.0));
    }

    #[tokio::test]
    async fn test_lookup_failures_degrade() {
        let analyzer = analyzer(QualityPolicy::default(), ScriptedLookup::failing());
        let report = analyzer.analyze(&candidate(50.0)).await;

        // 25 liquidity + 20 market cap (fallback supply) + 0 security + 5 holders + 5 contract
        assert!(report.passed_hard_filters);
        assert_eq!(report.score, 55);
        assert_eq!(report.component(Dimension::Security), Some(0));
        assert!(report.reasons.iter().any(|r| r.contains("estimating from pool")));
        assert!(report.reasons.iter().any(|r| r.starts_with("Could not verify token authorities")));
        assert!(!report.should_alert);
    }

    #[tokio::test]
    async fn test_lookup_failure_ignores_require_flags() {
        let policy = QualityPolicy {
            require_mint_revoked: true,
            require_freeze_revoked: true,
            ..QualityPolicy::default()
        };
        let report = analyzer(policy, ScriptedLookup::failing())
            .analyze(&candidate(50.0))
            .await;

        assert!(report.passed_hard_filters);
    }

    #[tokio::test]
    async fn test_slow_lookups_time_out() {
        let policy = QualityPolicy {
            lookup_timeout_ms: 20,
            ..QualityPolicy::default()
        };
        let lookup = ScriptedLookup {
            delay: Some(Duration::from_millis(500)),
            ..ScriptedLookup::healthy()
        };
        let report = analyzer(policy, lookup).analyze(&candidate(50.0)).await;

        assert!(report.passed_hard_filters);
        assert_eq!(report.score, 55);
        assert!(report.reasons.iter().any(|r| r.contains("timed out")));
    }

    #[tokio::test]
    async fn test_score_bounds_and_flag_implications() {
        let analyzer = analyzer(
            QualityPolicy {
                auto_trade: true,
                ..QualityPolicy::default()
            },
            ScriptedLookup::healthy(),
        );

        for base in [0.0, 5.0, 10.0, 15.0, 20.0, 60.0, 100.0, 250.0, 500.0, 800.0] {
            for token_pooled in [1.0, 1_000.0, 1_000_000.0, 1e12] {
                let mut c = candidate(base);
                c.pooled[0].amount = token_pooled;
                let report = analyzer.analyze(&c).await;

                assert!(report.score <= 100);
                if report.should_alert {
                    assert!(report.passed_hard_filters);
                }
                if report.should_trade {
                    assert!(report.should_alert);
                }
                for (dimension, points) in &report.components {
                    let cap = match dimension {
                        Dimension::Liquidity => 25,
                        Dimension::MarketCap => 20,
                        Dimension::Security => 30,
                        Dimension::Holders => 15,
                        Dimension::Contract => 10,
                    };
                    assert!(*points <= cap);
                }
            }
        }

        assert_eq!(analyzer.stats().analyzed, 40);
    }

    #[test]
    fn test_pass_rate() {
        let stats = AnalyzerStats {
            analyzed: 4,
            passed: 1,
            failed: 3,
            ..Default::default()
        };
        assert!((stats.pass_rate() - 25.0).abs() < 1e-9);
        assert_eq!(AnalyzerStats::default().pass_rate(), 0.0);
    }
}
