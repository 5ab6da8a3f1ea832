//! Token quality analysis
//!
//! A candidate pair is scored 0-100 across five weighted dimensions:
//! liquidity, market cap, security, holder distribution and contract trust.

pub mod analyzer;
pub mod lookup;
pub mod rules;
pub mod types;

pub use analyzer::{AnalyzerStats, QualityAnalyzer};
pub use lookup::{SolanaTokenLookup, TokenLookup};
pub use types::{
    AuthorityStatus, Dimension, HoneypotReport, PairCandidate, PooledAsset, QualityReport,
    SecurityFindings,
};
