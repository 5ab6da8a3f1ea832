//! Trade execution seam
//!
//! Swap execution against a DEX router lives in the host process. The core only
//! sees confirmed fills through [`TradeExecutor`]; a position is never opened or
//! closed without one.

pub mod paper;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::position::CloseReason;

pub use paper::PaperTrader;

/// A confirmed swap
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fill {
    /// Transaction hash / signature
    pub tx_hash: String,
    /// Execution price in base-asset units per token
    pub price: f64,
    /// Base asset spent (buy) or received net of fees (sell)
    pub base_amount: f64,
    /// Tokens received (buy) or sold (sell)
    pub token_amount: f64,
    /// Fees paid in base-asset units, already reflected in the amounts above
    pub fee: f64,
    /// Confirmation time
    pub timestamp: DateTime<Utc>,
}

/// Executes swaps on behalf of the core
#[async_trait]
pub trait TradeExecutor: Send + Sync {
    /// Spend `base_amount` of the base asset on `token`
    async fn buy(&self, token: &str, base_amount: f64) -> Result<Fill>;

    /// Sell `quantity` tokens back into the base asset
    async fn sell(&self, token: &str, quantity: f64, reason: CloseReason) -> Result<Fill>;
}
