//! Paper trading
//!
//! Fills every order at the current oracle price minus a flat fee. Used for
//! dry runs and by the CLI; nothing is signed or broadcast.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

use crate::error::{Error, Result};
use crate::oracle::PriceOracle;
use crate::position::CloseReason;
use crate::trading::{Fill, TradeExecutor};

/// Simulated executor backed by a price oracle
pub struct PaperTrader {
    oracle: Arc<dyn PriceOracle>,
    /// Fee as a fraction (0.0025 = 0.25%)
    fee_ratio: f64,
}

impl PaperTrader {
    /// Create a paper trader charging `fee_pct` percent per fill
    pub fn new(oracle: Arc<dyn PriceOracle>, fee_pct: f64) -> Self {
        Self {
            oracle,
            fee_ratio: fee_pct / 100.0,
        }
    }

    async fn quote(&self, token: &str) -> Result<f64> {
        match self.oracle.get_price(token).await? {
            Some(price) if price > 0.0 => Ok(price),
            _ => Err(Error::PriceUnavailable(token.to_string())),
        }
    }

    fn tx_hash() -> String {
        format!("paper-{}", uuid::Uuid::new_v4())
    }
}

#[async_trait]
impl TradeExecutor for PaperTrader {
    async fn buy(&self, token: &str, base_amount: f64) -> Result<Fill> {
        if base_amount <= 0.0 {
            return Err(Error::TradeExecution(format!(
                "buy amount must be positive, got {}",
                base_amount
            )));
        }

        let price = self.quote(token).await?;
        let fee = base_amount * self.fee_ratio;
        let token_amount = (base_amount - fee) / price;

        info!(
            "PAPER BUY {}: {} base -> {} tokens @ {}",
            token, base_amount, token_amount, price
        );

        Ok(Fill {
            tx_hash: Self::tx_hash(),
            price,
            base_amount,
            token_amount,
            fee,
            timestamp: chrono::Utc::now(),
        })
    }

    async fn sell(&self, token: &str, quantity: f64, reason: CloseReason) -> Result<Fill> {
        if quantity <= 0.0 {
            return Err(Error::TradeExecution(format!(
                "sell quantity must be positive, got {}",
                quantity
            )));
        }

        let price = self.quote(token).await?;
        let gross = quantity * price;
        let fee = gross * self.fee_ratio;

        info!(
            "PAPER SELL {} ({}): {} tokens -> {} base @ {}",
            token,
            reason,
            quantity,
            gross - fee,
            price
        );

        Ok(Fill {
            tx_hash: Self::tx_hash(),
            price,
            base_amount: gross - fee,
            token_amount: quantity,
            fee,
            timestamp: chrono::Utc::now(),
        })
    }
}
