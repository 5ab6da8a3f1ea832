//! Price lookup seam
//!
//! Prices are always denominated in the base asset. A missing price is not an
//! error: callers treat `Ok(None)` and `Err(_)` alike and retry on the next tick.

pub mod dexscreener;

use async_trait::async_trait;
use dashmap::DashMap;

use crate::error::Result;

pub use dexscreener::DexScreenerOracle;

/// Current token prices in base-asset units
#[async_trait]
pub trait PriceOracle: Send + Sync {
    async fn get_price(&self, token: &str) -> Result<Option<f64>>;
}

/// Oracle fed by the host (e.g. from a pool-reserve subscription)
#[derive(Debug, Default)]
pub struct StaticPriceOracle {
    prices: DashMap<String, f64>,
}

impl StaticPriceOracle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish the latest price for a token
    pub fn set(&self, token: &str, price: f64) {
        self.prices.insert(token.to_string(), price);
    }

    /// Forget a token's price
    pub fn remove(&self, token: &str) {
        self.prices.remove(token);
    }
}

#[async_trait]
impl PriceOracle for StaticPriceOracle {
    async fn get_price(&self, token: &str) -> Result<Option<f64>> {
        Ok(self.prices.get(token).map(|p| *p))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_oracle() {
        let oracle = StaticPriceOracle::new();
        assert_eq!(oracle.get_price("mint").await.unwrap(), None);

        oracle.set("mint", 0.25);
        assert_eq!(oracle.get_price("mint").await.unwrap(), Some(0.25));

        oracle.remove("mint");
        assert_eq!(oracle.get_price("mint").await.unwrap(), None);
    }
}
