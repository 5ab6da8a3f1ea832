// DexScreener price oracle
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::error::{Error, Result};
use crate::oracle::PriceOracle;

const DEXSCREENER_BASE: &str = "https://api.dexscreener.com";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Liquidity {
    pub usd: Option<f64>,
    pub base: Option<f64>,
    pub quote: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PairToken {
    pub address: String,
    pub name: Option<String>,
    pub symbol: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DexPair {
    #[serde(rename = "chainId")]
    pub chain_id: String,
    #[serde(rename = "dexId")]
    pub dex_id: String,
    #[serde(rename = "pairAddress")]
    pub pair_address: String,
    #[serde(rename = "baseToken")]
    pub base_token: PairToken,
    #[serde(rename = "quoteToken")]
    pub quote_token: PairToken,
    #[serde(rename = "priceNative")]
    pub price_native: Option<String>,
    pub liquidity: Option<Liquidity>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPairsResponse {
    pub pairs: Option<Vec<DexPair>>,
}

/// Prices tokens from DexScreener pairs quoted in the base asset
pub struct DexScreenerOracle {
    client: reqwest::Client,
    base_url: String,
    base_asset: String,
}

impl DexScreenerOracle {
    pub fn new(base_asset: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(10))
                .build()
                .unwrap_or_default(),
            base_url: DEXSCREENER_BASE.to_string(),
            base_asset: base_asset.into(),
        }
    }

    /// Point the oracle at a different API host
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Fetch every pair DexScreener lists for a token
    pub async fn get_token_pairs(&self, token: &str) -> Result<Vec<DexPair>> {
        let url = format!("{}/latest/dex/tokens/{}", self.base_url, token);
        let resp = self.client.get(&url).send().await?;
        if !resp.status().is_success() {
            return Err(Error::Http(format!(
                "DexScreener returned {} for {}",
                resp.status(),
                token
            )));
        }
        let data: TokenPairsResponse = resp.json().await?;
        Ok(data.pairs.unwrap_or_default())
    }

    /// Price of `token` in base-asset units from the deepest matching pair.
    ///
    /// `priceNative` is quoted as quote-per-base-token, so pairs where our token
    /// sits on the quote side are inverted.
    pub fn price_from_pairs(&self, token: &str, pairs: &[DexPair]) -> Option<f64> {
        pairs
            .iter()
            .filter_map(|pair| {
                let native = pair.price_native.as_ref()?.parse::<f64>().ok()?;
                if native <= 0.0 || !native.is_finite() {
                    return None;
                }
                let price = if pair.base_token.address == token
                    && pair.quote_token.address == self.base_asset
                {
                    native
                } else if pair.quote_token.address == token
                    && pair.base_token.address == self.base_asset
                {
                    1.0 / native
                } else {
                    return None;
                };
                let depth = pair.liquidity.as_ref().and_then(|l| l.usd).unwrap_or(0.0);
                Some((price, depth))
            })
            .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(price, _)| price)
    }
}

#[async_trait]
impl PriceOracle for DexScreenerOracle {
    async fn get_price(&self, token: &str) -> Result<Option<f64>> {
        let pairs = self.get_token_pairs(token).await?;
        let price = self.price_from_pairs(token, &pairs);
        debug!("DexScreener price for {}: {:?} ({} pairs)", token, price, pairs.len());
        Ok(price)
    }
}
