//! Read-only token lookups used by the analyzer

use async_trait::async_trait;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::pubkey::Pubkey;
use spl_token::solana_program::program_pack::Pack;
use spl_token::state::Mint;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::error::{Error, Result};
use crate::quality::types::{AuthorityStatus, HoneypotReport};

/// Chain and API data the full analysis needs
#[async_trait]
pub trait TokenLookup: Send + Sync {
    /// Total supply in UI units
    async fn token_supply(&self, token: &str) -> Result<Option<f64>>;

    async fn authority_status(&self, token: &str) -> Result<AuthorityStatus>;

    /// Share of supply held by the largest account, in percent
    async fn top_holder_pct(&self, token: &str) -> Result<Option<f64>>;

    /// Buy/sell simulation. `None` when no simulator is available.
    async fn honeypot_check(&self, _token: &str) -> Result<Option<HoneypotReport>> {
        Ok(None)
    }

    /// Source verification status. `None` when unknown.
    async fn verification(&self, _token: &str) -> Result<Option<bool>> {
        Ok(None)
    }
}

/// Lookups over Solana JSON-RPC
pub struct SolanaTokenLookup {
    rpc: Arc<RpcClient>,
}

impl SolanaTokenLookup {
    pub fn new(endpoint: &str, timeout: Duration) -> Self {
        let rpc = RpcClient::new_with_timeout_and_commitment(
            endpoint.to_string(),
            timeout,
            CommitmentConfig::confirmed(),
        );
        Self { rpc: Arc::new(rpc) }
    }

    fn pubkey(token: &str) -> Result<Pubkey> {
        Pubkey::from_str(token).map_err(|e| Error::Rpc(format!("invalid mint {}: {}", token, e)))
    }
}

/// Decode authority state from raw mint account data.
///
/// Token-2022 mints carry extensions after the base layout, so only the
/// leading `Mint::LEN` bytes are unpacked.
pub fn parse_mint_authorities(data: &[u8]) -> Result<AuthorityStatus> {
    if data.len() < Mint::LEN {
        return Err(Error::Rpc(format!(
            "account data too short for an SPL mint: {} bytes",
            data.len()
        )));
    }
    let mint = Mint::unpack(&data[..Mint::LEN])
        .map_err(|e| Error::Rpc(format!("not an SPL mint: {}", e)))?;

    Ok(AuthorityStatus {
        mint_revoked: mint.mint_authority.is_none(),
        freeze_revoked: mint.freeze_authority.is_none(),
    })
}

#[async_trait]
impl TokenLookup for SolanaTokenLookup {
    async fn token_supply(&self, token: &str) -> Result<Option<f64>> {
        let mint = Self::pubkey(token)?;
        let supply = self.rpc.get_token_supply(&mint).await?;
        debug!("Supply of {}: {:?}", token, supply.ui_amount);
        Ok(supply.ui_amount.filter(|s| *s > 0.0))
    }

    async fn authority_status(&self, token: &str) -> Result<AuthorityStatus> {
        let mint = Self::pubkey(token)?;
        let account = self.rpc.get_account(&mint).await?;
        parse_mint_authorities(&account.data)
    }

    async fn top_holder_pct(&self, token: &str) -> Result<Option<f64>> {
        let mint = Self::pubkey(token)?;
        let largest = self.rpc.get_token_largest_accounts(&mint).await?;
        let Some(top) = largest.first().and_then(|a| a.amount.ui_amount) else {
            return Ok(None);
        };

        let Some(supply) = self.token_supply(token).await? else {
            return Ok(None);
        };
        Ok(Some(top / supply * 100.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spl_token::solana_program::program_option::COption;

    fn mint_bytes(mint_authority: COption<Pubkey>, freeze_authority: COption<Pubkey>) -> Vec<u8> {
        let mint = Mint {
            mint_authority,
            supply: 1_000_000_000,
            decimals: 6,
            is_initialized: true,
            freeze_authority,
        };
        let mut data = vec![0u8; Mint::LEN];
        Mint::pack(mint, &mut data).unwrap();
        data
    }

    #[test]
    fn test_parse_revoked_authorities() {
        let data = mint_bytes(COption::None, COption::None);
        let status = parse_mint_authorities(&data).unwrap();

        assert!(status.mint_revoked);
        assert!(status.freeze_revoked);
    }

    #[test]
    fn test_parse_active_authorities() {
        let data = mint_bytes(COption::Some(Pubkey::new_unique()), COption::None);
        let status = parse_mint_authorities(&data).unwrap();

        assert!(!status.mint_revoked);
        assert!(status.freeze_revoked);
    }

    #[test]
    fn test_parse_with_extensions() {
        let mut data = mint_bytes(COption::None, COption::Some(Pubkey::new_unique()));
        data.extend_from_slice(&[0u8; 83]);

        let status = parse_mint_authorities(&data).unwrap();
        assert!(!status.freeze_revoked);
    }

    #[test]
    fn test_parse_short_data() {
        assert!(parse_mint_authorities(&[0u8; 40]).is_err());
    }
}
