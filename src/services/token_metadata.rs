use alloy::primitives::Address;
use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;

use crate::blockchain::bindings::IERC20;
use crate::blockchain::{ChainError, ChainRegistry};
use crate::models::TokenInfo;

/// Cache duration for token metadata; symbols and decimals are immutable
/// in practice.
const METADATA_CACHE_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// symbol/name/decimals lookups with a long-lived cache, so repeated
/// snapshot reads do not re-fetch immutable token facts every poll.
pub struct TokenMetadataService {
    chains: Arc<ChainRegistry>,
    cache: Cache<(u64, Address), TokenInfo>,
}

impl TokenMetadataService {
    pub fn new(chains: Arc<ChainRegistry>) -> Self {
        Self {
            chains,
            cache: Cache::builder()
                .max_capacity(10_000)
                .time_to_live(METADATA_CACHE_TTL)
                .build(),
        }
    }

    pub async fn get(&self, chain_id: u64, token: Address) -> Result<TokenInfo, ChainError> {
        let chains = self.chains.clone();
        self.cache
            .try_get_with((chain_id, token), async move {
                let client = chains.client_for(chain_id)?;
                let erc20 = IERC20::new(token, client.provider());

                let symbol = erc20
                    .symbol()
                    .call()
                    .await
                    .map_err(|e| ChainError::ContractError(format!("symbol(): {e}")))?
                    ._0;
                let name = erc20
                    .name()
                    .call()
                    .await
                    .map_err(|e| ChainError::ContractError(format!("name(): {e}")))?
                    ._0;
                let decimals = erc20
                    .decimals()
                    .call()
                    .await
                    .map_err(|e| ChainError::ContractError(format!("decimals(): {e}")))?
                    ._0;

                tracing::debug!(%token, symbol, decimals, "resolved token metadata");
                Ok(TokenInfo {
                    address: token,
                    symbol,
                    name,
                    decimals,
                })
            })
            .await
            .map_err(|e: Arc<ChainError>| ChainError::ContractError(e.to_string()))
    }
}
