use alloy::primitives::Address;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::blockchain::bindings::ITokenDataStream;
use crate::blockchain::ChainRegistry;
use crate::models::{OraclePrice, TokenAmount};

#[derive(Debug, thiserror::Error)]
pub enum PriceError {
    #[error("Oracle call failed: {0}")]
    OracleError(String),

    #[error("Token not listed on feed: {0}")]
    TokenNotListed(String),
}

#[derive(Debug, Clone)]
struct CachedPrice {
    price: Option<OraclePrice>,
    cached_at: Instant,
}

/// Resolves token prices from the protocol's token data stream. Feed
/// failures degrade to "no price" rather than erroring out of an
/// aggregation pass; whitelisted stable assets fall back to a $1 quote.
pub struct PriceService {
    chains: Arc<ChainRegistry>,
    stable_assets: HashSet<Address>,
    cache: Mutex<HashMap<(u64, Address), CachedPrice>>,
    cache_ttl: Duration,
}

impl PriceService {
    pub fn new(chains: Arc<ChainRegistry>, stable_assets: Vec<Address>, cache_ttl: Duration) -> Self {
        Self {
            chains,
            stable_assets: stable_assets.into_iter().collect(),
            cache: Mutex::new(HashMap::new()),
            cache_ttl,
        }
    }

    /// Latest price for `token` from the data stream at `price_feed`.
    /// `None` means no usable quote: the caller excludes the token from USD
    /// totals instead of valuing it at zero.
    pub async fn get_price(
        &self,
        chain_id: u64,
        price_feed: Address,
        token: Address,
    ) -> Option<OraclePrice> {
        if let Some(cached) = self.cached(chain_id, token) {
            return cached;
        }

        let resolved = match self.read_feed(chain_id, price_feed, token).await {
            Ok(price) if price.is_available() => Some(price),
            Ok(_) => {
                tracing::debug!(%token, "feed reported zero price, treating as unlisted");
                self.stable_fallback(token)
            }
            Err(e) => {
                tracing::warn!(%token, error = %e, "price feed read failed");
                self.stable_fallback(token)
            }
        };

        if let Ok(mut cache) = self.cache.lock() {
            cache.insert(
                (chain_id, token),
                CachedPrice {
                    price: resolved,
                    cached_at: Instant::now(),
                },
            );
        }
        resolved
    }

    /// USD value of an amount under a price; the two display conversions
    /// are each decimal-safe.
    pub fn to_usd(amount: &TokenAmount, price: &OraclePrice) -> f64 {
        amount.display() * price.display()
    }

    fn cached(&self, chain_id: u64, token: Address) -> Option<Option<OraclePrice>> {
        let cache = self.cache.lock().ok()?;
        let entry = cache.get(&(chain_id, token))?;
        if entry.cached_at.elapsed() < self.cache_ttl {
            Some(entry.price)
        } else {
            None
        }
    }

    fn stable_fallback(&self, token: Address) -> Option<OraclePrice> {
        if self.stable_assets.contains(&token) {
            tracing::debug!(%token, "using stable asset fallback quote");
            Some(OraclePrice::one(8))
        } else {
            None
        }
    }

    async fn read_feed(
        &self,
        chain_id: u64,
        price_feed: Address,
        token: Address,
    ) -> Result<OraclePrice, PriceError> {
        let client = self
            .chains
            .client_for(chain_id)
            .map_err(|e| PriceError::OracleError(e.to_string()))?;
        let feed = ITokenDataStream::new(price_feed, client.provider());

        let round = feed
            .latestRoundData(token)
            .call()
            .await
            .map_err(|e| PriceError::OracleError(e.to_string()))?;
        let decimals = feed
            .decimals(token)
            .call()
            .await
            .map_err(|e| PriceError::OracleError(e.to_string()))?
            ._0;

        Ok(OraclePrice::new(round.price, decimals))
    }
}
