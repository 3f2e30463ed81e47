use alloy::primitives::U256;
use chrono::Utc;
use std::sync::Arc;
use tracing::debug;

use crate::blockchain::bindings::{
    IInterestRateModel, ILendingPool, ILendingRouter, IPoolFactory, IERC20,
};
use crate::blockchain::{ChainError, ChainRegistry};
use crate::math;
use crate::models::{PoolRef, PoolSnapshot, RateBreakdown};
use crate::services::token_metadata::TokenMetadataService;

/// Reported-zero reserve factors fall back to this fraction. Protocol
/// convention: a zero reading means "use the default", which makes an
/// intentionally-configured zero reserve factor unobservable from here.
const DEFAULT_RESERVE_FACTOR: f64 = 0.10;

#[derive(Debug, thiserror::Error)]
pub enum PoolError {
    #[error("Chain error: {0}")]
    Chain(#[from] ChainError),

    #[error("Contract call failed: {0}")]
    Contract(String),
}

/// Reads one pool's complete economic state. Each call re-reads the chain;
/// nothing accumulates between calls, so two reads against unchanged state
/// derive identical figures. A failed step fails the whole read — callers
/// never see a half-populated snapshot.
pub struct PoolSnapshotReader {
    chains: Arc<ChainRegistry>,
    metadata: Arc<TokenMetadataService>,
}

impl PoolSnapshotReader {
    pub fn new(chains: Arc<ChainRegistry>, metadata: Arc<TokenMetadataService>) -> Self {
        Self { chains, metadata }
    }

    pub async fn read_snapshot(&self, pool: &PoolRef) -> Result<PoolSnapshot, PoolError> {
        let client = self.chains.client_for(pool.chain_id)?;
        let provider = client.provider();

        let router_addr = ILendingPool::new(pool.address, provider)
            .router()
            .call()
            .await
            .map_err(|e| PoolError::Contract(format!("router(): {e}")))?
            ._0;
        debug!(pool = %pool.address, router = %router_addr, "resolved pool router");

        let router = ILendingRouter::new(router_addr, provider);
        let (
            borrow_token_addr,
            collateral_token_addr,
            shares_token,
            total_supply_assets,
            total_borrow_assets,
            total_borrow_shares,
            ltv,
            factory,
        ) = tokio::try_join!(
            async {
                router
                    .borrowToken()
                    .call()
                    .await
                    .map(|r| r._0)
                    .map_err(|e| PoolError::Contract(format!("borrowToken(): {e}")))
            },
            async {
                router
                    .collateralToken()
                    .call()
                    .await
                    .map(|r| r._0)
                    .map_err(|e| PoolError::Contract(format!("collateralToken(): {e}")))
            },
            async {
                router
                    .sharesToken()
                    .call()
                    .await
                    .map(|r| r._0)
                    .map_err(|e| PoolError::Contract(format!("sharesToken(): {e}")))
            },
            async {
                router
                    .totalSupplyAssets()
                    .call()
                    .await
                    .map(|r| r._0)
                    .map_err(|e| PoolError::Contract(format!("totalSupplyAssets(): {e}")))
            },
            async {
                router
                    .totalBorrowAssets()
                    .call()
                    .await
                    .map(|r| r._0)
                    .map_err(|e| PoolError::Contract(format!("totalBorrowAssets(): {e}")))
            },
            async {
                router
                    .totalBorrowShares()
                    .call()
                    .await
                    .map(|r| r._0)
                    .map_err(|e| PoolError::Contract(format!("totalBorrowShares(): {e}")))
            },
            async {
                router
                    .ltv()
                    .call()
                    .await
                    .map(|r| r._0)
                    .map_err(|e| PoolError::Contract(format!("ltv(): {e}")))
            },
            async {
                router
                    .factory()
                    .call()
                    .await
                    .map(|r| r._0)
                    .map_err(|e| PoolError::Contract(format!("factory(): {e}")))
            },
        )?;

        let total_supply_shares = IERC20::new(shares_token, provider)
            .totalSupply()
            .call()
            .await
            .map_err(|e| PoolError::Contract(format!("sharesToken.totalSupply(): {e}")))?
            ._0;

        let pool_factory = IPoolFactory::new(factory, provider);
        let (interest_rate_model, price_feed) = tokio::try_join!(
            async {
                pool_factory
                    .interestRateModel()
                    .call()
                    .await
                    .map(|r| r._0)
                    .map_err(|e| PoolError::Contract(format!("interestRateModel(): {e}")))
            },
            async {
                pool_factory
                    .tokenDataStream()
                    .call()
                    .await
                    .map(|r| r._0)
                    .map_err(|e| PoolError::Contract(format!("tokenDataStream(): {e}")))
            },
        )?;

        // An empty pool has no defined rate; skip the model entirely rather
        // than calling it with zero denominators.
        let (borrow_rate, reserve_factor) =
            if total_supply_assets.is_zero() || total_borrow_assets.is_zero() {
                (None, None)
            } else {
                let model = IInterestRateModel::new(interest_rate_model, provider);
                let rate = model
                    .calculateBorrowRate(router_addr, total_supply_assets, total_borrow_assets)
                    .call()
                    .await
                    .map_err(|e| PoolError::Contract(format!("calculateBorrowRate(): {e}")))?
                    ._0;
                let reserve = model
                    .tokenReserveFactor(router_addr)
                    .call()
                    .await
                    .map_err(|e| PoolError::Contract(format!("tokenReserveFactor(): {e}")))?
                    ._0;
                (Some(rate), Some(reserve))
            };

        let (borrow_token, collateral_token) = tokio::try_join!(
            self.metadata.get(pool.chain_id, borrow_token_addr),
            self.metadata.get(pool.chain_id, collateral_token_addr),
        )?;

        let rates = derive_rates(
            total_supply_assets,
            total_borrow_assets,
            borrow_rate,
            reserve_factor,
        );

        debug!(
            pool = %pool.address,
            borrow_apy = rates.borrow_apy,
            supply_apy = rates.supply_apy,
            utilization = rates.utilization,
            "derived pool rates"
        );

        Ok(PoolSnapshot {
            pool: *pool,
            router: router_addr,
            factory,
            interest_rate_model,
            price_feed,
            borrow_token,
            collateral_token,
            shares_token,
            total_supply_assets,
            total_borrow_assets,
            total_supply_shares,
            total_borrow_shares,
            ltv,
            rates,
            liquidity: total_supply_assets.saturating_sub(total_borrow_assets),
            fetched_at: Utc::now(),
        })
    }
}

/// Pure derivation of the yield figures from raw pool state. `borrow_rate`
/// and `reserve_factor` are `None` when the model was skipped for an empty
/// pool.
pub fn derive_rates(
    total_supply_assets: U256,
    total_borrow_assets: U256,
    borrow_rate: Option<U256>,
    reserve_factor: Option<U256>,
) -> RateBreakdown {
    let utilization = math::ratio(total_borrow_assets, total_supply_assets);

    let borrow_apy = match borrow_rate {
        Some(rate) => math::to_display(rate, 18) * 100.0,
        None => 0.0,
    };

    let reserve_fraction = match reserve_factor.map(|rf| math::to_display(rf, 18)) {
        Some(rf) if rf > 0.0 => rf,
        _ => DEFAULT_RESERVE_FACTOR,
    };

    let supply_apy = (borrow_apy / 100.0) * utilization * (1.0 - reserve_fraction) * 100.0;

    RateBreakdown {
        borrow_apy,
        supply_apy,
        utilization,
    }
}
