use alloy::primitives::{Address, U256};
use chrono::Utc;
use futures::future::join_all;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::blockchain::bindings::{IERC20, ILendingRouter};
use crate::blockchain::{ChainError, ChainRegistry};
use crate::math;
use crate::models::{
    AccountPosition, CollateralLine, PoolRef, PortfolioSummary, TokenAmount,
};
use crate::services::pool_service::{PoolError, PoolSnapshotReader};
use crate::services::price_service::PriceService;
use crate::services::token_metadata::TokenMetadataService;

#[derive(Debug, thiserror::Error)]
pub enum AggregatorError {
    #[error("Chain error: {0}")]
    Chain(#[from] ChainError),

    #[error("Pool error: {0}")]
    Pool(#[from] PoolError),

    #[error("Contract call failed: {0}")]
    Contract(String),
}

/// Resolves one account's stake across every indexer-discovered pool.
/// Per-pool reads run concurrently and settle independently; a single
/// pool's failure degrades the totals instead of aborting the pass.
pub struct PositionAggregator {
    chains: Arc<ChainRegistry>,
    pools: Arc<PoolSnapshotReader>,
    prices: Arc<PriceService>,
    metadata: Arc<TokenMetadataService>,
    /// Protocol-whitelisted collateral tokens; a position contract may hold
    /// any of these after swaps, not just its pool's configured collateral.
    collateral_tokens: Vec<Address>,
}

impl PositionAggregator {
    pub fn new(
        chains: Arc<ChainRegistry>,
        pools: Arc<PoolSnapshotReader>,
        prices: Arc<PriceService>,
        metadata: Arc<TokenMetadataService>,
        collateral_tokens: Vec<Address>,
    ) -> Self {
        Self {
            chains,
            pools,
            prices,
            metadata,
            collateral_tokens,
        }
    }

    pub async fn fetch_portfolio(
        &self,
        account: Address,
        pool_refs: &[PoolRef],
    ) -> PortfolioSummary {
        debug!(%account, pool_count = pool_refs.len(), "starting portfolio aggregation");

        let reads = pool_refs
            .iter()
            .map(|pool| self.fetch_pool_position(account, *pool));
        let settled = join_all(reads).await;

        let mut positions = Vec::new();
        let mut partial_data = false;
        for (pool, result) in pool_refs.iter().zip(settled) {
            match result {
                Ok(position) => {
                    if position.deposit_value_usd.is_none() && !position.deposit_assets.is_zero() {
                        partial_data = true;
                    }
                    if position.borrow_value_usd.is_none() && !position.borrow_assets.is_zero() {
                        partial_data = true;
                    }
                    if position.collateral.iter().any(|l| l.value_usd.is_none()) {
                        partial_data = true;
                    }
                    positions.push(position);
                }
                Err(e) => {
                    warn!(%account, pool = %pool.address, error = %e, "pool read failed, excluding from totals");
                    partial_data = true;
                }
            }
        }

        summarize(account, positions, partial_data)
    }

    async fn fetch_pool_position(
        &self,
        account: Address,
        pool: PoolRef,
    ) -> Result<AccountPosition, AggregatorError> {
        let snapshot = self.pools.read_snapshot(&pool).await?;
        let client = self.chains.client_for(pool.chain_id)?;
        let provider = client.provider();

        let deposit_shares = IERC20::new(snapshot.shares_token, provider)
            .balanceOf(account)
            .call()
            .await
            .map_err(|e| AggregatorError::Contract(format!("sharesToken.balanceOf(): {e}")))?
            ._0;
        let deposit_assets = math::shares_to_assets(
            deposit_shares,
            snapshot.total_supply_shares,
            snapshot.total_supply_assets,
        );

        let router = ILendingRouter::new(snapshot.router, provider);
        let position_addr = router
            .addressPositions(account)
            .call()
            .await
            .map_err(|e| AggregatorError::Contract(format!("addressPositions(): {e}")))?
            ._0;
        let position_contract = (position_addr != Address::ZERO).then_some(position_addr);

        let (borrow_shares, borrow_assets) = match position_contract {
            Some(_) => {
                let shares = router
                    .userBorrowShares(account)
                    .call()
                    .await
                    .map_err(|e| AggregatorError::Contract(format!("userBorrowShares(): {e}")))?
                    ._0;
                let assets = math::shares_to_assets(
                    shares,
                    snapshot.total_borrow_shares,
                    snapshot.total_borrow_assets,
                );
                (shares, assets)
            }
            None => (U256::ZERO, U256::ZERO),
        };

        let collateral = match position_contract {
            Some(holder) => self.read_collateral(&pool, &snapshot.price_feed, holder).await?,
            None => Vec::new(),
        };

        // Deposit and borrow sides are both denominated in the borrow token.
        let borrow_token_price = self
            .prices
            .get_price(
                pool.chain_id,
                snapshot.price_feed,
                snapshot.borrow_token.address,
            )
            .await;
        let value_of = |raw: U256| {
            borrow_token_price.map(|price| {
                PriceService::to_usd(
                    &TokenAmount::new(raw, snapshot.borrow_token.decimals),
                    &price,
                )
            })
        };

        Ok(AccountPosition {
            pool,
            deposit_shares,
            deposit_assets,
            deposit_value_usd: value_of(deposit_assets),
            borrow_shares,
            borrow_assets,
            borrow_value_usd: value_of(borrow_assets),
            position_contract,
            collateral,
            supply_apy: snapshot.rates.supply_apy,
            borrow_apy: snapshot.rates.borrow_apy,
        })
    }

    async fn read_collateral(
        &self,
        pool: &PoolRef,
        price_feed: &Address,
        holder: Address,
    ) -> Result<Vec<CollateralLine>, AggregatorError> {
        let client = self.chains.client_for(pool.chain_id)?;
        let provider = client.provider();

        let mut lines = Vec::new();
        for token in &self.collateral_tokens {
            let balance = IERC20::new(*token, provider)
                .balanceOf(holder)
                .call()
                .await
                .map_err(|e| AggregatorError::Contract(format!("collateral balanceOf(): {e}")))?
                ._0;
            if balance.is_zero() {
                continue;
            }

            let info = self.metadata.get(pool.chain_id, *token).await?;
            let value_usd = self
                .prices
                .get_price(pool.chain_id, *price_feed, *token)
                .await
                .map(|price| {
                    PriceService::to_usd(&TokenAmount::new(balance, info.decimals), &price)
                });

            lines.push(CollateralLine {
                token: *token,
                symbol: info.symbol,
                decimals: info.decimals,
                amount: balance,
                value_usd,
            });
        }
        Ok(lines)
    }
}

/// Pure cross-pool rollup. Unpriced entries weigh nothing; weighted
/// averages are zero when the corresponding total is zero.
pub fn summarize(
    account: Address,
    positions: Vec<AccountPosition>,
    partial_data: bool,
) -> PortfolioSummary {
    let total_deposit_usd: f64 = positions
        .iter()
        .filter_map(|p| p.deposit_value_usd)
        .sum();
    let total_borrow_usd: f64 = positions
        .iter()
        .filter_map(|p| p.borrow_value_usd)
        .sum();
    let total_collateral_usd: f64 = positions.iter().map(|p| p.collateral_value_usd()).sum();

    let net_supply_apy = if total_deposit_usd > 0.0 {
        positions
            .iter()
            .filter_map(|p| p.deposit_value_usd.map(|usd| usd * p.supply_apy))
            .sum::<f64>()
            / total_deposit_usd
    } else {
        0.0
    };
    let net_borrow_apy = if total_borrow_usd > 0.0 {
        positions
            .iter()
            .filter_map(|p| p.borrow_value_usd.map(|usd| usd * p.borrow_apy))
            .sum::<f64>()
            / total_borrow_usd
    } else {
        0.0
    };

    PortfolioSummary {
        account,
        positions,
        total_deposit_usd,
        total_borrow_usd,
        total_collateral_usd,
        net_supply_apy,
        net_borrow_apy,
        partial_data,
        fetched_at: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn position(
        deposit_usd: Option<f64>,
        borrow_usd: Option<f64>,
        supply_apy: f64,
        borrow_apy: f64,
        collateral: Vec<CollateralLine>,
    ) -> AccountPosition {
        AccountPosition {
            pool: PoolRef {
                chain_id: 1,
                address: Address::ZERO,
            },
            deposit_shares: U256::from(1u64),
            deposit_assets: U256::from(1u64),
            deposit_value_usd: deposit_usd,
            borrow_shares: U256::from(1u64),
            borrow_assets: U256::from(1u64),
            borrow_value_usd: borrow_usd,
            position_contract: None,
            collateral,
            supply_apy,
            borrow_apy,
        }
    }

    #[test]
    fn totals_sum_across_pools() {
        let summary = summarize(
            Address::ZERO,
            vec![
                position(Some(100.0), Some(40.0), 4.0, 8.0, vec![]),
                position(Some(300.0), Some(60.0), 6.0, 10.0, vec![]),
            ],
            false,
        );
        assert_eq!(summary.total_deposit_usd, 400.0);
        assert_eq!(summary.total_borrow_usd, 100.0);
        // (100*4 + 300*6) / 400 = 5.5 ; (40*8 + 60*10) / 100 = 9.2
        assert!((summary.net_supply_apy - 5.5).abs() < 1e-9);
        assert!((summary.net_borrow_apy - 9.2).abs() < 1e-9);
        assert!(!summary.partial_data);
    }

    #[test]
    fn empty_portfolio_has_zero_weighted_averages() {
        let summary = summarize(Address::ZERO, vec![], false);
        assert_eq!(summary.total_deposit_usd, 0.0);
        assert_eq!(summary.net_supply_apy, 0.0);
        assert_eq!(summary.net_borrow_apy, 0.0);
    }

    #[test]
    fn unpriced_positions_do_not_weigh_in() {
        let summary = summarize(
            Address::ZERO,
            vec![
                position(Some(200.0), None, 5.0, 0.0, vec![]),
                position(None, None, 99.0, 99.0, vec![]),
            ],
            true,
        );
        assert_eq!(summary.total_deposit_usd, 200.0);
        assert!((summary.net_supply_apy - 5.0).abs() < 1e-9);
        assert!(summary.partial_data);
    }

    #[test]
    fn collateral_lines_sum_with_missing_prices_excluded() {
        let lines = vec![
            CollateralLine {
                token: Address::ZERO,
                symbol: "WETH".to_string(),
                decimals: 18,
                amount: U256::from(1u64),
                value_usd: Some(3000.0),
            },
            CollateralLine {
                token: Address::ZERO,
                symbol: "NEW".to_string(),
                decimals: 18,
                amount: U256::from(1u64),
                value_usd: None,
            },
        ];
        let summary = summarize(
            Address::ZERO,
            vec![position(None, None, 0.0, 0.0, lines)],
            false,
        );
        assert_eq!(summary.total_collateral_usd, 3000.0);
    }
}
