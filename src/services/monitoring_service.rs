use alloy::primitives::Address;
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tokio::time;
use tracing::{error, info, warn};

use crate::blockchain::ChainClient;
use crate::config::Settings;
use crate::error::retry::{retry_with_backoff, RetryConfig};
use crate::error::AppError;
use crate::indexer::IndexerClient;
use crate::math;
use crate::services::pool_service::PoolSnapshotReader;
use crate::services::position_aggregator::PositionAggregator;
use crate::services::risk_calculator::RiskCalculator;
use crate::services::snapshot_cache::SnapshotCache;

/// Interval-driven refresh of pool snapshots and the watched account's
/// portfolio. Each cycle is isolated: a failing cycle logs and the next
/// tick starts clean, and a failing pool inside a cycle only costs that
/// pool's snapshot.
pub struct MonitoringService {
    settings: Settings,
    indexer: Arc<IndexerClient>,
    pools: Arc<PoolSnapshotReader>,
    aggregator: Arc<PositionAggregator>,
    risk: RiskCalculator,
    cache: Arc<SnapshotCache>,
    retry: RetryConfig,
}

impl MonitoringService {
    pub fn new(
        settings: Settings,
        indexer: Arc<IndexerClient>,
        pools: Arc<PoolSnapshotReader>,
        aggregator: Arc<PositionAggregator>,
        cache: Arc<SnapshotCache>,
    ) -> Self {
        Self {
            settings,
            indexer,
            pools,
            aggregator,
            risk: RiskCalculator::new(),
            cache,
            retry: RetryConfig::for_rpc(),
        }
    }

    pub async fn start(&self) -> Result<(), AppError> {
        info!(
            interval_seconds = self.settings.blockchain.poll_interval_seconds,
            "starting snapshot polling"
        );
        let mut interval = time::interval(Duration::from_secs(
            self.settings.blockchain.poll_interval_seconds,
        ));

        loop {
            tokio::select! {
                _ = interval.tick() => {}
                _ = self.cache.refresh_signal().notified() => {
                    info!("transaction confirmed, refreshing on demand");
                }
            }
            if let Err(e) = self.refresh_cycle().await {
                error!(error = %e, "refresh cycle failed");
            }
        }
    }

    async fn refresh_cycle(&self) -> Result<(), AppError> {
        let pool_refs = self.indexer.list_pools().await?;
        info!(pool_count = pool_refs.len(), "refreshing pool snapshots");

        let reads = pool_refs.iter().map(|pool| async move {
            retry_with_backoff(&self.retry, "read_snapshot", || {
                self.pools.read_snapshot(pool)
            })
            .await
        });
        let settled = join_all(reads).await;

        for (pool, result) in pool_refs.iter().zip(settled) {
            match result {
                Ok(snapshot) => {
                    info!(
                        pool = %pool.address,
                        chain_id = pool.chain_id,
                        supply_apy = snapshot.rates.supply_apy,
                        borrow_apy = snapshot.rates.borrow_apy,
                        liquidity = %math::format_abbreviated(math::to_display(
                            snapshot.liquidity,
                            snapshot.borrow_token.decimals
                        )),
                        "pool snapshot"
                    );
                    self.cache.put_snapshot(snapshot).await;
                }
                Err(e) => {
                    warn!(pool = %pool.address, error = %e, "snapshot read failed this cycle");
                }
            }
        }

        if let Some(account) = self.watch_address() {
            let portfolio = self.aggregator.fetch_portfolio(account, &pool_refs).await;
            let health = self
                .risk
                .health_factor(portfolio.total_collateral_usd, portfolio.total_borrow_usd);
            info!(
                %account,
                deposits = %math::format_abbreviated(portfolio.total_deposit_usd),
                borrows = %math::format_abbreviated(portfolio.total_borrow_usd),
                collateral = %math::format_abbreviated(portfolio.total_collateral_usd),
                net_supply_apy = portfolio.net_supply_apy,
                health_factor = health,
                risk_tier = ?self.risk.classify(health),
                partial_data = portfolio.partial_data,
                "portfolio refreshed"
            );
            self.cache.put_portfolio(portfolio).await;
        }

        Ok(())
    }

    fn watch_address(&self) -> Option<Address> {
        let raw = self.settings.protocol.watch_address.as_deref()?;
        match ChainClient::validate_address(raw) {
            Ok(address) => Some(address),
            Err(e) => {
                warn!(watch_address = raw, error = %e, "ignoring invalid watch address");
                None
            }
        }
    }
}
