pub mod monitoring_service;
pub mod pool_service;
pub mod position_aggregator;
pub mod price_service;
pub mod risk_calculator;
pub mod snapshot_cache;
pub mod token_metadata;
pub mod tx_orchestrator;

pub use monitoring_service::MonitoringService;
pub use pool_service::PoolSnapshotReader;
pub use position_aggregator::PositionAggregator;
pub use price_service::PriceService;
pub use risk_calculator::{RiskCalculator, RiskTier};
pub use snapshot_cache::{CacheKey, SnapshotCache};
pub use token_metadata::TokenMetadataService;
pub use tx_orchestrator::{ActionSubmitter, TransactionOrchestrator};
