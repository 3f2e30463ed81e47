use crate::blockchain::client::ChainError;
use crate::indexer::IndexerError;
use crate::math::MathError;
use crate::services::pool_service::PoolError;
use crate::services::position_aggregator::AggregatorError;
use crate::services::price_service::PriceError;
use crate::services::tx_orchestrator::{OrchestratorError, ValidationError};

/// Top-level error for the engine. Module-specific errors convert into this
/// at the daemon boundary; inside the services they stay typed.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Chain error: {0}")]
    Chain(#[from] ChainError),

    #[error("Math error: {0}")]
    Math(#[from] MathError),

    #[error("Price error: {0}")]
    Price(#[from] PriceError),

    #[error("Pool error: {0}")]
    Pool(#[from] PoolError),

    #[error("Aggregation error: {0}")]
    Aggregator(#[from] AggregatorError),

    #[error("Orchestration error: {0}")]
    Orchestrator(#[from] OrchestratorError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Indexer error: {0}")]
    Indexer(#[from] IndexerError),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Internal error: {0}")]
    Internal(String),
}
