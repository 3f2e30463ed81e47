use alloy::network::EthereumWallet;
use alloy::providers::ProviderBuilder;
use alloy::signers::local::PrivateKeySigner;
use lendscope::{
    blockchain::{ChainClient, ChainRegistry, WalletSubmitter},
    config::Settings,
    indexer::IndexerClient,
    services::{
        MonitoringService, PoolSnapshotReader, PositionAggregator, PriceService, SnapshotCache,
        TokenMetadataService, TransactionOrchestrator,
    },
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let settings = Settings::new()?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(settings.logging.level.clone())),
        )
        .init();

    info!("Starting lendscope");

    let chains = Arc::new(ChainRegistry::new(&settings.blockchain)?);
    if let Err(e) = chains.test_connections().await {
        warn!(error = %e, "not all RPC endpoints are reachable; degraded startup");
    }

    let indexer = Arc::new(IndexerClient::new(&settings.indexer.base_url)?);
    let metadata = Arc::new(TokenMetadataService::new(chains.clone()));
    let poll_ttl = Duration::from_secs(settings.blockchain.poll_interval_seconds);

    let stable_assets = parse_addresses(&settings.protocol.stable_assets, "stable asset");
    let collateral_tokens =
        parse_addresses(&settings.protocol.collateral_tokens, "collateral token");

    let prices = Arc::new(PriceService::new(chains.clone(), stable_assets, poll_ttl));
    let pools = Arc::new(PoolSnapshotReader::new(chains.clone(), metadata.clone()));
    let aggregator = Arc::new(PositionAggregator::new(
        chains.clone(),
        pools.clone(),
        prices.clone(),
        metadata.clone(),
        collateral_tokens,
    ));
    let cache = Arc::new(SnapshotCache::new(poll_ttl));

    // Transaction orchestration is armed only when a signing key is
    // configured; the daemon itself never initiates actions, it exposes the
    // orchestrator to whatever front end embeds this engine.
    let _orchestrator = match std::env::var("LENDSCOPE_PRIVATE_KEY") {
        Ok(key) => {
            let signer: PrivateKeySigner = key.parse()?;
            let account = signer.address();
            let wallet = EthereumWallet::from(signer);
            let write_provider = ProviderBuilder::new()
                .with_recommended_fillers()
                .wallet(wallet)
                .on_http(settings.blockchain.ethereum_rpc_url.parse()?);
            let submitter = Arc::new(WalletSubmitter::new(write_provider));
            info!(
                %account,
                entrypoint = %settings.protocol.entrypoint_address,
                "transaction orchestration enabled"
            );
            Some(TransactionOrchestrator::new(submitter, cache.clone(), account))
        }
        Err(_) => {
            info!("no signing key configured, running read-only");
            None
        }
    };

    let monitoring = MonitoringService::new(
        settings.clone(),
        indexer.clone(),
        pools.clone(),
        aggregator.clone(),
        cache.clone(),
    );

    let monitoring_handle = tokio::spawn(async move {
        if let Err(e) = monitoring.start().await {
            error!(error = %e, "monitoring loop stopped");
        }
    });

    info!(
        indexer = %settings.indexer.base_url,
        poll_interval_seconds = settings.blockchain.poll_interval_seconds,
        "lendscope started"
    );

    tokio::select! {
        _ = monitoring_handle => {
            error!("monitoring loop exited unexpectedly");
        }
        _ = tokio::signal::ctrl_c() => {
            info!("received shutdown signal");
        }
    }

    info!("Shutting down lendscope");
    Ok(())
}

fn parse_addresses(raw: &[String], what: &str) -> Vec<alloy::primitives::Address> {
    raw.iter()
        .filter_map(|s| match ChainClient::validate_address(s) {
            Ok(address) => Some(address),
            Err(e) => {
                warn!(kind = what, value = %s, error = %e, "skipping invalid address");
                None
            }
        })
        .collect()
}
