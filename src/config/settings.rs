use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub blockchain: BlockchainSettings,
    pub indexer: IndexerSettings,
    pub protocol: ProtocolSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockchainSettings {
    pub ethereum_rpc_url: String,
    pub polygon_rpc_url: String,
    pub arbitrum_rpc_url: String,
    /// Snapshot and balance refresh cadence while a view is mounted.
    pub poll_interval_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexerSettings {
    pub base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProtocolSettings {
    /// The lending action entrypoint contract.
    pub entrypoint_address: String,
    /// Every collateral token the protocol whitelists; position contracts
    /// may hold any of these after swaps.
    pub collateral_tokens: Vec<String>,
    /// Stable assets that fall back to a $1 quote when the price feed has
    /// no listing for them.
    pub stable_assets: Vec<String>,
    /// Account whose portfolio the daemon watches, if any.
    pub watch_address: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    pub level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            blockchain: BlockchainSettings::default(),
            indexer: IndexerSettings::default(),
            protocol: ProtocolSettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}

impl Default for BlockchainSettings {
    fn default() -> Self {
        BlockchainSettings {
            ethereum_rpc_url: "https://eth-mainnet.alchemyapi.io/v2/test".to_string(),
            polygon_rpc_url: "https://polygon-mainnet.alchemyapi.io/v2/test".to_string(),
            arbitrum_rpc_url: "https://arb-mainnet.alchemyapi.io/v2/test".to_string(),
            poll_interval_seconds: 5,
        }
    }
}

impl Default for IndexerSettings {
    fn default() -> Self {
        IndexerSettings {
            base_url: "http://localhost:8090".to_string(),
        }
    }
}

impl Default for ProtocolSettings {
    fn default() -> Self {
        ProtocolSettings {
            entrypoint_address: "0x0000000000000000000000000000000000000000".to_string(),
            collateral_tokens: Vec::new(),
            stable_assets: Vec::new(),
            watch_address: None,
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        LoggingSettings {
            level: "info".to_string(),
        }
    }
}

fn env_list(key: &str) -> Vec<String> {
    env::var(key)
        .map(|raw| {
            raw.split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

impl Settings {
    pub fn new() -> Result<Self, config::ConfigError> {
        let _settings = config::Config::builder()
            .add_source(config::Environment::default())
            .build()?;

        Ok(Settings {
            blockchain: BlockchainSettings {
                ethereum_rpc_url: env::var("ETHEREUM_RPC_URL")
                    .unwrap_or_else(|_| BlockchainSettings::default().ethereum_rpc_url),
                polygon_rpc_url: env::var("POLYGON_RPC_URL")
                    .unwrap_or_else(|_| BlockchainSettings::default().polygon_rpc_url),
                arbitrum_rpc_url: env::var("ARBITRUM_RPC_URL")
                    .unwrap_or_else(|_| BlockchainSettings::default().arbitrum_rpc_url),
                poll_interval_seconds: env::var("POLL_INTERVAL_SECONDS")
                    .unwrap_or_else(|_| "5".to_string())
                    .parse()
                    .unwrap_or(5),
            },
            indexer: IndexerSettings {
                base_url: env::var("INDEXER_BASE_URL")
                    .unwrap_or_else(|_| IndexerSettings::default().base_url),
            },
            protocol: ProtocolSettings {
                entrypoint_address: env::var("ENTRYPOINT_ADDRESS")
                    .unwrap_or_else(|_| ProtocolSettings::default().entrypoint_address),
                collateral_tokens: env_list("COLLATERAL_TOKENS"),
                stable_assets: env_list("STABLE_ASSETS"),
                watch_address: env::var("WATCH_ADDRESS").ok(),
            },
            logging: LoggingSettings {
                level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            },
        })
    }
}
