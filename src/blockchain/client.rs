use alloy::{
    primitives::Address,
    providers::{Provider, ProviderBuilder, RootProvider},
    transports::http::{Client, Http},
};
use std::str::FromStr;

use crate::config::BlockchainSettings;

#[derive(Debug, thiserror::Error)]
pub enum ChainError {
    #[error("RPC connection failed: {0}")]
    RpcError(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Contract call failed: {0}")]
    ContractError(String),

    #[error("Unsupported chain ID: {0}")]
    UnsupportedChain(u64),
}

/// Read-side handle to one chain's JSON-RPC endpoint.
#[derive(Debug, Clone)]
pub struct ChainClient {
    provider: RootProvider<Http<Client>>,
    rpc_url: String,
    chain_id: u64,
}

impl ChainClient {
    pub fn new(chain_id: u64, rpc_url: &str) -> Result<Self, ChainError> {
        let url = rpc_url
            .parse()
            .map_err(|e| ChainError::RpcError(format!("Invalid RPC URL: {e}")))?;
        Ok(Self {
            provider: ProviderBuilder::new().on_http(url),
            rpc_url: rpc_url.to_string(),
            chain_id,
        })
    }

    /// Probe the endpoint by fetching the latest block number.
    pub async fn test_connection(&self) -> Result<(), ChainError> {
        match self.provider.get_block_number().await {
            Ok(block_number) => {
                tracing::info!(
                    chain_id = self.chain_id,
                    rpc_url = %self.rpc_url,
                    block_number,
                    "RPC connection established"
                );
                Ok(())
            }
            Err(e) => Err(ChainError::RpcError(format!(
                "Failed to connect to RPC: {e}"
            ))),
        }
    }

    pub fn validate_address(address: &str) -> Result<Address, ChainError> {
        Address::from_str(address)
            .map_err(|e| ChainError::InvalidAddress(format!("Invalid address format: {e}")))
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// The underlying provider, for contract instantiation.
    pub fn provider(&self) -> &RootProvider<Http<Client>> {
        &self.provider
    }
}

/// One client per supported chain, selected by chain id.
#[derive(Debug, Clone)]
pub struct ChainRegistry {
    ethereum: ChainClient,
    polygon: ChainClient,
    arbitrum: ChainClient,
}

impl ChainRegistry {
    pub fn new(settings: &BlockchainSettings) -> Result<Self, ChainError> {
        Ok(Self {
            ethereum: ChainClient::new(1, &settings.ethereum_rpc_url)?,
            polygon: ChainClient::new(137, &settings.polygon_rpc_url)?,
            arbitrum: ChainClient::new(42161, &settings.arbitrum_rpc_url)?,
        })
    }

    pub fn client_for(&self, chain_id: u64) -> Result<&ChainClient, ChainError> {
        match chain_id {
            1 => Ok(&self.ethereum),
            137 => Ok(&self.polygon),
            42161 => Ok(&self.arbitrum),
            _ => Err(ChainError::UnsupportedChain(chain_id)),
        }
    }

    pub async fn test_connections(&self) -> Result<(), ChainError> {
        self.ethereum.test_connection().await?;
        self.polygon.test_connection().await?;
        self.arbitrum.test_connection().await?;
        Ok(())
    }
}
