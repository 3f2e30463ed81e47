use alloy::primitives::{Address, B256, U256};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::PoolRef;

#[derive(Debug, thiserror::Error)]
pub enum IndexerError {
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Indexer returned status: {0}")]
    Status(u16),

    #[error("Invalid base URL: {0}")]
    InvalidUrl(String),
}

/// What a user did to a pool, as recorded by the indexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Deposit,
    Withdraw,
    Borrow,
    Repay,
    Collateral,
}

/// One historical protocol transaction, time-ordered newest first in all
/// listings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub action: ActionKind,
    pub pool: Address,
    pub actor: Address,
    pub amount: U256,
    pub tx_hash: B256,
    pub timestamp: DateTime<Utc>,
}

/// HTTP client for the transaction/event indexer, the service that
/// enumerates pool addresses and serves transfer history. Chain state never
/// comes from here, only discovery and history.
pub struct IndexerClient {
    http: reqwest::Client,
    base_url: String,
}

impl IndexerClient {
    pub fn new(base_url: &str) -> Result<Self, IndexerError> {
        url::Url::parse(base_url).map_err(|e| IndexerError::InvalidUrl(e.to_string()))?;
        Ok(Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// All pools known to the indexer, across every supported chain.
    pub async fn list_pools(&self) -> Result<Vec<PoolRef>, IndexerError> {
        let url = format!("{}/pools", self.base_url);
        let response = self.http.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(IndexerError::Status(response.status().as_u16()));
        }
        let pools = response.json::<Vec<PoolRef>>().await?;
        tracing::debug!(pool_count = pools.len(), "fetched pool listing");
        Ok(pools)
    }

    /// Transaction log for one pool, newest first.
    pub async fn pool_history(
        &self,
        pool: &PoolRef,
        limit: usize,
    ) -> Result<Vec<TransactionRecord>, IndexerError> {
        let url = format!(
            "{}/pools/{}/{}/transactions?limit={}",
            self.base_url, pool.chain_id, pool.address, limit
        );
        self.fetch_records(&url).await
    }

    /// Transaction log for one account across all pools, newest first.
    pub async fn account_history(
        &self,
        account: Address,
        limit: usize,
    ) -> Result<Vec<TransactionRecord>, IndexerError> {
        let url = format!(
            "{}/accounts/{}/transactions?limit={}",
            self.base_url, account, limit
        );
        self.fetch_records(&url).await
    }

    async fn fetch_records(&self, url: &str) -> Result<Vec<TransactionRecord>, IndexerError> {
        let response = self.http.get(url).send().await?;
        if !response.status().is_success() {
            return Err(IndexerError::Status(response.status().as_u16()));
        }
        Ok(response.json::<Vec<TransactionRecord>>().await?)
    }
}
