use alloy::primitives::{Address, U256};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::pool::PoolRef;

/// A non-zero collateral balance held by an account's position contract.
/// Positions can hold swapped collateral in any whitelisted token, not just
/// the pool's configured one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollateralLine {
    pub token: Address,
    pub symbol: String,
    pub decimals: u8,
    pub amount: U256,
    /// `None` when the token has no usable price feed; excluded from USD
    /// totals rather than counted as zero value.
    pub value_usd: Option<f64>,
}

/// One account's stake in one pool. Asset amounts are always derived from
/// shares against the pool totals at read time, never stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountPosition {
    pub pool: PoolRef,
    pub deposit_shares: U256,
    pub deposit_assets: U256,
    pub deposit_value_usd: Option<f64>,
    pub borrow_shares: U256,
    pub borrow_assets: U256,
    pub borrow_value_usd: Option<f64>,
    /// The on-chain sub-account holding this pool's collateral; `None`
    /// while the account has never opened a position here.
    pub position_contract: Option<Address>,
    pub collateral: Vec<CollateralLine>,
    /// Pool rates at read time, used for USD-weighted portfolio averages.
    pub supply_apy: f64,
    pub borrow_apy: f64,
}

impl AccountPosition {
    pub fn collateral_value_usd(&self) -> f64 {
        self.collateral
            .iter()
            .filter_map(|line| line.value_usd)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.deposit_shares.is_zero()
            && self.borrow_shares.is_zero()
            && self.collateral.is_empty()
    }
}

/// Cross-pool aggregate for one account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioSummary {
    pub account: Address,
    pub positions: Vec<AccountPosition>,
    pub total_deposit_usd: f64,
    pub total_borrow_usd: f64,
    pub total_collateral_usd: f64,
    /// USD-weighted average supply APY over deposit value; 0 with no
    /// priced deposits.
    pub net_supply_apy: f64,
    /// USD-weighted average borrow APY over borrow value; 0 with no priced
    /// borrows.
    pub net_borrow_apy: f64,
    /// Set when any pool read failed or any token had no usable price, so
    /// the totals under-count.
    pub partial_data: bool,
    pub fetched_at: DateTime<Utc>,
}
