use alloy::primitives::{Address, U256};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::token::TokenInfo;

/// Identity of one isolated pool: the chain it lives on plus its address.
/// Cache keys and indexer listings are keyed by this pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PoolRef {
    pub chain_id: u64,
    pub address: Address,
}

/// Derived yield figures for one pool at one read.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RateBreakdown {
    /// Annual borrow rate, percent.
    pub borrow_apy: f64,
    /// Annual supply rate, percent, net of the reserve factor.
    pub supply_apy: f64,
    /// Fraction of supplied assets currently borrowed, 0..=1.
    pub utilization: f64,
}

/// One pool's full economic state, read in a single pass and never
/// persisted. A snapshot either exists completely or not at all; there is
/// no partially-populated form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolSnapshot {
    pub pool: PoolRef,
    pub router: Address,
    pub factory: Address,
    pub interest_rate_model: Address,
    /// The factory's token data stream (price oracle).
    pub price_feed: Address,
    pub borrow_token: TokenInfo,
    pub collateral_token: TokenInfo,
    pub shares_token: Address,
    pub total_supply_assets: U256,
    pub total_borrow_assets: U256,
    pub total_supply_shares: U256,
    pub total_borrow_shares: U256,
    /// Loan-to-value ceiling as a 1e18-scaled fraction.
    pub ltv: U256,
    pub rates: RateBreakdown,
    /// Assets immediately available to borrow or withdraw.
    pub liquidity: U256,
    pub fetched_at: DateTime<Utc>,
}

impl PoolSnapshot {
    pub fn ltv_fraction(&self) -> f64 {
        crate::math::to_display(self.ltv, 18)
    }
}
