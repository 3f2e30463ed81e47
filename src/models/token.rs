use alloy::primitives::{Address, U256};
use serde::{Deserialize, Serialize};

use crate::math;

/// On-chain token identity plus the metadata needed to interpret its raw
/// balances.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenInfo {
    pub address: Address,
    pub symbol: String,
    pub name: String,
    pub decimals: u8,
}

/// A raw integer magnitude paired with its decimal count. Raw values are
/// never interpreted without the decimal count; combining two amounts with
/// different counts requires an explicit rescale first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenAmount {
    pub raw: U256,
    pub decimals: u8,
}

impl TokenAmount {
    pub fn new(raw: U256, decimals: u8) -> Self {
        Self { raw, decimals }
    }

    pub fn zero(decimals: u8) -> Self {
        Self {
            raw: U256::ZERO,
            decimals,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.raw.is_zero()
    }

    pub fn display(&self) -> f64 {
        math::to_display(self.raw, self.decimals)
    }
}

/// An oracle-reported price with the feed's own decimal count. A raw value
/// of zero is the feed's "unavailable" sentinel, never a real quote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OraclePrice {
    pub raw: U256,
    pub decimals: u8,
}

impl OraclePrice {
    pub fn new(raw: U256, decimals: u8) -> Self {
        Self { raw, decimals }
    }

    /// A unit price, used as the fallback quote for whitelisted stable
    /// assets when the feed cannot be read.
    pub fn one(decimals: u8) -> Self {
        Self {
            raw: math::pow10(decimals),
            decimals,
        }
    }

    pub fn is_available(&self) -> bool {
        !self.raw.is_zero()
    }

    pub fn display(&self) -> f64 {
        math::to_display(self.raw, self.decimals)
    }
}
