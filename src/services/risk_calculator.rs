use alloy::primitives::{U256, U512};
use serde::{Deserialize, Serialize};

use crate::math;
use crate::models::{OraclePrice, TokenAmount};

/// Liquidation-risk bands over the health factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskTier {
    /// No liability at all.
    Safe,
    Healthy,
    AtRisk,
    Danger,
}

/// Inputs for the borrow-capacity calculation. Both token amounts are raw
/// magnitudes; the prices carry their own feed decimals.
#[derive(Debug, Clone)]
pub struct MaxBorrowParams {
    pub collateral_amount: U256,
    pub collateral_decimals: u8,
    pub collateral_price: OraclePrice,
    /// 1e18-scaled fraction.
    pub ltv: U256,
    pub borrow_price: OraclePrice,
    pub borrow_decimals: u8,
    /// Already-borrowed amount in borrow-token units.
    pub existing_borrow: U256,
}

pub struct RiskCalculator;

impl RiskCalculator {
    pub fn new() -> Self {
        Self
    }

    /// Collateral value over borrow value. No liability is unconditionally
    /// safe (+inf); liability with no backing is maximally unsafe (0).
    pub fn health_factor(&self, collateral_usd: f64, borrow_usd: f64) -> f64 {
        if borrow_usd == 0.0 {
            return f64::INFINITY;
        }
        if collateral_usd == 0.0 {
            return 0.0;
        }
        collateral_usd / borrow_usd
    }

    pub fn classify(&self, health_factor: f64) -> RiskTier {
        if health_factor.is_infinite() {
            RiskTier::Safe
        } else if health_factor < 1.1 {
            RiskTier::Danger
        } else if health_factor < 1.5 {
            RiskTier::AtRisk
        } else {
            RiskTier::Healthy
        }
    }

    /// Borrow capacity in borrow-token units: collateral value, reduced by
    /// the LTV ceiling, converted into borrow units, minus the existing
    /// borrow. Every multiplication happens before any division, in 512-bit
    /// space, so the result agrees with the protocol's own integer math.
    /// Clamps to zero rather than going negative; an unavailable borrow
    /// price yields zero capacity.
    pub fn max_borrowable(&self, params: &MaxBorrowParams) -> U256 {
        if !params.borrow_price.is_available() {
            return U256::ZERO;
        }

        let numerator = U512::from(params.collateral_amount)
            .checked_mul(U512::from(params.collateral_price.raw))
            .and_then(|n| n.checked_mul(U512::from(params.ltv)))
            .and_then(|n| n.checked_mul(U512::from(math::pow10(params.borrow_decimals))))
            .and_then(|n| n.checked_mul(U512::from(math::pow10(params.borrow_price.decimals))));
        let denominator = U512::from(math::pow10(18))
            .checked_mul(U512::from(math::pow10(params.collateral_decimals)))
            .and_then(|d| d.checked_mul(U512::from(math::pow10(params.collateral_price.decimals))))
            .and_then(|d| d.checked_mul(U512::from(params.borrow_price.raw)));

        let gross = match (numerator, denominator) {
            (Some(n), Some(d)) if !d.is_zero() => (n / d).saturating_to::<U256>(),
            _ => U256::ZERO,
        };
        gross.saturating_sub(params.existing_borrow)
    }

    /// Health factor as it would read after an additional borrow, for
    /// previewing a pending action before submission.
    pub fn projected_health_factor(
        &self,
        current_borrow_usd: f64,
        additional_borrow: &TokenAmount,
        borrow_price: &OraclePrice,
        collateral_usd: f64,
    ) -> f64 {
        let additional_usd = additional_borrow.display() * borrow_price.display();
        self.health_factor(collateral_usd, current_borrow_usd + additional_usd)
    }
}

impl Default for RiskCalculator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::pow10;

    #[test]
    fn no_liability_is_infinitely_safe() {
        let calc = RiskCalculator::new();
        assert_eq!(calc.health_factor(0.0, 0.0), f64::INFINITY);
        assert_eq!(calc.health_factor(1_000_000.0, 0.0), f64::INFINITY);
    }

    #[test]
    fn unbacked_liability_is_maximally_unsafe() {
        let calc = RiskCalculator::new();
        assert_eq!(calc.health_factor(0.0, 500.0), 0.0);
    }

    #[test]
    fn classification_tiers() {
        let calc = RiskCalculator::new();
        assert_eq!(calc.classify(f64::INFINITY), RiskTier::Safe);
        assert_eq!(calc.classify(2.0), RiskTier::Healthy);
        assert_eq!(calc.classify(1.5), RiskTier::Healthy);
        assert_eq!(calc.classify(1.49), RiskTier::AtRisk);
        assert_eq!(calc.classify(1.1), RiskTier::AtRisk);
        assert_eq!(calc.classify(1.09), RiskTier::Danger);
        assert_eq!(calc.classify(0.0), RiskTier::Danger);
    }

    #[test]
    fn max_borrowable_reference_scenario() {
        // 10 WETH at $3000 (8-decimal feed), LTV 75%, borrowing USDC at $1
        // with 6 decimals and no existing borrow: 22,500 USDC.
        let calc = RiskCalculator::new();
        let params = MaxBorrowParams {
            collateral_amount: U256::from(10u64) * pow10(18),
            collateral_decimals: 18,
            collateral_price: OraclePrice::new(U256::from(3000u64) * pow10(8), 8),
            ltv: U256::from(75u64) * pow10(16),
            borrow_price: OraclePrice::new(pow10(8), 8),
            borrow_decimals: 6,
            existing_borrow: U256::ZERO,
        };
        assert_eq!(
            calc.max_borrowable(&params),
            U256::from(22_500u64) * pow10(6)
        );
    }

    #[test]
    fn max_borrowable_subtracts_existing_and_clamps() {
        let calc = RiskCalculator::new();
        let mut params = MaxBorrowParams {
            collateral_amount: U256::from(10u64) * pow10(18),
            collateral_decimals: 18,
            collateral_price: OraclePrice::new(U256::from(3000u64) * pow10(8), 8),
            ltv: U256::from(75u64) * pow10(16),
            borrow_price: OraclePrice::new(pow10(8), 8),
            borrow_decimals: 6,
            existing_borrow: U256::from(2_500u64) * pow10(6),
        };
        assert_eq!(
            calc.max_borrowable(&params),
            U256::from(20_000u64) * pow10(6)
        );

        // Over-borrowed relative to the ceiling clamps at zero.
        params.existing_borrow = U256::from(30_000u64) * pow10(6);
        assert_eq!(calc.max_borrowable(&params), U256::ZERO);
    }

    #[test]
    fn max_borrowable_with_unavailable_price_is_zero() {
        let calc = RiskCalculator::new();
        let params = MaxBorrowParams {
            collateral_amount: pow10(18),
            collateral_decimals: 18,
            collateral_price: OraclePrice::new(U256::from(3000u64) * pow10(8), 8),
            ltv: U256::from(75u64) * pow10(16),
            borrow_price: OraclePrice::new(U256::ZERO, 8),
            borrow_decimals: 6,
            existing_borrow: U256::ZERO,
        };
        assert_eq!(calc.max_borrowable(&params), U256::ZERO);
    }

    #[test]
    fn projected_health_factor_previews_new_borrow() {
        let calc = RiskCalculator::new();
        // $30,000 collateral, $10,000 borrowed, borrowing $5,000 more.
        let additional = TokenAmount::new(U256::from(5_000u64) * pow10(6), 6);
        let price = OraclePrice::one(8);
        let projected = calc.projected_health_factor(10_000.0, &additional, &price, 30_000.0);
        assert!((projected - 2.0).abs() < 1e-9);
    }
}
