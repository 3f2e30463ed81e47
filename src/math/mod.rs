use alloy::primitives::{U256, U512};
use bigdecimal::BigDecimal;
use num_traits::{ToPrimitive, Zero};
use std::str::FromStr;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum MathError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Amount overflow: {0}")]
    Overflow(String),
}

/// Convert a raw token magnitude into a display value by dividing out its
/// decimal scale. Goes through `BigDecimal` so magnitudes far beyond the
/// 53-bit float mantissa keep their leading digits; relative error stays
/// below 1e-6.
pub fn to_display(raw: U256, decimals: u8) -> f64 {
    let digits =
        BigDecimal::from_str(&raw.to_string()).unwrap_or_else(|_| BigDecimal::zero());
    let scale =
        BigDecimal::from_str(&format!("1e{}", decimals)).unwrap_or_else(|_| BigDecimal::from(1));
    (digits / scale).to_f64().unwrap_or(0.0)
}

/// Parse a user-entered decimal numeral into a raw magnitude at the given
/// decimal count. Rejects signs, exponents, and anything that is not a plain
/// non-negative decimal numeral; fractional digits past `decimals` are
/// truncated, matching the protocol's conservative rounding.
pub fn to_raw(display: &str, decimals: u8) -> Result<U256, MathError> {
    let trimmed = display.trim();
    if trimmed.is_empty() {
        return Err(MathError::InvalidAmount("empty amount".to_string()));
    }
    if !trimmed.chars().all(|c| c.is_ascii_digit() || c == '.') {
        return Err(MathError::InvalidAmount(format!(
            "not a non-negative decimal numeral: {trimmed}"
        )));
    }

    let mut parts = trimmed.splitn(2, '.');
    let int_part = parts.next().unwrap_or("");
    let frac_part = parts.next().unwrap_or("");
    if frac_part.contains('.') {
        return Err(MathError::InvalidAmount(format!(
            "multiple decimal points: {trimmed}"
        )));
    }
    if int_part.is_empty() && frac_part.is_empty() {
        return Err(MathError::InvalidAmount("bare decimal point".to_string()));
    }

    let scale = pow10(decimals);
    let int_value = if int_part.is_empty() {
        U256::ZERO
    } else {
        U256::from_str_radix(int_part, 10)
            .map_err(|e| MathError::InvalidAmount(format!("{trimmed}: {e}")))?
    };

    // Fractional digits, truncated (never rounded) at the token's precision.
    let mut frac_digits: String = frac_part.chars().take(decimals as usize).collect();
    while frac_digits.len() < decimals as usize {
        frac_digits.push('0');
    }
    let frac_value = if frac_digits.is_empty() {
        U256::ZERO
    } else {
        U256::from_str_radix(&frac_digits, 10)
            .map_err(|e| MathError::InvalidAmount(format!("{trimmed}: {e}")))?
    };

    int_value
        .checked_mul(scale)
        .and_then(|scaled| scaled.checked_add(frac_value))
        .ok_or_else(|| MathError::Overflow(trimmed.to_string()))
}

/// Proportional claim of `shares` on `total_assets`. Zero `total_shares`
/// means an empty pool with no claim, not an error. The multiplication runs
/// in 512-bit space and the division truncates, so the result agrees
/// bit-for-bit with the protocol's own share accounting.
pub fn shares_to_assets(shares: U256, total_shares: U256, total_assets: U256) -> U256 {
    if total_shares.is_zero() {
        return U256::ZERO;
    }
    let numerator = U512::from(shares) * U512::from(total_assets);
    let quotient = numerator / U512::from(total_shares);
    quotient.saturating_to::<U256>()
}

/// `a * b / denominator` with the multiplication widened to 512 bits so no
/// precision is lost before the division. `None` on a zero denominator or a
/// quotient that does not fit 256 bits.
pub fn mul_div(a: U256, b: U256, denominator: U256) -> Option<U256> {
    if denominator.is_zero() {
        return None;
    }
    let quotient = (U512::from(a) * U512::from(b)) / U512::from(denominator);
    if quotient > U512::from(U256::MAX) {
        None
    } else {
        Some(quotient.saturating_to::<U256>())
    }
}

/// Ratio of two raw magnitudes as a display fraction; 0 when the
/// denominator is zero.
pub fn ratio(numerator: U256, denominator: U256) -> f64 {
    if denominator.is_zero() {
        return 0.0;
    }
    match mul_div(numerator, pow10(18), denominator) {
        Some(scaled) => to_display(scaled, 18),
        None => 0.0,
    }
}

pub fn pow10(decimals: u8) -> U256 {
    U256::from(10u64).pow(U256::from(decimals))
}

/// Compact display formatting: K/M suffixes from 1e3/1e6 upward, two
/// decimals at or above 1, up to six decimals below 1, `"0.00"` at zero.
pub fn format_abbreviated(value: f64) -> String {
    if value == 0.0 {
        return "0.00".to_string();
    }
    if value < 0.0 {
        return format!("-{}", format_abbreviated(-value));
    }
    if value >= 1_000_000.0 {
        format!("{:.2}M", value / 1_000_000.0)
    } else if value >= 1_000.0 {
        format!("{:.2}K", value / 1_000.0)
    } else if value >= 1.0 {
        format!("{:.2}", value)
    } else {
        let mut s = format!("{:.6}", value);
        while s.ends_with('0') {
            s.pop();
        }
        if s.ends_with('.') {
            s.push_str("00");
        }
        s
    }
}
