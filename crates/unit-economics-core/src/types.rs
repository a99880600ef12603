use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::UnitEconomicsError;
use crate::UnitEconomicsResult;

/// All monetary values. Wraps Decimal to prevent accidental f64 usage.
pub type Money = Decimal;

/// Fractions expressed as decimals (0.15 = 15%). Fee rates and retention
/// multipliers use this.
pub type Rate = Decimal;

/// Percentages expressed on a 0-100 scale (5 = 5%). Churn, margin percent
/// and retention improvement use this.
pub type Percent = Decimal;

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}

/// Reject negative monetary amounts at the call boundary.
pub(crate) fn require_non_negative(field: &str, value: Money) -> UnitEconomicsResult<()> {
    if value < Decimal::ZERO {
        return Err(UnitEconomicsError::InvalidInput {
            field: field.into(),
            reason: format!("must not be negative, got {value}"),
        });
    }
    Ok(())
}

/// Churn must lie in [0, 100). At 100% or above the cohort never retains anyone.
pub(crate) fn require_churn_pct(field: &str, churn_rate_pct: Percent) -> UnitEconomicsResult<()> {
    if churn_rate_pct < Decimal::ZERO || churn_rate_pct >= Decimal::ONE_HUNDRED {
        return Err(UnitEconomicsError::InvalidInput {
            field: field.into(),
            reason: format!("churn rate must be in [0, 100), got {churn_rate_pct}"),
        });
    }
    Ok(())
}

fn overflow(field: &str, op: &str) -> UnitEconomicsError {
    UnitEconomicsError::InvalidInput {
        field: field.into(),
        reason: format!("{op} exceeds the decimal range"),
    }
}

/// `a * b`, reporting overflow against `field` instead of panicking.
pub(crate) fn mul_checked(field: &str, a: Decimal, b: Decimal) -> UnitEconomicsResult<Decimal> {
    a.checked_mul(b).ok_or_else(|| overflow(field, "multiplication"))
}

/// `a / b`, reporting overflow or a zero divisor against `field`.
pub(crate) fn div_checked(field: &str, a: Decimal, b: Decimal) -> UnitEconomicsResult<Decimal> {
    a.checked_div(b).ok_or_else(|| overflow(field, "division"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_checked_arithmetic_reports_overflow() {
        assert_eq!(mul_checked("x", dec!(2), dec!(3)).unwrap(), dec!(6));
        assert_eq!(div_checked("x", dec!(6), dec!(3)).unwrap(), dec!(2));
        assert!(matches!(
            mul_checked("x", Decimal::MAX, dec!(2)),
            Err(UnitEconomicsError::InvalidInput { .. })
        ));
        assert!(div_checked("x", Decimal::MAX, dec!(0.5)).is_err());
        assert!(div_checked("x", dec!(1), Decimal::ZERO).is_err());
    }
}
