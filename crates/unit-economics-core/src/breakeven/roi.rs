use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::types::{mul_checked, require_non_negative, Money};
use crate::UnitEconomicsResult;

/// Months of value captured by `RoiContext::six_month_ltv`.
pub const LTV_MONTHS: Decimal = dec!(6);

/// Externally observed return-on-investment figures. Supplied fresh on every
/// call; the engine never caches them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoiContext {
    pub current_paid_users: u64,
    pub monthly_revenue_per_user: Money,
    /// Revenue from one subscriber over a six-month billing period
    pub six_month_ltv: Money,
    /// Total revenue currently collected per month
    pub current_monthly_revenue: Money,
}

/// Raw usage figures from which an `RoiContext` can be derived.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservedMetrics {
    pub current_paid_users: u64,
    pub current_monthly_revenue: Money,
}

impl RoiContext {
    /// Derive per-user revenue and lifetime value from observed totals.
    /// Per-user figures divide by at least one user.
    pub fn from_observed(
        current_paid_users: u64,
        current_monthly_revenue: Money,
    ) -> UnitEconomicsResult<Self> {
        require_non_negative("current_monthly_revenue", current_monthly_revenue)?;

        let users = Decimal::from(current_paid_users.max(1));
        let monthly_revenue_per_user = current_monthly_revenue / users;
        let six_month_ltv =
            mul_checked("current_monthly_revenue", monthly_revenue_per_user, LTV_MONTHS)?;
        Ok(Self {
            current_paid_users,
            monthly_revenue_per_user,
            six_month_ltv,
            current_monthly_revenue,
        })
    }

    pub fn validate(&self) -> UnitEconomicsResult<()> {
        require_non_negative("roi.monthly_revenue_per_user", self.monthly_revenue_per_user)?;
        require_non_negative("roi.six_month_ltv", self.six_month_ltv)?;
        require_non_negative("roi.current_monthly_revenue", self.current_monthly_revenue)?;
        Ok(())
    }
}

impl ObservedMetrics {
    pub fn to_roi_context(&self) -> UnitEconomicsResult<RoiContext> {
        RoiContext::from_observed(self.current_paid_users, self.current_monthly_revenue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_observed() {
        let roi = RoiContext::from_observed(150, dec!(1975)).unwrap();
        assert_eq!(roi.monthly_revenue_per_user.round_dp(4), dec!(13.1667));
        assert_eq!(roi.six_month_ltv.round_dp(10), dec!(79));
    }

    #[test]
    fn test_from_observed_without_users() {
        let roi = RoiContext::from_observed(0, dec!(0)).unwrap();
        assert_eq!(roi.monthly_revenue_per_user, dec!(0));
        assert_eq!(roi.six_month_ltv, dec!(0));
        assert_eq!(roi.current_paid_users, 0);
    }

    #[test]
    fn test_ltv_spans_six_months() {
        let roi = ObservedMetrics {
            current_paid_users: 4,
            current_monthly_revenue: dec!(40),
        }
        .to_roi_context()
        .unwrap();
        assert_eq!(roi.six_month_ltv, roi.monthly_revenue_per_user * LTV_MONTHS);
        assert_eq!(roi.six_month_ltv, dec!(60));
    }

    #[test]
    fn test_huge_revenue_overflow_is_an_error() {
        assert!(RoiContext::from_observed(1, Decimal::MAX).is_err());
    }

    #[test]
    fn test_negative_revenue_rejected() {
        assert!(RoiContext::from_observed(10, dec!(-5)).is_err());
    }
}
