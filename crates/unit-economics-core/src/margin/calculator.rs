use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::catalog::Catalog;
use crate::margin::fees::{FeeToggle, FeeToggles};
use crate::types::{
    div_checked, mul_checked, require_non_negative, with_metadata, ComputationOutput, Money,
    Percent, Rate,
};
use crate::UnitEconomicsResult;

// ---------------------------------------------------------------------------
// Types: Margin breakdown
// ---------------------------------------------------------------------------

/// Input for a single fee-adjusted margin calculation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarginInput {
    /// Gross sale revenue before any fee
    pub gross_revenue: Money,
    /// AI compute cost attributable to that revenue
    pub ai_cost: Money,
    #[serde(default)]
    pub fee_toggles: FeeToggles,
}

/// One fee line in a margin breakdown.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeeDeduction {
    pub fee: FeeToggle,
    pub rate: Rate,
    /// gross_revenue * rate
    pub amount: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarginOutput {
    pub gross_revenue: Money,
    pub deductions: Vec<FeeDeduction>,
    pub total_fees: Money,
    /// gross_revenue - total_fees
    pub net_revenue: Money,
    pub ai_cost: Money,
    /// net_revenue - ai_cost (may be negative)
    pub net_margin: Money,
    /// net_margin / gross_revenue * 100, or 0 without revenue
    pub margin_pct: Percent,
}

// ---------------------------------------------------------------------------
// Types: Current-tier calculator
// ---------------------------------------------------------------------------

/// Input for per-tier margins at the current AI cost per user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TierMarginInput {
    /// Restrict to one tier id; all tiers when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tier: Option<String>,
    /// Observed average AI cost per paid user per month
    pub ai_cost_per_user_per_month: Money,
    #[serde(default)]
    pub fee_toggles: FeeToggles,
    /// Override catalog; built-in tables when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog: Option<Catalog>,
}

/// Margin on one seat over one billing period.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TierMargin {
    pub tier: String,
    pub seat_range: String,
    /// Gross revenue: list price per seat per billing period
    pub list_price: Money,
    pub monthly_equivalent: Money,
    /// ai_cost_per_user_per_month * billing_period_months
    pub ai_cost: Money,
    pub total_fees: Money,
    pub net_margin: Money,
    pub margin_pct: Percent,
    /// net_margin / billing_period_months
    pub monthly_net_margin: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TierMarginOutput {
    pub billing_period_months: u32,
    pub tiers: Vec<TierMargin>,
}

// ---------------------------------------------------------------------------
// Core contracts
// ---------------------------------------------------------------------------

/// Net margin after the active fee deductions and AI cost.
///
/// Every fee is charged against the original gross, never against the
/// running net, so the result does not depend on toggle order.
pub fn true_margin(
    gross_revenue: Money,
    ai_cost: Money,
    fee_toggles: &FeeToggles,
) -> UnitEconomicsResult<Money> {
    require_non_negative("gross_revenue", gross_revenue)?;
    require_non_negative("ai_cost", ai_cost)?;

    let mut net_revenue = gross_revenue;
    for fee in fee_toggles.active() {
        net_revenue -= gross_revenue * fee.rate();
    }
    Ok(net_revenue - ai_cost)
}

/// Margin as a percentage of gross revenue. Zero when there is no revenue.
pub fn margin_percent(margin: Money, gross_revenue: Money) -> UnitEconomicsResult<Percent> {
    if gross_revenue > Decimal::ZERO {
        let share = div_checked("margin_pct", margin, gross_revenue)?;
        mul_checked("margin_pct", share, Decimal::ONE_HUNDRED)
    } else {
        Ok(Decimal::ZERO)
    }
}

// ---------------------------------------------------------------------------
// Public API: Margin breakdown
// ---------------------------------------------------------------------------

/// Fee-by-fee margin breakdown for a gross revenue figure.
pub fn calculate_margin(input: &MarginInput) -> UnitEconomicsResult<ComputationOutput<MarginOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let net_margin = true_margin(input.gross_revenue, input.ai_cost, &input.fee_toggles)?;

    let deductions: Vec<FeeDeduction> = input
        .fee_toggles
        .active()
        .map(|fee| FeeDeduction {
            fee,
            rate: fee.rate(),
            amount: input.gross_revenue * fee.rate(),
        })
        .collect();
    let total_fees: Money = deductions.iter().map(|d| d.amount).sum();
    let net_revenue = input.gross_revenue - total_fees;
    let margin_pct = margin_percent(net_margin, input.gross_revenue)?;

    if input.gross_revenue.is_zero() {
        warnings.push("Gross revenue is zero; margin percent reported as 0".to_string());
    }
    if net_margin < Decimal::ZERO {
        warnings.push(format!(
            "Negative margin: fees and AI cost exceed gross revenue by {}",
            -net_margin
        ));
    }

    let output = MarginOutput {
        gross_revenue: input.gross_revenue,
        deductions,
        total_fees,
        net_revenue,
        ai_cost: input.ai_cost,
        net_margin,
        margin_pct,
    };

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Fee-adjusted margin (additive fee shares of gross, less AI cost)",
        input,
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Public API: Current-tier calculator
// ---------------------------------------------------------------------------

/// Per-seat margin for each pricing tier (or one selected tier) over a full
/// billing period at the observed AI cost per user.
pub fn calculate_tier_margins(
    input: &TierMarginInput,
) -> UnitEconomicsResult<ComputationOutput<TierMarginOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    require_non_negative("ai_cost_per_user_per_month", input.ai_cost_per_user_per_month)?;

    let builtin;
    let catalog = match &input.catalog {
        Some(c) => {
            c.validate()?;
            c
        }
        None => {
            builtin = Catalog::builtin();
            &builtin
        }
    };
    let pricing = &catalog.pricing;

    let selected = match &input.tier {
        Some(id) => vec![pricing.tier(id)?],
        None => pricing.tiers().iter().collect(),
    };

    let months = Decimal::from(pricing.billing_period_months());
    let ai_cost = mul_checked(
        "ai_cost_per_user_per_month",
        input.ai_cost_per_user_per_month,
        months,
    )?;

    let mut tiers = Vec::with_capacity(selected.len());
    for tier in selected {
        let net_margin = true_margin(tier.list_price, ai_cost, &input.fee_toggles)?;
        let total_fees = tier.list_price * input.fee_toggles.combined_rate();
        if net_margin < Decimal::ZERO {
            warnings.push(format!(
                "Tier '{}' is loss-making at the current AI cost per user",
                tier.id
            ));
        }
        tiers.push(TierMargin {
            tier: tier.id.clone(),
            seat_range: tier.seat_range.clone(),
            list_price: tier.list_price,
            monthly_equivalent: pricing.monthly_equivalent(tier),
            ai_cost,
            total_fees,
            net_margin,
            margin_pct: margin_percent(net_margin, tier.list_price)?,
            monthly_net_margin: net_margin / months,
        });
    }

    let output = TierMarginOutput {
        billing_period_months: pricing.billing_period_months(),
        tiers,
    };

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Per-seat margin by pricing tier over one billing period",
        &serde_json::json!({
            "tier": input.tier,
            "ai_cost_per_user_per_month": input.ai_cost_per_user_per_month.to_string(),
            "fee_toggles": input.fee_toggles,
            "custom_catalog": input.catalog.is_some(),
        }),
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::UnitEconomicsError;
    use rust_decimal_macros::dec;

    fn iap_only() -> FeeToggles {
        FeeToggles::none().set(FeeToggle::Iap, true)
    }

    #[test]
    fn test_true_margin_iap_only() {
        // 79 * 0.85 - 1.70 = 65.45
        let m = true_margin(dec!(79.00), dec!(1.70), &iap_only()).unwrap();
        assert_eq!(m, dec!(65.45));
    }

    #[test]
    fn test_true_margin_no_fees() {
        let m = true_margin(dec!(79.00), dec!(1.70), &FeeToggles::none()).unwrap();
        assert_eq!(m, dec!(77.30));
    }

    #[test]
    fn test_true_margin_iap_and_partner() {
        let toggles: FeeToggles = [FeeToggle::Partner, FeeToggle::Iap].into_iter().collect();
        let m = true_margin(dec!(100), dec!(5), &toggles).unwrap();
        // 100 * (1 - 0.15 - 0.10) - 5
        assert_eq!(m, dec!(70));
    }

    #[test]
    fn test_true_margin_all_fees_not_compounded() {
        // Compounding would give 100 * 0.85 * 0.9 * 0.9 = 68.85
        let m = true_margin(dec!(100), dec!(0), &FeeToggles::all()).unwrap();
        assert_eq!(m, dec!(65));
    }

    #[test]
    fn test_true_margin_can_go_negative() {
        let m = true_margin(dec!(10), dec!(20), &FeeToggles::all()).unwrap();
        assert_eq!(m, dec!(-13.5));
    }

    #[test]
    fn test_true_margin_rejects_negative_inputs() {
        assert!(true_margin(dec!(-1), dec!(0), &FeeToggles::none()).is_err());
        assert!(true_margin(dec!(1), dec!(-0.01), &FeeToggles::none()).is_err());
    }

    #[test]
    fn test_margin_percent_zero_revenue() {
        assert_eq!(margin_percent(dec!(-12), dec!(0)).unwrap(), dec!(0));
        assert_eq!(margin_percent(dec!(0), dec!(0)).unwrap(), dec!(0));
    }

    #[test]
    fn test_margin_percent() {
        assert_eq!(margin_percent(dec!(65.45), dec!(79)).unwrap().round_dp(2), dec!(82.85));
    }

    #[test]
    fn test_margin_percent_overflow_is_an_error() {
        let huge_cost = Decimal::from_i128_with_scale(10_i128.pow(27), 0);
        assert!(margin_percent(-huge_cost, dec!(0.0001)).is_err());

        let input = MarginInput {
            gross_revenue: dec!(0.0001),
            ai_cost: huge_cost,
            fee_toggles: FeeToggles::none(),
        };
        assert!(matches!(
            calculate_margin(&input),
            Err(UnitEconomicsError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_calculate_margin_breakdown() {
        let input = MarginInput {
            gross_revenue: dec!(200),
            ai_cost: dec!(10),
            fee_toggles: FeeToggles::all(),
        };
        let out = calculate_margin(&input).unwrap();
        let r = &out.result;
        assert_eq!(r.deductions.len(), 3);
        assert_eq!(r.deductions[0].fee, FeeToggle::Iap);
        assert_eq!(r.deductions[0].amount, dec!(30));
        assert_eq!(r.deductions[2].fee, FeeToggle::FinderFee);
        assert_eq!(r.total_fees, dec!(70));
        assert_eq!(r.net_revenue, dec!(130));
        assert_eq!(r.net_margin, dec!(120));
        assert_eq!(r.margin_pct, dec!(60));
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn test_calculate_margin_warns_on_zero_revenue() {
        let input = MarginInput {
            gross_revenue: dec!(0),
            ai_cost: dec!(3),
            fee_toggles: FeeToggles::none(),
        };
        let out = calculate_margin(&input).unwrap();
        assert_eq!(out.result.margin_pct, dec!(0));
        assert_eq!(out.result.net_margin, dec!(-3));
        assert_eq!(out.warnings.len(), 2);
    }

    #[test]
    fn test_tier_margins_all_tiers() {
        let input = TierMarginInput {
            tier: None,
            ai_cost_per_user_per_month: dec!(0.05),
            fee_toggles: iap_only(),
            catalog: None,
        };
        let out = calculate_tier_margins(&input).unwrap();
        assert_eq!(out.result.billing_period_months, 6);
        assert_eq!(out.result.tiers.len(), 4);

        let solo = &out.result.tiers[0];
        assert_eq!(solo.tier, "solo");
        // 0.05 * 6 = 0.30 AI cost; 79 - 11.85 - 0.30 = 66.85
        assert_eq!(solo.ai_cost, dec!(0.30));
        assert_eq!(solo.total_fees, dec!(11.85));
        assert_eq!(solo.net_margin, dec!(66.85));
    }

    #[test]
    fn test_tier_margins_single_tier() {
        let input = TierMarginInput {
            tier: Some("club".into()),
            ai_cost_per_user_per_month: dec!(1),
            fee_toggles: FeeToggles::none(),
            catalog: None,
        };
        let out = calculate_tier_margins(&input).unwrap();
        assert_eq!(out.result.tiers.len(), 1);
        assert_eq!(out.result.tiers[0].net_margin, dec!(53));
        assert_eq!(out.result.tiers[0].monthly_net_margin.round_dp(4), dec!(8.8333));
    }

    #[test]
    fn test_tier_margins_unknown_tier() {
        let input = TierMarginInput {
            tier: Some("enterprise".into()),
            ai_cost_per_user_per_month: dec!(1),
            fee_toggles: FeeToggles::none(),
            catalog: None,
        };
        assert!(calculate_tier_margins(&input).is_err());
    }

    #[test]
    fn test_tier_margins_warn_when_loss_making() {
        let input = TierMarginInput {
            tier: Some("academy".into()),
            ai_cost_per_user_per_month: dec!(10),
            fee_toggles: FeeToggles::all(),
            catalog: None,
        };
        let out = calculate_tier_margins(&input).unwrap();
        assert!(out.result.tiers[0].net_margin < dec!(0));
        assert_eq!(out.warnings.len(), 1);
    }
}
