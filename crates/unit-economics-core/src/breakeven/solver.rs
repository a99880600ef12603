use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::breakeven::roi::{ObservedMetrics, RoiContext, LTV_MONTHS};
use crate::error::UnitEconomicsError;
use crate::types::{
    div_checked, mul_checked, require_non_negative, with_metadata, ComputationOutput, Money,
    Percent,
};
use crate::UnitEconomicsResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostDirection {
    Increase,
    Saving,
    Unchanged,
}

/// Three independent ways to absorb a monthly cost delta. Any one of them
/// alone offsets it; they are not additive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakEvenResult {
    pub monthly_cost_delta: Money,
    pub direction: CostDirection,
    /// ceil(|delta| / (six_month_ltv / 6)); None when lifetime value is zero
    pub required_conversions: Option<u64>,
    /// |delta| / current_monthly_revenue * 100; None when there is no revenue
    pub required_retention_improvement_pct: Option<Percent>,
    /// |delta| / max(1, current_paid_users)
    pub required_price_increase: Money,
}

/// A proposed change in AI model pricing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelUpgrade {
    pub current_cost_per_call: Money,
    pub proposed_cost_per_call: Money,
    pub monthly_calls: u64,
}

impl ModelUpgrade {
    /// (proposed - current) * monthly calls
    pub fn monthly_cost_delta(&self) -> UnitEconomicsResult<Money> {
        require_non_negative("model_upgrade.current_cost_per_call", self.current_cost_per_call)?;
        require_non_negative("model_upgrade.proposed_cost_per_call", self.proposed_cost_per_call)?;
        mul_checked(
            "model_upgrade.monthly_calls",
            self.proposed_cost_per_call - self.current_cost_per_call,
            Decimal::from(self.monthly_calls),
        )
    }
}

/// Input for cost-change analysis. The delta is given directly or derived
/// from a model upgrade; the ROI context is given directly or derived from
/// observed metrics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostChangeInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monthly_cost_delta: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_upgrade: Option<ModelUpgrade>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roi: Option<RoiContext>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed: Option<ObservedMetrics>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostChangeOutput {
    /// "explicit" or "model_upgrade"
    pub delta_source: String,
    pub roi_context: RoiContext,
    pub break_even: BreakEvenResult,
}

// ---------------------------------------------------------------------------
// Core contract
// ---------------------------------------------------------------------------

/// Minimum conversions, retention gain, or price increase that would each
/// offset `monthly_cost_delta` on its own.
pub fn break_even(monthly_cost_delta: Money, roi: &RoiContext) -> UnitEconomicsResult<BreakEvenResult> {
    roi.validate()?;

    let magnitude = monthly_cost_delta.abs();
    let direction = if monthly_cost_delta > Decimal::ZERO {
        CostDirection::Increase
    } else if monthly_cost_delta < Decimal::ZERO {
        CostDirection::Saving
    } else {
        CostDirection::Unchanged
    };

    let monthly_value_per_subscriber = roi.six_month_ltv / LTV_MONTHS;
    let required_conversions = if monthly_value_per_subscriber.is_zero() {
        None
    } else {
        let conversions =
            div_checked("monthly_cost_delta", magnitude, monthly_value_per_subscriber)?.ceil();
        Some(conversions.to_u64().ok_or_else(|| UnitEconomicsError::InvalidInput {
            field: "monthly_cost_delta".into(),
            reason: format!("required conversions {conversions} out of range"),
        })?)
    };

    let required_retention_improvement_pct = if roi.current_monthly_revenue.is_zero() {
        None
    } else {
        let share = div_checked("monthly_cost_delta", magnitude, roi.current_monthly_revenue)?;
        Some(mul_checked("monthly_cost_delta", share, Decimal::ONE_HUNDRED)?)
    };

    let required_price_increase = magnitude / Decimal::from(roi.current_paid_users.max(1));

    Ok(BreakEvenResult {
        monthly_cost_delta,
        direction,
        required_conversions,
        required_retention_improvement_pct,
        required_price_increase,
    })
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Break-even requirements for a proposed monthly cost change.
pub fn analyze_cost_change(
    input: &CostChangeInput,
) -> UnitEconomicsResult<ComputationOutput<CostChangeOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let (delta, delta_source) = match (&input.monthly_cost_delta, &input.model_upgrade) {
        (Some(d), None) => (*d, "explicit"),
        (None, Some(upgrade)) => (upgrade.monthly_cost_delta()?, "model_upgrade"),
        _ => {
            return Err(UnitEconomicsError::InvalidInput {
                field: "monthly_cost_delta".into(),
                reason: "provide exactly one of monthly_cost_delta or model_upgrade".into(),
            })
        }
    };

    let roi_context = match (&input.roi, &input.observed) {
        (Some(roi), None) => roi.clone(),
        (None, Some(observed)) => observed.to_roi_context()?,
        _ => {
            return Err(UnitEconomicsError::InvalidInput {
                field: "roi".into(),
                reason: "provide exactly one of roi or observed".into(),
            })
        }
    };

    let result = break_even(delta, &roi_context)?;

    if result.required_conversions.is_none() {
        log::warn!("break-even: lifetime value is zero, conversions not computable");
        warnings.push(
            "Six-month lifetime value is zero; required conversions not computable".to_string(),
        );
    }
    if result.required_retention_improvement_pct.is_none() {
        log::warn!("break-even: no current revenue, retention improvement not computable");
        warnings.push(
            "Current monthly revenue is zero; retention improvement not computable".to_string(),
        );
    }
    if roi_context.current_paid_users == 0 {
        warnings.push(
            "No current paid users; price increase computed against a single user".to_string(),
        );
    }
    if result.direction == CostDirection::Saving {
        warnings.push(format!(
            "Cost decreases by {}; figures show the headroom the saving creates",
            delta.abs()
        ));
    }

    let output = CostChangeOutput {
        delta_source: delta_source.to_string(),
        roi_context,
        break_even: result,
    };

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Break-even for a monthly cost delta (conversions, retention, or price)",
        input,
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
