use chrono::{Months, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::catalog::{Catalog, PricingTier, ScenarioAssumptions};
use crate::error::UnitEconomicsError;
use crate::forecast::cohort::active_users;
use crate::margin::margin_percent;
use crate::types::{
    mul_checked, require_churn_pct, require_non_negative, with_metadata, ComputationOutput, Money,
    Percent, Rate,
};
use crate::UnitEconomicsResult;

/// Offsets used when a caller does not ask for specific months.
pub const DEFAULT_MONTH_OFFSETS: [u32; 4] = [1, 3, 6, 12];

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Per-field overrides layered on top of a scenario without mutating it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monthly_new_users: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub churn_rate_pct: Option<Percent>,
}

impl CustomOverride {
    pub fn is_empty(&self) -> bool {
        self.monthly_new_users.is_none() && self.churn_rate_pct.is_none()
    }

    /// Effective (monthly new users, churn %) for `scenario`.
    pub fn resolve(&self, scenario: &ScenarioAssumptions) -> (u64, Percent) {
        (
            self.monthly_new_users.unwrap_or(scenario.monthly_new_users),
            self.churn_rate_pct.unwrap_or(scenario.churn_rate_pct),
        )
    }
}

/// One point of a projection. Revenue and AI cost are cumulative since
/// inception over `month_offset` months, not a single month's billing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionPoint {
    pub month_offset: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period_end: Option<NaiveDate>,
    pub paid_users: u64,
    /// paid_users * monthly price * month_offset
    pub gross_revenue: Money,
    /// gross_revenue * fee profile multiplier
    pub net_revenue: Money,
    /// paid_users * avg cost per user * month_offset
    pub ai_costs: Money,
    /// net_revenue - ai_costs
    pub gross_profit: Money,
    /// gross_profit / gross_revenue * 100, or 0 without revenue
    pub gross_margin_pct: Percent,
}

impl ProjectionPoint {
    /// The only constructor: profit and margin are always derived here.
    fn from_components(
        month_offset: u32,
        paid_users: u64,
        gross_revenue: Money,
        net_revenue: Money,
        ai_costs: Money,
    ) -> UnitEconomicsResult<Self> {
        let gross_profit = net_revenue - ai_costs;
        Ok(Self {
            month_offset,
            period_end: None,
            paid_users,
            gross_revenue,
            net_revenue,
            ai_costs,
            gross_profit,
            gross_margin_pct: margin_percent(gross_profit, gross_revenue)?,
        })
    }
}

/// Input for a scenario projection. Name a catalog scenario or supply a
/// complete assumption bundle, not both.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectionInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scenario: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assumptions: Option<ScenarioAssumptions>,
    #[serde(default)]
    pub overrides: CustomOverride,
    /// Observed average AI cost per paid user per month
    pub avg_cost_per_user: Money,
    #[serde(default = "default_month_offsets")]
    pub month_offsets: Vec<u32>,
    /// Pricing tier whose monthly equivalent drives revenue; the catalog's
    /// reference tier when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pricing_tier: Option<String>,
    /// Projection start; each point then carries its calendar period end
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog: Option<Catalog>,
}

fn default_month_offsets() -> Vec<u32> {
    DEFAULT_MONTH_OFFSETS.to_vec()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectionOutput {
    pub scenario: String,
    pub fee_profile: String,
    pub fee_multiplier: Rate,
    pub pricing_tier: String,
    pub monthly_equivalent_price: Money,
    pub effective_monthly_new_users: u64,
    pub effective_churn_rate_pct: Percent,
    /// How to label revenue figures, e.g. "cumulative over 6 months"
    pub revenue_convention: String,
    pub points: Vec<ProjectionPoint>,
}

/// Input for running every catalog scenario side by side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioComparisonInput {
    pub avg_cost_per_user: Money,
    #[serde(default = "default_month_offsets")]
    pub month_offsets: Vec<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pricing_tier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog: Option<Catalog>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioComparisonOutput {
    pub scenarios: Vec<ProjectionOutput>,
    /// Scenario with the highest gross profit at the furthest offset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub most_profitable: Option<String>,
}

// ---------------------------------------------------------------------------
// Core contract
// ---------------------------------------------------------------------------

/// Sort and de-duplicate month offsets, rejecting month zero.
fn normalize_offsets(month_offsets: &[u32]) -> UnitEconomicsResult<(Vec<u32>, bool)> {
    if month_offsets.contains(&0) {
        return Err(UnitEconomicsError::InvalidInput {
            field: "month_offsets".into(),
            reason: "month offsets are 1-based; 0 is not a valid offset".into(),
        });
    }
    let mut sorted = month_offsets.to_vec();
    sorted.sort_unstable();
    sorted.dedup();
    let changed = sorted.as_slice() != month_offsets;
    Ok((sorted, changed))
}

fn project_points(
    monthly_new_users: u64,
    churn_rate_pct: Percent,
    avg_cost_per_user: Money,
    offsets: &[u32],
    monthly_price: Money,
    fee_multiplier: Rate,
) -> UnitEconomicsResult<Vec<ProjectionPoint>> {
    offsets
        .iter()
        .map(|&month| {
            let paid_users = active_users(monthly_new_users, churn_rate_pct, month)?;
            let users = Decimal::from(paid_users);
            let months = Decimal::from(month);
            let gross_revenue = mul_checked(
                "gross_revenue",
                mul_checked("gross_revenue", users, monthly_price)?,
                months,
            )?;
            let net_revenue = mul_checked("net_revenue", gross_revenue, fee_multiplier)?;
            let ai_costs = mul_checked(
                "avg_cost_per_user",
                mul_checked("avg_cost_per_user", users, avg_cost_per_user)?,
                months,
            )?;
            ProjectionPoint::from_components(month, paid_users, gross_revenue, net_revenue, ai_costs)
        })
        .collect()
}

/// Project a scenario at each requested month offset (ascending) using the
/// catalog's fee profile multiplier and reference-tier monthly price.
///
/// An empty offset list yields an empty projection.
pub fn build_projection(
    assumptions: &ScenarioAssumptions,
    overrides: &CustomOverride,
    avg_cost_per_user: Money,
    month_offsets: &[u32],
    catalog: &Catalog,
) -> UnitEconomicsResult<Vec<ProjectionPoint>> {
    let tier = catalog.pricing.reference_tier();
    build_projection_for_tier(
        assumptions,
        overrides,
        avg_cost_per_user,
        month_offsets,
        catalog,
        tier,
    )
}

fn build_projection_for_tier(
    assumptions: &ScenarioAssumptions,
    overrides: &CustomOverride,
    avg_cost_per_user: Money,
    month_offsets: &[u32],
    catalog: &Catalog,
    tier: &PricingTier,
) -> UnitEconomicsResult<Vec<ProjectionPoint>> {
    require_non_negative("avg_cost_per_user", avg_cost_per_user)?;
    let (monthly_new_users, churn_rate_pct) = overrides.resolve(assumptions);
    require_churn_pct("churn_rate_pct", churn_rate_pct)?;
    let fee_multiplier = catalog.fee_profiles.multiplier(&assumptions.fee_profile)?;

    let (offsets, reordered) = normalize_offsets(month_offsets)?;
    if reordered {
        log::warn!(
            "projection '{}': month offsets {:?} normalised to {:?}",
            assumptions.name,
            month_offsets,
            offsets
        );
    }

    project_points(
        monthly_new_users,
        churn_rate_pct,
        avg_cost_per_user,
        &offsets,
        catalog.pricing.monthly_equivalent(tier),
        fee_multiplier,
    )
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

fn resolve_catalog(catalog: &Option<Catalog>) -> UnitEconomicsResult<Catalog> {
    match catalog {
        Some(c) => {
            c.validate()?;
            Ok(c.clone())
        }
        None => Ok(Catalog::builtin()),
    }
}

fn revenue_convention(offsets: &[u32]) -> String {
    match offsets.last() {
        Some(m) => format!("cumulative over {m} months"),
        None => "cumulative since inception".to_string(),
    }
}

fn with_period_ends(mut points: Vec<ProjectionPoint>, start: Option<NaiveDate>) -> Vec<ProjectionPoint> {
    if let Some(start) = start {
        for p in &mut points {
            p.period_end = start.checked_add_months(Months::new(p.month_offset));
        }
    }
    points
}

fn project_one(
    assumptions: &ScenarioAssumptions,
    overrides: &CustomOverride,
    avg_cost_per_user: Money,
    offsets: &[u32],
    pricing_tier: Option<&str>,
    start_date: Option<NaiveDate>,
    catalog: &Catalog,
) -> UnitEconomicsResult<ProjectionOutput> {
    let tier = match pricing_tier {
        Some(id) => catalog.pricing.tier(id)?,
        None => catalog.pricing.reference_tier(),
    };
    let points = build_projection_for_tier(
        assumptions,
        overrides,
        avg_cost_per_user,
        offsets,
        catalog,
        tier,
    )?;
    let (effective_users, effective_churn) = overrides.resolve(assumptions);

    Ok(ProjectionOutput {
        scenario: assumptions.name.clone(),
        fee_profile: assumptions.fee_profile.clone(),
        fee_multiplier: catalog.fee_profiles.multiplier(&assumptions.fee_profile)?,
        pricing_tier: tier.id.clone(),
        monthly_equivalent_price: catalog.pricing.monthly_equivalent(tier),
        effective_monthly_new_users: effective_users,
        effective_churn_rate_pct: effective_churn,
        revenue_convention: revenue_convention(offsets),
        points: with_period_ends(points, start_date),
    })
}

/// Project one scenario (named or custom) with optional overrides.
pub fn project_scenario(
    input: &ProjectionInput,
) -> UnitEconomicsResult<ComputationOutput<ProjectionOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let catalog = resolve_catalog(&input.catalog)?;

    let assumptions = match (&input.scenario, &input.assumptions) {
        (Some(_), Some(_)) => {
            return Err(UnitEconomicsError::InvalidInput {
                field: "scenario".into(),
                reason: "provide either a scenario name or custom assumptions, not both".into(),
            })
        }
        (Some(name), None) => catalog.scenarios.get(name)?.clone(),
        (None, Some(custom)) => {
            custom.validate()?;
            custom.clone()
        }
        (None, None) => {
            return Err(UnitEconomicsError::InvalidInput {
                field: "scenario".into(),
                reason: "a scenario name or custom assumptions are required".into(),
            })
        }
    };

    let (offsets, reordered) = normalize_offsets(&input.month_offsets)?;
    if reordered {
        warnings.push(format!(
            "Month offsets were sorted and de-duplicated to {offsets:?}"
        ));
    }
    if offsets.is_empty() {
        warnings.push("No month offsets requested; projection is empty".to_string());
    }
    if !input.overrides.is_empty() {
        warnings.push(format!(
            "Custom overrides applied to scenario '{}'",
            assumptions.name
        ));
    }

    let output = project_one(
        &assumptions,
        &input.overrides,
        input.avg_cost_per_user,
        &offsets,
        input.pricing_tier.as_deref(),
        input.start_date,
        &catalog,
    )?;

    log::debug!(
        "projection '{}': {} points, {}",
        output.scenario,
        output.points.len(),
        output.revenue_convention
    );

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Scenario projection (cohort compounding, cumulative revenue and AI cost, fee-profile net revenue)",
        &serde_json::json!({
            "scenario": assumptions,
            "overrides": input.overrides,
            "avg_cost_per_user": input.avg_cost_per_user.to_string(),
            "month_offsets": offsets,
            "custom_catalog": input.catalog.is_some(),
        }),
        warnings,
        elapsed,
        output,
    ))
}

/// Project every catalog scenario with shared cost and offset assumptions.
pub fn compare_scenarios(
    input: &ScenarioComparisonInput,
) -> UnitEconomicsResult<ComputationOutput<ScenarioComparisonOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let catalog = resolve_catalog(&input.catalog)?;
    let (offsets, reordered) = normalize_offsets(&input.month_offsets)?;
    if reordered {
        warnings.push(format!(
            "Month offsets were sorted and de-duplicated to {offsets:?}"
        ));
    }

    let no_overrides = CustomOverride::default();
    let scenarios = catalog
        .scenarios
        .scenarios()
        .iter()
        .map(|s| {
            project_one(
                s,
                &no_overrides,
                input.avg_cost_per_user,
                &offsets,
                input.pricing_tier.as_deref(),
                input.start_date,
                &catalog,
            )
        })
        .collect::<UnitEconomicsResult<Vec<_>>>()?;

    let most_profitable = scenarios
        .iter()
        .filter_map(|s| s.points.last().map(|p| (s, p.gross_profit)))
        .max_by(|a, b| a.1.cmp(&b.1))
        .map(|(s, _)| s.scenario.clone());

    let output = ScenarioComparisonOutput {
        scenarios,
        most_profitable,
    };

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Side-by-side scenario projections",
        &serde_json::json!({
            "avg_cost_per_user": input.avg_cost_per_user.to_string(),
            "month_offsets": offsets,
            "pricing_tier": input.pricing_tier,
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
    use rust_decimal_macros::dec;

    fn growth_scenario() -> ScenarioAssumptions {
        ScenarioAssumptions {
            name: "growth".into(),
            monthly_new_users: 20,
            churn_rate_pct: dec!(5),
            trial_conversion_pct: dec!(20),
            fee_profile: "iapOnly".into(),
            net_revenue_rate_label: None,
        }
    }

    fn custom_input(offsets: Vec<u32>) -> ProjectionInput {
        ProjectionInput {
            scenario: None,
            assumptions: Some(growth_scenario()),
            overrides: CustomOverride::default(),
            avg_cost_per_user: dec!(0.05),
            month_offsets: offsets,
            pricing_tier: None,
            start_date: None,
            catalog: None,
        }
    }

    #[test]
    fn test_paid_users_follow_cohort_model() {
        let catalog = Catalog::builtin();
        let points = build_projection(
            &growth_scenario(),
            &CustomOverride::default(),
            dec!(0.05),
            &[1, 6],
            &catalog,
        )
        .unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].paid_users, 19);
        assert_eq!(points[1].paid_users, active_users(20, dec!(5), 6).unwrap());
        assert_eq!(points[1].paid_users, 101);
    }

    #[test]
    fn test_cumulative_revenue_and_cost() {
        let catalog = Catalog::builtin();
        let points = build_projection(
            &growth_scenario(),
            &CustomOverride::default(),
            dec!(0.05),
            &[6],
            &catalog,
        )
        .unwrap();
        let p = &points[0];
        // 101 users * (79 / 6) * 6 months = 7979
        assert_eq!(p.gross_revenue.round_dp(10), dec!(7979));
        assert_eq!(p.net_revenue.round_dp(10), dec!(6782.15));
        // 101 * 0.05 * 6 = 30.30
        assert_eq!(p.ai_costs, dec!(30.30));
        assert_eq!(p.gross_profit.round_dp(10), dec!(6751.85));
    }

    #[test]
    fn test_margin_rederivable_from_point() {
        let catalog = Catalog::builtin();
        let points = build_projection(
            &growth_scenario(),
            &CustomOverride::default(),
            dec!(0.05),
            &[1, 3, 6, 12, 24],
            &catalog,
        )
        .unwrap();
        for p in &points {
            assert_eq!(p.gross_profit, p.net_revenue - p.ai_costs);
            assert_eq!(
                p.gross_margin_pct,
                p.gross_profit / p.gross_revenue * dec!(100)
            );
        }
    }

    #[test]
    fn test_empty_offsets_give_empty_projection() {
        let catalog = Catalog::builtin();
        let points = build_projection(
            &growth_scenario(),
            &CustomOverride::default(),
            dec!(0.05),
            &[],
            &catalog,
        )
        .unwrap();
        assert!(points.is_empty());
    }

    #[test]
    fn test_zero_offset_rejected() {
        let catalog = Catalog::builtin();
        let result = build_projection(
            &growth_scenario(),
            &CustomOverride::default(),
            dec!(0.05),
            &[0, 1],
            &catalog,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_overrides_take_precedence_per_field() {
        let catalog = Catalog::builtin();
        let overrides = CustomOverride {
            monthly_new_users: None,
            churn_rate_pct: Some(dec!(0)),
        };
        let scenario = growth_scenario();
        let points =
            build_projection(&scenario, &overrides, dec!(0.05), &[6], &catalog).unwrap();
        assert_eq!(points[0].paid_users, 120);
        // scenario itself untouched
        assert_eq!(scenario.churn_rate_pct, dec!(5));
    }

    #[test]
    fn test_override_churn_validated() {
        let catalog = Catalog::builtin();
        let overrides = CustomOverride {
            monthly_new_users: None,
            churn_rate_pct: Some(dec!(100)),
        };
        assert!(build_projection(&growth_scenario(), &overrides, dec!(0), &[1], &catalog).is_err());
    }

    #[test]
    fn test_cost_overflow_is_an_error() {
        let catalog = Catalog::builtin();
        let overrides = CustomOverride {
            monthly_new_users: Some(1_000_000),
            churn_rate_pct: Some(dec!(0)),
        };
        let result = build_projection(
            &growth_scenario(),
            &overrides,
            Decimal::from_i128_with_scale(10_i128.pow(22), 0),
            &[12],
            &catalog,
        );
        assert!(matches!(result, Err(UnitEconomicsError::InvalidInput { .. })));
    }

    #[test]
    fn test_zero_users_has_zero_margin_not_nan() {
        let catalog = Catalog::builtin();
        let overrides = CustomOverride {
            monthly_new_users: Some(0),
            churn_rate_pct: None,
        };
        let points =
            build_projection(&growth_scenario(), &overrides, dec!(0.05), &[3], &catalog).unwrap();
        assert_eq!(points[0].gross_revenue, dec!(0));
        assert_eq!(points[0].gross_margin_pct, dec!(0));
    }

    #[test]
    fn test_project_scenario_is_deterministic() {
        let input = custom_input(vec![1, 6, 12]);
        let a = project_scenario(&input).unwrap();
        let b = project_scenario(&input).unwrap();
        assert_eq!(a.result.points, b.result.points);
    }

    #[test]
    fn test_project_scenario_normalises_offsets() {
        let out = project_scenario(&custom_input(vec![6, 1, 6])).unwrap();
        let months: Vec<u32> = out.result.points.iter().map(|p| p.month_offset).collect();
        assert_eq!(months, vec![1, 6]);
        assert!(out.warnings.iter().any(|w| w.contains("sorted")));
        assert_eq!(out.result.revenue_convention, "cumulative over 6 months");
    }

    #[test]
    fn test_project_named_scenario() {
        let input = ProjectionInput {
            scenario: Some("conservative".into()),
            assumptions: None,
            overrides: CustomOverride::default(),
            avg_cost_per_user: dec!(0.10),
            month_offsets: default_month_offsets(),
            pricing_tier: Some("squad".into()),
            start_date: NaiveDate::from_ymd_opt(2025, 1, 31),
            catalog: None,
        };
        let out = project_scenario(&input).unwrap();
        assert_eq!(out.result.fee_multiplier, dec!(0.85));
        assert_eq!(out.result.pricing_tier, "squad");
        assert_eq!(out.result.points.len(), 4);
        // month-end clamping: Jan 31 + 1 month = Feb 28
        assert_eq!(
            out.result.points[0].period_end,
            NaiveDate::from_ymd_opt(2025, 2, 28)
        );
    }

    #[test]
    fn test_scenario_and_assumptions_are_exclusive() {
        let mut input = custom_input(vec![1]);
        input.scenario = Some("moderate".into());
        assert!(project_scenario(&input).is_err());
        input.assumptions = None;
        input.scenario = None;
        assert!(project_scenario(&input).is_err());
    }

    #[test]
    fn test_unknown_fee_profile() {
        let mut input = custom_input(vec![1]);
        if let Some(a) = input.assumptions.as_mut() {
            a.fee_profile = "mystery".into();
        }
        assert!(matches!(
            project_scenario(&input),
            Err(UnitEconomicsError::UnknownIdentifier { .. })
        ));
    }

    #[test]
    fn test_compare_scenarios() {
        let input = ScenarioComparisonInput {
            avg_cost_per_user: dec!(0.05),
            month_offsets: vec![12],
            pricing_tier: None,
            start_date: None,
            catalog: None,
        };
        let out = compare_scenarios(&input).unwrap();
        assert_eq!(out.result.scenarios.len(), 3);
        assert_eq!(out.result.most_profitable.as_deref(), Some("aggressive"));
    }
}
