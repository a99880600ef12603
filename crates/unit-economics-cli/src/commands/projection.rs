use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use unit_economics_core::catalog::Catalog;
use unit_economics_core::forecast::projection::{
    self, CustomOverride, ProjectionInput, ScenarioComparisonInput, DEFAULT_MONTH_OFFSETS,
};

use crate::input;

/// Arguments for a single scenario projection
#[derive(Args)]
pub struct ProjectArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Catalog scenario name, e.g. "moderate"
    #[arg(long)]
    pub scenario: Option<String>,

    /// Override the scenario's monthly new paid users
    #[arg(long)]
    pub new_users: Option<u64>,

    /// Override the scenario's monthly churn percentage
    #[arg(long)]
    pub churn: Option<Decimal>,

    /// Average AI cost per paid user per month
    #[arg(long)]
    pub avg_cost_per_user: Option<Decimal>,

    /// Month offsets (comma-separated, e.g. "1,3,6,12")
    #[arg(long, value_delimiter = ',')]
    pub months: Option<Vec<u32>>,

    /// Pricing tier driving revenue (defaults to the reference tier)
    #[arg(long)]
    pub tier: Option<String>,
}

pub fn run_project(
    args: ProjectArgs,
    catalog: Option<Catalog>,
) -> Result<Value, Box<dyn std::error::Error>> {
    let mut projection_input: ProjectionInput =
        match input::from_file_or_stdin(args.input.as_deref())? {
            Some(parsed) => parsed,
            None => ProjectionInput {
                scenario: Some(
                    args.scenario
                        .ok_or("--scenario is required (or provide --input)")?,
                ),
                assumptions: None,
                overrides: CustomOverride {
                    monthly_new_users: args.new_users,
                    churn_rate_pct: args.churn,
                },
                avg_cost_per_user: args
                    .avg_cost_per_user
                    .ok_or("--avg-cost-per-user is required (or provide --input)")?,
                month_offsets: args.months.unwrap_or_else(|| DEFAULT_MONTH_OFFSETS.to_vec()),
                pricing_tier: args.tier,
                start_date: None,
                catalog: None,
            },
        };

    if projection_input.catalog.is_none() {
        projection_input.catalog = catalog;
    }

    let result = projection::project_scenario(&projection_input)?;
    Ok(serde_json::to_value(result)?)
}

/// Arguments for comparing every catalog scenario
#[derive(Args)]
pub struct CompareArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Average AI cost per paid user per month
    #[arg(long)]
    pub avg_cost_per_user: Option<Decimal>,

    /// Month offsets (comma-separated, e.g. "1,3,6,12")
    #[arg(long, value_delimiter = ',')]
    pub months: Option<Vec<u32>>,

    /// Pricing tier driving revenue (defaults to the reference tier)
    #[arg(long)]
    pub tier: Option<String>,
}

pub fn run_compare(
    args: CompareArgs,
    catalog: Option<Catalog>,
) -> Result<Value, Box<dyn std::error::Error>> {
    let mut compare_input: ScenarioComparisonInput =
        match input::from_file_or_stdin(args.input.as_deref())? {
            Some(parsed) => parsed,
            None => ScenarioComparisonInput {
                avg_cost_per_user: args
                    .avg_cost_per_user
                    .ok_or("--avg-cost-per-user is required (or provide --input)")?,
                month_offsets: args.months.unwrap_or_else(|| DEFAULT_MONTH_OFFSETS.to_vec()),
                pricing_tier: args.tier,
                start_date: None,
                catalog: None,
            },
        };

    if compare_input.catalog.is_none() {
        compare_input.catalog = catalog;
    }

    let result = projection::compare_scenarios(&compare_input)?;
    Ok(serde_json::to_value(result)?)
}
