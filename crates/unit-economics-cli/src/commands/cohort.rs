use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use unit_economics_core::forecast::cohort::{self, CohortInput};

use crate::input;

/// Arguments for a cohort trajectory
#[derive(Args)]
pub struct CohortArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// New paid users acquired each month
    #[arg(long)]
    pub new_users: Option<u64>,

    /// Monthly churn as a percentage (5 = 5%)
    #[arg(long)]
    pub churn: Option<Decimal>,

    /// Months to simulate, at most 6000
    #[arg(long, default_value_t = 12)]
    pub months: u32,
}

pub fn run_cohort(args: CohortArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let cohort_input: CohortInput = match input::from_file_or_stdin(args.input.as_deref())? {
        Some(parsed) => parsed,
        None => CohortInput {
            monthly_new_users: args
                .new_users
                .ok_or("--new-users is required (or provide --input)")?,
            churn_rate_pct: args.churn.ok_or("--churn is required (or provide --input)")?,
            horizon_months: args.months,
        },
    };

    let result = cohort::analyze_cohort(&cohort_input)?;
    Ok(serde_json::to_value(result)?)
}
