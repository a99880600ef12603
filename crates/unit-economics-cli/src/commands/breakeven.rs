use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use unit_economics_core::breakeven::roi::ObservedMetrics;
use unit_economics_core::breakeven::solver::{self, CostChangeInput, ModelUpgrade};

use crate::input;

/// Arguments for break-even analysis of a cost change
#[derive(Args)]
pub struct BreakEvenArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Monthly cost delta (negative for a saving)
    #[arg(long, allow_hyphen_values = true)]
    pub delta: Option<Decimal>,

    /// Current AI cost per call (with --proposed-cost-per-call and --monthly-calls)
    #[arg(long)]
    pub current_cost_per_call: Option<Decimal>,

    /// Proposed AI cost per call
    #[arg(long)]
    pub proposed_cost_per_call: Option<Decimal>,

    /// AI calls per month
    #[arg(long)]
    pub monthly_calls: Option<u64>,

    /// Current paid users
    #[arg(long)]
    pub paid_users: Option<u64>,

    /// Current total monthly revenue
    #[arg(long)]
    pub monthly_revenue: Option<Decimal>,
}

pub fn run_break_even(args: BreakEvenArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let cost_input: CostChangeInput = match input::from_file_or_stdin(args.input.as_deref())? {
        Some(parsed) => parsed,
        None => {
            let model_upgrade = match (
                args.current_cost_per_call,
                args.proposed_cost_per_call,
                args.monthly_calls,
            ) {
                (Some(current), Some(proposed), Some(calls)) => Some(ModelUpgrade {
                    current_cost_per_call: current,
                    proposed_cost_per_call: proposed,
                    monthly_calls: calls,
                }),
                (None, None, None) => None,
                _ => {
                    return Err("--current-cost-per-call, --proposed-cost-per-call and \
                                --monthly-calls must be given together"
                        .into())
                }
            };

            CostChangeInput {
                monthly_cost_delta: args.delta,
                model_upgrade,
                roi: None,
                observed: Some(ObservedMetrics {
                    current_paid_users: args
                        .paid_users
                        .ok_or("--paid-users is required (or provide --input)")?,
                    current_monthly_revenue: args
                        .monthly_revenue
                        .ok_or("--monthly-revenue is required (or provide --input)")?,
                }),
            }
        }
    };

    let result = solver::analyze_cost_change(&cost_input)?;
    Ok(serde_json::to_value(result)?)
}
