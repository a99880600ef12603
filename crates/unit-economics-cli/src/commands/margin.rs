use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use unit_economics_core::catalog::Catalog;
use unit_economics_core::margin::calculator::{self, MarginInput, TierMarginInput};
use unit_economics_core::margin::FeeToggles;

use crate::input;

/// Fee switches shared by the margin commands
#[derive(Args)]
pub struct FeeFlags {
    /// Deduct the 15% in-app purchase fee
    #[arg(long)]
    pub iap: bool,

    /// Deduct the 10% partner fee
    #[arg(long)]
    pub partner: bool,

    /// Deduct the 10% finder fee
    #[arg(long)]
    pub finder_fee: bool,
}

impl FeeFlags {
    fn toggles(&self) -> FeeToggles {
        FeeToggles {
            iap: self.iap,
            partner: self.partner,
            finder_fee: self.finder_fee,
        }
    }
}

/// Arguments for a fee-adjusted margin calculation
#[derive(Args)]
pub struct MarginArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Gross revenue before fees
    #[arg(long)]
    pub gross: Option<Decimal>,

    /// AI cost to deduct
    #[arg(long, default_value = "0")]
    pub ai_cost: Decimal,

    #[command(flatten)]
    pub fees: FeeFlags,
}

pub fn run_margin(args: MarginArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let margin_input: MarginInput = match input::from_file_or_stdin(args.input.as_deref())? {
        Some(parsed) => parsed,
        None => MarginInput {
            gross_revenue: args.gross.ok_or("--gross is required (or provide --input)")?,
            ai_cost: args.ai_cost,
            fee_toggles: args.fees.toggles(),
        },
    };

    let result = calculator::calculate_margin(&margin_input)?;
    Ok(serde_json::to_value(result)?)
}

/// Arguments for per-tier margins
#[derive(Args)]
pub struct TierMarginArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Restrict to one pricing tier
    #[arg(long)]
    pub tier: Option<String>,

    /// Average AI cost per paid user per month
    #[arg(long)]
    pub ai_cost_per_user: Option<Decimal>,

    #[command(flatten)]
    pub fees: FeeFlags,
}

pub fn run_tier_margins(
    args: TierMarginArgs,
    catalog: Option<Catalog>,
) -> Result<Value, Box<dyn std::error::Error>> {
    let mut tier_input: TierMarginInput = match input::from_file_or_stdin(args.input.as_deref())? {
        Some(parsed) => parsed,
        None => TierMarginInput {
            tier: args.tier,
            ai_cost_per_user_per_month: args
                .ai_cost_per_user
                .ok_or("--ai-cost-per-user is required (or provide --input)")?,
            fee_toggles: args.fees.toggles(),
            catalog: None,
        },
    };

    if tier_input.catalog.is_none() {
        tier_input.catalog = catalog;
    }

    let result = calculator::calculate_tier_margins(&tier_input)?;
    Ok(serde_json::to_value(result)?)
}
