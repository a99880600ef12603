use clap::{Args, ValueEnum};
use serde_json::{json, Value};

use unit_economics_core::catalog::Catalog;

#[derive(Debug, Clone, ValueEnum)]
pub enum CatalogSection {
    FeeProfiles,
    Pricing,
    Scenarios,
}

/// Arguments for printing the active catalog
#[derive(Args)]
pub struct CatalogArgs {
    /// Print only one section
    #[arg(long)]
    pub section: Option<CatalogSection>,
}

pub fn run_catalog(
    args: CatalogArgs,
    catalog: Option<Catalog>,
) -> Result<Value, Box<dyn std::error::Error>> {
    let catalog = catalog.unwrap_or_else(Catalog::builtin);

    let fee_profiles: Vec<Value> = catalog
        .fee_profiles
        .profiles()
        .iter()
        .map(|p| {
            json!({
                "id": p.id,
                "label": p.label,
                "retention_multiplier": p.retention_multiplier,
                "net_revenue": p.net_revenue_label(),
            })
        })
        .collect();
    let pricing = serde_json::to_value(catalog.pricing.quotes())?;
    let scenarios = serde_json::to_value(catalog.scenarios.scenarios())?;

    Ok(match args.section {
        Some(CatalogSection::FeeProfiles) => Value::Array(fee_profiles),
        Some(CatalogSection::Pricing) => pricing,
        Some(CatalogSection::Scenarios) => scenarios,
        None => json!({
            "fee_profiles": fee_profiles,
            "pricing": pricing,
            "scenarios": scenarios,
        }),
    })
}
