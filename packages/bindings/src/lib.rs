use napi::Result as NapiResult;
use napi_derive::napi;
use serde::de::DeserializeOwned;
use serde::Serialize;

use unit_economics_core::breakeven::solver;
use unit_economics_core::catalog::Catalog;
use unit_economics_core::forecast::{cohort, projection};
use unit_economics_core::margin::calculator;
use unit_economics_core::UnitEconomicsResult;

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

/// Parse a JSON input, run a computation, and return its JSON output.
fn run_json<I, O, F>(input_json: &str, compute: F) -> NapiResult<String>
where
    I: DeserializeOwned,
    O: Serialize,
    F: FnOnce(&I) -> UnitEconomicsResult<O>,
{
    let input: I = serde_json::from_str(input_json).map_err(to_napi_error)?;
    let output = compute(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Forecast
// ---------------------------------------------------------------------------

#[napi]
pub fn analyze_cohort(input_json: String) -> NapiResult<String> {
    run_json(&input_json, cohort::analyze_cohort)
}

#[napi]
pub fn project_scenario(input_json: String) -> NapiResult<String> {
    run_json(&input_json, projection::project_scenario)
}

#[napi]
pub fn compare_scenarios(input_json: String) -> NapiResult<String> {
    run_json(&input_json, projection::compare_scenarios)
}

// ---------------------------------------------------------------------------
// Margin
// ---------------------------------------------------------------------------

#[napi]
pub fn calculate_margin(input_json: String) -> NapiResult<String> {
    run_json(&input_json, calculator::calculate_margin)
}

#[napi]
pub fn calculate_tier_margins(input_json: String) -> NapiResult<String> {
    run_json(&input_json, calculator::calculate_tier_margins)
}

// ---------------------------------------------------------------------------
// Break-even
// ---------------------------------------------------------------------------

#[napi]
pub fn analyze_cost_change(input_json: String) -> NapiResult<String> {
    run_json(&input_json, solver::analyze_cost_change)
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

#[napi]
pub fn builtin_catalog() -> NapiResult<String> {
    serde_json::to_string(&Catalog::builtin()).map_err(to_napi_error)
}
