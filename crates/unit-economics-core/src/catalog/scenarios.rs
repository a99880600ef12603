use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::catalog::fee_profiles::FeeProfileTable;
use crate::error::UnitEconomicsError;
use crate::types::{require_churn_pct, Percent};
use crate::UnitEconomicsResult;

/// (name, monthly new paid users, churn %, trial conversion %, fee profile)
const BUILTIN_SCENARIOS: &[(&str, u64, Decimal, Decimal, &str)] = &[
    ("conservative", 10, dec!(8), dec!(15), "iapOnly"),
    ("moderate", 25, dec!(5), dec!(25), "iapPartner"),
    ("aggressive", 60, dec!(3), dec!(35), "allFees"),
];

/// A named, reusable bundle of growth assumptions. Never mutated after
/// creation; callers layer a `CustomOverride` on top instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioAssumptions {
    /// Unique scenario name
    pub name: String,
    /// New paid users acquired each month
    pub monthly_new_users: u64,
    /// Monthly churn as a percentage, 0 <= r < 100
    pub churn_rate_pct: Percent,
    /// Trial-to-paid conversion percentage. Display only.
    #[serde(default)]
    pub trial_conversion_pct: Percent,
    /// Fee profile id from the fee profile table
    pub fee_profile: String,
    /// Display-only summary of the fee profile's effect
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub net_revenue_rate_label: Option<String>,
}

impl ScenarioAssumptions {
    pub fn validate(&self) -> UnitEconomicsResult<()> {
        require_churn_pct(
            &format!("scenarios.{}.churn_rate_pct", self.name),
            self.churn_rate_pct,
        )?;
        if self.trial_conversion_pct < Decimal::ZERO
            || self.trial_conversion_pct > Decimal::ONE_HUNDRED
        {
            return Err(UnitEconomicsError::InvalidInput {
                field: format!("scenarios.{}.trial_conversion_pct", self.name),
                reason: "must be in [0, 100]".into(),
            });
        }
        Ok(())
    }
}

/// The set of scenarios offered by default, keyed by unique name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<ScenarioAssumptions>", into = "Vec<ScenarioAssumptions>")]
pub struct ScenarioSet {
    scenarios: Vec<ScenarioAssumptions>,
}

impl ScenarioSet {
    pub fn new(scenarios: Vec<ScenarioAssumptions>) -> UnitEconomicsResult<Self> {
        let mut seen = HashSet::new();
        for s in &scenarios {
            if !seen.insert(s.name.as_str()) {
                return Err(UnitEconomicsError::InvalidInput {
                    field: "scenarios".into(),
                    reason: format!("duplicate scenario name '{}'", s.name),
                });
            }
            s.validate()?;
        }
        Ok(Self { scenarios })
    }

    /// Built-in scenarios, with net-revenue labels taken from `fees`.
    pub fn builtin(fees: &FeeProfileTable) -> Self {
        let scenarios = BUILTIN_SCENARIOS
            .iter()
            .map(|(name, users, churn, trial, fee)| ScenarioAssumptions {
                name: (*name).to_string(),
                monthly_new_users: *users,
                churn_rate_pct: *churn,
                trial_conversion_pct: *trial,
                fee_profile: (*fee).to_string(),
                net_revenue_rate_label: fees.get(fee).ok().map(|p| p.net_revenue_label()),
            })
            .collect();
        Self { scenarios }
    }

    pub fn scenarios(&self) -> &[ScenarioAssumptions] {
        &self.scenarios
    }

    pub fn get(&self, name: &str) -> UnitEconomicsResult<&ScenarioAssumptions> {
        self.scenarios
            .iter()
            .find(|s| s.name == name)
            .ok_or_else(|| UnitEconomicsError::UnknownIdentifier {
                kind: "scenario".into(),
                id: name.into(),
            })
    }
}

impl Default for ScenarioSet {
    fn default() -> Self {
        Self::builtin(&FeeProfileTable::builtin())
    }
}

impl TryFrom<Vec<ScenarioAssumptions>> for ScenarioSet {
    type Error = UnitEconomicsError;

    fn try_from(scenarios: Vec<ScenarioAssumptions>) -> UnitEconomicsResult<Self> {
        Self::new(scenarios)
    }
}

impl From<ScenarioSet> for Vec<ScenarioAssumptions> {
    fn from(set: ScenarioSet) -> Self {
        set.scenarios
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_scenarios() {
        let set = ScenarioSet::default();
        assert_eq!(set.scenarios().len(), 3);
        let moderate = set.get("moderate").unwrap();
        assert_eq!(moderate.monthly_new_users, 25);
        assert_eq!(moderate.churn_rate_pct, dec!(5));
        assert_eq!(
            moderate.net_revenue_rate_label.as_deref(),
            Some("75% net revenue")
        );
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let s = ScenarioSet::default().get("moderate").unwrap().clone();
        assert!(ScenarioSet::new(vec![s.clone(), s]).is_err());
    }

    #[test]
    fn test_churn_of_one_hundred_rejected() {
        let mut s = ScenarioSet::default().get("moderate").unwrap().clone();
        s.churn_rate_pct = dec!(100);
        assert!(s.validate().is_err());
    }

    #[test]
    fn test_negative_churn_rejected() {
        let mut s = ScenarioSet::default().get("moderate").unwrap().clone();
        s.churn_rate_pct = dec!(-1);
        assert!(ScenarioSet::new(vec![s]).is_err());
    }
}
