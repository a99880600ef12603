//! Static reference data: fee profiles, subscription pricing and the default
//! scenario bundles. Built-in values are compiled in; an override catalog may
//! be deserialized from YAML or JSON, with omitted sections falling back to
//! the built-in ones.

pub mod fee_profiles;
pub mod pricing;
pub mod scenarios;

use serde::{Deserialize, Serialize};

use crate::error::UnitEconomicsError;
use crate::UnitEconomicsResult;

pub use fee_profiles::{FeeProfile, FeeProfileTable};
pub use pricing::{PricingReference, PricingTier, TierQuote};
pub use scenarios::{ScenarioAssumptions, ScenarioSet};

/// All read-only configuration shared by every computation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub fee_profiles: FeeProfileTable,
    #[serde(default)]
    pub pricing: PricingReference,
    #[serde(default)]
    pub scenarios: ScenarioSet,
}

impl Catalog {
    pub fn builtin() -> Self {
        Self::default()
    }

    /// Cross-table checks. Each table validates itself on construction; this
    /// verifies that every scenario references a known fee profile.
    pub fn validate(&self) -> UnitEconomicsResult<()> {
        for s in self.scenarios.scenarios() {
            if self.fee_profiles.get(&s.fee_profile).is_err() {
                return Err(UnitEconomicsError::InvalidInput {
                    field: format!("scenarios.{}.fee_profile", s.name),
                    reason: format!("references unknown fee profile '{}'", s.fee_profile),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_builtin_catalog_is_consistent() {
        assert!(Catalog::builtin().validate().is_ok());
    }

    #[test]
    fn test_partial_override_keeps_builtin_sections() {
        let json = r#"{
            "fee_profiles": [
                {"id": "iapOnly", "label": "Store", "retention_multiplier": "0.70"}
            ]
        }"#;
        let catalog: Catalog = serde_json::from_str(json).unwrap();
        assert_eq!(catalog.fee_profiles.multiplier("iapOnly").unwrap(), dec!(0.70));
        assert_eq!(catalog.pricing, PricingReference::builtin());
        assert_eq!(catalog.scenarios.scenarios().len(), 3);
        // built-in scenarios reference profiles this override dropped
        assert!(catalog.validate().is_err());
    }

    #[test]
    fn test_round_trip_through_json() {
        let catalog = Catalog::builtin();
        let json = serde_json::to_string(&catalog).unwrap();
        let back: Catalog = serde_json::from_str(&json).unwrap();
        assert_eq!(back, catalog);
    }
}
