use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::UnitEconomicsError;
use crate::types::Rate;
use crate::UnitEconomicsResult;

// ---------------------------------------------------------------------------
// Built-in fee profiles
// ---------------------------------------------------------------------------

/// (id, label, retention multiplier). Each multiplier equals one minus the
/// additive store (15%), partner (10%) and finder (10%) deductions it implies.
const BUILTIN_FEE_PROFILES: &[(&str, &str, Decimal)] = &[
    ("noFees", "No fees", dec!(1.00)),
    ("iapOnly", "Store fee only", dec!(0.85)),
    ("iapPartner", "Store + partner fee", dec!(0.75)),
    ("allFees", "All fees", dec!(0.65)),
];

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A named net-revenue retention multiplier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeeProfile {
    /// Identifier referenced by scenarios, e.g. "iapOnly"
    pub id: String,
    /// Human-readable name
    pub label: String,
    /// Fraction of gross revenue retained after platform and partner fees (0 < m <= 1)
    pub retention_multiplier: Rate,
}

impl FeeProfile {
    /// Display summary of the profile's effect, e.g. "85% net revenue".
    pub fn net_revenue_label(&self) -> String {
        let pct = (self.retention_multiplier * Decimal::ONE_HUNDRED).normalize();
        format!("{pct}% net revenue")
    }
}

/// Immutable lookup table of fee profiles, validated on construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<FeeProfile>", into = "Vec<FeeProfile>")]
pub struct FeeProfileTable {
    profiles: Vec<FeeProfile>,
}

impl FeeProfileTable {
    /// Build a table, rejecting duplicate ids and multipliers outside (0, 1].
    pub fn new(profiles: Vec<FeeProfile>) -> UnitEconomicsResult<Self> {
        if profiles.is_empty() {
            return Err(UnitEconomicsError::InvalidInput {
                field: "fee_profiles".into(),
                reason: "at least one fee profile is required".into(),
            });
        }

        let mut seen = HashSet::new();
        for p in &profiles {
            if !seen.insert(p.id.as_str()) {
                return Err(UnitEconomicsError::InvalidInput {
                    field: "fee_profiles".into(),
                    reason: format!("duplicate fee profile id '{}'", p.id),
                });
            }
            if p.retention_multiplier <= Decimal::ZERO || p.retention_multiplier > Decimal::ONE {
                return Err(UnitEconomicsError::InvalidInput {
                    field: format!("fee_profiles.{}.retention_multiplier", p.id),
                    reason: format!(
                        "must be in (0, 1], got {}",
                        p.retention_multiplier
                    ),
                });
            }
        }

        Ok(Self { profiles })
    }

    /// The compiled-in default table.
    pub fn builtin() -> Self {
        let profiles = BUILTIN_FEE_PROFILES
            .iter()
            .map(|(id, label, m)| FeeProfile {
                id: (*id).to_string(),
                label: (*label).to_string(),
                retention_multiplier: *m,
            })
            .collect();
        Self { profiles }
    }

    pub fn profiles(&self) -> &[FeeProfile] {
        &self.profiles
    }

    pub fn get(&self, id: &str) -> UnitEconomicsResult<&FeeProfile> {
        self.profiles
            .iter()
            .find(|p| p.id == id)
            .ok_or_else(|| UnitEconomicsError::UnknownIdentifier {
                kind: "fee profile".into(),
                id: id.into(),
            })
    }

    pub fn multiplier(&self, id: &str) -> UnitEconomicsResult<Rate> {
        self.get(id).map(|p| p.retention_multiplier)
    }
}

impl Default for FeeProfileTable {
    fn default() -> Self {
        Self::builtin()
    }
}

impl TryFrom<Vec<FeeProfile>> for FeeProfileTable {
    type Error = UnitEconomicsError;

    fn try_from(profiles: Vec<FeeProfile>) -> UnitEconomicsResult<Self> {
        Self::new(profiles)
    }
}

impl From<FeeProfileTable> for Vec<FeeProfile> {
    fn from(table: FeeProfileTable) -> Self {
        table.profiles
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
