use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::UnitEconomicsError;
use crate::types::Money;
use crate::UnitEconomicsResult;

/// Subscriptions are sold per seat for a fixed billing period.
pub const DEFAULT_BILLING_PERIOD_MONTHS: u32 = 6;

/// Tier whose monthly-equivalent price drives scenario projections.
pub const DEFAULT_REFERENCE_TIER: &str = "solo";

/// (id, seat range, list price per seat per billing period)
const BUILTIN_TIERS: &[(&str, &str, Decimal)] = &[
    ("solo", "1 seat", dec!(79.00)),
    ("squad", "2-10 seats", dec!(69.00)),
    ("club", "11-50 seats", dec!(59.00)),
    ("academy", "51+ seats", dec!(49.00)),
];

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A subscription price point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingTier {
    pub id: String,
    /// Seat-range label, e.g. "2-10 seats"
    pub seat_range: String,
    /// Price per seat for one billing period
    pub list_price: Money,
}

/// A tier with its derived monthly-equivalent price.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TierQuote {
    pub id: String,
    pub seat_range: String,
    pub list_price: Money,
    pub billing_period_months: u32,
    /// list_price / billing_period_months
    pub monthly_equivalent: Money,
}

/// Unvalidated pricing configuration as read from a catalog file.
#[derive(Debug, Clone, Deserialize)]
pub struct PricingConfig {
    #[serde(default = "default_billing_period")]
    pub billing_period_months: u32,
    #[serde(default = "default_reference_tier")]
    pub reference_tier: String,
    pub tiers: Vec<PricingTier>,
}

fn default_billing_period() -> u32 {
    DEFAULT_BILLING_PERIOD_MONTHS
}

fn default_reference_tier() -> String {
    DEFAULT_REFERENCE_TIER.to_string()
}

/// The immutable table of subscription price points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "PricingConfig")]
pub struct PricingReference {
    billing_period_months: u32,
    reference_tier: String,
    tiers: Vec<PricingTier>,
}

impl PricingReference {
    pub fn new(
        billing_period_months: u32,
        reference_tier: impl Into<String>,
        tiers: Vec<PricingTier>,
    ) -> UnitEconomicsResult<Self> {
        let reference_tier = reference_tier.into();

        if billing_period_months == 0 {
            return Err(UnitEconomicsError::InvalidInput {
                field: "pricing.billing_period_months".into(),
                reason: "billing period must be at least one month".into(),
            });
        }

        let mut seen = HashSet::new();
        for t in &tiers {
            if !seen.insert(t.id.as_str()) {
                return Err(UnitEconomicsError::InvalidInput {
                    field: "pricing.tiers".into(),
                    reason: format!("duplicate tier id '{}'", t.id),
                });
            }
            if t.list_price < Decimal::ZERO {
                return Err(UnitEconomicsError::InvalidInput {
                    field: format!("pricing.tiers.{}.list_price", t.id),
                    reason: "list price cannot be negative".into(),
                });
            }
        }

        if !seen.contains(reference_tier.as_str()) {
            return Err(UnitEconomicsError::UnknownIdentifier {
                kind: "pricing tier".into(),
                id: reference_tier,
            });
        }

        Ok(Self {
            billing_period_months,
            reference_tier,
            tiers,
        })
    }

    /// The compiled-in default price list.
    pub fn builtin() -> Self {
        let tiers = BUILTIN_TIERS
            .iter()
            .map(|(id, seats, price)| PricingTier {
                id: (*id).to_string(),
                seat_range: (*seats).to_string(),
                list_price: *price,
            })
            .collect();
        Self {
            billing_period_months: DEFAULT_BILLING_PERIOD_MONTHS,
            reference_tier: DEFAULT_REFERENCE_TIER.to_string(),
            tiers,
        }
    }

    pub fn billing_period_months(&self) -> u32 {
        self.billing_period_months
    }

    pub fn tiers(&self) -> &[PricingTier] {
        &self.tiers
    }

    pub fn tier(&self, id: &str) -> UnitEconomicsResult<&PricingTier> {
        self.tiers
            .iter()
            .find(|t| t.id == id)
            .ok_or_else(|| UnitEconomicsError::UnknownIdentifier {
                kind: "pricing tier".into(),
                id: id.into(),
            })
    }

    pub fn reference_tier(&self) -> &PricingTier {
        // validated on construction
        self.tiers
            .iter()
            .find(|t| t.id == self.reference_tier)
            .unwrap_or_else(|| &self.tiers[0])
    }

    /// List price spread evenly over the months of one billing period.
    pub fn monthly_equivalent(&self, tier: &PricingTier) -> Money {
        tier.list_price / Decimal::from(self.billing_period_months)
    }

    pub fn quote(&self, tier: &PricingTier) -> TierQuote {
        TierQuote {
            id: tier.id.clone(),
            seat_range: tier.seat_range.clone(),
            list_price: tier.list_price,
            billing_period_months: self.billing_period_months,
            monthly_equivalent: self.monthly_equivalent(tier),
        }
    }

    pub fn quotes(&self) -> Vec<TierQuote> {
        self.tiers.iter().map(|t| self.quote(t)).collect()
    }
}

impl Default for PricingReference {
    fn default() -> Self {
        Self::builtin()
    }
}

impl TryFrom<PricingConfig> for PricingReference {
    type Error = UnitEconomicsError;

    fn try_from(raw: PricingConfig) -> UnitEconomicsResult<Self> {
        Self::new(raw.billing_period_months, raw.reference_tier, raw.tiers)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
