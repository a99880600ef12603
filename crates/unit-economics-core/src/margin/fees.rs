use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::Rate;

/// A contractual fee charged as a fixed percentage of the gross sale price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeeToggle {
    /// App-store in-app-purchase commission
    Iap,
    /// Partner revenue share
    Partner,
    /// Finder fee paid to the referring partner
    FinderFee,
}

impl FeeToggle {
    /// Fixed order in which deductions are reported.
    pub const DEDUCTION_ORDER: [FeeToggle; 3] =
        [FeeToggle::Iap, FeeToggle::Partner, FeeToggle::FinderFee];

    pub fn rate(&self) -> Rate {
        match self {
            FeeToggle::Iap => dec!(0.15),
            FeeToggle::Partner => dec!(0.10),
            FeeToggle::FinderFee => dec!(0.10),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            FeeToggle::Iap => "In-app purchase fee",
            FeeToggle::Partner => "Partner fee",
            FeeToggle::FinderFee => "Finder fee",
        }
    }
}

impl fmt::Display for FeeToggle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Independently switchable fee deductions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeToggles {
    #[serde(default)]
    pub iap: bool,
    #[serde(default)]
    pub partner: bool,
    #[serde(default)]
    pub finder_fee: bool,
}

impl FeeToggles {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn all() -> Self {
        Self {
            iap: true,
            partner: true,
            finder_fee: true,
        }
    }

    pub fn is_active(&self, fee: FeeToggle) -> bool {
        match fee {
            FeeToggle::Iap => self.iap,
            FeeToggle::Partner => self.partner,
            FeeToggle::FinderFee => self.finder_fee,
        }
    }

    pub fn set(mut self, fee: FeeToggle, on: bool) -> Self {
        match fee {
            FeeToggle::Iap => self.iap = on,
            FeeToggle::Partner => self.partner = on,
            FeeToggle::FinderFee => self.finder_fee = on,
        }
        self
    }

    /// Active fees in deduction order.
    pub fn active(&self) -> impl Iterator<Item = FeeToggle> + '_ {
        FeeToggle::DEDUCTION_ORDER
            .into_iter()
            .filter(move |f| self.is_active(*f))
    }

    /// Sum of active fee rates. Fees are additive shares of gross.
    pub fn combined_rate(&self) -> Rate {
        self.active().map(|f| f.rate()).sum()
    }

    /// Fraction of gross revenue left after the active fees.
    pub fn retention_multiplier(&self) -> Rate {
        Decimal::ONE - self.combined_rate()
    }
}

impl FromIterator<FeeToggle> for FeeToggles {
    fn from_iter<I: IntoIterator<Item = FeeToggle>>(iter: I) -> Self {
        iter.into_iter()
            .fold(FeeToggles::none(), |acc, fee| acc.set(fee, true))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::FeeProfileTable;

    #[test]
    fn test_combined_rate_is_additive() {
        assert_eq!(FeeToggles::none().combined_rate(), dec!(0));
        assert_eq!(FeeToggles::all().combined_rate(), dec!(0.35));
        let iap_partner: FeeToggles = [FeeToggle::Iap, FeeToggle::Partner].into_iter().collect();
        assert_eq!(iap_partner.combined_rate(), dec!(0.25));
    }

    #[test]
    fn test_collection_order_does_not_matter() {
        let a: FeeToggles = [FeeToggle::Partner, FeeToggle::Iap].into_iter().collect();
        let b: FeeToggles = [FeeToggle::Iap, FeeToggle::Partner].into_iter().collect();
        assert_eq!(a, b);
        let order: Vec<FeeToggle> = a.active().collect();
        assert_eq!(order, vec![FeeToggle::Iap, FeeToggle::Partner]);
    }

    #[test]
    fn test_builtin_profiles_match_toggle_combinations() {
        let table = FeeProfileTable::builtin();
        let cases = [
            ("noFees", FeeToggles::none()),
            ("iapOnly", FeeToggles::none().set(FeeToggle::Iap, true)),
            (
                "iapPartner",
                FeeToggles::none()
                    .set(FeeToggle::Iap, true)
                    .set(FeeToggle::Partner, true),
            ),
            ("allFees", FeeToggles::all()),
        ];
        for (id, toggles) in cases {
            assert_eq!(
                table.multiplier(id).unwrap(),
                toggles.retention_multiplier(),
                "profile {id}"
            );
        }
    }

    #[test]
    fn test_deserialize_partial_toggles() {
        let t: FeeToggles = serde_json::from_str(r#"{"iap": true}"#).unwrap();
        assert!(t.iap);
        assert!(!t.partner);
        assert!(!t.finder_fee);
    }
}
