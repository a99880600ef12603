use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::UnitEconomicsError;
use crate::types::{
    div_checked, mul_checked, require_churn_pct, with_metadata, ComputationOutput, Percent,
};
use crate::UnitEconomicsResult;

/// Share of the steady-state ceiling treated as "converged".
const CONVERGENCE_SHARE: Decimal = dec!(0.95);

/// Longest horizon the recurrence will simulate: 500 years of months.
pub const MAX_HORIZON_MONTHS: u32 = 6_000;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Input for a month-by-month cohort trajectory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CohortInput {
    pub monthly_new_users: u64,
    /// Monthly churn percentage, 0 <= r < 100
    pub churn_rate_pct: Percent,
    /// Number of months to simulate
    pub horizon_months: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CohortMonth {
    pub month: u32,
    pub active_users: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CohortOutput {
    pub trajectory: Vec<CohortMonth>,
    /// Active users after the final month
    pub final_active_users: u64,
    /// Fixed point of the recurrence, u * (1 - c) / c. Absent without churn.
    pub steady_state_users: Option<Decimal>,
    /// First month at which the trajectory reaches 95% of the steady state
    pub months_to_95pct_steady_state: Option<u32>,
}

// ---------------------------------------------------------------------------
// Core recurrence
// ---------------------------------------------------------------------------

/// Retention factor for one month, 1 - churn / 100.
fn survival(churn_rate_pct: Percent) -> Decimal {
    Decimal::ONE - churn_rate_pct / Decimal::ONE_HUNDRED
}

/// One step of the recurrence: add the month's acquisitions, then charge churn
/// against the whole cohort (including users acquired this month) and round to
/// a whole user.
fn step(active: Decimal, monthly_new_users: Decimal, survival: Decimal) -> Decimal {
    ((active + monthly_new_users) * survival)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
}

fn require_horizon(field: &str, months: u32) -> UnitEconomicsResult<()> {
    if months > MAX_HORIZON_MONTHS {
        return Err(UnitEconomicsError::InvalidInput {
            field: field.into(),
            reason: format!("at most {MAX_HORIZON_MONTHS} months can be simulated, got {months}"),
        });
    }
    Ok(())
}

fn to_users(value: Decimal) -> UnitEconomicsResult<u64> {
    value.to_u64().ok_or_else(|| UnitEconomicsError::InvalidInput {
        field: "monthly_new_users".into(),
        reason: format!("active user count {value} is out of range"),
    })
}

/// Active paid users at `month_offset` after compounding monthly acquisitions
/// against monthly churn from an empty base.
///
/// With zero churn this is exactly `monthly_new_users * month_offset`.
pub fn active_users(
    monthly_new_users: u64,
    churn_rate_pct: Percent,
    month_offset: u32,
) -> UnitEconomicsResult<u64> {
    require_churn_pct("churn_rate_pct", churn_rate_pct)?;
    require_horizon("month_offset", month_offset)?;

    let new_users = Decimal::from(monthly_new_users);
    let keep = survival(churn_rate_pct);
    let mut active = Decimal::ZERO;
    for _ in 0..month_offset {
        active = step(active, new_users, keep);
    }
    to_users(active)
}

/// The full series of active users for months 1..=horizon.
pub fn cohort_trajectory(
    monthly_new_users: u64,
    churn_rate_pct: Percent,
    horizon_months: u32,
) -> UnitEconomicsResult<Vec<u64>> {
    require_churn_pct("churn_rate_pct", churn_rate_pct)?;
    require_horizon("horizon_months", horizon_months)?;

    let new_users = Decimal::from(monthly_new_users);
    let keep = survival(churn_rate_pct);
    let mut active = Decimal::ZERO;
    let mut series = Vec::with_capacity(horizon_months as usize);
    for _ in 0..horizon_months {
        active = step(active, new_users, keep);
        series.push(to_users(active)?);
    }
    Ok(series)
}

/// Ceiling the cohort converges toward: the x solving x = (x + u)(1 - c).
/// Unbounded (None) when churn is zero.
pub fn steady_state_users(
    monthly_new_users: u64,
    churn_rate_pct: Percent,
) -> UnitEconomicsResult<Option<Decimal>> {
    require_churn_pct("churn_rate_pct", churn_rate_pct)?;
    if churn_rate_pct.is_zero() {
        return Ok(None);
    }
    let c = churn_rate_pct / Decimal::ONE_HUNDRED;
    let retained = mul_checked(
        "monthly_new_users",
        Decimal::from(monthly_new_users),
        Decimal::ONE - c,
    )?;
    Ok(Some(div_checked("churn_rate_pct", retained, c)?))
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Month-by-month cohort trajectory with its steady-state ceiling.
pub fn analyze_cohort(input: &CohortInput) -> UnitEconomicsResult<ComputationOutput<CohortOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if input.horizon_months == 0 {
        return Err(UnitEconomicsError::InvalidInput {
            field: "horizon_months".into(),
            reason: "horizon must be at least one month".into(),
        });
    }

    let series = cohort_trajectory(
        input.monthly_new_users,
        input.churn_rate_pct,
        input.horizon_months,
    )?;
    let steady_state = steady_state_users(input.monthly_new_users, input.churn_rate_pct)?;

    let months_to_95pct = steady_state.and_then(|ceiling| {
        let threshold = ceiling * CONVERGENCE_SHARE;
        series
            .iter()
            .position(|&u| Decimal::from(u) >= threshold)
            .map(|i| i as u32 + 1)
    });

    match steady_state {
        None => warnings.push(
            "Zero churn: the cohort grows linearly without a steady-state ceiling".to_string(),
        ),
        Some(_) if months_to_95pct.is_none() && input.monthly_new_users > 0 => {
            warnings.push(format!(
                "Cohort has not reached 95% of its steady state within {} months",
                input.horizon_months
            ))
        }
        Some(_) => {}
    }

    let trajectory: Vec<CohortMonth> = series
        .iter()
        .enumerate()
        .map(|(i, &active_users)| CohortMonth {
            month: i as u32 + 1,
            active_users,
        })
        .collect();
    let final_active_users = series.last().copied().unwrap_or_default();

    log::debug!(
        "cohort: {} new/month at {}% churn -> {} active after {} months",
        input.monthly_new_users,
        input.churn_rate_pct,
        final_active_users,
        input.horizon_months
    );

    let output = CohortOutput {
        trajectory,
        final_active_users,
        steady_state_users: steady_state,
        months_to_95pct_steady_state: months_to_95pct,
    };

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Cohort compounding (acquire, then apply churn, rounded monthly)",
        input,
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_churn_is_linear() {
        assert_eq!(active_users(10, dec!(0), 6).unwrap(), 60);
        for u in [0u64, 1, 7, 250] {
            for m in [1u32, 2, 12, 36] {
                assert_eq!(active_users(u, dec!(0), m).unwrap(), u * m as u64);
            }
        }
    }

    #[test]
    fn test_churn_charged_in_acquisition_month() {
        // 10 added, then * 0.8
        assert_eq!(active_users(10, dec!(20), 1).unwrap(), 8);
    }

    #[test]
    fn test_two_months_with_rounding() {
        // month 1: 10 * 0.8 = 8; month 2: 18 * 0.8 = 14.4 -> 14
        assert_eq!(active_users(10, dec!(20), 2).unwrap(), 14);
    }

    #[test]
    fn test_rounding_half_goes_up() {
        // 5 * 0.9 = 4.5 -> 5
        assert_eq!(active_users(5, dec!(10), 1).unwrap(), 5);
    }

    #[test]
    fn test_month_zero_is_empty() {
        assert_eq!(active_users(10, dec!(5), 0).unwrap(), 0);
    }

    #[test]
    fn test_invalid_churn_rejected() {
        assert!(active_users(10, dec!(100), 3).is_err());
        assert!(active_users(10, dec!(150), 3).is_err());
        assert!(active_users(10, dec!(-0.5), 3).is_err());
    }

    #[test]
    fn test_trajectory_matches_point_queries() {
        let series = cohort_trajectory(20, dec!(5), 12).unwrap();
        for (i, users) in series.iter().enumerate() {
            assert_eq!(*users, active_users(20, dec!(5), i as u32 + 1).unwrap());
        }
    }

    #[test]
    fn test_trajectory_non_decreasing_and_bounded() {
        let series = cohort_trajectory(50, dec!(4), 240).unwrap();
        assert!(series.windows(2).all(|w| w[0] <= w[1]));
        // ceiling = 50 * 0.96 / 0.04 = 1200; monthly rounding settles
        // the series just below it
        let last = *series.last().unwrap();
        assert_eq!(last, 1188);
    }

    #[test]
    fn test_steady_state() {
        assert_eq!(steady_state_users(50, dec!(4)).unwrap(), Some(dec!(1200)));
        assert_eq!(steady_state_users(50, dec!(0)).unwrap(), None);
    }

    #[test]
    fn test_analyze_cohort() {
        let input = CohortInput {
            monthly_new_users: 50,
            churn_rate_pct: dec!(4),
            horizon_months: 120,
        };
        let out = analyze_cohort(&input).unwrap();
        assert_eq!(out.result.trajectory.len(), 120);
        assert_eq!(out.result.trajectory[0].active_users, 48);
        assert_eq!(out.result.steady_state_users, Some(dec!(1200)));
        assert_eq!(out.result.months_to_95pct_steady_state, Some(73));
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn test_analyze_cohort_zero_churn_warns() {
        let input = CohortInput {
            monthly_new_users: 5,
            churn_rate_pct: dec!(0),
            horizon_months: 3,
        };
        let out = analyze_cohort(&input).unwrap();
        assert_eq!(out.result.final_active_users, 15);
        assert_eq!(out.result.steady_state_users, None);
        assert_eq!(out.warnings.len(), 1);
    }

    #[test]
    fn test_analyze_cohort_rejects_empty_horizon() {
        let input = CohortInput {
            monthly_new_users: 5,
            churn_rate_pct: dec!(2),
            horizon_months: 0,
        };
        assert!(analyze_cohort(&input).is_err());
    }

    #[test]
    fn test_horizon_beyond_cap_rejected() {
        assert!(active_users(1, dec!(5), MAX_HORIZON_MONTHS).is_ok());
        assert!(active_users(1, dec!(5), MAX_HORIZON_MONTHS + 1).is_err());
        let input = CohortInput {
            monthly_new_users: 5,
            churn_rate_pct: dec!(2),
            horizon_months: u32::MAX,
        };
        assert!(matches!(
            analyze_cohort(&input),
            Err(UnitEconomicsError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_largest_inputs_stay_in_range() {
        let users = active_users(u64::MAX, dec!(0), MAX_HORIZON_MONTHS);
        assert!(matches!(users, Err(UnitEconomicsError::InvalidInput { .. })));
    }

    #[test]
    fn test_steady_state_overflow_is_an_error() {
        assert!(steady_state_users(u64::MAX, dec!(0.00000000000000000001)).is_err());
    }
}
