//! Plan data structures: the validated configuration for one projection call

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::events::LifeEvent;

/// Withdrawal strategy governing the decumulation phase
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WithdrawalStrategy {
    /// Constant net withdrawal equal to the desired monthly income
    Fixed,
    /// 1/12 of 4% of the balance at retirement, computed once and held
    FourPercentRule,
    /// A configured annual percentage of the current balance, recomputed
    /// every month so the withdrawal shrinks and grows with the portfolio
    PercentOfBalance {
        /// Annual withdrawal percentage of the running balance
        annual_pct: f64,
    },
    /// Path-dependent: withdrawal is stepped up or down each year based on
    /// the prior year's realized return
    Dynamic(DynamicParams),
    /// Net withdrawal equals this month's after-tax interest exactly
    InterestOnly,
}

/// Tuning constants for the dynamic strategy
///
/// These were fixed numbers in the product this engine models; they are kept
/// configurable here with the historical values as defaults.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DynamicParams {
    /// Annual return (percent) the prior year is measured against
    pub expected_annual_return_pct: f64,

    /// Step size (percent) applied to the withdrawal on adjustment
    pub adjustment_pct: f64,

    /// Ceiling for the withdrawal, as a percent of the original desired income
    pub cap_pct: f64,

    /// Floor for the withdrawal, as a percent of the original desired income
    pub floor_pct: f64,

    /// How many points below expectation the realized return must fall
    /// before the withdrawal is cut
    pub shortfall_tolerance_pct: f64,
}

impl Default for DynamicParams {
    fn default() -> Self {
        Self {
            expected_annual_return_pct: 7.0,
            adjustment_pct: 10.0,
            cap_pct: 120.0,
            floor_pct: 80.0,
            shortfall_tolerance_pct: 5.0,
        }
    }
}

/// Parameters for the optional safe/surplus capital split
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BucketConfig {
    /// Annual rate (percent) earned by the safe bucket
    pub safe_annual_pct: f64,

    /// Annual rate (percent) earned by the surplus bucket
    pub surplus_annual_pct: f64,

    /// Year-keyed overrides for the safe bucket rate
    #[serde(default)]
    pub safe_variable_rates: Option<BTreeMap<i32, f64>>,

    /// Year-keyed overrides for the surplus bucket rate
    #[serde(default)]
    pub surplus_variable_rates: Option<BTreeMap<i32, f64>>,
}

/// Full configuration for one projection call
///
/// Immutable while a projection runs; validated as a whole before any
/// simulation work begins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
    /// Current age in fractional years
    pub current_age: f64,

    /// Age at which decumulation begins
    pub retirement_start_age: f64,

    /// Age at which the projection horizon ends
    pub retirement_end_age: f64,

    /// Savings on hand at the valuation date
    pub current_savings: f64,

    /// Ongoing monthly contribution during accumulation
    pub monthly_contribution: f64,

    /// Desired net monthly income during decumulation
    pub desired_monthly_income: f64,

    /// Flat annual return assumption (percent)
    pub annual_return_pct: f64,

    /// Flat tax rate on investment gains (percent)
    pub tax_rate_pct: f64,

    /// Withdrawal strategy for the decumulation phase
    pub strategy: WithdrawalStrategy,

    /// User-declared cash-flow events
    #[serde(default)]
    pub life_events: Vec<LifeEvent>,

    /// Whether the year-keyed rate table is consulted at all
    #[serde(default)]
    pub variable_rates_enabled: bool,

    /// Calendar year to annual rate override (percent)
    #[serde(default)]
    pub variable_rates: BTreeMap<i32, f64>,

    /// Optional two-bucket capital allocation
    #[serde(default)]
    pub buckets: Option<BucketConfig>,
}

impl Plan {
    /// Number of whole months in the accumulation phase
    pub fn accumulation_months(&self) -> u32 {
        ((self.retirement_start_age - self.current_age) * 12.0).round().max(0.0) as u32
    }

    /// Number of whole months in the decumulation phase
    pub fn decumulation_months(&self) -> u32 {
        ((self.retirement_end_age - self.retirement_start_age) * 12.0)
            .round()
            .max(0.0) as u32
    }

    /// Flat tax rate as a fraction
    pub fn tax_fraction(&self) -> f64 {
        self.tax_rate_pct / 100.0
    }

    /// After-tax monthly rate implied by the flat annual assumption.
    /// Used for discounting the need stream and the perpetuity figure.
    pub fn effective_monthly_rate(&self) -> f64 {
        self.annual_return_pct / 100.0 * (1.0 - self.tax_fraction()) / 12.0
    }

    /// Pre-tax monthly rate implied by the flat annual assumption
    pub fn flat_monthly_rate(&self) -> f64 {
        self.annual_return_pct / 100.0 / 12.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_plan() -> Plan {
        Plan {
            current_age: 30.0,
            retirement_start_age: 50.0,
            retirement_end_age: 70.0,
            current_savings: 100_000.0,
            monthly_contribution: 1_000.0,
            desired_monthly_income: 4_000.0,
            annual_return_pct: 5.0,
            tax_rate_pct: 25.0,
            strategy: WithdrawalStrategy::Fixed,
            life_events: Vec::new(),
            variable_rates_enabled: false,
            variable_rates: BTreeMap::new(),
            buckets: None,
        }
    }

    #[test]
    fn test_phase_lengths() {
        let plan = base_plan();
        assert_eq!(plan.accumulation_months(), 240);
        assert_eq!(plan.decumulation_months(), 240);
    }

    #[test]
    fn test_fractional_ages_round_to_months() {
        let mut plan = base_plan();
        plan.current_age = 30.5;
        plan.retirement_start_age = 50.25;
        assert_eq!(plan.accumulation_months(), 237);
    }

    #[test]
    fn test_effective_rate_nets_out_tax() {
        let plan = base_plan();
        let expected = 0.05 * 0.75 / 12.0;
        assert!((plan.effective_monthly_rate() - expected).abs() < 1e-12);
    }

    #[test]
    fn test_plan_round_trips_through_json() {
        let plan = base_plan();
        let json = serde_json::to_string(&plan).unwrap();
        let back: Plan = serde_json::from_str(&json).unwrap();
        assert_eq!(back.accumulation_months(), plan.accumulation_months());
        assert_eq!(back.strategy, plan.strategy);
    }
}
