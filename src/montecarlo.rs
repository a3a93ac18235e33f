//! Monte Carlo re-simulation for sequence-of-returns risk
//!
//! A single deterministic run cannot capture the risk that the *order* of
//! returns decides portfolio survival. The driver re-runs a simplified
//! decumulation pass many times, each against a fresh year-by-year sequence
//! of Gaussian annual returns clamped to a realistic band, then sorts the
//! ending balances into percentile bands. The median iteration's terminal
//! figures are spliced into an otherwise-standard deterministic result so
//! callers always see the same shape.
//!
//! Iterations are mutually independent and run on rayon's pool. Each draws
//! from its own RNG stream derived from an explicit seed (deterministic
//! mode) or OS entropy (production mode) - one code path, two
//! configurations.

use std::sync::atomic::{AtomicBool, Ordering};

use chrono::NaiveDate;
use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::plan::{EngineError, Plan};
use crate::projection::{project, MonteCarloRange, Projection, StrategyState};
use crate::rates::RateProvider;

/// Tuning knobs for a Monte Carlo batch
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonteCarloOptions {
    /// Number of re-simulations
    pub iterations: usize,

    /// Standard deviation of the sampled annual return, in points
    pub volatility_pct: f64,

    /// Lower clamp for a sampled annual return (percent)
    pub min_annual_pct: f64,

    /// Upper clamp for a sampled annual return (percent)
    pub max_annual_pct: f64,

    /// Explicit seed for reproducible batches; `None` draws from OS entropy
    pub seed: Option<u64>,
}

impl Default for MonteCarloOptions {
    fn default() -> Self {
        Self {
            iterations: 500,
            volatility_pct: 15.0,
            min_annual_pct: -30.0,
            max_annual_pct: 50.0,
            seed: None,
        }
    }
}

impl MonteCarloOptions {
    fn validate(&self) -> Result<(), EngineError> {
        let mut violations = Vec::new();
        if self.iterations == 0 {
            violations.push("monte carlo iterations must be positive".to_string());
        }
        if !self.volatility_pct.is_finite() || self.volatility_pct < 0.0 {
            violations.push("monte carlo volatility must not be negative".to_string());
        }
        if self.min_annual_pct >= self.max_annual_pct {
            violations.push("monte carlo clamp band must be a non-empty range".to_string());
        }
        if violations.is_empty() {
            Ok(())
        } else {
            Err(EngineError::Validation { violations })
        }
    }
}

/// Terminal figures of one iteration
struct IterationOutcome {
    ending_balance: f64,
    ran_out_at_age: Option<f64>,
}

/// Run the deterministic projection, then layer percentile bands over
/// repeated randomized decumulation passes
pub fn project_monte_carlo(
    plan: &Plan,
    valuation_date: NaiveDate,
    options: &MonteCarloOptions,
) -> Result<Projection, EngineError> {
    let cancel = AtomicBool::new(false);
    project_monte_carlo_with_cancel(plan, valuation_date, options, &cancel)
}

/// Same as [`project_monte_carlo`], but checks a cooperative cancellation
/// token between iterations so a pathological batch can be bounded
pub fn project_monte_carlo_with_cancel(
    plan: &Plan,
    valuation_date: NaiveDate,
    options: &MonteCarloOptions,
    cancel: &AtomicBool,
) -> Result<Projection, EngineError> {
    options.validate()?;
    let mut result = project(plan, valuation_date)?;

    let base_seed = options.seed.unwrap_or_else(|| rand::thread_rng().gen());
    debug!(
        "monte carlo: {} iterations over {} months, base seed {}",
        options.iterations,
        plan.decumulation_months(),
        base_seed
    );

    let outcomes: Option<Vec<IterationOutcome>> = (0..options.iterations)
        .into_par_iter()
        .map(|i| {
            if cancel.load(Ordering::Relaxed) {
                return None;
            }
            let mut rng = StdRng::seed_from_u64(base_seed.wrapping_add(i as u64));
            Some(simulate_iteration(
                plan,
                result.balance_at_retirement,
                options,
                &mut rng,
            ))
        })
        .collect();

    let mut outcomes = match outcomes {
        Some(outcomes) => outcomes,
        None => return Err(EngineError::Cancelled),
    };
    outcomes.sort_by(|a, b| a.ending_balance.total_cmp(&b.ending_balance));

    let at = |p: f64| (p * (outcomes.len() - 1) as f64) as usize;
    let median = &outcomes[at(0.50)];
    result.balance_at_end = median.ending_balance;
    result.ran_out_at_age = median.ran_out_at_age;
    result.monte_carlo = Some(MonteCarloRange {
        iterations: outcomes.len(),
        min_balance: outcomes[0].ending_balance,
        p25_balance: outcomes[at(0.25)].ending_balance,
        median_balance: median.ending_balance,
        p75_balance: outcomes[at(0.75)].ending_balance,
        max_balance: outcomes[outcomes.len() - 1].ending_balance,
    });
    Ok(result)
}

/// One simplified decumulation pass: no events, no buckets, the plan's
/// strategy with dynamic re-evaluation at year boundaries, and a
/// geometrically-converted monthly rate per sampled year
fn simulate_iteration(
    plan: &Plan,
    balance_at_retirement: f64,
    options: &MonteCarloOptions,
    rng: &mut StdRng,
) -> IterationOutcome {
    let months = plan.decumulation_months();
    let years = (months + 11) / 12;
    let tax_fraction = plan.tax_fraction();

    let mut strategy = StrategyState::new(
        &plan.strategy,
        plan.desired_monthly_income,
        balance_at_retirement,
    );
    let mut balance = balance_at_retirement;
    let mut ran_out_at_age = None;
    let mut month = 0u32;

    for _ in 0..years {
        let shock: f64 = rng.sample(StandardNormal);
        let annual = (plan.annual_return_pct + options.volatility_pct * shock)
            .clamp(options.min_annual_pct, options.max_annual_pct);
        let monthly_rate = RateProvider::geometric_monthly(annual);

        for _ in 0..12 {
            month += 1;
            if month > months {
                break;
            }
            strategy.on_month_start(month);

            let interest = balance * monthly_rate;
            let tax = interest.max(0.0) * tax_fraction;
            strategy.record_monthly_return(monthly_rate);

            let net = strategy.net_withdrawal(balance, interest, tax).max(0.0);
            let mut gross = net + tax;
            let available = balance + interest;
            if gross > available {
                gross = available.max(0.0);
                if ran_out_at_age.is_none() {
                    ran_out_at_age = Some(plan.retirement_start_age + month as f64 / 12.0);
                }
            }
            balance = (balance + interest - gross).max(0.0);
        }
    }

    IterationOutcome {
        ending_balance: balance,
        ran_out_at_age,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::WithdrawalStrategy;
    use approx::assert_relative_eq;
    use std::collections::BTreeMap;

    fn valuation() -> NaiveDate {
        NaiveDate::from_ymd_opt(2030, 1, 1).unwrap()
    }

    fn plan() -> Plan {
        Plan {
            current_age: 55.0,
            retirement_start_age: 60.0,
            retirement_end_age: 85.0,
            current_savings: 600_000.0,
            monthly_contribution: 1_500.0,
            desired_monthly_income: 3_000.0,
            annual_return_pct: 5.0,
            tax_rate_pct: 25.0,
            strategy: WithdrawalStrategy::Fixed,
            life_events: Vec::new(),
            variable_rates_enabled: false,
            variable_rates: BTreeMap::new(),
            buckets: None,
        }
    }

    fn seeded(iterations: usize) -> MonteCarloOptions {
        MonteCarloOptions {
            iterations,
            seed: Some(42),
            ..MonteCarloOptions::default()
        }
    }

    #[test]
    fn test_percentile_ordering() {
        let result = project_monte_carlo(&plan(), valuation(), &seeded(200)).unwrap();
        let range = result.monte_carlo.expect("range present");

        assert!(range.min_balance <= range.p25_balance);
        assert!(range.p25_balance <= range.median_balance);
        assert!(range.median_balance <= range.p75_balance);
        assert!(range.p75_balance <= range.max_balance);
        assert_relative_eq!(range.median_balance, result.balance_at_end);
        assert_eq!(range.iterations, 200);
    }

    #[test]
    fn test_seeded_runs_reproduce() {
        let a = project_monte_carlo(&plan(), valuation(), &seeded(100)).unwrap();
        let b = project_monte_carlo(&plan(), valuation(), &seeded(100)).unwrap();

        let ra = a.monte_carlo.unwrap();
        let rb = b.monte_carlo.unwrap();
        assert_eq!(ra.median_balance, rb.median_balance);
        assert_eq!(ra.min_balance, rb.min_balance);
        assert_eq!(ra.max_balance, rb.max_balance);
    }

    #[test]
    fn test_zero_volatility_collapses_the_band() {
        let options = MonteCarloOptions {
            iterations: 50,
            volatility_pct: 0.0,
            seed: Some(7),
            ..MonteCarloOptions::default()
        };
        let result = project_monte_carlo(&plan(), valuation(), &options).unwrap();
        let range = result.monte_carlo.unwrap();
        assert_relative_eq!(range.min_balance, range.max_balance);
    }

    #[test]
    fn test_underfunded_plan_reports_ruin_ages() {
        let mut p = plan();
        p.current_savings = 40_000.0;
        p.monthly_contribution = 0.0;
        p.desired_monthly_income = 6_000.0;

        let result = project_monte_carlo(&p, valuation(), &seeded(100)).unwrap();
        let age = result.ran_out_at_age.expect("median path must deplete");
        assert!(age >= p.retirement_start_age);
        assert!(age <= p.retirement_end_age + 1e-9);
    }

    #[test]
    fn test_cancel_token_aborts_batch() {
        let cancel = AtomicBool::new(true);
        let err =
            project_monte_carlo_with_cancel(&plan(), valuation(), &seeded(500), &cancel)
                .unwrap_err();
        assert!(matches!(err, EngineError::Cancelled));
    }

    #[test]
    fn test_invalid_options_rejected() {
        let options = MonteCarloOptions {
            iterations: 0,
            min_annual_pct: 10.0,
            max_annual_pct: -10.0,
            ..MonteCarloOptions::default()
        };
        let err = project_monte_carlo(&plan(), valuation(), &options).unwrap_err();
        match err {
            EngineError::Validation { violations } => assert_eq!(violations.len(), 2),
            other => panic!("unexpected: {other}"),
        }
    }

    #[test]
    fn test_options_deserialize_with_defaults() {
        let options: MonteCarloOptions = serde_json::from_str("{\"iterations\": 25}").unwrap();
        assert_eq!(options.iterations, 25);
        assert_relative_eq!(options.volatility_pct, 15.0);
        assert!(options.seed.is_none());
    }
}
