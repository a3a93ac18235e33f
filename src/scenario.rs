//! Scenario runner for efficient batch projections
//!
//! Fixes the valuation date once, then allows running many projections -
//! several plans, or one plan under several withdrawal strategies - without
//! re-threading the date through every call. Batches run on rayon's pool.
//!
//! # Example
//! ```ignore
//! let runner = ScenarioRunner::new(valuation_date);
//!
//! // Compare strategies on the same plan
//! let results = runner.run_strategies(&plan, &[
//!     WithdrawalStrategy::Fixed,
//!     WithdrawalStrategy::FourPercentRule,
//! ]);
//! ```

use chrono::NaiveDate;
use rayon::prelude::*;

use crate::montecarlo::{project_monte_carlo, MonteCarloOptions};
use crate::plan::{EngineError, Plan, WithdrawalStrategy};
use crate::projection::{project, Projection};

/// Pre-configured runner for batch projections
#[derive(Debug, Clone)]
pub struct ScenarioRunner {
    valuation_date: NaiveDate,
}

impl ScenarioRunner {
    pub fn new(valuation_date: NaiveDate) -> Self {
        Self { valuation_date }
    }

    /// Run a single deterministic projection
    pub fn run(&self, plan: &Plan) -> Result<Projection, EngineError> {
        project(plan, self.valuation_date)
    }

    /// Run a Monte Carlo projection
    pub fn run_monte_carlo(
        &self,
        plan: &Plan,
        options: &MonteCarloOptions,
    ) -> Result<Projection, EngineError> {
        project_monte_carlo(plan, self.valuation_date, options)
    }

    /// Project many plans in parallel, preserving input order
    pub fn run_batch(&self, plans: &[Plan]) -> Vec<Result<Projection, EngineError>> {
        plans
            .par_iter()
            .map(|plan| project(plan, self.valuation_date))
            .collect()
    }

    /// Project one plan under several withdrawal strategies, in parallel
    pub fn run_strategies(
        &self,
        plan: &Plan,
        strategies: &[WithdrawalStrategy],
    ) -> Vec<Result<Projection, EngineError>> {
        strategies
            .par_iter()
            .map(|strategy| {
                let mut variant = plan.clone();
                variant.strategy = strategy.clone();
                project(&variant, self.valuation_date)
            })
            .collect()
    }

    /// Valuation date every projection in this runner resolves against
    pub fn valuation_date(&self) -> NaiveDate {
        self.valuation_date
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn plan(annual_return_pct: f64) -> Plan {
        Plan {
            current_age: 40.0,
            retirement_start_age: 60.0,
            retirement_end_age: 85.0,
            current_savings: 150_000.0,
            monthly_contribution: 800.0,
            desired_monthly_income: 3_500.0,
            annual_return_pct,
            tax_rate_pct: 25.0,
            strategy: WithdrawalStrategy::Fixed,
            life_events: Vec::new(),
            variable_rates_enabled: false,
            variable_rates: BTreeMap::new(),
            buckets: None,
        }
    }

    fn runner() -> ScenarioRunner {
        ScenarioRunner::new(NaiveDate::from_ymd_opt(2030, 1, 1).unwrap())
    }

    #[test]
    fn test_batch_preserves_order_and_monotonicity() {
        let plans = vec![plan(3.0), plan(4.0), plan(5.0)];
        let results = runner().run_batch(&plans);
        assert_eq!(results.len(), 3);

        let balances: Vec<f64> = results
            .into_iter()
            .map(|r| r.unwrap().balance_at_retirement)
            .collect();
        // higher return rate, higher balance at retirement
        assert!(balances[0] < balances[1]);
        assert!(balances[1] < balances[2]);
    }

    #[test]
    fn test_strategies_only_differ_in_decumulation() {
        let base = plan(5.0);
        let results = runner().run_strategies(
            &base,
            &[
                WithdrawalStrategy::Fixed,
                WithdrawalStrategy::InterestOnly,
                WithdrawalStrategy::PercentOfBalance { annual_pct: 4.0 },
            ],
        );
        assert_eq!(results.len(), 3);

        let projections: Vec<_> = results.into_iter().map(|r| r.unwrap()).collect();
        for p in &projections[1..] {
            assert_eq!(p.balance_at_retirement, projections[0].balance_at_retirement);
        }
    }

    #[test]
    fn test_invalid_plan_surfaces_per_entry() {
        let mut bad = plan(5.0);
        bad.desired_monthly_income = 0.0;
        let results = runner().run_batch(&[plan(5.0), bad]);
        assert!(results[0].is_ok());
        assert!(results[1].is_err());
    }
}
