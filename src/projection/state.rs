//! Simulation state tracking for a single projection

use crate::plan::Plan;

/// Mutable state owned by the executing simulator
#[derive(Debug, Clone)]
pub struct SimulationState {
    /// Months elapsed since the valuation date
    pub month: u32,

    /// Attained age in fractional years
    pub age: f64,

    /// Running portfolio balance
    pub balance: f64,

    /// Running cost basis; tracked to estimate the unrealized-gains ratio
    pub principal: f64,

    /// Safe-bucket sub-balance (bucket mode only)
    pub safe_balance: f64,

    /// Surplus-bucket sub-balance (bucket mode only)
    pub surplus_balance: f64,

    /// Total gross withdrawals taken so far
    pub accumulated_gross: f64,

    /// Total net withdrawals taken so far
    pub accumulated_net: f64,

    /// Age at which funds first ran short; set once, never cleared
    pub ran_out_at_age: Option<f64>,
}

impl SimulationState {
    /// Initialize state at the valuation date
    pub fn from_plan(plan: &Plan) -> Self {
        Self {
            month: 0,
            age: plan.current_age,
            balance: plan.current_savings,
            principal: plan.current_savings,
            safe_balance: 0.0,
            surplus_balance: 0.0,
            accumulated_gross: 0.0,
            accumulated_net: 0.0,
            ran_out_at_age: None,
        }
    }

    /// Advance one month
    pub fn advance_month(&mut self) {
        self.month += 1;
        self.age += 1.0 / 12.0;
    }

    /// Record the first month funds fell short of the requested withdrawal
    pub fn mark_depleted(&mut self) {
        if self.ran_out_at_age.is_none() {
            self.ran_out_at_age = Some(self.age);
        }
    }

    /// Unrealized gains as a fraction of the balance, clamped to [0, 1]
    pub fn gains_ratio(&self) -> f64 {
        if self.balance <= 0.0 {
            0.0
        } else {
            ((self.balance - self.principal) / self.balance).clamp(0.0, 1.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::WithdrawalStrategy;
    use std::collections::BTreeMap;

    fn plan() -> Plan {
        Plan {
            current_age: 45.0,
            retirement_start_age: 65.0,
            retirement_end_age: 85.0,
            current_savings: 80_000.0,
            monthly_contribution: 400.0,
            desired_monthly_income: 2_500.0,
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
    fn test_advance_tracks_age() {
        let mut state = SimulationState::from_plan(&plan());
        for _ in 0..24 {
            state.advance_month();
        }
        assert_eq!(state.month, 24);
        assert!((state.age - 47.0).abs() < 1e-9);
    }

    #[test]
    fn test_depletion_marker_set_once() {
        let mut state = SimulationState::from_plan(&plan());
        state.advance_month();
        state.mark_depleted();
        let first = state.ran_out_at_age;

        for _ in 0..12 {
            state.advance_month();
        }
        state.mark_depleted();
        assert_eq!(state.ran_out_at_age, first);
    }

    #[test]
    fn test_gains_ratio_clamped() {
        let mut state = SimulationState::from_plan(&plan());
        state.balance = 100_000.0;
        state.principal = 60_000.0;
        assert!((state.gains_ratio() - 0.4).abs() < 1e-12);

        state.principal = 150_000.0; // under water
        assert_eq!(state.gains_ratio(), 0.0);

        state.balance = 0.0;
        assert_eq!(state.gains_ratio(), 0.0);
    }
}
