//! Withdrawal-strategy state machine
//!
//! The active strategy is fixed for the duration of a decumulation pass.
//! Most strategies are stateless per month; the dynamic strategy carries
//! path-dependent state (the prior year's realized return and the current
//! adjustment factor), re-evaluated at each new-year boundary.

use crate::plan::{DynamicParams, WithdrawalStrategy};

/// Runtime state of the active withdrawal strategy
#[derive(Debug, Clone)]
pub struct StrategyState {
    strategy: WithdrawalStrategy,

    /// Original desired net monthly income
    desired_monthly: f64,

    /// Monthly amount fixed once at retirement (four-percent rule)
    four_pct_monthly: f64,

    /// Current dynamic adjustment factor, bounded by the strategy's bands
    factor: f64,

    /// Return accumulated over the projection year in progress
    year_return: f64,
}

impl StrategyState {
    /// Initialize at the retirement-start instant
    pub fn new(
        strategy: &WithdrawalStrategy,
        desired_monthly: f64,
        balance_at_retirement: f64,
    ) -> Self {
        Self {
            strategy: strategy.clone(),
            desired_monthly,
            four_pct_monthly: balance_at_retirement * 0.04 / 12.0,
            factor: 1.0,
            year_return: 0.0,
        }
    }

    /// Called at the top of each decumulation month (1-based). At the first
    /// month of every year after the first, the dynamic strategy compares
    /// the accumulated prior-year return against its expectation band.
    pub fn on_month_start(&mut self, month_in_decumulation: u32) {
        if month_in_decumulation > 1 && (month_in_decumulation - 1) % 12 == 0 {
            if let WithdrawalStrategy::Dynamic(params) = self.strategy {
                self.evaluate_year(&params);
            }
            self.year_return = 0.0;
        }
    }

    /// Fold in the monthly rate actually applied, so year-boundary
    /// evaluation sees the realized (possibly variable) return
    pub fn record_monthly_return(&mut self, monthly_rate: f64) {
        self.year_return += monthly_rate;
    }

    fn evaluate_year(&mut self, params: &DynamicParams) {
        let expected = params.expected_annual_return_pct / 100.0;
        let tolerance = params.shortfall_tolerance_pct / 100.0;
        let step = params.adjustment_pct / 100.0;
        let cap = params.cap_pct / 100.0;
        let floor = params.floor_pct / 100.0;

        if self.year_return > expected {
            self.factor = (self.factor * (1.0 + step)).min(cap);
        } else if self.year_return < expected - tolerance {
            self.factor = (self.factor * (1.0 - step)).max(floor);
        }
    }

    /// Net withdrawal requested by the strategy for this month, before
    /// event adjustments and affordability clamping
    pub fn net_withdrawal(&self, balance: f64, interest: f64, tax: f64) -> f64 {
        match &self.strategy {
            WithdrawalStrategy::Fixed => self.desired_monthly,
            WithdrawalStrategy::FourPercentRule => self.four_pct_monthly,
            WithdrawalStrategy::PercentOfBalance { annual_pct } => {
                balance.max(0.0) * annual_pct / 100.0 / 12.0
            }
            WithdrawalStrategy::Dynamic(_) => self.desired_monthly * self.factor,
            WithdrawalStrategy::InterestOnly => (interest - tax).max(0.0),
        }
    }

    /// Current dynamic adjustment factor (1.0 for all other strategies)
    pub fn factor(&self) -> f64 {
        self.factor
    }
}
