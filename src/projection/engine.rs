//! Core projection engine: monthly accumulation and decumulation loops
//!
//! Accumulation compounds the balance from the valuation date to the
//! retirement start; decumulation walks the drawdown horizon applying the
//! active withdrawal strategy, life events, tax on gains, and the optional
//! bucket split, while the present value of the need stream accumulates in
//! the same pass. Depletion never terminates the loop; it is reported as a
//! field of the result.

use chrono::NaiveDate;
use log::debug;

use crate::npv::{PresentValueAccumulator, PvCalculator};
use crate::plan::{validate, validate_with, EngineError, MessageCatalog, Plan};
use crate::rates::RateProvider;
use crate::timeline::EventTimeline;

use super::buckets::BucketAllocator;
use super::history::{HistoryPoint, Phase, Projection};
use super::state::SimulationState;
use super::strategy::StrategyState;

/// Slack for the affordability check so float drift at an exactly-funded
/// horizon does not register as depletion
const AFFORDABILITY_EPS: f64 = 1e-6;

/// Run a validated projection
pub fn project(plan: &Plan, valuation_date: NaiveDate) -> Result<Projection, EngineError> {
    validate(plan)?;
    Ok(ProjectionEngine::new(plan, valuation_date).run())
}

/// Run a validated projection, resolving validation text through `catalog`
pub fn project_with_catalog(
    plan: &Plan,
    valuation_date: NaiveDate,
    catalog: &dyn MessageCatalog,
) -> Result<Projection, EngineError> {
    validate_with(plan, catalog)?;
    Ok(ProjectionEngine::new(plan, valuation_date).run())
}

/// Totals carried out of the decumulation loop
struct DecumulationTotals {
    required_capital: f64,
    initial_gross: f64,
    initial_net: f64,
}

/// Projection engine for a single plan
///
/// Expects an already-validated plan; [`project`] is the validating entry
/// point.
pub struct ProjectionEngine<'a> {
    plan: &'a Plan,
    valuation_date: NaiveDate,
    timeline: EventTimeline,
    rates: RateProvider<'a>,
}

impl<'a> ProjectionEngine<'a> {
    pub fn new(plan: &'a Plan, valuation_date: NaiveDate) -> Self {
        let horizon = plan.accumulation_months() + plan.decumulation_months();
        Self {
            plan,
            valuation_date,
            timeline: EventTimeline::resolve(&plan.life_events, valuation_date, horizon),
            rates: RateProvider::new(
                valuation_date,
                plan.annual_return_pct,
                plan.variable_rates_enabled.then_some(&plan.variable_rates),
            ),
        }
    }

    /// Run both phases and assemble the result
    pub fn run(&self) -> Projection {
        let plan = self.plan;
        let mut state = SimulationState::from_plan(plan);
        let mut history = Vec::new();

        self.accumulate(&mut state, &mut history);
        let balance_at_retirement = state.balance;
        let principal_at_retirement = state.principal;
        debug!(
            "accumulation complete: balance {:.2}, principal {:.2}",
            balance_at_retirement, principal_at_retirement
        );

        let totals = self.decumulate(&mut state, &mut history);

        let months_dec = plan.decumulation_months();
        let effective_rate = plan.effective_monthly_rate();
        let required_capital_perpetuity =
            PvCalculator::perpetuity(plan.desired_monthly_income, effective_rate);
        let surplus = balance_at_retirement - totals.required_capital;

        let accumulation_rate = plan.flat_monthly_rate();
        let months_accum = plan.accumulation_months();
        let pv_of_deficit = if surplus < 0.0 {
            PvCalculator::discount(-surplus, accumulation_rate, months_accum)
        } else {
            0.0
        };
        let preservation_gap = required_capital_perpetuity - balance_at_retirement;
        let pv_capital_preservation = if preservation_gap > 0.0 {
            PvCalculator::discount(preservation_gap, accumulation_rate, months_accum)
        } else {
            0.0
        };

        let divisor = months_dec.max(1) as f64;
        Projection {
            balance_at_retirement,
            principal_at_retirement,
            balance_at_end: state.balance,
            ran_out_at_age: state.ran_out_at_age,
            required_capital_at_retirement: totals.required_capital,
            required_capital_perpetuity,
            surplus,
            pv_of_deficit,
            pv_capital_preservation,
            initial_gross_withdrawal: totals.initial_gross,
            initial_net_withdrawal: totals.initial_net,
            avg_gross_withdrawal: state.accumulated_gross / divisor,
            avg_net_withdrawal: state.accumulated_net / divisor,
            history,
            monte_carlo: None,
        }
    }

    /// Savings phase: month 0 up to the retirement start
    fn accumulate(&self, state: &mut SimulationState, history: &mut Vec<HistoryPoint>) {
        let plan = self.plan;
        let months = plan.accumulation_months();

        history.push(Self::sample(state, Phase::Accumulation, 0.0, 0.0, false));

        for _ in 0..months {
            state.advance_month();
            let month = state.month;

            // One-time events post before interest, so they compound this month
            let windfall = self.timeline.one_time_income(month);
            state.balance += windfall;
            state.principal += windfall;
            let outlay = self.timeline.one_time_expense(month).min(state.balance);
            state.balance -= outlay;
            state.principal = (state.principal - outlay).max(0.0);

            let interest = state.balance * self.rates.monthly_rate(month);
            state.balance += interest;

            let contribution = plan.monthly_contribution + self.timeline.contribution_delta(month);
            state.balance = (state.balance + contribution).max(0.0);
            state.principal = (state.principal + contribution).max(0.0);

            // accumulation starts at the valuation date, so the month offset
            // doubles as the month-in-phase
            if month % 12 == 0 || month == months {
                history.push(Self::sample(state, Phase::Accumulation, contribution, 0.0, false));
            }
        }
    }

    /// Drawdown phase: retirement start to the end of the horizon
    fn decumulate(
        &self,
        state: &mut SimulationState,
        history: &mut Vec<HistoryPoint>,
    ) -> DecumulationTotals {
        let plan = self.plan;
        let offset = plan.accumulation_months();
        let months = plan.decumulation_months();
        let tax_fraction = plan.tax_fraction();

        let mut strategy =
            StrategyState::new(&plan.strategy, plan.desired_monthly_income, state.balance);

        let allocator = plan.buckets.as_ref().map(|config| {
            BucketAllocator::new(config, self.valuation_date, tax_fraction, state.gains_ratio())
        });
        if let Some(allocator) = &allocator {
            let liabilities = self.gross_liabilities(allocator.grossup());
            let (safe, surplus) = allocator.split(state.balance, &liabilities, offset);
            state.safe_balance = safe;
            state.surplus_balance = surplus;
            debug!("bucket split: safe {:.2}, surplus {:.2}", safe, surplus);
        }

        let base_discount_rate = plan.effective_monthly_rate();
        let mut need_pv = PresentValueAccumulator::new(base_discount_rate);

        let mut totals = DecumulationTotals {
            required_capital: 0.0,
            initial_gross: 0.0,
            initial_net: 0.0,
        };

        for m in 1..=months {
            state.advance_month();
            let month = state.month;
            let was_depleted = state.ran_out_at_age.is_some();

            strategy.on_month_start(m);

            // One-time events first, through the bucket custody chain
            let windfall = self.timeline.one_time_income(month);
            state.balance += windfall;
            if allocator.is_some() {
                BucketAllocator::credit_surplus(state, windfall);
            }
            let outlay = self.timeline.one_time_expense(month).min(state.balance);
            state.balance -= outlay;
            if allocator.is_some() {
                BucketAllocator::debit(state, outlay);
            }

            // Interest accrues on the post-event balance; buckets each at
            // their own rate
            let (interest, realized_rate) = match &allocator {
                Some(allocator) => {
                    let pre_balance = state.balance;
                    let interest = allocator.accrue(state, month);
                    let rate = if pre_balance > 0.0 {
                        interest / pre_balance
                    } else {
                        0.0
                    };
                    (interest, rate)
                }
                None => {
                    let rate = self.rates.monthly_rate(month);
                    (state.balance * rate, rate)
                }
            };
            let tax = interest.max(0.0) * tax_fraction;
            strategy.record_monthly_return(realized_rate);

            // Withdrawal need: strategy amount plus active recurring deltas,
            // recomputed fresh every month
            let need_delta = self.timeline.need_delta(month);
            let mut net = strategy.net_withdrawal(state.balance, interest, tax) + need_delta;
            if net < 0.0 {
                // Income events exceed the need; the excess is saved
                let excess = -net;
                net = 0.0;
                state.balance += excess;
                if allocator.is_some() {
                    BucketAllocator::credit_surplus(state, excess);
                }
            }

            let mut gross = net + tax;
            let available = state.balance + interest;
            if gross > available + AFFORDABILITY_EPS {
                gross = available.max(0.0);
                net = (gross - tax).max(0.0);
                state.mark_depleted();
            }

            state.balance = state.balance + interest - gross;
            if state.balance < AFFORDABILITY_EPS {
                state.balance = 0.0;
            }
            if allocator.is_some() {
                BucketAllocator::debit(state, gross);
            }

            state.accumulated_gross += gross;
            state.accumulated_net += net;
            if m == 1 {
                totals.initial_gross = gross;
                totals.initial_net = net;
            }

            // Need stream for the annuity figure, discounted to the
            // retirement-start instant
            let need_this_month = plan.desired_monthly_income + need_delta
                + self.timeline.one_time_expense(month)
                - self.timeline.one_time_income(month);
            match &allocator {
                Some(allocator) => need_pv.push_at(need_this_month, allocator.safe_monthly_rate(month)),
                None => need_pv.push(need_this_month),
            }

            let newly_depleted = state.ran_out_at_age.is_some() && !was_depleted;
            if m % 12 == 0 || m == months || newly_depleted {
                history.push(Self::sample(
                    state,
                    Phase::Decumulation,
                    0.0,
                    gross,
                    allocator.is_some(),
                ));
            }
        }

        totals.required_capital = need_pv.total();
        totals
    }

    /// Gross liability stream for the bucket pre-pass: the monthly need,
    /// grossed up for tax on gains
    fn gross_liabilities(&self, grossup: f64) -> Vec<f64> {
        let plan = self.plan;
        let offset = plan.accumulation_months();
        (1..=plan.decumulation_months())
            .map(|m| {
                let month = offset + m;
                let need = plan.desired_monthly_income + self.timeline.need_delta(month)
                    + self.timeline.one_time_expense(month)
                    - self.timeline.one_time_income(month);
                need.max(0.0) * grossup
            })
            .collect()
    }

    fn sample(
        state: &SimulationState,
        phase: Phase,
        contribution: f64,
        withdrawal: f64,
        buckets: bool,
    ) -> HistoryPoint {
        HistoryPoint {
            month: state.month,
            age: state.age,
            balance: state.balance,
            contribution,
            withdrawal,
            accumulated_withdrawals: state.accumulated_gross,
            phase,
            safe_balance: buckets.then_some(state.safe_balance),
            surplus_balance: buckets.then_some(state.surplus_balance),
        }
    }
}
