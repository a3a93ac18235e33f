//! Event timeline resolution
//!
//! Converts life-event calendar dates into month offsets against an explicit
//! valuation date and precomputes per-month cash-flow aggregates for a whole
//! projection horizon. The aggregates are an interval index built from the
//! same activation rules as [`LifeEvent::is_active`], so querying month `m`
//! returns exactly what a fresh scan of the event list at month `m` would.

use chrono::NaiveDate;

use crate::plan::{EventKind, LifeEvent};

/// Per-month cash-flow aggregates over a fixed horizon
#[derive(Debug, Clone)]
pub struct EventTimeline {
    /// Sum of active recurring income deltas, indexed by month offset
    recurring_income: Vec<f64>,

    /// Sum of active recurring expense deltas, indexed by month offset
    recurring_expense: Vec<f64>,

    /// One-time income landing in each month
    one_time_income: Vec<f64>,

    /// One-time expense landing in each month
    one_time_expense: Vec<f64>,
}

impl EventTimeline {
    /// Resolve an event list against a valuation date for months
    /// `0..=horizon_months`
    pub fn resolve(events: &[LifeEvent], valuation_date: NaiveDate, horizon_months: u32) -> Self {
        let len = horizon_months as usize + 1;
        let mut income_edges = vec![0.0; len + 1];
        let mut expense_edges = vec![0.0; len + 1];
        let mut one_time_income = vec![0.0; len];
        let mut one_time_expense = vec![0.0; len];

        for event in events {
            if !event.enabled {
                continue;
            }
            let start = event.start.month_offset(valuation_date) as usize;
            if start >= len {
                continue;
            }

            match event.kind {
                EventKind::OneTimeIncome => one_time_income[start] += event.amount,
                EventKind::OneTimeExpense => one_time_expense[start] += event.amount,
                EventKind::RecurringIncome | EventKind::RecurringExpense => {
                    // Inclusive end: the delta drops out the month after
                    let stop = match event.end {
                        None => len,
                        Some(end) => {
                            let end_offset = end.month_offset(valuation_date) as usize;
                            if end_offset < start {
                                continue;
                            }
                            (end_offset + 1).min(len)
                        }
                    };
                    let delta = event.monthly_amount();
                    let edges = if event.kind == EventKind::RecurringIncome {
                        &mut income_edges
                    } else {
                        &mut expense_edges
                    };
                    edges[start] += delta;
                    edges[stop] -= delta;
                }
            }
        }

        let prefix = |edges: &[f64]| {
            let mut running = 0.0;
            edges[..len]
                .iter()
                .map(|delta| {
                    running += delta;
                    running
                })
                .collect::<Vec<f64>>()
        };

        Self {
            recurring_income: prefix(&income_edges),
            recurring_expense: prefix(&expense_edges),
            one_time_income,
            one_time_expense,
        }
    }

    /// Sum of active recurring income deltas at `month`
    pub fn recurring_income(&self, month: u32) -> f64 {
        self.recurring_income.get(month as usize).copied().unwrap_or(0.0)
    }

    /// Sum of active recurring expense deltas at `month`
    pub fn recurring_expense(&self, month: u32) -> f64 {
        self.recurring_expense.get(month as usize).copied().unwrap_or(0.0)
    }

    /// Net adjustment to the monthly contribution while saving
    pub fn contribution_delta(&self, month: u32) -> f64 {
        self.recurring_income(month) - self.recurring_expense(month)
    }

    /// Net adjustment to the withdrawal need while drawing down
    pub fn need_delta(&self, month: u32) -> f64 {
        self.recurring_expense(month) - self.recurring_income(month)
    }

    /// One-time income landing exactly at `month`
    pub fn one_time_income(&self, month: u32) -> f64 {
        self.one_time_income.get(month as usize).copied().unwrap_or(0.0)
    }

    /// One-time expense landing exactly at `month`
    pub fn one_time_expense(&self, month: u32) -> f64 {
        self.one_time_expense.get(month as usize).copied().unwrap_or(0.0)
    }
}
