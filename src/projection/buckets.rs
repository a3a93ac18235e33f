//! Safe/surplus bucket custody during decumulation
//!
//! At retirement the balance is split: the safe bucket is sized to cover the
//! whole gross liability stream discounted at the conservative rate, and the
//! remainder becomes the surplus bucket. Each month both buckets accrue at
//! their own rates; withdrawals, tax, and one-time expenses debit safe first
//! and only then surplus, while one-time income and withdrawal surpluses are
//! credited to the surplus bucket. Invariant: the portfolio balance equals
//! safe + surplus at every sampled instant.

use chrono::NaiveDate;

use crate::plan::BucketConfig;
use crate::rates::RateProvider;

use super::state::SimulationState;

/// Rate custody for the two-bucket split
#[derive(Debug, Clone)]
pub struct BucketAllocator<'a> {
    safe_rates: RateProvider<'a>,
    surplus_rates: RateProvider<'a>,
    grossup: f64,
}

impl<'a> BucketAllocator<'a> {
    /// Build the allocator at the retirement-start instant.
    ///
    /// `gains_ratio` is the unrealized-gains share of the balance at that
    /// instant; the gross-up factor converts the net liability stream into
    /// the gross amount that must be liquidated once tax on gains is due.
    pub fn new(
        config: &'a BucketConfig,
        valuation_date: NaiveDate,
        tax_fraction: f64,
        gains_ratio: f64,
    ) -> Self {
        let denominator = (1.0 - tax_fraction * gains_ratio).max(0.01);
        Self {
            safe_rates: RateProvider::new(
                valuation_date,
                config.safe_annual_pct,
                config.safe_variable_rates.as_ref(),
            ),
            surplus_rates: RateProvider::new(
                valuation_date,
                config.surplus_annual_pct,
                config.surplus_variable_rates.as_ref(),
            ),
            grossup: 1.0 / denominator,
        }
    }

    /// Tax gross-up factor applied to the net liability stream
    pub fn grossup(&self) -> f64 {
        self.grossup
    }

    /// Monthly discount rate of the safe bucket; also the discount rate the
    /// need-stream accumulator uses when buckets are enabled
    pub fn safe_monthly_rate(&self, month: u32) -> f64 {
        self.safe_rates.monthly_rate(month)
    }

    /// Size the two buckets from the pre-computed gross liability stream.
    /// `liabilities[i]` is the gross outflow in decumulation month `i+1`;
    /// `offset_months` is the month offset of the retirement-start instant.
    pub fn split(
        &self,
        balance_at_retirement: f64,
        liabilities: &[f64],
        offset_months: u32,
    ) -> (f64, f64) {
        let mut factor = 1.0;
        let mut pv = 0.0;
        for (i, liability) in liabilities.iter().enumerate() {
            let rate = self.safe_rates.monthly_rate(offset_months + i as u32 + 1);
            if rate > 0.0 {
                factor /= 1.0 + rate;
            }
            pv += liability * factor;
        }
        let safe = pv.min(balance_at_retirement).max(0.0);
        (safe, balance_at_retirement - safe)
    }

    /// Accrue one month of interest on both buckets, returning the total
    pub fn accrue(&self, state: &mut SimulationState, month: u32) -> f64 {
        let safe_interest = state.safe_balance * self.safe_rates.monthly_rate(month);
        let surplus_interest = state.surplus_balance * self.surplus_rates.monthly_rate(month);
        state.safe_balance += safe_interest;
        state.surplus_balance += surplus_interest;
        safe_interest + surplus_interest
    }

    /// Debit an outflow, safe bucket first
    pub fn debit(state: &mut SimulationState, amount: f64) {
        let from_safe = state.safe_balance.min(amount).max(0.0);
        state.safe_balance -= from_safe;
        state.surplus_balance = (state.surplus_balance - (amount - from_safe)).max(0.0);
    }

    /// Credit an inflow to the surplus bucket
    pub fn credit_surplus(state: &mut SimulationState, amount: f64) {
        state.surplus_balance += amount;
    }
}
