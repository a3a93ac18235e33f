//! Growth-rate resolution
//!
//! Resolves the effective monthly rate for any month offset: a year-keyed
//! override table when variable rates are enabled and an entry exists for
//! the implied calendar year, otherwise a flat annual rate. The primary
//! engine converts annual percentages to monthly decimals by simple division
//! by twelve; the Monte Carlo driver samples whole-year returns and converts
//! them geometrically instead. That asymmetry is deliberate and both
//! conversions live here.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};

/// Annual-rate source for one projection pass
#[derive(Debug, Clone)]
pub struct RateProvider<'a> {
    valuation_year: i32,
    flat_annual_pct: f64,
    /// Present only when the variable table is enabled
    overrides: Option<&'a BTreeMap<i32, f64>>,
}

impl<'a> RateProvider<'a> {
    pub fn new(
        valuation_date: NaiveDate,
        flat_annual_pct: f64,
        overrides: Option<&'a BTreeMap<i32, f64>>,
    ) -> Self {
        Self {
            valuation_year: valuation_date.year(),
            flat_annual_pct,
            overrides,
        }
    }

    /// Calendar year implied by a month offset from the valuation date
    pub fn year_of(&self, month: u32) -> i32 {
        self.valuation_year + (month / 12) as i32
    }

    /// Annual rate (percent) in effect at the given month offset
    pub fn annual_pct(&self, month: u32) -> f64 {
        let year = self.year_of(month);
        self.overrides
            .and_then(|table| table.get(&year))
            .copied()
            .unwrap_or(self.flat_annual_pct)
    }

    /// Monthly decimal rate for the deterministic engine (annual / 12)
    pub fn monthly_rate(&self, month: u32) -> f64 {
        self.annual_pct(month) / 100.0 / 12.0
    }

    /// Geometric monthly conversion of a whole-year return, used by the
    /// Monte Carlo driver: `(1+a)^(1/12) - 1`
    pub fn geometric_monthly(annual_pct: f64) -> f64 {
        (1.0 + annual_pct / 100.0).powf(1.0 / 12.0) - 1.0
    }
}
