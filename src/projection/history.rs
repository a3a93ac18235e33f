//! Projection output structures

use serde::{Deserialize, Serialize};

/// Which phase a history point was sampled in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Accumulation,
    Decumulation,
}

/// A sampled snapshot of the simulation, appended roughly yearly plus at
/// phase ends and at the moment of depletion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryPoint {
    /// Months since the valuation date
    pub month: u32,

    /// Attained age in fractional years
    pub age: f64,

    /// Portfolio balance after this month's flows
    pub balance: f64,

    /// Contribution applied this month (accumulation phase)
    pub contribution: f64,

    /// Gross withdrawal taken this month (decumulation phase)
    pub withdrawal: f64,

    /// Total gross withdrawals taken so far
    pub accumulated_withdrawals: f64,

    /// Phase tag
    pub phase: Phase,

    /// Safe-bucket balance when buckets are enabled
    #[serde(skip_serializing_if = "Option::is_none")]
    pub safe_balance: Option<f64>,

    /// Surplus-bucket balance when buckets are enabled
    #[serde(skip_serializing_if = "Option::is_none")]
    pub surplus_balance: Option<f64>,
}

/// Percentile bands over Monte Carlo ending balances
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonteCarloRange {
    /// Iterations that contributed to the band
    pub iterations: usize,
    pub min_balance: f64,
    pub p25_balance: f64,
    pub median_balance: f64,
    pub p75_balance: f64,
    pub max_balance: f64,
}

/// Complete result of one projection call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Projection {
    /// Balance at the retirement-start instant
    pub balance_at_retirement: f64,

    /// Cost basis at the retirement-start instant
    pub principal_at_retirement: f64,

    /// Balance at the end of the horizon
    pub balance_at_end: f64,

    /// Age at which funds first ran short, if they ever did
    pub ran_out_at_age: Option<f64>,

    /// Capital at retirement that exactly exhausts over the horizon
    /// (the annuity figure)
    pub required_capital_at_retirement: f64,

    /// Capital whose interest alone sustains the desired income forever
    pub required_capital_perpetuity: f64,

    /// `balance_at_retirement - required_capital_at_retirement`
    pub surplus: f64,

    /// Present value (at the valuation date) of any capital shortfall
    pub pv_of_deficit: f64,

    /// Present value (at the valuation date) of the gap to the perpetuity
    /// target
    pub pv_capital_preservation: f64,

    /// Gross withdrawal in the first decumulation month
    pub initial_gross_withdrawal: f64,

    /// Net withdrawal in the first decumulation month
    pub initial_net_withdrawal: f64,

    /// Mean gross withdrawal across the decumulation phase
    pub avg_gross_withdrawal: f64,

    /// Mean net withdrawal across the decumulation phase
    pub avg_net_withdrawal: f64,

    /// Sampled balance history across both phases
    pub history: Vec<HistoryPoint>,

    /// Present only for Monte Carlo runs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monte_carlo: Option<MonteCarloRange>,
}

impl Projection {
    /// History points belonging to one phase
    pub fn phase_history(&self, phase: Phase) -> impl Iterator<Item = &HistoryPoint> + '_ {
        self.history.iter().filter(move |p| p.phase == phase)
    }

    /// Whether the portfolio survived the full horizon
    pub fn survived(&self) -> bool {
        self.ran_out_at_age.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_serializes_lowercase() {
        let json = serde_json::to_string(&Phase::Accumulation).unwrap();
        assert_eq!(json, "\"accumulation\"");
    }

    #[test]
    fn test_bucket_fields_omitted_when_absent() {
        let point = HistoryPoint {
            month: 12,
            age: 31.0,
            balance: 110_000.0,
            contribution: 1_000.0,
            withdrawal: 0.0,
            accumulated_withdrawals: 0.0,
            phase: Phase::Accumulation,
            safe_balance: None,
            surplus_balance: None,
        };
        let json = serde_json::to_string(&point).unwrap();
        assert!(!json.contains("safe_balance"));
        assert!(!json.contains("surplus_balance"));
    }
}
