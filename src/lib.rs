//! Retirement System - wealth projection engine for savings and drawdown planning
//!
//! This library provides:
//! - Month-by-month accumulation and decumulation projections
//! - Interchangeable withdrawal strategies (fixed, 4% rule, percent-of-balance,
//!   dynamic, interest-only)
//! - Life-event timelines (one-time and recurring cash flows with date windows)
//! - Year-keyed variable rate overrides and an optional safe/surplus bucket split
//! - Annuity and perpetuity capital requirements computed in the same pass
//! - Monte Carlo percentile ranges for sequence-of-returns risk

pub mod montecarlo;
pub mod npv;
pub mod plan;
pub mod projection;
pub mod rates;
pub mod scenario;
pub mod timeline;

// Re-export commonly used types
pub use montecarlo::{project_monte_carlo, MonteCarloOptions};
pub use plan::{EngineError, LifeEvent, Plan, WithdrawalStrategy};
pub use projection::{project, HistoryPoint, Projection, ProjectionEngine};
pub use scenario::ScenarioRunner;
