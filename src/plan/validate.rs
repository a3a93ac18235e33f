//! Plan validation: every violated rule is collected before any simulation
//! work begins, and the whole set is surfaced as a single error.

use thiserror::Error;

use super::data::{Plan, WithdrawalStrategy};

/// Errors surfaced by the projection engine
#[derive(Debug, Error)]
pub enum EngineError {
    /// One message per violated validation rule
    #[error("invalid plan: {}", violations.join("; "))]
    Validation { violations: Vec<String> },

    /// A Monte Carlo batch was cancelled before completing
    #[error("projection batch cancelled")]
    Cancelled,
}

/// Validation rules checked against a plan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationRule {
    CurrentAgeOutOfRange,
    RetirementNotAfterCurrentAge,
    HorizonNotAfterRetirement,
    HorizonBeyondTerminalAge,
    DesiredIncomeNotPositive,
    SavingsNegative,
    ContributionNegative,
    ReturnRateOutOfRange,
    TaxRateOutOfRange,
    StrategyPercentOutOfRange,
    DynamicBandsInvalid,
    BucketRateOutOfRange,
    EventMonthInvalid,
    EventAmountNegative,
    EventWindowInverted,
}

impl ValidationRule {
    /// Built-in English message text
    pub fn default_text(&self) -> &'static str {
        match self {
            ValidationRule::CurrentAgeOutOfRange => "current age must be between 0 and 120",
            ValidationRule::RetirementNotAfterCurrentAge => {
                "retirement start age must not precede current age"
            }
            ValidationRule::HorizonNotAfterRetirement => {
                "retirement end age must be greater than retirement start age"
            }
            ValidationRule::HorizonBeyondTerminalAge => {
                "retirement end age must not exceed 130"
            }
            ValidationRule::DesiredIncomeNotPositive => {
                "desired monthly income must be positive"
            }
            ValidationRule::SavingsNegative => "current savings must not be negative",
            ValidationRule::ContributionNegative => {
                "monthly contribution must not be negative"
            }
            ValidationRule::ReturnRateOutOfRange => {
                "annual return rate must be between -50% and 50%"
            }
            ValidationRule::TaxRateOutOfRange => "tax rate must be between 0% and 100%",
            ValidationRule::StrategyPercentOutOfRange => {
                "withdrawal percentage must be between 0% and 100%"
            }
            ValidationRule::DynamicBandsInvalid => {
                "dynamic strategy bands must satisfy floor <= 100 <= cap"
            }
            ValidationRule::BucketRateOutOfRange => {
                "bucket rates must be between -50% and 50%"
            }
            ValidationRule::EventMonthInvalid => "event months must be between 1 and 12",
            ValidationRule::EventAmountNegative => "event amounts must not be negative",
            ValidationRule::EventWindowInverted => "event end date must not precede its start",
        }
    }
}

/// Lookup for validation message text.
///
/// The engine ships an English default; callers wanting localized messages
/// supply their own catalog. Simulation behavior never depends on the
/// catalog, only the wording of the aggregate error.
pub trait MessageCatalog {
    fn message(&self, rule: ValidationRule) -> String;
}

/// Default English message catalog
pub struct EnglishCatalog;

impl MessageCatalog for EnglishCatalog {
    fn message(&self, rule: ValidationRule) -> String {
        rule.default_text().to_string()
    }
}

fn rate_in_band(pct: f64) -> bool {
    pct.is_finite() && (-50.0..=50.0).contains(&pct)
}

/// Validate a plan with the default English messages
pub fn validate(plan: &Plan) -> Result<(), EngineError> {
    validate_with(plan, &EnglishCatalog)
}

/// Validate a plan, resolving message text through the supplied catalog.
/// All rules are checked; nothing short-circuits on the first failure.
pub fn validate_with(plan: &Plan, catalog: &dyn MessageCatalog) -> Result<(), EngineError> {
    let mut broken: Vec<ValidationRule> = Vec::new();

    if !plan.current_age.is_finite() || !(0.0..=120.0).contains(&plan.current_age) {
        broken.push(ValidationRule::CurrentAgeOutOfRange);
    }
    if !(plan.retirement_start_age >= plan.current_age) {
        broken.push(ValidationRule::RetirementNotAfterCurrentAge);
    }
    if !(plan.retirement_end_age > plan.retirement_start_age) {
        broken.push(ValidationRule::HorizonNotAfterRetirement);
    }
    if plan.retirement_end_age > 130.0 {
        broken.push(ValidationRule::HorizonBeyondTerminalAge);
    }
    if !(plan.desired_monthly_income > 0.0) {
        broken.push(ValidationRule::DesiredIncomeNotPositive);
    }
    if plan.current_savings < 0.0 {
        broken.push(ValidationRule::SavingsNegative);
    }
    if plan.monthly_contribution < 0.0 {
        broken.push(ValidationRule::ContributionNegative);
    }
    if !rate_in_band(plan.annual_return_pct) {
        broken.push(ValidationRule::ReturnRateOutOfRange);
    }
    if !plan.tax_rate_pct.is_finite() || !(0.0..=100.0).contains(&plan.tax_rate_pct) {
        broken.push(ValidationRule::TaxRateOutOfRange);
    }

    match &plan.strategy {
        WithdrawalStrategy::PercentOfBalance { annual_pct } => {
            if !annual_pct.is_finite() || !(*annual_pct > 0.0 && *annual_pct <= 100.0) {
                broken.push(ValidationRule::StrategyPercentOutOfRange);
            }
        }
        WithdrawalStrategy::Dynamic(params) => {
            if !(params.floor_pct <= 100.0 && params.cap_pct >= 100.0)
                || !(params.adjustment_pct > 0.0 && params.adjustment_pct < 100.0)
            {
                broken.push(ValidationRule::DynamicBandsInvalid);
            }
        }
        _ => {}
    }

    if let Some(buckets) = &plan.buckets {
        if !rate_in_band(buckets.safe_annual_pct) || !rate_in_band(buckets.surplus_annual_pct) {
            broken.push(ValidationRule::BucketRateOutOfRange);
        }
    }

    let mut event_month_bad = false;
    let mut event_amount_bad = false;
    let mut event_window_bad = false;
    for event in &plan.life_events {
        if !(1..=12).contains(&event.start.month) {
            event_month_bad = true;
        }
        if event.amount < 0.0 || event.monthly_delta.map_or(false, |d| d < 0.0) {
            event_amount_bad = true;
        }
        if let Some(end) = event.end {
            if !(1..=12).contains(&end.month) {
                event_month_bad = true;
            }
            if (end.year, end.month) < (event.start.year, event.start.month) {
                event_window_bad = true;
            }
        }
    }
    if event_month_bad {
        broken.push(ValidationRule::EventMonthInvalid);
    }
    if event_amount_bad {
        broken.push(ValidationRule::EventAmountNegative);
    }
    if event_window_bad {
        broken.push(ValidationRule::EventWindowInverted);
    }

    if broken.is_empty() {
        Ok(())
    } else {
        Err(EngineError::Validation {
            violations: broken.into_iter().map(|r| catalog.message(r)).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::events::{EventDate, EventKind, LifeEvent};
    use std::collections::BTreeMap;

    fn valid_plan() -> Plan {
        Plan {
            current_age: 40.0,
            retirement_start_age: 65.0,
            retirement_end_age: 90.0,
            current_savings: 50_000.0,
            monthly_contribution: 500.0,
            desired_monthly_income: 3_000.0,
            annual_return_pct: 6.0,
            tax_rate_pct: 25.0,
            strategy: WithdrawalStrategy::Fixed,
            life_events: Vec::new(),
            variable_rates_enabled: false,
            variable_rates: BTreeMap::new(),
            buckets: None,
        }
    }

    #[test]
    fn test_valid_plan_passes() {
        assert!(validate(&valid_plan()).is_ok());
    }

    #[test]
    fn test_all_violations_collected() {
        let mut plan = valid_plan();
        plan.current_age = 70.0; // retirement no longer after current age
        plan.desired_monthly_income = 0.0;
        plan.current_savings = -1.0;
        plan.tax_rate_pct = 130.0;

        let err = validate(&plan).unwrap_err();
        match err {
            EngineError::Validation { violations } => {
                assert_eq!(violations.len(), 4);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_display_joins_messages() {
        let mut plan = valid_plan();
        plan.annual_return_pct = 80.0;
        plan.monthly_contribution = -5.0;

        let err = validate(&plan).unwrap_err();
        let text = err.to_string();
        assert!(text.contains("annual return rate"));
        assert!(text.contains("monthly contribution"));
        assert!(text.contains("; "));
    }

    #[test]
    fn test_strategy_percent_bounds() {
        let mut plan = valid_plan();
        plan.strategy = WithdrawalStrategy::PercentOfBalance { annual_pct: 0.0 };
        assert!(validate(&plan).is_err());

        plan.strategy = WithdrawalStrategy::PercentOfBalance { annual_pct: 4.0 };
        assert!(validate(&plan).is_ok());
    }

    #[test]
    fn test_inverted_event_window_rejected() {
        let mut plan = valid_plan();
        let mut event = LifeEvent::recurring(
            1,
            "backwards",
            EventKind::RecurringExpense,
            EventDate::new(2040, 6),
            Some(EventDate::new(2040, 1)),
            100.0,
        );
        event.enabled = true;
        plan.life_events.push(event);
        assert!(validate(&plan).is_err());
    }

    #[test]
    fn test_custom_catalog_overrides_text() {
        struct Terse;
        impl MessageCatalog for Terse {
            fn message(&self, rule: ValidationRule) -> String {
                format!("{rule:?}")
            }
        }

        let mut plan = valid_plan();
        plan.tax_rate_pct = -1.0;
        let err = validate_with(&plan, &Terse).unwrap_err();
        assert!(err.to_string().contains("TaxRateOutOfRange"));
    }
}
