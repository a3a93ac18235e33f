//! Life event declarations: one-time and recurring cash-flow adjustments

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Kind of cash-flow adjustment a life event applies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    /// Single deposit into the balance in the start month
    OneTimeIncome,
    /// Single debit from the balance in the start month
    OneTimeExpense,
    /// Monthly income while active (raises contributions, lowers withdrawal need)
    RecurringIncome,
    /// Monthly expense while active (lowers contributions, raises withdrawal need)
    RecurringExpense,
}

impl EventKind {
    pub fn is_recurring(&self) -> bool {
        matches!(self, EventKind::RecurringIncome | EventKind::RecurringExpense)
    }

    pub fn is_income(&self) -> bool {
        matches!(self, EventKind::OneTimeIncome | EventKind::RecurringIncome)
    }
}

/// Calendar month an event starts or ends (day resolution is not modeled)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventDate {
    pub year: i32,

    /// Calendar month, 1-12
    pub month: u32,
}

impl EventDate {
    pub fn new(year: i32, month: u32) -> Self {
        Self { year, month }
    }

    /// Months elapsed from the valuation date, floored at zero.
    /// Dates already in the past collapse to "now".
    pub fn month_offset(&self, valuation_date: NaiveDate) -> u32 {
        let diff = (self.year - valuation_date.year()) * 12 + self.month as i32
            - valuation_date.month() as i32;
        diff.max(0) as u32
    }
}

/// A user-declared cash-flow event with an activation window
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LifeEvent {
    /// Unique event identifier
    pub id: u32,

    /// Display label chosen by the caller
    pub name: String,

    /// What the event does to the cash flow
    pub kind: EventKind,

    /// First month the event is in effect
    pub start: EventDate,

    /// Last month the event is in effect; `None` means active indefinitely
    pub end: Option<EventDate>,

    /// One-time amount (one-time kinds)
    pub amount: f64,

    /// Monthly delta for recurring kinds; `amount` is used when absent
    /// (tolerates partial records from older callers)
    pub monthly_delta: Option<f64>,

    /// Disabled events never affect simulation
    pub enabled: bool,
}

impl LifeEvent {
    /// Create a one-time event landing in `start`
    pub fn one_time(id: u32, name: &str, kind: EventKind, start: EventDate, amount: f64) -> Self {
        Self {
            id,
            name: name.to_string(),
            kind,
            start,
            end: None,
            amount,
            monthly_delta: None,
            enabled: true,
        }
    }

    /// Create a recurring event active from `start` through `end` (inclusive)
    pub fn recurring(
        id: u32,
        name: &str,
        kind: EventKind,
        start: EventDate,
        end: Option<EventDate>,
        monthly_delta: f64,
    ) -> Self {
        Self {
            id,
            name: name.to_string(),
            kind,
            start,
            end,
            amount: monthly_delta,
            monthly_delta: Some(monthly_delta),
            enabled: true,
        }
    }

    /// Monthly cash-flow delta of the event, falling back to the one-time
    /// amount when the dedicated field is absent
    pub fn monthly_amount(&self) -> f64 {
        self.monthly_delta.unwrap_or(self.amount)
    }

    /// Whether the event is in effect at the given month offset
    pub fn is_active(&self, month: u32, valuation_date: NaiveDate) -> bool {
        if !self.enabled {
            return false;
        }
        if month < self.start.month_offset(valuation_date) {
            return false;
        }
        match self.end {
            None => true,
            Some(end) => month <= end.month_offset(valuation_date),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valuation() -> NaiveDate {
        NaiveDate::from_ymd_opt(2030, 1, 1).unwrap()
    }

    #[test]
    fn test_month_offset_floors_past_dates() {
        let past = EventDate::new(2020, 6);
        assert_eq!(past.month_offset(valuation()), 0);

        let future = EventDate::new(2031, 3);
        assert_eq!(future.month_offset(valuation()), 14);

        let same = EventDate::new(2030, 1);
        assert_eq!(same.month_offset(valuation()), 0);
    }

    #[test]
    fn test_activation_window() {
        let event = LifeEvent::recurring(
            1,
            "side income",
            EventKind::RecurringIncome,
            EventDate::new(2030, 7),
            Some(EventDate::new(2031, 6)),
            500.0,
        );

        assert!(!event.is_active(5, valuation()));
        assert!(event.is_active(6, valuation()));
        assert!(event.is_active(17, valuation()));
        assert!(!event.is_active(18, valuation()));
    }

    #[test]
    fn test_open_ended_event_stays_active() {
        let event = LifeEvent::recurring(
            2,
            "pension",
            EventKind::RecurringIncome,
            EventDate::new(2030, 1),
            None,
            1200.0,
        );

        assert!(event.is_active(0, valuation()));
        assert!(event.is_active(600, valuation()));
    }

    #[test]
    fn test_disabled_event_never_active() {
        let mut event = LifeEvent::one_time(
            3,
            "inheritance",
            EventKind::OneTimeIncome,
            EventDate::new(2030, 1),
            50_000.0,
        );
        event.enabled = false;

        assert!(!event.is_active(0, valuation()));
    }

    #[test]
    fn test_monthly_amount_falls_back_to_amount() {
        let mut event = LifeEvent::recurring(
            4,
            "rent",
            EventKind::RecurringExpense,
            EventDate::new(2030, 1),
            None,
            800.0,
        );
        assert_eq!(event.monthly_amount(), 800.0);

        event.monthly_delta = None;
        event.amount = 650.0;
        assert_eq!(event.monthly_amount(), 650.0);
    }
}
