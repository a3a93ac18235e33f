//! File-based plan loading
//!
//! Whole plans load from JSON; life-event lists and variable-rate tables
//! load from CSV so they can be maintained in a spreadsheet.

use std::collections::BTreeMap;
use std::error::Error;
use std::fs::File;
use std::path::Path;

use super::data::Plan;
use super::events::{EventDate, EventKind, LifeEvent};

/// Load a whole plan from a JSON file
pub fn load_plan(path: &Path) -> Result<Plan, Box<dyn Error>> {
    let file = File::open(path)?;
    let plan = serde_json::from_reader(file)?;
    Ok(plan)
}

/// Load life events from CSV
///
/// Columns: id,name,kind,start_year,start_month,end_year,end_month,amount,monthly_delta,enabled
/// with empty cells for the optional end date and monthly delta.
pub fn load_events(path: &Path) -> Result<Vec<LifeEvent>, Box<dyn Error>> {
    let file = File::open(path)?;
    let mut reader = csv::Reader::from_reader(file);

    let mut events = Vec::new();
    for result in reader.records() {
        let record = result?;

        let id: u32 = record[0].parse()?;
        let name = record[1].to_string();
        let kind = parse_kind(&record[2])?;
        let start = EventDate::new(record[3].parse()?, record[4].parse()?);
        let end = match (opt_field(&record, 5), opt_field(&record, 6)) {
            (Some(year), Some(month)) => Some(EventDate::new(year.parse()?, month.parse()?)),
            _ => None,
        };
        let amount: f64 = record[7].parse()?;
        let monthly_delta = match opt_field(&record, 8) {
            Some(raw) => Some(raw.parse()?),
            None => None,
        };
        let enabled: bool = record[9].parse()?;

        events.push(LifeEvent {
            id,
            name,
            kind,
            start,
            end,
            amount,
            monthly_delta,
            enabled,
        });
    }

    Ok(events)
}

/// Load a variable-rate table from CSV
///
/// Columns: year,annual_pct
pub fn load_rate_table(path: &Path) -> Result<BTreeMap<i32, f64>, Box<dyn Error>> {
    let file = File::open(path)?;
    let mut reader = csv::Reader::from_reader(file);

    let mut table = BTreeMap::new();
    for result in reader.records() {
        let record = result?;
        let year: i32 = record[0].parse()?;
        let rate: f64 = record[1].parse()?;
        table.insert(year, rate);
    }

    Ok(table)
}

fn opt_field<'r>(record: &'r csv::StringRecord, index: usize) -> Option<&'r str> {
    record.get(index).filter(|value| !value.trim().is_empty())
}

fn parse_kind(raw: &str) -> Result<EventKind, Box<dyn Error>> {
    match raw.trim() {
        "one_time_income" => Ok(EventKind::OneTimeIncome),
        "one_time_expense" => Ok(EventKind::OneTimeExpense),
        "recurring_income" => Ok(EventKind::RecurringIncome),
        "recurring_expense" => Ok(EventKind::RecurringExpense),
        other => Err(format!("unknown event kind: {other}").into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;

    fn temp_file(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("retirement_system_{}_{name}", std::process::id()));
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_load_events_with_optional_fields() {
        let csv = "\
id,name,kind,start_year,start_month,end_year,end_month,amount,monthly_delta,enabled
1,inheritance,one_time_income,2035,6,,,50000,,true
2,school fees,recurring_expense,2031,9,2035,6,0,450,true
3,old gym plan,recurring_expense,2030,1,,,120,,false
";
        let path = temp_file("events.csv", csv);
        let events = load_events(&path).unwrap();
        fs::remove_file(&path).ok();

        assert_eq!(events.len(), 3);
        assert_eq!(events[0].kind, EventKind::OneTimeIncome);
        assert!(events[0].end.is_none());
        assert_eq!(events[0].amount, 50_000.0);

        assert_eq!(events[1].end, Some(EventDate::new(2035, 6)));
        assert_eq!(events[1].monthly_delta, Some(450.0));
        // monthly amount falls back to `amount` when the delta is absent
        assert_eq!(events[2].monthly_amount(), 120.0);
        assert!(!events[2].enabled);
    }

    #[test]
    fn test_load_rate_table() {
        let csv = "year,annual_pct\n2030,7.5\n2031,-2.0\n2032,4.25\n";
        let path = temp_file("rates.csv", csv);
        let table = load_rate_table(&path).unwrap();
        fs::remove_file(&path).ok();

        assert_eq!(table.len(), 3);
        assert_eq!(table[&2031], -2.0);
    }

    #[test]
    fn test_unknown_kind_rejected() {
        let csv = "\
id,name,kind,start_year,start_month,end_year,end_month,amount,monthly_delta,enabled
1,x,windfall,2035,6,,,1,,true
";
        let path = temp_file("bad_events.csv", csv);
        let result = load_events(&path);
        fs::remove_file(&path).ok();
        assert!(result.is_err());
    }

    #[test]
    fn test_plan_json_round_trip() {
        let plan = Plan {
            current_age: 35.0,
            retirement_start_age: 62.0,
            retirement_end_age: 88.0,
            current_savings: 40_000.0,
            monthly_contribution: 900.0,
            desired_monthly_income: 2_800.0,
            annual_return_pct: 6.0,
            tax_rate_pct: 26.375,
            strategy: crate::plan::WithdrawalStrategy::FourPercentRule,
            life_events: Vec::new(),
            variable_rates_enabled: false,
            variable_rates: BTreeMap::new(),
            buckets: None,
        };
        let path = temp_file("plan.json", &serde_json::to_string_pretty(&plan).unwrap());
        let loaded = load_plan(&path).unwrap();
        fs::remove_file(&path).ok();

        assert_eq!(loaded.retirement_start_age, 62.0);
        assert_eq!(loaded.strategy, crate::plan::WithdrawalStrategy::FourPercentRule);
    }
}
