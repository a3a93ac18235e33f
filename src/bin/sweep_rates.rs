//! Sensitivity sweep over return rates and withdrawal strategies
//!
//! Projects the same plan across a grid of annual return assumptions and
//! strategies, in parallel, and writes the summary grid to CSV for
//! comparison in a spreadsheet.

use chrono::{NaiveDate, Utc};
use clap::Parser;
use rayon::prelude::*;
use retirement_system::plan::loader;
use retirement_system::{
    plan::DynamicParams, Plan, ScenarioRunner, WithdrawalStrategy,
};
use std::fs::File;
use std::io::Write;
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Plan definition (JSON); a built-in example plan is used when omitted
    #[arg(long)]
    plan: Option<PathBuf>,

    /// Valuation date (defaults to today)
    #[arg(long)]
    valuation_date: Option<NaiveDate>,

    /// Lowest annual return to sweep (percent)
    #[arg(long, default_value_t = 2.0)]
    min_rate: f64,

    /// Highest annual return to sweep (percent)
    #[arg(long, default_value_t = 9.0)]
    max_rate: f64,

    /// Sweep step (points)
    #[arg(long, default_value_t = 1.0)]
    step: f64,

    /// Output CSV path
    #[arg(long, default_value = "sweep_output.csv")]
    csv_out: PathBuf,
}

fn example_plan() -> Plan {
    Plan {
        current_age: 40.0,
        retirement_start_age: 65.0,
        retirement_end_age: 90.0,
        current_savings: 150_000.0,
        monthly_contribution: 1_000.0,
        desired_monthly_income: 3_200.0,
        annual_return_pct: 5.0,
        tax_rate_pct: 25.0,
        strategy: WithdrawalStrategy::Fixed,
        life_events: Vec::new(),
        variable_rates_enabled: false,
        variable_rates: Default::default(),
        buckets: None,
    }
}

fn strategy_label(strategy: &WithdrawalStrategy) -> &'static str {
    match strategy {
        WithdrawalStrategy::Fixed => "fixed",
        WithdrawalStrategy::FourPercentRule => "four_percent",
        WithdrawalStrategy::PercentOfBalance { .. } => "percent_of_balance",
        WithdrawalStrategy::Dynamic(_) => "dynamic",
        WithdrawalStrategy::InterestOnly => "interest_only",
    }
}

struct SweepRow {
    annual_return_pct: f64,
    strategy: &'static str,
    balance_at_retirement: f64,
    balance_at_end: f64,
    required_capital: f64,
    surplus: f64,
    ran_out_at_age: Option<f64>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();
    let start = Instant::now();

    let base_plan = match &args.plan {
        Some(path) => loader::load_plan(path).map_err(|e| anyhow::anyhow!("{e}"))?,
        None => example_plan(),
    };
    let valuation_date = args
        .valuation_date
        .unwrap_or_else(|| Utc::now().date_naive());
    let runner = ScenarioRunner::new(valuation_date);

    let strategies = [
        WithdrawalStrategy::Fixed,
        WithdrawalStrategy::FourPercentRule,
        WithdrawalStrategy::PercentOfBalance { annual_pct: 4.0 },
        WithdrawalStrategy::Dynamic(DynamicParams::default()),
        WithdrawalStrategy::InterestOnly,
    ];

    let mut rates = Vec::new();
    let mut rate = args.min_rate;
    while rate <= args.max_rate + 1e-9 {
        rates.push(rate);
        rate += args.step;
    }

    let grid: Vec<(f64, WithdrawalStrategy)> = rates
        .iter()
        .flat_map(|&rate| strategies.iter().map(move |s| (rate, s.clone())))
        .collect();

    println!(
        "Sweeping {} rate/strategy combinations from {}...",
        grid.len(),
        valuation_date
    );

    let rows: Vec<SweepRow> = grid
        .par_iter()
        .map(|(rate, strategy)| {
            let mut plan = base_plan.clone();
            plan.annual_return_pct = *rate;
            plan.strategy = strategy.clone();
            let result = runner.run(&plan).expect("swept plan must validate");
            SweepRow {
                annual_return_pct: *rate,
                strategy: strategy_label(strategy),
                balance_at_retirement: result.balance_at_retirement,
                balance_at_end: result.balance_at_end,
                required_capital: result.required_capital_at_retirement,
                surplus: result.surplus,
                ran_out_at_age: result.ran_out_at_age,
            }
        })
        .collect();

    let mut file = File::create(&args.csv_out)?;
    writeln!(
        file,
        "AnnualReturnPct,Strategy,BalanceAtRetirement,BalanceAtEnd,RequiredCapital,Surplus,RanOutAtAge"
    )?;
    for row in &rows {
        writeln!(
            file,
            "{:.2},{},{:.2},{:.2},{:.2},{:.2},{}",
            row.annual_return_pct,
            row.strategy,
            row.balance_at_retirement,
            row.balance_at_end,
            row.required_capital,
            row.surplus,
            row.ran_out_at_age
                .map_or(String::new(), |age| format!("{age:.2}")),
        )?;
    }

    println!(
        "{:>6} {:>20} {:>16} {:>16} {:>16} {:>10}",
        "Rate", "Strategy", "AtRetirement", "AtEnd", "Required", "RanOut"
    );
    println!("{}", "-".repeat(92));
    for row in &rows {
        println!(
            "{:>5.1}% {:>20} {:>16.0} {:>16.0} {:>16.0} {:>10}",
            row.annual_return_pct,
            row.strategy,
            row.balance_at_retirement,
            row.balance_at_end,
            row.required_capital,
            row.ran_out_at_age
                .map_or(String::from("-"), |age| format!("{age:.1}")),
        );
    }

    println!(
        "\n{} rows written to {} in {:?}",
        rows.len(),
        args.csv_out.display(),
        start.elapsed()
    );
    Ok(())
}
