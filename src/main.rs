//! Retirement System CLI
//!
//! Command-line interface for running wealth projections

use anyhow::Context;
use chrono::{NaiveDate, Utc};
use clap::Parser;
use retirement_system::plan::loader;
use retirement_system::{
    project, project_monte_carlo, MonteCarloOptions, Plan, WithdrawalStrategy,
};
use std::fs::File;
use std::io::Write;
use std::path::PathBuf;

/// Project a wealth trajectory through retirement
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Plan definition (JSON); a built-in example plan is used when omitted
    #[arg(long)]
    plan: Option<PathBuf>,

    /// Life events to merge into the plan (CSV)
    #[arg(long)]
    events: Option<PathBuf>,

    /// Variable-rate table to merge into the plan (CSV); enables the table
    #[arg(long)]
    rates: Option<PathBuf>,

    /// Valuation date all event dates resolve against (defaults to today)
    #[arg(long)]
    valuation_date: Option<NaiveDate>,

    /// Layer Monte Carlo percentile bands over the deterministic run
    #[arg(long)]
    monte_carlo: bool,

    /// Monte Carlo iterations
    #[arg(long, default_value_t = 500)]
    iterations: usize,

    /// Seed for reproducible Monte Carlo batches
    #[arg(long)]
    seed: Option<u64>,

    /// Where to write the full history CSV
    #[arg(long, default_value = "projection_output.csv")]
    csv_out: PathBuf,
}

fn example_plan() -> Plan {
    Plan {
        current_age: 35.0,
        retirement_start_age: 65.0,
        retirement_end_age: 90.0,
        current_savings: 120_000.0,
        monthly_contribution: 1_200.0,
        desired_monthly_income: 3_500.0,
        annual_return_pct: 5.5,
        tax_rate_pct: 25.0,
        strategy: WithdrawalStrategy::Fixed,
        life_events: Vec::new(),
        variable_rates_enabled: false,
        variable_rates: Default::default(),
        buckets: None,
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    println!("Retirement System v0.1.0");
    println!("========================\n");

    let mut plan = match &args.plan {
        Some(path) => loader::load_plan(path)
            .map_err(|e| anyhow::anyhow!("{e}"))
            .with_context(|| format!("loading plan from {}", path.display()))?,
        None => example_plan(),
    };
    if let Some(path) = &args.events {
        let events = loader::load_events(path).map_err(|e| anyhow::anyhow!("{e}"))?;
        plan.life_events.extend(events);
    }
    if let Some(path) = &args.rates {
        plan.variable_rates = loader::load_rate_table(path).map_err(|e| anyhow::anyhow!("{e}"))?;
        plan.variable_rates_enabled = true;
    }

    // The engine never reads the clock; the boundary supplies the date once
    let valuation_date = args
        .valuation_date
        .unwrap_or_else(|| Utc::now().date_naive());

    println!("Plan:");
    println!("  Ages: {} -> {} -> {}", plan.current_age, plan.retirement_start_age, plan.retirement_end_age);
    println!("  Savings: ${:.2}", plan.current_savings);
    println!("  Contribution: ${:.2}/month", plan.monthly_contribution);
    println!("  Desired income: ${:.2}/month net", plan.desired_monthly_income);
    println!("  Return: {:.2}%  Tax on gains: {:.2}%", plan.annual_return_pct, plan.tax_rate_pct);
    println!("  Strategy: {:?}", plan.strategy);
    println!("  Valuation date: {valuation_date}");
    println!();

    let result = if args.monte_carlo {
        let options = MonteCarloOptions {
            iterations: args.iterations,
            seed: args.seed,
            ..MonteCarloOptions::default()
        };
        project_monte_carlo(&plan, valuation_date, &options)?
    } else {
        project(&plan, valuation_date)?
    };

    println!("History ({} samples):", result.history.len());
    println!(
        "{:>6} {:>7} {:>14} {:>12} {:>12} {:>14} {:>14}",
        "Month", "Age", "Balance", "Contrib", "Withdrawal", "AccumWdraw", "Phase"
    );
    println!("{}", "-".repeat(86));
    for point in result.history.iter().take(24) {
        println!(
            "{:>6} {:>7.2} {:>14.2} {:>12.2} {:>12.2} {:>14.2} {:>14}",
            point.month,
            point.age,
            point.balance,
            point.contribution,
            point.withdrawal,
            point.accumulated_withdrawals,
            format!("{:?}", point.phase),
        );
    }
    if result.history.len() > 24 {
        println!("... ({} more samples)", result.history.len() - 24);
    }

    // Write full history to CSV
    let mut file = File::create(&args.csv_out)
        .with_context(|| format!("creating {}", args.csv_out.display()))?;
    writeln!(
        file,
        "Month,Age,Balance,Contribution,Withdrawal,AccumulatedWithdrawals,Phase,SafeBalance,SurplusBalance"
    )?;
    for point in &result.history {
        writeln!(
            file,
            "{},{:.4},{:.2},{:.2},{:.2},{:.2},{:?},{},{}",
            point.month,
            point.age,
            point.balance,
            point.contribution,
            point.withdrawal,
            point.accumulated_withdrawals,
            point.phase,
            point.safe_balance.map_or(String::new(), |v| format!("{v:.2}")),
            point.surplus_balance.map_or(String::new(), |v| format!("{v:.2}")),
        )?;
    }
    println!("\nFull history written to: {}", args.csv_out.display());

    println!("\nSummary:");
    println!("  Balance at retirement:     ${:>14.2}", result.balance_at_retirement);
    println!("  Balance at end:            ${:>14.2}", result.balance_at_end);
    println!("  Required capital (annuity): ${:>13.2}", result.required_capital_at_retirement);
    println!("  Required for perpetuity:   ${:>14.2}", result.required_capital_perpetuity);
    println!("  Surplus:                   ${:>14.2}", result.surplus);
    println!("  PV of deficit:             ${:>14.2}", result.pv_of_deficit);
    println!("  PV capital preservation:   ${:>14.2}", result.pv_capital_preservation);
    println!("  Initial withdrawal:        ${:>14.2} gross / ${:.2} net",
        result.initial_gross_withdrawal, result.initial_net_withdrawal);
    println!("  Average withdrawal:        ${:>14.2} gross / ${:.2} net",
        result.avg_gross_withdrawal, result.avg_net_withdrawal);
    match result.ran_out_at_age {
        Some(age) => println!("  Funds run out at age:      {age:.1}"),
        None => println!("  Funds last the full horizon"),
    }

    if let Some(range) = &result.monte_carlo {
        println!("\nMonte Carlo range ({} iterations):", range.iterations);
        println!("  Min:    ${:>14.2}", range.min_balance);
        println!("  P25:    ${:>14.2}", range.p25_balance);
        println!("  Median: ${:>14.2}", range.median_balance);
        println!("  P75:    ${:>14.2}", range.p75_balance);
        println!("  Max:    ${:>14.2}", range.max_balance);
    }

    Ok(())
}
