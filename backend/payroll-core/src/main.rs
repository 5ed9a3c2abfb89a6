// src/main.rs
use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use std::{fs, path::PathBuf};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use payroll_core::{
    build_export_text, compute_totals, export_file_name, parse_period_id, pick_current_period,
    Clock, Config, Lookup, PayrollApiClient, PayrollError, PayrollRow, PayrollTotals, Period,
    SavePayload, SystemClock,
};

#[derive(Parser, Debug)]
#[command(name = "payroll", version, about = "Biweekly payroll periods, reconciliation and export")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List pay periods around today, marking the current one
    Periods {
        #[arg(long)]
        count: Option<usize>,
    },
    /// Print the current pay period
    Current,
    /// Fetch and reconcile the hours of a period
    Summary {
        /// Period id (YYYY-MM-DD_YYYY-MM-DD); defaults to the current period
        #[arg(long)]
        period: Option<String>,
    },
    /// Write a period's reconciled rows as CSV
    Export {
        #[arg(long)]
        period: Option<String>,
        /// Output directory; defaults to PAYROLL_EXPORT_DIR
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Record hours paid for one employee and save the period
    SaveHours {
        #[arg(long)]
        period: String,
        #[arg(long)]
        employee: String,
        #[arg(long)]
        hours_paid: Decimal,
        #[arg(long)]
        notes: Option<String>,
    },
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn generated_periods(config: &Config, count: usize, clock: &dyn Clock) -> Result<Vec<Period>> {
    let schedule = config
        .schedule()
        .context("PAYROLL_ANCHOR_END_DATE is not a valid date")?;
    Ok(schedule.periods(count, clock)?)
}

/// Explicit `--period` wins; otherwise the current period of the generated list.
fn resolve_period(config: &Config, requested: Option<&str>, clock: &dyn Clock) -> Result<Period> {
    if let Some(id) = requested {
        if parse_period_id(id).is_none() {
            bail!("period id '{}' is not of the form YYYY-MM-DD_YYYY-MM-DD", id);
        }
        return Ok(Period::from_id(id));
    }
    let periods = generated_periods(config, config.period_count, clock)?;
    match pick_current_period(&periods, clock.now()) {
        Some(period) => Ok(period.clone()),
        None => bail!("no pay periods available"),
    }
}

async fn load_rows(client: &PayrollApiClient, period: &Period) -> Result<(Vec<PayrollRow>, String)> {
    match client
        .fetch_summary(&period.id)
        .await
        .with_context(|| format!("fetching payroll summary for {}", period.id))?
    {
        Lookup::Found(summary) => {
            let rows = summary.payroll_rows();
            info!("Loaded {} payroll rows for {}", rows.len(), period.id);
            Ok((rows, summary.global_notes.unwrap_or_default()))
        }
        Lookup::NotFound => {
            warn!("No payroll summary found for period {}", period.id);
            Ok((Vec::new(), String::new()))
        }
    }
}

fn print_rows(period: &Period, rows: &[PayrollRow], totals: &PayrollTotals) {
    println!("{} ({})", period.label, period.id);
    println!(
        "{:<12} {:<24} {:>8} {:>8} {:>8} {:>8} {:>10}  {}",
        "employee", "name", "hours", "rate", "paid", "balance", "cash", "notes"
    );
    for row in rows {
        let rate = row
            .cash_hourly_rate()
            .map(|r| format!("{:.2}", r))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<12} {:<24} {:>8} {:>8} {:>8} {:>8.2} {:>10.2}  {}",
            row.employee_id(),
            row.employee_name(),
            row.total_hours().normalize(),
            rate,
            row.hours_paid().normalize(),
            row.balance(),
            row.cash_paid(),
            row.notes()
        );
    }
    println!(
        "{:<12} {:<24} {:>8} {:>8} {:>8} {:>8.2} {:>10.2}",
        "TOTAL",
        "",
        totals.total_hours.normalize(),
        "",
        totals.total_paid.normalize(),
        totals.total_bal,
        totals.total_cash_paid
    );
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = Config::from_env().context("loading PAYROLL_* configuration")?;
    let clock = SystemClock;
    info!("Payroll tool started at {}", Utc::now());

    match cli.command {
        Command::Periods { count } => {
            let periods = generated_periods(&config, count.unwrap_or(config.period_count), &clock)?;
            let current_id = pick_current_period(&periods, clock.now()).map(|p| p.id.clone());
            for period in &periods {
                let marker = if Some(&period.id) == current_id.as_ref() { "*" } else { " " };
                println!("{} {}  {}", marker, period.id, period.label);
            }
        }
        Command::Current => {
            let period = resolve_period(&config, None, &clock)?;
            println!("{}  {}", period.id, period.label);
        }
        Command::Summary { period } => {
            let period = resolve_period(&config, period.as_deref(), &clock)?;
            let client = PayrollApiClient::from_config(&config)?;
            let (rows, global_notes) = load_rows(&client, &period).await?;
            print_rows(&period, &rows, &compute_totals(&rows));
            if !global_notes.is_empty() {
                println!("\nNotes: {}", global_notes);
            }
        }
        Command::Export { period, out } => {
            let period = resolve_period(&config, period.as_deref(), &clock)?;
            let client = PayrollApiClient::from_config(&config)?;
            let (rows, _) = load_rows(&client, &period).await?;

            let dir = out.unwrap_or_else(|| config.export_dir.clone());
            let path = dir.join(export_file_name(&period));
            fs::write(&path, build_export_text(&rows, &period))
                .map_err(|e| PayrollError::io(e, format!("writing {}", path.display())))?;
            info!("Exported {} rows to {}", rows.len(), path.display());
            println!("{}", path.display());
        }
        Command::SaveHours {
            period,
            employee,
            hours_paid,
            notes,
        } => {
            let period = resolve_period(&config, Some(period.as_str()), &clock)?;
            let client = PayrollApiClient::from_config(&config)?;
            let (mut rows, global_notes) = load_rows(&client, &period).await?;

            let Some(row) = rows.iter_mut().find(|r| r.employee_id() == employee) else {
                bail!("employee {} has no payroll row in {}", employee, period.id);
            };
            row.set_hours_paid(hours_paid);
            if let Some(notes) = notes {
                row.set_notes(notes);
            }
            info!(
                "Employee {} now has {} hours paid, balance {}",
                employee,
                row.hours_paid(),
                row.balance()
            );

            client
                .save(&SavePayload::new(&period.id, &rows, global_notes))
                .await
                .with_context(|| format!("saving payroll for {}", period.id))?;
            print_rows(&period, &rows, &compute_totals(&rows));
        }
    }

    Ok(())
}
