use clap::{Parser, Subcommand};
use clinic_finance_report::models::{CashflowProjection, Section};
use clinic_finance_report::service::report::{console_summary, export_projection_csv};
use clinic_finance_report::{create_pool, AppConfig, FinanceService};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::fmt::time::ChronoLocal;

#[derive(Parser, Debug)]
#[command(
    name = "clinic-finance-report",
    version,
    about = "Clinic financial reports: revenue, denials and cash-flow projection"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Full report: every section plus the executive summary
    Report {
        /// Print only, do not write the JSON file
        #[arg(long)]
        no_save: bool,

        /// Directory for the JSON file (overrides FINANCE_REPORT_OUTPUT_DIR)
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Also export the projected months as CSV
        #[arg(long)]
        csv: Option<PathBuf>,
    },
    /// Revenue by origin
    Revenue {
        /// Lookback window in months
        #[arg(short, long)]
        months: Option<u32>,
    },
    /// Denial analysis
    Denials,
    /// Cash-flow projection
    Cashflow {
        /// Months to project
        #[arg(short, long)]
        months: Option<u32>,

        /// Export the projected months as CSV
        #[arg(long)]
        csv: Option<PathBuf>,
    },
}

fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn export_csv(
    section: &Section<CashflowProjection>,
    path: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    match section.ready() {
        Some(projection) => {
            export_projection_csv(projection, path)?;
            info!("projection exported to {}", path.display());
        }
        None => tracing::warn!(
            "no projection to export: {}",
            section.reason().unwrap_or("")
        ),
    }
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logs go to stderr; stdout carries the JSON
    tracing_subscriber::fmt()
        .with_timer(ChronoLocal::new("%Y-%m-%d %H:%M:%S".to_string()))
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = AppConfig::from_env()?;
    info!("Starting with config: {:?}", config);

    if let Command::Report {
        output_dir: Some(dir),
        ..
    } = &cli.command
    {
        config.report.output_dir = dir.clone();
    }

    let pool = create_pool(&config.database);
    let service = FinanceService::new(pool, config.report);

    match cli.command {
        Command::Report { no_save, csv, .. } => {
            let generated = service.generate_full_report(!no_save).await?;
            if let Some(path) = &csv {
                export_csv(&generated.report.cashflow_projection, path)?;
            }
            print_json(&generated.report)?;
            eprintln!("{}", console_summary(&generated.report));
            if let Some(path) = generated.path {
                eprintln!("Report saved to: {}", path.display());
            }
        }
        Command::Revenue { months } => {
            let months = months.unwrap_or(service.config().lookback_months);
            print_json(&service.revenue_by_origin(months).await)?;
        }
        Command::Denials => {
            print_json(&service.analyze_denials().await)?;
        }
        Command::Cashflow { months, csv } => {
            let months = months.unwrap_or(service.config().projection_months);
            let projection = service.project_cash_flow(months).await;
            if let Some(path) = &csv {
                export_csv(&projection, path)?;
            }
            print_json(&projection)?;
        }
    }

    Ok(())
}
