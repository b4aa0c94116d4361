//! Command-line parsing for the sales ingest tool.
//!
//! Argument parsing and command dispatch stay separate from the pipeline and
//! metric code.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use rust_decimal::Decimal;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "salesboard", version, about = "Order-export ingestion and sales metrics")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Ingest every export, persist the combined and canonical tables, and print a run summary.
    Ingest(DirArgs),
    /// Ingest, then print sales metrics.
    Sales(SalesArgs),
    /// Ingest, join purchase costs, then print profit metrics.
    Profit(ProfitArgs),
    /// Manage the purchase-cost lookup.
    #[command(subcommand)]
    Costs(CostsCommand),
}

/// Where exports are read from and artifacts written to.
///
/// Unset flags fall back to `SALESBOARD_INPUT_DIR` / `SALESBOARD_OUTPUT_DIR`,
/// then to the built-in defaults.
#[derive(Debug, Args, Clone, Default)]
pub struct DirArgs {
    /// Directory holding uploaded `.txt` exports.
    #[arg(long, value_name = "DIR")]
    pub input_dir: Option<PathBuf>,

    /// Directory for `combined_raw.tsv`, `canonical.tsv` and `purchase_costs.tsv`.
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Do not pick up `.txt` exports from the current directory.
    #[arg(long)]
    pub no_scan_cwd: bool,
}

/// Date window shared by the metric commands.
#[derive(Debug, Args, Clone, Default)]
pub struct PeriodArgs {
    /// First purchase day to include (YYYY-MM-DD).
    #[arg(long, value_name = "DATE")]
    pub from: Option<NaiveDate>,

    /// Last purchase day to include (YYYY-MM-DD).
    #[arg(long, value_name = "DATE")]
    pub to: Option<NaiveDate>,
}

#[derive(Debug, Args, Clone)]
pub struct SalesArgs {
    #[command(flatten)]
    pub dirs: DirArgs,

    #[command(flatten)]
    pub period: PeriodArgs,

    /// Only orders with this status label (e.g. "Enviado").
    #[arg(long)]
    pub status: Option<String>,

    /// Also print every selected record.
    #[arg(long)]
    pub list: bool,

    /// Also write the metrics as JSON.
    #[arg(long = "export-json", value_name = "JSON")]
    pub export_json: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct ProfitArgs {
    #[command(flatten)]
    pub dirs: DirArgs,

    #[command(flatten)]
    pub period: PeriodArgs,

    /// Also write the metrics as JSON.
    #[arg(long = "export-json", value_name = "JSON")]
    pub export_json: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
pub enum CostsCommand {
    /// Print every recorded purchase cost.
    List(DirArgs),
    /// Record (or replace) the purchase cost of one product.
    Set(SetCostArgs),
    /// Ingest, then list every product in the data with its recorded cost.
    Products(DirArgs),
}

#[derive(Debug, Args, Clone)]
pub struct SetCostArgs {
    #[command(flatten)]
    pub dirs: DirArgs,

    /// Product name exactly as it appears in the exports.
    pub product: String,

    /// Purchase cost per unit (non-negative).
    pub cost: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_costs_set() {
        let cli = Cli::parse_from(["salesboard", "costs", "set", "Caneca Azul", "12.50", "--output-dir", "out"]);
        match cli.command {
            Command::Costs(CostsCommand::Set(args)) => {
                assert_eq!(args.product, "Caneca Azul");
                assert_eq!(args.cost, Decimal::new(1250, 2));
                assert_eq!(args.dirs.output_dir, Some(PathBuf::from("out")));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parses_sales_period() {
        let cli = Cli::parse_from(["salesboard", "sales", "--from", "2024-01-01", "--status", "Enviado", "--list"]);
        match cli.command {
            Command::Sales(args) => {
                assert_eq!(args.period.from, NaiveDate::from_ymd_opt(2024, 1, 1));
                assert_eq!(args.period.to, None);
                assert_eq!(args.status.as_deref(), Some("Enviado"));
                assert!(args.list);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
