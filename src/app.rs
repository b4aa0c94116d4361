//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - resolves directories (flags, then environment, then defaults)
//! - triggers the ingest pipeline explicitly
//! - prints metrics, optional record listings and JSON exports
//! - reads and writes the purchase-cost lookup

use std::fs::File;
use std::path::Path;

use clap::Parser;
use serde::Serialize;
use tracing::info;

use crate::cli::{Command, CostsCommand, DirArgs, PeriodArgs, ProfitArgs, SalesArgs, SetCostArgs};
use crate::domain::PipelineConfig;
use crate::error::AppError;
use crate::io::{load_cost_lookup, save_cost_lookup};
use crate::report::SalesFilter;

pub mod pipeline;

/// Entry point for the `salesboard` binary.
pub fn run() -> Result<(), AppError> {
    let cli = crate::cli::Cli::parse();

    match cli.command {
        Command::Ingest(dirs) => handle_ingest(&dirs),
        Command::Sales(args) => handle_sales(args),
        Command::Profit(args) => handle_profit(args),
        Command::Costs(CostsCommand::List(dirs)) => handle_costs_list(&dirs),
        Command::Costs(CostsCommand::Set(args)) => handle_costs_set(args),
        Command::Costs(CostsCommand::Products(dirs)) => handle_costs_products(&dirs),
    }
}

fn handle_ingest(dirs: &DirArgs) -> Result<(), AppError> {
    let config = pipeline_config_from_args(dirs)?;
    let run = pipeline::run(&config)?.into_run()?;
    println!("{}", crate::report::format_run_summary(&run));
    Ok(())
}

fn handle_sales(args: SalesArgs) -> Result<(), AppError> {
    let config = pipeline_config_from_args(&args.dirs)?;
    let run = pipeline::run(&config)?.into_run()?;

    let filter = SalesFilter {
        order_status: args.status.clone(),
        ..filter_from_period(&args.period)
    };
    let summary = crate::report::sales_summary(&run.records, &filter)?;
    println!("{}", crate::report::format_sales_summary(&summary));

    if args.list {
        println!("Records:");
        print!("{}", crate::report::format_record_table(&filter.apply(&run.records)));
    }

    if let Some(path) = &args.export_json {
        write_json(path, &summary)?;
    }
    Ok(())
}

fn handle_profit(args: ProfitArgs) -> Result<(), AppError> {
    let config = pipeline_config_from_args(&args.dirs)?;
    let run = pipeline::run(&config)?.into_run()?;
    let costs = load_cost_lookup(&config.cost_lookup_path())?;

    let summary = crate::report::profit_summary(&run.records, &costs, &filter_from_period(&args.period))?;
    println!("{}", crate::report::format_profit_summary(&summary));

    if let Some(path) = &args.export_json {
        write_json(path, &summary)?;
    }
    Ok(())
}

fn handle_costs_list(dirs: &DirArgs) -> Result<(), AppError> {
    let config = pipeline_config_from_args(dirs)?;
    let costs = load_cost_lookup(&config.cost_lookup_path())?;
    print!("{}", crate::report::format_cost_table(&costs));
    Ok(())
}

fn handle_costs_set(args: SetCostArgs) -> Result<(), AppError> {
    let product = args.product.trim();
    if product.is_empty() {
        return Err(AppError::new(2, "Product name must not be empty."));
    }

    let config = pipeline_config_from_args(&args.dirs)?;
    std::fs::create_dir_all(&config.output_dir).map_err(|e| {
        AppError::new(
            2,
            format!("Failed to create directory '{}': {e}", config.output_dir.display()),
        )
    })?;

    let path = config.cost_lookup_path();
    let mut costs = load_cost_lookup(&path)?;
    costs.insert(product.to_string(), args.cost);
    save_cost_lookup(&path, &costs)?;

    println!("Saved purchase cost for '{product}': {}", crate::report::fmt_money(args.cost));
    Ok(())
}

fn handle_costs_products(dirs: &DirArgs) -> Result<(), AppError> {
    let config = pipeline_config_from_args(dirs)?;
    let run = pipeline::run(&config)?.into_run()?;
    let costs = load_cost_lookup(&config.cost_lookup_path())?;

    let products = crate::report::distinct_products(&run.records);
    print!("{}", crate::report::format_product_costs(&products, &costs));
    Ok(())
}

/// Flags override environment, environment overrides defaults.
pub fn pipeline_config_from_args(dirs: &DirArgs) -> Result<PipelineConfig, AppError> {
    let mut config = PipelineConfig::from_env()?;
    if let Some(dir) = &dirs.input_dir {
        config.input_dir = dir.clone();
    }
    if let Some(dir) = &dirs.output_dir {
        config.output_dir = dir.clone();
    }
    if dirs.no_scan_cwd {
        config.scan_dir = None;
    }
    Ok(config)
}

fn filter_from_period(period: &PeriodArgs) -> SalesFilter {
    SalesFilter {
        from: period.from,
        to: period.to,
        order_status: None,
    }
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create JSON export '{}': {e}", path.display())))?;
    serde_json::to_writer_pretty(file, value)
        .map_err(|e| AppError::new(2, format!("Failed to write JSON export: {e}")))?;
    info!(path = %path.display(), "wrote JSON export");
    Ok(())
}
