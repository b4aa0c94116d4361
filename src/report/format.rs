//! Formatted terminal output.
//!
//! Kept apart from the metric code so output changes stay localized.

use rust_decimal::Decimal;

use crate::app::pipeline::PipelineRun;
use crate::domain::{CanonicalRecord, Column, CostLookup};
use crate::report::{LabelCount, ProductProfit, ProfitSummary, SalesSummary};

/// Summary of one pipeline run: inputs, rejects, artifacts.
pub fn format_run_summary(run: &PipelineRun) -> String {
    let mut out = String::new();

    out.push_str("=== salesboard - ingest ===\n");
    out.push_str(&format!("Files read: {}\n", run.files_read.len()));
    for path in &run.files_read {
        out.push_str(&format!("  {}\n", path.display()));
    }
    if !run.file_errors.is_empty() {
        out.push_str(&format!("Files skipped: {}\n", run.file_errors.len()));
        for err in &run.file_errors {
            out.push_str(&format!("  {err}\n"));
        }
    }

    out.push_str(&format!(
        "Rows: raw={} | rejected={} | superseded={} | orders={}\n",
        run.raw_rows,
        run.row_errors.len(),
        run.superseded,
        run.records.len()
    ));
    for err in &run.row_errors {
        out.push_str(&format!("  rejected {err}\n"));
    }

    out.push_str(&format!("Raw data saved to: {}\n", run.combined_path.display()));
    out.push_str(&format!("Canonical data saved to: {}\n", run.canonical_path.display()));
    out
}

pub fn format_sales_summary(summary: &SalesSummary) -> String {
    let mut out = String::new();

    out.push_str("=== salesboard - sales ===\n");
    match (summary.first_day, summary.last_day) {
        (Some(first), Some(last)) => out.push_str(&format!("Period: {first} .. {last}\n")),
        _ => out.push_str("Period: -\n"),
    }
    out.push_str(&format!("Orders: {}\n", summary.orders));
    out.push_str(&format!("Total sales: {}\n", fmt_money(summary.total_sales)));
    out.push_str(&format!("Mean order value: {}\n", fmt_opt_money(summary.mean_order_value)));
    out.push_str(&format!("Mean daily revenue: {}\n", fmt_opt_money(summary.mean_daily_revenue)));

    out.push_str("\nDaily sales:\n");
    for day in &summary.daily {
        out.push_str(&format!("  {}  {:>16}\n", day.date, fmt_money(day.total)));
    }

    out.push_str("\nOrder status:\n");
    out.push_str(&format_counts(&summary.status_counts));

    out.push_str("\nTop products (by orders):\n");
    out.push_str(&format_counts(&summary.top_products));
    out
}

pub fn format_profit_summary(summary: &ProfitSummary) -> String {
    let mut out = String::new();

    out.push_str("=== salesboard - profit ===\n");
    out.push_str(&format!(
        "Lines: {} ({} without a purchase cost)\n",
        summary.lines, summary.lines_without_cost
    ));
    out.push_str(&format!("Total profit: {}\n", fmt_money(summary.total_profit)));
    out.push_str(&format!("Mean profit per sale: {}\n", fmt_opt_money(summary.mean_profit)));
    out.push_str(&format!("Mean margin: {}\n", fmt_opt_pct(summary.mean_margin_pct)));

    out.push_str("\nDaily profit:\n");
    for day in &summary.daily {
        out.push_str(&format!("  {}  {:>16}\n", day.date, fmt_money(day.total)));
    }

    out.push_str("\nProducts by total profit:\n");
    out.push_str(&format_product_table(&summary.products));
    out
}

fn format_product_table(products: &[ProductProfit]) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:<32} {:>16} {:>14} {:>14} {:>14} {:>5} {:>9}\n",
        "product", "total profit", "mean profit", "mean price", "cost", "qty", "margin"
    ));
    for p in products {
        out.push_str(&format!(
            "{:<32} {:>16} {:>14} {:>14} {:>14} {:>5} {:>9}\n",
            truncate(&p.product, 32),
            fmt_opt_money(p.total_profit),
            fmt_opt_money(p.mean_profit),
            fmt_opt_money(p.mean_price),
            fmt_opt_money(p.cost),
            p.quantity,
            fmt_opt_pct(p.margin_pct),
        ));
    }
    out
}

const DETAIL_COLUMNS: [(Column, usize); 7] = [
    (Column::OrderId, 20),
    (Column::PurchaseDate, 19),
    (Column::OrderStatus, 10),
    (Column::ProductName, 32),
    (Column::ItemPrice, 12),
    (Column::ShipState, 8),
    (Column::PaymentMethod, 18),
];

/// Detail table of individual records, one line each; `-` marks absent values.
pub fn format_record_table(records: &[&CanonicalRecord]) -> String {
    if records.is_empty() {
        return "No records in the selected period.\n".to_string();
    }

    let mut out = String::new();
    let header: Vec<String> = DETAIL_COLUMNS
        .iter()
        .map(|&(column, width)| format!("{:<width$}", column.header_name()))
        .collect();
    out.push_str(header.join(" ").trim_end());
    out.push('\n');

    for record in records {
        let cells: Vec<String> = DETAIL_COLUMNS
            .iter()
            .map(|&(column, width)| {
                let value = record.display_value(column).unwrap_or_else(|| "-".to_string());
                format!("{:<width$}", truncate(&value, width))
            })
            .collect();
        out.push_str(cells.join(" ").trim_end());
        out.push('\n');
    }
    out
}

/// Registered purchase costs.
pub fn format_cost_table(costs: &CostLookup) -> String {
    if costs.is_empty() {
        return "No purchase costs recorded.\n".to_string();
    }
    let mut out = String::new();
    for (product, cost) in costs {
        out.push_str(&format!("{:<48} {:>14}\n", truncate(product, 48), fmt_money(*cost)));
    }
    out
}

/// Products seen in the sales data alongside their cost (`-` when unknown).
pub fn format_product_costs(products: &[String], costs: &CostLookup) -> String {
    if products.is_empty() {
        return "No products found in the data.\n".to_string();
    }
    let mut out = String::new();
    for product in products {
        out.push_str(&format!(
            "{:<48} {:>14}\n",
            truncate(product, 48),
            fmt_opt_money(costs.get(product).copied())
        ));
    }
    out
}

fn format_counts(counts: &[LabelCount]) -> String {
    if counts.is_empty() {
        return "  -\n".to_string();
    }
    counts
        .iter()
        .map(|c| format!("  {:<40} {:>6}\n", truncate(&c.label, 40), c.count))
        .collect()
}

/// `R$ 1,234.56`
pub fn fmt_money(value: Decimal) -> String {
    let mut rounded = value.round_dp(2);
    rounded.rescale(2);
    let text = rounded.abs().to_string();
    let (int_part, frac_part) = text.split_once('.').unwrap_or((text.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (idx, ch) in int_part.chars().enumerate() {
        if idx > 0 && (int_part.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if rounded < Decimal::ZERO { "-" } else { "" };
    format!("{sign}R$ {grouped}.{frac_part}")
}

fn fmt_opt_money(value: Option<Decimal>) -> String {
    value.map(fmt_money).unwrap_or_else(|| "-".to_string())
}

fn fmt_opt_pct(value: Option<Decimal>) -> String {
    match value {
        Some(v) => format!("{:.1}%", v),
        None => "-".to_string(),
    }
}

fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        return s.to_string();
    }
    let mut out: String = s.chars().take(width.saturating_sub(1)).collect();
    out.push('…');
    out
}
