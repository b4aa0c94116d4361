//! Reporting utilities: sales and profit metrics over canonical records.
//!
//! Absent values are skipped, never counted as zero: a record without a price
//! adds nothing to totals and is left out of means, and an unknown purchase
//! cost yields an unknown profit.
//!
//! Sums are checked: a total beyond the decimal range is an error, not a panic.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::{CanonicalRecord, CostLookup};
use crate::error::AppError;

pub mod format;

pub use format::*;

/// How many products the top-N tables show.
pub const TOP_PRODUCTS: usize = 10;

/// Record selection applied before computing metrics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SalesFilter {
    /// Inclusive, on the purchase date in the export's own offset.
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    /// Normalized order-status label, e.g. "Enviado".
    pub order_status: Option<String>,
}

impl SalesFilter {
    pub fn matches(&self, record: &CanonicalRecord) -> bool {
        let day = purchase_day(record);
        if self.from.is_some_and(|from| day < from) {
            return false;
        }
        if self.to.is_some_and(|to| day > to) {
            return false;
        }
        match &self.order_status {
            Some(wanted) => record.order_status.as_ref().is_some_and(|s| s.label() == wanted.as_str()),
            None => true,
        }
    }

    pub fn apply<'a>(&self, records: &'a [CanonicalRecord]) -> Vec<&'a CanonicalRecord> {
        records.iter().filter(|r| self.matches(r)).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyTotal {
    pub date: NaiveDate,
    pub total: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LabelCount {
    pub label: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SalesSummary {
    pub orders: usize,
    pub total_sales: Decimal,
    pub mean_order_value: Option<Decimal>,
    pub mean_daily_revenue: Option<Decimal>,
    pub daily: Vec<DailyTotal>,
    pub status_counts: Vec<LabelCount>,
    pub top_products: Vec<LabelCount>,
    pub first_day: Option<NaiveDate>,
    pub last_day: Option<NaiveDate>,
}

pub fn sales_summary(records: &[CanonicalRecord], filter: &SalesFilter) -> Result<SalesSummary, AppError> {
    let selected = filter.apply(records);

    let prices: Vec<Decimal> = selected.iter().filter_map(|r| r.item_price).collect();
    let daily = daily_totals(selected.iter().map(|r| (purchase_day(r), r.item_price)))?;
    let days: Vec<NaiveDate> = selected.iter().map(|r| purchase_day(r)).collect();

    Ok(SalesSummary {
        orders: selected.len(),
        total_sales: checked_sum(&prices)?,
        mean_order_value: mean(&prices)?,
        mean_daily_revenue: mean(&daily.iter().map(|d| d.total).collect::<Vec<_>>())?,
        status_counts: count_labels(
            selected
                .iter()
                .filter_map(|r| r.order_status.as_ref().map(|s| s.label().to_string())),
        ),
        top_products: count_labels(selected.iter().filter_map(|r| r.product_name.clone()))
            .into_iter()
            .take(TOP_PRODUCTS)
            .collect(),
        first_day: days.iter().min().copied(),
        last_day: days.iter().max().copied(),
        daily,
    })
}

/// One record joined against the cost lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfitLine {
    pub order_id: String,
    pub date: NaiveDate,
    pub product: Option<String>,
    pub price: Option<Decimal>,
    pub cost: Option<Decimal>,
    /// `price - cost`; absent when either side is unknown.
    pub profit: Option<Decimal>,
}

/// Left join by product name.
pub fn join_costs(records: &[&CanonicalRecord], costs: &CostLookup) -> Vec<ProfitLine> {
    records
        .iter()
        .map(|r| {
            let cost = r.product_name.as_ref().and_then(|p| costs.get(p)).copied();
            let profit = match (r.item_price, cost) {
                (Some(price), Some(cost)) => price.checked_sub(cost),
                _ => None,
            };
            ProfitLine {
                order_id: r.order_id.clone(),
                date: purchase_day(r),
                product: r.product_name.clone(),
                price: r.item_price,
                cost,
                profit,
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductProfit {
    pub product: String,
    /// Absent when no sale of the product has a known profit.
    pub total_profit: Option<Decimal>,
    pub mean_profit: Option<Decimal>,
    pub mean_price: Option<Decimal>,
    pub cost: Option<Decimal>,
    pub quantity: usize,
    /// `mean_profit / mean_price * 100`, two places.
    pub margin_pct: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfitSummary {
    pub lines: usize,
    pub lines_without_cost: usize,
    pub total_profit: Decimal,
    pub mean_profit: Option<Decimal>,
    pub mean_margin_pct: Option<Decimal>,
    pub daily: Vec<DailyTotal>,
    pub top_products: Vec<ProductProfit>,
    pub products: Vec<ProductProfit>,
}

pub fn profit_summary(
    records: &[CanonicalRecord],
    costs: &CostLookup,
    filter: &SalesFilter,
) -> Result<ProfitSummary, AppError> {
    let selected = filter.apply(records);
    let lines = join_costs(&selected, costs);

    let profits: Vec<Decimal> = lines.iter().filter_map(|l| l.profit).collect();
    let margins: Vec<Decimal> = lines
        .iter()
        .filter_map(|l| match (l.profit, l.price) {
            (Some(profit), Some(price)) => percent_of(profit, price),
            _ => None,
        })
        .collect();

    let products = product_profits(&lines)?;
    let top_products = products.iter().take(TOP_PRODUCTS).cloned().collect();

    Ok(ProfitSummary {
        lines: lines.len(),
        lines_without_cost: lines.iter().filter(|l| l.cost.is_none()).count(),
        total_profit: checked_sum(&profits)?,
        mean_profit: mean(&profits)?,
        mean_margin_pct: mean(&margins)?,
        daily: daily_totals(lines.iter().map(|l| (l.date, l.profit)))?,
        top_products,
        products,
    })
}

/// Per-product aggregation, highest total profit first, unknown totals last.
fn product_profits(lines: &[ProfitLine]) -> Result<Vec<ProductProfit>, AppError> {
    let mut by_product: BTreeMap<&str, Vec<&ProfitLine>> = BTreeMap::new();
    for line in lines {
        if let Some(product) = &line.product {
            by_product.entry(product.as_str()).or_default().push(line);
        }
    }

    let mut out = Vec::with_capacity(by_product.len());
    for (product, group) in by_product {
        let profits: Vec<Decimal> = group.iter().filter_map(|l| l.profit).collect();
        let prices: Vec<Decimal> = group.iter().filter_map(|l| l.price).collect();
        let mean_profit = mean(&profits)?;
        let mean_price = mean(&prices)?;
        let margin_pct = match (mean_profit, mean_price) {
            (Some(p), Some(s)) => percent_of(p, s).map(|pct| pct.round_dp(2)),
            _ => None,
        };
        let total_profit = if profits.is_empty() {
            None
        } else {
            Some(checked_sum(&profits)?)
        };
        out.push(ProductProfit {
            product: product.to_string(),
            total_profit,
            mean_profit,
            mean_price,
            cost: group.iter().find_map(|l| l.cost),
            quantity: group.len(),
            margin_pct,
        });
    }

    // Stable: ties stay in product-name order.
    out.sort_by(|a, b| match (a.total_profit, b.total_profit) {
        (Some(a), Some(b)) => b.cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
    Ok(out)
}

/// Distinct product names across the records, sorted.
pub fn distinct_products(records: &[CanonicalRecord]) -> Vec<String> {
    let mut products: Vec<String> = records.iter().filter_map(|r| r.product_name.clone()).collect();
    products.sort();
    products.dedup();
    products
}

fn purchase_day(record: &CanonicalRecord) -> NaiveDate {
    record.purchase_date.date_naive()
}

/// Sum known values per day. Days with no known value are left out.
fn daily_totals(values: impl Iterator<Item = (NaiveDate, Option<Decimal>)>) -> Result<Vec<DailyTotal>, AppError> {
    let mut by_day: BTreeMap<NaiveDate, Decimal> = BTreeMap::new();
    for (day, value) in values {
        let Some(value) = value else { continue };
        let total = by_day.entry(day).or_default();
        *total = total.checked_add(value).ok_or_else(|| overflow(&format!("daily total for {day}")))?;
    }
    Ok(by_day
        .into_iter()
        .map(|(date, total)| DailyTotal { date, total })
        .collect())
}

/// Occurrence counts, most frequent first, ties by label.
fn count_labels(labels: impl Iterator<Item = String>) -> Vec<LabelCount> {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for label in labels {
        *counts.entry(label).or_default() += 1;
    }
    let mut out: Vec<LabelCount> = counts
        .into_iter()
        .map(|(label, count)| LabelCount { label, count })
        .collect();
    out.sort_by(|a, b| b.count.cmp(&a.count));
    out
}

fn mean(values: &[Decimal]) -> Result<Option<Decimal>, AppError> {
    if values.is_empty() {
        return Ok(None);
    }
    let sum = checked_sum(values)?;
    Ok(sum
        .checked_div(Decimal::from(values.len()))
        .map(|m| m.round_dp(2)))
}

fn checked_sum(values: &[Decimal]) -> Result<Decimal, AppError> {
    values
        .iter()
        .try_fold(Decimal::ZERO, |acc, v| acc.checked_add(*v))
        .ok_or_else(|| overflow("total"))
}

/// `part / whole * 100`, or `None` for a zero or unrepresentable ratio.
fn percent_of(part: Decimal, whole: Decimal) -> Option<Decimal> {
    if whole.is_zero() {
        return None;
    }
    part.checked_div(whole)?.checked_mul(Decimal::ONE_HUNDRED)
}

fn overflow(what: &str) -> AppError {
    AppError::new(2, format!("The {what} exceeds the supported money range."))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::OrderStatus;
    use chrono::DateTime;

    fn record(id: &str, at: &str, product: Option<&str>, price: Option<i64>, status: OrderStatus) -> CanonicalRecord {
        CanonicalRecord {
            order_id: id.to_string(),
            purchase_date: DateTime::parse_from_rfc3339(at).unwrap(),
            order_status: Some(status),
            product_name: product.map(str::to_string),
            sku: None,
            asin: None,
            item_status: None,
            item_price: price.map(|p| Decimal::new(p, 2)),
            item_tax: None,
            shipping_price: None,
            ship_city: None,
            ship_state: None,
            payment_method: None,
        }
    }

    fn sample() -> Vec<CanonicalRecord> {
        vec![
            record("O1", "2024-01-01T10:00:00-03:00", Some("Caneca"), Some(10000), OrderStatus::Shipped),
            record("O2", "2024-01-01T12:00:00-03:00", Some("Caneca"), Some(5000), OrderStatus::Shipped),
            record("O3", "2024-01-02T09:00:00-03:00", Some("Garrafa"), Some(3000), OrderStatus::Pending),
            record("O4", "2024-01-03T09:00:00-03:00", Some("Garrafa"), None, OrderStatus::Cancelled),
        ]
    }

    #[test]
    fn sales_summary_skips_missing_prices() {
        let summary = sales_summary(&sample(), &SalesFilter::default()).unwrap();

        assert_eq!(summary.orders, 4);
        assert_eq!(summary.total_sales, Decimal::new(18000, 2));
        assert_eq!(summary.mean_order_value, Some(Decimal::new(6000, 2)));
        // Jan 3 has no known price: days 150, 30 -> mean 90
        assert_eq!(summary.mean_daily_revenue, Some(Decimal::new(9000, 2)));
        assert_eq!(summary.daily.len(), 2);
        assert_eq!(summary.last_day, NaiveDate::from_ymd_opt(2024, 1, 3));
        assert_eq!(summary.status_counts[0], LabelCount { label: "Enviado".to_string(), count: 2 });
        assert_eq!(summary.top_products.len(), 2);
    }

    #[test]
    fn filter_by_date_and_status() {
        let filter = SalesFilter {
            from: NaiveDate::from_ymd_opt(2024, 1, 1),
            to: NaiveDate::from_ymd_opt(2024, 1, 2),
            order_status: Some("Pendente".to_string()),
        };
        let summary = sales_summary(&sample(), &filter).unwrap();
        assert_eq!(summary.orders, 1);
        assert_eq!(summary.total_sales, Decimal::new(3000, 2));
    }

    #[test]
    fn unknown_cost_means_unknown_profit() {
        let records = sample();
        let mut costs = CostLookup::new();
        costs.insert("Caneca".to_string(), Decimal::new(4000, 2));

        let selected: Vec<&CanonicalRecord> = records.iter().collect();
        let lines = join_costs(&selected, &costs);
        assert_eq!(lines[0].profit, Some(Decimal::new(6000, 2)));
        assert_eq!(lines[2].cost, None);
        assert_eq!(lines[2].profit, None);

        let summary = profit_summary(&records, &costs, &SalesFilter::default()).unwrap();
        assert_eq!(summary.total_profit, Decimal::new(7000, 2));
        assert_eq!(summary.mean_profit, Some(Decimal::new(3500, 2)));
        assert_eq!(summary.lines_without_cost, 2);
        // (60/100 + 10/50) / 2 = 40%
        assert_eq!(summary.mean_margin_pct, Some(Decimal::new(40, 0)));

        let caneca = &summary.products[0];
        assert_eq!(caneca.product, "Caneca");
        assert_eq!(caneca.quantity, 2);
        assert_eq!(caneca.margin_pct, Some(Decimal::new(4667, 2)));
        assert_eq!(caneca.total_profit, Some(Decimal::new(7000, 2)));
        let garrafa = &summary.products[1];
        assert_eq!(garrafa.mean_profit, None);
        assert_eq!(garrafa.total_profit, None);

        // Only days with a known profit appear.
        let days: Vec<NaiveDate> = summary.daily.iter().map(|d| d.date).collect();
        assert_eq!(days, vec![NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()]);
    }

    #[test]
    fn unknown_totals_rank_after_losses() {
        let records = vec![
            record("O1", "2024-01-01T10:00:00Z", Some("Abajur"), Some(1000), OrderStatus::Shipped),
            record("O2", "2024-01-01T11:00:00Z", Some("Caneca"), Some(1000), OrderStatus::Shipped),
            record("O3", "2024-01-01T12:00:00Z", Some("Garrafa"), Some(1000), OrderStatus::Shipped),
        ];
        let mut costs = CostLookup::new();
        costs.insert("Caneca".to_string(), Decimal::new(500, 2));
        costs.insert("Garrafa".to_string(), Decimal::new(2500, 2));

        let summary = profit_summary(&records, &costs, &SalesFilter::default()).unwrap();
        let order: Vec<(&str, Option<Decimal>)> = summary
            .products
            .iter()
            .map(|p| (p.product.as_str(), p.total_profit))
            .collect();
        assert_eq!(
            order,
            vec![
                ("Caneca", Some(Decimal::new(500, 2))),
                ("Garrafa", Some(Decimal::new(-1500, 2))),
                ("Abajur", None),
            ]
        );
    }

    #[test]
    fn totals_beyond_decimal_range_are_errors() {
        // 3e28: two fit under Decimal::MAX (~7.9e28), three do not.
        let huge = Decimal::from_i128_with_scale(30_000_000_000_000_000_000_000_000_000, 0);
        let mut records = vec![
            record("O1", "2024-01-01T10:00:00Z", Some("Caneca"), None, OrderStatus::Shipped),
            record("O2", "2024-01-01T11:00:00Z", Some("Caneca"), None, OrderStatus::Shipped),
            record("O3", "2024-01-01T12:00:00Z", Some("Caneca"), None, OrderStatus::Shipped),
        ];
        for r in &mut records {
            r.item_price = Some(huge);
        }

        let err = sales_summary(&records, &SalesFilter::default()).unwrap_err();
        assert_eq!(err.exit_code(), 2);

        let costs = CostLookup::from([("Caneca".to_string(), Decimal::ZERO)]);
        assert!(profit_summary(&records, &costs, &SalesFilter::default()).is_err());

        // Two of them still fit.
        let summary = sales_summary(&records[..2], &SalesFilter::default()).unwrap();
        assert_eq!(summary.total_sales, huge + huge);
    }

    #[test]
    fn distinct_products_are_sorted() {
        assert_eq!(distinct_products(&sample()), vec!["Caneca", "Garrafa"]);
    }
}
