//! Field canonicalization: projected string cells → `CanonicalRecord`.
//!
//! Per cell, in order:
//! 1. trim surrounding whitespace
//! 2. empty string and the `----------` placeholder become absent
//! 3. type-specific parsing (timestamp, money, enumerations, state codes)
//!
//! A row whose order id, purchase date, or any price fails step 3 is rejected
//! as a whole and reported as a `RowError`; the rest of the file is kept.

use std::path::PathBuf;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};
use rust_decimal::Decimal;

use crate::domain::{CanonicalRecord, Column, ItemStatus, OrderStatus, PaymentMethod};
use crate::error::ValidationError;
use crate::normalize::project::ProjectedTable;

/// Literal token some exports use for "no value".
pub const PLACEHOLDER: &str = "----------";

/// Unabbreviated state names that appear in exports, with their codes.
const STATE_CODES: [(&str, &str); 2] = [("Espirito Santo", "ES"), ("Rondônia", "RO")];

/// A row that could not be canonicalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowError {
    pub source: PathBuf,
    /// 1-based line in the source file (header is line 1).
    pub line: usize,
    pub order_id: Option<String>,
    pub error: ValidationError,
}

impl std::fmt::Display for RowError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.source.display(), self.line)?;
        if let Some(id) = &self.order_id {
            write!(f, " [{id}]")?;
        }
        write!(f, " {}", self.error)
    }
}

/// Canonical rows of one table plus the rows that were rejected.
#[derive(Debug, Clone, Default)]
pub struct CanonicalBatch {
    pub records: Vec<CanonicalRecord>,
    pub rejected: Vec<RowError>,
}

pub fn canonicalize(table: &ProjectedTable) -> CanonicalBatch {
    let mut batch = CanonicalBatch::default();

    for (idx, row) in table.rows.iter().enumerate() {
        match canonicalize_row(table, row) {
            Ok(record) => batch.records.push(record),
            Err(error) => batch.rejected.push(RowError {
                source: table.source.clone(),
                line: idx + 2,
                order_id: table
                    .cell(row, Column::OrderId)
                    .and_then(clean_text)
                    .map(str::to_string),
                error,
            }),
        }
    }

    batch
}

pub fn canonicalize_row(table: &ProjectedTable, row: &[String]) -> Result<CanonicalRecord, ValidationError> {
    let text = |column: Column| table.cell(row, column).and_then(clean_text);
    let owned = |column: Column| text(column).map(str::to_string);
    let price = |column: Column| text(column).map(|s| parse_price(column, s)).transpose();

    let order_id = owned(Column::OrderId).ok_or(ValidationError::MissingValue {
        column: Column::OrderId.header_name(),
    })?;
    let purchase_date = text(Column::PurchaseDate)
        .ok_or(ValidationError::MissingValue {
            column: Column::PurchaseDate.header_name(),
        })
        .and_then(parse_purchase_date)?;

    Ok(CanonicalRecord {
        order_id,
        purchase_date,
        order_status: text(Column::OrderStatus).map(OrderStatus::from_raw),
        product_name: owned(Column::ProductName),
        sku: owned(Column::Sku),
        asin: owned(Column::Asin),
        item_status: text(Column::ItemStatus).map(ItemStatus::from_raw),
        item_price: price(Column::ItemPrice)?,
        item_tax: price(Column::ItemTax)?,
        shipping_price: price(Column::ShippingPrice)?,
        ship_city: owned(Column::ShipCity),
        ship_state: text(Column::ShipState).map(normalize_state),
        payment_method: text(Column::PaymentMethod).map(PaymentMethod::from_raw),
    })
}

/// Trimmed cell, or `None` for empty / placeholder values.
pub fn clean_text(raw: &str) -> Option<&str> {
    let s = raw.trim();
    if s.is_empty() || s == PLACEHOLDER { None } else { Some(s) }
}

/// Parse an export timestamp. Values without an offset are taken as UTC.
pub fn parse_purchase_date(s: &str) -> Result<DateTime<FixedOffset>, ValidationError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt);
    }

    const OFFSET_FMTS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f%z", "%Y-%m-%d %H:%M:%S%.f%z"];
    for fmt in OFFSET_FMTS {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Ok(dt);
        }
    }

    const NAIVE_FMTS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];
    for fmt in NAIVE_FMTS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(as_utc(naive));
        }
    }

    if let Some(naive) = NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
    {
        return Ok(as_utc(naive));
    }

    Err(ValidationError::UnparseableDate { value: s.to_string() })
}

fn as_utc(naive: NaiveDateTime) -> DateTime<FixedOffset> {
    Utc.from_utc_datetime(&naive).fixed_offset()
}

/// Parse a currency string such as `$1,234.5` or `R$ 10.00` to a two-place decimal.
///
/// A sign may precede the currency symbol (`-$5.00`); negative values are rejected.
pub fn parse_price(column: Column, s: &str) -> Result<Decimal, ValidationError> {
    let trimmed = s.trim();
    let (negative, unsigned) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest.trim_start()),
        None => (false, trimmed),
    };
    let digits: String = unsigned
        .trim_start_matches("R$")
        .trim_start_matches('$')
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .collect();

    let value = Decimal::from_str(&digits).map_err(|_| ValidationError::NonNumericPrice {
        column: column.header_name(),
        value: s.to_string(),
    })?;

    if value.is_zero() {
        let mut zero = Decimal::ZERO;
        zero.rescale(2);
        return Ok(zero);
    }
    if negative || value < Decimal::ZERO {
        return Err(ValidationError::NegativePrice {
            column: column.header_name(),
            value: s.to_string(),
        });
    }

    let mut rounded = value.round_dp(2);
    rounded.rescale(2);
    // rescale leaves the scale untouched when the mantissa has no room left.
    if rounded.scale() != 2 {
        return Err(ValidationError::PriceOutOfRange {
            column: column.header_name(),
            value: s.to_string(),
        });
    }
    Ok(rounded)
}

pub fn normalize_state(s: &str) -> String {
    STATE_CODES
        .iter()
        .find(|(name, _)| *name == s)
        .map(|(_, code)| code.to_string())
        .unwrap_or_else(|| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RawTable;
    use crate::normalize::project::project;

    fn projected(headers: &[&str], rows: &[&[&str]]) -> ProjectedTable {
        let raw = RawTable {
            source: PathBuf::from("orders.txt"),
            headers: headers.iter().map(|s| s.to_string()).collect(),
            rows: rows
                .iter()
                .map(|r| r.iter().map(|s| s.to_string()).collect())
                .collect(),
        };
        project(&raw, &Column::ALL)
    }

    #[test]
    fn price_strips_symbol_and_thousands() {
        let p = parse_price(Column::ItemPrice, "$1,234.5").unwrap();
        assert_eq!(p, Decimal::new(123450, 2));
        assert_eq!(p.to_string(), "1234.50");
        assert_eq!(parse_price(Column::ItemTax, "R$ 0").unwrap().to_string(), "0.00");
        assert_eq!(parse_price(Column::ItemTax, "10.456").unwrap().to_string(), "10.46");
    }

    #[test]
    fn bad_prices_are_validation_errors() {
        assert!(matches!(
            parse_price(Column::ItemPrice, "abc"),
            Err(ValidationError::NonNumericPrice { column: "item-price", .. })
        ));
        assert!(matches!(
            parse_price(Column::ShippingPrice, "-3.00"),
            Err(ValidationError::NegativePrice { .. })
        ));
        assert!(matches!(
            parse_price(Column::ItemPrice, "-$5.00"),
            Err(ValidationError::NegativePrice { column: "item-price", .. })
        ));
        assert!(matches!(
            parse_price(Column::ItemPrice, "- R$ 1,000.00"),
            Err(ValidationError::NegativePrice { .. })
        ));
        assert_eq!(parse_price(Column::ItemTax, "-$0.00").unwrap().to_string(), "0.00");
    }

    #[test]
    fn price_without_room_for_cents_is_out_of_range() {
        assert!(matches!(
            parse_price(Column::ItemPrice, "50000000000000000000000000000"),
            Err(ValidationError::PriceOutOfRange { column: "item-price", .. })
        ));

        let widest = parse_price(Column::ItemPrice, "100000000000000000000000000.00").unwrap();
        assert_eq!(widest.scale(), 2);
    }

    #[test]
    fn states_normalize_only_known_names() {
        assert_eq!(normalize_state("Espirito Santo"), "ES");
        assert_eq!(normalize_state("Rondônia"), "RO");
        assert_eq!(normalize_state("São Paulo"), "São Paulo");
        assert_eq!(normalize_state("ES"), "ES");
    }

    #[test]
    fn placeholder_and_empty_are_absent() {
        assert_eq!(clean_text(""), None);
        assert_eq!(clean_text("   "), None);
        assert_eq!(clean_text(PLACEHOLDER), None);
        assert_eq!(clean_text("  Vitória "), Some("Vitória"));
    }

    #[test]
    fn purchase_date_accepts_export_formats() {
        let with_offset = parse_purchase_date("2024-03-05T14:30:00-03:00").unwrap();
        assert_eq!(with_offset.offset().local_minus_utc(), -3 * 3600);

        let zulu = parse_purchase_date("2024-03-05T14:30:00Z").unwrap();
        let naive = parse_purchase_date("2024-03-05 14:30:00").unwrap();
        assert_eq!(zulu, naive);

        let day = parse_purchase_date("2024-03-05").unwrap();
        assert_eq!(day.format("%d/%m/%Y %H:%M:%S").to_string(), "05/03/2024 00:00:00");

        assert!(parse_purchase_date("yesterday").is_err());
    }

    #[test]
    fn row_canonicalizes_every_field() {
        let table = projected(
            &[
                "amazon-order-id",
                "purchase-date",
                "order-status",
                "product-name",
                "item-status",
                "item-price",
                "item-tax",
                "ship-state",
                "payment-method-details",
                "ship-city",
            ],
            &[&[
                " 701-1 ",
                "2024-03-05T14:30:00+00:00",
                "Shipped",
                " Caneca ",
                "Unshipped",
                "$1,234.5",
                "",
                "Espirito Santo",
                "Installments",
                PLACEHOLDER,
            ]],
        );

        let batch = canonicalize(&table);
        assert!(batch.rejected.is_empty());
        let r = &batch.records[0];
        assert_eq!(r.order_id, "701-1");
        assert_eq!(r.order_status, Some(OrderStatus::Shipped));
        assert_eq!(r.product_name.as_deref(), Some("Caneca"));
        assert_eq!(r.item_status.as_ref().map(|s| s.label()), Some("Não Enviado"));
        assert_eq!(r.item_price, Some(Decimal::new(123450, 2)));
        assert_eq!(r.item_tax, None);
        assert_eq!(r.shipping_price, None);
        assert_eq!(r.ship_state.as_deref(), Some("ES"));
        assert_eq!(r.ship_city, None);
        assert_eq!(r.payment_method.as_ref().map(|p| p.label()), Some("Parcelado"));
        assert_eq!(r.sku, None);
    }

    #[test]
    fn bad_rows_are_rejected_with_line_numbers() {
        let table = projected(
            &["amazon-order-id", "purchase-date", "item-price"],
            &[
                &["O1", "2024-01-01T00:00:00Z", "10.00"],
                &["O2", "not a date", "10.00"],
                &["O3", "2024-01-01T00:00:00Z", "ten"],
                &[PLACEHOLDER, "2024-01-01T00:00:00Z", "1"],
            ],
        );

        let batch = canonicalize(&table);
        assert_eq!(batch.records.len(), 1);
        let lines: Vec<usize> = batch.rejected.iter().map(|e| e.line).collect();
        assert_eq!(lines, vec![3, 4, 5]);
        assert_eq!(batch.rejected[0].order_id.as_deref(), Some("O2"));
        assert_eq!(batch.rejected[2].order_id, None);
    }

    #[test]
    fn placeholder_clears_enumerated_and_state_columns() {
        let table = projected(
            &[
                "amazon-order-id",
                "purchase-date",
                "order-status",
                "item-status",
                "ship-state",
                "payment-method-details",
                "item-tax",
            ],
            &[&["O1", "2024-01-01T00:00:00Z", PLACEHOLDER, PLACEHOLDER, PLACEHOLDER, PLACEHOLDER, PLACEHOLDER]],
        );

        let batch = canonicalize(&table);
        assert!(batch.rejected.is_empty());
        let r = &batch.records[0];
        assert_eq!(r.order_status, None);
        assert_eq!(r.item_status, None);
        assert_eq!(r.ship_state, None);
        assert_eq!(r.payment_method, None);
        assert_eq!(r.item_tax, None);
    }

    #[test]
    fn oversized_price_rejects_the_row() {
        let table = projected(
            &["amazon-order-id", "purchase-date", "item-price"],
            &[
                &["O1", "2024-01-01T00:00:00Z", "50000000000000000000000000000"],
                &["O2", "2024-01-01T00:00:00Z", "12.00"],
            ],
        );

        let batch = canonicalize(&table);
        assert_eq!(batch.records.len(), 1);
        assert_eq!(batch.records[0].order_id, "O2");
        assert!(matches!(batch.rejected[0].error, ValidationError::PriceOutOfRange { .. }));
    }
}
