//! Shared domain types.
//!
//! The raw side (`RawTable`) keeps every cell as the source wrote it. The
//! canonical side (`CanonicalRecord`) is typed: timestamps are parsed, money is
//! a two-place `Decimal`, and absent values are `None` rather than `""`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, FixedOffset};
use rust_decimal::Decimal;

use crate::error::AppError;

/// Default directory scanned for uploaded order exports.
pub const DEFAULT_INPUT_DIR: &str = "arquivos_entrada";
/// Default directory for persisted artifacts and the cost lookup.
pub const DEFAULT_OUTPUT_DIR: &str = "arquivos_processados";
/// Extension that marks a file as an order export.
pub const INPUT_EXTENSION: &str = "txt";

pub const COMBINED_RAW_FILE: &str = "combined_raw.tsv";
pub const CANONICAL_FILE: &str = "canonical.tsv";
pub const COST_LOOKUP_FILE: &str = "purchase_costs.tsv";

/// Product name -> purchase cost. Ordered so the persisted table is stable.
pub type CostLookup = BTreeMap<String, Decimal>;

/// One source file exactly as parsed: header names plus untyped string cells.
///
/// Every row has exactly `headers.len()` cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTable {
    pub source: PathBuf,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// The fixed set of recognized order-export columns, in canonical order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Column {
    OrderId,
    PurchaseDate,
    OrderStatus,
    ProductName,
    Sku,
    Asin,
    ItemStatus,
    ItemPrice,
    ItemTax,
    ShippingPrice,
    ShipCity,
    ShipState,
    PaymentMethod,
}

impl Column {
    pub const ALL: [Column; 13] = [
        Column::OrderId,
        Column::PurchaseDate,
        Column::OrderStatus,
        Column::ProductName,
        Column::Sku,
        Column::Asin,
        Column::ItemStatus,
        Column::ItemPrice,
        Column::ItemTax,
        Column::ShippingPrice,
        Column::ShipCity,
        Column::ShipState,
        Column::PaymentMethod,
    ];

    pub const PRICES: [Column; 3] = [Column::ItemPrice, Column::ItemTax, Column::ShippingPrice];

    /// Header name as it appears in order exports.
    pub fn header_name(self) -> &'static str {
        match self {
            Column::OrderId => "amazon-order-id",
            Column::PurchaseDate => "purchase-date",
            Column::OrderStatus => "order-status",
            Column::ProductName => "product-name",
            Column::Sku => "sku",
            Column::Asin => "asin",
            Column::ItemStatus => "item-status",
            Column::ItemPrice => "item-price",
            Column::ItemTax => "item-tax",
            Column::ShippingPrice => "shipping-price",
            Column::ShipCity => "ship-city",
            Column::ShipState => "ship-state",
            Column::PaymentMethod => "payment-method-details",
        }
    }

    pub fn from_header(name: &str) -> Option<Column> {
        Column::ALL
            .into_iter()
            .find(|c| c.header_name().eq_ignore_ascii_case(name))
    }
}

/// Order-level status.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum OrderStatus {
    Shipped,
    Cancelled,
    Pending,
    /// Anything outside the known domain, kept verbatim.
    Other(String),
}

impl OrderStatus {
    pub fn from_raw(raw: &str) -> Self {
        match raw {
            "Shipped" => OrderStatus::Shipped,
            "Cancelled" => OrderStatus::Cancelled,
            "Pending" => OrderStatus::Pending,
            other => OrderStatus::Other(other.to_string()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            OrderStatus::Shipped => "Enviado",
            OrderStatus::Cancelled => "Cancelado",
            OrderStatus::Pending => "Pendente",
            OrderStatus::Other(raw) => raw,
        }
    }
}

/// Line-item shipping status.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ItemStatus {
    Shipped,
    Unshipped,
    Other(String),
}

impl ItemStatus {
    pub fn from_raw(raw: &str) -> Self {
        match raw {
            "Shipped" => ItemStatus::Shipped,
            "Unshipped" => ItemStatus::Unshipped,
            other => ItemStatus::Other(other.to_string()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            ItemStatus::Shipped => "Enviado",
            ItemStatus::Unshipped => "Não Enviado",
            ItemStatus::Other(raw) => raw,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PaymentMethod {
    Installments,
    CreditCard,
    Other,
    /// A value outside the known domain (distinct from the literal `Other` code).
    Unrecognized(String),
}

impl PaymentMethod {
    pub fn from_raw(raw: &str) -> Self {
        match raw {
            "Installments" => PaymentMethod::Installments,
            "CreditCard" => PaymentMethod::CreditCard,
            "Other" => PaymentMethod::Other,
            other => PaymentMethod::Unrecognized(other.to_string()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            PaymentMethod::Installments => "Parcelado",
            PaymentMethod::CreditCard => "Cartão de Crédito",
            PaymentMethod::Other => "Outros",
            PaymentMethod::Unrecognized(raw) => raw,
        }
    }
}

/// A normalized sales-order line.
///
/// Invariants (upheld by `normalize::canonical`):
/// - prices are non-negative with exactly two decimal places
/// - `ship_state` never holds "Espirito Santo" or "Rondônia"
/// - no `Some("")` and no `Some("----------")` anywhere
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalRecord {
    pub order_id: String,
    pub purchase_date: DateTime<FixedOffset>,
    pub order_status: Option<OrderStatus>,
    pub product_name: Option<String>,
    pub sku: Option<String>,
    pub asin: Option<String>,
    pub item_status: Option<ItemStatus>,
    pub item_price: Option<Decimal>,
    pub item_tax: Option<Decimal>,
    pub shipping_price: Option<Decimal>,
    pub ship_city: Option<String>,
    pub ship_state: Option<String>,
    pub payment_method: Option<PaymentMethod>,
}

impl CanonicalRecord {
    /// Render one column the way the canonical artifact stores it; `None` is absent.
    pub fn display_value(&self, column: Column) -> Option<String> {
        fn text(v: &Option<String>) -> Option<String> {
            v.clone()
        }
        fn money(v: &Option<Decimal>) -> Option<String> {
            v.map(|d| d.to_string())
        }

        match column {
            Column::OrderId => Some(self.order_id.clone()),
            Column::PurchaseDate => Some(self.purchase_date.format("%d/%m/%Y %H:%M:%S").to_string()),
            Column::OrderStatus => self.order_status.as_ref().map(|s| s.label().to_string()),
            Column::ProductName => text(&self.product_name),
            Column::Sku => text(&self.sku),
            Column::Asin => text(&self.asin),
            Column::ItemStatus => self.item_status.as_ref().map(|s| s.label().to_string()),
            Column::ItemPrice => money(&self.item_price),
            Column::ItemTax => money(&self.item_tax),
            Column::ShippingPrice => money(&self.shipping_price),
            Column::ShipCity => text(&self.ship_city),
            Column::ShipState => text(&self.ship_state),
            Column::PaymentMethod => self.payment_method.as_ref().map(|p| p.label().to_string()),
        }
    }
}

/// Where the pipeline reads from and writes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Extra directory scanned for exports (the working directory by default).
    pub scan_dir: Option<PathBuf>,
    pub extension: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from(DEFAULT_INPUT_DIR),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            scan_dir: Some(PathBuf::from(".")),
            extension: INPUT_EXTENSION.to_string(),
        }
    }
}

impl PipelineConfig {
    pub fn new(input_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            input_dir: input_dir.into(),
            output_dir: output_dir.into(),
            ..Self::default()
        }
    }

    /// Defaults overridden by `SALESBOARD_INPUT_DIR` / `SALESBOARD_OUTPUT_DIR` (`.env` honoured).
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        let mut config = Self::default();
        if let Some(dir) = read_dir_var("SALESBOARD_INPUT_DIR")? {
            config.input_dir = dir;
        }
        if let Some(dir) = read_dir_var("SALESBOARD_OUTPUT_DIR")? {
            config.output_dir = dir;
        }
        Ok(config)
    }

    pub fn combined_raw_path(&self) -> PathBuf {
        self.output_dir.join(COMBINED_RAW_FILE)
    }

    pub fn canonical_path(&self) -> PathBuf {
        self.output_dir.join(CANONICAL_FILE)
    }

    pub fn cost_lookup_path(&self) -> PathBuf {
        self.output_dir.join(COST_LOOKUP_FILE)
    }

    /// Directories searched for exports, scan dir first.
    pub fn discovery_dirs(&self) -> Vec<&Path> {
        let mut dirs = Vec::with_capacity(2);
        if let Some(scan) = &self.scan_dir {
            dirs.push(scan.as_path());
        }
        dirs.push(self.input_dir.as_path());
        dirs
    }
}

fn read_dir_var(name: &str) -> Result<Option<PathBuf>, AppError> {
    match std::env::var(name) {
        Ok(v) if v.trim().is_empty() => Ok(None),
        Ok(v) => Ok(Some(PathBuf::from(v.trim()))),
        Err(std::env::VarError::NotPresent) => Ok(None),
        Err(std::env::VarError::NotUnicode(_)) => {
            Err(AppError::new(2, format!("`{name}` is not valid UTF-8.")))
        }
    }
}
