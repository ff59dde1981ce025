use std::fmt;

use common::{
    models::{ChartSeries, InventoryRecord, RecordPage},
    network::Failure,
};

pub mod widget;

#[derive(Debug, Clone)]
pub enum Msg {
    LoadSuppliers,
    SuppliersLoaded(Vec<String>),
    SuppliersFailed(String),

    // Filter form
    StartDate(String),
    EndDate(String),
    Sku(String),
    ProductName(String),
    Supplier(SupplierChoice),
    Submit,
    Reset,

    // Table
    Load,
    GoToPage(u32),
    NextPage,
    PreviousPage,
    DataLoaded(u64, RecordPage),
    DataFailed(u64, Failure),

    // Chart
    ToggleChart,
    ChartLoaded(u64, ChartSeries),
    ChartFailed(u64, Failure),

    DismissAlert(u64),
}

/// Entry of the supplier dropdown. `All` maps to "no supplier filter".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SupplierChoice {
    All,
    Named(String),
}

impl SupplierChoice {
    pub fn value(&self) -> &str {
        match self {
            SupplierChoice::All => "",
            SupplierChoice::Named(name) => name,
        }
    }
}

impl fmt::Display for SupplierChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SupplierChoice::All => write!(f, "All suppliers"),
            SupplierChoice::Named(name) => write!(f, "{}", name),
        }
    }
}

/// Dropdown entries for the given supplier names, "all" first.
pub fn supplier_choices(names: &[String]) -> Vec<SupplierChoice> {
    std::iter::once(SupplierChoice::All)
        .chain(names.iter().cloned().map(SupplierChoice::Named))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableRow {
    /// Spans every column when a page has no items.
    Placeholder,
    Record([String; 10]),
}

pub fn table_rows(items: &[InventoryRecord]) -> Vec<TableRow> {
    if items.is_empty() {
        return vec![TableRow::Placeholder];
    }
    items
        .iter()
        .map(|item| TableRow::Record(item.cells()))
        .collect()
}
