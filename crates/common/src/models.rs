use serde::{Deserialize, Serialize};

/// Status code the backend puts in the envelope when a call succeeded.
pub const CODE_OK: i64 = 200;

/// Every backend response is wrapped in `{code, message, data | errors}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct Envelope<T> {
    pub code: i64,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<T>,
    #[serde(default)]
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InventoryRecord {
    pub id: i64,
    pub date: Option<String>,
    pub sku: Option<String>,
    pub product_name: Option<String>,
    pub inbound_quantity: Option<i64>,
    pub outbound_quantity: Option<i64>,
    pub inventory_balance: Option<i64>,
    pub supplier: Option<String>,
    pub operator: Option<String>,
    pub remarks: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

pub const RECORD_COLUMNS: [&str; 10] = [
    "ID",
    "Date",
    "SKU",
    "Product",
    "Inbound",
    "Outbound",
    "Balance",
    "Supplier",
    "Operator",
    "Remarks",
];

fn text_or_dash(value: &Option<String>) -> String {
    match value.as_deref().map(str::trim) {
        Some(s) if !s.is_empty() => s.to_string(),
        _ => String::from("-"),
    }
}

impl InventoryRecord {
    /// Display cells in [`RECORD_COLUMNS`] order. Missing text shows as `-`,
    /// missing quantities as `0`.
    pub fn cells(&self) -> [String; 10] {
        [
            self.id.to_string(),
            text_or_dash(&self.date),
            text_or_dash(&self.sku),
            text_or_dash(&self.product_name),
            self.inbound_quantity.unwrap_or(0).to_string(),
            self.outbound_quantity.unwrap_or(0).to_string(),
            self.inventory_balance.unwrap_or(0).to_string(),
            text_or_dash(&self.supplier),
            text_or_dash(&self.operator),
            text_or_dash(&self.remarks),
        ]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RecordPage {
    pub items: Vec<InventoryRecord>,
    pub page: u32,
    pub pages: u32,
    pub total: u64,
    pub per_page: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ChartSeries {
    pub dates: Vec<String>,
    pub balances: Vec<f64>,
}

impl ChartSeries {
    /// Pairs dates with balances. Extra entries on either side are dropped.
    pub fn points(&self) -> impl Iterator<Item = (&str, f64)> {
        self.dates
            .iter()
            .map(String::as_str)
            .zip(self.balances.iter().copied())
    }

    pub fn len(&self) -> usize {
        self.dates.len().min(self.balances.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_render_as_placeholders() {
        let record = InventoryRecord {
            id: 7,
            date: Some("2025-08-20".into()),
            sku: Some("SKU-1".into()),
            product_name: Some("   ".into()),
            inbound_quantity: Some(5),
            ..Default::default()
        };
        assert_eq!(
            record.cells(),
            ["7", "2025-08-20", "SKU-1", "-", "5", "0", "0", "-", "-", "-"].map(String::from)
        );
    }

    #[test]
    fn record_page_parses_backend_payload() {
        let raw = r#"{
            "code": 200,
            "data": {
                "items": [{
                    "id": 1, "date": "2025-08-20", "sku": "A1", "product_name": null,
                    "inbound_quantity": 3, "outbound_quantity": null, "inventory_balance": 10,
                    "supplier": "Acme", "operator": null, "remarks": null,
                    "created_at": "2025-08-20 10:00:00", "updated_at": "2025-08-20 10:00:00"
                }],
                "total": 41, "page": 2, "per_page": 20, "pages": 3
            }
        }"#;
        let envelope: Envelope<RecordPage> = serde_json::from_str(raw).unwrap();
        assert_eq!(envelope.code, CODE_OK);
        let page = envelope.data.unwrap();
        assert_eq!((page.page, page.pages, page.total, page.per_page), (2, 3, 41, 20));
        assert_eq!(page.items[0].supplier.as_deref(), Some("Acme"));
    }

    #[test]
    fn null_sku_does_not_break_the_page() {
        let raw = r#"{
            "code": 200,
            "data": {
                "items": [{"id": 4, "date": null, "sku": null, "product_name": "Bolt"}],
                "total": 1, "page": 1, "per_page": 20, "pages": 1
            }
        }"#;
        let envelope: Envelope<RecordPage> = serde_json::from_str(raw).unwrap();
        let record = &envelope.data.unwrap().items[0];
        assert_eq!(record.sku, None);
        assert_eq!(record.cells()[2], "-");
    }

    #[test]
    fn failure_envelope_carries_error_list() {
        let raw = r#"{"code": 400, "message": "invalid", "errors": ["row 3 bad SKU"]}"#;
        let envelope: Envelope<()> = serde_json::from_str(raw).unwrap();
        assert_eq!(envelope.message.as_deref(), Some("invalid"));
        assert_eq!(envelope.errors, vec!["row 3 bad SKU"]);
        assert!(envelope.data.is_none());
    }

    #[test]
    fn chart_points_ignore_unpaired_entries() {
        let series = ChartSeries {
            dates: vec!["2025-01-01".into(), "2025-01-02".into()],
            balances: vec![1.0],
        };
        assert_eq!(series.len(), 1);
        assert_eq!(series.points().collect::<Vec<_>>(), vec![("2025-01-01", 1.0)]);
    }
}
