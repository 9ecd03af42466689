use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Column order shared by the input, cleaned and enriched files.
pub const SALES_COLUMNS: [&str; 7] = [
    "transaction_id",
    "date",
    "region",
    "product_name",
    "quantity",
    "unit_price",
    "customer_id",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesRecord {
    pub transaction_id: String,
    pub date: NaiveDate,
    pub region: String,
    pub product_name: String,
    pub quantity: u64,
    pub unit_price: f64,
    pub customer_id: String,
}

impl SalesRecord {
    pub fn revenue(&self) -> f64 {
        self.quantity as f64 * self.unit_price
    }

    /// Canonical field values, in `SALES_COLUMNS` order.
    pub fn to_fields(&self) -> [String; 7] {
        [
            self.transaction_id.clone(),
            self.date.format("%Y-%m-%d").to_string(),
            self.region.clone(),
            self.product_name.clone(),
            self.quantity.to_string(),
            format!("{:.2}", self.unit_price),
            self.customer_id.clone(),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductAttributes {
    pub category: String,
    pub brand: Option<String>,
    pub rating: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedRecord {
    #[serde(flatten)]
    pub record: SalesRecord,
    pub category: Option<String>,
    pub brand: Option<String>,
    pub rating: Option<f64>,
    pub matched: bool,
}

impl EnrichedRecord {
    pub fn unmatched(record: SalesRecord) -> Self {
        Self {
            record,
            category: None,
            brand: None,
            rating: None,
            matched: false,
        }
    }

    pub fn with_attributes(record: SalesRecord, attrs: &ProductAttributes) -> Self {
        Self {
            record,
            category: Some(attrs.category.clone()),
            brand: attrs.brand.clone(),
            rating: attrs.rating,
            matched: true,
        }
    }
}
