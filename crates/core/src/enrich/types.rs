use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductSearchResponse {
    #[serde(default)]
    pub products: Vec<CatalogProduct>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogProduct {
    pub id: Option<u64>,
    pub title: String,
    pub category: String,
    pub brand: Option<String>,
    pub rating: Option<f64>,
}
