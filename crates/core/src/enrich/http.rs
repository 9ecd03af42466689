use crate::config::Settings;
use crate::domain::record::ProductAttributes;
use crate::enrich::types::{CatalogProduct, ProductSearchResponse};
use crate::enrich::{LookupError, ProductLookup};
use anyhow::{Context, Result};
use std::time::Duration;

const SEARCH_PATH: &str = "/products/search";

/// Product catalogue lookup against a DummyJSON-style search endpoint.
/// One request per call; no retries.
#[derive(Debug, Clone)]
pub struct HttpProductLookup {
    http: reqwest::Client,
    base_url: String,
}

impl HttpProductLookup {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Self::new(
            settings.product_api_base_url(),
            Duration::from_secs(settings.product_api_timeout_secs),
        )
    }

    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build product lookup http client")?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self) -> String {
        format!("{}{}", self.base_url, SEARCH_PATH)
    }
}

#[async_trait::async_trait]
impl ProductLookup for HttpProductLookup {
    fn provider_name(&self) -> &'static str {
        "dummyjson_search"
    }

    async fn lookup(&self, product_name: &str) -> Result<ProductAttributes, LookupError> {
        let res = self
            .http
            .get(self.url())
            .query(&[("q", product_name)])
            .send()
            .await
            .map_err(|err| LookupError::Transport(err.to_string()))?;

        let status = res.status();
        if !status.is_success() {
            return Err(LookupError::Status {
                status: status.as_u16(),
            });
        }

        let text = res
            .text()
            .await
            .map_err(|err| LookupError::Transport(err.to_string()))?;

        parse_search_response(&text, product_name)
    }
}

pub fn parse_search_response(
    text: &str,
    product_name: &str,
) -> Result<ProductAttributes, LookupError> {
    let body = serde_json::from_str::<ProductSearchResponse>(text)
        .map_err(|err| LookupError::Malformed(err.to_string()))?;

    let product = best_match(&body.products, product_name)
        .ok_or_else(|| LookupError::NotFound(product_name.to_string()))?;

    let category = product.category.trim();
    if category.is_empty() {
        return Err(LookupError::Malformed(format!(
            "catalogue entry '{}' has no category",
            product.title
        )));
    }

    Ok(ProductAttributes {
        category: category.to_string(),
        brand: product
            .brand
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string),
        rating: product.rating.filter(|r| r.is_finite()),
    })
}

/// Exact (case-insensitive) title match first, otherwise the first hit.
fn best_match<'a>(products: &'a [CatalogProduct], product_name: &str) -> Option<&'a CatalogProduct> {
    products
        .iter()
        .find(|p| p.title.trim().eq_ignore_ascii_case(product_name.trim()))
        .or_else(|| products.first())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn prefers_exact_title_match() {
        let body = json!({
            "products": [
                {"id": 1, "title": "Laptop Stand", "category": "accessories", "brand": "Acme", "rating": 4.1},
                {"id": 2, "title": "laptop", "category": "laptops", "brand": "Apple", "rating": 4.7}
            ],
            "total": 2
        })
        .to_string();

        let attrs = parse_search_response(&body, "Laptop").unwrap();
        assert_eq!(attrs.category, "laptops");
        assert_eq!(attrs.brand.as_deref(), Some("Apple"));
        assert_eq!(attrs.rating, Some(4.7));
    }

    #[test]
    fn falls_back_to_first_hit_and_tolerates_missing_brand() {
        let body = json!({
            "products": [
                {"id": 7, "title": "Wireless Mouse Pro", "category": "mobile-accessories", "rating": 3.9}
            ]
        })
        .to_string();

        let attrs = parse_search_response(&body, "Mouse").unwrap();
        assert_eq!(attrs.category, "mobile-accessories");
        assert!(attrs.brand.is_none());
    }

    #[test]
    fn empty_result_is_not_found() {
        let body = json!({"products": [], "total": 0}).to_string();
        let err = parse_search_response(&body, "Widget").unwrap_err();
        assert_eq!(err, LookupError::NotFound("Widget".to_string()));
    }

    #[test]
    fn non_json_and_wrong_shape_are_malformed() {
        assert!(matches!(
            parse_search_response("<html>", "Widget"),
            Err(LookupError::Malformed(_))
        ));

        let body = json!({"products": [{"title": "Widget"}]}).to_string();
        assert!(matches!(
            parse_search_response(&body, "Widget"),
            Err(LookupError::Malformed(_))
        ));
    }

    #[test]
    fn builds_search_url_without_double_slash() {
        let lookup = HttpProductLookup::new("https://dummyjson.com/", Duration::from_secs(1)).unwrap();
        assert_eq!(lookup.url(), "https://dummyjson.com/products/search");
    }

    #[tokio::test]
    async fn unreachable_host_is_a_transport_error() {
        let lookup = HttpProductLookup::new("http://127.0.0.1:9", Duration::from_millis(500)).unwrap();
        let err = lookup.lookup("Widget").await.unwrap_err();
        assert!(matches!(err, LookupError::Transport(_)));
    }
}
