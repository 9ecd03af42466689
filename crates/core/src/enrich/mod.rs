pub mod http;
pub mod types;

use crate::domain::record::{EnrichedRecord, ProductAttributes, SalesRecord};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LookupError {
    #[error("request failed: {0}")]
    Transport(String),

    #[error("HTTP {status}")]
    Status { status: u16 },

    #[error("no catalogue entry for '{0}'")]
    NotFound(String),

    #[error("malformed response: {0}")]
    Malformed(String),
}

#[async_trait::async_trait]
pub trait ProductLookup: Send + Sync {
    fn provider_name(&self) -> &'static str;

    async fn lookup(&self, product_name: &str) -> Result<ProductAttributes, LookupError>;
}

pub const UNKNOWN_ATTRIBUTE: &str = "Unknown";

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EnrichmentStats {
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub attributes: BTreeMap<String, ProductAttributes>,
    pub failures: BTreeMap<String, String>,
    /// Matched transactions per catalogue category.
    pub categories: BTreeMap<String, usize>,
    /// Matched transactions per brand; `Unknown` when the catalogue has none.
    pub brands: BTreeMap<String, usize>,
}

impl EnrichmentStats {
    pub fn success_rate(&self) -> f64 {
        if self.attempted == 0 {
            return 0.0;
        }
        self.succeeded as f64 / self.attempted as f64 * 100.0
    }

    /// Counts matched transactions by category and brand.
    pub fn tally(&mut self, enriched: &[EnrichedRecord]) {
        self.categories.clear();
        self.brands.clear();
        for e in enriched.iter().filter(|e| e.matched) {
            let category = e.category.as_deref().unwrap_or(UNKNOWN_ATTRIBUTE);
            *self.categories.entry(category.to_string()).or_default() += 1;
            let brand = e.brand.as_deref().unwrap_or(UNKNOWN_ATTRIBUTE);
            *self.brands.entry(brand.to_string()).or_default() += 1;
        }
    }

    fn record(&mut self, product_name: &str, result: Result<ProductAttributes, LookupError>) {
        self.attempted += 1;
        match result {
            Ok(attrs) => {
                self.succeeded += 1;
                self.attributes.insert(product_name.to_string(), attrs);
            }
            Err(err) => {
                self.failed += 1;
                self.failures
                    .insert(product_name.to_string(), err.to_string());
            }
        }
    }
}

/// Looks each distinct product name up once, in sorted order. Failures are
/// recorded and never abort the loop.
pub async fn lookup_products<I, S>(lookup: &dyn ProductLookup, names: I) -> EnrichmentStats
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let distinct: BTreeSet<String> = names
        .into_iter()
        .map(|s| s.as_ref().to_string())
        .collect();

    let mut stats = EnrichmentStats::default();
    for name in &distinct {
        let result = lookup.lookup(name).await;
        if let Err(err) = &result {
            tracing::warn!(
                provider = lookup.provider_name(),
                product = %name,
                error = %err,
                "product lookup failed; continuing without enrichment"
            );
        }
        stats.record(name, result);
    }

    tracing::info!(
        provider = lookup.provider_name(),
        attempted = stats.attempted,
        succeeded = stats.succeeded,
        failed = stats.failed,
        "product enrichment finished"
    );
    stats
}

pub fn apply_enrichment(records: &[SalesRecord], stats: &EnrichmentStats) -> Vec<EnrichedRecord> {
    records
        .iter()
        .map(|r| match stats.attributes.get(&r.product_name) {
            Some(attrs) => EnrichedRecord::with_attributes(r.clone(), attrs),
            None => EnrichedRecord::unmatched(r.clone()),
        })
        .collect()
}

pub async fn enrich_records(
    lookup: &dyn ProductLookup,
    records: &[SalesRecord],
) -> (Vec<EnrichedRecord>, EnrichmentStats) {
    let mut stats = lookup_products(lookup, records.iter().map(|r| r.product_name.as_str())).await;
    let enriched = apply_enrichment(records, &stats);
    stats.tally(&enriched);
    (enriched, stats)
}
