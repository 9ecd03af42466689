//! End-to-end batch run: read, validate, write clean/invalid, summarise,
//! enrich, write enriched output and the report.

use crate::analytics::{summarize, AnalyticsOptions};
use crate::clean::clean_lines;
use crate::enrich::{apply_enrichment, enrich_records, EnrichmentStats, ProductLookup};
use crate::files::{self, OutputPaths};
use crate::filter::{FilterSummary, RecordFilter};
use crate::report::{compose_report, ReportInput};
use anyhow::Result;
use chrono::NaiveDateTime;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct RunConfig {
    pub input_path: PathBuf,
    pub output_dir: PathBuf,
    pub delimiter: u8,
    pub analytics: AnalyticsOptions,
    pub filter: RecordFilter,
    pub skip_enrichment: bool,
    pub generated_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub total_lines: usize,
    pub valid_count: usize,
    pub invalid_count: usize,
    pub filter: FilterSummary,
    pub total_revenue: f64,
    /// `None` when enrichment did not run.
    pub enrichment: Option<EnrichmentStats>,
    pub outputs: OutputPaths,
}

/// Runs every stage in order. Only I/O failures are returned as errors;
/// bad records and failed lookups end up in the output files.
pub async fn run(config: &RunConfig, lookup: Option<&dyn ProductLookup>) -> Result<RunSummary> {
    config.filter.validate()?;
    let outputs = OutputPaths::in_dir(&config.output_dir);

    let input = files::read_input(&config.input_path, config.delimiter)?;
    let outcome = clean_lines(&input.lines, config.delimiter);

    tracing::info!(
        total = outcome.total(),
        valid = outcome.valid_count(),
        invalid = outcome.invalid_count(),
        "validated input records"
    );

    files::write_cleaned(&outputs.cleaned, &outcome.valid, config.delimiter)?;
    files::write_invalid(&outputs.invalid, &outcome.rejected)?;

    let (analysed, filter_summary) = config.filter.apply(&outcome.valid);
    let summary = summarize(&analysed, &config.analytics);

    let enrichment = match lookup {
        Some(lookup) if !config.skip_enrichment && !analysed.is_empty() => {
            let (enriched, stats) = enrich_records(lookup, &analysed).await;
            files::write_enriched(&outputs.enriched, &enriched, config.delimiter)?;
            Some(stats)
        }
        _ => {
            tracing::info!(
                skip_enrichment = config.skip_enrichment,
                has_lookup = lookup.is_some(),
                analysed = analysed.len(),
                "skipping product enrichment"
            );
            let unmatched = apply_enrichment(&analysed, &EnrichmentStats::default());
            files::write_enriched(&outputs.enriched, &unmatched, config.delimiter)?;
            None
        }
    };

    let report = compose_report(&ReportInput {
        generated_at: config.generated_at,
        valid_count: outcome.valid_count(),
        invalid_count: outcome.invalid_count(),
        summary: &summary,
        filter: config.filter.is_active().then_some(&filter_summary),
        enrichment: enrichment.as_ref(),
    });
    files::write_text(&outputs.report, &report)?;

    tracing::info!(
        report = %outputs.report.display(),
        revenue = summary.total_revenue,
        "sales run complete"
    );

    Ok(RunSummary {
        total_lines: outcome.total(),
        valid_count: outcome.valid_count(),
        invalid_count: outcome.invalid_count(),
        filter: filter_summary,
        total_revenue: summary.total_revenue,
        enrichment,
        outputs,
    })
}
