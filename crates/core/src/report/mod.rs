//! Plain-text run report.
//!
//! [`compose_report`] is a pure function of its input: the generation
//! timestamp is passed in, so identical input yields an identical document.

pub mod format;

use crate::analytics::{AnalyticsSummary, ProductStat};
use crate::enrich::EnrichmentStats;
use crate::filter::FilterSummary;
use chrono::NaiveDateTime;
use format::{currency, fit, heavy_rule, light_rule, percent};
use std::collections::BTreeMap;
use std::fmt::{self, Write};

/// Rows shown in the daily trend table before the remainder is summarised.
pub const MAX_DAILY_ROWS: usize = 10;
/// Rows shown in the brand breakdown.
pub const MAX_BRAND_ROWS: usize = 10;

pub const NO_VALID_RECORDS: &str = "No valid records were found.";
pub const ENRICHMENT_SKIPPED: &str = "Enrichment was skipped for this run.";

#[derive(Debug, Clone)]
pub struct ReportInput<'a> {
    pub generated_at: NaiveDateTime,
    pub valid_count: usize,
    pub invalid_count: usize,
    pub summary: &'a AnalyticsSummary,
    /// `None` when no region or amount filter was set.
    pub filter: Option<&'a FilterSummary>,
    /// `None` when enrichment was skipped.
    pub enrichment: Option<&'a EnrichmentStats>,
}

pub fn compose_report(input: &ReportInput<'_>) -> String {
    let mut out = String::new();
    // fmt::Write for String is infallible.
    match write_report(&mut out, input) {
        Ok(()) => out,
        Err(fmt::Error) => String::new(),
    }
}

fn write_report(out: &mut String, input: &ReportInput<'_>) -> fmt::Result {
    header(out, input)?;
    executive_summary(out, input)?;
    region_analysis(out, input.summary)?;
    product_rankings(out, input.summary)?;
    customer_analysis(out, input.summary)?;
    daily_trend(out, input.summary)?;
    low_performers(out, input.summary)?;
    enrichment(out, input.enrichment)?;

    writeln!(out, "{}", heavy_rule())?;
    writeln!(out, "{:^width$}", "END OF REPORT", width = format::RULE_WIDTH)?;
    writeln!(out, "{}", heavy_rule())
}

fn section(out: &mut String, title: &str) -> fmt::Result {
    writeln!(out, "{}", heavy_rule())?;
    writeln!(out, "{title}")?;
    writeln!(out, "{}", heavy_rule())?;
    writeln!(out)
}

fn header(out: &mut String, input: &ReportInput<'_>) -> fmt::Result {
    writeln!(out, "{}", heavy_rule())?;
    writeln!(out, "{:^width$}", "SALES ANALYTICS REPORT", width = format::RULE_WIDTH)?;
    writeln!(out, "{}", heavy_rule())?;
    writeln!(out)?;
    writeln!(
        out,
        "Report Generated: {}",
        input.generated_at.format("%Y-%m-%d %H:%M:%S")
    )?;
    writeln!(out)
}

fn executive_summary(out: &mut String, input: &ReportInput<'_>) -> fmt::Result {
    let s = input.summary;
    section(out, "1. EXECUTIVE SUMMARY")?;

    writeln!(
        out,
        "Total Records Processed: {}",
        input.valid_count + input.invalid_count
    )?;
    writeln!(out, "Valid Records:           {}", input.valid_count)?;
    writeln!(out, "Invalid Records:         {}", input.invalid_count)?;
    if let Some(f) = input.filter {
        writeln!(out, "Filtered by Region:      {}", f.filtered_by_region)?;
        writeln!(out, "Filtered by Amount:      {}", f.filtered_by_amount)?;
        writeln!(out, "Records Analysed:        {}", f.kept)?;
    }
    writeln!(out, "Total Revenue:           {}", currency(s.total_revenue))?;

    if s.is_empty() {
        writeln!(out)?;
        writeln!(out, "{NO_VALID_RECORDS}")?;
        return writeln!(out);
    }

    writeln!(out, "Average Order Value:     {}", currency(s.average_order_value))?;
    if let Some((first, last)) = s.date_range {
        writeln!(out, "Date Range:              {first} to {last}")?;
    }
    writeln!(out)
}

fn no_data(out: &mut String) -> fmt::Result {
    writeln!(out, "No data.")?;
    writeln!(out)
}

fn region_analysis(out: &mut String, s: &AnalyticsSummary) -> fmt::Result {
    section(out, "2. REGION ANALYSIS")?;
    if s.regions.is_empty() {
        return no_data(out);
    }

    writeln!(
        out,
        "{:<16}{:>18}{:>10}{:>8}{:>18}",
        "Region", "Revenue", "Share", "Txns", "Avg Value"
    )?;
    writeln!(out, "{}", light_rule())?;
    for r in &s.regions {
        writeln!(
            out,
            "{:<16}{:>18}{:>10}{:>8}{:>18}",
            fit(&r.region, 15),
            currency(r.revenue),
            percent(r.percentage),
            r.transaction_count,
            currency(r.average_transaction_value())
        )?;
    }
    writeln!(out)
}

fn product_table(out: &mut String, title: &str, rows: &[ProductStat]) -> fmt::Result {
    writeln!(out, "{title}")?;
    writeln!(
        out,
        "{:<6}{:<32}{:>12}{:>20}",
        "Rank", "Product Name", "Qty Sold", "Revenue"
    )?;
    writeln!(out, "{}", light_rule())?;
    for (i, p) in rows.iter().enumerate() {
        writeln!(
            out,
            "{:<6}{:<32}{:>12}{:>20}",
            i + 1,
            fit(&p.product_name, 31),
            p.quantity,
            currency(p.revenue)
        )?;
    }
    writeln!(out)
}

fn product_rankings(out: &mut String, s: &AnalyticsSummary) -> fmt::Result {
    section(out, "3. PRODUCT RANKINGS")?;
    if s.is_empty() {
        return no_data(out);
    }

    product_table(
        out,
        &format!("Top {} Products by Quantity", s.top_n),
        &s.top_by_quantity,
    )?;
    product_table(
        out,
        &format!("Top {} Products by Revenue", s.top_n),
        &s.top_by_revenue,
    )
}

fn customer_analysis(out: &mut String, s: &AnalyticsSummary) -> fmt::Result {
    section(out, "4. CUSTOMER ANALYSIS")?;
    if s.customers.is_empty() {
        return no_data(out);
    }

    writeln!(out, "Total Customers: {}", s.customers.len())?;
    writeln!(out)?;
    writeln!(out, "Top {} Customers", s.top_n)?;
    writeln!(
        out,
        "{:<6}{:<16}{:>18}{:>10}{:>20}",
        "Rank", "Customer ID", "Total Spent", "Orders", "Avg Order"
    )?;
    writeln!(out, "{}", light_rule())?;
    for (i, c) in s.customers.iter().take(s.top_n).enumerate() {
        writeln!(
            out,
            "{:<6}{:<16}{:>18}{:>10}{:>20}",
            i + 1,
            fit(&c.customer_id, 15),
            currency(c.total_spent),
            c.purchase_count,
            currency(c.average_order_value)
        )?;
    }
    writeln!(out)
}

fn daily_trend(out: &mut String, s: &AnalyticsSummary) -> fmt::Result {
    section(out, "5. DAILY SALES TREND")?;
    if s.daily.is_empty() {
        return no_data(out);
    }

    writeln!(
        out,
        "{:<14}{:>20}{:>16}{:>20}",
        "Date", "Revenue", "Transactions", "Unique Customers"
    )?;
    writeln!(out, "{}", light_rule())?;
    for d in s.daily.iter().take(MAX_DAILY_ROWS) {
        writeln!(
            out,
            "{:<14}{:>20}{:>16}{:>20}",
            d.date.to_string(),
            currency(d.revenue),
            d.transaction_count,
            d.unique_customers
        )?;
    }
    if s.daily.len() > MAX_DAILY_ROWS {
        writeln!(out, "... ({} more days)", s.daily.len() - MAX_DAILY_ROWS)?;
    }
    writeln!(out)?;
    writeln!(out, "Total Days with Sales: {}", s.daily.len())?;

    if let Some(peak) = &s.peak_day {
        writeln!(
            out,
            "Peak Day: {} ({}, {} transactions)",
            peak.date,
            currency(peak.revenue),
            peak.transaction_count
        )?;
    }
    writeln!(out)
}

fn low_performers(out: &mut String, s: &AnalyticsSummary) -> fmt::Result {
    section(out, "6. LOW PERFORMING PRODUCTS")?;
    if s.is_empty() {
        return no_data(out);
    }

    if s.low_performers.is_empty() {
        writeln!(
            out,
            "No products sold fewer than {} units.",
            s.low_performer_threshold
        )?;
    } else {
        writeln!(out, "Products with quantity < {}:", s.low_performer_threshold)?;
        for p in &s.low_performers {
            writeln!(
                out,
                "  - {}: {} units, {}",
                p.product_name,
                p.quantity,
                currency(p.revenue)
            )?;
        }
    }
    writeln!(out)
}

/// Highest count first, name breaks ties.
fn ranked_counts(counts: &BTreeMap<String, usize>) -> Vec<(&str, usize)> {
    let mut rows: Vec<(&str, usize)> = counts.iter().map(|(k, v)| (k.as_str(), *v)).collect();
    rows.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    rows
}

fn enrichment(out: &mut String, stats: Option<&EnrichmentStats>) -> fmt::Result {
    section(out, "7. ENRICHMENT STATISTICS")?;
    let Some(stats) = stats else {
        writeln!(out, "{ENRICHMENT_SKIPPED}")?;
        return writeln!(out);
    };

    if stats.attempted == 0 {
        writeln!(out, "No products were looked up.")?;
        return writeln!(out);
    }

    writeln!(out, "Products Looked Up: {}", stats.attempted)?;
    writeln!(out, "Enriched:           {}", stats.succeeded)?;
    writeln!(out, "Failed:             {}", stats.failed)?;
    writeln!(out, "Success Rate:       {}", percent(stats.success_rate()))?;

    if !stats.categories.is_empty() {
        writeln!(out)?;
        writeln!(out, "Categories Found:")?;
        for (category, count) in ranked_counts(&stats.categories) {
            writeln!(out, "  {category}: {count} transactions")?;
        }
    }

    if !stats.brands.is_empty() {
        writeln!(out)?;
        writeln!(out, "Brands Found:")?;
        for (brand, count) in ranked_counts(&stats.brands).into_iter().take(MAX_BRAND_ROWS) {
            writeln!(out, "  {brand}: {count} transactions")?;
        }
    }

    if !stats.failures.is_empty() {
        writeln!(out)?;
        writeln!(out, "Products that could not be enriched:")?;
        for (name, reason) in &stats.failures {
            writeln!(out, "  - {name}: {reason}")?;
        }
    }
    writeln!(out)
}
