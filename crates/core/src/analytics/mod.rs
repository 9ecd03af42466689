//! Aggregate statistics over the clean record set.

use crate::domain::record::SalesRecord;
use chrono::NaiveDate;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

/// Products selling fewer units than this are flagged as low performers.
pub const DEFAULT_LOW_PERFORMER_THRESHOLD: u64 = 10;
pub const DEFAULT_TOP_N: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalyticsOptions {
    pub top_n: usize,
    pub low_performer_threshold: u64,
}

impl Default for AnalyticsOptions {
    fn default() -> Self {
        Self {
            top_n: DEFAULT_TOP_N,
            low_performer_threshold: DEFAULT_LOW_PERFORMER_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionStat {
    pub region: String,
    pub revenue: f64,
    pub percentage: f64,
    pub transaction_count: usize,
}

impl RegionStat {
    pub fn average_transaction_value(&self) -> f64 {
        if self.transaction_count == 0 {
            return 0.0;
        }
        self.revenue / self.transaction_count as f64
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductStat {
    pub product_name: String,
    pub quantity: u64,
    pub revenue: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomerStat {
    pub customer_id: String,
    pub total_spent: f64,
    pub purchase_count: usize,
    pub average_order_value: f64,
    pub products_bought: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyStat {
    pub date: NaiveDate,
    pub revenue: f64,
    pub transaction_count: usize,
    pub unique_customers: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyticsSummary {
    pub record_count: usize,
    pub total_revenue: f64,
    pub average_order_value: f64,
    pub date_range: Option<(NaiveDate, NaiveDate)>,
    pub regions: Vec<RegionStat>,
    pub top_by_quantity: Vec<ProductStat>,
    pub top_by_revenue: Vec<ProductStat>,
    pub customers: Vec<CustomerStat>,
    pub daily: Vec<DailyStat>,
    pub peak_day: Option<DailyStat>,
    pub low_performers: Vec<ProductStat>,
    pub low_performer_threshold: u64,
    pub top_n: usize,
}

impl AnalyticsSummary {
    pub fn empty(opts: &AnalyticsOptions) -> Self {
        Self {
            record_count: 0,
            total_revenue: 0.0,
            average_order_value: 0.0,
            date_range: None,
            regions: Vec::new(),
            top_by_quantity: Vec::new(),
            top_by_revenue: Vec::new(),
            customers: Vec::new(),
            daily: Vec::new(),
            peak_day: None,
            low_performers: Vec::new(),
            low_performer_threshold: opts.low_performer_threshold,
            top_n: opts.top_n,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.record_count == 0
    }
}

pub fn summarize(records: &[SalesRecord], opts: &AnalyticsOptions) -> AnalyticsSummary {
    if records.is_empty() {
        return AnalyticsSummary::empty(opts);
    }

    let total_revenue: f64 = records.iter().map(SalesRecord::revenue).sum();
    let products = product_totals(records);

    let mut top_by_quantity = products.clone();
    top_by_quantity.sort_by(|a, b| {
        b.quantity
            .cmp(&a.quantity)
            .then_with(|| a.product_name.cmp(&b.product_name))
    });
    top_by_quantity.truncate(opts.top_n);

    let mut top_by_revenue = products.clone();
    top_by_revenue.sort_by(|a, b| {
        desc_f64(a.revenue, b.revenue).then_with(|| a.product_name.cmp(&b.product_name))
    });
    top_by_revenue.truncate(opts.top_n);

    let daily = daily_trend(records);
    let peak_day = peak_day(&daily);
    let date_range = match (daily.first(), daily.last()) {
        (Some(first), Some(last)) => Some((first.date, last.date)),
        _ => None,
    };

    AnalyticsSummary {
        record_count: records.len(),
        total_revenue,
        average_order_value: total_revenue / records.len() as f64,
        date_range,
        regions: region_breakdown(records, total_revenue),
        top_by_quantity,
        top_by_revenue,
        customers: customer_breakdown(records),
        daily,
        peak_day,
        low_performers: low_performers(products, opts.low_performer_threshold),
        low_performer_threshold: opts.low_performer_threshold,
        top_n: opts.top_n,
    }
}

fn desc_f64(a: f64, b: f64) -> Ordering {
    b.partial_cmp(&a).unwrap_or(Ordering::Equal)
}

pub fn region_breakdown(records: &[SalesRecord], total_revenue: f64) -> Vec<RegionStat> {
    let mut groups: BTreeMap<&str, (f64, usize)> = BTreeMap::new();
    for r in records {
        let entry = groups.entry(r.region.as_str()).or_default();
        entry.0 += r.revenue();
        entry.1 += 1;
    }

    let mut out: Vec<RegionStat> = groups
        .into_iter()
        .map(|(region, (revenue, count))| RegionStat {
            region: region.to_string(),
            revenue,
            percentage: if total_revenue > 0.0 {
                revenue / total_revenue * 100.0
            } else {
                0.0
            },
            transaction_count: count,
        })
        .collect();

    out.sort_by(|a, b| desc_f64(a.revenue, b.revenue).then_with(|| a.region.cmp(&b.region)));
    out
}

/// Per-product totals in product-name order.
pub fn product_totals(records: &[SalesRecord]) -> Vec<ProductStat> {
    let mut groups: BTreeMap<&str, (u64, f64)> = BTreeMap::new();
    for r in records {
        let entry = groups.entry(r.product_name.as_str()).or_default();
        entry.0 = entry.0.saturating_add(r.quantity);
        entry.1 += r.revenue();
    }

    groups
        .into_iter()
        .map(|(name, (quantity, revenue))| ProductStat {
            product_name: name.to_string(),
            quantity,
            revenue,
        })
        .collect()
}

pub fn customer_breakdown(records: &[SalesRecord]) -> Vec<CustomerStat> {
    let mut groups: BTreeMap<&str, (f64, usize, BTreeSet<&str>)> = BTreeMap::new();
    for r in records {
        let entry = groups.entry(r.customer_id.as_str()).or_default();
        entry.0 += r.revenue();
        entry.1 += 1;
        entry.2.insert(r.product_name.as_str());
    }

    let mut out: Vec<CustomerStat> = groups
        .into_iter()
        .map(|(id, (spent, count, products))| CustomerStat {
            customer_id: id.to_string(),
            total_spent: spent,
            purchase_count: count,
            average_order_value: spent / count as f64,
            products_bought: products.into_iter().map(str::to_string).collect(),
        })
        .collect();

    out.sort_by(|a, b| {
        desc_f64(a.total_spent, b.total_spent).then_with(|| a.customer_id.cmp(&b.customer_id))
    });
    out
}

/// Per-day totals in chronological order.
pub fn daily_trend(records: &[SalesRecord]) -> Vec<DailyStat> {
    let mut groups: BTreeMap<NaiveDate, (f64, usize, BTreeSet<&str>)> = BTreeMap::new();
    for r in records {
        let entry = groups.entry(r.date).or_default();
        entry.0 += r.revenue();
        entry.1 += 1;
        entry.2.insert(r.customer_id.as_str());
    }

    groups
        .into_iter()
        .map(|(date, (revenue, count, customers))| DailyStat {
            date,
            revenue,
            transaction_count: count,
            unique_customers: customers.len(),
        })
        .collect()
}

/// Highest-revenue day; `daily` must be chronological so the earliest date
/// wins a tie.
pub fn peak_day(daily: &[DailyStat]) -> Option<DailyStat> {
    let mut best: Option<&DailyStat> = None;
    for day in daily {
        match best {
            Some(b) if day.revenue <= b.revenue => {}
            _ => best = Some(day),
        }
    }
    best.cloned()
}

pub fn low_performers(products: Vec<ProductStat>, threshold: u64) -> Vec<ProductStat> {
    let mut out: Vec<ProductStat> = products
        .into_iter()
        .filter(|p| p.quantity < threshold)
        .collect();
    out.sort_by(|a, b| {
        a.quantity
            .cmp(&b.quantity)
            .then_with(|| a.product_name.cmp(&b.product_name))
    });
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(
        id: &str,
        date: (i32, u32, u32),
        region: &str,
        product: &str,
        qty: u64,
        price: f64,
        customer: &str,
    ) -> SalesRecord {
        SalesRecord {
            transaction_id: id.to_string(),
            date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
            region: region.to_string(),
            product_name: product.to_string(),
            quantity: qty,
            unit_price: price,
            customer_id: customer.to_string(),
        }
    }

    fn sample() -> Vec<SalesRecord> {
        vec![
            rec("T1", (2024, 12, 1), "North", "Laptop", 2, 50.0, "C1"),
            rec("T2", (2024, 12, 1), "South", "Mouse", 20, 5.0, "C2"),
            rec("T3", (2024, 12, 2), "South", "Laptop", 1, 50.0, "C1"),
            rec("T4", (2024, 12, 3), "East", "Cable", 4, 2.5, "C3"),
            rec("T5", (2024, 12, 3), "North", "Mouse", 10, 5.0, "C2"),
        ]
    }

    #[test]
    fn region_revenue_and_percentages_add_up() {
        let records = vec![
            rec("T1", (2024, 1, 1), "North", "Widget", 10, 10.0, "C1"),
            rec("T2", (2024, 1, 1), "South", "Widget", 30, 10.0, "C2"),
        ];
        let s = summarize(&records, &AnalyticsOptions::default());

        assert_eq!(s.total_revenue, 400.0);
        assert_eq!(s.regions.len(), 2);
        assert_eq!(s.regions[0].region, "South");
        assert!((s.regions[0].percentage - 75.0).abs() < 1e-9);
        assert_eq!(s.regions[1].region, "North");
        assert!((s.regions[1].percentage - 25.0).abs() < 1e-9);
    }

    #[test]
    fn region_totals_match_total_revenue() {
        let s = summarize(&sample(), &AnalyticsOptions::default());
        let sum: f64 = s.regions.iter().map(|r| r.revenue).sum();
        let pct: f64 = s.regions.iter().map(|r| r.percentage).sum();
        assert!((sum - s.total_revenue).abs() < 1e-9);
        assert!((pct - 100.0).abs() < 1e-9);
    }

    #[test]
    fn percentages_are_zero_when_there_is_no_revenue() {
        let regions = region_breakdown(&sample(), 0.0);
        assert!(regions.iter().all(|r| r.percentage == 0.0));
    }

    #[test]
    fn ranks_products_with_name_tiebreak() {
        let records = vec![
            rec("T1", (2024, 1, 1), "North", "Zeta", 5, 1.0, "C1"),
            rec("T2", (2024, 1, 1), "North", "Alpha", 5, 1.0, "C1"),
            rec("T3", (2024, 1, 1), "North", "Mid", 7, 0.5, "C1"),
        ];
        let s = summarize(&records, &AnalyticsOptions::default());

        let by_qty: Vec<_> = s.top_by_quantity.iter().map(|p| p.product_name.as_str()).collect();
        assert_eq!(by_qty, ["Mid", "Alpha", "Zeta"]);

        let by_rev: Vec<_> = s.top_by_revenue.iter().map(|p| p.product_name.as_str()).collect();
        assert_eq!(by_rev, ["Alpha", "Zeta", "Mid"]);

        let again = summarize(&records, &AnalyticsOptions::default());
        assert_eq!(s, again);
    }

    #[test]
    fn truncates_rankings_to_top_n() {
        let opts = AnalyticsOptions {
            top_n: 2,
            ..AnalyticsOptions::default()
        };
        let s = summarize(&sample(), &opts);
        assert_eq!(s.top_by_quantity.len(), 2);
        assert_eq!(s.top_by_quantity[0].product_name, "Mouse");
        assert_eq!(s.top_by_quantity[0].quantity, 30);
    }

    #[test]
    fn peak_day_prefers_earliest_on_tie() {
        let records = vec![
            rec("T1", (2024, 1, 3), "North", "Widget", 1, 100.0, "C1"),
            rec("T2", (2024, 1, 2), "North", "Widget", 1, 100.0, "C1"),
            rec("T3", (2024, 1, 1), "North", "Widget", 1, 50.0, "C1"),
        ];
        let s = summarize(&records, &AnalyticsOptions::default());
        let peak = s.peak_day.unwrap();
        assert_eq!(peak.date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert_eq!(peak.revenue, 100.0);
    }

    #[test]
    fn daily_trend_is_chronological_with_unique_customers() {
        let s = summarize(&sample(), &AnalyticsOptions::default());
        let dates: Vec<_> = s.daily.iter().map(|d| d.date.to_string()).collect();
        assert_eq!(dates, ["2024-12-01", "2024-12-02", "2024-12-03"]);
        assert_eq!(s.daily[0].unique_customers, 2);
        assert_eq!(s.daily[0].revenue, 200.0);
        assert_eq!(
            s.date_range,
            Some((
                NaiveDate::from_ymd_opt(2024, 12, 1).unwrap(),
                NaiveDate::from_ymd_opt(2024, 12, 3).unwrap()
            ))
        );
    }

    #[test]
    fn customers_sorted_by_spend_then_id() {
        let s = summarize(&sample(), &AnalyticsOptions::default());
        let ids: Vec<_> = s.customers.iter().map(|c| c.customer_id.as_str()).collect();
        assert_eq!(ids, ["C1", "C2", "C3"]);
        assert_eq!(s.customers[0].total_spent, 150.0);
        assert_eq!(s.customers[0].purchase_count, 2);
        assert_eq!(s.customers[0].average_order_value, 75.0);
        assert_eq!(s.customers[0].products_bought, ["Laptop"]);
        assert_eq!(s.customers[2].total_spent, 10.0);
    }

    #[test]
    fn flags_low_performers_below_threshold() {
        let s = summarize(&sample(), &AnalyticsOptions::default());
        let names: Vec<_> = s.low_performers.iter().map(|p| p.product_name.as_str()).collect();
        assert_eq!(names, ["Laptop", "Cable"]);
        assert_eq!(s.low_performer_threshold, DEFAULT_LOW_PERFORMER_THRESHOLD);
    }

    #[test]
    fn product_quantity_sums_saturate() {
        let records = vec![
            rec("T1", (2024, 1, 1), "North", "Widget", u64::MAX - 1, 1.0, "C1"),
            rec("T2", (2024, 1, 1), "North", "Widget", 5, 1.0, "C1"),
        ];
        let totals = product_totals(&records);
        assert_eq!(totals.len(), 1);
        assert_eq!(totals[0].quantity, u64::MAX);
    }

    #[test]
    fn empty_input_gives_empty_summary() {
        let s = summarize(&[], &AnalyticsOptions::default());
        assert!(s.is_empty());
        assert_eq!(s.total_revenue, 0.0);
        assert!(s.top_by_quantity.is_empty() && s.top_by_revenue.is_empty());
        assert!(s.peak_day.is_none());
        assert!(s.regions.is_empty());
    }
}
