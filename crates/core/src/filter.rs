//! Optional narrowing of the clean record set before analysis.

use crate::domain::record::SalesRecord;
use serde::Serialize;

/// Region match is case-insensitive; amount bounds are inclusive and apply
/// to `quantity * unit_price`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordFilter {
    pub region: Option<String>,
    pub min_amount: Option<f64>,
    pub max_amount: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FilterSummary {
    pub input: usize,
    pub filtered_by_region: usize,
    pub filtered_by_amount: usize,
    pub kept: usize,
}

impl RecordFilter {
    pub fn is_active(&self) -> bool {
        self.region.is_some() || self.min_amount.is_some() || self.max_amount.is_some()
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        for (name, bound) in [("min amount", self.min_amount), ("max amount", self.max_amount)] {
            if let Some(v) = bound {
                anyhow::ensure!(v.is_finite() && v >= 0.0, "{name} must be a non-negative number (got {v})");
            }
        }
        if let (Some(min), Some(max)) = (self.min_amount, self.max_amount) {
            anyhow::ensure!(min <= max, "min amount {min} is greater than max amount {max}");
        }
        if let Some(region) = &self.region {
            anyhow::ensure!(!region.trim().is_empty(), "region filter must not be empty");
        }
        Ok(())
    }

    /// Region first, then amount; each step's drop count is reported.
    pub fn apply(&self, records: &[SalesRecord]) -> (Vec<SalesRecord>, FilterSummary) {
        let mut summary = FilterSummary {
            input: records.len(),
            ..FilterSummary::default()
        };

        let by_region: Vec<&SalesRecord> = match self.region.as_deref().map(str::trim) {
            Some(region) => records
                .iter()
                .filter(|r| r.region.eq_ignore_ascii_case(region))
                .collect(),
            None => records.iter().collect(),
        };
        summary.filtered_by_region = records.len() - by_region.len();

        let kept: Vec<SalesRecord> = by_region
            .iter()
            .filter(|r| self.amount_in_range(r.revenue()))
            .map(|r| (*r).clone())
            .collect();
        summary.filtered_by_amount = by_region.len() - kept.len();
        summary.kept = kept.len();

        if self.is_active() {
            tracing::info!(
                region = ?self.region,
                min_amount = ?self.min_amount,
                max_amount = ?self.max_amount,
                filtered_by_region = summary.filtered_by_region,
                filtered_by_amount = summary.filtered_by_amount,
                kept = summary.kept,
                "applied record filter"
            );
        }
        (kept, summary)
    }

    fn amount_in_range(&self, amount: f64) -> bool {
        self.min_amount.map_or(true, |min| amount >= min)
            && self.max_amount.map_or(true, |max| amount <= max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn rec(id: &str, region: &str, qty: u64, price: f64) -> SalesRecord {
        SalesRecord {
            transaction_id: id.to_string(),
            date: NaiveDate::from_ymd_opt(2024, 12, 1).unwrap(),
            region: region.to_string(),
            product_name: "Widget".to_string(),
            quantity: qty,
            unit_price: price,
            customer_id: "C1".to_string(),
        }
    }

    fn sample() -> Vec<SalesRecord> {
        vec![
            rec("T1", "North", 1, 50.0),
            rec("T2", "South", 2, 50.0),
            rec("T3", "North", 10, 50.0),
            rec("T4", "north", 4, 25.0),
        ]
    }

    #[test]
    fn inactive_filter_keeps_everything() {
        let filter = RecordFilter::default();
        let (kept, summary) = filter.apply(&sample());
        assert!(!filter.is_active());
        assert_eq!(kept, sample());
        assert_eq!(summary.kept, 4);
        assert_eq!(summary.filtered_by_region + summary.filtered_by_amount, 0);
    }

    #[test]
    fn region_then_amount_with_counts() {
        let filter = RecordFilter {
            region: Some("NORTH".to_string()),
            min_amount: Some(100.0),
            max_amount: Some(400.0),
        };
        let (kept, summary) = filter.apply(&sample());

        let ids: Vec<_> = kept.iter().map(|r| r.transaction_id.as_str()).collect();
        assert_eq!(ids, ["T4"]);
        assert_eq!(summary.input, 4);
        assert_eq!(summary.filtered_by_region, 1);
        assert_eq!(summary.filtered_by_amount, 2);
        assert_eq!(summary.kept, 1);
    }

    #[test]
    fn bounds_are_inclusive() {
        let filter = RecordFilter {
            min_amount: Some(50.0),
            max_amount: Some(100.0),
            ..RecordFilter::default()
        };
        let (kept, _) = filter.apply(&sample());
        let ids: Vec<_> = kept.iter().map(|r| r.transaction_id.as_str()).collect();
        assert_eq!(ids, ["T1", "T2", "T4"]);
    }

    #[test]
    fn rejects_inverted_or_negative_bounds() {
        let inverted = RecordFilter {
            min_amount: Some(10.0),
            max_amount: Some(5.0),
            ..RecordFilter::default()
        };
        assert!(inverted.validate().is_err());

        let negative = RecordFilter {
            min_amount: Some(-1.0),
            ..RecordFilter::default()
        };
        assert!(negative.validate().is_err());

        let blank = RecordFilter {
            region: Some("  ".to_string()),
            ..RecordFilter::default()
        };
        assert!(blank.validate().is_err());
        assert!(RecordFilter::default().validate().is_ok());
    }
}
