use anyhow::Context;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

const TIMESTAMP_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// Timestamp printed in the report header. An explicit value pins the header
/// so identical input produces a byte-identical report.
pub fn resolve_generated_at(
    arg: Option<&str>,
    now_utc: DateTime<Utc>,
) -> anyhow::Result<NaiveDateTime> {
    let Some(raw) = arg.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(now_utc.naive_utc());
    };

    for fmt in TIMESTAMP_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Ok(ts);
        }
    }

    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .with_context(|| format!("invalid report timestamp {raw:?}"))?;
    date.and_hms_opt(0, 0, 0)
        .context("invalid report timestamp: midnight out of range")
}
