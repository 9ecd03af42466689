//! Line-level validation and normalization of raw sales rows.
//!
//! Every line handed to [`clean_lines`] ends up either as a [`SalesRecord`]
//! or as a [`Rejection`] carrying the first rule it broke.

pub mod text;

use crate::domain::record::{SalesRecord, SALES_COLUMNS};
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

static TRANSACTION_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"^T[A-Z]*[0-9]+$").unwrap());
static CUSTOMER_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"^C[A-Z]*[0-9]+$").unwrap());

const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%Y/%m/%d"];

/// Largest accepted quantity per line. Keeps per-product sums far from `u64::MAX`.
pub const MAX_QUANTITY: u64 = 1_000_000;
/// Largest accepted unit price. With [`MAX_QUANTITY`] every revenue stays finite.
pub const MAX_UNIT_PRICE: f64 = 1_000_000_000.0;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RejectReason {
    #[error("unparseable line: {0}")]
    Unparseable(String),

    #[error("expected {expected} fields, found {found}")]
    FieldCount { expected: usize, found: usize },

    #[error("missing {0}")]
    MissingField(&'static str),

    #[error("transaction_id must look like T<digits> (got '{0}')")]
    TransactionId(String),

    #[error("customer_id must look like C<digits> (got '{0}')")]
    CustomerId(String),

    #[error("invalid quantity '{0}'")]
    InvalidQuantity(String),

    #[error("quantity must be > 0 (got '{0}')")]
    NonPositiveQuantity(String),

    #[error("quantity exceeds {max} (got '{raw}')")]
    QuantityTooLarge { raw: String, max: u64 },

    #[error("invalid unit_price '{0}'")]
    InvalidUnitPrice(String),

    #[error("unit_price must be > 0 (got '{0}')")]
    NonPositiveUnitPrice(String),

    #[error("unit_price exceeds {max} (got '{raw}')")]
    UnitPriceTooLarge { raw: String, max: f64 },

    #[error("unreadable characters in {0}")]
    EncodingArtifact(&'static str),

    #[error("invalid date '{0}'")]
    InvalidDate(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Rejection {
    pub raw_line: String,
    pub reason: RejectReason,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationOutcome {
    pub valid: Vec<SalesRecord>,
    pub rejected: Vec<Rejection>,
}

impl ValidationOutcome {
    pub fn valid_count(&self) -> usize {
        self.valid.len()
    }

    pub fn invalid_count(&self) -> usize {
        self.rejected.len()
    }

    pub fn total(&self) -> usize {
        self.valid.len() + self.rejected.len()
    }
}

pub fn clean_lines<I, S>(lines: I, delimiter: u8) -> ValidationOutcome
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out = ValidationOutcome::default();
    for line in lines {
        let line = line.as_ref();
        match validate_line(line, delimiter) {
            Ok(record) => out.valid.push(record),
            Err(reason) => out.rejected.push(Rejection {
                raw_line: line.trim_end_matches(['\r', '\n']).to_string(),
                reason,
            }),
        }
    }

    tracing::debug!(
        valid = out.valid_count(),
        invalid = out.invalid_count(),
        "validation finished"
    );
    out
}

pub fn validate_line(line: &str, delimiter: u8) -> Result<SalesRecord, RejectReason> {
    let fields = split_fields(line, delimiter)?;
    if fields.len() != SALES_COLUMNS.len() {
        return Err(RejectReason::FieldCount {
            expected: SALES_COLUMNS.len(),
            found: fields.len(),
        });
    }

    let transaction_id = text::normalize_text(&fields[0]).to_uppercase();
    let raw_date = fields[1].trim();
    let region = text::normalize_text(&fields[2]);
    let product_name = text::normalize_text(&fields[3].replace(',', " "));
    let raw_quantity = fields[4].trim();
    let raw_unit_price = fields[5].trim();
    let customer_id = text::normalize_text(&fields[6]).to_uppercase();

    let values = [
        transaction_id.as_str(),
        raw_date,
        region.as_str(),
        product_name.as_str(),
        raw_quantity,
        raw_unit_price,
        customer_id.as_str(),
    ];
    for (name, value) in SALES_COLUMNS.iter().zip(values) {
        if value.is_empty() {
            return Err(RejectReason::MissingField(*name));
        }
    }

    if !TRANSACTION_ID.is_match(&transaction_id) {
        return Err(RejectReason::TransactionId(transaction_id));
    }
    if !CUSTOMER_ID.is_match(&customer_id) {
        return Err(RejectReason::CustomerId(customer_id));
    }

    let quantity = parse_quantity(raw_quantity)?;
    let unit_price = parse_unit_price(raw_unit_price)?;

    for (name, value) in [("region", &region), ("product_name", &product_name)] {
        if text::has_replacement_char(value) {
            return Err(RejectReason::EncodingArtifact(name));
        }
    }

    let date = parse_date(raw_date)?;

    Ok(SalesRecord {
        transaction_id,
        date,
        region: text::title_case(&region),
        product_name: text::title_case(&product_name),
        quantity,
        unit_price,
        customer_id,
    })
}

fn split_fields(line: &str, delimiter: u8) -> Result<Vec<String>, RejectReason> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(line.as_bytes());

    let mut record = csv::StringRecord::new();
    match rdr.read_record(&mut record) {
        Ok(true) => Ok(record.iter().map(str::to_string).collect()),
        Ok(false) => Ok(Vec::new()),
        Err(err) => Err(RejectReason::Unparseable(err.to_string())),
    }
}

fn strip_thousands(raw: &str) -> String {
    raw.chars().filter(|c| *c != ',').collect()
}

fn parse_quantity(raw: &str) -> Result<u64, RejectReason> {
    let cleaned = strip_thousands(raw);
    let value = match cleaned.parse::<i64>() {
        Ok(v) => v as f64,
        // "3.0" is still a whole number of units.
        Err(_) => match cleaned.parse::<f64>() {
            Ok(f) if f.is_finite() && f.fract() == 0.0 => f,
            _ => return Err(RejectReason::InvalidQuantity(raw.to_string())),
        },
    };

    if value <= 0.0 {
        return Err(RejectReason::NonPositiveQuantity(raw.to_string()));
    }
    if value > MAX_QUANTITY as f64 {
        return Err(RejectReason::QuantityTooLarge {
            raw: raw.to_string(),
            max: MAX_QUANTITY,
        });
    }
    Ok(value as u64)
}

fn parse_unit_price(raw: &str) -> Result<f64, RejectReason> {
    let cleaned = strip_thousands(raw);
    let cleaned = cleaned.strip_prefix('$').unwrap_or(cleaned.as_str());
    let value = cleaned
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| RejectReason::InvalidUnitPrice(raw.to_string()))?;

    if value <= 0.0 {
        return Err(RejectReason::NonPositiveUnitPrice(raw.to_string()));
    }
    if value > MAX_UNIT_PRICE {
        return Err(RejectReason::UnitPriceTooLarge {
            raw: raw.to_string(),
            max: MAX_UNIT_PRICE,
        });
    }
    Ok(value)
}

fn parse_date(raw: &str) -> Result<NaiveDate, RejectReason> {
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        .ok_or_else(|| RejectReason::InvalidDate(raw.to_string()))
}
