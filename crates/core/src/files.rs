use crate::clean::Rejection;
use crate::domain::record::{EnrichedRecord, SalesRecord, SALES_COLUMNS};
use anyhow::{Context, Result};
use encoding_rs::WINDOWS_1252;
use std::path::{Path, PathBuf};

pub const CLEANED_FILE: &str = "sales_data_cleaned.csv";
pub const INVALID_FILE: &str = "invalid_records.txt";
pub const ENRICHED_FILE: &str = "enriched_sales_data.csv";
pub const REPORT_FILE: &str = "sales_report.txt";

const ENRICHMENT_COLUMNS: [&str; 4] = ["category", "brand", "rating", "matched"];

#[derive(Debug, Clone, PartialEq)]
pub struct InputFile {
    pub header: Option<String>,
    /// Non-blank data lines, in file order.
    pub lines: Vec<String>,
    pub encoding: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    pub cleaned: PathBuf,
    pub invalid: PathBuf,
    pub enriched: PathBuf,
    pub report: PathBuf,
}

impl OutputPaths {
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            cleaned: dir.join(CLEANED_FILE),
            invalid: dir.join(INVALID_FILE),
            enriched: dir.join(ENRICHED_FILE),
            report: dir.join(REPORT_FILE),
        }
    }
}

pub fn read_input(path: &Path, delimiter: u8) -> Result<InputFile> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("failed to read input file {}", path.display()))?;
    let (text, encoding) = decode_input(&bytes);

    let mut lines = text
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(str::to_string)
        .peekable();

    let header = match lines.peek() {
        Some(first) if is_header_line(first, delimiter) => lines.next(),
        _ => None,
    };

    let input = InputFile {
        header,
        lines: lines.collect(),
        encoding,
    };

    tracing::info!(
        path = %path.display(),
        encoding,
        lines = input.lines.len(),
        has_header = input.header.is_some(),
        "read input file"
    );
    Ok(input)
}

/// UTF-8 when the bytes allow it, Windows-1252 otherwise. A leading BOM is dropped.
pub fn decode_input(bytes: &[u8]) -> (String, &'static str) {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    match std::str::from_utf8(bytes) {
        Ok(s) => (s.to_string(), "UTF-8"),
        Err(_) => {
            let (cow, _) = WINDOWS_1252.decode_without_bom_handling(bytes);
            (cow.into_owned(), WINDOWS_1252.name())
        }
    }
}

fn is_header_line(line: &str, delimiter: u8) -> bool {
    let first = line
        .split(delimiter as char)
        .next()
        .unwrap_or("")
        .trim()
        .trim_matches('"');
    let key: String = first
        .chars()
        .filter(|c| *c != '_' && *c != ' ')
        .collect::<String>()
        .to_ascii_lowercase();
    key == "transactionid"
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory {}", parent.display()))?;
    }
    Ok(())
}

fn csv_writer(path: &Path, delimiter: u8) -> Result<csv::Writer<std::fs::File>> {
    ensure_parent(path)?;
    csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_path(path)
        .with_context(|| format!("failed to create {}", path.display()))
}

pub fn write_cleaned(path: &Path, records: &[SalesRecord], delimiter: u8) -> Result<()> {
    let mut w = csv_writer(path, delimiter)?;
    w.write_record(SALES_COLUMNS)
        .with_context(|| format!("failed to write {}", path.display()))?;
    for r in records {
        w.write_record(r.to_fields())
            .with_context(|| format!("failed to write {}", path.display()))?;
    }
    w.flush()
        .with_context(|| format!("failed to flush {}", path.display()))?;
    Ok(())
}

pub fn write_enriched(path: &Path, records: &[EnrichedRecord], delimiter: u8) -> Result<()> {
    let mut w = csv_writer(path, delimiter)?;
    let header = SALES_COLUMNS.iter().chain(ENRICHMENT_COLUMNS.iter());
    w.write_record(header)
        .with_context(|| format!("failed to write {}", path.display()))?;

    for e in records {
        let mut row: Vec<String> = e.record.to_fields().into();
        row.push(e.category.clone().unwrap_or_default());
        row.push(e.brand.clone().unwrap_or_default());
        row.push(e.rating.map(|r| format!("{r:.2}")).unwrap_or_default());
        row.push(e.matched.to_string());
        w.write_record(&row)
            .with_context(|| format!("failed to write {}", path.display()))?;
    }
    w.flush()
        .with_context(|| format!("failed to flush {}", path.display()))?;
    Ok(())
}

/// One rejection per line: `<raw line> | <reason>`.
pub fn write_invalid(path: &Path, rejected: &[Rejection]) -> Result<()> {
    let mut out = String::new();
    for r in rejected {
        out.push_str(&format!("{} | {}\n", r.raw_line, r.reason));
    }
    write_text(path, &out)
}

pub fn write_text(path: &Path, contents: &str) -> Result<()> {
    ensure_parent(path)?;
    std::fs::write(path, contents).with_context(|| format!("failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clean::RejectReason;
    use chrono::NaiveDate;

    fn record() -> SalesRecord {
        SalesRecord {
            transaction_id: "T001".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 12, 1).unwrap(),
            region: "North".to_string(),
            product_name: "Mouse Wireless".to_string(),
            quantity: 3,
            unit_price: 499.5,
            customer_id: "C001".to_string(),
        }
    }

    #[test]
    fn decodes_windows_1252_when_not_utf8() {
        let (text, enc) = decode_input(b"T1,2024-01-01,North,Caf\xe9,1,2,C1");
        assert_eq!(enc, "windows-1252");
        assert!(text.contains("Café"));

        let (text, enc) = decode_input("\u{FEFF}T1,Café".as_bytes());
        assert_eq!(enc, "UTF-8");
        assert_eq!(text, "T1,Café");
    }

    #[test]
    fn detects_header_variants() {
        assert!(is_header_line("transaction_id,date,region", b','));
        assert!(is_header_line("TransactionID|Date|ProductID", b'|'));
        assert!(!is_header_line("T001,2024-12-01,North", b','));
    }

    #[test]
    fn reads_header_and_drops_blank_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sales.csv");
        std::fs::write(
            &path,
            "transaction_id,date,region,product_name,quantity,unit_price,customer_id\n\
             T1,2024-01-01,North,Widget,3,10,C1\n\
             \n\
             T2,2024-01-02,South,Gadget,1,5,C2\r\n",
        )
        .unwrap();

        let input = read_input(&path, b',').unwrap();
        assert!(input.header.is_some());
        assert_eq!(input.lines.len(), 2);
        assert_eq!(input.lines[1], "T2,2024-01-02,South,Gadget,1,5,C2");
    }

    #[test]
    fn missing_input_names_the_file() {
        let err = read_input(Path::new("/definitely/not/here.csv"), b',').unwrap_err();
        assert!(format!("{err:#}").contains("/definitely/not/here.csv"));
    }

    #[test]
    fn writes_cleaned_and_enriched_files() {
        let dir = tempfile::tempdir().unwrap();
        let paths = OutputPaths::in_dir(&dir.path().join("nested"));

        write_cleaned(&paths.cleaned, &[record()], b',').unwrap();
        let cleaned = std::fs::read_to_string(&paths.cleaned).unwrap();
        assert_eq!(
            cleaned,
            "transaction_id,date,region,product_name,quantity,unit_price,customer_id\n\
             T001,2024-12-01,North,Mouse Wireless,3,499.50,C001\n"
        );

        let enriched = vec![EnrichedRecord::unmatched(record())];
        write_enriched(&paths.enriched, &enriched, b',').unwrap();
        let text = std::fs::read_to_string(&paths.enriched).unwrap();
        let mut lines = text.lines();
        assert!(lines.next().unwrap().ends_with("category,brand,rating,matched"));
        assert!(lines.next().unwrap().ends_with("C001,,,,false"));
    }

    #[test]
    fn writes_one_rejection_per_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(INVALID_FILE);
        let rejected = vec![Rejection {
            raw_line: "TXN2,,North,Gadget,-1,5,C2".to_string(),
            reason: RejectReason::MissingField("date"),
        }];

        write_invalid(&path, &rejected).unwrap();
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "TXN2,,North,Gadget,-1,5,C2 | missing date\n"
        );
    }
}
