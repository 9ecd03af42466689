pub mod analytics;
pub mod clean;
pub mod domain;
pub mod enrich;
pub mod files;
pub mod filter;
pub mod pipeline;
pub mod report;
pub mod time;

pub mod config {
    use anyhow::Context;
    use std::path::PathBuf;

    pub const DEFAULT_INPUT_PATH: &str = "data/sales_data.txt";
    pub const DEFAULT_OUTPUT_DIR: &str = "output";
    pub const DEFAULT_DELIMITER: u8 = b',';
    pub const DEFAULT_PRODUCT_API_BASE_URL: &str = "https://dummyjson.com";
    pub const DEFAULT_PRODUCT_API_TIMEOUT_SECS: u64 = 10;

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub input_path: PathBuf,
        pub output_dir: PathBuf,
        pub delimiter: u8,
        pub product_api_base_url: Option<String>,
        pub product_api_timeout_secs: u64,
        pub low_performer_threshold: Option<u64>,
        pub top_n: Option<usize>,
        pub report_timestamp: Option<String>,
        pub region_filter: Option<String>,
        pub min_amount: Option<f64>,
        pub max_amount: Option<f64>,
        pub sentry_dsn: Option<String>,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            let delimiter = match std::env::var("SALES_DELIMITER").ok() {
                Some(raw) => parse_delimiter(&raw)?,
                None => DEFAULT_DELIMITER,
            };

            Ok(Self {
                input_path: std::env::var("SALES_INPUT_PATH")
                    .ok()
                    .filter(|s| !s.trim().is_empty())
                    .unwrap_or_else(|| DEFAULT_INPUT_PATH.to_string())
                    .into(),
                output_dir: std::env::var("SALES_OUTPUT_DIR")
                    .ok()
                    .filter(|s| !s.trim().is_empty())
                    .unwrap_or_else(|| DEFAULT_OUTPUT_DIR.to_string())
                    .into(),
                delimiter,
                product_api_base_url: std::env::var("PRODUCT_API_BASE_URL").ok(),
                product_api_timeout_secs: std::env::var("PRODUCT_API_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse::<u64>().ok())
                    .unwrap_or(DEFAULT_PRODUCT_API_TIMEOUT_SECS),
                low_performer_threshold: std::env::var("LOW_PERFORMER_THRESHOLD")
                    .ok()
                    .and_then(|s| s.parse::<u64>().ok()),
                top_n: std::env::var("REPORT_TOP_N")
                    .ok()
                    .and_then(|s| s.parse::<usize>().ok()),
                report_timestamp: std::env::var("SALES_REPORT_TIMESTAMP").ok(),
                region_filter: std::env::var("SALES_REGION_FILTER")
                    .ok()
                    .filter(|s| !s.trim().is_empty()),
                min_amount: std::env::var("SALES_MIN_AMOUNT")
                    .ok()
                    .and_then(|s| s.parse::<f64>().ok()),
                max_amount: std::env::var("SALES_MAX_AMOUNT")
                    .ok()
                    .and_then(|s| s.parse::<f64>().ok()),
                sentry_dsn: std::env::var("SENTRY_DSN").ok(),
            })
        }

        pub fn product_api_base_url(&self) -> &str {
            self.product_api_base_url
                .as_deref()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or(DEFAULT_PRODUCT_API_BASE_URL)
        }

        pub fn require_input_file(&self) -> anyhow::Result<&std::path::Path> {
            anyhow::ensure!(
                self.input_path.is_file(),
                "input file not found: {}",
                self.input_path.display()
            );
            Ok(self.input_path.as_path())
        }
    }

    /// Accepts a single ASCII character, or the names `tab` / `pipe`.
    pub fn parse_delimiter(raw: &str) -> anyhow::Result<u8> {
        let t = raw.trim_matches(|c| c == '\r' || c == '\n');
        match t.to_ascii_lowercase().as_str() {
            "tab" | "\\t" => return Ok(b'\t'),
            "pipe" => return Ok(b'|'),
            "comma" => return Ok(b','),
            _ => {}
        }

        let mut chars = t.chars();
        let c = chars.next().context("delimiter must not be empty")?;
        anyhow::ensure!(
            chars.next().is_none() && c.is_ascii(),
            "delimiter must be a single ASCII character (got {raw:?})"
        );
        Ok(c as u8)
    }

}
