use anyhow::Context;
use clap::Parser;
use salesflow_core::analytics::{AnalyticsOptions, DEFAULT_LOW_PERFORMER_THRESHOLD, DEFAULT_TOP_N};
use salesflow_core::config::{parse_delimiter, Settings};
use salesflow_core::enrich::http::HttpProductLookup;
use salesflow_core::enrich::ProductLookup;
use salesflow_core::filter::RecordFilter;
use salesflow_core::pipeline::{self, RunConfig};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "salesflow_worker")]
struct Args {
    /// Raw sales file. Overrides SALES_INPUT_PATH.
    #[arg(long)]
    input: Option<PathBuf>,

    /// Directory for the cleaned, invalid, enriched and report files.
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Field delimiter: a single character, or `tab` / `pipe`.
    #[arg(long)]
    delimiter: Option<String>,

    #[arg(long)]
    low_performer_threshold: Option<u64>,

    /// Rows in each ranking table of the report.
    #[arg(long)]
    top_n: Option<usize>,

    /// Only analyse transactions from this region (case-insensitive).
    #[arg(long)]
    region: Option<String>,

    /// Drop transactions whose amount (quantity * unit price) is below this.
    #[arg(long)]
    min_amount: Option<f64>,

    /// Drop transactions whose amount is above this.
    #[arg(long)]
    max_amount: Option<f64>,

    /// Do not call the product catalogue.
    #[arg(long)]
    skip_enrichment: bool,

    /// Fixed report timestamp (YYYY-MM-DD[ HH:MM:SS]). Defaults to now (UTC).
    #[arg(long)]
    report_timestamp: Option<String>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();

    match run(settings, args).await {
        Ok(()) => Ok(()),
        Err(err) => {
            sentry_anyhow::capture_anyhow(&err);
            tracing::error!(error = %format!("{err:#}"), "sales run failed");
            Err(err)
        }
    }
}

async fn run(mut settings: Settings, args: Args) -> anyhow::Result<()> {
    if let Some(input) = args.input {
        settings.input_path = input;
    }
    if let Some(dir) = args.output_dir {
        settings.output_dir = dir;
    }
    if let Some(raw) = args.delimiter.as_deref() {
        settings.delimiter = parse_delimiter(raw).context("invalid --delimiter")?;
    }

    let input_path = settings.require_input_file()?.to_path_buf();

    let timestamp = args
        .report_timestamp
        .as_deref()
        .or(settings.report_timestamp.as_deref());
    let generated_at =
        salesflow_core::time::report_clock::resolve_generated_at(timestamp, chrono::Utc::now())?;

    let config = RunConfig {
        input_path,
        output_dir: settings.output_dir.clone(),
        delimiter: settings.delimiter,
        analytics: AnalyticsOptions {
            top_n: args.top_n.or(settings.top_n).unwrap_or(DEFAULT_TOP_N),
            low_performer_threshold: args
                .low_performer_threshold
                .or(settings.low_performer_threshold)
                .unwrap_or(DEFAULT_LOW_PERFORMER_THRESHOLD),
        },
        filter: RecordFilter {
            region: args.region.or(settings.region_filter.clone()),
            min_amount: args.min_amount.or(settings.min_amount),
            max_amount: args.max_amount.or(settings.max_amount),
        },
        skip_enrichment: args.skip_enrichment,
        generated_at,
    };

    config.filter.validate().context("invalid record filter")?;

    let lookup = if config.skip_enrichment {
        None
    } else {
        Some(HttpProductLookup::from_settings(&settings)?)
    };

    tracing::info!(
        input = %config.input_path.display(),
        output_dir = %config.output_dir.display(),
        skip_enrichment = config.skip_enrichment,
        %generated_at,
        "starting sales run"
    );

    let summary = pipeline::run(&config, lookup.as_ref().map(|l| l as &dyn ProductLookup)).await?;

    tracing::info!(
        total = summary.total_lines,
        valid = summary.valid_count,
        invalid = summary.invalid_count,
        enriched = summary.enrichment.as_ref().map(|s| s.succeeded).unwrap_or(0),
        report = %summary.outputs.report.display(),
        "sales run finished"
    );
    Ok(())
}

fn init_sentry(settings: &Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
