use analytics::AnalysisResult;
use analyzer::{
    export_data, parse_series, DataSource, Dispatcher, ExportFormat, FileDataSource,
    RemoteDataSource, Report, ReportAssembler, ReportConfig,
};
use anyhow::Context;
use api_client::{ApiClient, BackendClient};
use clap::{Args, Parser, Subcommand};
use comfy_table::{presets::UTF8_FULL, Table};
use configuration::{Config, DataSourceKind, LoggingConfig};
use core_types::{AnalysisKind, AnalysisOptions, AnalysisRequest, AnalysisType};
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::Value;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// The main entry point for the Insight analysis application.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine; overrides can also come from the real environment.
    dotenvy::dotenv().ok();

    // Parse command-line arguments
    let cli = Cli::parse();
    let config = configuration::load_config(&cli.config)
        .with_context(|| format!("failed to load configuration from {}", cli.config.display()))?;

    // Held for the lifetime of the process so buffered log lines are flushed.
    let _log_guard = init_tracing(&config.logging)?;
    tracing::debug!(
        path = %cli.config.display(),
        remote = config.remote.enabled,
        "Configuration loaded."
    );

    // Execute the appropriate command
    match cli.command {
        Commands::Analyze(args) => handle_analyze(args, &config).await,
        Commands::Report(args) => handle_report(args, &config).await,
        Commands::Serve(args) => handle_serve(args, config).await,
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Statistical, trend, anomaly and frequency analysis over numeric series.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, global = true, default_value = "config.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one analysis over a series given inline or read from a file.
    Analyze(AnalyzeArgs),
    /// Run several analyses over a data source and assemble a report.
    Report(ReportArgs),
    /// Serve the HTTP API.
    Serve(ServeArgs),
}

#[derive(Args)]
struct AnalyzeArgs {
    /// statistical, trend, anomaly, frequency or basic.
    #[arg(long)]
    kind: AnalysisType,

    /// Comma-separated values, e.g. "1,2,3.5".
    #[arg(
        long,
        value_delimiter = ',',
        allow_hyphen_values = true,
        required_unless_present = "file",
        conflicts_with = "file"
    )]
    values: Vec<f64>,

    /// CSV or one-value-per-line file; the first column is read.
    #[arg(long)]
    file: Option<PathBuf>,

    /// Z-score threshold for anomaly detection.
    #[arg(long)]
    threshold: Option<f64>,

    /// Histogram bin count for frequency analysis.
    #[arg(long)]
    bins: Option<usize>,

    /// Print the raw JSON result instead of a table.
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct ReportArgs {
    /// Data source id, e.g. "sensor-1" for `{data_dir}/sensor-1.csv`.
    #[arg(long)]
    source: String,

    /// Comma-separated analysis kinds.
    #[arg(long, value_delimiter = ',', required = true)]
    kinds: Vec<AnalysisType>,

    #[arg(long)]
    title: Option<String>,

    /// Leave chart data out of the report.
    #[arg(long)]
    no_charts: bool,

    /// Export the report as csv, json or excel.
    #[arg(long)]
    export: Option<ExportFormat>,

    /// Write the report (or export) to this file instead of stdout.
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Args)]
struct ServeArgs {
    /// Overrides `server.addr` from the configuration.
    #[arg(long)]
    addr: Option<SocketAddr>,
}

// ==============================================================================
// Bootstrap
// ==============================================================================

/// Console logging filtered by `RUST_LOG` (falling back to `logging.level`),
/// plus a daily rolling file when `logging.directory` is set.
fn init_tracing(logging: &LoggingConfig) -> anyhow::Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .context("invalid logging.level filter")?;

    let (file_layer, guard) = match &logging.directory {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, &logging.file_prefix);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_writer(writer).with_ansi(false)),
                Some(guard),
            )
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .init();

    Ok(guard)
}

fn backend_client(config: &Config) -> anyhow::Result<Arc<dyn ApiClient>> {
    let client = BackendClient::new(&config.remote).context("failed to build the backend client")?;
    Ok(Arc::new(client))
}

/// Remote-first when `remote.enabled`, otherwise local only.
fn build_dispatcher(config: &Config) -> anyhow::Result<Dispatcher> {
    if config.remote.enabled {
        Ok(Dispatcher::new(Some(backend_client(config)?)))
    } else {
        Ok(Dispatcher::local_only())
    }
}

fn build_source(config: &Config) -> anyhow::Result<Arc<dyn DataSource>> {
    Ok(match config.report.data_source {
        DataSourceKind::File => Arc::new(FileDataSource::new(&config.report.data_dir)),
        DataSourceKind::Remote => Arc::new(RemoteDataSource::new(backend_client(config)?)),
    })
}

fn spinner(message: &'static str) -> anyhow::Result<ProgressBar> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(100));
    Ok(spinner)
}

// ==============================================================================
// Command Logic
// ==============================================================================

async fn handle_analyze(args: AnalyzeArgs, config: &Config) -> anyhow::Result<()> {
    let series = match &args.file {
        Some(path) => {
            let file = std::fs::File::open(path)
                .with_context(|| format!("failed to open {}", path.display()))?;
            parse_series(file)?
        }
        None => args.values.clone(),
    };

    let options = AnalysisOptions {
        threshold: args.threshold.or(Some(config.analysis.z_threshold)),
        bins: args.bins.or(Some(config.analysis.histogram_bins)),
    };
    let kind = AnalysisKind::from_parts(args.kind, &options)?;
    let request = AnalysisRequest::new(series, kind);

    let dispatcher = build_dispatcher(config)?;
    let progress = spinner("Analyzing...")?;
    let result = dispatcher.analyze(&request).await;
    progress.finish_and_clear();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_result(&result)?;
    }

    match result.error() {
        Some(error) => anyhow::bail!("{} analysis failed: {}", result.analysis_type(), error),
        None => Ok(()),
    }
}

async fn handle_report(args: ReportArgs, config: &Config) -> anyhow::Result<()> {
    let options = AnalysisOptions {
        threshold: Some(config.analysis.z_threshold),
        bins: Some(config.analysis.histogram_bins),
    };
    let assembler =
        ReportAssembler::new(build_dispatcher(config)?, build_source(config)?).with_options(options);

    let mut report_config = ReportConfig::new(args.source, args.kinds);
    report_config.title = args.title;
    report_config.include_charts = config.report.include_charts && !args.no_charts;

    let progress = spinner("Generating report...")?;
    let report = assembler.generate_report(report_config).await;
    progress.finish_and_clear();
    let report = report?;

    match (args.export, &args.output) {
        (Some(format), output) => {
            let exported = export_data(&serde_json::to_value(&report)?, format)?;
            write_or_print(output.as_ref(), &exported.body)?;
        }
        (None, Some(output)) => {
            write_or_print(Some(output), &serde_json::to_string_pretty(&report)?)?;
        }
        (None, None) => print_report(&report)?,
    }
    Ok(())
}

async fn handle_serve(args: ServeArgs, mut config: Config) -> anyhow::Result<()> {
    if let Some(addr) = args.addr {
        config.server.addr = addr;
    }
    web_server::run_server(&config).await
}

// ==============================================================================
// Output
// ==============================================================================

fn write_or_print(output: Option<&PathBuf>, body: &str) -> anyhow::Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, body).with_context(|| format!("failed to write {}", path.display()))?;
            println!("Wrote {}", path.display());
        }
        None => println!("{body}"),
    }
    Ok(())
}

/// Top-level fields as rows; nested values are shown as compact JSON.
fn metrics_table(payload: &Value) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(vec!["Metric", "Value"]);
    if let Value::Object(fields) = payload {
        for (key, value) in fields {
            let shown = match value {
                Value::Null => "n/a".to_string(),
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            table.add_row(vec![key.clone(), shown]);
        }
    }
    table
}

fn print_result(result: &AnalysisResult) -> anyhow::Result<()> {
    println!("{} analysis (source: {})", result.analysis_type(), result.source());
    if let Some(payload) = result.payload() {
        println!("{}", metrics_table(&serde_json::to_value(payload)?));
    }
    Ok(())
}

fn print_report(report: &Report) -> anyhow::Result<()> {
    if let Some(title) = &report.config.title {
        println!("{title}");
    }
    println!(
        "Report {} | {} data points | {} analyses",
        report.metadata.report_id, report.metadata.data_points, report.metadata.analysis_count
    );
    for (kind, payload) in report.analyses.iter() {
        println!("\n{kind}");
        println!("{}", metrics_table(&serde_json::to_value(payload)?));
    }
    println!("\n{}", report.summary);
    Ok(())
}
