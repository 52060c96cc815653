//! SPI Atlas - well-being indicators to charts
//!
//! A CLI tool that loads a World Happiness Report table, derives a
//! composite Social Progress Index score, aggregates it by region and
//! renders a fixed sequence of charts.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (unreadable data, missing column, bad config, etc.)
//!   2 - A chart failed and --fail-on-chart-error was set

mod analysis;
mod charts;
mod cli;
mod config;
mod dataset;
mod error;
mod models;
mod pipeline;
mod report;

use anyhow::{Context, Result};
use chrono::Utc;
use cli::{Args, ReportFormat};
use config::Config;
use dataset::LoadOptions;
use models::{ChartStatus, Report, ReportMetadata};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Load and merge settings; they decide the log level
    let (config, source) = match load_config(&args) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    };

    init_logging(config.log_level(args.quiet));

    info!("SPI Atlas v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);
    source.log();

    match run(args, config) {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Run failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .spi-atlas.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(config::DEFAULT_CONFIG_FILE);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            config::DEFAULT_CONFIG_FILE
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", config::DEFAULT_CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", config::DEFAULT_CONFIG_FILE);
    println!("   Edit it to choose charts, output directory and report contents.");
    Ok(())
}

/// Initialize logging at the given level.
fn init_logging(level: tracing::Level) {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Run the complete pipeline. Returns exit code (0 or 2).
fn run(args: Args, config: Config) -> Result<i32> {
    let start_time = Instant::now();

    let data_path = args.data.clone().context("No data file given")?;
    let quiet = args.quiet;

    // Step 1: Load the table
    if !quiet {
        println!("📥 Loading data: {}", data_path.display());
    }
    let options = LoadOptions {
        delimiter: config.delimiter_byte()?,
        ..LoadOptions::default()
    };
    let table = dataset::load_table(&data_path, &options)
        .with_context(|| format!("Failed to load {}", data_path.display()))?;

    // Step 2: Derive, aggregate, select
    if !quiet {
        println!("🔬 Deriving SPI score and regional aggregates...");
    }
    let analysis = pipeline::analyze(table, config.charts.top_n)?;

    // Step 3: Render the chart sequence
    if !quiet {
        match config.general.output_dir {
            Some(ref dir) => println!(
                "📈 Rendering {} charts to {} ({})",
                config.charts.enabled.len(),
                dir.display(),
                config.charts.format.extension()
            ),
            None => println!(
                "📈 Building {} charts (no --output-dir, nothing will be written)",
                config.charts.enabled.len()
            ),
        }
    }
    let mut renderer = charts::PlotlyRenderer::new(
        config.general.output_dir.clone(),
        config.charts.format,
        config.charts.plotly_cdn.clone(),
    );
    let outcomes =
        pipeline::render_charts(&analysis, &config.charts.enabled, &mut renderer, !quiet);

    // Step 4: Summarize
    let (happiest, spi_leaders) = pipeline::leaders(&analysis.table, config.report.leaders)?;
    let report = Report {
        metadata: ReportMetadata {
            data_path: data_path.display().to_string(),
            analysis_date: Utc::now(),
            countries: analysis.table.n_rows(),
            regions: analysis.regional.rows.len(),
            incomplete_rows: analysis.incomplete.len(),
            duration_seconds: start_time.elapsed().as_secs_f64(),
        },
        happiest,
        spi_leaders,
        correlation: config
            .report
            .include_correlation
            .then(|| analysis.correlation.clone()),
        regional: config
            .report
            .include_regions
            .then(|| analysis.regional.clone()),
        charts: outcomes,
    };

    if let Some(ref path) = args.report {
        let output = match args.report_format {
            ReportFormat::Json => report::generate_json_report(&report)?,
            ReportFormat::Markdown => report::generate_markdown_report(&report),
        };
        std::fs::write(path, &output)
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
        info!("Report written to {}", path.display());
    }

    if !quiet {
        print_summary(&report);
    }

    let failed = report.failed_charts();
    if failed > 0 {
        warn!("{} chart(s) failed", failed);
        if args.fail_on_chart_error {
            eprintln!(
                "\n⛔ {} chart(s) failed. Failing (exit code 2).",
                failed
            );
            return Ok(2);
        }
    }

    Ok(0)
}

fn print_summary(report: &Report) {
    println!("\n📊 Summary:");
    println!("   Countries: {}", report.metadata.countries);
    println!("   Regions: {}", report.metadata.regions);
    if report.metadata.incomplete_rows > 0 {
        println!(
            "   Rows without SPI score: {}",
            report.metadata.incomplete_rows
        );
    }
    if let Some(top) = report.happiest.first() {
        println!("   Happiest: {} ({})", top.country, top.region);
    }
    if let Some(top) = report.spi_leaders.first() {
        println!("   Highest SPI score: {} ({})", top.country, top.region);
    }
    for chart in &report.charts {
        if !matches!(chart.status, ChartStatus::Skipped) {
            println!("   {} {}: {}", chart.status.emoji(), chart.id, chart.status);
        }
    }
    println!("   Duration: {:.2}s", report.metadata.duration_seconds);
    println!("\n✅ Done.");
}

/// Where the settings came from, logged once logging is up.
enum ConfigSource {
    File(PathBuf),
    Defaults,
    Invalid(anyhow::Error),
}

impl ConfigSource {
    fn log(&self) {
        match self {
            ConfigSource::File(path) => info!("Loaded config from {}", path.display()),
            ConfigSource::Defaults => debug!("No config file found, using defaults"),
            ConfigSource::Invalid(e) => warn!("Failed to load config: {:#}", e),
        }
    }
}

/// Load configuration from file or defaults, merge the CLI flags over it
/// and validate the result.
fn load_config(args: &Args) -> Result<(Config, ConfigSource)> {
    let (mut config, source) = match args.config {
        Some(ref path) => (Config::load(path)?, ConfigSource::File(path.clone())),
        None => match Config::load_default() {
            Ok(Some(config)) => (
                config,
                ConfigSource::File(PathBuf::from(config::DEFAULT_CONFIG_FILE)),
            ),
            Ok(None) => (Config::default(), ConfigSource::Defaults),
            Err(e) => (Config::default(), ConfigSource::Invalid(e)),
        },
    };

    config.merge_with_args(args);
    config.validate().context("Invalid configuration")?;
    Ok((config, source))
}
