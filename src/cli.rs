//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::charts::ChartId;
use crate::models::ChartFormat;
use clap::Parser;
use std::path::PathBuf;

/// SPI Atlas - well-being indicators to charts
///
/// Loads a World Happiness Report table, derives a composite SPI score,
/// and renders a correlation heatmap, bubble charts, choropleth maps,
/// a radar chart and a regional bar chart.
///
/// Examples:
///   spi-atlas world-happiness-report-2021.csv
///   spi-atlas whr.csv --output-dir charts
///   spi-atlas whr.csv --output-dir charts --format json --only radar,map-spi
///   spi-atlas whr.csv --report summary.md
///   spi-atlas --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Path to the delimited input file
    #[arg(value_name = "DATA", required_unless_present = "init_config")]
    pub data: Option<PathBuf>,

    /// Directory to write charts into
    ///
    /// When not set, charts are built and checked but not written.
    #[arg(short, long, value_name = "DIR", env = "SPI_ATLAS_OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,

    /// Chart file format (html, json)
    #[arg(short, long, value_name = "FORMAT")]
    pub format: Option<ChartFormat>,

    /// Number of happiest countries compared in the radar chart
    #[arg(short = 'n', long, value_name = "COUNT")]
    pub top_n: Option<usize>,

    /// Field delimiter of the input file
    #[arg(short, long, value_name = "CHAR")]
    pub delimiter: Option<char>,

    /// Render only these charts (comma-separated)
    ///
    /// Example: --only correlation,radar,map-spi
    #[arg(long, value_name = "CHARTS", value_delimiter = ',')]
    pub only: Option<Vec<ChartId>>,

    /// Write a run summary to this file
    #[arg(short, long, value_name = "FILE")]
    pub report: Option<PathBuf>,

    /// Summary format (markdown, json)
    #[arg(long, default_value = "markdown", value_name = "FORMAT")]
    pub report_format: ReportFormat,

    /// Path to configuration file
    ///
    /// If not specified, looks for .spi-atlas.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Exit with code 2 if any chart fails to render
    #[arg(long)]
    pub fail_on_chart_error: bool,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .spi-atlas.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the run summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ReportFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.init_config {
            return Ok(());
        }

        match self.data {
            Some(ref path) if !path.is_file() => {
                return Err(format!("Data file does not exist: {}", path.display()));
            }
            None => return Err("A data file is required".to_string()),
            _ => {}
        }

        if self.top_n == Some(0) {
            return Err("Top-N must be at least 1".to_string());
        }

        if let Some(d) = self.delimiter {
            if !d.is_ascii() {
                return Err("Delimiter must be a single ASCII character".to_string());
            }
        }

        if let Some(ref only) = self.only {
            if only.is_empty() {
                return Err("--only needs at least one chart".to_string());
            }
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(ref dir) = self.output_dir {
            if dir.exists() && !dir.is_dir() {
                return Err(format!(
                    "Output path is not a directory: {}",
                    dir.display()
                ));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn make_args(data: PathBuf) -> Args {
        Args {
            data: Some(data),
            output_dir: None,
            format: None,
            top_n: None,
            delimiter: None,
            only: None,
            report: None,
            report_format: ReportFormat::Markdown,
            config: None,
            fail_on_chart_error: false,
            verbose: false,
            quiet: false,
            init_config: false,
        }
    }

    #[test]
    fn test_parse_flags() {
        let args = Args::try_parse_from([
            "spi-atlas",
            "whr.csv",
            "--format",
            "json",
            "--only",
            "radar,map-spi",
            "-n",
            "3",
        ])
        .unwrap();
        assert_eq!(args.data, Some(PathBuf::from("whr.csv")));
        assert_eq!(args.format, Some(ChartFormat::Json));
        assert_eq!(args.only, Some(vec![ChartId::Radar, ChartId::MapSpi]));
        assert_eq!(args.top_n, Some(3));
    }

    #[test]
    fn test_init_config_needs_no_data() {
        let args = Args::try_parse_from(["spi-atlas", "--init-config"]).unwrap();
        assert!(args.data.is_none());
        assert!(args.validate().is_ok());
        assert!(Args::try_parse_from(["spi-atlas"]).is_err());
    }

    #[test]
    fn test_validation_missing_file() {
        let args = make_args(PathBuf::from("/nonexistent/whr.csv"));
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_zero_top_n() {
        let file = NamedTempFile::new().unwrap();
        let mut args = make_args(file.path().to_path_buf());
        assert!(args.validate().is_ok());
        args.top_n = Some(0);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_conflicting_options() {
        let file = NamedTempFile::new().unwrap();
        let mut args = make_args(file.path().to_path_buf());
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }
}
