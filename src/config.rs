//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.spi-atlas.toml` files.

use crate::charts::plotly::DEFAULT_CDN_URL;
use crate::charts::ChartId;
use crate::models::ChartFormat;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File name looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = ".spi-atlas.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Input file settings.
    #[serde(default)]
    pub data: DataConfig,

    /// Chart settings.
    #[serde(default)]
    pub charts: ChartsConfig,

    /// Summary report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// General application settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Directory charts are written to. Nothing is written when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

/// Input file settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Field delimiter of the input file.
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            delimiter: default_delimiter(),
        }
    }
}

fn default_delimiter() -> char {
    ','
}

/// Chart settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartsConfig {
    /// Chart file format.
    #[serde(default)]
    pub format: ChartFormat,

    /// Number of countries compared in the radar chart.
    #[serde(default = "default_top_n")]
    pub top_n: usize,

    /// Charts to render, in any order; rendering follows the fixed sequence.
    #[serde(default = "default_enabled")]
    pub enabled: Vec<ChartId>,

    /// plotly.js script loaded by HTML charts.
    #[serde(default = "default_cdn_url")]
    pub plotly_cdn: String,
}

impl Default for ChartsConfig {
    fn default() -> Self {
        Self {
            format: ChartFormat::default(),
            top_n: default_top_n(),
            enabled: default_enabled(),
            plotly_cdn: default_cdn_url(),
        }
    }
}

fn default_top_n() -> usize {
    5
}

fn default_enabled() -> Vec<ChartId> {
    ChartId::ALL.to_vec()
}

fn default_cdn_url() -> String {
    DEFAULT_CDN_URL.to_string()
}

/// Summary report settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Include the correlation matrix table.
    #[serde(default = "default_true")]
    pub include_correlation: bool,

    /// Include the regional means table.
    #[serde(default = "default_true")]
    pub include_regions: bool,

    /// Rows in the leader tables.
    #[serde(default = "default_leaders")]
    pub leaders: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            include_correlation: true,
            include_regions: true,
            leaders: default_leaders(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_leaders() -> usize {
    10
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(DEFAULT_CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings, but only
    /// when they were given.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref dir) = args.output_dir {
            self.general.output_dir = Some(dir.clone());
        }
        if let Some(format) = args.format {
            self.charts.format = format;
        }
        if let Some(top_n) = args.top_n {
            self.charts.top_n = top_n;
        }
        if let Some(ref only) = args.only {
            self.charts.enabled = only.clone();
        }
        if let Some(delimiter) = args.delimiter {
            self.data.delimiter = delimiter;
        }

        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Check settings the command line cannot catch on its own.
    pub fn validate(&self) -> Result<()> {
        if self.charts.top_n == 0 {
            anyhow::bail!("charts.top_n must be at least 1");
        }
        self.delimiter_byte()?;
        Ok(())
    }

    /// Log level for the merged settings. `--quiet` wins over `verbose`.
    pub fn log_level(&self, quiet: bool) -> tracing::Level {
        if quiet {
            tracing::Level::ERROR
        } else if self.general.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }

    /// The delimiter as a byte, if it is a single ASCII character.
    pub fn delimiter_byte(&self) -> Result<u8> {
        let c = self.data.delimiter;
        if c.is_ascii() {
            Ok(c as u8)
        } else {
            anyhow::bail!("Delimiter must be a single ASCII character, got '{}'", c)
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
