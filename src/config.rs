//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.salesdash.toml` files.

use crate::analysis::Bins;
use crate::error::AnalysisResult;
use crate::models::SectionKind;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default configuration file name.
pub const CONFIG_FILE: &str = ".salesdash.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Dashboard section settings.
    #[serde(default)]
    pub dashboard: DashboardConfig,

    /// Bucket definitions for the binning sections.
    #[serde(default)]
    pub binning: BinningConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Path to the merged dataset CSV.
    #[serde(default = "default_data_path")]
    pub data_path: String,

    /// Report output path; the report goes to stdout when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            data_path: default_data_path(),
            output: None,
            verbose: false,
        }
    }
}

fn default_data_path() -> String {
    "dashboard/main_data.csv".to_string()
}

/// Which sections to build and how much to preview.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// Sections to build, in order.
    #[serde(default = "default_sections")]
    pub sections: Vec<SectionKind>,

    /// Rows shown in the dataset preview.
    #[serde(default = "default_preview_rows")]
    pub preview_rows: usize,

    /// RFM records shown in the Markdown report.
    #[serde(default = "default_preview_rows")]
    pub rfm_preview_rows: usize,

    /// Columns parsed as timestamps when loading.
    #[serde(default = "default_timestamp_columns")]
    pub timestamp_columns: Vec<String>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            sections: default_sections(),
            preview_rows: default_preview_rows(),
            rfm_preview_rows: default_preview_rows(),
            timestamp_columns: default_timestamp_columns(),
        }
    }
}

fn default_sections() -> Vec<SectionKind> {
    SectionKind::ALL.to_vec()
}

fn default_preview_rows() -> usize {
    5
}

fn default_timestamp_columns() -> Vec<String> {
    vec!["review_answer_timestamp".to_string()]
}

/// Interval bins for the age and spending sections.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BinningConfig {
    #[serde(default = "default_age_bins")]
    pub age: BinConfig,

    #[serde(default = "default_spending_bins")]
    pub spending: BinConfig,
}

impl Default for BinningConfig {
    fn default() -> Self {
        Self {
            age: default_age_bins(),
            spending: default_spending_bins(),
        }
    }
}

/// Raw bin definition; validated by [`BinConfig::to_bins`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinConfig {
    pub boundaries: Vec<f64>,
    pub labels: Vec<String>,
}

impl BinConfig {
    fn new(boundaries: &[f64], labels: &[&str]) -> Self {
        Self {
            boundaries: boundaries.to_vec(),
            labels: labels.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn to_bins(&self) -> AnalysisResult<Bins> {
        Bins::new(self.boundaries.clone(), self.labels.clone())
    }
}

fn default_age_bins() -> BinConfig {
    BinConfig::new(&[0.0, 30.0, 50.0, 70.0, 100.0], &["0-30", "31-50", "51-70", ">70"])
}

fn default_spending_bins() -> BinConfig {
    BinConfig::new(
        &[0.0, 50.0, 150.0, 500.0, 1000.0, 5000.0],
        &["Sangat Rendah", "Rendah", "Sedang", "Tinggi", "Sangat Tinggi"],
    )
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
        let default_path = Path::new(CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// Only values given on the command line override the file.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref data) = args.data {
            self.general.data_path = data.display().to_string();
        }
        if let Some(ref output) = args.output {
            self.general.output = Some(output.display().to_string());
        }
        if let Some(ref sections) = args.sections {
            self.dashboard.sections = sections.clone();
        }
        if let Some(rows) = args.preview_rows {
            self.dashboard.preview_rows = rows;
            self.dashboard.rfm_preview_rows = rows;
        }
        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
