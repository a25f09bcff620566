//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::models::SectionKind;
use clap::Parser;
use std::path::PathBuf;

/// Salesdash - descriptive analytics over a merged e-commerce dataset
///
/// Loads the merged orders/reviews/payments/sellers CSV and reports review
/// scores, sales by seller state, RFM, and spending buckets as Markdown or JSON.
///
/// Examples:
///   salesdash --data dashboard/main_data.csv
///   salesdash --data main_data.csv --format json -o report.json
///   salesdash --sections rfm,sales-by-region --preview-rows 10
///   salesdash --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Path to the merged dataset CSV
    ///
    /// Defaults to the config file value, or dashboard/main_data.csv.
    #[arg(short, long, value_name = "FILE", env = "SALESDASH_DATA")]
    pub data: Option<PathBuf>,

    /// Output file path for the report
    ///
    /// The report is printed to stdout when not set.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output format (markdown, json)
    #[arg(long, default_value = "markdown", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Path to configuration file
    ///
    /// If not specified, looks for .salesdash.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Sections to build (comma-separated)
    ///
    /// Example: --sections overview,rfm,spending-categories
    #[arg(long, value_name = "SECTIONS", value_delimiter = ',')]
    pub sections: Option<Vec<SectionKind>>,

    /// Rows shown in the dataset and RFM previews
    #[arg(long, value_name = "ROWS")]
    pub preview_rows: Option<usize>,

    /// Exit with code 2 if any section is unavailable
    #[arg(long)]
    pub strict: bool,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output, no progress spinner)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .salesdash.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
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

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(ref data) = self.data {
            if !data.exists() {
                return Err(format!("Dataset does not exist: {}", data.display()));
            }
            if !data.is_file() {
                return Err(format!("Dataset path is not a file: {}", data.display()));
            }
        }

        if let Some(ref sections) = self.sections {
            if sections.is_empty() {
                return Err("At least one section must be selected".to_string());
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    ///
    /// `config_verbose` is the config file's `general.verbose`; `--quiet`
    /// still wins over it.
    pub fn log_level(&self, config_verbose: bool) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose || config_verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
