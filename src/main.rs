//! Salesdash - descriptive analytics over a merged e-commerce dataset
//!
//! Loads the merged dataset, builds the dashboard sections and writes a
//! Markdown or JSON report.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (unreadable dataset, bad config, write failure)
//!   2 - At least one section unavailable and --strict set

mod analysis;
mod cli;
mod config;
mod dashboard;
mod error;
mod models;
mod report;
mod table;

use anyhow::{Context, Result};
use chrono::Utc;
use cli::{Args, OutputFormat};
use config::{Config, CONFIG_FILE};
use models::{Report, ReportMetadata};
use report::MarkdownOptions;
use std::path::{Path, PathBuf};
use std::time::Instant;
use table::loader::{self, LoadOptions};
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

fn main() -> Result<()> {
    let args = Args::parse_args();

    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Config is read before logging starts so `general.verbose` can set the level.
    let (mut config, source) = match load_config(&args) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    };
    config.merge_with_args(&args);

    init_logging(args.log_level(config.general.verbose));

    info!("Salesdash v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);
    source.log();

    match run_dashboard(args, config) {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Dashboard failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .salesdash.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE);

    if path.exists() {
        eprintln!("⚠️  {} already exists. Remove it first or edit it manually.", CONFIG_FILE);
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).with_context(|| format!("Failed to write {}", CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE);
    println!("   Edit it to customize the dataset path, sections and bins.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
///
/// Logs go to stderr so a report printed to stdout stays clean.
fn init_logging(level: tracing::Level) {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
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

/// Run the dashboard end to end. Returns the exit code (0 or 2).
fn run_dashboard(args: Args, config: Config) -> Result<i32> {
    let start_time = Instant::now();

    let data_path = config.general.data_path.clone();
    let load_options = LoadOptions {
        show_progress: !args.quiet,
        ..LoadOptions::from(&config.dashboard)
    };
    let table = loader::load_csv(Path::new(&data_path), &load_options)?;
    info!(
        "Loaded {} rows, {} columns",
        table.row_count(),
        table.column_count()
    );

    let sections = dashboard::run(&table, &config);

    let sections_ready = sections.iter().filter(|s| s.is_ready()).count();
    let report = Report {
        metadata: ReportMetadata {
            data_path,
            generated_at: Utc::now(),
            rows: table.row_count(),
            columns: table.column_count(),
            sections_ready,
            sections_unavailable: sections.len() - sections_ready,
            duration_seconds: start_time.elapsed().as_secs_f64(),
        },
        sections,
    };

    let output = match args.format {
        OutputFormat::Json => report::generate_json_report(&report)?,
        OutputFormat::Markdown => report::generate_markdown_report(
            &report,
            MarkdownOptions {
                rfm_preview_rows: config.dashboard.rfm_preview_rows,
            },
        ),
    };

    match config.general.output {
        Some(ref path) => {
            std::fs::write(path, &output)
                .with_context(|| format!("Failed to write report to {}", path))?;

            if !args.quiet {
                println!("\n📊 Dashboard Summary:");
                println!("   Rows: {}", report.metadata.rows);
                println!(
                    "   Sections: {} ready, {} unavailable",
                    report.metadata.sections_ready, report.metadata.sections_unavailable
                );
                println!("\n✅ Report saved to: {}", path);
            }
        }
        None => print!("{}", output),
    }

    if args.strict && report.metadata.sections_unavailable > 0 {
        for section in report.unavailable_sections() {
            warn!("Unavailable: {}", section.title);
        }
        eprintln!(
            "\n⛔ {} section(s) unavailable. Failing (exit code 2).",
            report.metadata.sections_unavailable
        );
        return Ok(2);
    }

    Ok(0)
}

/// Where the configuration came from, logged once tracing is up.
enum ConfigSource {
    Explicit(PathBuf),
    DefaultFile,
    BuiltIn,
    Fallback(anyhow::Error),
}

impl ConfigSource {
    fn log(&self) {
        match self {
            ConfigSource::Explicit(path) => info!("Loaded config from: {}", path.display()),
            ConfigSource::DefaultFile => info!("Loaded default config from {}", CONFIG_FILE),
            ConfigSource::BuiltIn => debug!("No config file found, using defaults"),
            ConfigSource::Fallback(e) => warn!("Failed to load config: {:#}", e),
        }
    }
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<(Config, ConfigSource)> {
    if let Some(ref config_path) = args.config {
        let config = Config::load(config_path)?;
        return Ok((config, ConfigSource::Explicit(config_path.clone())));
    }

    match Config::load_default() {
        Ok(Some(config)) => Ok((config, ConfigSource::DefaultFile)),
        Ok(None) => Ok((Config::default(), ConfigSource::BuiltIn)),
        Err(e) => Ok((Config::default(), ConfigSource::Fallback(e))),
    }
}
