//! CSV ingestion.
//!
//! Reads a headered CSV file into a [`Table`], inferring a type for each
//! column. Timestamp columns are parsed with coerce semantics: anything that
//! does not parse becomes `Missing`.

use super::{Column, Table, Value};
use anyhow::{bail, Context, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info, warn};

/// Timestamp layouts tried in order before falling back to RFC 3339 and plain dates.
const TIMESTAMP_LAYOUTS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Options for loading a dataset.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Columns parsed as timestamps instead of inferred.
    pub timestamp_columns: Vec<String>,
    /// Whether to show a progress spinner.
    pub show_progress: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            timestamp_columns: vec!["review_answer_timestamp".to_string()],
            show_progress: true,
        }
    }
}

impl From<&crate::config::DashboardConfig> for LoadOptions {
    fn from(config: &crate::config::DashboardConfig) -> Self {
        Self {
            timestamp_columns: config.timestamp_columns.clone(),
            show_progress: true,
        }
    }
}

/// Load a CSV file from disk.
pub fn load_csv(path: &Path, options: &LoadOptions) -> Result<Table> {
    info!("Loading dataset: {}", path.display());

    let file = File::open(path)
        .with_context(|| format!("Failed to open dataset: {}", path.display()))?;

    read_csv(file, options).with_context(|| format!("Failed to load dataset: {}", path.display()))
}

/// Read CSV content from any reader.
///
/// Short rows are padded with `Missing`; malformed records are skipped
/// with a warning.
pub fn read_csv<R: Read>(input: R, options: &LoadOptions) -> Result<Table> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(input);

    let headers: Vec<String> = reader
        .headers()
        .context("Failed to parse CSV headers")?
        .iter()
        .map(String::from)
        .collect();

    if headers.is_empty() {
        bail!("CSV input has no header row");
    }

    let progress = if options.show_progress {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) =
            ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {pos} rows read")
        {
            pb.set_style(style);
        }
        Some(pb)
    } else {
        None
    };

    let mut raw: Vec<Vec<String>> = vec![Vec::new(); headers.len()];
    let mut rows = 0usize;
    let mut skipped = 0usize;

    for (line_number, result) in reader.records().enumerate() {
        match result {
            Ok(record) => {
                for (i, cells) in raw.iter_mut().enumerate() {
                    cells.push(record.get(i).unwrap_or("").to_string());
                }
                rows += 1;
                if let Some(ref pb) = progress {
                    if rows % 1000 == 0 {
                        pb.set_position(rows as u64);
                    }
                }
            }
            Err(e) => {
                skipped += 1;
                // +2: 1-based lines plus the header row
                warn!("Skipping malformed row {}: {}", line_number + 2, e);
            }
        }
    }

    if let Some(pb) = progress {
        pb.set_position(rows as u64);
        pb.finish_and_clear();
    }

    if skipped > 0 {
        info!("{} rows parsed, {} rows skipped", rows, skipped);
    }

    let columns = headers
        .iter()
        .zip(raw)
        .map(|(name, cells)| {
            let values = if options.timestamp_columns.iter().any(|c| c == name) {
                parse_timestamp_column(&cells)
            } else {
                infer_column(&cells)
            };
            Column::new(name.clone(), values)
        })
        .collect();

    let table = Table::new(columns)?;
    debug!(
        "Loaded {} rows x {} columns",
        table.row_count(),
        table.column_count()
    );

    Ok(table)
}

/// Infer a column type: all integers, else all floats, else text.
/// Empty cells are `Missing` and do not take part in inference.
fn infer_column(cells: &[String]) -> Vec<Value> {
    let present = || cells.iter().filter(|c| !c.is_empty());

    if present().all(|c| c.parse::<i64>().is_ok()) {
        return cells
            .iter()
            .map(|c| c.parse::<i64>().map(Value::Int).unwrap_or(Value::Missing))
            .collect();
    }

    if present().all(|c| c.parse::<f64>().is_ok()) {
        return cells
            .iter()
            .map(|c| c.parse::<f64>().map(Value::float).unwrap_or(Value::Missing))
            .collect();
    }

    cells
        .iter()
        .map(|c| {
            if c.is_empty() {
                Value::Missing
            } else {
                Value::Text(c.clone())
            }
        })
        .collect()
}

fn parse_timestamp_column(cells: &[String]) -> Vec<Value> {
    let values: Vec<Value> = cells
        .iter()
        .map(|c| parse_timestamp(c).map(Value::Timestamp).unwrap_or(Value::Missing))
        .collect();

    let coerced = cells
        .iter()
        .zip(&values)
        .filter(|(c, v)| !c.is_empty() && v.is_missing())
        .count();
    if coerced > 0 {
        debug!("{} unparseable timestamps coerced to missing", coerced);
    }

    values
}

/// Parse a timestamp in any of the accepted layouts.
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    if s.is_empty() {
        return None;
    }

    for layout in TIMESTAMP_LAYOUTS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(s, layout) {
            return Some(ts);
        }
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }

    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}
