//! Markdown and JSON report generation.
//!
//! This module renders dashboard sections as Markdown tables, or dumps the
//! whole report as JSON.

use crate::analysis::AggregateTable;
use crate::models::{
    BucketAnalysis, DatasetOverview, RegionSales, Report, ReportMetadata, ReviewScoreAnalysis,
    RfmAnalysis, Section, SectionBody, SectionOutcome,
};
use crate::table::{Value, TIMESTAMP_FORMAT};
use anyhow::Result;

/// Rendering options for the Markdown report.
#[derive(Debug, Clone, Copy)]
pub struct MarkdownOptions {
    /// RFM records listed in the report.
    pub rfm_preview_rows: usize,
}

impl Default for MarkdownOptions {
    fn default() -> Self {
        Self {
            rfm_preview_rows: 5,
        }
    }
}

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &Report, options: MarkdownOptions) -> String {
    let mut output = String::new();

    output.push_str("# Sales Dashboard Report\n\n");
    output.push_str(&generate_metadata_section(&report.metadata));
    output.push_str(&generate_table_of_contents(report));

    for section in &report.sections {
        output.push_str(&generate_section(section, options));
    }

    output.push_str(&generate_footer());

    output
}

/// Generate a JSON report.
pub fn generate_json_report(report: &Report) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Dataset:** `{}`\n", metadata.data_path));
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!(
        "- **Rows:** {} | **Columns:** {}\n",
        metadata.rows, metadata.columns
    ));
    section.push_str(&format!(
        "- **Sections:** {} ready",
        metadata.sections_ready
    ));
    if metadata.sections_unavailable > 0 {
        section.push_str(&format!(", {} unavailable", metadata.sections_unavailable));
    }
    section.push('\n');
    section.push_str(&format!(
        "- **Duration:** {:.2}s\n\n",
        metadata.duration_seconds
    ));

    section
}

fn generate_table_of_contents(report: &Report) -> String {
    let mut toc = String::new();

    toc.push_str("## Table of Contents\n\n");
    toc.push_str("- [Metadata](#metadata)\n");
    for section in &report.sections {
        toc.push_str(&format!("- [{}](#{})\n", section.title, anchor(&section.title)));
    }
    toc.push('\n');

    toc
}

fn anchor(title: &str) -> String {
    title
        .to_lowercase()
        .chars()
        .filter_map(|c| match c {
            ' ' => Some('-'),
            c if c.is_alphanumeric() || c == '-' => Some(c),
            _ => None,
        })
        .collect()
}

/// Generate one section, or its "not available" notice.
fn generate_section(section: &Section, options: MarkdownOptions) -> String {
    let mut out = format!("## {}\n\n", section.title);

    match &section.outcome {
        SectionOutcome::Ready(body) => out.push_str(&match body {
            SectionBody::Overview(overview) => generate_overview(overview),
            SectionBody::ReviewScores(analysis) => generate_review_scores(analysis),
            SectionBody::SalesByRegion(sales) => generate_region_sales(sales),
            SectionBody::Rfm(analysis) => generate_rfm(analysis, options.rfm_preview_rows),
            SectionBody::Buckets(analysis) => generate_buckets(analysis),
        }),
        SectionOutcome::Unavailable { notice, .. } => {
            out.push_str(&format!("> ⚠️ **Not available:** {}\n\n", notice));
        }
    }

    out
}

fn generate_overview(overview: &DatasetOverview) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "*Rows: {} | Columns: {}*\n\n",
        overview.rows,
        overview.columns.len()
    ));

    if overview.columns.is_empty() {
        return out;
    }

    out.push_str("**Columns:** ");
    out.push_str(
        &overview
            .columns
            .iter()
            .map(|c| format!("`{}`", c))
            .collect::<Vec<_>>()
            .join(", "),
    );
    out.push_str("\n\n");

    if !overview.preview.is_empty() {
        let headers: Vec<&str> = overview.columns.iter().map(String::as_str).collect();
        let rows: Vec<Vec<String>> = overview
            .preview
            .iter()
            .map(|row| row.iter().map(format_value).collect())
            .collect();
        out.push_str(&markdown_table(&headers, &rows));
    }

    out
}

fn generate_review_scores(analysis: &ReviewScoreAnalysis) -> String {
    let mut out = String::new();

    out.push_str("### Review Score Distribution\n\n");
    out.push_str(&aggregate_table(&analysis.distribution));

    out.push_str("### Product Price by Review Score\n\n");
    let rows: Vec<Vec<String>> = analysis
        .price_by_score
        .iter()
        .map(|entry| match &entry.price {
            Some(p) => vec![
                format_value(&entry.score),
                p.count.to_string(),
                format_number(p.min),
                format_number(p.q1),
                format_number(p.median),
                format_number(p.q3),
                format_number(p.max),
            ],
            None => {
                let mut row = vec![format_value(&entry.score), "0".to_string()];
                row.extend(std::iter::repeat("n/a".to_string()).take(5));
                row
            }
        })
        .collect();
    out.push_str(&markdown_table(
        &["Review Score", "Priced Rows", "Min", "Q1", "Median", "Q3", "Max"],
        &rows,
    ));

    match analysis.correlation {
        Some(r) => out.push_str(&format!(
            "Correlation between review score and product price: **{:.3}**\n\n",
            r
        )),
        None => out.push_str("Correlation between review score and product price: n/a\n\n"),
    }

    if analysis.scores_outside_domain > 0 {
        out.push_str(&format!(
            "*{} row(s) have a review score outside 1-5.*\n\n",
            analysis.scores_outside_domain
        ));
    }

    out
}

fn generate_region_sales(sales: &RegionSales) -> String {
    let mut out = String::new();

    out.push_str(&aggregate_table(&sales.table));

    out.push_str("### Map Markers\n\n");
    out.push_str(&format!(
        "*Map centre: {:.4}, {:.4}*\n\n",
        sales.map_center.0, sales.map_center.1
    ));

    if !sales.markers.is_empty() {
        let rows: Vec<Vec<String>> = sales
            .markers
            .iter()
            .map(|m| {
                vec![
                    m.state.clone(),
                    m.capital.clone(),
                    format!("{:.4}", m.latitude),
                    format!("{:.4}", m.longitude),
                    format_value(&m.total_sales),
                    format_value(&m.average_freight),
                ]
            })
            .collect();
        out.push_str(&markdown_table(
            &[
                "State",
                "Capital",
                "Latitude",
                "Longitude",
                "Total Sales",
                "Average Freight Cost",
            ],
            &rows,
        ));
    }

    if !sales.unplaced.is_empty() {
        out.push_str(&format!(
            "*No map location for: {}*\n\n",
            sales.unplaced.join(", ")
        ));
    }

    out
}

fn generate_rfm(analysis: &RfmAnalysis, preview_rows: usize) -> String {
    let mut out = String::new();
    let summary = &analysis.summary;

    match analysis.reference_date {
        Some(date) => out.push_str(&format!(
            "- **Reference date:** {}\n",
            date.format(TIMESTAMP_FORMAT)
        )),
        None => out.push_str("- **Reference date:** n/a (no timestamps)\n"),
    }
    out.push_str(&format!("- **Customers:** {}\n", summary.customers));
    out.push_str(&format!(
        "- **Mean recency (days):** {}\n",
        format_optional(summary.mean_recency)
    ));
    out.push_str(&format!(
        "- **Mean frequency:** {}\n",
        format_optional(summary.mean_frequency)
    ));
    out.push_str(&format!(
        "- **Mean monetary:** {}\n",
        format_optional(summary.mean_monetary)
    ));
    if summary.undefined_recency > 0 {
        out.push_str(&format!(
            "- **Customers without recency:** {}\n",
            summary.undefined_recency
        ));
    }
    out.push('\n');

    let rows: Vec<Vec<String>> = analysis
        .records
        .iter()
        .take(preview_rows)
        .map(|r| {
            vec![
                format_value(&r.customer),
                r.recency
                    .map(|d| d.to_string())
                    .unwrap_or_else(|| "n/a".to_string()),
                r.frequency.to_string(),
                format_number(r.monetary),
            ]
        })
        .collect();

    if !rows.is_empty() {
        out.push_str(&markdown_table(
            &["Customer", "Recency", "Frequency", "Monetary"],
            &rows,
        ));
        out.push_str(&format!(
            "*Showing {} of {} customers.*\n\n",
            rows.len(),
            analysis.records.len()
        ));
    }

    out
}

fn generate_buckets(analysis: &BucketAnalysis) -> String {
    let mut out = String::new();

    let intervals: Vec<String> = analysis
        .bins
        .boundaries()
        .windows(2)
        .zip(analysis.bins.labels())
        .map(|(w, label)| format!("{} = ({}, {}]", label, w[0], w[1]))
        .collect();
    out.push_str(&format!(
        "*Buckets of `{}`: {}*\n\n",
        analysis.source_column,
        intervals.join("; ")
    ));

    out.push_str(&aggregate_table(&analysis.table));

    if analysis.unbinned_rows > 0 {
        out.push_str(&format!(
            "*{} row(s) fell outside every bucket or had no value and are not counted above.*\n\n",
            analysis.unbinned_rows
        ));
    }

    out
}

/// Render an [`AggregateTable`] as a Markdown table.
fn aggregate_table(table: &AggregateTable) -> String {
    let mut headers = vec![table.key_label.as_str()];
    headers.extend(table.labels.iter().map(String::as_str));

    let rows: Vec<Vec<String>> = table
        .rows
        .iter()
        .map(|row| {
            std::iter::once(format_value(&row.key))
                .chain(row.values.iter().map(format_value))
                .collect()
        })
        .collect();

    markdown_table(&headers, &rows)
}

fn markdown_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut out = String::new();

    out.push_str(&format!("| {} |\n", headers.join(" | ")));
    out.push_str(&format!(
        "|{}\n",
        headers.iter().map(|_| ":---|").collect::<String>()
    ));
    for row in rows {
        let cells: Vec<String> = row.iter().map(|c| c.replace('|', "\\|")).collect();
        out.push_str(&format!("| {} |\n", cells.join(" | ")));
    }
    out.push('\n');

    out
}

fn format_value(value: &Value) -> String {
    match value {
        Value::Float(v) => format_number(*v),
        other => other.to_string(),
    }
}

fn format_number(v: f64) -> String {
    format!("{:.2}", v)
}

fn format_optional(v: Option<f64>) -> String {
    v.map(format_number).unwrap_or_else(|| "n/a".to_string())
}

fn generate_footer() -> String {
    "---\n\n*Report generated by salesdash*\n".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{AggregateRow, FiveNumberSummary, RfmRecord, RfmSummary};
    use crate::models::{ScorePrice, SectionKind};
    use chrono::Utc;

    fn metadata() -> ReportMetadata {
        ReportMetadata {
            data_path: "dashboard/main_data.csv".to_string(),
            generated_at: Utc::now(),
            rows: 4,
            columns: 9,
            sections_ready: 2,
            sections_unavailable: 1,
            duration_seconds: 0.5,
        }
    }

    fn create_test_report() -> Report {
        let distribution = AggregateTable {
            key_label: "Review Score".to_string(),
            labels: vec!["Count".to_string()],
            rows: vec![
                AggregateRow {
                    key: Value::Int(5),
                    values: vec![Value::Int(2)],
                },
                AggregateRow {
                    key: Value::Missing,
                    values: vec![Value::Int(1)],
                },
            ],
        };

        Report {
            metadata: metadata(),
            sections: vec![
                Section::ready(
                    SectionKind::ReviewScores,
                    SectionBody::ReviewScores(ReviewScoreAnalysis {
                        distribution,
                        price_by_score: vec![ScorePrice {
                            score: Value::Int(5),
                            price: FiveNumberSummary::from_values(&[100.0, 150.0]),
                        }],
                        correlation: Some(0.42),
                        scores_outside_domain: 0,
                    }),
                ),
                Section::ready(
                    SectionKind::Rfm,
                    SectionBody::Rfm(RfmAnalysis {
                        reference_date: None,
                        summary: RfmSummary::default(),
                        records: vec![
                            RfmRecord {
                                customer: Value::text("c1"),
                                recency: Some(3),
                                frequency: 2,
                                monetary: 150.0,
                            },
                            RfmRecord {
                                customer: Value::text("c2"),
                                recency: None,
                                frequency: 1,
                                monetary: 10.0,
                            },
                        ],
                    }),
                ),
                Section::unavailable(
                    SectionKind::SalesByRegion,
                    "Required column(s) for this analysis were not found: seller_state"
                        .to_string(),
                    vec!["seller_state".to_string()],
                ),
            ],
        }
    }

    #[test]
    fn test_generate_markdown_report() {
        let markdown = generate_markdown_report(&create_test_report(), MarkdownOptions::default());

        assert!(markdown.contains("# Sales Dashboard Report"));
        assert!(markdown.contains("## Metadata"));
        assert!(markdown.contains("## Review Scores and Product Price"));
        assert!(markdown.contains("| Review Score | Count |"));
        assert!(markdown.contains("| 5 | 2 |"));
        assert!(markdown.contains("| n/a | 1 |"));
        assert!(markdown.contains("**0.420**"));
        assert!(markdown.contains("1 unavailable"));
    }

    #[test]
    fn test_unavailable_section_renders_notice() {
        let markdown = generate_markdown_report(&create_test_report(), MarkdownOptions::default());
        assert!(markdown.contains("**Not available:** Required column(s)"));
        assert!(markdown.contains("seller_state"));
    }

    #[test]
    fn test_rfm_preview_is_limited() {
        let markdown = generate_markdown_report(
            &create_test_report(),
            MarkdownOptions {
                rfm_preview_rows: 1,
            },
        );
        assert!(markdown.contains("| c1 | 3 | 2 | 150.00 |"));
        assert!(!markdown.contains("| c2 |"));
        assert!(markdown.contains("Showing 1 of 2 customers"));
    }

    #[test]
    fn test_anchor() {
        assert_eq!(
            anchor("Sales and Freight Cost by Seller State"),
            "sales-and-freight-cost-by-seller-state"
        );
        assert_eq!(anchor("RFM Analysis"), "rfm-analysis");
    }

    #[test]
    fn test_markdown_table_escapes_pipes() {
        let table = markdown_table(&["a"], &[vec!["x|y".to_string()]]);
        assert!(table.contains("x\\|y"));
    }

    #[test]
    fn test_empty_sum_renders_unsigned_zero() {
        assert_eq!(format_value(&Value::float(-0.0)), "0.00");
        assert_eq!(format_value(&Value::float(12.345)), "12.35");
    }

    #[test]
    fn test_generate_json_report() {
        let json = generate_json_report(&create_test_report()).unwrap();

        assert!(json.contains("\"data_path\""));
        assert!(json.contains("\"sections\""));
        assert!(json.contains("\"unavailable\""));
        assert!(json.contains("\"recency\": null"));
        assert!(json.contains("\"key\": null"));
    }
}
