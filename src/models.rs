//! Data models for the dashboard.
//!
//! This module contains the section and report structures handed from
//! the analysis layer to the report renderers.

use crate::analysis::{AggregateTable, Bins, FiveNumberSummary, RfmRecord, RfmSummary};
use crate::table::{Value, TIMESTAMP_FORMAT};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// The fixed set of dashboard sections.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum SectionKind {
    /// Row count, column list and a preview of the dataset
    Overview,
    /// Review score distribution and its relation to product price
    ReviewScores,
    /// Sales count and freight cost per seller state
    SalesByRegion,
    /// Recency / Frequency / Monetary per customer
    Rfm,
    /// Total spend per customer age group
    AgeSpending,
    /// Order count per spending category
    SpendingCategories,
}

impl SectionKind {
    /// All sections in dashboard order.
    pub const ALL: [SectionKind; 6] = [
        SectionKind::Overview,
        SectionKind::ReviewScores,
        SectionKind::SalesByRegion,
        SectionKind::Rfm,
        SectionKind::AgeSpending,
        SectionKind::SpendingCategories,
    ];

    /// Columns the section needs before it can run.
    pub fn required_columns(&self) -> &'static [&'static str] {
        match self {
            SectionKind::Overview => &[],
            SectionKind::ReviewScores => &["review_score", "product_price"],
            SectionKind::SalesByRegion => &["seller_state", "freight_value", "order_id"],
            SectionKind::Rfm => &[
                "customer_id",
                "review_answer_timestamp",
                "order_id",
                "payment_value",
            ],
            SectionKind::AgeSpending => &["customer_age", "payment_value"],
            SectionKind::SpendingCategories => &["payment_value", "order_id"],
        }
    }

    /// Human-readable section title.
    pub fn title(&self) -> &'static str {
        match self {
            SectionKind::Overview => "Dataset Overview",
            SectionKind::ReviewScores => "Review Scores and Product Price",
            SectionKind::SalesByRegion => "Sales and Freight Cost by Seller State",
            SectionKind::Rfm => "RFM Analysis",
            SectionKind::AgeSpending => "Spending by Age Group",
            SectionKind::SpendingCategories => "Orders by Spending Category",
        }
    }
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.title())
    }
}

/// Dataset overview: shape and first rows.
#[derive(Debug, Clone, Serialize)]
pub struct DatasetOverview {
    pub rows: usize,
    pub columns: Vec<String>,
    pub preview: Vec<Vec<Value>>,
}

/// Price distribution for a single review score.
#[derive(Debug, Clone, Serialize)]
pub struct ScorePrice {
    pub score: Value,
    /// `None` when no row with this score has a price.
    pub price: Option<FiveNumberSummary>,
}

/// Review score distribution and price relationship.
#[derive(Debug, Clone, Serialize)]
pub struct ReviewScoreAnalysis {
    /// Rows per review score.
    pub distribution: AggregateTable,
    pub price_by_score: Vec<ScorePrice>,
    /// Pearson correlation of score and price over rows having both.
    pub correlation: Option<f64>,
    /// Scores outside the expected 1-5 range.
    pub scores_outside_domain: usize,
}

/// A map marker for one seller state.
#[derive(Debug, Clone, Serialize)]
pub struct RegionMarker {
    pub state: String,
    pub capital: String,
    pub latitude: f64,
    pub longitude: f64,
    pub total_sales: Value,
    pub average_freight: Value,
}

/// Sales and freight per seller state.
#[derive(Debug, Clone, Serialize)]
pub struct RegionSales {
    pub table: AggregateTable,
    pub map_center: (f64, f64),
    pub markers: Vec<RegionMarker>,
    /// Group keys with no known map location.
    pub unplaced: Vec<String>,
}

/// RFM records with their summary.
#[derive(Debug, Clone, Serialize)]
pub struct RfmAnalysis {
    #[serde(serialize_with = "serialize_timestamp")]
    pub reference_date: Option<NaiveDateTime>,
    pub summary: RfmSummary,
    pub records: Vec<RfmRecord>,
}

fn serialize_timestamp<S>(ts: &Option<NaiveDateTime>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match ts {
        Some(ts) => serializer.collect_str(&ts.format(TIMESTAMP_FORMAT)),
        None => serializer.serialize_none(),
    }
}

/// Result of binning a column and aggregating per bucket.
#[derive(Debug, Clone, Serialize)]
pub struct BucketAnalysis {
    pub source_column: String,
    pub label_column: String,
    pub bins: Bins,
    /// One row per bucket, in bin order; out-of-range rows are excluded.
    pub table: AggregateTable,
    /// Rows whose value fell outside every bucket or was missing.
    pub unbinned_rows: usize,
}

/// Computed content of a section.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionBody {
    Overview(DatasetOverview),
    ReviewScores(ReviewScoreAnalysis),
    SalesByRegion(RegionSales),
    Rfm(RfmAnalysis),
    Buckets(BucketAnalysis),
}

/// Either the computed content or the reason it is unavailable.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionOutcome {
    Ready(SectionBody),
    Unavailable {
        notice: String,
        missing_columns: Vec<String>,
    },
}

/// One dashboard section.
#[derive(Debug, Clone, Serialize)]
pub struct Section {
    pub kind: SectionKind,
    pub title: String,
    pub outcome: SectionOutcome,
}

impl Section {
    pub fn ready(kind: SectionKind, body: SectionBody) -> Self {
        Self {
            kind,
            title: kind.title().to_string(),
            outcome: SectionOutcome::Ready(body),
        }
    }

    pub fn unavailable(kind: SectionKind, notice: String, missing_columns: Vec<String>) -> Self {
        Self {
            kind,
            title: kind.title().to_string(),
            outcome: SectionOutcome::Unavailable {
                notice,
                missing_columns,
            },
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.outcome, SectionOutcome::Ready(_))
    }
}

/// Metadata about a dashboard run.
#[derive(Debug, Clone, Serialize)]
pub struct ReportMetadata {
    /// Dataset the report was built from.
    pub data_path: String,
    /// Date and time of the run.
    pub generated_at: DateTime<Utc>,
    pub rows: usize,
    pub columns: usize,
    pub sections_ready: usize,
    pub sections_unavailable: usize,
    /// Duration of the run in seconds.
    pub duration_seconds: f64,
}

/// The complete dashboard report.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub metadata: ReportMetadata,
    pub sections: Vec<Section>,
}

impl Report {
    /// Sections that could not be computed.
    pub fn unavailable_sections(&self) -> impl Iterator<Item = &Section> {
        self.sections.iter().filter(|s| !s.is_ready())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_section_kind_serde_names() {
        let json = serde_json::to_string(&SectionKind::SalesByRegion).unwrap();
        assert_eq!(json, "\"sales-by-region\"");

        let kind: SectionKind = serde_json::from_str("\"age-spending\"").unwrap();
        assert_eq!(kind, SectionKind::AgeSpending);
    }

    #[test]
    fn test_reference_date_uses_report_timestamp_format() {
        let reference_date = chrono::NaiveDate::from_ymd_opt(2018, 1, 6)
            .and_then(|d| d.and_hms_opt(12, 0, 0));
        let analysis = RfmAnalysis {
            reference_date,
            summary: RfmSummary::from_records(&[]),
            records: vec![],
        };

        let json = serde_json::to_value(&analysis).unwrap();
        assert_eq!(json["reference_date"], "2018-01-06 12:00:00");

        let undated = RfmAnalysis {
            reference_date: None,
            ..analysis
        };
        let json = serde_json::to_value(&undated).unwrap();
        assert!(json["reference_date"].is_null());
    }

    #[test]
    fn test_overview_requires_nothing() {
        assert!(SectionKind::Overview.required_columns().is_empty());
        assert_eq!(SectionKind::Rfm.required_columns().len(), 4);
    }

    #[test]
    fn test_section_constructors() {
        let skipped = Section::unavailable(
            SectionKind::SalesByRegion,
            "not available".to_string(),
            vec!["seller_state".to_string()],
        );
        assert!(!skipped.is_ready());
        assert_eq!(skipped.title, "Sales and Freight Cost by Seller State");

        let ready = Section::ready(
            SectionKind::Overview,
            SectionBody::Overview(DatasetOverview {
                rows: 0,
                columns: vec![],
                preview: vec![],
            }),
        );
        assert!(ready.is_ready());
    }
}
