//! Dashboard section builders.
//!
//! Each section checks its required columns first and degrades to an
//! "unavailable" notice instead of failing the run. Sections only read
//! the table; derived columns live in section-local views.

use crate::analysis::regions::{self, MAP_CENTER};
use crate::analysis::{
    bin_column, group_and_aggregate, numeric_cells, partition, reference_instant, rfm,
    AggFunc, AggSpec, FiveNumberSummary, RfmColumns, RfmSummary,
};
use crate::config::{BinConfig, Config};
use crate::error::AnalysisResult;
use crate::models::{
    BucketAnalysis, DatasetOverview, RegionMarker, RegionSales, ReviewScoreAnalysis, RfmAnalysis,
    ScorePrice, Section, SectionBody, SectionKind,
};
use crate::table::Table;
use tracing::{debug, info, warn};

/// Build every configured section against `table`.
///
/// Duplicate section kinds are built once.
pub fn run(table: &Table, config: &Config) -> Vec<Section> {
    let mut seen = Vec::new();
    let mut sections = Vec::new();

    for &kind in &config.dashboard.sections {
        if seen.contains(&kind) {
            continue;
        }
        seen.push(kind);
        sections.push(build_section(kind, table, config));
    }

    sections
}

/// Build a single section, gated on its required columns.
pub fn build_section(kind: SectionKind, table: &Table, config: &Config) -> Section {
    let required = kind.required_columns();
    if !table.has_columns(required) {
        let missing = table.missing_columns(required);
        warn!("Skipping '{}': missing column(s) {}", kind, missing.join(", "));
        return Section::unavailable(
            kind,
            format!(
                "Required column(s) for this analysis were not found: {}",
                missing.join(", ")
            ),
            missing,
        );
    }

    let result = match kind {
        SectionKind::Overview => Ok(overview(table, config.dashboard.preview_rows)),
        SectionKind::ReviewScores => review_scores(table).map(SectionBody::ReviewScores),
        SectionKind::SalesByRegion => sales_by_region(table).map(SectionBody::SalesByRegion),
        SectionKind::Rfm => rfm_analysis(table).map(SectionBody::Rfm),
        SectionKind::AgeSpending => age_spending(table, &config.binning.age).map(SectionBody::Buckets),
        SectionKind::SpendingCategories => {
            spending_categories(table, &config.binning.spending).map(SectionBody::Buckets)
        }
    };

    match result {
        Ok(body) => {
            info!("Built section: {}", kind);
            Section::ready(kind, body)
        }
        Err(e) => {
            warn!("Section '{}' unavailable: {}", kind, e);
            Section::unavailable(kind, e.to_string(), Vec::new())
        }
    }
}

fn overview(table: &Table, preview_rows: usize) -> SectionBody {
    SectionBody::Overview(DatasetOverview {
        rows: table.row_count(),
        columns: table.column_names().into_iter().map(String::from).collect(),
        preview: table.head(preview_rows),
    })
}

/// Rows per review score, price spread per score, and score/price correlation.
pub fn review_scores(table: &Table) -> AnalysisResult<ReviewScoreAnalysis> {
    let scores = table.require("review_score")?;
    let prices = table.require("product_price")?;

    let numeric_scores = numeric_cells(scores.name(), scores.values().iter())?;
    let scores_outside_domain = numeric_scores
        .iter()
        .filter(|s| !(1.0..=5.0).contains(*s))
        .count();

    let distribution = group_and_aggregate(
        table,
        "review_score",
        &[AggSpec::new("review_score", AggFunc::Size, "Count")],
    )?
    .with_key_label("Review Score");

    let mut price_by_score = Vec::new();
    for (score, rows) in partition(scores) {
        let sample = numeric_cells(prices.name(), rows.iter().map(|&i| &prices.values()[i]))?;
        price_by_score.push(ScorePrice {
            score,
            price: FiveNumberSummary::from_values(&sample),
        });
    }

    let pairs: Vec<(f64, f64)> = scores
        .values()
        .iter()
        .zip(prices.values())
        .filter_map(|(s, p)| Some((s.as_f64()?, p.as_f64()?)))
        .collect();
    let correlation = crate::analysis::pearson(&pairs);
    debug!("Score/price correlation over {} rows: {:?}", pairs.len(), correlation);

    Ok(ReviewScoreAnalysis {
        distribution,
        price_by_score,
        correlation,
        scores_outside_domain,
    })
}

/// Sales count and mean freight per seller state, with map markers.
pub fn sales_by_region(table: &Table) -> AnalysisResult<RegionSales> {
    let grouped = group_and_aggregate(
        table,
        "seller_state",
        &[
            AggSpec::new("order_id", AggFunc::Count, "Total Sales"),
            AggSpec::new("freight_value", AggFunc::Mean, "Average Freight Cost"),
        ],
    )?
    .with_key_label("Seller State");

    let mut markers = Vec::new();
    let mut unplaced = Vec::new();

    // The missing-key row stays in the table but has nothing to place.
    for row in grouped.rows.iter().filter(|r| !r.key.is_missing()) {
        let state = row.key.to_string();
        match regions::locate(&state) {
            Some(location) => markers.push(RegionMarker {
                state,
                capital: location.capital.to_string(),
                latitude: location.latitude,
                longitude: location.longitude,
                total_sales: row.values[0].clone(),
                average_freight: row.values[1].clone(),
            }),
            None => unplaced.push(state),
        }
    }

    if !unplaced.is_empty() {
        debug!("No map location for: {}", unplaced.join(", "));
    }

    Ok(RegionSales {
        table: grouped,
        map_center: MAP_CENTER,
        markers,
        unplaced,
    })
}

/// RFM records for every customer.
pub fn rfm_analysis(table: &Table) -> AnalysisResult<RfmAnalysis> {
    let columns = RfmColumns::default();
    let records = rfm(table, &columns)?;
    let summary = RfmSummary::from_records(&records);

    if summary.undefined_recency > 0 {
        warn!(
            "{} customer(s) have no review timestamp; recency undefined",
            summary.undefined_recency
        );
    }

    Ok(RfmAnalysis {
        reference_date: reference_instant(table, &columns.timestamp)?,
        summary,
        records,
    })
}

/// Total payment per customer age group.
pub fn age_spending(table: &Table, bins: &BinConfig) -> AnalysisResult<BucketAnalysis> {
    bucket_analysis(
        table,
        bins,
        "customer_age",
        "age_group",
        AggSpec::new("payment_value", AggFunc::Sum, "Total Spend"),
    )
}

/// Order count per spending category.
pub fn spending_categories(table: &Table, bins: &BinConfig) -> AnalysisResult<BucketAnalysis> {
    bucket_analysis(
        table,
        bins,
        "payment_value",
        "spending_category",
        AggSpec::new("order_id", AggFunc::Count, "Total Orders"),
    )
}

/// Bin `source` into `target` once, then aggregate `metric` over the buckets.
fn bucket_analysis(
    table: &Table,
    bins: &BinConfig,
    source: &str,
    target: &str,
    metric: AggSpec,
) -> AnalysisResult<BucketAnalysis> {
    let bins = bins.to_bins()?;
    let view = bin_column(table, source, target, &bins)?;

    let unbinned_rows = view
        .require(target)?
        .values()
        .iter()
        .filter(|v| v.is_missing())
        .count();

    let (grouped, _) = group_and_aggregate(&view, target, &[metric])?.split_missing();

    Ok(BucketAnalysis {
        source_column: source.to_string(),
        label_column: target.to_string(),
        bins,
        table: grouped,
        unbinned_rows,
    })
}
