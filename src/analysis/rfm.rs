//! Recency / Frequency / Monetary aggregation per customer.

use super::aggregator::{aggregate, partition, AggFunc};
use crate::error::{AnalysisError, AnalysisResult};
use crate::table::{Table, Value};
use chrono::{Duration, NaiveDateTime};
use serde::Serialize;

/// Column roles for an RFM computation.
#[derive(Debug, Clone)]
pub struct RfmColumns {
    pub entity: String,
    pub timestamp: String,
    /// Counted (non-missing values) for Frequency.
    pub count_source: String,
    /// Summed for Monetary.
    pub sum_source: String,
}

impl Default for RfmColumns {
    fn default() -> Self {
        Self {
            entity: "customer_id".to_string(),
            timestamp: "review_answer_timestamp".to_string(),
            count_source: "order_id".to_string(),
            sum_source: "payment_value".to_string(),
        }
    }
}

impl RfmColumns {
    pub fn names(&self) -> [&str; 4] {
        [
            self.entity.as_str(),
            self.timestamp.as_str(),
            self.count_source.as_str(),
            self.sum_source.as_str(),
        ]
    }
}

/// RFM figures for one customer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RfmRecord {
    pub customer: Value,
    /// Whole days between the reference instant and the customer's latest
    /// timestamp; `None` when the customer has no timestamp at all.
    pub recency: Option<i64>,
    pub frequency: u64,
    pub monetary: f64,
}

/// Aggregate view over a set of RFM records.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RfmSummary {
    pub customers: usize,
    /// Customers whose recency could not be computed.
    pub undefined_recency: usize,
    pub mean_recency: Option<f64>,
    pub mean_frequency: Option<f64>,
    pub mean_monetary: Option<f64>,
}

impl RfmSummary {
    pub fn from_records(records: &[RfmRecord]) -> Self {
        let recencies: Vec<f64> = records
            .iter()
            .filter_map(|r| r.recency.map(|d| d as f64))
            .collect();

        Self {
            customers: records.len(),
            undefined_recency: records.len() - recencies.len(),
            mean_recency: mean(&recencies),
            mean_frequency: mean(
                &records
                    .iter()
                    .map(|r| r.frequency as f64)
                    .collect::<Vec<_>>(),
            ),
            mean_monetary: mean(&records.iter().map(|r| r.monetary).collect::<Vec<_>>()),
        }
    }
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// The instant recency is measured from: the latest timestamp plus one day.
pub fn reference_instant(table: &Table, timestamp: &str) -> AnalysisResult<Option<NaiveDateTime>> {
    let column = table.require(timestamp)?;
    let latest = column.values().iter().filter_map(Value::as_timestamp).max();
    Ok(latest.map(|ts| ts + Duration::days(1)))
}

/// Compute one RFM record per distinct entity, ordered by entity key.
///
/// Rows with a missing timestamp still count toward frequency and
/// monetary value but never toward recency.
pub fn rfm(table: &Table, columns: &RfmColumns) -> AnalysisResult<Vec<RfmRecord>> {
    let missing = table.missing_columns(&columns.names());
    if !missing.is_empty() {
        return Err(AnalysisError::MissingColumns { columns: missing });
    }

    let entity = table.require(&columns.entity)?;
    let timestamps = table.require(&columns.timestamp)?;
    let counted = table.require(&columns.count_source)?;
    let summed = table.require(&columns.sum_source)?;

    if let Some(bad) = timestamps
        .values()
        .iter()
        .find(|v| !v.is_missing() && v.as_timestamp().is_none())
    {
        return Err(AnalysisError::NonTemporal {
            column: columns.timestamp.clone(),
            value: bad.to_string(),
        });
    }

    let reference = reference_instant(table, &columns.timestamp)?;

    partition(entity)
        .into_iter()
        .map(|(customer, rows)| -> AnalysisResult<RfmRecord> {
            let latest = rows
                .iter()
                .filter_map(|&i| timestamps.values()[i].as_timestamp())
                .max();
            let recency = match (reference, latest) {
                (Some(reference), Some(latest)) => Some((reference - latest).num_days()),
                _ => None,
            };

            let frequency = match aggregate(counted, &rows, AggFunc::Count)? {
                Value::Int(n) => n.max(0) as u64,
                _ => 0,
            };
            let monetary = aggregate(summed, &rows, AggFunc::Sum)?
                .as_f64()
                .unwrap_or(0.0);

            Ok(RfmRecord {
                customer,
                recency,
                frequency,
                monetary,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts(y: i32, m: u32, d: u32, h: u32) -> Value {
        Value::Timestamp(
            NaiveDate::from_ymd_opt(y, m, d)
                .and_then(|date| date.and_hms_opt(h, 0, 0))
                .unwrap(),
        )
    }

    fn orders() -> Table {
        Table::from_rows(
            &[
                "customer_id",
                "review_answer_timestamp",
                "order_id",
                "payment_value",
            ],
            vec![
                vec![Value::text("c1"), ts(2018, 1, 1, 0), Value::text("o1"), Value::Float(10.0)],
                vec![Value::text("c1"), ts(2018, 1, 5, 12), Value::text("o2"), Value::Float(20.0)],
                vec![Value::text("c1"), Value::Missing, Value::text("o3"), Value::Float(30.0)],
                vec![Value::text("c2"), ts(2018, 1, 10, 6), Value::text("o4"), Value::Float(5.0)],
                vec![Value::text("c3"), Value::Missing, Value::text("o5"), Value::Float(7.5)],
            ],
        )
    }

    #[test]
    fn test_reference_is_latest_plus_one_day() {
        let reference = reference_instant(&orders(), "review_answer_timestamp").unwrap();
        assert_eq!(reference, ts(2018, 1, 11, 6).as_timestamp());
    }

    #[test]
    fn test_rfm_with_missing_timestamp_row() {
        let records = rfm(&orders(), &RfmColumns::default()).unwrap();
        let c1 = &records[0];

        assert_eq!(c1.customer, Value::text("c1"));
        // (2018-01-11 06:00 - 2018-01-05 12:00) = 5 days 18 hours
        assert_eq!(c1.recency, Some(5));
        assert_eq!(c1.frequency, 3);
        assert_eq!(c1.monetary, 60.0);
    }

    #[test]
    fn test_latest_customer_has_recency_one() {
        let records = rfm(&orders(), &RfmColumns::default()).unwrap();
        assert_eq!(records[1].customer, Value::text("c2"));
        assert_eq!(records[1].recency, Some(1));
    }

    #[test]
    fn test_customer_without_timestamps_has_undefined_recency() {
        let records = rfm(&orders(), &RfmColumns::default()).unwrap();
        let c3 = &records[2];

        assert_eq!(c3.customer, Value::text("c3"));
        assert_eq!(c3.recency, None);
        assert_eq!(c3.frequency, 1);
        assert_eq!(c3.monetary, 7.5);
    }

    #[test]
    fn test_recency_is_never_negative() {
        let records = rfm(&orders(), &RfmColumns::default()).unwrap();
        assert!(records.iter().filter_map(|r| r.recency).all(|d| d >= 0));
    }

    #[test]
    fn test_summary_reports_undefined_recency_separately() {
        let records = rfm(&orders(), &RfmColumns::default()).unwrap();
        let summary = RfmSummary::from_records(&records);

        assert_eq!(summary.customers, 3);
        assert_eq!(summary.undefined_recency, 1);
        assert_eq!(summary.mean_recency, Some(3.0));
        assert_eq!(summary.mean_frequency, Some(5.0 / 3.0));
    }

    #[test]
    fn test_no_timestamps_at_all() {
        let table = Table::from_rows(
            &[
                "customer_id",
                "review_answer_timestamp",
                "order_id",
                "payment_value",
            ],
            vec![vec![
                Value::text("c1"),
                Value::Missing,
                Value::text("o1"),
                Value::Float(1.0),
            ]],
        );
        let records = rfm(&table, &RfmColumns::default()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].recency, None);
    }

    #[test]
    fn test_missing_columns() {
        let table = Table::from_rows(&["customer_id"], vec![vec![Value::text("c1")]]);
        let err = rfm(&table, &RfmColumns::default()).unwrap_err();
        assert_eq!(
            err,
            AnalysisError::MissingColumns {
                columns: vec![
                    "review_answer_timestamp".to_string(),
                    "order_id".to_string(),
                    "payment_value".to_string()
                ]
            }
        );
    }

    #[test]
    fn test_rfm_is_reproducible() {
        let table = orders();
        assert_eq!(
            rfm(&table, &RfmColumns::default()).unwrap(),
            rfm(&table, &RfmColumns::default()).unwrap()
        );
    }
}
