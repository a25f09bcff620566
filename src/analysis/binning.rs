//! Interval binning into ordered, labelled buckets.

use crate::error::{AnalysisError, AnalysisResult};
use crate::table::{Column, Table, Value};
use serde::Serialize;

/// `N+1` boundaries defining `N` right-closed intervals `(b[i], b[i+1]]`,
/// each with a label.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bins {
    boundaries: Vec<f64>,
    labels: Vec<String>,
}

impl Bins {
    /// Validates and builds a bin set.
    pub fn new(boundaries: Vec<f64>, labels: Vec<String>) -> AnalysisResult<Self> {
        if boundaries.len() < 2 {
            return Err(AnalysisError::InvalidBins(
                "at least two boundaries are required".to_string(),
            ));
        }
        if labels.len() != boundaries.len() - 1 {
            return Err(AnalysisError::InvalidBins(format!(
                "{} boundaries need {} labels, got {}",
                boundaries.len(),
                boundaries.len() - 1,
                labels.len()
            )));
        }
        if boundaries.iter().any(|b| !b.is_finite()) {
            return Err(AnalysisError::InvalidBins(
                "boundaries must be finite".to_string(),
            ));
        }
        if boundaries.windows(2).any(|w| w[0] >= w[1]) {
            return Err(AnalysisError::InvalidBins(
                "boundaries must be strictly increasing".to_string(),
            ));
        }
        Ok(Self { boundaries, labels })
    }

    pub fn boundaries(&self) -> &[f64] {
        &self.boundaries
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Index of the interval containing `value`, or `None` when it falls
    /// outside every interval. The lowest boundary itself is excluded.
    pub fn assign(&self, value: f64) -> Option<usize> {
        if value.is_nan() {
            return None;
        }
        self.boundaries
            .windows(2)
            .position(|w| w[0] < value && value <= w[1])
    }

    /// Label of the interval containing `value`.
    pub fn label_for(&self, value: f64) -> Option<&str> {
        self.assign(value).map(|i| self.labels[i].as_str())
    }
}

/// Bin `source` and return a new table view with the labels in `target`.
///
/// The label column is categorical in bin order. Missing and out-of-range
/// values get a missing label; text or timestamp values are an error.
pub fn bin_column(table: &Table, source: &str, target: &str, bins: &Bins) -> AnalysisResult<Table> {
    let column = table.require(source)?;

    let labels = column
        .values()
        .iter()
        .map(|value| match value {
            Value::Missing => Ok(Value::Missing),
            other => match other.as_f64() {
                Some(n) => Ok(bins
                    .label_for(n)
                    .map(Value::text)
                    .unwrap_or(Value::Missing)),
                None => Err(AnalysisError::NonNumeric {
                    column: source.to_string(),
                    value: other.to_string(),
                }),
            },
        })
        .collect::<AnalysisResult<Vec<_>>>()?;

    table.with_column(Column::categorical(target, labels, bins.labels.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn age_bins() -> Bins {
        Bins::new(
            vec![0.0, 30.0, 50.0, 70.0, 100.0],
            ["0-30", "31-50", "51-70", ">70"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        )
        .unwrap()
    }

    fn spending_bins() -> Bins {
        Bins::new(
            vec![0.0, 50.0, 150.0, 500.0, 1000.0, 5000.0],
            ["Sangat Rendah", "Rendah", "Sedang", "Tinggi", "Sangat Tinggi"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_age_bins_are_right_inclusive() {
        let bins = age_bins();
        assert_eq!(bins.label_for(30.0), Some("0-30"));
        assert_eq!(bins.label_for(30.01), Some("31-50"));
        assert_eq!(bins.label_for(100.0), Some(">70"));
    }

    #[test]
    fn test_lower_bound_is_excluded() {
        let bins = age_bins();
        assert_eq!(bins.label_for(0.0), None);
        assert_eq!(bins.label_for(-5.0), None);
        assert_eq!(bins.label_for(150.0), None);
        assert_eq!(bins.label_for(f64::NAN), None);
    }

    #[test]
    fn test_spending_bins() {
        let bins = spending_bins();
        assert_eq!(bins.label_for(50.0), Some("Sangat Rendah"));
        assert_eq!(bins.label_for(50.5), Some("Rendah"));
        assert_eq!(bins.label_for(5000.0), Some("Sangat Tinggi"));
        assert_eq!(bins.label_for(5000.01), None);
    }

    #[test]
    fn test_invalid_bins() {
        assert!(Bins::new(vec![0.0], vec![]).is_err());
        assert!(Bins::new(vec![0.0, 10.0], vec![]).is_err());
        assert!(Bins::new(vec![10.0, 0.0], vec!["x".to_string()]).is_err());
        assert!(Bins::new(vec![0.0, f64::INFINITY], vec!["x".to_string()]).is_err());
    }

    #[test]
    fn test_bin_column_appends_categorical_labels() {
        let table = Table::from_rows(
            &["customer_age"],
            vec![
                vec![Value::Int(25)],
                vec![Value::Missing],
                vec![Value::Int(-3)],
                vec![Value::Float(64.5)],
            ],
        );
        let binned = bin_column(&table, "customer_age", "age_group", &age_bins()).unwrap();

        let labels = binned.column("age_group").unwrap();
        assert_eq!(
            labels.values(),
            &[
                Value::text("0-30"),
                Value::Missing,
                Value::Missing,
                Value::text("51-70")
            ]
        );
        assert_eq!(labels.categories().map(|c| c.len()), Some(4));

        // source table and source column are untouched
        assert!(table.column("age_group").is_none());
        assert_eq!(
            binned.column("customer_age").unwrap().values(),
            table.column("customer_age").unwrap().values()
        );
    }

    #[test]
    fn test_bin_column_rejects_text() {
        let table = Table::from_rows(&["customer_age"], vec![vec![Value::text("old")]]);
        let err = bin_column(&table, "customer_age", "age_group", &age_bins()).unwrap_err();
        assert!(matches!(err, AnalysisError::NonNumeric { .. }));
    }

    #[test]
    fn test_bin_column_missing_source() {
        let table = Table::from_rows(&["payment_value"], vec![vec![Value::Float(1.0)]]);
        let err = bin_column(&table, "customer_age", "age_group", &age_bins()).unwrap_err();
        assert!(matches!(err, AnalysisError::MissingColumns { .. }));
    }
}
