//! In-memory column-oriented table.
//!
//! A `Table` is immutable once built. Derived columns are added with
//! [`Table::with_column`], which returns a new view sharing the untouched
//! columns with the original.

pub mod loader;

use crate::error::{AnalysisError, AnalysisResult};
use chrono::NaiveDateTime;
use serde::{Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

/// Format used when rendering timestamps.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A single cell value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Absent, unparseable or undefined.
    Missing,
    Int(i64),
    Float(f64),
    Text(String),
    Timestamp(NaiveDateTime),
}

impl Value {
    /// Builds a float cell, mapping NaN to `Missing` and negative zero to zero.
    pub fn float(v: f64) -> Self {
        if v.is_nan() {
            Value::Missing
        } else if v == 0.0 {
            Value::Float(0.0)
        } else {
            Value::Float(v)
        }
    }

    /// Builds a text cell.
    pub fn text(s: impl Into<String>) -> Self {
        Value::Text(s.into())
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }

    /// Numeric view of the cell. Only `Int` and `Float` are numeric.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<NaiveDateTime> {
        match self {
            Value::Timestamp(ts) => Some(*ts),
            _ => None,
        }
    }

    /// Cross-type ordering rank: numbers, then timestamps, then text, then missing.
    fn rank(&self) -> u8 {
        match self {
            Value::Int(_) | Value::Float(_) => 0,
            Value::Timestamp(_) => 1,
            Value::Text(_) => 2,
            Value::Missing => 3,
        }
    }

    /// Total order used for grouping and sorting keys.
    ///
    /// Missing always sorts last. `Int` and `Float` compare numerically.
    pub fn cmp_key(&self, other: &Value) -> Ordering {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a.cmp(b),
            (Value::Timestamp(a), Value::Timestamp(b)) => a.cmp(b),
            (Value::Text(a), Value::Text(b)) => a.cmp(b),
            (Value::Missing, Value::Missing) => Ordering::Equal,
            _ => match (self.as_f64(), other.as_f64()) {
                (Some(a), Some(b)) => a.total_cmp(&b),
                _ => self.rank().cmp(&other.rank()),
            },
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Missing => write!(f, "n/a"),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(v) => write!(f, "{}", v),
            Value::Text(s) => write!(f, "{}", s),
            Value::Timestamp(ts) => write!(f, "{}", ts.format(TIMESTAMP_FORMAT)),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Missing => serializer.serialize_none(),
            Value::Int(i) => serializer.serialize_i64(*i),
            Value::Float(v) if v.is_finite() => serializer.serialize_f64(*v),
            Value::Float(_) => serializer.serialize_none(),
            Value::Text(s) => serializer.serialize_str(s),
            Value::Timestamp(ts) => {
                serializer.collect_str(&ts.format(TIMESTAMP_FORMAT))
            }
        }
    }
}

/// Wrapper giving `Value` the total order of [`Value::cmp_key`], for use as a map key.
#[derive(Debug, Clone)]
pub struct SortKey(pub Value);

impl PartialEq for SortKey {
    fn eq(&self, other: &Self) -> bool {
        self.0.cmp_key(&other.0) == Ordering::Equal
    }
}

impl Eq for SortKey {}

impl PartialOrd for SortKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SortKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.cmp_key(&other.0)
    }
}

/// A named column of values.
///
/// Bucket-label columns carry an ordered category list; grouping on them
/// follows category order and lists empty categories too.
#[derive(Debug, Clone)]
pub struct Column {
    name: String,
    values: Arc<Vec<Value>>,
    categories: Option<Arc<Vec<String>>>,
}

impl Column {
    pub fn new(name: impl Into<String>, values: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            values: Arc::new(values),
            categories: None,
        }
    }

    /// Creates an ordered categorical column.
    pub fn categorical(name: impl Into<String>, values: Vec<Value>, categories: Vec<String>) -> Self {
        Self {
            name: name.into(),
            values: Arc::new(values),
            categories: Some(Arc::new(categories)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn categories(&self) -> Option<&[String]> {
        self.categories.as_deref().map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }
}

/// An immutable table of equal-length columns.
#[derive(Debug, Clone, Default)]
pub struct Table {
    columns: Vec<Column>,
    rows: usize,
}

impl Table {
    /// Builds a table, checking that all columns have the same length.
    pub fn new(columns: Vec<Column>) -> AnalysisResult<Self> {
        let rows = columns.first().map(Column::len).unwrap_or(0);
        for column in &columns {
            if column.len() != rows {
                return Err(AnalysisError::LengthMismatch {
                    column: column.name().to_string(),
                    expected: rows,
                    actual: column.len(),
                });
            }
        }
        Ok(Self { columns, rows })
    }

    /// Builds a table from row-major data. Short rows are padded with `Missing`.
    pub fn from_rows(headers: &[&str], rows: Vec<Vec<Value>>) -> Self {
        let mut columns: Vec<Vec<Value>> = vec![Vec::with_capacity(rows.len()); headers.len()];

        for row in rows {
            let mut cells = row.into_iter();
            for column in columns.iter_mut() {
                column.push(cells.next().unwrap_or(Value::Missing));
            }
        }

        let row_count = columns.first().map(Vec::len).unwrap_or(0);
        Self {
            columns: headers
                .iter()
                .zip(columns)
                .map(|(name, values)| Column::new(*name, values))
                .collect(),
            rows: row_count,
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(Column::name).collect()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name() == name)
    }

    /// Like [`Table::column`], but reports an absent column as an error.
    pub fn require(&self, name: &str) -> AnalysisResult<&Column> {
        self.column(name).ok_or_else(|| AnalysisError::MissingColumns {
            columns: vec![name.to_string()],
        })
    }

    /// Schema capability query: are all of `names` present?
    pub fn has_columns(&self, names: &[&str]) -> bool {
        names.iter().all(|name| self.column(name).is_some())
    }

    /// The subset of `names` absent from the table, in the order given.
    pub fn missing_columns(&self, names: &[&str]) -> Vec<String> {
        names
            .iter()
            .filter(|name| self.column(name).is_none())
            .map(|name| name.to_string())
            .collect()
    }

    /// Returns a new table view with `column` appended, or replacing a column
    /// of the same name. `self` is left unchanged.
    pub fn with_column(&self, column: Column) -> AnalysisResult<Table> {
        if !self.columns.is_empty() && column.len() != self.rows {
            return Err(AnalysisError::LengthMismatch {
                column: column.name().to_string(),
                expected: self.rows,
                actual: column.len(),
            });
        }

        let mut columns = self.columns.clone();
        match columns.iter_mut().find(|c| c.name() == column.name()) {
            Some(existing) => *existing = column,
            None => columns.push(column),
        }
        Table::new(columns)
    }

    /// First `n` rows in row-major order.
    pub fn head(&self, n: usize) -> Vec<Vec<Value>> {
        (0..self.rows.min(n))
            .map(|row| {
                self.columns
                    .iter()
                    .map(|c| c.values()[row].clone())
                    .collect()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        Table::from_rows(
            &["customer_id", "payment_value"],
            vec![
                vec![Value::text("a"), Value::Float(10.0)],
                vec![Value::text("b"), Value::Missing],
                vec![Value::text("c")],
            ],
        )
    }

    #[test]
    fn test_float_nan_is_missing() {
        assert_eq!(Value::float(f64::NAN), Value::Missing);
        assert_eq!(Value::float(1.5), Value::Float(1.5));
    }

    #[test]
    fn test_from_rows_pads_short_rows() {
        let table = sample();
        assert_eq!(table.row_count(), 3);
        assert_eq!(
            table.column("payment_value").unwrap().values()[2],
            Value::Missing
        );
    }

    #[test]
    fn test_has_columns() {
        let table = sample();
        assert!(table.has_columns(&["customer_id"]));
        assert!(table.has_columns(&["customer_id", "payment_value"]));
        assert!(!table.has_columns(&["customer_id", "seller_state"]));
        assert!(table.has_columns(&[]));
    }

    #[test]
    fn test_missing_columns_preserves_order() {
        let table = sample();
        assert_eq!(
            table.missing_columns(&["order_id", "customer_id", "seller_state"]),
            vec!["order_id", "seller_state"]
        );
    }

    #[test]
    fn test_with_column_leaves_source_untouched() {
        let table = sample();
        let derived = table
            .with_column(Column::new(
                "flag",
                vec![Value::Int(1), Value::Int(0), Value::Int(1)],
            ))
            .unwrap();

        assert_eq!(table.column_count(), 2);
        assert!(table.column("flag").is_none());
        assert_eq!(derived.column_count(), 3);
        assert_eq!(derived.column_names(), vec!["customer_id", "payment_value", "flag"]);
    }

    #[test]
    fn test_with_column_replaces_same_name() {
        let table = sample();
        let derived = table
            .with_column(Column::new(
                "payment_value",
                vec![Value::Int(1), Value::Int(2), Value::Int(3)],
            ))
            .unwrap();

        assert_eq!(derived.column_count(), 2);
        assert_eq!(derived.column("payment_value").unwrap().values()[1], Value::Int(2));
        assert_eq!(table.column("payment_value").unwrap().values()[1], Value::Missing);
    }

    #[test]
    fn test_with_column_rejects_wrong_length() {
        let table = sample();
        let err = table
            .with_column(Column::new("flag", vec![Value::Int(1)]))
            .unwrap_err();
        assert!(matches!(err, AnalysisError::LengthMismatch { expected: 3, actual: 1, .. }));
    }

    #[test]
    fn test_cmp_key_orders_missing_last() {
        let mut keys = vec![
            SortKey(Value::Missing),
            SortKey(Value::Float(2.5)),
            SortKey(Value::Int(1)),
            SortKey(Value::text("SP")),
            SortKey(Value::Int(3)),
        ];
        keys.sort();
        let sorted: Vec<Value> = keys.into_iter().map(|k| k.0).collect();
        assert_eq!(
            sorted,
            vec![
                Value::Int(1),
                Value::Float(2.5),
                Value::Int(3),
                Value::text("SP"),
                Value::Missing
            ]
        );
    }

    #[test]
    fn test_head() {
        let table = sample();
        let head = table.head(2);
        assert_eq!(head.len(), 2);
        assert_eq!(head[0], vec![Value::text("a"), Value::Float(10.0)]);
        assert_eq!(table.head(10).len(), 3);
    }

    #[test]
    fn test_value_serializes_missing_as_null() {
        let json = serde_json::to_string(&vec![
            Value::Missing,
            Value::Int(4),
            Value::text("x"),
        ])
        .unwrap();
        assert_eq!(json, "[null,4,\"x\"]");
    }
}
