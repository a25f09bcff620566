//! Group-and-aggregate over a [`Table`].
//!
//! Rows are partitioned by the distinct values of a key column and each
//! aggregation is applied per partition. Missing keys form their own
//! partition, sorted last.

use crate::error::{AnalysisError, AnalysisResult};
use crate::table::{Column, SortKey, Table, Value};
use serde::Serialize;
use std::collections::BTreeMap;

/// Aggregation function applied to a partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AggFunc {
    /// Non-missing values of the source column.
    Count,
    /// Rows in the partition, regardless of the source column.
    Size,
    Sum,
    Mean,
    Min,
    Max,
}

/// One output metric: `func` over `source`, published as `label`.
#[derive(Debug, Clone)]
pub struct AggSpec {
    pub source: String,
    pub func: AggFunc,
    pub label: String,
}

impl AggSpec {
    pub fn new(source: impl Into<String>, func: AggFunc, label: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            func,
            label: label.into(),
        }
    }
}

/// A single group of an [`AggregateTable`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateRow {
    pub key: Value,
    pub values: Vec<Value>,
}

/// Result of a group-and-aggregate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateTable {
    /// Display label of the key column.
    pub key_label: String,
    /// Display labels of the metrics, in `AggSpec` order.
    pub labels: Vec<String>,
    pub rows: Vec<AggregateRow>,
}

impl AggregateTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Looks up the row for `key`.
    pub fn row(&self, key: &Value) -> Option<&AggregateRow> {
        self.rows.iter().find(|r| &r.key == key)
    }

    /// Looks up a single cell by key and metric label.
    pub fn get(&self, key: &Value, label: &str) -> Option<&Value> {
        let index = self.labels.iter().position(|l| l == label)?;
        self.row(key).and_then(|r| r.values.get(index))
    }

    /// Separates the missing-key row, if any, from the rest.
    pub fn split_missing(mut self) -> (AggregateTable, Option<AggregateRow>) {
        let position = self.rows.iter().position(|r| r.key.is_missing());
        let missing = position.map(|i| self.rows.remove(i));
        (self, missing)
    }

    /// Renames the key column.
    pub fn with_key_label(mut self, label: impl Into<String>) -> Self {
        self.key_label = label.into();
        self
    }
}

/// Partition row indices by the values of `key`.
///
/// Categorical keys yield every category in order, even empty ones;
/// other keys yield their distinct values ascending. Missing comes last
/// in both cases and only when present.
pub fn partition(key: &Column) -> Vec<(Value, Vec<usize>)> {
    match key.categories() {
        Some(categories) => {
            let mut groups: Vec<(Value, Vec<usize>)> = categories
                .iter()
                .map(|c| (Value::text(c.clone()), Vec::new()))
                .collect();
            let mut missing = Vec::new();

            for (row, value) in key.values().iter().enumerate() {
                let slot = match value {
                    Value::Text(label) => categories.iter().position(|c| c == label),
                    _ => None,
                };
                match slot {
                    Some(i) => groups[i].1.push(row),
                    None => missing.push(row),
                }
            }

            if !missing.is_empty() {
                groups.push((Value::Missing, missing));
            }
            groups
        }
        None => {
            let mut groups: BTreeMap<SortKey, Vec<usize>> = BTreeMap::new();
            for (row, value) in key.values().iter().enumerate() {
                groups.entry(SortKey(value.clone())).or_default().push(row);
            }
            groups.into_iter().map(|(k, rows)| (k.0, rows)).collect()
        }
    }
}

/// Group `table` by `key` and compute each of `specs` per group.
pub fn group_and_aggregate(
    table: &Table,
    key: &str,
    specs: &[AggSpec],
) -> AnalysisResult<AggregateTable> {
    let mut required = vec![key];
    required.extend(
        specs
            .iter()
            .filter(|s| s.func != AggFunc::Size)
            .map(|s| s.source.as_str()),
    );
    let missing = table.missing_columns(&required);
    if !missing.is_empty() {
        return Err(AnalysisError::MissingColumns { columns: missing });
    }

    let key_column = table.require(key)?;
    let sources = specs
        .iter()
        .map(|spec| match spec.func {
            AggFunc::Size => Ok(None),
            _ => table.require(&spec.source).map(Some),
        })
        .collect::<AnalysisResult<Vec<_>>>()?;

    let mut rows = Vec::new();
    for (group_key, indices) in partition(key_column) {
        let values = specs
            .iter()
            .zip(&sources)
            .map(|(spec, source)| match source {
                Some(column) => aggregate(column, &indices, spec.func),
                None => Ok(Value::Int(indices.len() as i64)),
            })
            .collect::<AnalysisResult<Vec<_>>>()?;

        rows.push(AggregateRow {
            key: group_key,
            values,
        });
    }

    Ok(AggregateTable {
        key_label: key.to_string(),
        labels: specs.iter().map(|s| s.label.clone()).collect(),
        rows,
    })
}

/// Apply `func` to the rows `indices` of `column`.
///
/// Missing cells are skipped. `Sum` of nothing is 0; `Mean`, `Min` and
/// `Max` of nothing are missing.
pub fn aggregate(column: &Column, indices: &[usize], func: AggFunc) -> AnalysisResult<Value> {
    let cells = indices.iter().map(|&i| &column.values()[i]);

    match func {
        AggFunc::Size => Ok(Value::Int(indices.len() as i64)),
        AggFunc::Count => Ok(Value::Int(
            cells.filter(|v| !v.is_missing()).count() as i64,
        )),
        AggFunc::Sum | AggFunc::Mean | AggFunc::Min | AggFunc::Max => {
            let numbers = numeric_cells(column.name(), cells)?;
            Ok(match func {
                AggFunc::Sum => Value::float(numbers.iter().fold(0.0, |acc, v| acc + v)),
                AggFunc::Mean if numbers.is_empty() => Value::Missing,
                AggFunc::Mean => Value::float(numbers.iter().sum::<f64>() / numbers.len() as f64),
                AggFunc::Min => numbers
                    .iter()
                    .copied()
                    .reduce(f64::min)
                    .map(Value::float)
                    .unwrap_or(Value::Missing),
                _ => numbers
                    .iter()
                    .copied()
                    .reduce(f64::max)
                    .map(Value::float)
                    .unwrap_or(Value::Missing),
            })
        }
    }
}

/// Collect the non-missing cells as numbers, failing on text or timestamps.
pub fn numeric_cells<'a>(
    column: &str,
    cells: impl Iterator<Item = &'a Value>,
) -> AnalysisResult<Vec<f64>> {
    let mut numbers = Vec::new();
    for value in cells {
        if value.is_missing() {
            continue;
        }
        match value.as_f64() {
            Some(n) => numbers.push(n),
            None => {
                return Err(AnalysisError::NonNumeric {
                    column: column.to_string(),
                    value: value.to_string(),
                })
            }
        }
    }
    Ok(numbers)
}
