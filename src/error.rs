//! Error types for table analysis.
//!
//! None of these are fatal to a dashboard run: the dashboard turns every
//! `AnalysisError` into an "unavailable" section notice.

use thiserror::Error;

/// Errors raised by the tabular aggregation and binning operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    /// One or more required columns are absent from the table.
    #[error("missing column(s): {}", .columns.join(", "))]
    MissingColumns { columns: Vec<String> },

    /// A numeric aggregation or binning met a non-numeric cell.
    #[error("column '{column}' holds non-numeric value '{value}'")]
    NonNumeric { column: String, value: String },

    /// A date computation met a cell that is not a timestamp.
    #[error("column '{column}' holds non-timestamp value '{value}'")]
    NonTemporal { column: String, value: String },

    /// Bin boundaries or labels are malformed.
    #[error("invalid bins: {0}")]
    InvalidBins(String),

    /// A column was built with the wrong number of rows for its table.
    #[error("column '{column}' has {actual} rows, table has {expected}")]
    LengthMismatch {
        column: String,
        expected: usize,
        actual: usize,
    },
}

/// Result alias for analysis operations.
pub type AnalysisResult<T> = std::result::Result<T, AnalysisError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_columns_message() {
        let err = AnalysisError::MissingColumns {
            columns: vec!["seller_state".to_string(), "order_id".to_string()],
        };
        assert_eq!(err.to_string(), "missing column(s): seller_state, order_id");
    }

    #[test]
    fn test_non_numeric_message() {
        let err = AnalysisError::NonNumeric {
            column: "payment_value".to_string(),
            value: "abc".to_string(),
        };
        assert!(err.to_string().contains("payment_value"));
        assert!(err.to_string().contains("abc"));
    }
}
