use thiserror::Error as ThisError;

/// Errors raised by the query pipeline.
///
/// `MissingColumn` and `InvalidBinWidth` halt a query. `EmptySelection` is
/// recovered by `runtime::run_query` into an empty result, and `InvalidRow`
/// never leaves row extraction.
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum QueryError {
    #[error("required column '{column}' not found")]
    MissingColumn { column: String },

    #[error("no listings available for company '{company}'")]
    EmptySelection { company: String },

    #[error("row {row}: missing or invalid value in column '{column}'")]
    InvalidRow { row: usize, column: String },

    #[error("mileage bin width must be greater than zero")]
    InvalidBinWidth,
}

impl QueryError {
    /// True for errors the pipeline turns into an empty result instead of failing.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::EmptySelection { .. } | Self::InvalidRow { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_column_message() {
        let err = QueryError::MissingColumn {
            column: "키로수".to_string(),
        };
        assert_eq!(err.to_string(), "required column '키로수' not found");
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_empty_selection_is_recoverable() {
        let err = QueryError::EmptySelection {
            company: "기아".to_string(),
        };
        assert!(err.is_recoverable());
        assert!(!QueryError::InvalidBinWidth.is_recoverable());
    }
}
