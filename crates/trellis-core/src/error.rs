//! Error types for Trellis.

use std::fmt;

/// The main error type for Trellis operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrellisError {
    /// A widget was constructed with zero columns.
    NoColumns,
    /// The tree column index is outside the column range.
    TreeColumnOutOfRange {
        /// The requested tree column.
        tree_column: usize,
        /// The total number of columns.
        columns: usize,
    },
}

impl fmt::Display for TrellisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoColumns => {
                write!(f, "widget requires at least one column")
            }
            Self::TreeColumnOutOfRange {
                tree_column,
                columns,
            } => {
                write!(
                    f,
                    "tree column {tree_column} is out of range for {columns} column(s)"
                )
            }
        }
    }
}

impl std::error::Error for TrellisError {}

/// A specialized Result type for Trellis operations.
pub type Result<T> = std::result::Result<T, TrellisError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        assert_eq!(
            TrellisError::NoColumns.to_string(),
            "widget requires at least one column"
        );
        assert_eq!(
            TrellisError::TreeColumnOutOfRange {
                tree_column: 4,
                columns: 2
            }
            .to_string(),
            "tree column 4 is out of range for 2 column(s)"
        );
    }
}
