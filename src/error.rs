use thiserror::Error;

use crate::models::RoundId;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GridError {
    #[error("table {0} not found")]
    TableNotFound(String),
    #[error("column {column} out of range for table {table_id} ({columns} sortable columns)")]
    ColumnOutOfRange {
        table_id: String,
        column: usize,
        columns: usize,
    },
    #[error("round {0} has no collapsible group")]
    RoundNotFound(RoundId),
}
