//! Error types for the data-access boundary and the engine.

use thiserror::Error;

#[cfg(test)]
use crate::models::ActivitySource;

/// Failure reported by a [`GradebookStore`](crate::store::GradebookStore).
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing database rejected or failed the query
    #[error("query failed: {0}")]
    Query(#[source] sqlx::Error),

    /// A row came back without the shape the engine relies on
    #[error("unexpected row in {table}: {message}")]
    InvalidRow { table: String, message: String },

    /// Failure injected by the in-memory store
    #[cfg(test)]
    #[error("injected failure for {0:?}")]
    Injected(ActivitySource),
}

impl StoreError {
    pub fn invalid_row(table: &str, message: impl Into<String>) -> Self {
        StoreError::InvalidRow {
            table: table.to_string(),
            message: message.into(),
        }
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::ColumnNotFound(column) => StoreError::InvalidRow {
                table: "<row>".to_string(),
                message: format!("missing column {column}"),
            },
            sqlx::Error::ColumnDecode { index, source } => StoreError::InvalidRow {
                table: "<row>".to_string(),
                message: format!("column {index} has an unexpected type: {source}"),
            },
            other => StoreError::Query(other),
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Failure of an engine operation that cannot degrade to an empty signal.
#[derive(Debug, Error)]
pub enum GradebookError {
    #[error("could not load study periods for class {class_code}")]
    Periods {
        class_code: String,
        #[source]
        source: StoreError,
    },

    #[error("could not load roster for class {class_code}")]
    Roster {
        class_code: String,
        #[source]
        source: StoreError,
    },

    #[error("could not save {what}")]
    Write {
        what: &'static str,
        #[source]
        source: StoreError,
    },

    #[error("score {score} is outside 0..=10")]
    InvalidScore { score: f64 },
}
