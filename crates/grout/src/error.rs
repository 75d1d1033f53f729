use thiserror::Error;

/// Driver-level failure reported by a [`SchemaStore`](crate::SchemaStore) method.
///
/// Carries the underlying driver's error text verbatim so that per-column
/// failure records and fatal catalog errors both surface something an operator
/// can act on without re-running with extra instrumentation.
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct StoreError(pub String);

impl From<tokio_postgres::Error> for StoreError {
    fn from(err: tokio_postgres::Error) -> Self {
        StoreError(err.to_string())
    }
}

#[derive(Debug, Error)]
pub enum Error {
    /// Introspection itself failed: the catalog query errored or the table
    /// does not exist. Fatal to the whole run; a column that merely fails to
    /// be added is recorded in the result instead, never raised as this.
    #[error("catalog unavailable for table {table}: {detail}")]
    CatalogUnavailable { table: String, detail: String },

    #[error("postgres error: {0}")]
    Postgres(#[from] tokio_postgres::Error),
}
