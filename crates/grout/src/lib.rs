//! Additive schema reconciliation for Postgres.
//!
//! grout brings a live table's column set up to a required superset: declare
//! the columns a table must have, and grout introspects the catalog, adds only
//! what is missing, and reports exactly what it found, added, and failed to
//! add. Existing columns are never dropped or altered, and runs are idempotent
//! by construction: the common "already migrated" case is a read-only pass.
//!
//! # Example
//!
//! ```ignore
//! use grout::{ColumnSpec, PgStore, TableTarget, reconcile};
//!
//! let client = grout::connect("postgres://app@localhost/students").await?;
//!
//! let target = TableTarget::new("timelines")
//!     .column(ColumnSpec::new("course_topic", "VARCHAR(300)"));
//!
//! let store = PgStore::new(&client);
//! let result = reconcile(&store, &target).await?;
//! println!("{}", result);
//! ```
//!
//! Per-column failures (bad type, lost race with a concurrent run, missing
//! privilege) are captured in the result and do not abort the run; only
//! catalog-level failures are fatal. See [`reconcile`] for the details.

mod conn;
mod error;
mod reconcile;
pub mod schema;
pub mod sql;
pub mod store;

pub use conn::{ConnFuture, Connection, connect};
pub use error::{Error, StoreError};
pub use reconcile::{ReconciliationResult, describe, reconcile};
pub use schema::{ColumnSpec, LiveColumn, TableTarget};
pub use sql::Dialect;
pub use store::{PgStore, SchemaStore, StoreFuture};

/// Result type for grout operations.
pub type Result<T> = std::result::Result<T, Error>;
