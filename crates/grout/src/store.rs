//! Catalog access and DDL execution.
//!
//! [`SchemaStore`] is the seam between the reconciler and a live database: it
//! answers "which columns does this table have?" from the catalog (committed
//! state only, never cached) and executes one DDL statement per call, each
//! committed independently. [`PgStore`] is the Postgres implementation; tests
//! substitute an in-memory store.

use crate::conn::Connection;
use crate::error::StoreError;
use crate::schema::LiveColumn;
use crate::sql::Dialect;
use std::future::Future;
use std::pin::Pin;
use tracing::Instrument;

/// Future type returned by [`SchemaStore`] methods.
///
/// Boxed so the trait stays usable as `dyn SchemaStore`.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + Send + 'a>>;

/// A live database's schema-management surface.
pub trait SchemaStore: Send + Sync {
    /// The dialect statements must be rendered for.
    fn dialect(&self) -> Dialect;

    /// Whether `table` exists, per the catalog.
    fn table_exists<'a>(&'a self, table: &'a str) -> StoreFuture<'a, bool>;

    /// The table's columns in ordinal position, re-read from the catalog on
    /// every call.
    fn list_columns<'a>(&'a self, table: &'a str) -> StoreFuture<'a, Vec<LiveColumn>>;

    /// Execute one DDL statement. The statement is committed when the call
    /// returns Ok; a failure leaves previously applied statements committed.
    fn apply<'a>(&'a self, sql: &'a str) -> StoreFuture<'a, ()>;

    /// Best-effort rollback of any in-flight transaction state, issued before
    /// a fatal error propagates. Stores with per-statement autocommit have
    /// nothing to undo; the default is a no-op.
    fn rollback<'a>(&'a self) -> StoreFuture<'a, ()> {
        Box::pin(async { Ok(()) })
    }
}

const TABLE_EXISTS_SQL: &str = "SELECT EXISTS (\
     SELECT 1 FROM information_schema.tables \
     WHERE table_schema = current_schema() AND table_name = $1)";

const LIST_COLUMNS_SQL: &str = "SELECT column_name, data_type \
     FROM information_schema.columns \
     WHERE table_schema = current_schema() AND table_name = $1 \
     ORDER BY ordinal_position";

/// Postgres-backed [`SchemaStore`] over any [`Connection`].
///
/// Introspection goes through `information_schema`. Every round trip runs
/// inside a tracing span, so a reconciliation run can be audited from the
/// debug log alone.
pub struct PgStore<'a, C: Connection> {
    conn: &'a C,
}

impl<'a, C: Connection> PgStore<'a, C> {
    pub fn new(conn: &'a C) -> Self {
        Self { conn }
    }
}

impl<C: Connection> SchemaStore for PgStore<'_, C> {
    fn dialect(&self) -> Dialect {
        Dialect::Postgres
    }

    fn table_exists<'s>(&'s self, table: &'s str) -> StoreFuture<'s, bool> {
        Box::pin(async move {
            let span = tracing::debug_span!("catalog.table", table = %table);
            let row = self
                .conn
                .query_one(TABLE_EXISTS_SQL, &[&table])
                .instrument(span)
                .await
                .map_err(StoreError::from)?;
            Ok(row.get(0))
        })
    }

    fn list_columns<'s>(&'s self, table: &'s str) -> StoreFuture<'s, Vec<LiveColumn>> {
        Box::pin(async move {
            let span = tracing::debug_span!(
                "catalog.columns",
                table = %table,
                rows = tracing::field::Empty,
            );
            let rows = self
                .conn
                .query(LIST_COLUMNS_SQL, &[&table])
                .instrument(span.clone())
                .await
                .map_err(StoreError::from)?;
            span.record("rows", rows.len());
            Ok(rows
                .iter()
                .map(|row| {
                    let name: String = row.get(0);
                    let data_type: String = row.get(1);
                    LiveColumn { name, data_type }
                })
                .collect())
        })
    }

    fn apply<'s>(&'s self, sql: &'s str) -> StoreFuture<'s, ()> {
        Box::pin(async move {
            let span = tracing::debug_span!("ddl.apply", sql = %sql);
            self.conn
                .execute(sql, &[])
                .instrument(span)
                .await
                .map_err(StoreError::from)?;
            Ok(())
        })
    }

    fn rollback<'s>(&'s self) -> StoreFuture<'s, ()> {
        Box::pin(async move {
            // Harmless outside a transaction (the server emits a notice).
            let span = tracing::debug_span!("ddl.rollback");
            self.conn
                .execute("ROLLBACK", &[])
                .instrument(span)
                .await
                .map_err(StoreError::from)?;
            Ok(())
        })
    }
}
