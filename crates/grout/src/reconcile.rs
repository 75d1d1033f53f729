//! Bring a live table's column set up to the required superset.
//!
//! [`reconcile`] compares a [`TableTarget`] against the live catalog and adds
//! only the columns that are missing. It never drops or alters existing
//! columns, and it is safe to run any number of times: the common case
//! (already migrated) is a read-only pass that touches nothing.
//!
//! Each column addition is attempted and committed independently. One bad
//! column specification never blocks unrelated columns from being added; the
//! failure is captured per column in the returned [`ReconciliationResult`]
//! instead of aborting the run. Only introspection failures are fatal.
//!
//! Two reconciliation runs racing on the same table are not coordinated here
//! (operators serialize runs); a column added by the other run between
//! introspection and our ALTER surfaces as an ordinary per-column failure.

use crate::error::Error;
use crate::schema::{LiveColumn, TableTarget};
use crate::sql;
use crate::store::SchemaStore;
use indexmap::IndexMap;
use std::collections::{BTreeSet, HashSet};
use std::fmt;

/// Report of one reconciliation run.
///
/// Every name from the target's `required_columns` appears in exactly one of
/// the three classification buckets. The snapshot is re-read from the catalog
/// after all ALTER attempts, so it reflects ground truth even under partial
/// failure. The report carries no identity across runs; callers print or log
/// it and drop it.
#[derive(Debug, Clone, Default)]
pub struct ReconciliationResult {
    /// Table the run targeted.
    pub table_name: String,
    /// Required columns the live table already had.
    pub columns_already_present: BTreeSet<String>,
    /// Columns added by this run, in declared order.
    pub columns_added: Vec<String>,
    /// Columns whose addition failed, with the driver's error text.
    pub columns_failed: IndexMap<String, String>,
    /// The table's columns as the catalog reports them after the run.
    pub final_schema_snapshot: Vec<LiveColumn>,
}

impl ReconciliationResult {
    fn new(table_name: &str) -> Self {
        Self {
            table_name: table_name.to_string(),
            ..Default::default()
        }
    }

    /// True if any column failed to be added.
    pub fn has_failures(&self) -> bool {
        !self.columns_failed.is_empty()
    }

    /// True if the run changed nothing and nothing failed (fully migrated).
    pub fn is_noop(&self) -> bool {
        self.columns_added.is_empty() && self.columns_failed.is_empty()
    }
}

impl fmt::Display for ReconciliationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}:", self.table_name)?;
        for name in &self.columns_already_present {
            writeln!(f, "  = {} (already present)", name)?;
        }
        for name in &self.columns_added {
            writeln!(f, "  + {} (added)", name)?;
        }
        for (name, err) in &self.columns_failed {
            writeln!(f, "  ! {} failed: {}", name, err)?;
        }
        writeln!(f, "live schema:")?;
        for col in &self.final_schema_snapshot {
            writeln!(f, "  {}: {}", col.name, col.data_type)?;
        }
        Ok(())
    }
}

/// List a table's live columns, re-read from the catalog.
///
/// Used internally before and after a run, and exposed for operator
/// diagnostics. Never served from cached state. Fails with
/// [`Error::CatalogUnavailable`] if the table is absent or the catalog query
/// errors.
pub async fn describe(store: &dyn SchemaStore, table: &str) -> Result<Vec<LiveColumn>, Error> {
    match store.table_exists(table).await {
        Ok(true) => {}
        Ok(false) => return Err(fatal(store, table, "table does not exist".to_string()).await),
        Err(err) => return Err(fatal(store, table, err.to_string()).await),
    }
    match store.list_columns(table).await {
        Ok(columns) => Ok(columns),
        Err(err) => Err(fatal(store, table, err.to_string()).await),
    }
}

/// Add the target's missing columns to the live table, additively and
/// idempotently, and report exactly what happened.
///
/// Column specs are processed in declared order. A spec whose column already
/// exists is classified and skipped without side effects; a spec whose ALTER
/// fails is recorded with the driver's error text and the run continues. Each
/// successful addition is committed on its own, so later failures leave it in
/// place.
pub async fn reconcile(
    store: &dyn SchemaStore,
    target: &TableTarget,
) -> Result<ReconciliationResult, Error> {
    let table = target.table_name.as_str();
    let live = describe(store, table).await?;
    let live_names: HashSet<&str> = live.iter().map(|c| c.name.as_str()).collect();

    let mut result = ReconciliationResult::new(table);

    let dialect = store.dialect();
    let positional = dialect.supports_positional_placement();
    let mut anchor = if positional {
        target.insertion_anchor.clone()
    } else {
        None
    };

    for spec in &target.required_columns {
        let exists = live_names.contains(spec.name.as_str());
        if exists {
            tracing::debug!(table, column = %spec.name, "column already present");
            result.columns_already_present.insert(spec.name.clone());
        } else {
            let statements = sql::add_column_statements(dialect, table, spec, anchor.as_deref());
            let mut failure = None;
            for statement in &statements {
                if let Err(err) = store.apply(statement).await {
                    failure = Some(err.to_string());
                    break;
                }
            }
            match failure {
                Some(err) => {
                    tracing::warn!(table, column = %spec.name, error = %err, "column addition failed");
                    result.columns_failed.insert(spec.name.clone(), err);
                    continue;
                }
                None => {
                    tracing::info!(table, column = %spec.name, sql_type = %spec.sql_type, "column added");
                    result.columns_added.push(spec.name.clone());
                }
            }
        }
        // The most recent required column known to exist becomes the anchor,
        // so a block of new columns lands in declared order.
        if positional {
            anchor = Some(spec.name.clone());
        }
    }

    result.final_schema_snapshot = describe(store, table).await?;
    Ok(result)
}

async fn fatal(store: &dyn SchemaStore, table: &str, detail: String) -> Error {
    // Clear any in-flight transaction state before the error propagates.
    let _ = store.rollback().await;
    tracing::error!(table, %detail, "catalog unavailable");
    Error::CatalogUnavailable {
        table: table.to_string(),
        detail,
    }
}
