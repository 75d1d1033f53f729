//! Declared column requirements and the catalog's view of a table.
//!
//! A [`TableTarget`] is the caller's statement of what a table must contain:
//! an ordered list of [`ColumnSpec`]s, optionally anchored after an existing
//! column on dialects that support positional placement. It says nothing about
//! columns the table already has beyond the required set; reconciliation only
//! ever adds.

/// A required column, declared by the caller.
///
/// The type is a raw, dialect-specific type expression (`"VARCHAR(255)"`,
/// `"TIMESTAMPTZ"`, ...) rather than an enum: the reconciler passes it through
/// to the database untouched, and the database is the authority on whether it
/// is valid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSpec {
    /// Column name, unique within a table.
    pub name: String,
    /// Dialect-specific type expression, e.g. `"VARCHAR(255)"`.
    pub sql_type: String,
    /// Whether the column allows NULL. New columns on populated tables
    /// generally need this (or a default) to be addable at all.
    pub nullable: bool,
    /// Default value expression (if any), e.g. `"now()"` or `"0"`.
    pub default: Option<String>,
    /// Column comment (if any).
    pub comment: Option<String>,
}

impl ColumnSpec {
    /// Create a nullable column spec with no default and no comment.
    pub fn new(name: impl Into<String>, sql_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sql_type: sql_type.into(),
            nullable: true,
            default: None,
            comment: None,
        }
    }

    /// Mark the column NOT NULL.
    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    /// Set a default value expression.
    pub fn default_expr(mut self, expr: impl Into<String>) -> Self {
        self.default = Some(expr.into());
        self
    }

    /// Set a column comment.
    pub fn comment(mut self, text: impl Into<String>) -> Self {
        self.comment = Some(text.into());
        self
    }
}

/// A table plus the columns it is required to have.
///
/// `required_columns` order is preserved: it determines ALTER statement order,
/// and (on positional dialects) the final position of the new columns relative
/// to `insertion_anchor`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableTarget {
    /// Name of an existing table.
    pub table_name: String,
    /// Columns the table must end up with, in declared order.
    pub required_columns: Vec<ColumnSpec>,
    /// Existing column after which new columns are positioned, on dialects
    /// with positional ALTER. Ignored elsewhere (Postgres appends).
    pub insertion_anchor: Option<String>,
}

impl TableTarget {
    /// Create an empty target for `table_name`.
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            required_columns: Vec::new(),
            insertion_anchor: None,
        }
    }

    /// Append a required column.
    pub fn column(mut self, spec: ColumnSpec) -> Self {
        self.required_columns.push(spec);
        self
    }

    /// Position new columns after `column_name` (positional dialects only).
    pub fn after(mut self, column_name: impl Into<String>) -> Self {
        self.insertion_anchor = Some(column_name.into());
        self
    }
}

/// One column as reported by the database catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveColumn {
    /// Column name.
    pub name: String,
    /// Type name as the catalog spells it (e.g. `character varying`).
    pub data_type: String,
}

impl LiveColumn {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
        }
    }
}
