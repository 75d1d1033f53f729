//! DDL rendering for additive column changes.
//!
//! Statements are rendered one at a time, without trailing semicolons, so each
//! can be executed (and committed) as an independent round trip.

use crate::schema::ColumnSpec;
use std::fmt;

/// The SQL dialect statements are rendered for.
///
/// The shipped executor speaks Postgres; MySQL rendering exists for callers
/// that bring their own [`SchemaStore`](crate::SchemaStore) implementation,
/// and is what gives `insertion_anchor` a meaning (Postgres has no positional
/// ALTER and always appends).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dialect {
    #[default]
    Postgres,
    MySql,
}

impl Dialect {
    /// Whether `ALTER TABLE ... ADD COLUMN` accepts a placement clause.
    pub fn supports_positional_placement(&self) -> bool {
        matches!(self, Dialect::MySql)
    }

    /// Quote an identifier for this dialect.
    ///
    /// Always quotes, so reserved words like `user` or `order` are safe to use
    /// as table or column names. Embedded quote characters are doubled.
    ///
    /// # Example
    /// ```
    /// use grout::Dialect;
    /// assert_eq!(Dialect::Postgres.quote_ident("user"), "\"user\"");
    /// assert_eq!(Dialect::MySql.quote_ident("user"), "`user`");
    /// ```
    pub fn quote_ident(&self, name: &str) -> String {
        let quote = match self {
            Dialect::Postgres => '"',
            Dialect::MySql => '`',
        };
        let mut out = String::with_capacity(name.len() + 2);
        out.push(quote);
        for c in name.chars() {
            if c == quote {
                out.push(quote);
            }
            out.push(c);
        }
        out.push(quote);
        out
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dialect::Postgres => write!(f, "postgres"),
            Dialect::MySql => write!(f, "mysql"),
        }
    }
}

/// A SQL string literal wrapper.
///
/// Display writes the value escaped and quoted with single quotes; embedded
/// single quotes are doubled, which both supported dialects accept.
///
/// # Example
/// ```
/// use grout::sql::Lit;
/// assert_eq!(format!("{}", Lit("foo")), "'foo'");
/// assert_eq!(format!("{}", Lit("it's")), "'it''s'");
/// ```
pub struct Lit<T: AsRef<str>>(pub T);

impl<T: AsRef<str>> fmt::Display for Lit<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'")?;
        for c in self.0.as_ref().chars() {
            if c == '\'' {
                write!(f, "''")?;
            } else {
                write!(f, "{}", c)?;
            }
        }
        write!(f, "'")
    }
}

/// Render the statements that add one column to `table`.
///
/// The first statement is always the `ALTER TABLE ... ADD COLUMN`. On
/// Postgres a comment renders as a second `COMMENT ON COLUMN` statement; on
/// MySQL it is inlined, and `anchor` (if any) renders an `AFTER` clause.
pub fn add_column_statements(
    dialect: Dialect,
    table: &str,
    spec: &ColumnSpec,
    anchor: Option<&str>,
) -> Vec<String> {
    let mut stmt = format!(
        "ALTER TABLE {} ADD COLUMN {} {}",
        dialect.quote_ident(table),
        dialect.quote_ident(&spec.name),
        spec.sql_type
    );

    if !spec.nullable {
        stmt.push_str(" NOT NULL");
    }

    if let Some(default) = &spec.default {
        stmt.push_str(&format!(" DEFAULT {}", default));
    }

    match dialect {
        Dialect::MySql => {
            if let Some(comment) = &spec.comment {
                stmt.push_str(&format!(" COMMENT {}", Lit(comment)));
            }
            if let Some(anchor) = anchor {
                stmt.push_str(&format!(" AFTER {}", dialect.quote_ident(anchor)));
            }
            vec![stmt]
        }
        Dialect::Postgres => {
            let mut statements = vec![stmt];
            if let Some(comment) = &spec.comment {
                statements.push(format!(
                    "COMMENT ON COLUMN {}.{} IS {}",
                    dialect.quote_ident(table),
                    dialect.quote_ident(&spec.name),
                    Lit(comment)
                ));
            }
            statements
        }
    }
}
