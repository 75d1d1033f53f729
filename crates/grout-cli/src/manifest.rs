//! Deploy-time manifest handling.
//!
//! A `grout.toml` manifest declares the tables and columns the operator wants
//! ensured. Looked up in the current directory or any parent directory when no
//! explicit path is given.

use camino::{Utf8Path, Utf8PathBuf};
use grout::{ColumnSpec, TableTarget};
use serde::Deserialize;

const MANIFEST_FILE: &str = "grout.toml";

/// The parsed manifest: a list of `[[table]]` entries.
#[derive(Debug, Deserialize)]
pub struct Manifest {
    #[serde(default, rename = "table")]
    pub tables: Vec<TableEntry>,
}

#[derive(Debug, Deserialize)]
pub struct TableEntry {
    pub name: String,
    /// Existing column after which new columns are placed, on dialects with
    /// positional ALTER.
    pub after: Option<String>,
    #[serde(default, rename = "column")]
    pub columns: Vec<ColumnEntry>,
}

#[derive(Debug, Deserialize)]
pub struct ColumnEntry {
    pub name: String,
    #[serde(rename = "type")]
    pub sql_type: String,
    #[serde(default = "default_nullable")]
    pub nullable: bool,
    pub default: Option<String>,
    pub comment: Option<String>,
}

fn default_nullable() -> bool {
    true
}

impl Manifest {
    pub fn into_targets(self) -> Vec<TableTarget> {
        self.tables
            .into_iter()
            .map(TableEntry::into_target)
            .collect()
    }
}

impl TableEntry {
    fn into_target(self) -> TableTarget {
        TableTarget {
            table_name: self.name,
            insertion_anchor: self.after,
            required_columns: self
                .columns
                .into_iter()
                .map(|c| ColumnSpec {
                    name: c.name,
                    sql_type: c.sql_type,
                    nullable: c.nullable,
                    default: c.default,
                    comment: c.comment,
                })
                .collect(),
        }
    }
}

/// Load targets from an explicit manifest path.
pub fn load(path: &Utf8Path) -> Result<Vec<TableTarget>, ManifestError> {
    let content = std::fs::read_to_string(path).map_err(|e| ManifestError::Io(e.to_string()))?;
    let manifest: Manifest =
        toml::from_str(&content).map_err(|e| ManifestError::Parse(e.to_string()))?;
    Ok(manifest.into_targets())
}

/// Find `grout.toml` by searching up the directory tree, then load it.
pub fn find_and_load() -> Result<(Vec<TableTarget>, Utf8PathBuf), ManifestError> {
    let cwd = std::env::current_dir().map_err(|e| ManifestError::Io(e.to_string()))?;
    let cwd = Utf8PathBuf::from_path_buf(cwd)
        .map_err(|p| ManifestError::Io(format!("non-UTF-8 working directory: {}", p.display())))?;
    let path = find_manifest_file(&cwd)?;
    Ok((load(&path)?, path))
}

fn find_manifest_file(start: &Utf8Path) -> Result<Utf8PathBuf, ManifestError> {
    let mut current = start.to_path_buf();

    loop {
        let candidate = current.join(MANIFEST_FILE);
        if candidate.exists() {
            return Ok(candidate);
        }

        if !current.pop() {
            return Err(ManifestError::NotFound);
        }
    }
}

/// Errors that can occur when loading the manifest.
#[derive(Debug)]
pub enum ManifestError {
    /// No `grout.toml` found in the current directory or any parent
    NotFound,
    /// I/O error reading the file
    Io(String),
    /// Parse error in the TOML
    Parse(String),
}

impl std::fmt::Display for ManifestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ManifestError::NotFound => {
                write!(
                    f,
                    "No {} found in current directory or any parent",
                    MANIFEST_FILE
                )
            }
            ManifestError::Io(e) => write!(f, "Failed to read {}: {}", MANIFEST_FILE, e),
            ManifestError::Parse(e) => write!(f, "Failed to parse {}: {}", MANIFEST_FILE, e),
        }
    }
}

impl std::error::Error for ManifestError {}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        [[table]]
        name = "timelines"
        after = "title"

        [[table.column]]
        name = "course_topic"
        type = "VARCHAR(300)"
        comment = "topic covered this week"

        [[table.column]]
        name = "week_count"
        type = "INTEGER"
        nullable = false
        default = "0"
    "#;

    #[test]
    fn test_parse_manifest() {
        let manifest: Manifest = toml::from_str(SAMPLE).unwrap();
        let targets = manifest.into_targets();

        assert_eq!(targets.len(), 1);
        let target = &targets[0];
        assert_eq!(target.table_name, "timelines");
        assert_eq!(target.insertion_anchor.as_deref(), Some("title"));
        assert_eq!(target.required_columns.len(), 2);

        let topic = &target.required_columns[0];
        assert_eq!(topic.sql_type, "VARCHAR(300)");
        assert!(topic.nullable);
        assert_eq!(topic.comment.as_deref(), Some("topic covered this week"));

        let weeks = &target.required_columns[1];
        assert!(!weeks.nullable);
        assert_eq!(weeks.default.as_deref(), Some("0"));
    }

    #[test]
    fn test_nullable_defaults_to_true() {
        let manifest: Manifest = toml::from_str(
            r#"
            [[table]]
            name = "courses"

            [[table.column]]
            name = "credits"
            type = "INTEGER"
            "#,
        )
        .unwrap();

        assert!(manifest.tables[0].columns[0].nullable);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = load(Utf8Path::new("/definitely/not/here/grout.toml")).unwrap_err();
        assert!(matches!(err, ManifestError::Io(_)));
    }

    #[test]
    fn test_bad_toml_is_parse_error() {
        let err = toml::from_str::<Manifest>("[[table]]\nno_name = true")
            .map(|_| ())
            .unwrap_err();
        assert!(err.to_string().contains("name"));
    }
}
