#![deny(unsafe_code)]

use std::path::PathBuf;

use crate::classification::ClassificationOrigin;

/// Boxed driver error carried by SQL and connection failures.
pub type SourceError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Every failure that aborts a classification resolution run.
///
/// There is no degraded model: any variant surfaces to the invoking tool and
/// the run must be corrected and restarted.
#[derive(Debug, thiserror::Error)]
pub enum ClassificationError {
    #[error(
        "duplicate classification '{name}': already defined by {existing} definition, redefined by {duplicate} definition"
    )]
    DuplicateClassification {
        name: String,
        existing: ClassificationOrigin,
        duplicate: ClassificationOrigin,
    },

    #[error("duplicate code '{code}' in classification '{classification}'")]
    DuplicateElementCode {
        classification: String,
        code: String,
    },

    #[error("split definition '{file}' was not found or is empty")]
    MissingSplitFile { file: String },

    #[error("duplicate key '{key}' while merging split definitions of {name} ({location})")]
    SplitKeyCollision {
        name: String,
        key: String,
        location: String,
    },

    #[error(
        "unknown undefinedHandlingType '{code}' in classification '{classification}' (expected EXCEPTION, LOGGING or ALLOWED)"
    )]
    UnknownHandlingType {
        classification: String,
        code: String,
    },

    #[error("invalid definition at {path}: expected {expected}, found {found}")]
    InvalidShape {
        path: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("missing required key '{key}' at {path}")]
    MissingField { path: String, key: &'static str },

    #[error("failed to open a connection to the main schema: {source}")]
    Connection {
        #[source]
        source: SourceError,
    },

    #[error("failed to execute classification SQL: {source}\n{sql}")]
    Sql {
        sql: String,
        #[source]
        source: SourceError,
    },

    #[error(
        "grouping '{group}' of classification '{classification}' references unknown element '{element}'"
    )]
    UnknownGroupingElement {
        classification: String,
        group: String,
        element: String,
    },

    #[error("deprecated element '{element}' of classification '{classification}' does not exist")]
    UnknownDeprecatedElement {
        classification: String,
        element: String,
    },

    #[error("failed to read file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },
}

impl ClassificationError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn sql(sql: impl Into<String>, source: impl Into<SourceError>) -> Self {
        Self::Sql {
            sql: sql.into(),
            source: source.into(),
        }
    }

    pub fn shape(path: impl Into<String>, expected: &'static str, found: &'static str) -> Self {
        Self::InvalidShape {
            path: path.into(),
            expected,
            found,
        }
    }

    /// True for failures raised by the database rather than by the definitions.
    pub fn is_sql_failure(&self) -> bool {
        matches!(self, Self::Sql { .. } | Self::Connection { .. })
    }
}

pub type Result<T> = std::result::Result<T, ClassificationError>;
