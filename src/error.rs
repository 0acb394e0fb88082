//! Error types for ddlgen.

use thiserror::Error;

use crate::dialect::Dialect;
use crate::emit::ArtifactKind;

/// The main error type for generation.
///
/// Every variant is fatal for the table being processed. A multi-table run decides
/// for itself whether to continue with the next table.
#[derive(Debug, Error)]
pub enum GenError {
    /// The DDL statement could not be parsed.
    #[error("Parse error at position {position}: {message}\n  in: {statement}")]
    Parse {
        position: usize,
        message: String,
        statement: String,
    },

    /// A column's native type has no mapping under the active dialect.
    #[error("Unknown type '{native}' for column '{column}' ({dialect})")]
    UnknownType {
        column: String,
        native: String,
        dialect: Dialect,
    },

    /// The table declares no columns.
    #[error("Table '{0}' has no columns")]
    NoColumns(String),

    /// An emitter could not render a field.
    #[error("Render error in {emitter} emitter, field '{field}': {message}")]
    Render {
        emitter: ArtifactKind,
        field: String,
        message: String,
    },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl GenError {
    /// Create a parse error at the given position of `statement`.
    pub fn parse(position: usize, message: impl Into<String>, statement: &str) -> Self {
        Self::Parse {
            position,
            message: message.into(),
            statement: abbreviate(statement, 120),
        }
    }

    /// Create a render error for `field` in the given emitter.
    pub fn render(emitter: ArtifactKind, field: &str, message: impl Into<String>) -> Self {
        Self::Render {
            emitter,
            field: field.to_string(),
            message: message.into(),
        }
    }
}

/// Result type alias for generation.
pub type GenResult<T> = Result<T, GenError>;

fn abbreviate(s: &str, max: usize) -> String {
    let flat: String = s.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max {
        return flat;
    }
    let head: String = flat.chars().take(max).collect();
    format!("{head}…")
}
