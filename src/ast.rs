//! Parsed DDL statements.

use std::fmt;

use serde::Serialize;

/// A parsed `CREATE TABLE` statement.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateTable {
    pub name: String,
    pub columns: Vec<ColumnDef>,
    pub constraints: Vec<TableConstraint>,
    pub comment: Option<String>,
}

impl CreateTable {
    /// Look up a column by name (case-insensitive, as SQL does).
    pub fn column_mut(&mut self, name: &str) -> Option<&mut ColumnDef> {
        self.columns
            .iter_mut()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }

    /// Columns named by a table-level `PRIMARY KEY (...)`.
    pub fn primary_key_columns(&self) -> impl Iterator<Item = &str> {
        self.constraints.iter().flat_map(|c| match c {
            TableConstraint::PrimaryKey(cols) => cols.iter().map(String::as_str).collect(),
            _ => Vec::new(),
        })
    }

    /// Columns covered alone by a table-level `UNIQUE (...)`.
    pub fn unique_columns(&self) -> impl Iterator<Item = &str> {
        self.constraints.iter().filter_map(|c| match c {
            TableConstraint::Unique(cols) if cols.len() == 1 => Some(cols[0].as_str()),
            _ => None,
        })
    }
}

/// One column of a `CREATE TABLE`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnDef {
    pub name: String,
    pub native: NativeType,
    pub not_null: bool,
    pub default: Option<String>,
    pub primary_key: bool,
    pub unique: bool,
    pub auto_increment: bool,
    pub comment: Option<String>,
}

impl ColumnDef {
    pub fn new(name: impl Into<String>, native: NativeType) -> Self {
        Self {
            name: name.into(),
            native,
            not_null: false,
            default: None,
            primary_key: false,
            unique: false,
            auto_increment: false,
            comment: None,
        }
    }

    /// Whether the column may hold NULL.
    pub fn is_nullable(&self) -> bool {
        !self.not_null && !self.primary_key
    }
}

/// A native column type as written in the DDL.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NativeType {
    /// Type name as written, multi-word names joined by one space.
    pub name: String,
    pub length: Option<u32>,
    pub scale: Option<u32>,
    /// `ENUM('a','b')` / `SET(...)` members.
    pub values: Vec<String>,
    pub unsigned: bool,
    /// PostgreSQL `T[]`.
    pub array: bool,
}

impl NativeType {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_length(mut self, length: u32) -> Self {
        self.length = Some(length);
        self
    }

    pub fn unsigned(mut self) -> Self {
        self.unsigned = true;
        self
    }

    /// Lower-cased name used for dialect lookups.
    pub fn key(&self) -> String {
        self.name.to_ascii_lowercase()
    }

    /// Parse a standalone type string such as `varchar(64)` or `int4[]`.
    ///
    /// Strings the type grammar rejects are kept whole as the type name so the
    /// dialect mapper can report them.
    pub fn parse(text: &str) -> Self {
        crate::parser::parse_native_type(text).unwrap_or_else(|| Self::named(text.trim()))
    }

    /// Serial pseudo-types carry their own sequence.
    pub fn implies_auto_increment(&self) -> bool {
        matches!(
            self.key().as_str(),
            "serial" | "bigserial" | "smallserial" | "serial2" | "serial4" | "serial8"
        )
    }
}

impl fmt::Display for NativeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())?;
        if !self.values.is_empty() {
            let quoted: Vec<String> = self
                .values
                .iter()
                .map(|v| format!("'{}'", v.replace('\'', "''")))
                .collect();
            write!(f, "({})", quoted.join(","))?;
        } else if let Some(len) = self.length {
            match self.scale {
                Some(scale) => write!(f, "({len},{scale})")?,
                None => write!(f, "({len})")?,
            }
        }
        if self.unsigned {
            f.write_str(" unsigned")?;
        }
        if self.array {
            f.write_str("[]")?;
        }
        Ok(())
    }
}

/// Table-level constraints.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum TableConstraint {
    PrimaryKey(Vec<String>),
    Unique(Vec<String>),
    Index(Vec<String>),
    /// Foreign keys, checks, and anything else kept only for completeness.
    Other,
}
