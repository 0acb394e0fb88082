//! Storage dialects.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::mapper::TypeMapper;
use crate::mapper::document::DocumentMapper;
use crate::mapper::relational::{MysqlMapper, PostgresMapper, SqliteMapper};

/// Supported storage dialects.
///
/// The first three share one SQL grammar; `MongoDB` arrives as a synthetic DDL
/// statement whose column types are already host type spellings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    #[default]
    #[serde(alias = "mariadb")]
    MySql,
    #[serde(alias = "postgresql", alias = "pg")]
    Postgres,
    #[serde(alias = "sqlite3")]
    Sqlite,
    #[serde(alias = "mongo")]
    MongoDb,
}

impl Dialect {
    pub const ALL: [Dialect; 4] = [
        Dialect::MySql,
        Dialect::Postgres,
        Dialect::Sqlite,
        Dialect::MongoDb,
    ];

    /// The type mapper for this dialect.
    pub fn mapper(&self) -> &'static dyn TypeMapper {
        match self {
            Dialect::MySql => &MysqlMapper,
            Dialect::Postgres => &PostgresMapper,
            Dialect::Sqlite => &SqliteMapper,
            Dialect::MongoDb => &DocumentMapper,
        }
    }

    pub const fn is_document_store(&self) -> bool {
        matches!(self, Dialect::MongoDb)
    }

    /// Whether column types must come from `field_types` overrides because the
    /// DDL handed to us was synthesised from the catalog.
    pub const fn takes_type_overrides(&self) -> bool {
        matches!(self, Dialect::Postgres | Dialect::Sqlite)
    }

    pub const fn name(&self) -> &'static str {
        match self {
            Dialect::MySql => "mysql",
            Dialect::Postgres => "postgres",
            Dialect::Sqlite => "sqlite",
            Dialect::MongoDb => "mongodb",
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Dialect {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mysql" | "mariadb" | "tidb" => Ok(Dialect::MySql),
            "postgres" | "postgresql" | "pg" => Ok(Dialect::Postgres),
            "sqlite" | "sqlite3" => Ok(Dialect::Sqlite),
            "mongodb" | "mongo" => Ok(Dialect::MongoDb),
            other => Err(format!(
                "unknown db driver '{other}', expected mysql, postgres, sqlite or mongodb"
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_str_aliases() {
        assert_eq!("PostgreSQL".parse::<Dialect>(), Ok(Dialect::Postgres));
        assert_eq!("mongo".parse::<Dialect>(), Ok(Dialect::MongoDb));
        assert_eq!("tidb".parse::<Dialect>(), Ok(Dialect::MySql));
        assert!("oracle".parse::<Dialect>().is_err());
    }

    #[test]
    fn test_mapper_matches_dialect() {
        for dialect in Dialect::ALL {
            assert_eq!(dialect.mapper().dialect(), dialect);
        }
    }
}
