//! Type tables for the SQL dialects.
//!
//! MySQL, PostgreSQL and SQLite share one table; the handful of places where
//! they disagree are matched on the dialect.

use super::{HostType, Mapped, RewriteKind, TypeMapper};
use crate::ast::NativeType;
use crate::dialect::Dialect;

#[derive(Debug, Clone, Copy, Default)]
pub struct MysqlMapper;

#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresMapper;

#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteMapper;

impl TypeMapper for MysqlMapper {
    fn dialect(&self) -> Dialect {
        Dialect::MySql
    }

    fn map(&self, _column: &str, native: &NativeType) -> Option<Mapped> {
        map_sql(Dialect::MySql, native)
    }
}

impl TypeMapper for PostgresMapper {
    fn dialect(&self) -> Dialect {
        Dialect::Postgres
    }

    fn map(&self, _column: &str, native: &NativeType) -> Option<Mapped> {
        let key = native.key();
        // Catalog spelling of arrays: `_int4`.
        if native.array || key.starts_with('_') {
            let element = NativeType {
                name: key.trim_start_matches('_').to_string(),
                array: false,
                ..native.clone()
            };
            let inner = map_sql(Dialect::Postgres, &element)?;
            return Some(Mapped::plain(HostType::Slice(Box::new(inner.host))));
        }
        map_sql(Dialect::Postgres, native)
    }
}

impl TypeMapper for SqliteMapper {
    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    fn map(&self, _column: &str, native: &NativeType) -> Option<Mapped> {
        map_sql(Dialect::Sqlite, native)
    }
}

fn map_sql(dialect: Dialect, native: &NativeType) -> Option<Mapped> {
    if native.array {
        return None;
    }
    let key = native.key();
    let signed = |s: HostType, u: HostType| Mapped::plain(if native.unsigned { u } else { s });

    let mapped = match key.as_str() {
        "tinyint" if native.length == Some(1) && dialect == Dialect::MySql => {
            Mapped::rewritten(HostType::Bool, RewriteKind::Bool)
        }
        "tinyint" => signed(HostType::Int8, HostType::UInt8),
        "bool" | "boolean" if dialect == Dialect::MySql => {
            Mapped::rewritten(HostType::Bool, RewriteKind::Bool)
        }
        "bool" | "boolean" => Mapped::plain(HostType::Bool),
        "bit" if native.length.unwrap_or(1) == 1 => {
            Mapped::rewritten(HostType::Bool, RewriteKind::Bool)
        }
        "bit" => Mapped::plain(HostType::Bytes),
        "bit varying" | "varbit" => Mapped::plain(HostType::String),

        "smallint" | "int2" | "smallserial" | "serial2" | "year" => {
            signed(HostType::Int16, HostType::UInt16)
        }
        "int" | "integer" if dialect == Dialect::Sqlite => Mapped::plain(HostType::Int64),
        "mediumint" | "int" | "integer" | "int4" | "serial" | "serial4" => {
            signed(HostType::Int32, HostType::UInt32)
        }
        "bigint" | "int8" | "bigserial" | "serial8" => signed(HostType::Int64, HostType::UInt64),
        "unsigned big int" => Mapped::plain(HostType::UInt64),

        "float4" => Mapped::plain(HostType::Float32),
        "float" if dialect == Dialect::MySql => Mapped::plain(HostType::Float32),
        "real" if dialect == Dialect::Postgres => Mapped::plain(HostType::Float32),
        "float" | "real" | "double" | "double precision" | "float8" => {
            Mapped::plain(HostType::Float64)
        }
        "decimal" | "dec" | "fixed" | "numeric" | "money" => {
            Mapped::rewritten(HostType::String, RewriteKind::Decimal)
        }

        "char" | "varchar" | "character" | "character varying" | "nchar" | "nvarchar"
        | "varchar2" | "bpchar" | "text" | "tinytext" | "mediumtext" | "longtext" | "clob"
        | "enum" | "set" | "uuid" | "citext" | "inet" | "cidr" | "macaddr" | "macaddr8"
        | "interval" | "xml" | "name" | "tsvector" | "national char" | "national varchar"
        | "national character" | "national character varying" => Mapped::plain(HostType::String),

        "binary" | "varbinary" | "blob" | "tinyblob" | "mediumblob" | "longblob" | "bytea" => {
            Mapped::plain(HostType::Bytes)
        }

        "date" | "datetime" | "timestamp" | "timestamptz" | "time" | "timetz"
        | "timestamp with time zone" | "timestamp without time zone"
        | "time with time zone" | "time without time zone" => Mapped::plain(HostType::Time),

        "json" | "jsonb" => Mapped::rewritten(HostType::String, RewriteKind::Json),

        _ if dialect == Dialect::Sqlite => sqlite_affinity(&key),
        _ => return None,
    };
    Some(mapped)
}

/// SQLite accepts any declared type and derives a column affinity from it.
/// A column with no declared type has BLOB affinity.
fn sqlite_affinity(key: &str) -> Mapped {
    let has = |parts: &[&str]| parts.iter().any(|p| key.contains(p));
    if has(&["int"]) {
        Mapped::plain(HostType::Int64)
    } else if has(&["char", "clob", "text"]) {
        Mapped::plain(HostType::String)
    } else if key.is_empty() || has(&["blob"]) {
        Mapped::plain(HostType::Bytes)
    } else if has(&["real", "floa", "doub"]) {
        Mapped::plain(HostType::Float64)
    } else {
        Mapped::rewritten(HostType::String, RewriteKind::Decimal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ty(name: &str) -> NativeType {
        NativeType::named(name)
    }

    fn host(mapper: &dyn TypeMapper, native: NativeType) -> Option<HostType> {
        mapper.map("c", &native).map(|m| m.host)
    }

    #[test]
    fn test_mysql_integers() {
        let m = &MysqlMapper;
        assert_eq!(host(m, ty("BIGINT").unsigned()), Some(HostType::UInt64));
        assert_eq!(host(m, ty("int").with_length(11)), Some(HostType::Int32));
        assert_eq!(host(m, ty("smallint")), Some(HostType::Int16));
        assert_eq!(host(m, ty("tinyint").with_length(4)), Some(HostType::Int8));
        assert_eq!(host(m, ty("year")), Some(HostType::Int16));
    }

    #[test]
    fn test_mysql_flag_types_rewrite_to_bool() {
        for native in [ty("tinyint").with_length(1), ty("bit").with_length(1), ty("boolean")] {
            let mapped = MysqlMapper.map("c", &native).unwrap();
            assert_eq!(mapped, Mapped::rewritten(HostType::Bool, RewriteKind::Bool));
        }
        assert_eq!(host(&MysqlMapper, ty("bit").with_length(8)), Some(HostType::Bytes));
    }

    #[test]
    fn test_decimal_and_json_rewrites() {
        let decimal = NativeType {
            name: "decimal".into(),
            length: Some(10),
            scale: Some(2),
            ..NativeType::default()
        };
        let mapped = MysqlMapper.map("price", &decimal).unwrap();
        assert_eq!(mapped.rewrite, Some(RewriteKind::Decimal));
        assert_eq!(mapped.host, HostType::String);

        let json = PostgresMapper.map("meta", &ty("jsonb")).unwrap();
        assert_eq!(json.rewrite, Some(RewriteKind::Json));
    }

    #[test]
    fn test_postgres_specifics() {
        let m = &PostgresMapper;
        assert_eq!(host(m, ty("boolean")), Some(HostType::Bool));
        assert_eq!(m.map("b", &ty("boolean")).unwrap().rewrite, None);
        assert_eq!(host(m, ty("real")), Some(HostType::Float32));
        assert_eq!(host(m, ty("double precision")), Some(HostType::Float64));
        assert_eq!(host(m, ty("uuid")), Some(HostType::String));
        assert_eq!(host(m, ty("timestamp with time zone")), Some(HostType::Time));
        assert_eq!(host(m, ty("bigserial")), Some(HostType::Int64));
    }

    #[test]
    fn test_postgres_arrays() {
        let m = &PostgresMapper;
        let mut tags = ty("text");
        tags.array = true;
        assert_eq!(host(m, tags), Some(HostType::Slice(Box::new(HostType::String))));
        assert_eq!(host(m, ty("_int4")), Some(HostType::Slice(Box::new(HostType::Int32))));
        // Arrays are PostgreSQL only.
        let mut ints = ty("int");
        ints.array = true;
        assert_eq!(host(&MysqlMapper, ints), None);
    }

    #[test]
    fn test_sqlite_specifics() {
        let m = &SqliteMapper;
        assert_eq!(host(m, ty("INTEGER")), Some(HostType::Int64));
        assert_eq!(host(m, ty("real")), Some(HostType::Float64));
        assert_eq!(host(m, ty("blob")), Some(HostType::Bytes));
        assert_eq!(m.map("b", &ty("boolean")).unwrap().rewrite, None);
    }

    #[test]
    fn test_sqlite_affinity_fallback() {
        let m = &SqliteMapper;
        assert_eq!(host(m, ty("")), Some(HostType::Bytes));
        assert_eq!(host(m, ty("unsigned medium int")), Some(HostType::Int64));
        assert_eq!(host(m, ty("varying character")), Some(HostType::String));
        assert_eq!(host(m, ty("real number")), Some(HostType::Float64));
        // "point" contains "int".
        assert_eq!(host(m, ty("floating point")), Some(HostType::Int64));
        let numeric = m.map("g", &ty("geometry")).unwrap();
        assert_eq!(numeric.rewrite, Some(RewriteKind::Decimal));
    }

    #[test]
    fn test_national_character_types() {
        for name in ["national char", "national varchar", "national character varying"] {
            assert_eq!(host(&MysqlMapper, ty(name)), Some(HostType::String), "{name}");
        }
    }

    #[test]
    fn test_unknown_type() {
        assert_eq!(MysqlMapper.map("g", &ty("geometry")), None);
        assert_eq!(PostgresMapper.map("g", &ty("tsrange")), None);
    }
}
