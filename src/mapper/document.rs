//! Document-store "types".
//!
//! The synthetic DDL for a collection already carries Go spellings
//! (`string`, `[]int64`, `map[string]interface{}`, `*Address`). This mapper
//! reads them back into host types. `_id` is always an object id.

use super::{HostType, Mapped, TypeMapper};
use crate::ast::NativeType;
use crate::dialect::Dialect;

pub const ID_COLUMN: &str = "_id";

#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentMapper;

impl TypeMapper for DocumentMapper {
    fn dialect(&self) -> Dialect {
        Dialect::MongoDb
    }

    fn map(&self, column: &str, native: &NativeType) -> Option<Mapped> {
        if column == ID_COLUMN {
            return Some(Mapped::plain(HostType::ObjectId));
        }
        let host = parse_go_type(&native.name)?;
        Some(Mapped::plain(if native.array {
            HostType::Slice(Box::new(host))
        } else {
            host
        }))
    }
}

fn parse_go_type(spelling: &str) -> Option<HostType> {
    let s = spelling.trim();
    if s == "[]byte" || s == "[]uint8" {
        return Some(HostType::Bytes);
    }
    if let Some(element) = s.strip_prefix("[]") {
        return parse_go_type(element).map(|inner| HostType::Slice(Box::new(inner)));
    }
    if s.starts_with("map[") || matches!(s, "bson.M" | "bson.D" | "interface{}" | "any") {
        return Some(HostType::Object(s.to_string()));
    }

    let host = match s.to_ascii_lowercase().as_str() {
        "string" => HostType::String,
        "int" | "int64" | "long" => HostType::Int64,
        "int32" => HostType::Int32,
        "int16" => HostType::Int16,
        "int8" => HostType::Int8,
        "uint" | "uint64" => HostType::UInt64,
        "uint32" => HostType::UInt32,
        "uint16" => HostType::UInt16,
        "uint8" => HostType::UInt8,
        "float64" | "double" => HostType::Float64,
        "float32" => HostType::Float32,
        "bool" | "boolean" => HostType::Bool,
        "time.time" | "*time.time" | "date" => HostType::Time,
        "primitive.objectid" | "objectid" => HostType::ObjectId,
        _ => {
            let name = s.trim_start_matches('*');
            let is_struct = name.chars().next().is_some_and(char::is_uppercase)
                && name.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '.');
            if !is_struct {
                return None;
            }
            HostType::Object(name.to_string())
        }
    };
    Some(host)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(column: &str, spelling: &str) -> Option<HostType> {
        DocumentMapper
            .map(column, &NativeType::named(spelling))
            .map(|m| m.host)
    }

    #[test]
    fn test_id_is_always_object_id() {
        assert_eq!(map("_id", "string"), Some(HostType::ObjectId));
        assert_eq!(map("_id", "anything"), Some(HostType::ObjectId));
    }

    #[test]
    fn test_scalars() {
        assert_eq!(map("name", "string"), Some(HostType::String));
        assert_eq!(map("age", "int"), Some(HostType::Int64));
        assert_eq!(map("score", "float64"), Some(HostType::Float64));
        assert_eq!(map("at", "time.Time"), Some(HostType::Time));
        assert_eq!(map("owner", "primitive.ObjectID"), Some(HostType::ObjectId));
    }

    #[test]
    fn test_collections_and_objects() {
        assert_eq!(map("raw", "[]byte"), Some(HostType::Bytes));
        assert_eq!(
            map("tags", "[]string"),
            Some(HostType::Slice(Box::new(HostType::String)))
        );
        assert_eq!(
            map("grid", "[][]int"),
            Some(HostType::Slice(Box::new(HostType::Slice(Box::new(
                HostType::Int64
            )))))
        );
        assert_eq!(
            map("extra", "map[string]interface{}"),
            Some(HostType::Object("map[string]interface{}".into()))
        );
        assert_eq!(map("addr", "*Address"), Some(HostType::Object("Address".into())));
    }

    #[test]
    fn test_unknown() {
        assert_eq!(map("x", "chan int"), None);
        assert_eq!(map("x", "complex128"), None);
    }
}
