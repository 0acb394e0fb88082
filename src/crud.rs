//! Primary identifier resolution.
//!
//! Picks the column that identifies a row and decides which template family
//! the emitters use:
//!
//! * standard: operations `...ByID`, key `id`. Document stores and tables
//!   embedding the standard block always land here.
//! * custom: operations `...By<Column>`, key named after the column.

use serde::Serialize;
use tracing::debug;

use crate::mapper::{HostType, WireType};
use crate::model::{Field, TableModel};
use crate::naming::Naming;

/// Column name of the standard identifier.
pub const STANDARD_ID: &str = "id";

/// The identifying key as the templates spell it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyInfo {
    /// `ID` or `UserCode`.
    pub word: String,
    pub lower: String,
    pub word_plural: String,
    pub lower_plural: String,
    /// Storage column.
    pub column: String,
    pub host: HostType,
    pub wire: WireType,
    /// Go type in requests.
    pub go_type: String,
    /// Index into the table's fields. `None` for the synthetic embedded id.
    pub field_index: Option<usize>,
}

impl Default for KeyInfo {
    fn default() -> Self {
        standard_key(HostType::UInt64, STANDARD_ID, None)
    }
}

impl KeyInfo {
    pub fn is_string(&self) -> bool {
        self.wire.is_string()
    }

    /// `protoc-gen-validate` rule for the key field.
    pub fn validation_rule(&self, web: bool) -> String {
        let rule = if self.is_string() {
            "(validate.rules).string.min_len = 1".to_string()
        } else {
            format!("(validate.rules).{}.gt = 0", self.wire.scalar_name())
        };
        if web {
            format!("{rule}, (tagger.tags) = \"uri:\\\"{}\\\"\"", self.lower)
        } else {
            rule
        }
    }
}

/// Identifier summary handed to templates and to outer tooling.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CrudInfo {
    pub table_name: String,
    pub table_name_word: String,
    pub table_name_lower: String,
    pub table_name_plural: String,
    pub table_name_lower_plural: String,

    /// The chosen column, as written.
    pub column_name: String,
    pub column_name_word: String,
    pub column_name_lower: String,
    pub column_name_plural: String,
    pub column_name_lower_plural: String,

    pub go_type: String,
    /// `go_type` with the first character upper-cased (`Uint64`, `String`).
    pub go_type_fcu: String,
    pub wire_type: String,
    pub is_string_type: bool,
    pub primary_key_column_name: String,

    pub is_standard_identifier: bool,
    /// Custom template family.
    pub is_common_type: bool,

    pub key: KeyInfo,
}

/// Index of the identifying field. `None` only for an empty list.
///
/// First match wins:
/// 1. a declared primary key
/// 2. a `..._id` column of integer or string type
/// 3. any column of integer or string type
/// 4. the first column
pub fn pick_primary(fields: &[Field]) -> Option<usize> {
    let compatible =
        |f: &Field| f.host_type.is_identifier_compatible() && f.rewrite.is_none();

    fields
        .iter()
        .position(|f| f.is_primary_key)
        .or_else(|| {
            fields
                .iter()
                .position(|f| f.name.ends_with("ID") && compatible(f))
        })
        .or_else(|| fields.iter().position(compatible))
        .or(if fields.is_empty() { None } else { Some(0) })
}

/// Resolve the identifier for a built table.
pub fn resolve(table: &TableModel, embed: bool, naming: &Naming) -> Option<CrudInfo> {
    let fields = &table.fields;
    let index = pick_primary(fields)?;
    let chosen = &fields[index];

    let is_standard_identifier = chosen.raw_name == STANDARD_ID && chosen.host_type.is_integer();
    let is_document = table.dialect.is_document_store();
    let is_common_type = !is_standard_identifier && !is_document && !embed;

    let key = if is_common_type {
        custom_key(chosen, index, naming)
    } else if is_document {
        standard_key(chosen.host_type.clone(), &chosen.raw_name, Some(index))
    } else if embed {
        // The embedded block owns the key, whatever the table declares.
        standard_key(HostType::UInt64, STANDARD_ID, None)
    } else {
        standard_key(chosen.host_type.clone(), STANDARD_ID, Some(index))
    };

    debug!(
        table = %table.raw_name,
        column = %chosen.raw_name,
        key = %key.word,
        family = if is_common_type { "custom" } else { "standard" },
        "resolved identifier"
    );

    Some(CrudInfo {
        table_name: table.raw_name.clone(),
        table_name_word: table.name.clone(),
        table_name_lower: table.lower_name.clone(),
        table_name_plural: table.plural_name.clone(),
        table_name_lower_plural: table.lower_plural_name.clone(),

        column_name: chosen.raw_name.clone(),
        column_name_word: chosen.name.clone(),
        column_name_lower: chosen.lower_camel.clone(),
        column_name_plural: naming.word_case_plural(&chosen.name),
        column_name_lower_plural: naming.lower_camel_plural(&chosen.name),

        go_type: key.go_type.clone(),
        go_type_fcu: first_char_upper(&key.go_type),
        wire_type: key.wire.scalar_name().to_string(),
        is_string_type: key.is_string(),
        primary_key_column_name: key.column.clone(),

        is_standard_identifier,
        is_common_type,
        key,
    })
}

fn standard_key(host: HostType, column: &str, field_index: Option<usize>) -> KeyInfo {
    let (go_type, wire) = key_types(&host);
    KeyInfo {
        word: "ID".to_string(),
        lower: "id".to_string(),
        word_plural: "IDs".to_string(),
        lower_plural: "ids".to_string(),
        column: column.to_string(),
        host,
        wire,
        go_type,
        field_index,
    }
}

fn custom_key(field: &Field, index: usize, naming: &Naming) -> KeyInfo {
    let (go_type, wire) = key_types(&field.host_type);
    KeyInfo {
        word: field.name.clone(),
        lower: field.lower_camel.clone(),
        word_plural: naming.word_case_plural(&field.name),
        lower_plural: naming.lower_camel_plural(&field.name),
        column: field.raw_name.clone(),
        host: field.host_type.clone(),
        wire,
        go_type,
        field_index: Some(index),
    }
}

/// Integers keep their width; every other key travels as a string.
fn key_types(host: &HostType) -> (String, WireType) {
    match host.wire_type() {
        Some(wire) if host.is_integer() => (host.go_name(), wire),
        _ => ("string".to_string(), WireType::String),
    }
}

fn first_char_upper(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GenConfig;
    use crate::dialect::Dialect;
    use crate::parser::parse_create_table;
    use pretty_assertions::assert_eq;

    fn model(sql: &str, config: &GenConfig) -> TableModel {
        TableModel::build(&parse_create_table(sql).unwrap(), config, Naming::shared()).unwrap()
    }

    fn chosen(sql: &str) -> String {
        model(sql, &GenConfig::default()).crud.column_name
    }

    #[test]
    fn test_resolution_order() {
        assert_eq!(
            chosen("CREATE TABLE t (a TEXT, b INT PRIMARY KEY, owner_id BIGINT)"),
            "b"
        );
        assert_eq!(chosen("CREATE TABLE t (a TEXT, b INT, owner_id BIGINT)"), "owner_id");
        assert_eq!(chosen("CREATE TABLE t (at DATETIME, b INT, c TEXT)"), "b");
        assert_eq!(chosen("CREATE TABLE t (at DATETIME, price DECIMAL(8,2))"), "at");
    }

    #[test]
    fn test_suffix_rule_skips_incompatible_types() {
        assert_eq!(
            chosen("CREATE TABLE t (note TEXT, geo_id DATETIME, ref_id VARCHAR(20))"),
            "ref_id"
        );
    }

    #[test]
    fn test_standard_identifier() {
        let crud = model(
            "CREATE TABLE user (id BIGINT UNSIGNED PRIMARY KEY, name TEXT)",
            &GenConfig::default(),
        )
        .crud;
        assert!(crud.is_standard_identifier);
        assert!(!crud.is_common_type);
        assert_eq!(crud.key.word, "ID");
        assert_eq!(crud.go_type, "uint64");
        assert_eq!(crud.go_type_fcu, "Uint64");
        assert_eq!(crud.wire_type, "uint64");
        assert_eq!(crud.key.validation_rule(false), "(validate.rules).uint64.gt = 0");
    }

    #[test]
    fn test_custom_identifier() {
        let crud = model(
            "CREATE TABLE coupon (coupon_code VARCHAR(16) PRIMARY KEY, amount INT)",
            &GenConfig::default(),
        )
        .crud;
        assert!(!crud.is_standard_identifier);
        assert!(crud.is_common_type);
        assert_eq!(crud.key.word, "CouponCode");
        assert_eq!(crud.key.lower, "couponCode");
        assert_eq!(crud.key.word_plural, "CouponCodes");
        assert_eq!(crud.key.lower_plural, "couponCodes");
        assert!(crud.is_string_type);
        assert_eq!(
            crud.key.validation_rule(true),
            r#"(validate.rules).string.min_len = 1, (tagger.tags) = "uri:\"couponCode\"""#
        );
    }

    #[test]
    fn test_embed_forces_standard_family() {
        let config = GenConfig::builder().embed_standard_fields(true).build();
        let crud = model(
            "CREATE TABLE coupon (coupon_code VARCHAR(16) PRIMARY KEY, amount INT)",
            &config,
        )
        .crud;
        assert!(!crud.is_common_type);
        assert_eq!(crud.column_name, "coupon_code");
        assert_eq!(crud.key.word, "ID");
        assert_eq!(crud.key.host, HostType::UInt64);
        assert_eq!(crud.key.field_index, None);
    }

    #[test]
    fn test_embed_key_ignores_column_type() {
        let config = GenConfig::builder().embed_standard_fields(true).build();
        let crud = model(
            "CREATE TABLE users (id BIGINT PRIMARY KEY, name TEXT, created_at DATETIME)",
            &config,
        )
        .crud;
        assert!(crud.is_standard_identifier);
        assert_eq!(crud.key.host, HostType::UInt64);
        assert_eq!(crud.key.field_index, None);
        assert_eq!(crud.go_type, "uint64");
        assert_eq!(crud.wire_type, "uint64");
    }

    #[test]
    fn test_document_store_uses_object_id() {
        let config = GenConfig::builder().dialect(Dialect::MongoDb).build();
        let crud = model("CREATE TABLE user (_id primitive.ObjectID, name string)", &config).crud;
        assert!(!crud.is_common_type);
        assert!(!crud.is_standard_identifier);
        assert_eq!(crud.key.host, HostType::ObjectId);
        assert_eq!(crud.key.column, "_id");
        assert_eq!(crud.go_type, "string");
        assert!(crud.is_string_type);
    }

    #[test]
    fn test_crud_info_serializes_camel_case() {
        let crud = model("CREATE TABLE users (id INT PRIMARY KEY)", &GenConfig::default()).crud;
        let json = serde_json::to_value(&crud).unwrap();
        assert_eq!(json["isStandardIdentifier"], true);
        assert_eq!(json["tableNameWord"], "Users");
        assert_eq!(json["key"]["wordPlural"], "IDs");
    }
}
