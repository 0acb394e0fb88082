//! The canonical field model every emitter reads.

use serde::Serialize;
use tracing::debug;

use crate::ast::{ColumnDef, CreateTable, NativeType};
use crate::config::{GenConfig, NamingConvention, NullPolicy};
use crate::crud::{self, CrudInfo};
use crate::dialect::Dialect;
use crate::error::{GenError, GenResult};
use crate::mapper::document::ID_COLUMN;
use crate::mapper::{
    HostType, NullForm, RewriteKind, SQL_MODULE, TypeRewrite, ValueShape, WireType,
};
use crate::naming::Naming;

/// Columns the embedded standard block provides.
pub const STANDARD_FIELDS: [&str; 4] = ["id", "created_at", "updated_at", "deleted_at"];

/// One column, normalised.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    /// Storage name as written in the DDL.
    pub raw_name: String,
    /// Word case, e.g. `UserID`.
    pub name: String,
    pub lower_camel: String,
    pub json_name: String,
    pub host_type: HostType,
    pub null_form: NullForm,
    pub rewrite: Option<TypeRewrite>,
    /// Native type for the storage tag, e.g. `varchar(64)`.
    pub storage_type: String,
    pub is_primary_key: bool,
    pub is_unique: bool,
    pub not_null: bool,
    pub auto_increment: bool,
    pub default: Option<String>,
    pub comment: String,
    pub dialect: Dialect,
}

impl Field {
    /// Go type of the entity field.
    pub fn go_type(&self) -> String {
        if let Some(rewrite) = &self.rewrite {
            return rewrite.type_name.clone();
        }
        match self.null_form {
            NullForm::Wrapper(wrapper) => wrapper.go_name().to_string(),
            NullForm::Pointer => format!("*{}", self.host_type.go_name()),
            NullForm::Plain => match &self.host_type {
                HostType::Time => "*time.Time".to_string(),
                host if host.is_struct_object() => format!("*{}", host.go_name()),
                host => host.go_name(),
            },
        }
    }

    /// Go type in request/response shapes. Value objects travel as their
    /// backing primitive and object ids as hex strings.
    pub fn dto_go_type(&self) -> String {
        match &self.rewrite {
            Some(rewrite) if rewrite.is_text_backed() => return "string".to_string(),
            Some(_) => return "bool".to_string(),
            None => {}
        }
        match &self.host_type {
            HostType::Time => "*time.Time".to_string(),
            HostType::ObjectId => "string".to_string(),
            host if host.is_struct_object() => format!("*{}", host.go_name()),
            host => host.go_name(),
        }
    }

    pub fn shape(&self) -> ValueShape {
        if let Some(rewrite) = &self.rewrite {
            return match rewrite.kind {
                RewriteKind::Decimal | RewriteKind::Json => ValueShape::Text,
                RewriteKind::Bool => ValueShape::Flag,
            };
        }
        match self.null_form {
            NullForm::Wrapper(wrapper) => return ValueShape::Wrapper(wrapper),
            NullForm::Pointer => return ValueShape::Pointer,
            NullForm::Plain => {}
        }
        match &self.host_type {
            HostType::String => ValueShape::Text,
            HostType::Bool => ValueShape::Flag,
            HostType::Bytes => ValueShape::Bytes,
            HostType::Slice(_) => ValueShape::Slice,
            HostType::Time => ValueShape::TimePtr,
            HostType::ObjectId => ValueShape::ObjectId,
            HostType::Object(_) => ValueShape::Nilable,
            _ => ValueShape::Numeric,
        }
    }

    pub fn zero_literal(&self) -> String {
        self.shape().zero_literal()
    }

    /// Go condition that holds when `access` is not the zero value.
    pub fn non_zero(&self, access: &str) -> String {
        self.shape().non_zero(access)
    }

    /// Message wire type. `None` when protobuf cannot express the field.
    pub fn wire_type(&self) -> Option<WireType> {
        match &self.rewrite {
            Some(rewrite) if rewrite.is_text_backed() => Some(WireType::String),
            _ => self.host_type.wire_type(),
        }
    }

    /// Import paths the entity field type needs.
    pub fn imports(&self) -> Vec<String> {
        if let Some(rewrite) = &self.rewrite {
            return vec![rewrite.module.clone()];
        }
        let mut imports = Vec::new();
        if matches!(self.null_form, NullForm::Wrapper(_)) {
            imports.push(SQL_MODULE.to_string());
        } else if let Some(module) = self.host_type.module() {
            imports.push(module.to_string());
        }
        imports
    }

    pub fn is_standard_field(&self) -> bool {
        STANDARD_FIELDS.contains(&self.raw_name.as_str())
    }
}

/// A table, normalised.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableModel {
    pub raw_name: String,
    /// Word case of the prefix-stripped name.
    pub name: String,
    pub lower_name: String,
    pub snake_name: String,
    pub plural_name: String,
    pub lower_plural_name: String,
    pub fields: Vec<Field>,
    /// Comment with continuation lines already prefixed by `// `.
    pub comment: String,
    /// Whether the entity must spell out its storage name.
    pub needs_table_name: bool,
    pub dialect: Dialect,
    pub crud: CrudInfo,
}

impl TableModel {
    /// Build the model for one parsed table.
    pub fn build(table: &CreateTable, config: &GenConfig, naming: &Naming) -> GenResult<Self> {
        if table.columns.is_empty() {
            return Err(GenError::NoColumns(table.name.clone()));
        }
        let dialect = config.db_driver;

        let stripped = strip_prefix(&table.name, &config.table_prefix);
        let name = naming.word_case(stripped);
        let gorm_default = naming.snake(&naming.plural(&name));
        let needs_table_name = config.force_table_name
            || stripped.len() != table.name.len()
            || table.name != gorm_default;

        let fields = table
            .columns
            .iter()
            .map(|column| build_field(column, config, naming))
            .collect::<GenResult<Vec<_>>>()?;

        let mut model = TableModel {
            raw_name: table.name.clone(),
            lower_name: naming.lower_camel(stripped),
            snake_name: naming.snake(stripped),
            plural_name: naming.word_case_plural(stripped),
            lower_plural_name: naming.lower_camel_plural(stripped),
            name,
            fields,
            comment: table
                .comment
                .as_deref()
                .map(|c| c.trim().replace("\r\n", "\n").replace('\n', "\n// "))
                .unwrap_or_default(),
            needs_table_name,
            dialect,
            crud: CrudInfo::default(),
        };
        model.crud = crud::resolve(&model, config.embed_standard_fields, naming)
            .ok_or_else(|| GenError::NoColumns(table.name.clone()))?;

        debug!(
            table = %model.raw_name,
            fields = model.fields.len(),
            key = %model.crud.column_name,
            standard = model.crud.is_standard_identifier,
            "built table model"
        );
        Ok(model)
    }

    pub fn field(&self, raw_name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.raw_name == raw_name)
    }

    /// The identifying field, if it is a real column.
    pub fn key_field(&self) -> Option<&Field> {
        self.crud.key.field_index.and_then(|i| self.fields.get(i))
    }
}

fn build_field(column: &ColumnDef, config: &GenConfig, naming: &Naming) -> GenResult<Field> {
    let dialect = config.db_driver;
    let raw = column.name.as_str();
    let stripped = strip_prefix(raw, &config.column_prefix);

    let native = match config.field_type(raw) {
        Some(text) if dialect.takes_type_overrides() => NativeType::parse(text),
        _ => column.native.clone(),
    };
    let mapped = dialect
        .mapper()
        .map(raw, &native)
        .ok_or_else(|| GenError::UnknownType {
            column: raw.to_string(),
            native: native.to_string(),
            dialect,
        })?;

    let is_primary_key =
        column.primary_key || (dialect.is_document_store() && raw == ID_COLUMN);
    let auto_increment = column.auto_increment
        || (dialect == Dialect::Sqlite && is_primary_key && native.key() == "integer");
    let rewrite = mapped.rewrite.map(|kind| config.rewrite.resolve(kind));

    let nullable = column.is_nullable() && !is_primary_key && rewrite.is_none();
    let null_form = if !nullable {
        NullForm::Plain
    } else {
        match config.null_policy {
            NullPolicy::Disabled => NullForm::Plain,
            NullPolicy::Wrapper if dialect.is_document_store() => NullForm::Plain,
            NullPolicy::Wrapper => mapped
                .host
                .null_wrapper()
                .map(NullForm::Wrapper)
                .unwrap_or(NullForm::Plain),
            NullPolicy::Pointer if mapped.host.is_nilable() => NullForm::Plain,
            NullPolicy::Pointer => NullForm::Pointer,
        }
    };

    let json_name = if dialect.is_document_store() {
        raw.trim_start_matches('_').to_string()
    } else {
        match config.naming_convention() {
            NamingConvention::Snake => naming.snake(stripped),
            NamingConvention::Camel => naming.lower_camel(stripped),
        }
    };

    Ok(Field {
        raw_name: raw.to_string(),
        name: naming.word_case(stripped),
        lower_camel: naming.lower_camel(stripped),
        json_name,
        host_type: mapped.host,
        null_form,
        rewrite,
        storage_type: native.to_string(),
        is_primary_key,
        is_unique: column.unique,
        not_null: column.not_null,
        auto_increment,
        default: column.default.clone(),
        comment: column
            .comment
            .as_deref()
            .map(|c| c.split_whitespace().collect::<Vec<_>>().join(" "))
            .unwrap_or_default(),
        dialect,
    })
}

fn strip_prefix<'a>(name: &'a str, prefix: &str) -> &'a str {
    if prefix.is_empty() {
        return name;
    }
    match name.strip_prefix(prefix) {
        Some(rest) if !rest.is_empty() => rest,
        _ => name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_create_table;
    use pretty_assertions::assert_eq;

    fn build(sql: &str, config: &GenConfig) -> GenResult<TableModel> {
        TableModel::build(&parse_create_table(sql)?, config, Naming::shared())
    }

    const USER: &str = "CREATE TABLE user (id BIGINT UNSIGNED PRIMARY KEY AUTO_INCREMENT, \
        user_name VARCHAR(64) NOT NULL, age INT, created_at DATETIME) COMMENT='users'";

    #[test]
    fn test_user_table() {
        let model = build(USER, &GenConfig::default()).unwrap();
        assert_eq!(model.name, "User");
        assert_eq!(model.lower_name, "user");
        assert_eq!(model.plural_name, "Users");
        assert!(model.needs_table_name);
        assert_eq!(model.comment, "users");

        let names: Vec<_> = model.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["ID", "UserName", "Age", "CreatedAt"]);

        let user_name = model.field("user_name").unwrap();
        assert_eq!(user_name.json_name, "userName");
        assert_eq!(user_name.storage_type, "varchar(64)");

        let created_at = model.field("created_at").unwrap();
        assert_eq!(created_at.go_type(), "*time.Time");
        assert_eq!(created_at.imports(), ["time"]);
        assert_eq!(created_at.wire_type(), Some(WireType::String));
    }

    #[test]
    fn test_plural_table_needs_no_override() {
        let sql = "CREATE TABLE users (id INT PRIMARY KEY)";
        assert!(!build(sql, &GenConfig::default()).unwrap().needs_table_name);

        let forced = GenConfig::builder().force_table_name(true).build();
        assert!(build(sql, &forced).unwrap().needs_table_name);
    }

    #[test]
    fn test_prefixes_are_stripped() {
        let config = GenConfig::builder()
            .table_prefix("t_")
            .column_prefix("f_")
            .json_naming(NamingConvention::Snake)
            .build();
        let model = build("CREATE TABLE t_orders (f_id INT PRIMARY KEY, f_order_no TEXT)", &config)
            .unwrap();
        assert_eq!(model.name, "Orders");
        assert!(model.needs_table_name);
        let order_no = &model.fields[1];
        assert_eq!(order_no.raw_name, "f_order_no");
        assert_eq!(order_no.name, "OrderNo");
        assert_eq!(order_no.json_name, "order_no");
    }

    #[test]
    fn test_comment_continuation() {
        let model = build(
            "CREATE TABLE t (id INT) COMMENT='first\nsecond'",
            &GenConfig::default(),
        )
        .unwrap();
        assert_eq!(model.comment, "first\n// second");
    }

    #[test]
    fn test_zero_columns_is_an_error() {
        let err = build("CREATE TABLE t ()", &GenConfig::default()).unwrap_err();
        assert!(matches!(err, GenError::NoColumns(name) if name == "t"));
    }

    #[test]
    fn test_unknown_type_is_an_error() {
        let err = build("CREATE TABLE t (g GEOMETRY)", &GenConfig::default()).unwrap_err();
        match err {
            GenError::UnknownType { column, native, dialect } => {
                assert_eq!(column, "g");
                assert_eq!(native, "geometry");
                assert_eq!(dialect, Dialect::MySql);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_null_policies() {
        let sql = "CREATE TABLE t (id INT PRIMARY KEY, age INT, name TEXT NOT NULL, \
                   born DATE, price DECIMAL(10,2), raw BLOB)";

        let wrapper = GenConfig::builder().null_policy(NullPolicy::Wrapper).build();
        let model = build(sql, &wrapper).unwrap();
        assert_eq!(model.field("id").unwrap().go_type(), "int32");
        assert_eq!(model.field("age").unwrap().go_type(), "sql.NullInt32");
        assert_eq!(model.field("age").unwrap().imports(), ["database/sql"]);
        assert_eq!(model.field("age").unwrap().non_zero("t.Age"), "t.Age.Valid");
        assert_eq!(model.field("name").unwrap().go_type(), "string");
        assert_eq!(model.field("born").unwrap().go_type(), "sql.NullTime");
        assert_eq!(model.field("price").unwrap().go_type(), "sqltypes.Decimal");
        assert_eq!(model.field("raw").unwrap().go_type(), "[]byte");

        let pointer = GenConfig::builder().null_policy(NullPolicy::Pointer).build();
        let model = build(sql, &pointer).unwrap();
        assert_eq!(model.field("age").unwrap().go_type(), "*int32");
        assert_eq!(model.field("age").unwrap().zero_literal(), "nil");
        assert_eq!(model.field("born").unwrap().go_type(), "*time.Time");
        assert_eq!(model.field("raw").unwrap().go_type(), "[]byte");
    }

    #[test]
    fn test_type_overrides_only_for_catalog_dialects() {
        let sql = "CREATE TABLE t (id integer PRIMARY KEY, price text)";
        let postgres = GenConfig::builder()
            .dialect(Dialect::Postgres)
            .field_type("price", "numeric(10,2)")
            .build();
        let model = build(sql, &postgres).unwrap();
        assert_eq!(model.field("price").unwrap().storage_type, "numeric(10,2)");
        assert_eq!(model.field("price").unwrap().go_type(), "sqltypes.Decimal");

        let mysql = GenConfig::builder().field_type("price", "numeric(10,2)").build();
        let model = build(sql, &mysql).unwrap();
        assert_eq!(model.field("price").unwrap().go_type(), "string");
    }

    #[test]
    fn test_rewrites_and_shapes() {
        let sql = "CREATE TABLE t (id INT PRIMARY KEY, flag TINYINT(1), meta JSON, price DECIMAL(8,2))";
        let model = build(sql, &GenConfig::default()).unwrap();

        let flag = model.field("flag").unwrap();
        assert_eq!(flag.go_type(), "sqltypes.Bool");
        assert_eq!(flag.zero_literal(), "false");
        assert_eq!(flag.wire_type(), Some(WireType::Bool));
        assert_eq!(flag.dto_go_type(), "bool");

        for raw in ["meta", "price"] {
            let field = model.field(raw).unwrap();
            assert_eq!(field.zero_literal(), "\"\"");
            assert_eq!(field.wire_type(), Some(WireType::String));
            assert_eq!(field.dto_go_type(), "string");
            assert_eq!(field.imports(), ["example.com/app/pkg/sqltypes"]);
        }
    }

    #[test]
    fn test_sqlite_integer_primary_key_auto_increments() {
        let config = GenConfig::builder().dialect(Dialect::Sqlite).build();
        let model = build("CREATE TABLE notes (id INTEGER PRIMARY KEY, body TEXT)", &config)
            .unwrap();
        let id = model.field("id").unwrap();
        assert!(id.auto_increment);
        assert_eq!(id.host_type, HostType::Int64);
    }
}
