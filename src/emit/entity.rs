//! Entity struct (`model` package).

use std::fmt::Write;

use super::go::{self, GoFile, Line};
use super::{ArtifactKind, Emitter};
use crate::config::NamingConvention;
use crate::context::GenContext;
use crate::error::GenResult;
use crate::mapper::TIME_MODULE;
use crate::model::{Field, TableModel};

const GORM_MODULE: &str = "gorm.io/gorm";

/// Name of the standard block embedded in every entity.
pub const EMBEDDED_MODEL: &str = "Model";

pub struct EntityEmitter;

impl Emitter for EntityEmitter {
    fn kind(&self) -> ArtifactKind {
        ArtifactKind::Entity
    }

    fn render(&self, ctx: &GenContext, table: &TableModel) -> GenResult<String> {
        let document = table.dialect.is_document_store();
        let embedded = ctx.embeds_standard_fields();

        let mut file = GoFile::new("model");
        let mut lines = Vec::with_capacity(table.fields.len() + 1);
        if embedded {
            file.import(TIME_MODULE).import(GORM_MODULE);
            lines.push(Line::Embedded(EMBEDDED_MODEL.to_string()));
        }
        for field in &table.fields {
            if embedded && field.is_standard_field() {
                continue;
            }
            for module in field.imports() {
                match &field.rewrite {
                    Some(rewrite) => file.import_for_type(&module, &rewrite.type_name),
                    None => file.import(&module),
                };
            }
            let tag = if document { bson_tag(field) } else { gorm_tag(field) };
            lines.push(Line::tagged(&field.name, field.go_type(), tag).comment(&field.comment));
        }

        let doc = if table.comment.is_empty() {
            table.name.clone()
        } else {
            format!("{} {}", table.name, table.comment)
        };
        let mut body = go::struct_decl(&doc, &table.name, &lines);
        if embedded {
            body.push('\n');
            body.push_str(&standard_block(ctx));
        }

        if document {
            let _ = write!(
                body,
                "\n// {name}CollectionName collection name\nconst {name}CollectionName = {raw}\n",
                name = table.name,
                raw = go::quote(&table.raw_name),
            );
        } else if table.needs_table_name {
            let _ = write!(
                body,
                "\n// TableName table name\nfunc (m *{}) TableName() string {{\n\treturn {}\n}}\n",
                table.name,
                go::quote(&table.raw_name),
            );
        }

        body.push_str(&super::external_struct_note(table, "model"));

        file.push(&body);
        Ok(file.render())
    }
}

/// `id` and the timestamps. The key is the `uint64` the request and message
/// artifacts use.
fn standard_block(ctx: &GenContext) -> String {
    let json = |raw: &str| match ctx.config().naming_convention() {
        NamingConvention::Snake => ctx.naming().snake(raw),
        NamingConvention::Camel => ctx.naming().lower_camel(raw),
    };
    let column = |name: &str, ty: &str, raw: &str, extra: &str| {
        Line::tagged(
            name,
            ty,
            format!("gorm:\"column:{raw}{extra}\" json:\"{}\"", json(raw)),
        )
    };
    let lines = [
        column("ID", "uint64", "id", ";primary_key;AUTO_INCREMENT"),
        column("CreatedAt", "time.Time", "created_at", ""),
        column("UpdatedAt", "time.Time", "updated_at", ""),
        column("DeletedAt", "gorm.DeletedAt", "deleted_at", ";index"),
    ];
    go::struct_decl(
        &format!("{EMBEDDED_MODEL} standard fields"),
        EMBEDDED_MODEL,
        &lines,
    )
}

fn gorm_tag(field: &Field) -> String {
    let mut gorm = format!("column:{}", field.raw_name);
    if !field.storage_type.is_empty() {
        let _ = write!(gorm, ";type:{}", field.storage_type);
    }
    if field.is_primary_key {
        gorm.push_str(";primary_key");
    }
    if field.auto_increment {
        gorm.push_str(";AUTO_INCREMENT");
    }
    if field.not_null && !field.is_primary_key {
        gorm.push_str(";NOT NULL");
    }
    if field.is_unique {
        gorm.push_str(";unique");
    }
    if let Some(default) = field.default.as_deref().filter(|d| tag_safe(d)) {
        let _ = write!(gorm, ";default:{default}");
    }
    format!("gorm:\"{gorm}\" json:\"{}\"", field.json_name)
}

fn bson_tag(field: &Field) -> String {
    format!("bson:\"{}\" json:\"{}\"", field.raw_name, field.json_name)
}

/// Defaults that would break the struct tag are left out.
fn tag_safe(value: &str) -> bool {
    !value.eq_ignore_ascii_case("null") && !value.contains(['"', '`', ';'])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{GenConfig, NullPolicy};
    use crate::dialect::Dialect;
    use pretty_assertions::assert_eq;

    fn render(sql: &str, config: GenConfig) -> String {
        let ctx = GenContext::new(config);
        let table = ctx
            .build_model(&crate::parser::parse_create_table(sql).unwrap())
            .unwrap();
        EntityEmitter.render(&ctx, &table).unwrap()
    }

    #[test]
    fn test_relational_entity() {
        let out = render(
            "CREATE TABLE user (id BIGINT UNSIGNED PRIMARY KEY AUTO_INCREMENT, \
             user_name VARCHAR(64) NOT NULL COMMENT 'login name', age INT DEFAULT 0, \
             created_at DATETIME) COMMENT='users'",
            GenConfig::default(),
        );
        assert_eq!(
            out,
            r#"package model

import (
	"time"
)

// User users
type User struct {
	ID        uint64     `gorm:"column:id;type:bigint unsigned;primary_key;AUTO_INCREMENT" json:"id"`
	UserName  string     `gorm:"column:user_name;type:varchar(64);NOT NULL" json:"userName"` // login name
	Age       int32      `gorm:"column:age;type:int;default:0" json:"age"`
	CreatedAt *time.Time `gorm:"column:created_at;type:datetime" json:"createdAt"`
}

// TableName table name
func (m *User) TableName() string {
	return "user"
}
"#
        );
    }

    #[test]
    fn test_plural_table_skips_table_name() {
        let out = render("CREATE TABLE users (id INT PRIMARY KEY)", GenConfig::default());
        assert!(!out.contains("TableName"));
        assert!(!out.contains("import"));
    }

    #[test]
    fn test_embedded_standard_fields() {
        let out = render(
            "CREATE TABLE users (id BIGINT PRIMARY KEY, name TEXT, created_at DATETIME, \
             updated_at DATETIME, deleted_at DATETIME)",
            GenConfig::builder().embed_standard_fields(true).build(),
        );
        assert!(out.contains("import (\n\t\"time\"\n\n\t\"gorm.io/gorm\"\n)\n"));
        assert!(out.contains(
            "type Users struct {\n\tModel\n\tName string `gorm:\"column:name;type:text\" json:\"name\"`\n}\n"
        ));
        assert!(out.contains(
            "// Model standard fields\ntype Model struct {\n\
             \tID        uint64         `gorm:\"column:id;primary_key;AUTO_INCREMENT\" json:\"id\"`\n\
             \tCreatedAt time.Time      `gorm:\"column:created_at\" json:\"createdAt\"`\n\
             \tUpdatedAt time.Time      `gorm:\"column:updated_at\" json:\"updatedAt\"`\n\
             \tDeletedAt gorm.DeletedAt `gorm:\"column:deleted_at;index\" json:\"deletedAt\"`\n\
             }\n"
        ));
        assert!(!out.contains("gorm.Model"));
    }

    #[test]
    fn test_wrapper_imports_database_sql() {
        let out = render(
            "CREATE TABLE users (id INT PRIMARY KEY, age INT, price DECIMAL(10,2))",
            GenConfig::builder().null_policy(NullPolicy::Wrapper).build(),
        );
        assert!(out.contains("\t\"database/sql\"\n\n\t\"example.com/app/pkg/sqltypes\"\n"));
        assert!(out.contains("sql.NullInt32"));
        assert!(out.contains("sqltypes.Decimal"));
    }

    #[test]
    fn test_document_entity() {
        let out = render(
            "CREATE TABLE user (_id primitive.ObjectID, name string, tags []string)",
            GenConfig::builder().dialect(Dialect::MongoDb).build(),
        );
        assert!(out.contains("\t\"go.mongodb.org/mongo-driver/bson/primitive\"\n"));
        assert!(out.contains("ID   primitive.ObjectID `bson:\"_id\" json:\"id\"`"));
        assert!(out.contains("Tags []string           `bson:\"tags\" json:\"tags\"`"));
        assert!(out.contains("const UserCollectionName = \"user\""));
        assert!(!out.contains("TableName"));
    }

    #[test]
    fn test_nested_struct_is_declared_by_caller() {
        let out = render(
            "CREATE TABLE user (_id primitive.ObjectID, home *Address, past []*Address, tags []string)",
            GenConfig::builder().dialect(Dialect::MongoDb).build(),
        );
        assert!(out.ends_with("\n// Address is not generated; declare it in package model.\n"));
        assert_eq!(out.matches("is not generated").count(), 1);
    }

    #[test]
    fn test_untyped_sqlite_column() {
        let out = render(
            "CREATE TABLE kv (k TEXT PRIMARY KEY, v)",
            GenConfig::builder().dialect(Dialect::Sqlite).build(),
        );
        assert!(out.contains("V []byte `gorm:\"column:v\" json:\"v\"`"));
    }

    #[test]
    fn test_null_default_is_not_tagged() {
        let out = render(
            "CREATE TABLE users (id INT PRIMARY KEY, note TEXT DEFAULT NULL)",
            GenConfig::default(),
        );
        assert!(!out.contains("default:"));
    }
}
