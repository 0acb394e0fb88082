//! HTTP request and reply shapes (`types` package).

use std::fmt::Write;

use super::go::{self, GoFile, Line};
use super::{ArtifactKind, Emitter, Operation};
use crate::context::GenContext;
use crate::error::GenResult;
use crate::model::{Field, TableModel};

pub struct DtoEmitter;

impl Emitter for DtoEmitter {
    fn kind(&self) -> ArtifactKind {
        ArtifactKind::RequestResponse
    }

    fn render(&self, ctx: &GenContext, table: &TableModel) -> GenResult<String> {
        let mut file = GoFile::new("types");
        file.import(&format!("{}/pkg/query", ctx.config().go_module));
        for field in &table.fields {
            if field.rewrite.is_none() {
                if let Some(module) = field.host_type.module() {
                    file.import(module);
                }
            }
        }

        let mut body = String::new();
        for op in Operation::for_tier(ctx.tier()) {
            body.push_str(&go::struct_decl(
                &format!("{} request params", op.request_name(table)),
                &op.request_name(table),
                &request_lines(ctx, table, *op),
            ));
            body.push('\n');
            body.push_str(&go::struct_decl(
                &format!("{} only for api docs", op.reply_name(table)),
                &op.reply_name(table),
                &reply_lines(table, *op),
            ));
            body.push('\n');
        }

        let mut detail = Vec::new();
        if table.key_field().is_none() {
            let key = &table.crud.key;
            detail.push(Line::tagged(&key.word, &key.go_type, format!("json:\"{}\"", key.lower)));
        }
        for field in super::detail_fields(ctx, table) {
            detail.push(
                Line::tagged(&field.name, field.dto_go_type(), format!("json:\"{}\"", field.json_name))
                    .comment(&field.comment),
            );
        }
        body.push_str(&go::struct_decl(
            &format!("{}ObjDetail detail", table.name),
            &format!("{}ObjDetail", table.name),
            &detail,
        ));
        body.push_str(&super::external_struct_note(table, "types"));

        file.push(&body);
        Ok(file.render())
    }
}

fn body_field(field: &Field) -> Line {
    Line::tagged(
        &field.name,
        field.dto_go_type(),
        format!("json:\"{}\" binding:\"\"", field.json_name),
    )
    .comment(&field.comment)
}

fn key_line(table: &TableModel) -> Line {
    let key = &table.crud.key;
    Line::tagged(
        &key.word,
        &key.go_type,
        format!("json:\"{lower}\" uri:\"{lower}\"", lower = key.lower),
    )
    .comment("uri path")
}

fn request_lines(ctx: &GenContext, table: &TableModel, op: Operation) -> Vec<Line> {
    let key = &table.crud.key;
    match op {
        Operation::Create => super::creatable_fields(ctx, table)
            .into_iter()
            .map(body_field)
            .collect(),
        Operation::DeleteByKey | Operation::GetByKey => vec![key_line(table)],
        Operation::UpdateByKey => std::iter::once(key_line(table))
            .chain(super::updatable_fields(ctx, table).into_iter().map(body_field))
            .collect(),
        Operation::List => vec![Line::Embedded("query.Params".to_string())],
        Operation::DeleteByKeys | Operation::ListByKeys => vec![
            Line::tagged(
                &key.word_plural,
                format!("[]{}", key.go_type),
                format!("json:\"{}\" binding:\"min=1\"", key.lower_plural),
            )
            .comment(&format!("{} list", key.lower)),
        ],
        Operation::GetByCondition => vec![
            Line::tagged(
                "Conditions",
                "query.Conditions",
                "json:\"conditions\" binding:\"required\"",
            )
            .comment("query conditions"),
        ],
        Operation::ListByLastKey => vec![
            Line::tagged(
                format!("Last{}", key.word),
                &key.go_type,
                format!("form:\"last{}\" binding:\"\"", key.word),
            ),
            Line::tagged("Limit", "int", "form:\"limit\" binding:\"gt=0,lte=100\""),
            Line::tagged("Sort", "string", "form:\"sort\" binding:\"\""),
        ],
    }
}

fn reply_lines(table: &TableModel, op: Operation) -> Vec<Line> {
    let key = &table.crud.key;
    let detail = format!("{}ObjDetail", table.name);
    let data = match op {
        Operation::Create => vec![Line::tagged(
            &key.word,
            &key.go_type,
            format!("json:\"{}\"", key.lower),
        )],
        Operation::DeleteByKey | Operation::UpdateByKey | Operation::DeleteByKeys => Vec::new(),
        Operation::GetByKey | Operation::GetByCondition => vec![Line::tagged(
            &table.name,
            &detail,
            format!("json:\"{}\"", table.lower_name),
        )],
        Operation::List => vec![
            Line::tagged(
                &table.plural_name,
                format!("[]{detail}"),
                format!("json:\"{}\"", table.lower_plural_name),
            ),
            Line::tagged("Total", "int64", "json:\"total\""),
        ],
        Operation::ListByKeys | Operation::ListByLastKey => vec![Line::tagged(
            &table.plural_name,
            format!("[]{detail}"),
            format!("json:\"{}\"", table.lower_plural_name),
        )],
    };

    let mut data_block = String::new();
    if data.is_empty() {
        data_block.push_str("\tData struct{} `json:\"data\"` // return data\n");
    } else {
        data_block.push_str("\tData struct {\n");
        data_block.push_str(&go::struct_body(&data, 2));
        let _ = writeln!(data_block, "\t}} `json:\"data\"` // return data");
    }

    vec![
        Line::tagged("Code", "int", "json:\"code\"").comment("return code"),
        Line::tagged("Msg", "string", "json:\"msg\"").comment("return information description"),
        Line::Raw(data_block),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GenConfig;
    use crate::dialect::Dialect;
    use pretty_assertions::assert_eq;

    fn render(sql: &str, config: GenConfig) -> String {
        let ctx = GenContext::new(config);
        let table = ctx
            .build_model(&crate::parser::parse_create_table(sql).unwrap())
            .unwrap();
        DtoEmitter.render(&ctx, &table).unwrap()
    }

    const USER: &str = "CREATE TABLE user (id BIGINT UNSIGNED PRIMARY KEY AUTO_INCREMENT, \
        user_name VARCHAR(64) NOT NULL, price DECIMAL(10,2), created_at DATETIME)";

    #[test]
    fn test_create_request_and_reply() {
        let out = render(USER, GenConfig::default());
        assert!(out.starts_with(
            "package types\n\nimport (\n\t\"time\"\n\n\t\"example.com/app/pkg/query\"\n)\n\n"
        ));
        let create = r#"// CreateUserRequest request params
type CreateUserRequest struct {
	UserName  string     `json:"userName" binding:""`
	Price     string     `json:"price" binding:""`
	CreatedAt *time.Time `json:"createdAt" binding:""`
}

// CreateUserReply only for api docs
type CreateUserReply struct {
	Code int    `json:"code"` // return code
	Msg  string `json:"msg"`  // return information description
	Data struct {
		ID uint64 `json:"id"`
	} `json:"data"` // return data
}
"#;
        assert!(out.contains(create), "{out}");
    }

    #[test]
    fn test_basic_tier_shapes() {
        let out = render(USER, GenConfig::default());
        assert!(out.contains("type DeleteUserByIDRequest struct {\n\tID uint64 `json:\"id\" uri:\"id\"` // uri path\n}"));
        assert!(out.contains("type ListUserRequest struct {\n\tquery.Params\n}"));
        assert!(out.contains("\tData struct{} `json:\"data\"` // return data\n"));
        assert!(out.contains("\t\tUser UserObjDetail `json:\"user\"`\n"));
        assert!(out.contains("\t\tUsers []UserObjDetail `json:\"users\"`\n"));
        assert!(out.contains("type UserObjDetail struct {\n\tID        uint64"));
        assert!(!out.contains("ByIDsRequest"));
    }

    #[test]
    fn test_extended_tier_shapes() {
        let out = render(USER, GenConfig::builder().extended_api(true).build());
        assert!(out.contains(
            "\tIDs []uint64 `json:\"ids\" binding:\"min=1\"` // id list\n"
        ));
        assert!(out.contains("type GetUserByConditionRequest struct"));
        assert!(out.contains("type ListUserByIDsReply struct"));
        assert!(out.contains("\tLastID uint64 `form:\"lastID\" binding:\"\"`\n"));
    }

    #[test]
    fn test_custom_key_shapes() {
        let out = render(
            "CREATE TABLE coupon (coupon_code VARCHAR(16) PRIMARY KEY, amount INT)",
            GenConfig::builder().extended_api(true).build(),
        );
        assert!(out.contains("type UpdateCouponByCouponCodeRequest struct {\n\tCouponCode string `json:\"couponCode\" uri:\"couponCode\"` // uri path\n\tAmount     int32  `json:\"amount\" binding:\"\"`\n}"));
        assert!(out.contains("CouponCodes []string `json:\"couponCodes\" binding:\"min=1\"`"));
        assert!(out.contains("type ListCouponByLastCouponCodeRequest struct"));
    }

    #[test]
    fn test_synthetic_key_in_detail() {
        let out = render(
            "CREATE TABLE coupon (code VARCHAR(16) PRIMARY KEY, amount INT)",
            GenConfig::builder().embed_standard_fields(true).build(),
        );
        assert!(out.contains("type CouponObjDetail struct {\n\tID     uint64 `json:\"id\"`\n\tCode   string"));
    }

    #[test]
    fn test_nested_struct_is_declared_by_caller() {
        let out = render(
            "CREATE TABLE user (_id primitive.ObjectID, home *Address)",
            GenConfig::builder().dialect(Dialect::MongoDb).build(),
        );
        assert!(out.contains("\tHome *Address `json:\"home\"`\n"));
        assert!(out.ends_with("\n// Address is not generated; declare it in package types.\n"));
    }

    #[test]
    fn test_document_key_is_a_string() {
        let out = render(
            "CREATE TABLE user (_id primitive.ObjectID, name string)",
            GenConfig::builder().dialect(Dialect::MongoDb).build(),
        );
        assert!(out.contains("\tID string `json:\"id\" uri:\"id\"` // uri path\n"));
        assert!(!out.contains("primitive"));
    }
}
