//! Message and service schema (`.proto`).
//!
//! Four variants: basic or extended operation set, each with or without the
//! HTTP annotations the web transport needs.

use std::collections::BTreeSet;
use std::fmt::Write;

use super::{ArtifactKind, Emitter, Operation, Transport};
use crate::context::GenContext;
use crate::error::GenResult;
use crate::model::{Field, TableModel};

const TYPES_PROTO: &str = "api/types/types.proto";
const VALIDATE_PROTO: &str = "validate/validate.proto";
const HTTP_PROTO: &str = "google/api/annotations.proto";
const OPENAPI_PROTO: &str = "protoc-gen-openapiv2/options/annotations.proto";
const TAGGER_PROTO: &str = "tagger/tagger.proto";

pub struct ProtoEmitter;

impl Emitter for ProtoEmitter {
    fn kind(&self) -> ArtifactKind {
        ArtifactKind::MessageService
    }

    fn render(&self, ctx: &GenContext, table: &TableModel) -> GenResult<String> {
        let web = ctx.transport() == Transport::Web;
        let ops = Operation::for_tier(ctx.tier());

        let mut imports = BTreeSet::from([TYPES_PROTO, VALIDATE_PROTO]);
        if web {
            imports.extend([HTTP_PROTO, OPENAPI_PROTO, TAGGER_PROTO]);
        }

        let mut out = String::from("syntax = \"proto3\";\n\n");
        let _ = writeln!(out, "package api.{}.v1;\n", table.lower_name);
        for import in &imports {
            let _ = writeln!(out, "import \"{import}\";");
        }
        let _ = writeln!(
            out,
            "\noption go_package = \"{}/api/{}/v1;v1\";\n",
            ctx.config().go_module,
            table.lower_name
        );

        let _ = writeln!(out, "service {} {{", table.lower_name);
        for (i, op) in ops.iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            render_rpc(&mut out, table, *op, web);
        }
        out.push_str("}\n");

        out.push('\n');
        out.push_str(&entity_message(ctx, table)?);
        for op in ops {
            out.push('\n');
            out.push_str(&request_message(ctx, table, *op, web)?);
            out.push('\n');
            out.push_str(&reply_message(table, *op));
        }
        Ok(out)
    }
}

/// Proto field name of a column. The same name carries the JSON mapping.
pub fn field_name(field: &Field) -> &str {
    &field.json_name
}

fn render_rpc(out: &mut String, table: &TableModel, op: Operation, web: bool) {
    let key = &table.crud.key;
    let summary = op.summary(table);
    let _ = writeln!(out, "  // {summary}");
    let signature = format!(
        "  rpc {}({}) returns ({})",
        op.rpc_name(key),
        op.request_name(table),
        op.reply_name(table)
    );
    if !web {
        let _ = writeln!(out, "{signature} {{}}");
        return;
    }
    let (method, suffix) = op.route(key);
    let _ = writeln!(out, "{signature} {{");
    out.push_str("    option (google.api.http) = {\n");
    let _ = writeln!(out, "      {method}: \"/api/v1/{}{suffix}\"", table.lower_name);
    if op.has_body() {
        out.push_str("      body: \"*\"\n");
    }
    out.push_str("    };\n");
    out.push_str("    option (grpc.gateway.protoc_gen_openapiv2.options.openapiv2_operation) = {\n");
    let _ = writeln!(out, "      summary: \"{summary}\",");
    let _ = writeln!(out, "      description: \"{summary}\",");
    out.push_str("    };\n");
    out.push_str("  }\n");
}

/// Message fields under construction, numbered in insertion order.
#[derive(Default)]
struct MessageBody {
    lines: Vec<String>,
}

impl MessageBody {
    fn add(&mut self, ty: &str, name: &str, options: Option<String>, comment: &str) {
        let number = self.lines.len() + 1;
        let mut line = format!("  {ty} {name} = {number}");
        if let Some(options) = options {
            let _ = write!(line, " [{options}]");
        }
        line.push(';');
        if !comment.is_empty() {
            let _ = write!(line, " // {comment}");
        }
        self.lines.push(line);
    }

    fn add_field(&mut self, field: &Field) -> GenResult<()> {
        let wire = super::require_wire(ArtifactKind::MessageService, field)?;
        self.add(&wire.proto_name(), field_name(field), None, &field.comment);
        Ok(())
    }

    fn finish(self, doc: &str, name: &str) -> String {
        let mut out = String::new();
        if !doc.is_empty() {
            let _ = writeln!(out, "// {doc}");
        }
        let _ = writeln!(out, "message {name} {{");
        for line in self.lines {
            out.push_str(&line);
            out.push('\n');
        }
        out.push_str("}\n");
        out
    }
}

fn entity_message(ctx: &GenContext, table: &TableModel) -> GenResult<String> {
    let key = &table.crud.key;
    let mut body = MessageBody::default();
    if table.key_field().is_none() {
        body.add(&key.wire.proto_name(), &key.lower, None, "");
    }
    for field in &table.fields {
        if !super::replaced_by_embedding(ctx, field) {
            body.add_field(field)?;
        }
    }
    let doc = if table.comment.is_empty() {
        table.name.clone()
    } else {
        format!("{} {}", table.name, table.comment)
    };
    Ok(body.finish(&doc, &table.name))
}

fn request_message(
    ctx: &GenContext,
    table: &TableModel,
    op: Operation,
    web: bool,
) -> GenResult<String> {
    let key = &table.crud.key;
    let mut body = MessageBody::default();
    let key_rule = Some(key.validation_rule(web));
    match op {
        Operation::Create => {
            for field in super::creatable_fields(ctx, table) {
                body.add_field(field)?;
            }
        }
        Operation::DeleteByKey | Operation::GetByKey => {
            body.add(&key.wire.proto_name(), &key.lower, key_rule, "");
        }
        Operation::UpdateByKey => {
            body.add(&key.wire.proto_name(), &key.lower, key_rule, "");
            for field in super::updatable_fields(ctx, table) {
                body.add_field(field)?;
            }
        }
        Operation::List => body.add(
            "api.types.Params",
            "params",
            Some("(validate.rules).message.required = true".to_string()),
            "",
        ),
        Operation::DeleteByKeys | Operation::ListByKeys => body.add(
            &format!("repeated {}", key.wire.scalar_name()),
            &key.lower_plural,
            Some("(validate.rules).repeated.min_items = 1".to_string()),
            "",
        ),
        Operation::GetByCondition => body.add(
            "api.types.Conditions",
            "conditions",
            Some("(validate.rules).message.required = true".to_string()),
            "",
        ),
        Operation::ListByLastKey => {
            let last = format!("last{}", key.word);
            let form = |name: &str| web.then(|| format!("(tagger.tags) = \"form:\\\"{name}\\\"\""));
            body.add(&key.wire.proto_name(), &last, form(&last), "");
            let limit = match form("limit") {
                Some(tag) => format!("(validate.rules).uint32.gt = 0, {tag}"),
                None => "(validate.rules).uint32.gt = 0".to_string(),
            };
            body.add("uint32", "limit", Some(limit), "");
            body.add("string", "sort", form("sort"), "");
        }
    }
    Ok(body.finish("", &op.request_name(table)))
}

fn reply_message(table: &TableModel, op: Operation) -> String {
    let key = &table.crud.key;
    let mut body = MessageBody::default();
    match op {
        Operation::Create => body.add(&key.wire.proto_name(), &key.lower, None, ""),
        Operation::DeleteByKey | Operation::UpdateByKey | Operation::DeleteByKeys => {}
        Operation::GetByKey | Operation::GetByCondition => {
            body.add(&table.name, &table.lower_name, None, "")
        }
        Operation::List => {
            body.add(&format!("repeated {}", table.name), &table.lower_plural_name, None, "");
            body.add("int64", "total", None, "");
        }
        Operation::ListByKeys | Operation::ListByLastKey => {
            body.add(&format!("repeated {}", table.name), &table.lower_plural_name, None, "")
        }
    }
    body.finish("", &op.reply_name(table))
}
