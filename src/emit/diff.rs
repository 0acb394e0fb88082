//! Sparse update helper (`dao` package).
//!
//! Only fields holding a non-zero value end up in the update map, so the
//! predicate per field must agree with the zero literal of its shape.

use std::fmt::Write;

use super::go::{self, GoFile};
use super::{ArtifactKind, Emitter};
use crate::context::GenContext;
use crate::error::GenResult;
use crate::model::TableModel;

pub struct DiffEmitter;

impl Emitter for DiffEmitter {
    fn kind(&self) -> ArtifactKind {
        ArtifactKind::Diff
    }

    fn render(&self, ctx: &GenContext, table: &TableModel) -> GenResult<String> {
        let model_module = format!("{}/internal/model", ctx.config().go_module);
        let mut file = GoFile::new("dao");
        file.import(&model_module);

        let mut body = String::new();
        let _ = writeln!(
            body,
            "// {name}UpdateFields returns the columns of table that hold a non-zero value.",
            name = table.name
        );
        let _ = writeln!(
            body,
            "func {}UpdateFields(table *model.{}) map[string]interface{{}} {{",
            table.name, table.name
        );
        body.push_str("\tupdate := map[string]interface{}{}\n");

        for field in super::updatable_fields(ctx, table) {
            for module in field.imports() {
                match &field.rewrite {
                    Some(rewrite) => file.import_for_type(&module, &rewrite.type_name),
                    None => file.import(&module),
                };
            }
            let access = format!("table.{}", field.name);
            let _ = write!(
                body,
                "\n\tif {} {{\n\t\tupdate[{}] = {access}\n\t}}\n",
                field.non_zero(&access),
                go::quote(&field.raw_name),
            );
        }

        body.push_str("\n\treturn update\n}\n");
        file.push(&body);
        Ok(file.render())
    }
}
