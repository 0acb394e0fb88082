//! Go table test calling every rpc of the selected tier (`service` package).

use std::fmt::Write;

use super::go::{GoFile, proto_go_name};
use super::proto::field_name;
use super::{ArtifactKind, Emitter, Operation};
use crate::context::GenContext;
use crate::error::GenResult;
use crate::model::TableModel;

pub struct ExerciserEmitter;

impl Emitter for ExerciserEmitter {
    fn kind(&self) -> ArtifactKind {
        ArtifactKind::Exerciser
    }

    fn render(&self, ctx: &GenContext, table: &TableModel) -> GenResult<String> {
        let module = &ctx.config().go_module;
        let alias = format!("{}V1", table.lower_name);
        let conn_fn = format!("get{}RPCConn", table.name);

        let mut file = GoFile::new("service");
        file.import("context")
            .import("os")
            .import("testing")
            .import("time")
            .import("google.golang.org/grpc")
            .import("google.golang.org/grpc/credentials/insecure")
            .import(&format!("{module}/api/types"))
            .import_as(&format!("{module}/api/{}/v1", table.lower_name), &alias);

        let mut body = String::new();
        let _ = writeln!(body, "func Test_{}_methods(t *testing.T) {{", table.lower_name);
        let _ = writeln!(body, "\tconn := {conn_fn}(t)");
        body.push_str("\tdefer conn.Close()\n");
        let _ = writeln!(
            body,
            "\tcli := {alias}.New{}Client(conn)",
            proto_go_name(&table.lower_name)
        );
        body.push_str("\tctx, cancel := context.WithTimeout(context.Background(), 3*time.Second)\n");
        body.push_str("\tdefer cancel()\n\n");
        body.push_str("\ttests := []struct {\n\t\tname    string\n\t\tfn      func() (interface{}, error)\n\t\twantErr bool\n\t}{\n");

        for op in Operation::for_tier(ctx.tier()) {
            let rpc = op.rpc_name(&table.crud.key);
            let _ = writeln!(body, "\t\t{{\n\t\t\tname: \"{rpc}\",");
            body.push_str("\t\t\tfn: func() (interface{}, error) {\n");
            let values = request_values(ctx, table, *op)?;
            if values.is_empty() {
                let _ = writeln!(body, "\t\t\t\treq := &{alias}.{}{{}}", op.request_name(table));
            } else {
                let _ = writeln!(body, "\t\t\t\treq := &{alias}.{}{{", op.request_name(table));
                let width = values.iter().map(|(k, _)| k.len()).max().unwrap_or(0) + 1;
                for (key, value) in &values {
                    let _ = writeln!(body, "\t\t\t\t\t{:<width$} {value},", format!("{key}:"));
                }
                body.push_str("\t\t\t\t}\n");
            }
            let _ = writeln!(body, "\t\t\t\treturn cli.{rpc}(ctx, req)");
            body.push_str("\t\t\t},\n\t\t\twantErr: false,\n\t\t},\n");
        }

        body.push_str(
            "\t}

\tfor _, tt := range tests {
\t\tt.Run(tt.name, func(t *testing.T) {
\t\t\tgot, err := tt.fn()
\t\t\tif (err != nil) != tt.wantErr {
\t\t\t\tt.Errorf(\"test '%s' error = %v, wantErr %v\", tt.name, err, tt.wantErr)
\t\t\t\treturn
\t\t\t}
\t\t\tt.Log(\"reply data: \", got)
\t\t})
\t}
}
",
        );

        let _ = write!(
            body,
            "
func {conn_fn}(t *testing.T) *grpc.ClientConn {{
\taddr := os.Getenv(\"RPC_ADDR\")
\tif addr == \"\" {{
\t\taddr = \"127.0.0.1:8282\"
\t}}
\tconn, err := grpc.Dial(addr, grpc.WithTransportCredentials(insecure.NewCredentials()))
\tif err != nil {{
\t\tt.Fatal(err)
\t}}
\treturn conn
}}
"
        );

        file.push(&body);
        Ok(file.render())
    }
}

/// `(GoField, literal)` pairs of a zero-valued request.
fn request_values(
    ctx: &GenContext,
    table: &TableModel,
    op: Operation,
) -> GenResult<Vec<(String, String)>> {
    let key = &table.crud.key;
    let key_value = || (proto_go_name(&key.lower), key.wire.zero_literal().to_string());
    let mut values = Vec::new();
    match op {
        Operation::Create => {
            for field in super::creatable_fields(ctx, table) {
                let wire = super::require_wire(ArtifactKind::Exerciser, field)?;
                values.push((proto_go_name(field_name(field)), wire.zero_literal().to_string()));
            }
        }
        Operation::DeleteByKey | Operation::GetByKey => values.push(key_value()),
        Operation::UpdateByKey => {
            values.push(key_value());
            for field in super::updatable_fields(ctx, table) {
                let wire = super::require_wire(ArtifactKind::Exerciser, field)?;
                values.push((proto_go_name(field_name(field)), wire.zero_literal().to_string()));
            }
        }
        Operation::List => values.push((
            "Params".to_string(),
            "&types.Params{Page: 0, Limit: 10}".to_string(),
        )),
        Operation::DeleteByKeys | Operation::ListByKeys => values.push((
            proto_go_name(&key.lower_plural),
            format!("[]{}{{{}}}", key.wire.go_name(), key.wire.zero_literal()),
        )),
        Operation::GetByCondition => values.push((
            "Conditions".to_string(),
            "&types.Conditions{}".to_string(),
        )),
        Operation::ListByLastKey => {
            values.push((
                proto_go_name(&format!("last{}", key.word)),
                key.wire.zero_literal().to_string(),
            ));
            values.push(("Limit".to_string(), "10".to_string()));
            values.push(("Sort".to_string(), "\"\"".to_string()));
        }
    }
    Ok(values)
}
