//! Go source assembly: import blocks and gofmt-aligned struct bodies.

use std::collections::BTreeMap;
use std::fmt::Write;

/// A Go file under construction. Imports that the body never references are
/// dropped at render time.
#[derive(Debug, Default)]
pub struct GoFile {
    package: String,
    /// path → alias
    imports: BTreeMap<String, Option<String>>,
    body: String,
}

impl GoFile {
    pub fn new(package: &str) -> Self {
        Self {
            package: package.to_string(),
            ..Default::default()
        }
    }

    pub fn import(&mut self, path: &str) -> &mut Self {
        self.imports.entry(path.to_string()).or_insert(None);
        self
    }

    pub fn import_as(&mut self, path: &str, alias: &str) -> &mut Self {
        self.imports
            .insert(path.to_string(), Some(alias.to_string()));
        self
    }

    /// Import the package a qualified type like `decimal.Decimal` lives in,
    /// aliasing it when the qualifier differs from the path's last segment.
    pub fn import_for_type(&mut self, path: &str, type_name: &str) -> &mut Self {
        match type_name.split_once('.') {
            Some((qualifier, _)) if qualifier != last_segment(path) => {
                self.import_as(path, qualifier)
            }
            _ => self.import(path),
        }
    }

    pub fn push(&mut self, text: &str) -> &mut Self {
        self.body.push_str(text);
        self
    }

    pub fn render(&self) -> String {
        let mut std = Vec::new();
        let mut third = Vec::new();
        for (path, alias) in &self.imports {
            let qualifier = alias.as_deref().unwrap_or_else(|| last_segment(path));
            if !references(&self.body, qualifier) {
                continue;
            }
            let line = match alias {
                Some(alias) => format!("\t{alias} \"{path}\""),
                None => format!("\t\"{path}\""),
            };
            if is_std(path) {
                std.push(line);
            } else {
                third.push(line);
            }
        }

        let mut out = format!("package {}\n\n", self.package);
        if !std.is_empty() || !third.is_empty() {
            out.push_str("import (\n");
            out.push_str(&std.join("\n"));
            if !std.is_empty() && !third.is_empty() {
                out.push_str("\n\n");
            }
            out.push_str(&third.join("\n"));
            out.push_str("\n)\n\n");
        }
        out.push_str(self.body.trim_end());
        out.push('\n');
        out
    }
}

fn last_segment(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Standard library paths have no dot in their first element.
fn is_std(path: &str) -> bool {
    !path.split('/').next().unwrap_or_default().contains('.')
}

/// Whether `body` uses `qualifier.` as a package selector.
fn references(body: &str, qualifier: &str) -> bool {
    let needle = format!("{qualifier}.");
    body.match_indices(&needle).any(|(at, _)| {
        body[..at]
            .chars()
            .next_back()
            .is_none_or(|c| !(c.is_alphanumeric() || c == '_' || c == '.'))
    })
}

/// One line of a struct body.
#[derive(Debug, Clone)]
pub enum Line {
    Field {
        name: String,
        ty: String,
        tag: Option<String>,
        comment: Option<String>,
    },
    Embedded(String),
    /// Pre-formatted, emitted as is (without leading indentation).
    Raw(String),
}

impl Line {
    pub fn field(name: impl Into<String>, ty: impl Into<String>) -> Self {
        Line::Field {
            name: name.into(),
            ty: ty.into(),
            tag: None,
            comment: None,
        }
    }

    pub fn tagged(name: impl Into<String>, ty: impl Into<String>, tag: impl Into<String>) -> Self {
        Line::Field {
            name: name.into(),
            ty: ty.into(),
            tag: Some(tag.into()),
            comment: None,
        }
    }

    /// Attach a trailing comment. Empty comments are ignored.
    pub fn comment(mut self, text: &str) -> Self {
        if let Line::Field { comment, .. } = &mut self {
            if !text.is_empty() {
                *comment = Some(text.to_string());
            }
        }
        self
    }
}

/// Render `lines` as a struct body with `indent` tabs, aligning columns over
/// each run of consecutive fields the way gofmt does.
pub fn struct_body(lines: &[Line], indent: usize) -> String {
    let tabs = "\t".repeat(indent);
    let mut out = String::new();
    let mut i = 0;
    while i < lines.len() {
        match &lines[i] {
            Line::Embedded(name) => {
                let _ = writeln!(out, "{tabs}{name}");
                i += 1;
            }
            Line::Raw(text) => {
                out.push_str(text);
                if !text.ends_with('\n') {
                    out.push('\n');
                }
                i += 1;
            }
            Line::Field { .. } => {
                let end = lines[i..]
                    .iter()
                    .position(|l| !matches!(l, Line::Field { .. }))
                    .map_or(lines.len(), |n| i + n);
                render_run(&lines[i..end], &tabs, &mut out);
                i = end;
            }
        }
    }
    out
}

fn render_run(run: &[Line], tabs: &str, out: &mut String) {
    let width = |s: &str| s.chars().count();
    let (mut name_w, mut ty_w, mut tag_w) = (0, 0, 0);
    for line in run {
        if let Line::Field { name, ty, tag, comment } = line {
            name_w = name_w.max(width(name));
            if tag.is_some() || comment.is_some() {
                ty_w = ty_w.max(width(ty));
            }
            if let (Some(tag), Some(_)) = (tag, comment) {
                tag_w = tag_w.max(width(tag) + 2);
            }
        }
    }
    for line in run {
        let Line::Field { name, ty, tag, comment } = line else {
            continue;
        };
        let mut text = if tag.is_some() || comment.is_some() {
            format!("{tabs}{name:<name_w$} {ty:<ty_w$}")
        } else {
            format!("{tabs}{name:<name_w$} {ty}")
        };
        match (tag, comment) {
            (Some(tag), Some(comment)) => {
                let tag = format!("`{tag}`");
                let _ = write!(text, " {tag:<tag_w$} // {comment}");
            }
            (Some(tag), None) => {
                let _ = write!(text, " `{tag}`");
            }
            (None, Some(comment)) => {
                let _ = write!(text, " // {comment}");
            }
            (None, None) => {}
        }
        out.push_str(text.trim_end());
        out.push('\n');
    }
}

/// A complete `type Name struct { ... }` declaration with a doc line.
pub fn struct_decl(doc: &str, name: &str, lines: &[Line]) -> String {
    let mut out = String::new();
    if !doc.is_empty() {
        let _ = writeln!(out, "// {doc}");
    }
    if lines.is_empty() {
        let _ = writeln!(out, "type {name} struct{{}}");
        return out;
    }
    let _ = writeln!(out, "type {name} struct {{");
    out.push_str(&struct_body(lines, 1));
    out.push_str("}\n");
    out
}

/// Quote `s` as a Go interpreted string literal.
pub fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Go field name protoc-gen-go derives from a proto field name.
pub fn proto_go_name(proto_name: &str) -> String {
    let mut out = String::with_capacity(proto_name.len());
    let mut upper_next = true;
    for c in proto_name.chars() {
        if c == '_' {
            upper_next = true;
            continue;
        }
        if upper_next {
            out.extend(c.to_uppercase());
            upper_next = false;
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_imports_are_grouped_and_pruned() {
        let mut file = GoFile::new("model");
        file.import("time")
            .import("database/sql")
            .import("gorm.io/gorm")
            .import("go.mongodb.org/mongo-driver/bson/primitive");
        file.push("type T struct {\n\tgorm.Model\n\tAt *time.Time\n}\n");

        assert_eq!(
            file.render(),
            "package model\n\nimport (\n\t\"time\"\n\n\t\"gorm.io/gorm\"\n)\n\n\
             type T struct {\n\tgorm.Model\n\tAt *time.Time\n}\n"
        );
    }

    #[test]
    fn test_no_import_block_when_nothing_used() {
        let mut file = GoFile::new("dao");
        file.import("time").push("var x = 1\n");
        assert_eq!(file.render(), "package dao\n\nvar x = 1\n");
    }

    #[test]
    fn test_selector_must_start_an_expression() {
        assert!(references("x := sql.NullInt64{}", "sql"));
        assert!(!references("x := mysql.Open()", "sql"));
        assert!(!references("a.sql.b", "sql"));
    }

    #[test]
    fn test_aliased_type_import() {
        let mut file = GoFile::new("model");
        file.import_for_type("github.com/acme/money/v2", "money.Amount")
            .push("var a money.Amount\n");
        assert!(file.render().contains("\tmoney \"github.com/acme/money/v2\"\n"));
    }

    #[test]
    fn test_struct_alignment() {
        let lines = vec![
            Line::tagged("ID", "uint64", "json:\"id\"").comment("primary"),
            Line::tagged("UserName", "string", "json:\"userName\""),
            Line::Embedded("gorm.Model".into()),
            Line::field("X", "int"),
        ];
        assert_eq!(
            struct_decl("User user", "User", &lines),
            "// User user\ntype User struct {\n\
             \tID       uint64 `json:\"id\"` // primary\n\
             \tUserName string `json:\"userName\"`\n\
             \tgorm.Model\n\
             \tX int\n\
             }\n"
        );
    }

    #[test]
    fn test_empty_struct() {
        assert_eq!(struct_decl("", "Reply", &[]), "type Reply struct{}\n");
    }

    #[test]
    fn test_proto_go_name() {
        assert_eq!(proto_go_name("id"), "Id");
        assert_eq!(proto_go_name("userName"), "UserName");
        assert_eq!(proto_go_name("user_name"), "UserName");
        assert_eq!(proto_go_name("lastID"), "LastID");
    }

    #[test]
    fn test_quote() {
        assert_eq!(quote("a\"b"), "\"a\\\"b\"");
    }
}
