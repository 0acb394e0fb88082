//! DDL parser using nom.
//!
//! Parses one `CREATE TABLE` statement (or a script of them) into a
//! [`CreateTable`].
//!
//! # Accepted shape
//!
//! ```text
//! CREATE [TEMPORARY] TABLE [IF NOT EXISTS] [schema.]name (
//!     column [[NATIONAL] type[(len[,scale])][[]] [UNSIGNED]] [options...],
//!     PRIMARY KEY (col, ...),
//!     UNIQUE [KEY] [name] (col),
//!     KEY name (col, ...),
//!     ...
//! ) [COMMENT [=] 'text'] [other table options]
//! ```
//!
//! Column and table options this generator has no use for are skipped token
//! by token rather than rejected.

use nom::{
    branch::alt,
    bytes::complete::{tag, tag_no_case, take_while, take_while1},
    character::complete::{char, digit0, digit1, multispace0, multispace1, one_of, satisfy},
    combinator::{map, map_res, not, opt, recognize, value},
    error::{Error, ErrorKind},
    multi::{many0, separated_list0, separated_list1},
    sequence::{delimited, pair, preceded, terminated, tuple},
    IResult,
};
use tracing::debug;

use crate::ast::*;
use crate::error::{GenError, GenResult};

/// Parse a single `CREATE TABLE` statement.
pub fn parse_create_table(sql: &str) -> GenResult<CreateTable> {
    let stripped = strip_comments(sql);
    let text = stripped.trim().trim_end_matches(';').trim_end();

    match create_table(text) {
        Ok((rest, mut table)) => {
            if !rest.trim().is_empty() {
                return Err(GenError::parse(
                    text.len() - rest.len(),
                    format!("unexpected trailing content '{}'", snippet(rest)),
                    text,
                ));
            }
            fold_constraints(&mut table);
            Ok(table)
        }
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => {
            let position = text.len() - e.input.len();
            let message = if position == 0 {
                "expected CREATE TABLE".to_string()
            } else if e.input.is_empty() {
                "unexpected end of statement".to_string()
            } else {
                format!("unexpected input '{}'", snippet(e.input))
            };
            Err(GenError::parse(position, message, text))
        }
        Err(nom::Err::Incomplete(_)) => Err(GenError::parse(
            text.len(),
            "unexpected end of statement",
            text,
        )),
    }
}

/// Parse a script of statements.
///
/// Every `CREATE TABLE` yields one entry, failures included, so a caller can
/// carry on with the tables that did parse. `COMMENT ON TABLE|COLUMN` statements
/// are applied to the table they name. Anything else is skipped.
pub fn parse_script(sql: &str) -> Vec<GenResult<CreateTable>> {
    let stripped = strip_comments(sql);
    let mut tables: Vec<GenResult<CreateTable>> = Vec::new();

    for statement in split_statements(&stripped) {
        if create_table_head(statement).is_ok() {
            tables.push(parse_create_table(statement));
            continue;
        }
        match comment_on(statement) {
            Ok((_, target)) => apply_comment(&mut tables, target),
            Err(_) => debug!(statement = %snippet(statement), "skipping statement"),
        }
    }
    tables
}

/// Split a script on `;` outside quotes. Empty statements are dropped.
pub fn split_statements(sql: &str) -> Vec<&str> {
    let mut statements = Vec::new();
    let mut quote: Option<char> = None;
    let mut start = 0;
    let mut chars = sql.char_indices();
    while let Some((i, c)) = chars.next() {
        match quote {
            Some('\'') if c == '\\' => {
                chars.next();
            }
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None => match c {
                '\'' | '"' | '`' => quote = Some(c),
                ';' => {
                    statements.push(&sql[start..i]);
                    start = i + 1;
                }
                _ => {}
            },
        }
    }
    statements.push(&sql[start..]);
    statements
        .into_iter()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Parse a standalone column type such as `decimal(10,2)` or `text[]`.
pub fn parse_native_type(text: &str) -> Option<NativeType> {
    match column_type(text.trim()) {
        Ok(("", native)) => Some(native),
        _ => None,
    }
}

/// Blank out `--`, `#` and `/* */` comments outside string literals.
///
/// Comment bytes become spaces (newlines are kept) so positions in the result
/// still line up with the input.
pub fn strip_comments(sql: &str) -> String {
    enum State {
        Code,
        Quoted(char),
        Line,
        Block,
    }

    let mut out = String::with_capacity(sql.len());
    let mut state = State::Code;
    let mut chars = sql.chars().peekable();
    let blank = |out: &mut String, c: char| {
        if c == '\n' {
            out.push('\n');
        } else {
            out.extend(std::iter::repeat_n(' ', c.len_utf8()));
        }
    };

    while let Some(c) = chars.next() {
        match state {
            State::Code => match c {
                '\'' | '"' | '`' => {
                    state = State::Quoted(c);
                    out.push(c);
                }
                '-' if chars.peek() == Some(&'-') => {
                    state = State::Line;
                    blank(&mut out, c);
                }
                '#' => {
                    state = State::Line;
                    blank(&mut out, c);
                }
                '/' if chars.peek() == Some(&'*') => {
                    chars.next();
                    state = State::Block;
                    out.push_str("  ");
                }
                _ => out.push(c),
            },
            State::Quoted(q) => {
                out.push(c);
                if c == '\\' && q == '\'' {
                    if let Some(escaped) = chars.next() {
                        out.push(escaped);
                    }
                } else if c == q {
                    state = State::Code;
                }
            }
            State::Line => {
                if c == '\n' {
                    state = State::Code;
                }
                blank(&mut out, c);
            }
            State::Block => {
                if c == '*' && chars.peek() == Some(&'/') {
                    chars.next();
                    state = State::Code;
                    out.push_str("  ");
                } else {
                    blank(&mut out, c);
                }
            }
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Statement level
// ---------------------------------------------------------------------------

enum Item {
    Column(ColumnDef),
    Constraint(TableConstraint),
}

fn create_table_head(input: &str) -> IResult<&str, ()> {
    let (input, _) = tuple((
        multispace0,
        kw("create"),
        multispace1,
        opt(terminated(
            alt((kw("temporary"), kw("temp"), kw("unlogged"))),
            multispace1,
        )),
        kw("table"),
        multispace1,
        opt(terminated(kws(&["if", "not", "exists"]), multispace1)),
    ))(input)?;
    Ok((input, ()))
}

fn create_table(input: &str) -> IResult<&str, CreateTable> {
    let (input, _) = create_table_head(input)?;
    let (input, name) = qualified_name(input)?;
    let (input, _) = multispace0(input)?;
    let (input, _) = char('(')(input)?;
    let (input, items) =
        separated_list0(char(','), delimited(multispace0, table_item, multispace0))(input)?;
    let (input, _) = multispace0(input)?;
    let (input, _) = char(')')(input)?;
    let (input, comment) = table_options(input)?;

    let mut columns = Vec::new();
    let mut constraints = Vec::new();
    for item in items {
        match item {
            Item::Column(column) => columns.push(column),
            Item::Constraint(constraint) => constraints.push(constraint),
        }
    }

    Ok((
        input,
        CreateTable {
            name,
            columns,
            constraints,
            comment,
        },
    ))
}

fn table_item(input: &str) -> IResult<&str, Item> {
    alt((
        map(table_constraint, Item::Constraint),
        map(column_def, Item::Column),
    ))(input)
}

/// `COMMENT [=] 'text'` is kept; every other table option is skipped.
fn table_options(input: &str) -> IResult<&str, Option<String>> {
    let (input, options) = many0(preceded(
        multispace0,
        alt((
            map(
                preceded(
                    tuple((kw("comment"), multispace0, opt(char('=')), multispace0)),
                    quoted('\''),
                ),
                Some,
            ),
            value(None, char(',')),
            value(None, ignored_token),
        )),
    ))(input)?;
    Ok((input, options.into_iter().flatten().last()))
}

/// Fold table-level PRIMARY KEY and single-column UNIQUE into the columns.
fn fold_constraints(table: &mut CreateTable) {
    let primary: Vec<String> = table.primary_key_columns().map(str::to_string).collect();
    let unique: Vec<String> = table.unique_columns().map(str::to_string).collect();
    for name in primary {
        if let Some(column) = table.column_mut(&name) {
            column.primary_key = true;
        }
    }
    for name in unique {
        if let Some(column) = table.column_mut(&name) {
            column.unique = true;
        }
    }
}

enum CommentTarget {
    Table(String, Option<String>),
    Column(String, String, Option<String>),
}

fn comment_on(input: &str) -> IResult<&str, CommentTarget> {
    let (input, _) = tuple((kws(&["comment", "on"]), multispace1))(input)?;
    let (input, is_column) = alt((
        value(false, kw("table")),
        value(true, kw("column")),
    ))(input)?;
    let (input, _) = multispace1(input)?;
    let (input, path) = separated_list1(char('.'), identifier)(input)?;
    let (input, _) = tuple((multispace1, kw("is"), multispace0))(input)?;
    let (input, text) = alt((map(quoted('\''), Some), value(None, kw("null"))))(input)?;

    let target = if is_column {
        if path.len() < 2 {
            return Err(nom::Err::Error(Error::new(input, ErrorKind::Verify)));
        }
        let column = path[path.len() - 1].clone();
        let table = path[path.len() - 2].clone();
        CommentTarget::Column(table, column, text)
    } else {
        let table = path.last().cloned().unwrap_or_default();
        CommentTarget::Table(table, text)
    };
    Ok((input, target))
}

fn apply_comment(tables: &mut [GenResult<CreateTable>], target: CommentTarget) {
    let table_name = match &target {
        CommentTarget::Table(t, _) | CommentTarget::Column(t, _, _) => t.clone(),
    };
    let Some(table) = tables
        .iter_mut()
        .filter_map(|t| t.as_mut().ok())
        .find(|t| t.name.eq_ignore_ascii_case(&table_name))
    else {
        debug!(table = %table_name, "COMMENT ON for unknown table");
        return;
    };
    match target {
        CommentTarget::Table(_, text) => table.comment = text,
        CommentTarget::Column(_, column, text) => {
            if let Some(column) = table.column_mut(&column) {
                column.comment = text;
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Table constraints
// ---------------------------------------------------------------------------

fn table_constraint(input: &str) -> IResult<&str, TableConstraint> {
    let (input, _) = opt(tuple((kw("constraint"), multispace1, identifier, multispace0)))(input)?;
    let (input, constraint) = alt((
        map(
            preceded(pair(kws(&["primary", "key"]), index_name), key_columns),
            TableConstraint::PrimaryKey,
        ),
        map(
            preceded(
                tuple((
                    kw("unique"),
                    opt(preceded(multispace1, alt((kw("key"), kw("index"))))),
                    index_name,
                )),
                key_columns,
            ),
            TableConstraint::Unique,
        ),
        map(
            preceded(pair(alt((kw("key"), kw("index"))), index_name), key_columns),
            TableConstraint::Index,
        ),
        value(
            TableConstraint::Other,
            alt((
                kw("fulltext"),
                kw("spatial"),
                kw("foreign"),
                kw("check"),
                kw("exclude"),
            )),
        ),
    ))(input)?;
    let (input, _) = ignored_tail(input)?;
    Ok((input, constraint))
}

fn index_name(input: &str) -> IResult<&str, Option<String>> {
    opt(preceded(multispace1, identifier))(input)
}

fn key_columns(input: &str) -> IResult<&str, Vec<String>> {
    preceded(
        multispace0,
        delimited(
            char('('),
            separated_list1(char(','), delimited(multispace0, key_part, multispace0)),
            char(')'),
        ),
    )(input)
}

/// `col`, `col(10)` prefix length, `col DESC`.
fn key_part(input: &str) -> IResult<&str, String> {
    terminated(
        identifier,
        many0(preceded(
            multispace0,
            alt((
                value((), paren_group),
                value((), kw("asc")),
                value((), kw("desc")),
            )),
        )),
    )(input)
}

// ---------------------------------------------------------------------------
// Columns
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
enum ColumnOption {
    NotNull,
    Default(String),
    AutoIncrement,
    PrimaryKey,
    Unique,
    Comment(String),
    Ignored,
}

fn column_def(input: &str) -> IResult<&str, ColumnDef> {
    let (input, name) = identifier(input)?;
    let (input, _) = multispace0(input)?;
    // SQLite lets a column go without a declared type.
    let (input, native) = opt(preceded(not(constraint_keyword), column_type))(input)?;
    let (input, options) = many0(preceded(multispace0, column_option))(input)?;

    let mut column = ColumnDef::new(name, native.unwrap_or_default());
    column.auto_increment = column.native.implies_auto_increment();
    for option in options {
        match option {
            ColumnOption::NotNull => column.not_null = true,
            ColumnOption::Default(expr) => column.default = Some(expr),
            ColumnOption::AutoIncrement => column.auto_increment = true,
            ColumnOption::PrimaryKey => column.primary_key = true,
            ColumnOption::Unique => column.unique = true,
            ColumnOption::Comment(text) => column.comment = Some(text),
            ColumnOption::Ignored => {}
        }
    }
    Ok((input, column))
}

fn column_option(input: &str) -> IResult<&str, ColumnOption> {
    alt((
        value(ColumnOption::NotNull, kws(&["not", "null"])),
        map(
            preceded(pair(kw("default"), multispace0), default_expr),
            |expr| ColumnOption::Default(expr.to_string()),
        ),
        value(
            ColumnOption::AutoIncrement,
            alt((kw("auto_increment"), kw("autoincrement"))),
        ),
        value(ColumnOption::AutoIncrement, identity),
        value(ColumnOption::PrimaryKey, kws(&["primary", "key"])),
        value(
            ColumnOption::Unique,
            pair(kw("unique"), opt(preceded(multispace1, kw("key")))),
        ),
        map(
            preceded(pair(kw("comment"), multispace0), quoted('\'')),
            ColumnOption::Comment,
        ),
        value(ColumnOption::Ignored, ignored_token),
    ))(input)
}

/// A word that opens a column constraint, never a type.
fn constraint_keyword(input: &str) -> IResult<&str, &str> {
    alt((
        kw("primary"),
        kw("not"),
        kw("null"),
        kw("default"),
        kw("unique"),
        kw("check"),
        kw("references"),
        kw("constraint"),
        kw("collate"),
        kw("generated"),
        kw("as"),
        kw("auto_increment"),
        kw("autoincrement"),
        kw("comment"),
    ))(input)
}

/// `GENERATED {ALWAYS | BY DEFAULT} AS IDENTITY [(...)]`
fn identity(input: &str) -> IResult<&str, ()> {
    let (input, _) = tuple((
        kw("generated"),
        multispace1,
        alt((kws(&["always"]), kws(&["by", "default"]))),
        multispace1,
        kws(&["as", "identity"]),
        opt(preceded(multispace0, paren_group)),
    ))(input)?;
    Ok((input, ()))
}

fn default_expr(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        alt((
            recognize(pair(alt((tag_no_case("b"), tag_no_case("x"))), quoted('\''))),
            recognize(quoted('\'')),
            recognize(tuple((
                opt(one_of("+-")),
                digit1,
                opt(pair(char('.'), digit0)),
            ))),
            paren_group,
            recognize(pair(
                take_while1(is_ident_char),
                opt(preceded(multispace0, paren_group)),
            )),
        )),
        many0(pair(tag("::"), type_word)),
    ))(input)
}

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
enum TypeArgs {
    Size(u32, Option<u32>),
    Values(Vec<String>),
    Other,
}

fn column_type(input: &str) -> IResult<&str, NativeType> {
    let (input, national) = opt(terminated(kw("national"), multispace1))(input)?;
    let (input, word) = type_word(input)?;
    let mut native = NativeType::named(word);
    if !word.starts_with("[]") {
        if let Some(base) = word.strip_suffix("[]") {
            native.name = base.to_string();
            native.array = true;
        }
    }
    if national.is_some() {
        native.name = format!("national {}", native.name.to_ascii_lowercase());
    }

    let (input, continuation) = opt(preceded(
        multispace1,
        alt((kw("precision"), kw("varying"))),
    ))(input)?;
    if let Some(extra) = continuation {
        native.name = format!("{} {}", native.name, extra.to_ascii_lowercase());
    }

    let (input, args) = opt(preceded(multispace0, type_args))(input)?;
    match args {
        Some(TypeArgs::Size(length, scale)) => {
            native.length = Some(length);
            native.scale = scale;
        }
        Some(TypeArgs::Values(values)) => native.values = values,
        Some(TypeArgs::Other) | None => {}
    }

    let (input, zone) = opt(preceded(
        multispace1,
        terminated(
            alt((kw("with"), kw("without"))),
            tuple((multispace1, kw("time"), multispace1, kw("zone"))),
        ),
    ))(input)?;
    if let Some(with) = zone {
        native.name = format!("{} {} time zone", native.name, with.to_ascii_lowercase());
    }

    let (input, array) = opt(preceded(multispace0, tag("[]")))(input)?;
    if array.is_some() {
        native.array = true;
    }

    let (input, modifiers) = many0(preceded(
        multispace1,
        alt((kw("unsigned"), kw("signed"), kw("zerofill"))),
    ))(input)?;
    if modifiers.iter().any(|m| m.eq_ignore_ascii_case("unsigned")) {
        native.unsigned = true;
    }

    Ok((input, native))
}

/// A type token. Also admits Go spellings such as `[]string` or `*Address`.
fn type_word(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| {
        c.is_alphanumeric() || matches!(c, '_' | '.' | '[' | ']' | '*' | '{' | '}')
    })(input)
}

fn type_args(input: &str) -> IResult<&str, TypeArgs> {
    alt((
        delimited(
            pair(char('('), multispace0),
            alt((
                map(
                    separated_list1(
                        delimited(multispace0, char(','), multispace0),
                        quoted('\''),
                    ),
                    TypeArgs::Values,
                ),
                map(
                    pair(
                        number,
                        opt(preceded(delimited(multispace0, char(','), multispace0), number)),
                    ),
                    |(length, scale)| TypeArgs::Size(length, scale),
                ),
            )),
            pair(multispace0, char(')')),
        ),
        value(TypeArgs::Other, paren_group),
    ))(input)
}

fn number(input: &str) -> IResult<&str, u32> {
    map_res(digit1, str::parse::<u32>)(input)
}

// ---------------------------------------------------------------------------
// Lexical helpers
// ---------------------------------------------------------------------------

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

/// Case-insensitive keyword that does not run into a longer identifier.
fn kw<'a>(word: &'static str) -> impl Fn(&'a str) -> IResult<&'a str, &'a str> {
    move |input: &'a str| {
        let (rest, matched) = tag_no_case(word)(input)?;
        let (rest, _) = not(satisfy(is_ident_char))(rest)?;
        Ok((rest, matched))
    }
}

/// A run of keywords separated by whitespace, e.g. `NOT NULL`.
fn kws<'a>(words: &'static [&'static str]) -> impl Fn(&'a str) -> IResult<&'a str, ()> {
    move |mut input: &'a str| {
        for (i, word) in words.iter().enumerate() {
            if i > 0 {
                input = multispace1(input)?.0;
            }
            input = kw(*word)(input)?.0;
        }
        Ok((input, ()))
    }
}

fn identifier(input: &str) -> IResult<&str, String> {
    alt((
        quoted('`'),
        quoted('"'),
        map(
            delimited(char('['), take_while1(|c: char| c != ']'), char(']')),
            str::to_string,
        ),
        map(
            recognize(pair(
                satisfy(|c| c.is_alphabetic() || c == '_'),
                take_while(is_ident_char),
            )),
            str::to_string,
        ),
    ))(input)
}

/// `schema.table` resolves to `table`.
fn qualified_name(input: &str) -> IResult<&str, String> {
    map(separated_list1(char('.'), identifier), |mut parts| {
        parts.pop().unwrap_or_default()
    })(input)
}

/// Text between `q` quotes. A doubled quote stands for itself; single-quoted
/// strings also take backslash escapes.
fn quoted<'a>(q: char) -> impl Fn(&'a str) -> IResult<&'a str, String> {
    move |input: &'a str| {
        let (mut rest, _) = char(q)(input)?;
        let mut out = String::new();
        loop {
            let mut chars = rest.chars();
            match chars.next() {
                None => return Err(nom::Err::Error(Error::new(input, ErrorKind::Char))),
                Some(c) if c == q => {
                    let after = &rest[c.len_utf8()..];
                    if after.starts_with(q) {
                        out.push(q);
                        rest = &after[q.len_utf8()..];
                    } else {
                        return Ok((after, out));
                    }
                }
                Some('\\') if q == '\'' => {
                    let Some(escaped) = chars.next() else {
                        return Err(nom::Err::Error(Error::new(input, ErrorKind::Char)));
                    };
                    out.push(match escaped {
                        'n' => '\n',
                        't' => '\t',
                        'r' => '\r',
                        '0' => '\0',
                        other => other,
                    });
                    rest = &rest[1 + escaped.len_utf8()..];
                }
                Some(c) => {
                    out.push(c);
                    rest = &rest[c.len_utf8()..];
                }
            }
        }
    }
}

/// A balanced `( ... )` group, quotes respected.
fn paren_group(input: &str) -> IResult<&str, &str> {
    char('(')(input)?;
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut chars = input.char_indices();
    while let Some((i, c)) = chars.next() {
        match quote {
            Some('\'') if c == '\\' => {
                chars.next();
            }
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None => match c {
                '\'' | '"' | '`' => quote = Some(c),
                '(' => depth += 1,
                ')' => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok((&input[i + 1..], &input[..i + 1]));
                    }
                }
                _ => {}
            },
        }
    }
    Err(nom::Err::Error(Error::new(input, ErrorKind::Char)))
}

/// One token of an option we do not interpret. Never consumes `,` or `)`.
fn ignored_token(input: &str) -> IResult<&str, ()> {
    alt((
        value((), quoted('\'')),
        value((), quoted('"')),
        value((), quoted('`')),
        value((), paren_group),
        value((), take_while1(is_ident_char)),
        value(
            (),
            take_while1(|c: char| {
                !c.is_alphanumeric()
                    && !c.is_whitespace()
                    && !matches!(c, ',' | '(' | ')' | '\'' | '"' | '`' | '_' | '$' | ';')
            }),
        ),
    ))(input)
}

fn ignored_tail(input: &str) -> IResult<&str, ()> {
    value((), many0(preceded(multispace0, ignored_token)))(input)
}

fn snippet(s: &str) -> String {
    let flat = s.trim();
    if flat.chars().count() > 24 {
        let head: String = flat.chars().take(24).collect();
        format!("{head}…")
    } else {
        flat.to_string()
    }
}
