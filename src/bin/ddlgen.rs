//! ddlgen: Go and protobuf artifacts from a CREATE TABLE statement.
//!
//! # Usage
//!
//! ```bash
//! # Render every artifact of one table to stdout
//! ddlgen schema.sql
//!
//! # Extended web API for PostgreSQL, written to ./gen/<table>/
//! ddlgen schema.sql --dialect postgres --web --extended --out-dir gen
//!
//! # Explain the field model
//! ddlgen model schema.sql
//! ```

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use ddlgen::prelude::*;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ddlgen")]
#[command(version)]
#[command(about = "Go and protobuf artifacts from a CREATE TABLE statement", long_about = None)]
#[command(after_help = "EXAMPLES:
    ddlgen schema.sql
    cat user.sql | ddlgen - --dialect postgres --null-policy pointer
    ddlgen schema.sql --web --extended --out-dir gen
    ddlgen model schema.sql --format json")]
struct Cli {
    /// SQL file with one or more CREATE TABLE statements ('-' or omitted reads stdin)
    input: Option<PathBuf>,

    /// Configuration file (default: ./ddlgen.toml, then the user config dir)
    #[arg(short, long, env = "DDLGEN_CONFIG", global = true)]
    config: Option<PathBuf>,

    #[command(flatten)]
    overrides: Overrides,

    /// Write artifacts to <DIR>/<table>/ instead of stdout
    #[arg(short, long)]
    out_dir: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text", global = true)]
    format: OutputFormat,

    /// Verbose output (debug logging)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Flags that override the configuration file.
#[derive(clap::Args)]
struct Overrides {
    /// Storage dialect
    #[arg(short, long, value_enum, global = true)]
    dialect: Option<DialectArg>,

    /// NULL-able column representation
    #[arg(long, value_enum, global = true)]
    null_policy: Option<NullPolicyArg>,

    /// JSON field naming
    #[arg(long, value_enum, global = true)]
    json_naming: Option<NamingArg>,

    /// Prefix stripped from table names
    #[arg(long, global = true)]
    table_prefix: Option<String>,

    /// Prefix stripped from column names
    #[arg(long, global = true)]
    column_prefix: Option<String>,

    /// Native type override, COLUMN=TYPE (repeatable)
    #[arg(long = "field-type", value_name = "COLUMN=TYPE", global = true)]
    field_types: Vec<String>,

    /// Embed the standard id/created_at/updated_at/deleted_at block
    #[arg(long, global = true)]
    embed: bool,

    /// Add HTTP routes and binding annotations to the service schema
    #[arg(long, global = true)]
    web: bool,

    /// Nine-operation service instead of five
    #[arg(long, global = true)]
    extended: bool,

    /// Always emit TableName()
    #[arg(long, global = true)]
    force_table_name: bool,

    /// Go module path imports are rooted at
    #[arg(long, global = true)]
    go_module: Option<String>,
}

#[derive(Clone, Copy, ValueEnum)]
enum DialectArg {
    Mysql,
    Postgres,
    Sqlite,
    Mongodb,
}

impl From<DialectArg> for Dialect {
    fn from(arg: DialectArg) -> Self {
        match arg {
            DialectArg::Mysql => Dialect::MySql,
            DialectArg::Postgres => Dialect::Postgres,
            DialectArg::Sqlite => Dialect::Sqlite,
            DialectArg::Mongodb => Dialect::MongoDb,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum NullPolicyArg {
    Disabled,
    Wrapper,
    Pointer,
}

#[derive(Clone, Copy, ValueEnum)]
enum NamingArg {
    Snake,
    Camel,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the field model and identifier resolution of each table
    Model {
        /// SQL file ('-' or omitted reads stdin)
        input: Option<PathBuf>,
    },
    /// Show how a dialect's native types map to Go and wire types
    Types,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let code = match run(&cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {:#}", "Error:".red().bold(), e);
            1
        }
    };
    std::process::exit(code);
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "ddlgen=debug" } else { "ddlgen=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: &Cli) -> Result<i32> {
    let config = load_config(cli)?;
    debug!(dialect = %config.db_driver, "configuration resolved");
    let ctx = GenContext::new(config);

    match &cli.command {
        Some(Commands::Model { input }) => explain_models(&ctx, input.as_deref(), cli.format),
        Some(Commands::Types) => {
            show_types(&ctx);
            Ok(0)
        }
        None => generate(&ctx, cli),
    }
}

fn load_config(cli: &Cli) -> Result<GenConfig> {
    let mut config = match &cli.config {
        Some(path) => GenConfig::load(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => GenConfig::load_or_default()?,
    };

    let o = &cli.overrides;
    if let Some(dialect) = o.dialect {
        config.db_driver = dialect.into();
    }
    if let Some(policy) = o.null_policy {
        config.null_policy = match policy {
            NullPolicyArg::Disabled => NullPolicy::Disabled,
            NullPolicyArg::Wrapper => NullPolicy::Wrapper,
            NullPolicyArg::Pointer => NullPolicy::Pointer,
        };
    }
    if let Some(naming) = o.json_naming {
        config.json_naming = Some(match naming {
            NamingArg::Snake => NamingConvention::Snake,
            NamingArg::Camel => NamingConvention::Camel,
        });
    }
    if let Some(prefix) = &o.table_prefix {
        config.table_prefix = prefix.clone();
    }
    if let Some(prefix) = &o.column_prefix {
        config.column_prefix = prefix.clone();
    }
    for pair in &o.field_types {
        let (column, native) = pair
            .split_once('=')
            .with_context(|| format!("--field-type expects COLUMN=TYPE, got '{pair}'"))?;
        config
            .field_types
            .insert(column.trim().to_string(), native.trim().to_string());
    }
    if let Some(module) = &o.go_module {
        config.go_module = module.clone();
    }
    config.embed_standard_fields |= o.embed;
    config.web_transport |= o.web;
    config.extended_api |= o.extended;
    config.force_table_name |= o.force_table_name;
    Ok(config)
}

fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) if path != Path::new("-") => std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display())),
        _ => {
            let mut sql = String::new();
            std::io::stdin()
                .read_to_string(&mut sql)
                .context("reading stdin")?;
            Ok(sql)
        }
    }
}

fn generate(ctx: &GenContext, cli: &Cli) -> Result<i32> {
    let sql = read_input(cli.input.as_deref())?;
    let results = ctx.generate_script(&sql);
    if results.is_empty() {
        eprintln!("{}", "No CREATE TABLE statement found.".yellow());
        return Ok(1);
    }

    let mut sets = Vec::new();
    let mut failed = 0;
    for result in results {
        match result {
            Ok(set) => sets.push(set),
            Err(e) => {
                failed += 1;
                eprintln!("{} {}", "✗".red().bold(), e);
            }
        }
    }

    if let Some(dir) = &cli.out_dir {
        for set in &sets {
            write_set(dir, set)?;
        }
    } else if cli.format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&sets)?);
    } else {
        for set in &sets {
            for artifact in set.artifacts.values() {
                println!(
                    "{} {}",
                    format!("// ── {} / {}", set.table, artifact.file_name).dimmed(),
                    format!("({})", artifact.kind).dimmed()
                );
                println!("{}", artifact.text);
            }
        }
    }

    if failed > 0 {
        eprintln!(
            "{} {} of {} table(s) failed",
            "⚠".yellow(),
            failed,
            failed + sets.len()
        );
        return Ok(1);
    }
    Ok(0)
}

fn write_set(dir: &Path, set: &GeneratedSet) -> Result<()> {
    let table_dir = dir.join(&set.table);
    std::fs::create_dir_all(&table_dir)
        .with_context(|| format!("creating {}", table_dir.display()))?;
    for artifact in set.artifacts.values() {
        let path = table_dir.join(&artifact.file_name);
        std::fs::write(&path, &artifact.text)
            .with_context(|| format!("writing {}", path.display()))?;
    }
    let crud_path = table_dir.join("crud_info.json");
    std::fs::write(&crud_path, serde_json::to_string_pretty(&set.crud_info)?)
        .with_context(|| format!("writing {}", crud_path.display()))?;

    info!(table = %set.table, dir = %table_dir.display(), "wrote artifacts");
    println!(
        "{} {} → {}",
        "✓".green(),
        set.table.cyan(),
        table_dir.display()
    );
    Ok(())
}

fn explain_models(ctx: &GenContext, input: Option<&Path>, format: OutputFormat) -> Result<i32> {
    let sql = read_input(input)?;
    let mut models = Vec::new();
    let mut failed = 0;
    for parsed in parse_script(&sql) {
        match parsed.and_then(|table| ctx.build_model(&table)) {
            Ok(model) => models.push(model),
            Err(e) => {
                failed += 1;
                eprintln!("{} {}", "✗".red().bold(), e);
            }
        }
    }

    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&models)?);
    } else {
        for model in &models {
            print_model(model);
        }
    }
    Ok(if failed > 0 { 1 } else { 0 })
}

fn print_model(model: &TableModel) {
    println!(
        "{} {} {}",
        "Table:".green().bold(),
        model.name.cyan().bold(),
        format!("({}, {})", model.raw_name, model.dialect).dimmed()
    );
    if !model.comment.is_empty() {
        println!("  {} {}", "Comment:".dimmed(), model.comment.replace("\n// ", " "));
    }
    if model.needs_table_name {
        println!("  {} {}", "TableName():".dimmed(), model.raw_name.white());
    }
    println!();

    println!(
        "  {:16} {:16} {:22} {:18} {}",
        "Field".white().bold(),
        "JSON".white().bold(),
        "Go".white().bold(),
        "Wire".white().bold(),
        "Flags".white().bold()
    );
    println!("  {}", "─".repeat(86).dimmed());
    for field in &model.fields {
        let wire = field
            .wire_type()
            .map(|w| w.proto_name())
            .unwrap_or_else(|| "-".to_string());
        let mut flags = Vec::new();
        if field.is_primary_key {
            flags.push("pk");
        }
        if field.auto_increment {
            flags.push("auto");
        }
        if field.is_unique {
            flags.push("unique");
        }
        if field.not_null {
            flags.push("not null");
        }
        println!(
            "  {:16} {:16} {:22} {:18} {}",
            field.name.cyan(),
            field.json_name,
            field.go_type().yellow(),
            wire,
            flags.join(",").dimmed()
        );
    }

    let crud = &model.crud;
    println!();
    println!("  {}", "Identifier:".green().bold());
    println!("    {} {}", "Column:".dimmed(), crud.column_name.white());
    let family = if crud.is_common_type {
        format!("custom (…By{})", crud.key.word)
    } else {
        "standard (…ByID)".to_string()
    };
    println!("    {} {}", "Family:".dimmed(), family.cyan());
    println!(
        "    {} {} / {}",
        "Key type:".dimmed(),
        crud.go_type.yellow(),
        crud.wire_type.yellow()
    );
    println!();
}

/// Native → Go → wire mapping under the loaded configuration.
fn show_types(ctx: &GenContext) {
    let dialect = ctx.dialect();
    println!(
        "{} {}",
        "Type mapping for".cyan().bold(),
        dialect.to_string().cyan().bold()
    );
    println!();

    let samples: &[&str] = match dialect {
        Dialect::MySql => &[
            "tinyint(1)", "tinyint", "smallint", "int", "bigint unsigned", "float", "double",
            "decimal(10,2)", "varchar(255)", "text", "enum('a','b')", "blob", "bit(1)", "year",
            "date", "datetime", "timestamp", "json",
        ],
        Dialect::Postgres => &[
            "boolean", "smallint", "integer", "bigint", "serial", "bigserial", "real",
            "double precision", "numeric(12,4)", "money", "varchar(64)", "text", "uuid", "inet",
            "bytea", "timestamptz", "interval", "jsonb", "int4[]", "_text",
        ],
        Dialect::Sqlite => &[
            "integer", "int", "real", "numeric", "text", "blob", "boolean", "datetime", "json",
        ],
        Dialect::MongoDb => &[
            "primitive.ObjectID", "string", "int", "int64", "float64", "bool", "time.Time",
            "[]byte", "[]string", "[]primitive.ObjectID", "map[string]interface{}", "bson.M",
            "*Address",
        ],
    };

    println!(
        "{:24} {:26} {:20} {}",
        "Native".white().bold(),
        "Go".white().bold(),
        "Wire".white().bold(),
        "Rewrite".white().bold()
    );
    println!("{}", "─".repeat(80).dimmed());

    for sample in samples {
        let field = match ctx.sample_field(sample) {
            Ok(field) => field,
            Err(_) => {
                println!("{:24} {}", sample.red(), "unknown".red());
                continue;
            }
        };
        println!(
            "{:24} {:26} {:20} {}",
            sample.cyan(),
            field.go_type().yellow(),
            field
                .wire_type()
                .map(|w| w.proto_name())
                .unwrap_or_else(|| "-".to_string()),
            field.rewrite.map(|r| r.module).unwrap_or_default().dimmed()
        );
    }
}
