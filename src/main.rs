use std::io::{self, Read};
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use sql_fragments::{
    AnsiDialect, Dialect, FormatOptions, FormatStyle, FunctionRegistry, MySqlDialect,
    SqlServerDialect, StaticColumnMapper, TranslationContext, format_sql, translate_order_by,
};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Log at debug level regardless of RUST_LOG
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Pretty-print SQL statements given as arguments, or read from stdin
    Format {
        /// Spaces per indentation level
        #[arg(long, default_value_t = 4)]
        indent: usize,

        /// Formatting style
        #[arg(long, value_enum, default_value_t = FormatStyle::Basic)]
        style: FormatStyle,

        sql: Vec<String>,
    },
    /// Translate an order-by mapping fragment into SQL
    OrderBy {
        fragment: String,

        /// Table alias qualifying column references
        #[arg(long)]
        alias: Option<String>,

        /// Property mapping, e.g. `name=first_name,last_name`
        #[arg(long = "map", value_parser = parse_mapping)]
        mappings: Vec<(String, Vec<String>)>,

        #[arg(long, value_enum, default_value_t = DialectName::Ansi)]
        dialect: DialectName,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum DialectName {
    Ansi,
    Mysql,
    Sqlserver,
}

fn parse_mapping(raw: &str) -> Result<(String, Vec<String>), String> {
    let (property, columns) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected PROPERTY=COLUMN[,COLUMN...], got `{raw}`"))?;
    let columns: Vec<String> = columns
        .split(',')
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(String::from)
        .collect();
    if property.trim().is_empty() || columns.is_empty() {
        return Err(format!("expected PROPERTY=COLUMN[,COLUMN...], got `{raw}`"));
    }
    Ok((property.trim().to_string(), columns))
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn fail(message: &str) -> ! {
    eprintln!("Error: {}", message);
    process::exit(1);
}

fn run_format(indent: usize, style: FormatStyle, sql: Vec<String>) {
    let statements = if sql.is_empty() {
        let mut input = String::new();
        if let Err(e) = io::stdin().read_to_string(&mut input) {
            fail(&format!("reading stdin: {}", e));
        }
        vec![input]
    } else {
        sql
    };

    if statements.iter().all(|s| s.trim().is_empty()) {
        fail("no SQL input provided");
    }

    let options = FormatOptions::default()
        .with_indent_unit(" ".repeat(indent))
        .with_style(style);
    for statement in statements.iter().filter(|s| !s.trim().is_empty()) {
        println!("{}", format_sql(statement, &options));
    }
}

fn run_order_by(
    fragment: &str,
    alias: Option<&str>,
    mappings: Vec<(String, Vec<String>)>,
    dialect: DialectName,
) {
    if fragment.trim().is_empty() {
        fail("no SQL input provided");
    }

    let mapper = mappings
        .into_iter()
        .fold(StaticColumnMapper::new(), |mapper, (property, columns)| {
            mapper.with_columns(&property, columns)
        });
    let dialect: &dyn Dialect = match dialect {
        DialectName::Ansi => &AnsiDialect,
        DialectName::Mysql => &MySqlDialect,
        DialectName::Sqlserver => &SqlServerDialect,
    };
    let functions = FunctionRegistry::new();
    let context = TranslationContext::new(dialect, &mapper, &functions);

    match translate_order_by(fragment, &context) {
        Ok(translation) => {
            debug!(template = translation.template(), "translated fragment");
            let rendered = match alias {
                Some(alias) => translation.render_with_alias(alias),
                None => translation.render_unqualified(),
            };
            println!("{}", rendered);
        }
        Err(e) => fail(&e.to_string()),
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Format { indent, style, sql } => run_format(indent, style, sql),
        Command::OrderBy {
            fragment,
            alias,
            mappings,
            dialect,
        } => run_order_by(&fragment, alias.as_deref(), mappings, dialect),
    }
}
