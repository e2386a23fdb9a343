use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use comfy_table::Table;
use configuration::{DatabaseArgs, load_config, load_config_from};
use core_types::{CourseSection, Row, SqlValue};
use database::{DataService, MySqlDataService, QueryRequest, QueryResult, Session};
use std::convert::Infallible;
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// When set, logs go to a daily rolling file in this directory instead of stderr.
const LOG_DIR_ENV: &str = "DATASERVICE_LOG_DIR";

/// The main entry point for the data service command-line tool.
#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let cli = Cli::parse();
    let _log_guard = init_logging();

    let mut config = match &cli.config {
        Some(path) => load_config_from(path)
            .with_context(|| format!("Failed to load {}", path.display()))?,
        None => load_config().context("Failed to load configuration")?,
    };
    cli.database.apply(&mut config);
    let service = MySqlDataService::new(config);

    // Execute the appropriate command
    match cli.command {
        Commands::Query(args) => handle_query(&service, args).await,
        Commands::Get(args) => handle_get(&service, args).await,
        Commands::Course(args) => handle_course(&service, args).await,
    }
}

fn init_logging() -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match std::env::var_os(LOG_DIR_ENV) {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "dataservice.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(writer)
                .with_ansi(false)
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
            None
        }
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Runs parameterized queries and record lookups against a MySQL database.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// TOML file whose top-level keys override configuration (default: ./dataservice.toml if present).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(flatten)]
    database: DatabaseArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one SQL statement with positional (`%s` or `?`) parameters.
    Query(QueryArgs),
    /// Fetch one record by key.
    Get(GetArgs),
    /// Fetch one course section by its course_id.
    Course(CourseArgs),
}

#[derive(Clone, Copy, Default, ValueEnum)]
enum OutputFormat {
    #[default]
    Json,
    Table,
}

#[derive(Parser)]
struct QueryArgs {
    /// The SQL statement.
    sql: String,

    /// A parameter value; repeat for each placeholder, in order.
    /// `null`, `true`, `false` and numbers are typed, anything else is text.
    #[arg(long = "param", value_parser = parse_param)]
    params: Vec<SqlValue>,

    /// Print the affected-row count instead of the result rows.
    #[arg(long)]
    no_results: bool,

    /// Do not commit; the statement's connection is also opened without autocommit.
    #[arg(long)]
    no_commit: bool,

    #[arg(long, value_enum, default_value_t)]
    format: OutputFormat,
}

#[derive(Parser)]
struct GetArgs {
    database: String,
    table: String,
    key_field: String,
    key_value: String,

    #[arg(long, value_enum, default_value_t)]
    format: OutputFormat,
}

#[derive(Parser)]
struct CourseArgs {
    database: String,
    table: String,
    course_id: i64,
}

// ==============================================================================
// Command Logic
// ==============================================================================

async fn handle_query(service: &MySqlDataService, args: QueryArgs) -> Result<()> {
    let request = QueryRequest::new(args.sql)
        .params(args.params)
        .return_results(!args.no_results)
        .commit(!args.no_commit);

    match service.run_query(&request, Session::Fresh).await? {
        QueryResult::Rows(rows) => print_rows(&rows, args.format)?,
        QueryResult::Affected(count) => println!("{} row(s) affected", count),
    }
    Ok(())
}

async fn handle_get(service: &MySqlDataService, args: GetArgs) -> Result<()> {
    let record = service
        .get_data_object(&args.database, &args.table, &args.key_field, &args.key_value)
        .await?;

    match record {
        Some(row) => print_rows(&[row], args.format),
        None => {
            println!("No record with {} = {}", args.key_field, args.key_value);
            Ok(())
        }
    }
}

async fn handle_course(service: &MySqlDataService, args: CourseArgs) -> Result<()> {
    let record = service
        .get_data_object(&args.database, &args.table, "course_id", &args.course_id.to_string())
        .await?
        .with_context(|| format!("No course section with course_id {}", args.course_id))?;

    let section = CourseSection::from_row(&record)?;
    println!("{}", serde_json::to_string_pretty(&section)?);
    Ok(())
}

fn print_rows(rows: &[Row], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(rows)?),
        OutputFormat::Table => println!("{}", render_table(rows)),
    }
    Ok(())
}

/// Renders rows as a table whose columns are those of the first row.
fn render_table(rows: &[Row]) -> String {
    let Some(first) = rows.first() else {
        return "(no rows)".to_string();
    };

    let columns: Vec<&str> = first.column_names().collect();
    let mut table = Table::new();
    table.set_header(columns.clone());
    for row in rows {
        table.add_row(
            columns
                .iter()
                .map(|column| row.get(column).map(ToString::to_string).unwrap_or_default()),
        );
    }
    table.to_string()
}

fn parse_param(raw: &str) -> Result<SqlValue, Infallible> {
    if raw.eq_ignore_ascii_case("null") {
        return Ok(SqlValue::Null);
    }
    if let Ok(flag) = raw.parse::<bool>() {
        return Ok(SqlValue::Bool(flag));
    }
    if let Ok(v) = raw.parse::<i64>() {
        return Ok(SqlValue::Int(v));
    }
    if let Ok(v) = raw.parse::<u64>() {
        return Ok(SqlValue::UInt(v));
    }
    // `f64` also parses words like "inf" and "NaN"; those stay text.
    if raw.bytes().any(|b| b.is_ascii_digit()) {
        if let Ok(v) = raw.parse::<f64>() {
            return Ok(SqlValue::Float(v));
        }
    }
    Ok(SqlValue::Text(raw.to_string()))
}
