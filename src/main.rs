use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use tracing::{debug, error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use ormgen::codegen::{CodeGenConfig, CodeGenerator, OutputMode, ProtobufGenerator, RustGenerator};
use ormgen::config::DbConfig;
use ormgen::introspect::TableFilter;
use ormgen::schema::Schema;

#[derive(Debug, Clone, ValueEnum)]
enum Database {
    Mysql,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Emit {
    /// Rust data access modules
    Rust,
    /// Protobuf messages
    Proto,
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum CliOutputMode {
    /// One file per table
    #[default]
    Library,
    /// Single file with all tables
    Flat,
}

impl From<CliOutputMode> for OutputMode {
    fn from(mode: CliOutputMode) -> Self {
        match mode {
            CliOutputMode::Library => OutputMode::Library,
            CliOutputMode::Flat => OutputMode::Flat,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "ormgen")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Target database type
    database: Database,

    /// Comma-separated list of artifacts to emit
    #[arg(long, value_enum, value_delimiter = ',', default_value = "rust,proto")]
    emit: Vec<Emit>,

    /// Output directory
    #[arg(short, long, default_value = "./schema")]
    output: PathBuf,

    /// Output mode
    #[arg(long, value_enum, default_value_t = CliOutputMode::Library)]
    mode: CliOutputMode,

    /// Protobuf package name
    #[arg(long, default_value = "schema")]
    package: String,

    /// Path generated Rust code imports the runtime from
    #[arg(long, default_value = "ormgen::orm")]
    runtime_path: String,

    /// Database schema to introspect (default: DB_NAME)
    #[arg(long)]
    schema: Option<String>,

    /// Path to .env file for connection config
    #[arg(long, default_value = "./.env")]
    env_file: PathBuf,

    /// Comma-separated list of tables to include (default: all)
    #[arg(long, value_delimiter = ',')]
    tables: Option<Vec<String>>,

    /// Comma-separated list of tables to exclude
    #[arg(long, value_delimiter = ',')]
    exclude: Option<Vec<String>>,

    /// Verbose output (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() {
    if let Err(e) = run() {
        error!(error = ?e, "Fatal error");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    info!("ormgen v{}", env!("CARGO_PKG_VERSION"));
    info!(
        database = ?cli.database,
        emit = ?cli.emit,
        output = ?cli.output,
        mode = ?cli.mode,
        "Starting code generation"
    );

    // Load configuration
    let config = DbConfig::load(&cli.env_file).context("Failed to load database configuration")?;
    debug!(connection = ?config.redacted_url(), "Loaded configuration");

    let schema_name = cli.schema.clone().unwrap_or_else(|| config.database.clone());

    // Build table filter
    let filter = TableFilter {
        include: cli.tables.clone(),
        exclude: cli.exclude.clone(),
    };

    if !filter.is_empty() {
        debug!(filter = ?filter, "Table filter configured");
    }

    // Introspect database
    let schema = introspect_database(&cli.database, &config, &schema_name, &filter)?;

    if schema.tables.is_empty() {
        warn!("No tables found after filtering");
        return Ok(());
    }

    info!(tables = ?schema.tables.len(), "Schema ready for code generation");

    let codegen_config = CodeGenConfig::new(cli.output.clone())
        .with_output_mode(cli.mode.into())
        .with_package(cli.package.clone())
        .with_runtime_path(cli.runtime_path.clone());
    debug!(codegen_config = ?codegen_config, "Code generation config");

    let mut written = Vec::new();
    if cli.emit.contains(&Emit::Rust) {
        written.extend(
            RustGenerator::new()
                .generate(&schema, &codegen_config)
                .context("Failed to generate Rust code")?,
        );
    }
    if cli.emit.contains(&Emit::Proto) {
        written.extend(
            ProtobufGenerator::new()
                .generate(&schema, &codegen_config)
                .context("Failed to generate protobuf schema")?,
        );
    }

    info!(files = written.len(), output = ?cli.output, "Code generation complete");

    Ok(())
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

fn introspect_database(
    database: &Database,
    config: &DbConfig,
    schema_name: &str,
    filter: &TableFilter,
) -> Result<Schema> {
    match database {
        Database::Mysql => introspect_mysql(config, schema_name, filter),
    }
}

#[cfg(feature = "mysql")]
fn introspect_mysql(config: &DbConfig, schema_name: &str, filter: &TableFilter) -> Result<Schema> {
    use ormgen::introspect::{connect, Introspector};
    use ormgen::MysqlIntrospector;

    let mut conn = connect(config).context("Failed to open database connection")?;

    let mut introspector = MysqlIntrospector::new(&mut conn);
    let schema = introspector
        .introspect(schema_name, filter)
        .context("Failed to introspect schema")?;

    Ok(schema)
}

#[cfg(not(feature = "mysql"))]
fn introspect_mysql(_config: &DbConfig, _schema_name: &str, _filter: &TableFilter) -> Result<Schema> {
    bail!("MySQL support not enabled. Rebuild with --features mysql")
}
