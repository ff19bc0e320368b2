//! mssql-scaffold CLI - generate FluentMigrator migrations from SQL Server.

use clap::{Parser, Subcommand};
use mssql_scaffold::{Config, Orchestrator, ScaffoldError};
use std::path::PathBuf;
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;
use tracing::{info, Level};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

#[cfg(unix)]
use tokio::signal::unix::{signal, SignalKind};

#[derive(Parser)]
#[command(name = "mssql-scaffold")]
#[command(about = "Generate FluentMigrator migrations from an existing SQL Server database")]
#[command(version)]
struct Cli {
    /// Path to YAML (or JSON) configuration file
    #[arg(short, long, default_value = "scaffold.yaml")]
    config: PathBuf,

    /// Output JSON result to stdout
    #[arg(long)]
    output_json: bool,

    /// Log format: text or json
    #[arg(long, default_value = "text")]
    log_format: String,

    /// Log verbosity: debug, info, warn, error
    #[arg(long, default_value = "info")]
    verbosity: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate migration files from the database structure
    Scaffold {
        /// Override output directory
        #[arg(short, long)]
        output: Option<String>,

        /// Override namespace of the generated classes
        #[arg(short, long)]
        namespace: Option<String>,

        /// Override schema to read
        #[arg(short, long)]
        schema: Option<String>,

        /// Only scaffold these tables (comma-separated)
        #[arg(short, long, value_delimiter = ',')]
        tables: Vec<String>,

        /// Write one InitialSchema file instead of one file per table
        #[arg(long)]
        single_file: bool,

        /// Also export table rows as seed migrations
        #[arg(long)]
        include_data: bool,

        /// Write one seed file per table
        #[arg(long)]
        separate_seed_files: bool,

        /// Override subfolder for per-table seed files
        #[arg(long)]
        seed_folder: Option<String>,

        /// Override rows per insert statement
        #[arg(long)]
        chunk_size: Option<usize>,
    },

    /// Print the default schema of the connected user
    DetectSchema,

    /// Print the database structure as JSON
    Inspect {
        /// Override schema to read
        #[arg(short, long)]
        schema: Option<String>,

        /// Only inspect these tables (comma-separated)
        #[arg(short, long, value_delimiter = ',')]
        tables: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e.format_detailed());
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run() -> Result<(), ScaffoldError> {
    let cli = Cli::parse();

    // Setup logging
    setup_logging(&cli.verbosity, &cli.log_format).map_err(ScaffoldError::Config)?;

    let mut config = Config::load(&cli.config)?;
    info!("Loaded configuration from {:?}", cli.config);

    match cli.command {
        Commands::Scaffold {
            output,
            namespace,
            schema,
            tables,
            single_file,
            include_data,
            separate_seed_files,
            seed_folder,
            chunk_size,
        } => {
            // Apply overrides
            let scaffold = &mut config.scaffold;
            if let Some(output) = output {
                scaffold.output_dir = output;
            }
            if let Some(namespace) = namespace {
                scaffold.namespace = namespace;
            }
            if schema.is_some() {
                scaffold.schema = schema;
            }
            if !tables.is_empty() {
                scaffold.tables = tables;
            }
            if let Some(folder) = seed_folder {
                scaffold.seed_folder = folder;
            }
            if let Some(size) = chunk_size {
                scaffold.chunk_size = size;
            }
            scaffold.single_file |= single_file;
            scaffold.include_data |= include_data;
            scaffold.separate_seed_files |= separate_seed_files;
            config.validate()?;

            let orchestrator = Orchestrator::new(config)?;

            // Setup signal handling for graceful shutdown (SIGINT and SIGTERM)
            let cancel_token = setup_signal_handler();
            let result = orchestrator.run(cancel_token).await?;

            if cli.output_json {
                println!("{}", result.to_json()?);
            } else {
                println!("\nScaffold completed!");
                println!("  Run ID: {}", result.run_id);
                println!("  Duration: {:.2}s", result.duration_seconds);
                println!("  Schema: {}", result.schema);
                println!("  Tables: {}", result.tables.len());
                println!("  Files: {}", result.files_written.len());
                for file in &result.files_written {
                    println!("    {}", file.display());
                }
                if !result.seeded_tables.is_empty() {
                    println!(
                        "  Seed rows: {} from {} tables",
                        result.rows_exported,
                        result.seeded_tables.len()
                    );
                }
            }
        }

        Commands::DetectSchema => {
            let orchestrator = Orchestrator::new(config)?;
            let schema = orchestrator.introspector().detect_default_schema().await;

            if cli.output_json {
                println!("{}", serde_json::json!({ "schema": schema }));
            } else {
                println!("{}", schema);
            }
        }

        Commands::Inspect { schema, tables } => {
            if schema.is_some() {
                config.scaffold.schema = schema;
            }
            if !tables.is_empty() {
                config.scaffold.tables = tables;
            }
            config.validate()?;

            let orchestrator = Orchestrator::new(config)?;
            let db = orchestrator.inspect().await?;
            println!("{}", serde_json::to_string_pretty(&db)?);
        }
    }

    Ok(())
}

fn setup_logging(verbosity: &str, format: &str) -> Result<(), String> {
    let level = match verbosity.to_lowercase().as_str() {
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    // RUST_LOG, when set, overrides --verbosity.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::default().add_directive(LevelFilter::from_level(level).into()));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_span_events(FmtSpan::CLOSE)
        .with_target(false)
        .with_writer(std::io::stderr);

    match format {
        "json" => subscriber.json().init(),
        "text" => subscriber.init(),
        other => return Err(format!("unknown log format '{}' (expected text or json)", other)),
    }

    Ok(())
}

/// Setup signal handlers for graceful shutdown.
/// Handles both SIGINT (Ctrl-C) and SIGTERM.
/// Returns a CancellationToken that will be cancelled when a signal is received.
#[cfg(unix)]
fn setup_signal_handler() -> CancellationToken {
    let cancel_token = CancellationToken::new();

    for (kind, name) in [
        (SignalKind::interrupt(), "SIGINT"),
        (SignalKind::terminate(), "SIGTERM"),
    ] {
        let token = cancel_token.clone();
        match signal(kind) {
            Ok(mut stream) => {
                tokio::spawn(async move {
                    stream.recv().await;
                    eprintln!("\nReceived {}. Stopping after the current row...", name);
                    token.cancel();
                });
            }
            Err(e) => tracing::warn!("Failed to install {} handler: {}", name, e),
        }
    }

    cancel_token
}

/// Setup signal handler for Windows (only Ctrl-C)
#[cfg(not(unix))]
fn setup_signal_handler() -> CancellationToken {
    let cancel_token = CancellationToken::new();
    let token = cancel_token.clone();

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\nReceived Ctrl-C. Stopping after the current row...");
            token.cancel();
        }
    });

    cancel_token
}
