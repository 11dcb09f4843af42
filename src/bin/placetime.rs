//! placetime CLI
//!
//! `update` loads a geonames dump into the local store, `search` prints the
//! current time in every matching place.

use std::io;
use std::process::{Command, ExitCode, Stdio};

use clap::{Parser, Subcommand, ValueEnum};
use placetime::config::{DEFAULT_MIN_POPULATION, DEFAULT_SOURCE};
use placetime::output::{self, LauncherSink, ResultSink, TextSink};
use placetime::{Config, DiskStore, Ingestor, SearchEngine};
use tracing_subscriber::{fmt, EnvFilter};

/// placetime
#[derive(Parser, Debug)]
#[command(name = "placetime")]
#[command(about = "Current local time in places around the world")]
#[command(version)]
struct Args {
    /// Show debugging output
    #[arg(long, global = true)]
    debug: bool,

    /// Data directory
    #[arg(short, long, global = true, default_value = "./placetime_data")]
    data_dir: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Replace the place table with a geonames dump
    Update {
        /// Either a file or a URL of a geonames dump (zip)
        #[arg(short, long, default_value = DEFAULT_SOURCE)]
        source: String,

        /// Minimum population to require for places
        #[arg(short, long, default_value_t = DEFAULT_MIN_POPULATION)]
        min_population: u64,

        /// Run the update in a detached process and return immediately
        #[arg(long)]
        background: bool,
    },

    /// Search places by name and country
    Search {
        /// Output style
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,

        /// Filter strings; all of them must match
        terms: Vec<String>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Aligned plain text
    Text,
    /// JSON item list for a launcher script filter
    Launcher,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if args.debug { "debug" } else { "warn" })
    });
    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(io::stderr)
        .init();

    tracing::debug!("placetime v{}", placetime::VERSION);

    match args.command {
        Commands::Update {
            source,
            min_population,
            background,
        } => {
            let config = Config::builder()
                .data_dir(&args.data_dir)
                .source(source)
                .min_population(min_population)
                .build();

            let outcome = if background {
                spawn_background(&config, args.debug)
            } else {
                update(config)
            };

            match outcome {
                Ok(()) => ExitCode::SUCCESS,
                Err(e) => {
                    eprintln!("Error {}", e);
                    ExitCode::FAILURE
                }
            }
        }

        Commands::Search { format, terms } => {
            let config = Config::builder().data_dir(&args.data_dir).build();
            let stdout = io::stdout().lock();
            let mut sink: Box<dyn ResultSink> = match format {
                OutputFormat::Text => Box::new(TextSink::new(stdout)),
                OutputFormat::Launcher => Box::new(LauncherSink::new(stdout)),
            };

            let outcome = DiskStore::open_read_only(config)
                .and_then(|store| SearchEngine::new(&store).search(&terms));
            if let Ok(results) = &outcome {
                tracing::info!(matches = results.len(), "search done");
            }

            match output::render(sink.as_mut(), outcome) {
                Ok(true) => ExitCode::SUCCESS,
                Ok(false) => ExitCode::FAILURE,
                Err(e) => {
                    eprintln!("Error {}", e);
                    ExitCode::FAILURE
                }
            }
        }
    }
}

/// Load the configured source into the store
fn update(config: Config) -> placetime::Result<()> {
    let mut store = DiskStore::open(config.clone())?;
    let report = Ingestor::new(&mut store, &config).ingest(&config.source)?;
    store.close()?;

    println!("Updated {} cities", report.written);
    Ok(())
}

/// Re-run this binary as a detached `update` with the same settings
fn spawn_background(config: &Config, debug: bool) -> placetime::Result<()> {
    let exe = std::env::current_exe()?;

    let mut cmd = Command::new(exe);
    cmd.arg("--data-dir")
        .arg(&config.data_dir)
        .arg("update")
        .arg("--source")
        .arg(&config.source)
        .arg("--min-population")
        .arg(config.min_population.to_string());
    if debug {
        cmd.arg("--debug");
    }

    let child = cmd
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()?;

    tracing::info!(pid = child.id(), "background update started");
    Ok(())
}
