//! CAN DBC Registry CLI Application
//!
//! Opens DBC files bound to CAN sources using the can-dbc-registry library
//! and prints which definitions apply where:
//! - Bind files to source lists or to the ALL wildcard
//! - Show per-source message listings
//! - Export the DBC text that applies to a source
//! - Text or JSON reports

use anyhow::{Context, Result};
use can_dbc_registry::{Registry, RegistryEvent, SourceId, SourceSet};
use clap::Parser;
use std::fs;
use std::path::{Path, PathBuf};

mod config;
mod report;

use config::{DbcBinding, OutputFormat};

/// CAN DBC Registry - Resolve DBC files per CAN source
#[derive(Parser, Debug)]
#[command(name = "can-dbc-cli")]
#[command(about = "Bind DBC files to CAN sources and inspect the result", long_about = None)]
#[command(version)]
struct Args {
    /// DBC file bound to sources, e.g. `0,1=powertrain.dbc` or `all=common.dbc` (can be repeated)
    #[arg(long, value_name = "SOURCES=FILE", value_parser = config::parse_binding)]
    dbc: Vec<DbcBinding>,

    /// Active sources, used by files bound to `all` (e.g. `0,1,2`)
    #[arg(long, value_name = "LIST")]
    active: Option<SourceSet>,

    /// List the messages that apply to this source
    #[arg(short, long, value_name = "SOURCE")]
    source: Option<SourceId>,

    /// Write the DBC text that applies to --source to this file
    #[arg(long, value_name = "FILE", requires = "source")]
    export: Option<PathBuf>,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,

    /// Output file for the report (default: stdout)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Path to configuration file (config.toml)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Verbosity level (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(args.verbose, args.quiet);

    log::info!("CAN DBC Registry CLI v{}", env!("CARGO_PKG_VERSION"));
    log::info!("Using registry library v{}", can_dbc_registry::VERSION);

    let app_config = match &args.config {
        Some(path) => {
            log::info!("Loading configuration from: {:?}", path);
            config::load_config(path)?
        }
        None => config::AppConfig::default(),
    };

    let mut bindings = app_config
        .dbc
        .iter()
        .map(|entry| entry.to_binding())
        .collect::<Result<Vec<_>>>()?;
    bindings.extend(args.dbc.iter().cloned());

    if bindings.is_empty() {
        println!("CAN DBC Registry - No DBC files specified");
        println!("\nQuick Start:");
        println!("  can-dbc-cli --dbc 0,1=powertrain.dbc --dbc all=common.dbc --source 0");
        println!("\nFrom a config file:");
        println!("  can-dbc-cli --config config.toml");
        println!("\nUse --help for more options");
        return Ok(());
    }

    let mut registry = Registry::with_config(app_config.registry.clone());
    registry.subscribe(|event: &RegistryEvent<'_>| {
        log::debug!("{} {:?}", event.kind(), event.message_id());
    });

    for binding in &bindings {
        registry
            .open(binding.sources, &binding.path)
            .with_context(|| format!("Error loading DBC {:?}", binding.path))?;
    }

    if let Some(active) = args.active {
        registry.set_active_sources(active);
    }

    if let (Some(source), Some(path)) = (args.source, &args.export) {
        export_source(&registry, source, path)?;
    }

    let summary = report::Summary::collect(&registry, args.source);
    let format = if args.json {
        OutputFormat::Json
    } else {
        app_config.output.format
    };
    let rendered = match format {
        OutputFormat::Txt => report::render_txt(&summary),
        OutputFormat::Json => report::render_json(&summary)?,
    };

    match &args.output {
        Some(path) => {
            fs::write(path, rendered)
                .with_context(|| format!("Failed to write report: {:?}", path))?;
            log::info!("Report written to {:?}", path);
        }
        None => println!("{}", rendered),
    }

    Ok(())
}

/// Write the DBC text of the file that applies to `source`
fn export_source(registry: &Registry, source: SourceId, path: &Path) -> Result<()> {
    let file = registry
        .file_for_source(source)
        .with_context(|| format!("No DBC file applies to source {}", source))?;

    fs::write(path, file.to_dbc_string())
        .with_context(|| format!("Failed to export DBC: {:?}", path))?;
    log::info!("Exported {} (source {}) to {:?}", file.name(), source, path);
    Ok(())
}

/// Pick the log level from `-v`/`-q`
fn log_level(verbose: u8, quiet: bool) -> log::LevelFilter {
    match (quiet, verbose) {
        (true, _) => log::LevelFilter::Error,
        (false, 0) => log::LevelFilter::Info,
        (false, 1) => log::LevelFilter::Debug,
        (false, _) => log::LevelFilter::Trace,
    }
}

/// Set up env_logger; `RUST_LOG` overrides the level chosen on the command line
fn init_logging(verbose: u8, quiet: bool) {
    use std::io::Write;

    let default = log_level(verbose, quiet).to_string().to_lowercase();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
        .format(|buf, record| {
            writeln!(buf, "{:<5} {}: {}", record.level(), record.target(), record.args())
        })
        .init();
}
