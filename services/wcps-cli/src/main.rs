//! WCPS command line tool.
//!
//! Compiles WCPS XML requests to RasQL and assembles WCS GML responses from
//! a YAML coverage catalog.

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use wcps_cli::catalog::load_source;
use wcps_cli::commands;
use wcps_cli::config::CliConfig;
use wcs_protocol::GetCoverageRequest;

#[derive(Parser, Debug)]
#[command(name = "wcps-cli")]
#[command(about = "WCPS compiler and WCS response assembly")]
struct Args {
    /// Coverage catalog (YAML)
    #[arg(short, long, env = "WCPS_CATALOG")]
    catalog: Option<PathBuf>,

    /// Directory with response template overrides
    #[arg(long, env = "WCPS_TEMPLATE_DIR")]
    templates: Option<PathBuf>,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Log as JSON
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compile a WCPS XML request into RasQL
    Compile {
        /// WCPS XML request file
        query: PathBuf,
    },
    /// Assemble a GML GetCoverage response
    GetCoverage {
        coverage_id: String,

        /// Subset as axis(low,high), axis,crs(low,high) or axis(point)
        #[arg(short, long)]
        subset: Vec<String>,

        /// CSV file standing in for the query result
        #[arg(short, long)]
        data: Option<PathBuf>,
    },
    /// Print the capabilities document
    Capabilities,
}

fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    let args = Args::parse();

    if let Err(e) = init_tracing(&args) {
        eprintln!("failed to initialize logging: {}", e);
        return ExitCode::FAILURE;
    }

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "wcps-cli failed");
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(args: &Args) -> Result<()> {
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    // stdout carries the command output
    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr);

    if args.json {
        tracing::subscriber::set_global_default(builder.json().finish())?;
    } else {
        tracing::subscriber::set_global_default(builder.finish())?;
    }
    Ok(())
}

fn run(args: Args) -> Result<()> {
    let config = CliConfig::from_env(args.catalog, args.templates)?;
    let source = load_source(&config.catalog_path)?;
    let templates = commands::templates(&config)?;
    info!(catalog = ?config.catalog_path, "Starting wcps-cli");

    match args.command {
        Command::Compile { query } => {
            let xml = fs::read_to_string(&query)
                .with_context(|| format!("Failed to read query from {:?}", query))?;
            match commands::compile(&source, &config, &xml) {
                Ok(queries) => println!("{}", serde_json::to_string_pretty(&queries)?),
                Err(e) => {
                    println!("{}", commands::report(&templates, &e));
                    return Err(e.into());
                }
            }
        }
        Command::GetCoverage {
            coverage_id,
            subset,
            data,
        } => {
            let request = GetCoverageRequest {
                subsets: commands::parse_subsets(&subset)?,
                ..GetCoverageRequest::new(coverage_id)
            };
            let data = match data {
                Some(path) => Some(
                    fs::read_to_string(&path)
                        .with_context(|| format!("Failed to read data from {:?}", path))?,
                ),
                None => None,
            };
            match commands::get_coverage(&source, &templates, &config, &request, data) {
                Ok(response) => println!("{}", response.xml),
                Err(e) => {
                    println!("{}", commands::report(&templates, &e));
                    return Err(e.into());
                }
            }
        }
        Command::Capabilities => {
            println!("{}", commands::capabilities(&source, &config));
        }
    }

    Ok(())
}
