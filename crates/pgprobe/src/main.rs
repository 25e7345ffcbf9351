//! pgprobe - PostgreSQL metric key resolver.
//!
//! Resolves one named metric key per invocation and prints the result to
//! stdout: a typed scalar for value keys, a JSON document for discovery
//! keys. Connection parameters ride in the first two key parameters, so the
//! same binary can probe any number of servers and databases.

use std::process::ExitCode;

use clap::Parser;
use tracing::{Level, debug, error};
use tracing_subscriber::EnvFilter;

use pgprobe_core::{MetricRequest, Response, registry};

/// PostgreSQL metric key resolver.
#[derive(Parser)]
#[command(name = "pgprobe", about = "PostgreSQL metric key resolver", version)]
struct Args {
    /// Metric key to resolve (e.g. "pg.index.size", "pg.table.discovery").
    #[arg(required_unless_present = "keys")]
    key: Option<String>,

    /// Key parameters in order: connection string, database name, then
    /// metric-specific parameters. Pass "" to skip a position.
    params: Vec<String>,

    /// List every supported metric key and exit.
    #[arg(long)]
    keys: bool,

    /// Increase logging verbosity (-v for debug, -vv for trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode - only show errors.
    #[arg(short, long)]
    quiet: bool,
}

/// Initializes the tracing subscriber with the appropriate log level.
/// Logs go to stderr; stdout carries only the metric result.
fn init_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        Level::ERROR
    } else {
        match verbose {
            0 => Level::WARN,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    let filter = EnvFilter::from_default_env()
        .add_directive(format!("pgprobe={}", level).parse().unwrap())
        .add_directive(format!("pgprobe_core={}", level).parse().unwrap());

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose, args.quiet);

    if args.keys {
        for key in registry::key_names() {
            println!("{}", key);
        }
        return ExitCode::SUCCESS;
    }

    // required_unless_present guarantees the key is set here
    let Some(key) = args.key else {
        return ExitCode::FAILURE;
    };

    let request = MetricRequest::new(key, args.params);
    debug!(key = request.key(), "resolving");

    match pgprobe_core::run(&request) {
        Ok(Response::Scalar(value)) => {
            println!("{}", value);
            ExitCode::SUCCESS
        }
        Ok(Response::Discovery(doc)) => match doc.to_json() {
            Ok(json) => {
                println!("{}", json);
                ExitCode::SUCCESS
            }
            Err(e) => {
                error!("{}", e);
                ExitCode::FAILURE
            }
        },
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
