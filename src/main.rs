mod adapters;
mod cli;
mod config;
mod core;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use crate::core::models::service_profile::ServiceProfile;

/// Exit status of a scan stopped with Ctrl-C.
const EXIT_INTERRUPTED: i32 = 130;

fn main() {
    let args = Cli::parse();
    init_tracing(&args);

    let result = match &args.command {
        Commands::Kms { key, scan } => {
            cli::commands::scan::execute(&args, ServiceProfile::KMS, key.as_deref(), scan)
                .map(|summary| summary.interrupted)
        }
        Commands::S3 { bucket, scan } => {
            cli::commands::scan::execute(&args, ServiceProfile::S3, bucket.as_deref(), scan)
                .map(|summary| summary.interrupted)
        }
        Commands::Profiles => cli::commands::profiles::execute().map(|()| false),
    };

    match result {
        Ok(false) => {}
        Ok(true) => std::process::exit(EXIT_INTERRUPTED),
        Err(e) => {
            cli::output::error(&format!("Error: {e}"));
            std::process::exit(1);
        }
    }
}

/// Diagnostics go to stderr. `RUST_LOG` wins over the verbosity flags.
fn init_tracing(args: &Cli) {
    let default_level = if args.verbose {
        "trailwatch=debug"
    } else if args.quiet {
        "error"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}
