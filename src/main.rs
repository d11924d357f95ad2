//! Round-robin proxy entrypoint.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client ──POST JSON──▶ http::server ──▶ load_balancer::dispatcher
//!                                                │   ▲
//!                                   round_robin ─┘   └─ health::state ◀── health::active
//!                                                │                            │
//!                                                ▼                            │
//!                                          http::client ──▶ Backend ◀──GET /health
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use roundrobin_proxy::config::{load_config, ConfigError};
use roundrobin_proxy::lifecycle::startup;
use roundrobin_proxy::observability::logging;

#[derive(Parser, Debug)]
#[command(name = "roundrobin-proxy", version)]
#[command(about = "Round-robin load balancer for JSON HTTP backends", long_about = None)]
struct Args {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Load and validate the configuration, then exit
    #[arg(long)]
    validate: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let config = match load_config(&args.config) {
        Ok(config) => config,
        Err(ConfigError::Validation(errors)) => {
            eprintln!("{}: configuration is invalid", args.config.display());
            for error in errors {
                eprintln!("  - {error}");
            }
            return ExitCode::FAILURE;
        }
        Err(e) => {
            eprintln!("{}: {e}", args.config.display());
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = logging::init(&config.observability) {
        eprintln!("Failed to initialise logging: {e}");
        return ExitCode::FAILURE;
    }

    tracing::info!(
        config = %args.config.display(),
        version = env!("CARGO_PKG_VERSION"),
        backends = config.load_balancer.backends.len(),
        listen = %config.listener.bind_address(),
        "Configuration loaded"
    );

    if args.validate {
        tracing::info!("Configuration is valid");
        return ExitCode::SUCCESS;
    }

    match startup::run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Proxy stopped with an error");
            ExitCode::FAILURE
        }
    }
}
