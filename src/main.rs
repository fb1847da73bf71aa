//! Portico - per-session kernel bridge for reactive web UIs
//!
//! Main entry point for the Portico CLI and server.

mod cli;
mod server;

use std::time::Duration;

use clap::Parser;
use tracing::warn;

use portico_config::{Config, ConfigLoader, ConfigValidator};

use cli::{Cli, Commands};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let (mut config, source) = ConfigLoader::load_or_default(cli.config.as_deref())?;

    match cli.command {
        Some(Commands::CheckConfig) => {
            check_config(&config, source.as_deref());
            Ok(())
        }
        Some(Commands::Run { host, port }) => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            start(config)
        }
        None => start(config),
    }
}

fn start(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let warnings = ConfigValidator::validate(&config)?.into_result()?;

    server::init_tracing(&config.logging)?;
    for warning in warnings {
        warn!(path = %warning.path, "{}", warning.message);
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .max_blocking_threads(config.kernel.max_workers)
        .thread_name("portico")
        .build()?;

    let grace = Duration::from_secs(config.kernel.shutdown_grace_secs);
    server::block_on_with_grace(runtime, grace, server::run_server(config))
}

fn check_config(config: &Config, source: Option<&std::path::Path>) {
    match source {
        Some(path) => println!("Config: {}", path.display()),
        None => println!("Config: built-in defaults"),
    }

    match ConfigValidator::validate(config) {
        Ok(result) => {
            for error in &result.errors {
                println!("  error   {}: {}", error.path, error.message);
            }
            for warning in &result.warnings {
                println!("  warning {}: {}", warning.path, warning.message);
            }
            if result.is_valid() {
                println!("OK");
            } else {
                std::process::exit(1);
            }
        }
        Err(e) => {
            println!("  error   {}", e);
            std::process::exit(1);
        }
    }
}
