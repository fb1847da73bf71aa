//! CLI definitions for Portico.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Portico CLI.
#[derive(Parser)]
#[command(name = "portico")]
#[command(about = "Per-session kernel bridge for reactive web UIs")]
#[command(version)]
pub(crate) struct Cli {
    /// Configuration file path (default: ~/.portico/config.toml if present)
    #[arg(short, long, global = true, env = "PORTICO_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Run the server in foreground (default)
    Run {
        /// Server host, overrides `server.host`
        #[arg(long)]
        host: Option<String>,

        /// Server port, overrides `server.port`
        #[arg(long)]
        port: Option<u16>,
    },

    /// Load and validate the configuration, then exit
    CheckConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_no_subcommand() {
        let cli = Cli::parse_from(["portico"]);
        assert!(cli.command.is_none());
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_run_overrides() {
        let cli = Cli::parse_from(["portico", "--config", "/tmp/p.toml", "run", "--port", "9000"]);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/p.toml")));
        match cli.command {
            Some(Commands::Run { host, port }) => {
                assert!(host.is_none());
                assert_eq!(port, Some(9000));
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn test_check_config() {
        let cli = Cli::parse_from(["portico", "check-config"]);
        assert!(matches!(cli.command, Some(Commands::CheckConfig)));
    }
}
