//! CLI command definitions for the `causerie` binary.
//!
//! Uses clap derive macros for argument parsing.

pub mod conversation;
pub mod status;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

/// Conversational-state server in front of a local inference engine.
#[derive(Parser)]
#[command(name = "causerie", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Export tracing spans through OpenTelemetry (stdout exporter).
    #[arg(long, global = true, env = "CAUSERIE_OTEL")]
    pub otel: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP server.
    Serve {
        /// Address to bind (defaults to [server].host in config.toml).
        #[arg(long, env = "CAUSERIE_HOST")]
        host: Option<String>,

        /// Port to listen on (defaults to [server].port in config.toml).
        #[arg(short, long, env = "CAUSERIE_PORT")]
        port: Option<u16>,
    },

    /// List conversations.
    #[command(alias = "ls")]
    List,

    /// Show a conversation's system prompt and turns.
    Show {
        /// Conversation id.
        id: String,
    },

    /// Delete every conversation and turn.
    Reset {
        /// Skip the confirmation prompt.
        #[arg(long)]
        force: bool,
    },

    /// Show store and configuration status.
    Status,

    /// Send a tiny request to the inference engine to verify connectivity.
    Check,

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_serve_overrides() {
        let cli = Cli::try_parse_from(["causerie", "-v", "serve", "--port", "8000"]).unwrap();
        assert_eq!(cli.verbose, 1);
        match cli.command {
            Commands::Serve { host, port } => {
                assert!(host.is_none());
                assert_eq!(port, Some(8000));
            }
            _ => panic!("expected serve"),
        }
    }

    #[test]
    fn test_parse_reset_force_with_global_json() {
        let cli = Cli::try_parse_from(["causerie", "reset", "--force", "--json"]).unwrap();
        assert!(cli.json);
        assert!(matches!(cli.command, Commands::Reset { force: true }));
    }
}
