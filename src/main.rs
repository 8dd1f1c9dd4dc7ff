use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use murmur::{cli, config, server};

#[derive(Parser)]
#[command(name = "murmur", version, about = "Voice journal backend with streaks and achievements")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the HTTP API
    Serve,
    /// Start the MCP server (stdio transport)
    Mcp,
    /// Show a user's stats and achievement progress
    Stats {
        /// Defaults to storage.default_user
        #[arg(long)]
        user: Option<String>,
    },
    /// Export a user's diary as JSON to stdout
    Export {
        #[arg(long)]
        user: Option<String>,
    },
    /// Issue (or revoke) a bearer token for the HTTP API
    Token {
        #[arg(long)]
        user: Option<String>,
        /// Revoke every token of the user instead of issuing one
        #[arg(long)]
        revoke: bool,
    },
    /// Check database health
    Doctor,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = config::MurmurConfig::load()?;

    // Log to stderr so stdout stays clean for MCP JSON-RPC and exports.
    let filter = EnvFilter::try_new(&config.server.log_level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let default_user = config.storage.default_user.clone();

    match cli.command {
        Command::Serve => server::serve_http(config).await?,
        Command::Mcp => server::serve_mcp_stdio(config).await?,
        Command::Stats { user } => cli::stats::stats(&config, &user.unwrap_or(default_user))?,
        Command::Export { user } => cli::export::export(&config, &user.unwrap_or(default_user))?,
        Command::Token { user, revoke } => {
            cli::token::token(&config, &user.unwrap_or(default_user), revoke)?
        }
        Command::Doctor => cli::doctor::doctor(&config)?,
    }

    Ok(())
}
