mod cli;

use anyhow::Result;
use clap::{Parser, Subcommand};
use contextvault::config::VaultConfig;
use contextvault::server;
use std::io::IsTerminal;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "contextvault",
    version,
    about = "Local markdown knowledge base for AI assistants, served over MCP"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Start the MCP server (stdio transport). The default.
    Serve,
    /// Show vault status: document counts, paths, mode, enforcement level
    Status,
    /// Check vault health: orphaned docs, index mismatches, size limits, code drift
    Health,
    /// Import markdown documents into the project vault
    Import {
        /// A directory, a single .md file, or "legacy" for .claude/vault/
        source: String,
    },
    /// Check crates.io for a newer release
    CheckUpdate,
}

fn print_banner(config: &VaultConfig) {
    eprintln!("ContextVault v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("MCP server on stdio. Connect it from your MCP client config:");
    eprintln!("  {{ \"command\": \"contextvault\", \"args\": [\"serve\"] }}");
    eprintln!("Global vault: {}", config.resolved_global_dir().display());
    eprintln!("Press Ctrl+C to stop.");
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = VaultConfig::load()?;

    // Log to stderr so stdout stays clean for MCP JSON-RPC.
    let filter = EnvFilter::try_new(&config.server.log_level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            if std::io::stdin().is_terminal() {
                print_banner(&config);
            }
            cli::spawn_update_check(config.clone());
            server::serve_stdio(&config).await?;
        }
        Command::Status => cli::status(&config)?,
        Command::Health => cli::health(&config)?,
        Command::Import { source } => cli::import(&config, &source)?,
        Command::CheckUpdate => cli::check_update(&config).await?,
    }

    Ok(())
}
