//! Atlassian OAuth CLI.
//!
//! Provides commands for:
//! - `authorize`: Run the three-legged OAuth handshake and print access credentials
//! - `whoami`: Resolve the profile behind stored access credentials

mod commands;
mod error;
mod output;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{AuthorizeArgs, WhoamiArgs};
use output::Output;

/// Atlassian OAuth 1.0a client.
#[derive(Parser)]
#[command(name = "atlassian-oauth", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Authorize this consumer and generate access credentials.
    Authorize(AuthorizeArgs),
    /// Show the profile of the user behind the stored credentials.
    Whoami(WhoamiArgs),
}

impl Commands {
    fn verbose(&self) -> bool {
        match self {
            Self::Authorize(args) => args.common.verbose,
            Self::Whoami(args) => args.common.verbose,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    // --verbose enables INFO level, otherwise use RUST_LOG or default to WARN
    let filter = if cli.command.verbose() {
        EnvFilter::new("info")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Authorize(args) => args.execute(),
        Commands::Whoami(args) => args.execute(),
    };

    if let Err(err) = result {
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}
