mod check;
mod migrate;

pub use check::CheckCommand;
pub use migrate::MigrateCommand;

use anyhow::Result;
use clap::{Parser, Subcommand};

/// Migrate a PostfixAdmin database into a Modoboa one.
#[derive(Parser)]
#[command(name = "pfx2modo")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Copy every domain, mailbox, alias and administrator.
    Migrate(MigrateCommand),

    /// Verify connectivity and preconditions without writing anything.
    Check(CheckCommand),
}

impl Cli {
    /// Execute the CLI command.
    pub async fn execute(self) -> Result<()> {
        match self.command {
            Commands::Migrate(cmd) => cmd.execute().await,
            Commands::Check(cmd) => cmd.execute().await,
        }
    }
}

/// Initialise logging from RUST_LOG, defaulting to info.
pub(crate) fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}
