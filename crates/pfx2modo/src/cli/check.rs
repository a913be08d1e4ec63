use anyhow::Result;
use clap::Parser;
use console::style;

use pfx2modo_core::config::Settings;
use pfx2modo_core::db;
use pfx2modo_core::modoboa::{DestStore, PgDestStore, DOMAIN_ADMINS_GROUP};
use pfx2modo_core::pfxadmin::{PgSourceStore, SourceCounts, SourceStore};

/// Verify the migration preconditions.
#[derive(Parser)]
pub struct CheckCommand {
    /// Settings file path.
    #[arg(short, long, default_value = "pfx2modo.toml")]
    pub config: String,

    /// Name of the PostfixAdmin connection declared in the settings file.
    #[arg(short, long, default_value = "pfxadmin")]
    pub from: String,

    /// Name of the Modoboa connection declared in the settings file.
    #[arg(short, long, default_value = "default")]
    pub to: String,

    /// Destination account that will be used as creator.
    #[arg(long, default_value = "admin")]
    pub creator: String,
}

struct DestStatus {
    creator_found: bool,
    group_found: bool,
}

impl CheckCommand {
    /// Execute the check command.
    pub async fn execute(self) -> Result<()> {
        dotenvy::dotenv().ok();
        super::init_tracing();

        if !std::path::Path::new(&self.config).exists() {
            anyhow::bail!("Settings file not found: {}", self.config);
        }
        let settings = Settings::from_file(&self.config)?;

        println!();
        println!("  {} pfx2modo preflight", style("⇒").bold().cyan());
        println!();

        let mut failures = 0;

        match source_status(&settings, &self.from).await {
            Ok(counts) => {
                println!(
                    "  {} source '{}' reachable",
                    style("✓").green(),
                    style(&self.from).cyan()
                );
                println!(
                    "      {} domains, {} alias domains, {} mailboxes, {} aliases, {} admins",
                    counts.domains,
                    counts.alias_domains,
                    counts.mailboxes,
                    counts.aliases,
                    counts.admins
                );
            }
            Err(e) => {
                println!("  {} source '{}': {}", style("✗").red(), self.from, e);
                failures += 1;
            }
        }

        match dest_status(&settings, &self.to, &self.creator).await {
            Ok(status) => {
                println!(
                    "  {} destination '{}' reachable",
                    style("✓").green(),
                    style(&self.to).cyan()
                );
                if status.creator_found {
                    println!(
                        "  {} creator account '{}' present",
                        style("✓").green(),
                        self.creator
                    );
                } else {
                    println!(
                        "  {} creator account '{}' missing",
                        style("✗").red(),
                        self.creator
                    );
                    failures += 1;
                }
                if status.group_found {
                    println!(
                        "  {} group '{}' present",
                        style("✓").green(),
                        DOMAIN_ADMINS_GROUP
                    );
                } else {
                    println!(
                        "  {} group '{}' missing",
                        style("✗").red(),
                        DOMAIN_ADMINS_GROUP
                    );
                    failures += 1;
                }
            }
            Err(e) => {
                println!("  {} destination '{}': {}", style("✗").red(), self.to, e);
                failures += 1;
            }
        }

        println!();
        if failures > 0 {
            anyhow::bail!("{} preflight check(s) failed", failures);
        }
        println!("  {} Ready to migrate", style("✓").green().bold());
        println!();
        Ok(())
    }
}

async fn source_status(settings: &Settings, name: &str) -> Result<SourceCounts> {
    let pool = db::connect(name, settings.connection(name)?).await?;
    db::health_check(&pool).await?;
    let counts = PgSourceStore::new(pool).counts().await?;
    Ok(counts)
}

async fn dest_status(settings: &Settings, name: &str, creator: &str) -> Result<DestStatus> {
    let pool = db::connect(name, settings.connection(name)?).await?;
    db::health_check(&pool).await?;

    let mut store = PgDestStore::begin(&pool).await?;
    let creator_found = store.user_by_username(creator).await?.is_some();
    let group_found = store.group_id(DOMAIN_ADMINS_GROUP).await?.is_some();
    store.rollback().await?;

    Ok(DestStatus {
        creator_found,
        group_found,
    })
}
