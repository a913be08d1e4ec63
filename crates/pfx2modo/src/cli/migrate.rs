use anyhow::Result;
use clap::Parser;
use console::style;
use tracing::info;

use pfx2modo_core::config::Settings;
use pfx2modo_core::db;
use pfx2modo_core::migration::{self, MigrationOptions, MigrationReport};
use pfx2modo_core::modoboa::PgDestStore;
use pfx2modo_core::pfxadmin::PgSourceStore;

/// Run the migration.
#[derive(Parser)]
pub struct MigrateCommand {
    /// Settings file path.
    #[arg(short, long, default_value = "pfx2modo.toml")]
    pub config: String,

    /// Name of the PostfixAdmin connection declared in the settings file.
    #[arg(short, long, default_value = "pfxadmin")]
    pub from: String,

    /// Name of the Modoboa connection declared in the settings file.
    #[arg(short, long, default_value = "default")]
    pub to: String,

    /// Scheme PostfixAdmin crypted passwords with, prepended to bare hashes.
    #[arg(short = 's', long, default_value = "crypt")]
    pub passwords_scheme: String,

    /// Destination account migrated records are attributed to.
    #[arg(long, default_value = "admin")]
    pub creator: String,

    /// Run the whole migration, then roll it back instead of committing.
    #[arg(long)]
    pub dry_run: bool,

    /// Skip the confirmation prompt.
    #[arg(short = 'y', long)]
    pub yes: bool,
}

impl MigrateCommand {
    /// Execute the migrate command.
    pub async fn execute(self) -> Result<()> {
        dotenvy::dotenv().ok();
        super::init_tracing();

        if !std::path::Path::new(&self.config).exists() {
            anyhow::bail!("Settings file not found: {}", self.config);
        }
        let settings = Settings::from_file(&self.config)?;

        println!();
        println!(
            "  {} pfx2modo v{}",
            style("⇒").bold().cyan(),
            env!("CARGO_PKG_VERSION")
        );
        println!(
            "  {} migrating '{}' into '{}'",
            style("→").dim(),
            style(&self.from).cyan(),
            style(&self.to).cyan()
        );
        println!();

        let source_pool = db::connect(&self.from, settings.connection(&self.from)?).await?;
        let dest_pool = db::connect(&self.to, settings.connection(&self.to)?).await?;
        db::health_check(&source_pool).await?;
        db::health_check(&dest_pool).await?;

        if !self.yes && !self.dry_run {
            let proceed = dialoguer::Confirm::new()
                .with_prompt(format!("Write migrated records into '{}'?", self.to))
                .default(false)
                .interact()?;
            if !proceed {
                println!("  {} Aborted", style("✗").red());
                return Ok(());
            }
        }

        info!("Starting migration from '{}' into '{}'", self.from, self.to);

        let source = PgSourceStore::new(source_pool);
        let mut dest = PgDestStore::begin(&dest_pool).await?;

        let options = MigrationOptions {
            password_scheme: self.passwords_scheme.clone(),
            creator: self.creator.clone(),
        };

        // An error propagated from here drops the store, which rolls the
        // destination transaction back
        let report = migration::run(&source, &mut dest, &options).await?;

        if self.dry_run {
            dest.rollback().await?;
            info!("Dry run, rolled back");
        } else {
            dest.commit().await?;
            info!("Migration committed");
        }

        print_summary(&report, self.dry_run);
        Ok(())
    }
}

fn print_summary(report: &MigrationReport, dry_run: bool) {
    println!();
    if dry_run {
        println!(
            "  {} Dry run finished, all changes rolled back",
            style("○").yellow()
        );
    } else {
        println!("  {} Migration complete", style("✓").green().bold());
    }
    println!();
    for line in summary_lines(report) {
        println!("    {}", line);
    }

    if !report.warnings.is_empty() {
        println!();
        println!(
            "  {} {} warning(s):",
            style("!").yellow().bold(),
            report.warnings.len()
        );
        for warning in &report.warnings {
            println!("    {} {}", style("•").yellow(), warning);
        }
    }
    println!();
}

/// Counter lines of the run summary, one per record kind.
///
/// Alias domains are skipped rather than created as domains, so their row
/// only shows up when the run skipped any.
fn summary_lines(report: &MigrationReport) -> Vec<String> {
    let mut lines = vec![
        format!("{:<22} {}", "domains", report.domains),
        format!("{:<22} {}", "domain aliases", report.domain_aliases),
        format!("{:<22} {}", "mailboxes", report.mailboxes),
        format!("{:<22} {}", "aliases", report.aliases),
        format!("{:<22} {}", "alias recipients", report.alias_recipients),
        format!("{:<22} {}", "domain admins", report.domain_admins),
        format!("{:<22} {}", "super admins", report.super_admins),
    ];
    if report.skipped_alias_domains > 0 {
        lines.push(format!(
            "{:<22} {}",
            "alias domains skipped", report.skipped_alias_domains
        ));
    }
    lines
}
