use tracing::warn;

/// Counters and warnings collected over one migration run.
#[derive(Debug, Clone, Default)]
pub struct MigrationReport {
    /// Domains created.
    pub domains: u64,
    /// Domain aliases created.
    pub domain_aliases: u64,
    /// Mailboxes created, one user account each.
    pub mailboxes: u64,
    /// Mail aliases created.
    pub aliases: u64,
    /// Alias recipients created.
    pub alias_recipients: u64,
    /// Accounts registered as domain administrators.
    pub domain_admins: u64,
    /// Accounts promoted to super administrator.
    pub super_admins: u64,
    /// Source domains classified as alias domains and not migrated as such.
    pub skipped_alias_domains: u64,
    /// Per-record anomalies that did not abort the run.
    pub warnings: Vec<String>,
}

impl MigrationReport {
    /// Record a recoverable per-record anomaly.
    ///
    /// The message is logged immediately and kept for the final summary.
    pub fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        warn!("{}", message);
        self.warnings.push(message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warnings_are_collected_in_order() {
        let mut report = MigrationReport::default();
        report.warn("first");
        report.warn(String::from("second"));

        assert_eq!(report.warnings, vec!["first", "second"]);
    }
}
