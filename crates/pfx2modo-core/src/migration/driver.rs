use chrono::{DateTime, Utc};
use tracing::info;

use crate::error::{MigrateError, Result};
use crate::modoboa::{
    AuditDates, DestDomain, DestStore, NewAlias, NewAliasRecipient, NewDomain, NewDomainAlias,
    NewMailbox, NewUser, Role, DOMAIN_ADMINS_GROUP,
};
use crate::pfxadmin::{PfxDomain, SourceStore, ALL_DOMAINS};

use super::address::{local_part, split_address};
use super::password::format_password;
use super::report::MigrationReport;

/// PostfixAdmin counts mailbox quotas in units 1,024,000 times smaller than
/// the destination does.
const QUOTA_DIVISOR: i64 = 1_024_000;

/// Operator-provided knobs for a migration run.
#[derive(Debug, Clone)]
pub struct MigrationOptions {
    /// Scheme prepended to password hashes that carry none.
    pub password_scheme: String,
    /// Destination account every created record is attributed to.
    pub creator: String,
}

impl Default for MigrationOptions {
    fn default() -> Self {
        Self {
            password_scheme: "crypt".to_string(),
            creator: "admin".to_string(),
        }
    }
}

/// Copy everything the source holds into the destination.
///
/// Records are created in dependency order: each domain first, then its
/// domain aliases, mailboxes, mail aliases and administrators, and finally
/// the global administrators. Per-record anomalies are recorded on the
/// report; only missing preconditions and database failures abort the run.
///
/// The destination store decides whether the writes stick: nothing is
/// committed here.
pub async fn run<S, D>(
    source: &S,
    dest: &mut D,
    options: &MigrationOptions,
) -> Result<MigrationReport>
where
    S: SourceStore + ?Sized,
    D: DestStore + ?Sized,
{
    let creator = dest
        .user_by_username(&options.creator)
        .await?
        .ok_or_else(|| MigrateError::CreatorNotFound(options.creator.clone()))?;
    let admins_group = dest
        .group_id(DOMAIN_ADMINS_GROUP)
        .await?
        .ok_or_else(|| MigrateError::GroupNotFound(DOMAIN_ADMINS_GROUP.to_string()))?;

    let mut run = MigrationRun {
        source,
        dest,
        scheme: &options.password_scheme,
        creator_id: creator.id,
        admins_group,
        now: Utc::now(),
        report: MigrationReport::default(),
    };

    for pf_domain in run.source.domains().await? {
        if run.source.is_alias_domain(&pf_domain.domain).await? {
            info!(
                "{} is an alias domain, it will be migrated with its target",
                pf_domain.domain
            );
            run.report.skipped_alias_domains += 1;
            continue;
        }
        run.migrate_domain(&pf_domain).await?;
    }

    // Admins of the sentinel domain hold rights on everything
    run.migrate_admins(ALL_DOMAINS, None).await?;

    Ok(run.report)
}

/// State shared by the migration steps of one run.
struct MigrationRun<'a, S: ?Sized, D: ?Sized> {
    source: &'a S,
    dest: &'a mut D,
    scheme: &'a str,
    creator_id: i64,
    admins_group: i64,
    now: DateTime<Utc>,
    report: MigrationReport,
}

impl<S, D> MigrationRun<'_, S, D>
where
    S: SourceStore + ?Sized,
    D: DestStore + ?Sized,
{
    /// Insert the audit dates record every migrated row points at.
    async fn dates(&mut self, created: Option<DateTime<Utc>>) -> Result<i64> {
        self.dest
            .create_dates(&AuditDates::from_source(created, self.now))
            .await
    }

    async fn migrate_domain(&mut self, pf_domain: &PfxDomain) -> Result<()> {
        info!("Migrating domain {}", pf_domain.domain);

        let dates_id = self.dates(pf_domain.created).await?;
        let domain = self
            .dest
            .create_domain(
                &NewDomain {
                    name: pf_domain.domain.clone(),
                    quota: pf_domain.maxquota,
                    enabled: pf_domain.active,
                },
                dates_id,
                self.creator_id,
            )
            .await?;
        self.report.domains += 1;

        self.migrate_domain_aliases(&domain).await?;
        self.migrate_mailboxes(&domain).await?;
        self.migrate_mailbox_aliases(&domain).await?;
        self.migrate_admins(&pf_domain.domain, Some(&domain)).await?;

        Ok(())
    }

    async fn migrate_domain_aliases(&mut self, domain: &DestDomain) -> Result<()> {
        info!("Migrating domain aliases");

        for old in self.source.alias_domains_targeting(&domain.name).await? {
            let Some(target) = self.dest.domain_by_name(&old.target_domain).await? else {
                self.report.warn(format!(
                    "Target domain {} does not exist, not migrating alias domain {}",
                    old.target_domain, old.alias_domain
                ));
                continue;
            };

            let dates_id = self.dates(old.created).await?;
            self.dest
                .create_domain_alias(
                    &NewDomainAlias {
                        name: old.alias_domain.clone(),
                        target_id: target.id,
                        enabled: old.active,
                    },
                    dates_id,
                    self.creator_id,
                )
                .await?;
            self.report.domain_aliases += 1;
        }

        Ok(())
    }

    async fn migrate_mailboxes(&mut self, domain: &DestDomain) -> Result<()> {
        info!("Migrating mailboxes");

        for old in self.source.mailboxes(&domain.name).await? {
            let (first_name, last_name) = split_display_name(&old.name);

            let user_dates = self.dates(old.created).await?;
            let user = self
                .dest
                .create_user(
                    &NewUser {
                        username: old.username.clone(),
                        first_name: first_name.to_string(),
                        last_name: last_name.to_string(),
                        email: old.username.clone(),
                        password: format_password(&old.password, self.scheme),
                        is_active: old.active,
                        is_superuser: false,
                        date_joined: old.created.unwrap_or(self.now),
                        role: Role::SimpleUsers,
                    },
                    user_dates,
                    self.creator_id,
                )
                .await?;

            let mailbox_dates = self.dates(old.created).await?;
            self.dest
                .create_mailbox(
                    &NewMailbox {
                        user_id: user.id,
                        address: local_part(&old.username).to_string(),
                        domain_id: domain.id,
                        quota: mailbox_quota(old.quota),
                    },
                    mailbox_dates,
                    self.creator_id,
                )
                .await?;
            self.report.mailboxes += 1;
        }

        Ok(())
    }

    async fn migrate_mailbox_aliases(&mut self, domain: &DestDomain) -> Result<()> {
        info!("Migrating mailbox aliases");

        for old in self.source.aliases(&domain.name).await? {
            // A mailbox forwarding only to itself carries no information
            if old.address == old.goto {
                continue;
            }

            let address = match split_address(&old.address) {
                (Some(_), _) => old.address.clone(),
                (None, Some(domain_part)) => format!("@{}", domain_part),
                (None, None) => {
                    self.report.warn(format!(
                        "Cannot retrieve local part of alias {}, recreate it manually after the migration",
                        old.address
                    ));
                    continue;
                }
            };

            let dates_id = self.dates(old.created).await?;
            let alias_id = self
                .dest
                .create_alias(
                    &NewAlias {
                        address,
                        domain_id: domain.id,
                        enabled: old.active,
                    },
                    dates_id,
                    self.creator_id,
                )
                .await?;

            let mut recipients = Vec::new();
            for goto in old.goto.split(',') {
                let r_mailbox_id = self.dest.mailbox_by_owner(goto).await?;
                recipients.push(NewAliasRecipient {
                    address: goto.to_string(),
                    r_mailbox_id,
                });
            }
            self.report.alias_recipients += recipients.len() as u64;
            self.dest.add_alias_recipients(alias_id, &recipients).await?;
            self.report.aliases += 1;
        }

        Ok(())
    }

    /// Migrate the admins linked to `pf_domain`.
    ///
    /// With `domain` set they become administrators of that domain; without
    /// it (the sentinel pass) they become super administrators. An account
    /// that is already a super administrator keeps that rank either way.
    async fn migrate_admins(&mut self, pf_domain: &str, domain: Option<&DestDomain>) -> Result<()> {
        if domain.is_some() {
            info!("Migrating administrators");
        } else {
            info!("Migrating super administrators");
        }

        let pass_role = match domain {
            Some(_) => Role::DomainAdmins,
            None => Role::SuperAdmins,
        };

        for old in self.source.admins(pf_domain).await? {
            // PostfixAdmin keeps admin accounts and mailbox accounts in
            // separate tables, so one username can name both. They merge
            // into a single destination account and the admin password wins.
            let user = match self.dest.user_by_username(&old.username).await? {
                Some(user) => {
                    if user.role == Role::SimpleUsers.as_str() {
                        self.report.warn(format!(
                            "Admin '{}' shares its username with an existing simple user, promoting that account and replacing its password",
                            user.username
                        ));
                    }
                    user
                }
                None => {
                    let dates_id = self.dates(old.created).await?;
                    self.dest
                        .create_user(
                            &NewUser {
                                username: old.username.clone(),
                                first_name: String::new(),
                                last_name: String::new(),
                                email: old.username.clone(),
                                password: format_password(&old.password, self.scheme),
                                is_active: old.active,
                                is_superuser: false,
                                date_joined: old.modified.unwrap_or(self.now),
                                role: Role::SimpleUsers,
                            },
                            dates_id,
                            self.creator_id,
                        )
                        .await?
                }
            };

            // Being listed as a domain admin never demotes an existing
            // super administrator; only the password, dates and
            // registrations are applied then
            let role = if user.role == Role::SuperAdmins.as_str() {
                Role::SuperAdmins
            } else {
                pass_role
            };

            self.dest
                .promote_user(
                    user.id,
                    role,
                    role == Role::SuperAdmins,
                    &format_password(&old.password, self.scheme),
                    old.modified,
                )
                .await?;

            match domain {
                Some(domain) => {
                    self.dest.add_user_to_group(user.id, self.admins_group).await?;
                    self.dest.add_domain_admin(domain.id, user.id).await?;
                    self.report.domain_admins += 1;
                }
                None => {
                    info!("{} is now a super administrator", old.username);
                    self.report.super_admins += 1;
                }
            }
        }

        Ok(())
    }
}

/// Convert a PostfixAdmin mailbox quota, flooring to whole destination units.
fn mailbox_quota(quota: i64) -> i64 {
    quota / QUOTA_DIVISOR
}

/// Split a display name into first and last name at its first space.
fn split_display_name(name: &str) -> (&str, &str) {
    match name.split_once(' ') {
        Some((first, last)) => (first, last),
        None => (name, ""),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pfxadmin::{PfxAdmin, PfxAlias, PfxAliasDomain, PfxMailbox};
    use crate::testing::{AdminLink, MemoryDest, MemorySource};
    use chrono::TimeZone;

    fn ts(year: i32, month: u32, day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(year, month, day, 0, 0, 0).unwrap()
    }

    fn dom(name: &str, maxquota: i64, active: bool, created: Option<DateTime<Utc>>) -> PfxDomain {
        PfxDomain {
            domain: name.to_string(),
            maxquota,
            active,
            created,
        }
    }

    fn alias_dom(alias: &str, target: &str) -> PfxAliasDomain {
        PfxAliasDomain {
            alias_domain: alias.to_string(),
            target_domain: target.to_string(),
            active: true,
            created: None,
        }
    }

    fn mbox(
        username: &str,
        name: &str,
        password: &str,
        quota: i64,
        domain: &str,
        active: bool,
        created: Option<DateTime<Utc>>,
    ) -> PfxMailbox {
        PfxMailbox {
            username: username.to_string(),
            name: name.to_string(),
            password: password.to_string(),
            quota,
            domain: domain.to_string(),
            active,
            created,
        }
    }

    fn mail_alias(address: &str, goto: &str, domain: &str, active: bool) -> PfxAlias {
        PfxAlias {
            address: address.to_string(),
            goto: goto.to_string(),
            domain: domain.to_string(),
            active,
            created: None,
        }
    }

    fn admin_acct(username: &str, password: &str, modified: Option<DateTime<Utc>>) -> PfxAdmin {
        PfxAdmin {
            username: username.to_string(),
            password: password.to_string(),
            active: true,
            created: None,
            modified,
        }
    }

    fn link(username: &str, domain: &str) -> AdminLink {
        AdminLink {
            username: username.to_string(),
            domain: domain.to_string(),
            active: true,
        }
    }

    fn dest_with_fixtures() -> MemoryDest {
        let mut dest = MemoryDest::new();
        dest.seed_user("admin", "SuperAdmins");
        dest.seed_group(DOMAIN_ADMINS_GROUP);
        dest
    }

    #[tokio::test]
    async fn test_full_migration() {
        let source = MemorySource {
            domains: vec![dom("example.com", 100, true, Some(ts(2015, 3, 1)))],
            mailboxes: vec![
                mbox(
                    "user@example.com",
                    "John Doe",
                    "$1$ab$cd",
                    5_120_000,
                    "example.com",
                    true,
                    Some(ts(2015, 4, 2)),
                ),
                mbox(
                    "old@example.com",
                    "Legacy",
                    "{MD5}deadbeef",
                    0,
                    "example.com",
                    false,
                    None,
                ),
            ],
            aliases: vec![mail_alias(
                "sales@example.com",
                "user@example.com",
                "example.com",
                true,
            )],
            admins: vec![admin_acct("admin1", "xyz", Some(ts(2016, 1, 1)))],
            admin_links: vec![link("admin1", "example.com")],
            ..Default::default()
        };
        let mut dest = dest_with_fixtures();

        let report = run(&source, &mut dest, &MigrationOptions::default())
            .await
            .unwrap();

        let domain = dest.domain("example.com").unwrap();
        assert_eq!(domain.quota, 100);
        assert!(domain.enabled);

        let user = dest.user("user@example.com").unwrap();
        assert_eq!(user.first_name, "John");
        assert_eq!(user.last_name, "Doe");
        assert_eq!(user.email, "user@example.com");
        assert_eq!(user.password, "{CRYPT}$1$ab$cd");
        assert_eq!(user.role, "SimpleUsers");
        assert!(user.is_active);
        assert!(!user.is_superuser);
        assert_eq!(user.date_joined, ts(2015, 4, 2));

        let mailbox = dest.mailbox_of("user@example.com").unwrap();
        assert_eq!(mailbox.address, "user");
        assert_eq!(mailbox.quota, 5);
        assert_eq!(mailbox.domain_id, domain.id);

        // An already prefixed hash and the inactive flag carry over untouched
        let legacy = dest.user("old@example.com").unwrap();
        assert_eq!(legacy.password, "{MD5}deadbeef");
        assert!(!legacy.is_active);

        let alias = dest.alias("sales@example.com").unwrap();
        assert!(alias.enabled);
        assert_eq!(alias.domain_id, domain.id);
        let recipients = dest.recipients_of("sales@example.com");
        assert_eq!(recipients.len(), 1);
        assert_eq!(recipients[0].address, "user@example.com");
        assert_eq!(recipients[0].r_mailbox_id, Some(mailbox.id));

        let admin = dest.user("admin1").unwrap();
        assert_eq!(admin.role, "DomainAdmins");
        assert_eq!(admin.password, "{CRYPT}xyz");
        assert_eq!(admin.date_joined, ts(2016, 1, 1));
        assert!(dest.is_group_member("admin1", DOMAIN_ADMINS_GROUP));
        assert!(dest.is_domain_admin("example.com", "admin1"));

        // Everything the run created is attributed to the creator account
        let creator_id = dest.user("admin").unwrap().id;
        assert!(dest.domains.iter().all(|d| d.created_by == creator_id));
        assert!(dest.mailboxes.iter().all(|m| m.created_by == creator_id));

        assert_eq!(report.domains, 1);
        assert_eq!(report.mailboxes, 2);
        assert_eq!(report.aliases, 1);
        assert_eq!(report.alias_recipients, 1);
        assert_eq!(report.domain_admins, 1);
        assert_eq!(report.super_admins, 0);
        assert!(report.warnings.is_empty());
    }

    #[tokio::test]
    async fn test_alias_domain_becomes_domain_alias() {
        let source = MemorySource {
            domains: vec![
                dom("example.com", 0, true, None),
                dom("example.net", 0, true, None),
            ],
            alias_domains: vec![alias_dom("example.net", "example.com")],
            ..Default::default()
        };
        let mut dest = dest_with_fixtures();

        let report = run(&source, &mut dest, &MigrationOptions::default())
            .await
            .unwrap();

        assert!(dest.domain("example.com").is_some());
        assert!(dest.domain("example.net").is_none());

        let target_id = dest.domain("example.com").unwrap().id;
        assert_eq!(dest.domain_aliases.len(), 1);
        assert_eq!(dest.domain_aliases[0].name, "example.net");
        assert_eq!(dest.domain_aliases[0].target_id, target_id);

        assert_eq!(report.domains, 1);
        assert_eq!(report.domain_aliases, 1);
        assert_eq!(report.skipped_alias_domains, 1);
    }

    #[tokio::test]
    async fn test_alias_domain_with_missing_target() {
        let source = MemorySource {
            domains: vec![dom("example.com", 0, true, None)],
            alias_domains: vec![alias_dom("mail.example.org", "example.com")],
            ..Default::default()
        };
        let mut dest = dest_with_fixtures();
        dest.missing_domains.insert("example.com".to_string());

        let report = run(&source, &mut dest, &MigrationOptions::default())
            .await
            .unwrap();

        assert!(dest.domain_aliases.is_empty());
        assert_eq!(report.domain_aliases, 0);
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].contains("mail.example.org"));
    }

    #[tokio::test]
    async fn test_catch_all_alias() {
        let source = MemorySource {
            domains: vec![dom("example.com", 0, true, None)],
            mailboxes: vec![mbox(
                "user@example.com",
                "",
                "pw",
                0,
                "example.com",
                true,
                None,
            )],
            aliases: vec![mail_alias(
                "@example.com",
                "user@example.com",
                "example.com",
                true,
            )],
            ..Default::default()
        };
        let mut dest = dest_with_fixtures();

        run(&source, &mut dest, &MigrationOptions::default())
            .await
            .unwrap();

        let alias = dest.alias("@example.com").unwrap();
        assert_eq!(alias.address, "@example.com");

        let mailbox_id = dest.mailbox_of("user@example.com").unwrap().id;
        let recipients = dest.recipients_of("@example.com");
        assert_eq!(recipients.len(), 1);
        assert_eq!(recipients[0].r_mailbox_id, Some(mailbox_id));
    }

    #[tokio::test]
    async fn test_alias_without_any_part_is_skipped() {
        let source = MemorySource {
            domains: vec![dom("example.com", 0, true, None)],
            aliases: vec![mail_alias("@", "user@example.com", "example.com", true)],
            ..Default::default()
        };
        let mut dest = dest_with_fixtures();

        let report = run(&source, &mut dest, &MigrationOptions::default())
            .await
            .unwrap();

        assert!(dest.aliases.is_empty());
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].contains("local part"));
    }

    #[tokio::test]
    async fn test_self_referential_alias_is_skipped_silently() {
        let source = MemorySource {
            domains: vec![dom("example.com", 0, true, None)],
            aliases: vec![mail_alias(
                "user@example.com",
                "user@example.com",
                "example.com",
                true,
            )],
            ..Default::default()
        };
        let mut dest = dest_with_fixtures();

        let report = run(&source, &mut dest, &MigrationOptions::default())
            .await
            .unwrap();

        assert!(dest.aliases.is_empty());
        assert!(report.warnings.is_empty());
        assert_eq!(report.aliases, 0);
    }

    #[tokio::test]
    async fn test_goto_list_splits_on_bare_commas() {
        let source = MemorySource {
            domains: vec![dom("example.com", 0, true, None)],
            mailboxes: vec![mbox(
                "user@example.com",
                "",
                "pw",
                0,
                "example.com",
                true,
                None,
            )],
            aliases: vec![mail_alias(
                "team@example.com",
                "user@example.com,,outside@other.org",
                "example.com",
                true,
            )],
            ..Default::default()
        };
        let mut dest = dest_with_fixtures();

        let report = run(&source, &mut dest, &MigrationOptions::default())
            .await
            .unwrap();

        let mailbox_id = dest.mailbox_of("user@example.com").unwrap().id;
        let recipients = dest.recipients_of("team@example.com");
        assert_eq!(recipients.len(), 3);
        assert_eq!(recipients[0].address, "user@example.com");
        assert_eq!(recipients[0].r_mailbox_id, Some(mailbox_id));
        assert_eq!(recipients[1].address, "");
        assert_eq!(recipients[1].r_mailbox_id, None);
        assert_eq!(recipients[2].address, "outside@other.org");
        assert_eq!(recipients[2].r_mailbox_id, None);

        assert_eq!(report.alias_recipients, 3);
    }

    #[tokio::test]
    async fn test_admin_merges_with_mailbox_user() {
        let modified = ts(2020, 6, 15);
        let source = MemorySource {
            domains: vec![dom("example.com", 0, true, None)],
            mailboxes: vec![mbox(
                "bob@example.com",
                "Bob",
                "mailpw",
                0,
                "example.com",
                true,
                Some(ts(2018, 1, 1)),
            )],
            admins: vec![admin_acct("bob@example.com", "adminpw", Some(modified))],
            admin_links: vec![link("bob@example.com", "example.com")],
            ..Default::default()
        };
        let mut dest = dest_with_fixtures();

        let report = run(&source, &mut dest, &MigrationOptions::default())
            .await
            .unwrap();

        let bobs: Vec<_> = dest
            .users
            .iter()
            .filter(|u| u.username == "bob@example.com")
            .collect();
        assert_eq!(bobs.len(), 1);
        assert_eq!(bobs[0].role, "DomainAdmins");
        assert_eq!(bobs[0].password, "{CRYPT}adminpw");
        assert_eq!(bobs[0].date_joined, modified);
        assert!(dest.is_domain_admin("example.com", "bob@example.com"));

        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].contains("bob@example.com"));
    }

    #[tokio::test]
    async fn test_admin_linked_to_two_domains() {
        let source = MemorySource {
            domains: vec![
                dom("one.example", 0, true, None),
                dom("two.example", 0, true, None),
            ],
            admins: vec![admin_acct("boss", "pw", None)],
            admin_links: vec![link("boss", "one.example"), link("boss", "two.example")],
            ..Default::default()
        };
        let mut dest = dest_with_fixtures();

        let report = run(&source, &mut dest, &MigrationOptions::default())
            .await
            .unwrap();

        let bosses: Vec<_> = dest.users.iter().filter(|u| u.username == "boss").collect();
        assert_eq!(bosses.len(), 1);
        assert!(dest.is_domain_admin("one.example", "boss"));
        assert!(dest.is_domain_admin("two.example", "boss"));
        // Group membership is added once, the second pass is a no-op
        assert_eq!(dest.group_members.len(), 1);
        assert_eq!(report.domain_admins, 2);
    }

    #[tokio::test]
    async fn test_existing_super_admin_is_not_demoted() {
        let modified = ts(2021, 2, 3);
        let source = MemorySource {
            domains: vec![dom("example.com", 0, true, None)],
            admins: vec![admin_acct("admin", "newpw", Some(modified))],
            admin_links: vec![link("admin", "example.com")],
            ..Default::default()
        };
        // The seeded creator account is a super administrator and the
        // source names it as a plain domain admin
        let mut dest = dest_with_fixtures();

        let report = run(&source, &mut dest, &MigrationOptions::default())
            .await
            .unwrap();

        let admin = dest.user("admin").unwrap();
        assert_eq!(admin.role, "SuperAdmins");
        assert!(admin.is_superuser);

        // Password, dates and registrations still go through
        assert_eq!(admin.password, "{CRYPT}newpw");
        assert_eq!(admin.date_joined, modified);
        assert!(dest.is_group_member("admin", DOMAIN_ADMINS_GROUP));
        assert!(dest.is_domain_admin("example.com", "admin"));

        assert_eq!(report.domain_admins, 1);
        assert!(report.warnings.is_empty());
    }

    #[tokio::test]
    async fn test_super_admins() {
        let source = MemorySource {
            domains: vec![dom("example.com", 0, true, None)],
            admins: vec![admin_acct("root", "rootpw", None)],
            admin_links: vec![link("root", ALL_DOMAINS)],
            ..Default::default()
        };
        let mut dest = dest_with_fixtures();

        let report = run(&source, &mut dest, &MigrationOptions::default())
            .await
            .unwrap();

        let root = dest.user("root").unwrap();
        assert_eq!(root.role, "SuperAdmins");
        assert!(root.is_superuser);
        assert_eq!(root.password, "{CRYPT}rootpw");

        // Super admins are neither grouped nor tied to any domain
        assert!(dest.group_members.is_empty());
        assert!(dest.domain_admins.is_empty());
        assert_eq!(report.super_admins, 1);
        assert_eq!(report.domain_admins, 0);
    }

    #[tokio::test]
    async fn test_audit_dates() {
        let created = ts(2014, 5, 1);
        let source = MemorySource {
            domains: vec![dom("example.com", 0, true, Some(created))],
            mailboxes: vec![mbox(
                "user@example.com",
                "",
                "pw",
                0,
                "example.com",
                true,
                None,
            )],
            ..Default::default()
        };
        let mut dest = dest_with_fixtures();

        run(&source, &mut dest, &MigrationOptions::default())
            .await
            .unwrap();

        let domain = dest.domain("example.com").unwrap();
        let domain_dates = dest.dates(domain.dates_id).unwrap();
        assert_eq!(domain_dates.creation, created);

        // No source timestamp: creation falls back to the migration instant
        let mailbox = dest.mailbox_of("user@example.com").unwrap();
        let mailbox_dates = dest.dates(mailbox.dates_id).unwrap();
        assert_eq!(mailbox_dates.creation, mailbox_dates.last_modification);

        // One instant stamps every record of the run
        assert_eq!(
            domain_dates.last_modification,
            mailbox_dates.last_modification
        );
    }

    #[tokio::test]
    async fn test_custom_password_scheme() {
        let source = MemorySource {
            domains: vec![dom("example.com", 0, true, None)],
            mailboxes: vec![mbox(
                "user@example.com",
                "",
                "hash",
                0,
                "example.com",
                true,
                None,
            )],
            ..Default::default()
        };
        let mut dest = dest_with_fixtures();

        let options = MigrationOptions {
            password_scheme: "sha512-crypt".to_string(),
            ..Default::default()
        };
        run(&source, &mut dest, &options).await.unwrap();

        assert_eq!(
            dest.user("user@example.com").unwrap().password,
            "{SHA512-CRYPT}hash"
        );
    }

    #[tokio::test]
    async fn test_creator_must_exist() {
        let source = MemorySource::default();
        let mut dest = MemoryDest::new();
        dest.seed_group(DOMAIN_ADMINS_GROUP);

        let err = run(&source, &mut dest, &MigrationOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, MigrateError::CreatorNotFound(name) if name == "admin"));
    }

    #[tokio::test]
    async fn test_admins_group_must_exist() {
        let source = MemorySource::default();
        let mut dest = MemoryDest::new();
        dest.seed_user("admin", "SuperAdmins");

        let err = run(&source, &mut dest, &MigrationOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, MigrateError::GroupNotFound(name) if name == "DomainAdmins"));
    }

    #[test]
    fn test_mailbox_quota_floors() {
        assert_eq!(mailbox_quota(5_120_000), 5);
        assert_eq!(mailbox_quota(5_120_001), 5);
        assert_eq!(mailbox_quota(1_023_999), 0);
        assert_eq!(mailbox_quota(0), 0);
    }

    #[test]
    fn test_split_display_name() {
        assert_eq!(split_display_name("John Doe"), ("John", "Doe"));
        assert_eq!(
            split_display_name("John Ronald Reuel Tolkien"),
            ("John", "Ronald Reuel Tolkien")
        );
        assert_eq!(split_display_name("Plastic"), ("Plastic", ""));
        assert_eq!(split_display_name(""), ("", ""));
    }
}
