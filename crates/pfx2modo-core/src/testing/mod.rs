//! In-memory stores for exercising the migration driver without databases.
//!
//! [`MemorySource`] is loaded with source rows up front; [`MemoryDest`]
//! records everything the driver writes so tests can inspect the outcome
//! table by table.

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::modoboa::{
    AuditDates, DestDomain, DestStore, DestUser, NewAlias, NewAliasRecipient, NewDomain,
    NewDomainAlias, NewMailbox, NewUser, Role,
};
use crate::pfxadmin::{
    PfxAdmin, PfxAlias, PfxAliasDomain, PfxDomain, PfxMailbox, SourceCounts, SourceStore,
    ALL_DOMAINS,
};

/// A row of the `domain_admins` link table.
#[derive(Debug, Clone)]
pub struct AdminLink {
    pub username: String,
    pub domain: String,
    pub active: bool,
}

/// [`SourceStore`] over fixture rows.
///
/// Admin accounts and their domain links are kept in separate tables like
/// the real schema does; [`admins`](SourceStore::admins) joins them.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    pub domains: Vec<PfxDomain>,
    pub alias_domains: Vec<PfxAliasDomain>,
    pub mailboxes: Vec<PfxMailbox>,
    pub aliases: Vec<PfxAlias>,
    pub admins: Vec<PfxAdmin>,
    pub admin_links: Vec<AdminLink>,
}

#[async_trait]
impl SourceStore for MemorySource {
    async fn domains(&self) -> Result<Vec<PfxDomain>> {
        let mut domains: Vec<PfxDomain> = self
            .domains
            .iter()
            .filter(|d| d.domain != ALL_DOMAINS)
            .cloned()
            .collect();
        domains.sort_by(|a, b| a.domain.cmp(&b.domain));
        Ok(domains)
    }

    async fn is_alias_domain(&self, name: &str) -> Result<bool> {
        Ok(self.alias_domains.iter().any(|a| a.alias_domain == name))
    }

    async fn alias_domains_targeting(&self, target: &str) -> Result<Vec<PfxAliasDomain>> {
        let mut aliases: Vec<PfxAliasDomain> = self
            .alias_domains
            .iter()
            .filter(|a| a.target_domain == target)
            .cloned()
            .collect();
        aliases.sort_by(|a, b| a.alias_domain.cmp(&b.alias_domain));
        Ok(aliases)
    }

    async fn mailboxes(&self, domain: &str) -> Result<Vec<PfxMailbox>> {
        let mut mailboxes: Vec<PfxMailbox> = self
            .mailboxes
            .iter()
            .filter(|m| m.domain == domain)
            .cloned()
            .collect();
        mailboxes.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(mailboxes)
    }

    async fn aliases(&self, domain: &str) -> Result<Vec<PfxAlias>> {
        let mut aliases: Vec<PfxAlias> = self
            .aliases
            .iter()
            .filter(|a| a.domain == domain)
            .cloned()
            .collect();
        aliases.sort_by(|a, b| a.address.cmp(&b.address));
        Ok(aliases)
    }

    async fn admins(&self, domain: &str) -> Result<Vec<PfxAdmin>> {
        let mut admins: Vec<PfxAdmin> = self
            .admin_links
            .iter()
            .filter(|l| l.domain == domain && l.active)
            .filter_map(|l| self.admins.iter().find(|a| a.username == l.username))
            .cloned()
            .collect();
        admins.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(admins)
    }

    async fn counts(&self) -> Result<SourceCounts> {
        Ok(SourceCounts {
            domains: self
                .domains
                .iter()
                .filter(|d| d.domain != ALL_DOMAINS)
                .count() as i64,
            alias_domains: self.alias_domains.len() as i64,
            mailboxes: self.mailboxes.len() as i64,
            aliases: self.aliases.len() as i64,
            admins: self.admins.len() as i64,
        })
    }
}

/// A recorded `core_user` row.
#[derive(Debug, Clone)]
pub struct UserRow {
    pub id: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub is_active: bool,
    pub is_superuser: bool,
    pub date_joined: DateTime<Utc>,
    pub role: String,
    pub dates_id: i64,
    pub created_by: i64,
}

/// A recorded `admin_domain` row.
#[derive(Debug, Clone)]
pub struct DomainRow {
    pub id: i64,
    pub name: String,
    pub quota: i64,
    pub enabled: bool,
    pub dates_id: i64,
    pub created_by: i64,
}

/// A recorded `admin_domainalias` row.
#[derive(Debug, Clone)]
pub struct DomainAliasRow {
    pub id: i64,
    pub name: String,
    pub target_id: i64,
    pub enabled: bool,
    pub dates_id: i64,
    pub created_by: i64,
}

/// A recorded `admin_mailbox` row.
#[derive(Debug, Clone)]
pub struct MailboxRow {
    pub id: i64,
    pub user_id: i64,
    pub address: String,
    pub domain_id: i64,
    pub quota: i64,
    pub dates_id: i64,
    pub created_by: i64,
}

/// A recorded `admin_alias` row.
#[derive(Debug, Clone)]
pub struct AliasRow {
    pub id: i64,
    pub address: String,
    pub domain_id: i64,
    pub enabled: bool,
    pub dates_id: i64,
    pub created_by: i64,
}

/// A recorded `admin_aliasrecipient` row.
#[derive(Debug, Clone)]
pub struct RecipientRow {
    pub id: i64,
    pub address: String,
    pub alias_id: i64,
    pub r_mailbox_id: Option<i64>,
}

/// A recorded `admin_objectdates` row.
#[derive(Debug, Clone)]
pub struct DatesRow {
    pub id: i64,
    pub creation: DateTime<Utc>,
    pub last_modification: DateTime<Utc>,
}

/// A recorded `auth_group` row.
#[derive(Debug, Clone)]
pub struct GroupRow {
    pub id: i64,
    pub name: String,
}

/// [`DestStore`] that records every write.
///
/// Ids are handed out from a single sequence across all tables, so any id
/// showing up in two places really refers to the same record.
#[derive(Debug, Clone, Default)]
pub struct MemoryDest {
    pub users: Vec<UserRow>,
    pub domains: Vec<DomainRow>,
    pub domain_aliases: Vec<DomainAliasRow>,
    pub mailboxes: Vec<MailboxRow>,
    pub aliases: Vec<AliasRow>,
    pub recipients: Vec<RecipientRow>,
    pub dates: Vec<DatesRow>,
    pub groups: Vec<GroupRow>,
    /// (user_id, group_id) memberships.
    pub group_members: Vec<(i64, i64)>,
    /// (domain_id, user_id) administrator registrations.
    pub domain_admins: Vec<(i64, i64)>,
    /// Domains reported as absent by lookups even after creation, to
    /// simulate a target that was never migrated.
    pub missing_domains: HashSet<String>,
    next_id: i64,
}

impl MemoryDest {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    /// Insert a pre-existing user account, returning its id.
    pub fn seed_user(&mut self, username: &str, role: &str) -> i64 {
        let now = Utc::now();
        let dates_id = self.next_id();
        self.dates.push(DatesRow {
            id: dates_id,
            creation: now,
            last_modification: now,
        });

        let id = self.next_id();
        self.users.push(UserRow {
            id,
            username: username.to_string(),
            first_name: String::new(),
            last_name: String::new(),
            email: username.to_string(),
            password: String::new(),
            is_active: true,
            is_superuser: role == Role::SuperAdmins.as_str(),
            date_joined: now,
            role: role.to_string(),
            dates_id,
            created_by: id,
        });
        id
    }

    /// Insert a pre-existing permission group, returning its id.
    pub fn seed_group(&mut self, name: &str) -> i64 {
        let id = self.next_id();
        self.groups.push(GroupRow {
            id,
            name: name.to_string(),
        });
        id
    }

    pub fn user(&self, username: &str) -> Option<&UserRow> {
        self.users.iter().find(|u| u.username == username)
    }

    pub fn domain(&self, name: &str) -> Option<&DomainRow> {
        self.domains.iter().find(|d| d.name == name)
    }

    pub fn mailbox_of(&self, username: &str) -> Option<&MailboxRow> {
        let user = self.user(username)?;
        self.mailboxes.iter().find(|m| m.user_id == user.id)
    }

    pub fn alias(&self, address: &str) -> Option<&AliasRow> {
        self.aliases.iter().find(|a| a.address == address)
    }

    pub fn recipients_of(&self, alias_address: &str) -> Vec<&RecipientRow> {
        match self.alias(alias_address) {
            Some(alias) => self
                .recipients
                .iter()
                .filter(|r| r.alias_id == alias.id)
                .collect(),
            None => Vec::new(),
        }
    }

    pub fn dates(&self, id: i64) -> Option<&DatesRow> {
        self.dates.iter().find(|d| d.id == id)
    }

    pub fn is_group_member(&self, username: &str, group_name: &str) -> bool {
        let Some(user) = self.user(username) else {
            return false;
        };
        let Some(group) = self.groups.iter().find(|g| g.name == group_name) else {
            return false;
        };
        self.group_members.contains(&(user.id, group.id))
    }

    pub fn is_domain_admin(&self, domain_name: &str, username: &str) -> bool {
        let Some(domain) = self.domain(domain_name) else {
            return false;
        };
        let Some(user) = self.user(username) else {
            return false;
        };
        self.domain_admins.contains(&(domain.id, user.id))
    }
}

#[async_trait]
impl DestStore for MemoryDest {
    async fn user_by_username(&mut self, username: &str) -> Result<Option<DestUser>> {
        Ok(self.user(username).map(|u| DestUser {
            id: u.id,
            username: u.username.clone(),
            role: u.role.clone(),
        }))
    }

    async fn group_id(&mut self, name: &str) -> Result<Option<i64>> {
        Ok(self.groups.iter().find(|g| g.name == name).map(|g| g.id))
    }

    async fn domain_by_name(&mut self, name: &str) -> Result<Option<DestDomain>> {
        if self.missing_domains.contains(name) {
            return Ok(None);
        }
        Ok(self.domain(name).map(|d| DestDomain {
            id: d.id,
            name: d.name.clone(),
        }))
    }

    async fn mailbox_by_owner(&mut self, username: &str) -> Result<Option<i64>> {
        Ok(self.mailbox_of(username).map(|m| m.id))
    }

    async fn create_dates(&mut self, dates: &AuditDates) -> Result<i64> {
        let id = self.next_id();
        self.dates.push(DatesRow {
            id,
            creation: dates.creation,
            last_modification: dates.last_modification,
        });
        Ok(id)
    }

    async fn create_domain(
        &mut self,
        domain: &NewDomain,
        dates_id: i64,
        created_by: i64,
    ) -> Result<DestDomain> {
        let id = self.next_id();
        self.domains.push(DomainRow {
            id,
            name: domain.name.clone(),
            quota: domain.quota,
            enabled: domain.enabled,
            dates_id,
            created_by,
        });
        Ok(DestDomain {
            id,
            name: domain.name.clone(),
        })
    }

    async fn create_domain_alias(
        &mut self,
        alias: &NewDomainAlias,
        dates_id: i64,
        created_by: i64,
    ) -> Result<()> {
        let id = self.next_id();
        self.domain_aliases.push(DomainAliasRow {
            id,
            name: alias.name.clone(),
            target_id: alias.target_id,
            enabled: alias.enabled,
            dates_id,
            created_by,
        });
        Ok(())
    }

    async fn create_user(
        &mut self,
        user: &NewUser,
        dates_id: i64,
        created_by: i64,
    ) -> Result<DestUser> {
        let id = self.next_id();
        self.users.push(UserRow {
            id,
            username: user.username.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email: user.email.clone(),
            password: user.password.clone(),
            is_active: user.is_active,
            is_superuser: user.is_superuser,
            date_joined: user.date_joined,
            role: user.role.as_str().to_string(),
            dates_id,
            created_by,
        });
        Ok(DestUser {
            id,
            username: user.username.clone(),
            role: user.role.as_str().to_string(),
        })
    }

    async fn create_mailbox(
        &mut self,
        mailbox: &NewMailbox,
        dates_id: i64,
        created_by: i64,
    ) -> Result<i64> {
        let id = self.next_id();
        self.mailboxes.push(MailboxRow {
            id,
            user_id: mailbox.user_id,
            address: mailbox.address.clone(),
            domain_id: mailbox.domain_id,
            quota: mailbox.quota,
            dates_id,
            created_by,
        });
        Ok(id)
    }

    async fn create_alias(
        &mut self,
        alias: &NewAlias,
        dates_id: i64,
        created_by: i64,
    ) -> Result<i64> {
        let id = self.next_id();
        self.aliases.push(AliasRow {
            id,
            address: alias.address.clone(),
            domain_id: alias.domain_id,
            enabled: alias.enabled,
            dates_id,
            created_by,
        });
        Ok(id)
    }

    async fn add_alias_recipients(
        &mut self,
        alias_id: i64,
        recipients: &[NewAliasRecipient],
    ) -> Result<()> {
        for recipient in recipients {
            let id = self.next_id();
            self.recipients.push(RecipientRow {
                id,
                address: recipient.address.clone(),
                alias_id,
                r_mailbox_id: recipient.r_mailbox_id,
            });
        }
        Ok(())
    }

    async fn promote_user(
        &mut self,
        user_id: i64,
        role: Role,
        is_superuser: bool,
        password: &str,
        date_joined: Option<DateTime<Utc>>,
    ) -> Result<()> {
        if let Some(user) = self.users.iter_mut().find(|u| u.id == user_id) {
            user.role = role.as_str().to_string();
            user.is_superuser = is_superuser;
            user.password = password.to_string();
            if let Some(date_joined) = date_joined {
                user.date_joined = date_joined;
            }
        }
        Ok(())
    }

    async fn add_user_to_group(&mut self, user_id: i64, group_id: i64) -> Result<()> {
        if !self.group_members.contains(&(user_id, group_id)) {
            self.group_members.push((user_id, group_id));
        }
        Ok(())
    }

    async fn add_domain_admin(&mut self, domain_id: i64, user_id: i64) -> Result<()> {
        if !self.domain_admins.contains(&(domain_id, user_id)) {
            self.domain_admins.push((domain_id, user_id));
        }
        Ok(())
    }
}
