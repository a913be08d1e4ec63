//! Write-side view of a Modoboa database.

mod store;

pub use store::PgDestStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;

/// Name of the permission group domain administrators belong to.
pub const DOMAIN_ADMINS_GROUP: &str = "DomainAdmins";

/// Account roles the destination distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    SimpleUsers,
    DomainAdmins,
    SuperAdmins,
}

impl Role {
    /// Role name as stored in the `core_user.role` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::SimpleUsers => "SimpleUsers",
            Role::DomainAdmins => "DomainAdmins",
            Role::SuperAdmins => "SuperAdmins",
        }
    }
}

/// Creation and modification timestamps attached to every migrated record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuditDates {
    pub creation: DateTime<Utc>,
    pub last_modification: DateTime<Utc>,
}

impl AuditDates {
    /// Dates for a record migrated at instant `now`.
    ///
    /// Creation is carried over from the source when it recorded one. The
    /// source keeps no usable modification timestamp, so the migration
    /// instant stands in for it on every record of a run.
    pub fn from_source(created: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Self {
        Self {
            creation: created.unwrap_or(now),
            last_modification: now,
        }
    }
}

/// An existing destination user account.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DestUser {
    pub id: i64,
    pub username: String,
    pub role: String,
}

/// An existing destination domain.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DestDomain {
    pub id: i64,
    pub name: String,
}

/// A domain to create.
#[derive(Debug, Clone)]
pub struct NewDomain {
    pub name: String,
    pub quota: i64,
    pub enabled: bool,
}

/// A domain alias to create.
#[derive(Debug, Clone)]
pub struct NewDomainAlias {
    pub name: String,
    pub target_id: i64,
    pub enabled: bool,
}

/// A user account to create.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub is_active: bool,
    pub is_superuser: bool,
    pub date_joined: DateTime<Utc>,
    pub role: Role,
}

/// A mailbox to create.
///
/// `address` is the local part only; the full address is reconstructed from
/// the owning domain.
#[derive(Debug, Clone)]
pub struct NewMailbox {
    pub user_id: i64,
    pub address: String,
    pub domain_id: i64,
    pub quota: i64,
}

/// A mail alias to create.
#[derive(Debug, Clone)]
pub struct NewAlias {
    pub address: String,
    pub domain_id: i64,
    pub enabled: bool,
}

/// One recipient of an alias.
///
/// `r_mailbox_id` links the recipient to a local mailbox when its address
/// resolves to one; external recipients keep it unset.
#[derive(Debug, Clone)]
pub struct NewAliasRecipient {
    pub address: String,
    pub r_mailbox_id: Option<i64>,
}

/// Write access to a Modoboa database.
///
/// The Postgres implementation wraps a single transaction: everything
/// created through the store is committed or rolled back as a whole, so a
/// failed run leaves the destination untouched.
#[async_trait]
pub trait DestStore: Send {
    /// Look up a user account by name.
    async fn user_by_username(&mut self, username: &str) -> Result<Option<DestUser>>;

    /// Look up a permission group id by name.
    async fn group_id(&mut self, name: &str) -> Result<Option<i64>>;

    /// Look up a domain by name.
    async fn domain_by_name(&mut self, name: &str) -> Result<Option<DestDomain>>;

    /// Id of the mailbox owned by `username`, if any.
    async fn mailbox_by_owner(&mut self, username: &str) -> Result<Option<i64>>;

    /// Insert an audit dates record and return its id.
    async fn create_dates(&mut self, dates: &AuditDates) -> Result<i64>;

    /// Insert a domain and return it.
    async fn create_domain(
        &mut self,
        domain: &NewDomain,
        dates_id: i64,
        created_by: i64,
    ) -> Result<DestDomain>;

    /// Insert a domain alias.
    async fn create_domain_alias(
        &mut self,
        alias: &NewDomainAlias,
        dates_id: i64,
        created_by: i64,
    ) -> Result<()>;

    /// Insert a user account and return it.
    async fn create_user(
        &mut self,
        user: &NewUser,
        dates_id: i64,
        created_by: i64,
    ) -> Result<DestUser>;

    /// Insert a mailbox and return its id.
    async fn create_mailbox(
        &mut self,
        mailbox: &NewMailbox,
        dates_id: i64,
        created_by: i64,
    ) -> Result<i64>;

    /// Insert a mail alias and return its id.
    async fn create_alias(
        &mut self,
        alias: &NewAlias,
        dates_id: i64,
        created_by: i64,
    ) -> Result<i64>;

    /// Insert all recipients of one alias in a single batch.
    async fn add_alias_recipients(
        &mut self,
        alias_id: i64,
        recipients: &[NewAliasRecipient],
    ) -> Result<()>;

    /// Update an existing account to an admin role.
    ///
    /// The admin password replaces the stored one. `date_joined` is only
    /// updated when the source recorded a timestamp.
    async fn promote_user(
        &mut self,
        user_id: i64,
        role: Role,
        is_superuser: bool,
        password: &str,
        date_joined: Option<DateTime<Utc>>,
    ) -> Result<()>;

    /// Add a user to a permission group, a no-op when already a member.
    async fn add_user_to_group(&mut self, user_id: i64, group_id: i64) -> Result<()>;

    /// Register a user as administrator of a domain, a no-op when already
    /// registered.
    async fn add_domain_admin(&mut self, domain_id: i64, user_id: i64) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_dates_carry_source_creation() {
        let created = Utc.with_ymd_and_hms(2014, 5, 1, 8, 0, 0).unwrap();
        let now = Utc.with_ymd_and_hms(2026, 8, 25, 12, 0, 0).unwrap();

        let dates = AuditDates::from_source(Some(created), now);
        assert_eq!(dates.creation, created);
        assert_eq!(dates.last_modification, now);
    }

    #[test]
    fn test_dates_default_to_migration_instant() {
        let now = Utc.with_ymd_and_hms(2026, 8, 25, 12, 0, 0).unwrap();

        let dates = AuditDates::from_source(None, now);
        assert_eq!(dates.creation, now);
        assert_eq!(dates.last_modification, now);
    }

    #[test]
    fn test_role_names() {
        assert_eq!(Role::SimpleUsers.as_str(), "SimpleUsers");
        assert_eq!(Role::DomainAdmins.as_str(), "DomainAdmins");
        assert_eq!(Role::SuperAdmins.as_str(), "SuperAdmins");
    }
}
