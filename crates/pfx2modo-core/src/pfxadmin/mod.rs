//! Read-only view of a PostfixAdmin database.

mod store;

pub use store::PgSourceStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;

/// Sentinel domain name PostfixAdmin uses to grant an admin rights on
/// every domain.
pub const ALL_DOMAINS: &str = "ALL";

/// A row of the `domain` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PfxDomain {
    pub domain: String,
    pub maxquota: i64,
    pub active: bool,
    pub created: Option<DateTime<Utc>>,
}

/// A row of the `alias_domain` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PfxAliasDomain {
    pub alias_domain: String,
    pub target_domain: String,
    pub active: bool,
    pub created: Option<DateTime<Utc>>,
}

/// A row of the `mailbox` table.
///
/// `username` is the full mail address, `name` the free-form display name.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PfxMailbox {
    pub username: String,
    pub name: String,
    pub password: String,
    pub quota: i64,
    pub domain: String,
    pub active: bool,
    pub created: Option<DateTime<Utc>>,
}

/// A row of the `alias` table.
///
/// `goto` holds the comma-separated recipient list.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PfxAlias {
    pub address: String,
    pub goto: String,
    pub domain: String,
    pub active: bool,
    pub created: Option<DateTime<Utc>>,
}

/// An admin account linked to a domain, `domain_admins` joined with `admin`.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PfxAdmin {
    pub username: String,
    pub password: String,
    pub active: bool,
    pub created: Option<DateTime<Utc>>,
    pub modified: Option<DateTime<Utc>>,
}

/// Per-table row counts, used by preflight reporting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SourceCounts {
    pub domains: i64,
    pub alias_domains: i64,
    pub mailboxes: i64,
    pub aliases: i64,
    pub admins: i64,
}

/// Read access to a PostfixAdmin database.
#[async_trait]
pub trait SourceStore: Send + Sync {
    /// All domains except the sentinel, ordered by name.
    async fn domains(&self) -> Result<Vec<PfxDomain>>;

    /// Whether `name` is declared as an alias of another domain.
    async fn is_alias_domain(&self, name: &str) -> Result<bool>;

    /// Alias domains whose target is `target`, ordered by name.
    async fn alias_domains_targeting(&self, target: &str) -> Result<Vec<PfxAliasDomain>>;

    /// Mailboxes belonging to `domain`, ordered by address.
    async fn mailboxes(&self, domain: &str) -> Result<Vec<PfxMailbox>>;

    /// Mailbox aliases belonging to `domain`, ordered by address.
    async fn aliases(&self, domain: &str) -> Result<Vec<PfxAlias>>;

    /// Admin accounts actively linked to `domain`, which may be the
    /// [`ALL_DOMAINS`] sentinel.
    async fn admins(&self, domain: &str) -> Result<Vec<PfxAdmin>>;

    /// Row counts of every table the migration reads.
    async fn counts(&self) -> Result<SourceCounts>;
}
