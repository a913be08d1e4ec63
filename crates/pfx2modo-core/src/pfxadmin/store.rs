use sqlx::postgres::PgPool;

use crate::error::Result;

use super::{
    PfxAdmin, PfxAlias, PfxAliasDomain, PfxDomain, PfxMailbox, SourceCounts, SourceStore,
    ALL_DOMAINS,
};

/// [`SourceStore`] backed by a live PostfixAdmin database.
pub struct PgSourceStore {
    pool: PgPool,
}

impl PgSourceStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl SourceStore for PgSourceStore {
    async fn domains(&self) -> Result<Vec<PfxDomain>> {
        let domains: Vec<PfxDomain> = sqlx::query_as(
            r#"
            SELECT domain, maxquota, active, created
            FROM domain
            WHERE domain <> $1
            ORDER BY domain
            "#,
        )
        .bind(ALL_DOMAINS)
        .fetch_all(&self.pool)
        .await?;

        Ok(domains)
    }

    async fn is_alias_domain(&self, name: &str) -> Result<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM alias_domain WHERE alias_domain = $1")
            .bind(name)
            .fetch_one(&self.pool)
            .await?;

        Ok(count > 0)
    }

    async fn alias_domains_targeting(&self, target: &str) -> Result<Vec<PfxAliasDomain>> {
        let aliases: Vec<PfxAliasDomain> = sqlx::query_as(
            r#"
            SELECT alias_domain, target_domain, active, created
            FROM alias_domain
            WHERE target_domain = $1
            ORDER BY alias_domain
            "#,
        )
        .bind(target)
        .fetch_all(&self.pool)
        .await?;

        Ok(aliases)
    }

    async fn mailboxes(&self, domain: &str) -> Result<Vec<PfxMailbox>> {
        let mailboxes: Vec<PfxMailbox> = sqlx::query_as(
            r#"
            SELECT username, name, password, quota, domain, active, created
            FROM mailbox
            WHERE domain = $1
            ORDER BY username
            "#,
        )
        .bind(domain)
        .fetch_all(&self.pool)
        .await?;

        Ok(mailboxes)
    }

    async fn aliases(&self, domain: &str) -> Result<Vec<PfxAlias>> {
        let aliases: Vec<PfxAlias> = sqlx::query_as(
            r#"
            SELECT address, goto, domain, active, created
            FROM alias
            WHERE domain = $1
            ORDER BY address
            "#,
        )
        .bind(domain)
        .fetch_all(&self.pool)
        .await?;

        Ok(aliases)
    }

    async fn admins(&self, domain: &str) -> Result<Vec<PfxAdmin>> {
        let admins: Vec<PfxAdmin> = sqlx::query_as(
            r#"
            SELECT a.username, a.password, a.active, a.created, a.modified
            FROM domain_admins da
            JOIN admin a ON a.username = da.username
            WHERE da.domain = $1 AND da.active = TRUE
            ORDER BY a.username
            "#,
        )
        .bind(domain)
        .fetch_all(&self.pool)
        .await?;

        Ok(admins)
    }

    async fn counts(&self) -> Result<SourceCounts> {
        let domains: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM domain WHERE domain <> $1")
            .bind(ALL_DOMAINS)
            .fetch_one(&self.pool)
            .await?;
        let alias_domains: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM alias_domain")
            .fetch_one(&self.pool)
            .await?;
        let mailboxes: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM mailbox")
            .fetch_one(&self.pool)
            .await?;
        let aliases: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM alias")
            .fetch_one(&self.pool)
            .await?;
        let admins: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM admin")
            .fetch_one(&self.pool)
            .await?;

        Ok(SourceCounts {
            domains,
            alias_domains,
            mailboxes,
            aliases,
            admins,
        })
    }
}
