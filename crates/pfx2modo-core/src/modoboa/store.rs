use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, Postgres};
use sqlx::{QueryBuilder, Transaction};

use crate::error::Result;

use super::{
    AuditDates, DestDomain, DestStore, DestUser, NewAlias, NewAliasRecipient, NewDomain,
    NewDomainAlias, NewMailbox, NewUser, Role,
};

/// [`DestStore`] backed by a live Modoboa database.
///
/// All writes go through one transaction held for the whole run. Dropping
/// the store without calling [`commit`](Self::commit) rolls everything
/// back, so an aborted run cannot leave a half-migrated destination.
pub struct PgDestStore {
    tx: Transaction<'static, Postgres>,
}

impl PgDestStore {
    /// Open the migration transaction.
    pub async fn begin(pool: &PgPool) -> Result<Self> {
        Ok(Self {
            tx: pool.begin().await?,
        })
    }

    /// Commit everything written during the run.
    pub async fn commit(self) -> Result<()> {
        self.tx.commit().await?;
        Ok(())
    }

    /// Discard everything written during the run.
    pub async fn rollback(self) -> Result<()> {
        self.tx.rollback().await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl DestStore for PgDestStore {
    async fn user_by_username(&mut self, username: &str) -> Result<Option<DestUser>> {
        let user: Option<DestUser> =
            sqlx::query_as("SELECT id, username, role FROM core_user WHERE username = $1")
                .bind(username)
                .fetch_optional(&mut *self.tx)
                .await?;

        Ok(user)
    }

    async fn group_id(&mut self, name: &str) -> Result<Option<i64>> {
        let id: Option<i64> = sqlx::query_scalar("SELECT id FROM auth_group WHERE name = $1")
            .bind(name)
            .fetch_optional(&mut *self.tx)
            .await?;

        Ok(id)
    }

    async fn domain_by_name(&mut self, name: &str) -> Result<Option<DestDomain>> {
        let domain: Option<DestDomain> =
            sqlx::query_as("SELECT id, name FROM admin_domain WHERE name = $1")
                .bind(name)
                .fetch_optional(&mut *self.tx)
                .await?;

        Ok(domain)
    }

    async fn mailbox_by_owner(&mut self, username: &str) -> Result<Option<i64>> {
        let id: Option<i64> = sqlx::query_scalar(
            r#"
            SELECT mb.id
            FROM admin_mailbox mb
            JOIN core_user u ON u.id = mb.user_id
            WHERE u.username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(id)
    }

    async fn create_dates(&mut self, dates: &AuditDates) -> Result<i64> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO admin_objectdates (creation, last_modification)
            VALUES ($1, $2)
            RETURNING id
            "#,
        )
        .bind(dates.creation)
        .bind(dates.last_modification)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(id)
    }

    async fn create_domain(
        &mut self,
        domain: &NewDomain,
        dates_id: i64,
        created_by: i64,
    ) -> Result<DestDomain> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO admin_domain (name, quota, enabled, dates_id, created_by)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(&domain.name)
        .bind(domain.quota)
        .bind(domain.enabled)
        .bind(dates_id)
        .bind(created_by)
        .fetch_one(&mut *self.tx)
        .await?;

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
        sqlx::query(
            r#"
            INSERT INTO admin_domainalias (name, target_id, enabled, dates_id, created_by)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(&alias.name)
        .bind(alias.target_id)
        .bind(alias.enabled)
        .bind(dates_id)
        .bind(created_by)
        .execute(&mut *self.tx)
        .await?;

        Ok(())
    }

    async fn create_user(
        &mut self,
        user: &NewUser,
        dates_id: i64,
        created_by: i64,
    ) -> Result<DestUser> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO core_user
                (username, first_name, last_name, email, password,
                 is_active, is_superuser, date_joined, role, dates_id, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING id
            "#,
        )
        .bind(&user.username)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.email)
        .bind(&user.password)
        .bind(user.is_active)
        .bind(user.is_superuser)
        .bind(user.date_joined)
        .bind(user.role.as_str())
        .bind(dates_id)
        .bind(created_by)
        .fetch_one(&mut *self.tx)
        .await?;

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
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO admin_mailbox (user_id, address, domain_id, quota, dates_id, created_by)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(mailbox.user_id)
        .bind(&mailbox.address)
        .bind(mailbox.domain_id)
        .bind(mailbox.quota)
        .bind(dates_id)
        .bind(created_by)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(id)
    }

    async fn create_alias(
        &mut self,
        alias: &NewAlias,
        dates_id: i64,
        created_by: i64,
    ) -> Result<i64> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO admin_alias (address, domain_id, enabled, dates_id, created_by)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(&alias.address)
        .bind(alias.domain_id)
        .bind(alias.enabled)
        .bind(dates_id)
        .bind(created_by)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(id)
    }

    async fn add_alias_recipients(
        &mut self,
        alias_id: i64,
        recipients: &[NewAliasRecipient],
    ) -> Result<()> {
        // push_values with no rows would build invalid SQL
        if recipients.is_empty() {
            return Ok(());
        }

        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new("INSERT INTO admin_aliasrecipient (address, alias_id, r_mailbox_id) ");
        builder.push_values(recipients, |mut row, recipient| {
            row.push_bind(&recipient.address)
                .push_bind(alias_id)
                .push_bind(recipient.r_mailbox_id);
        });
        builder.build().execute(&mut *self.tx).await?;

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
        sqlx::query(
            r#"
            UPDATE core_user
            SET role = $1,
                is_superuser = $2,
                password = $3,
                date_joined = COALESCE($4, date_joined)
            WHERE id = $5
            "#,
        )
        .bind(role.as_str())
        .bind(is_superuser)
        .bind(password)
        .bind(date_joined)
        .bind(user_id)
        .execute(&mut *self.tx)
        .await?;

        Ok(())
    }

    async fn add_user_to_group(&mut self, user_id: i64, group_id: i64) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO core_user_groups (user_id, group_id)
            VALUES ($1, $2)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(group_id)
        .execute(&mut *self.tx)
        .await?;

        Ok(())
    }

    async fn add_domain_admin(&mut self, domain_id: i64, user_id: i64) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO admin_domain_admins (domain_id, user_id)
            VALUES ($1, $2)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(domain_id)
        .bind(user_id)
        .execute(&mut *self.tx)
        .await?;

        Ok(())
    }
}
