use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, Set, TransactionTrait,
};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::warn;

use crate::entities::accounts::{self, AccountStatus};
use crate::entities::prelude::Accounts;
use crate::models::{Account, ExternalIdentity, NewAccount, ProfileChanges, StoredChallenge};
use crate::roles::{ADMIN_CATEGORY, RoleAssignment};

/// Result of the signup check-then-insert.
#[derive(Debug)]
pub enum InsertOutcome {
    Inserted(Account),
    DuplicateEmail,
    AdminExists,
}

/// Result of an update that may move an account into the admin category.
#[derive(Debug)]
pub enum ExclusiveUpdate {
    Updated(Account),
    NotFound,
    AdminExists,
}

pub struct AccountRepository {
    conn: DatabaseConnection,
    /// Serialises the multi-statement check-then-write sequences so two
    /// requests can never both pass the same uniqueness check.
    write_gate: Arc<Mutex<()>>,
}

impl AccountRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection, write_gate: Arc<Mutex<()>>) -> Self {
        Self { conn, write_gate }
    }

    /// Get account by email (exact, case-sensitive match)
    pub async fn get_by_email(&self, email: &str) -> Result<Option<Account>> {
        let account = find_by_email(&self.conn, email)
            .await
            .context("Failed to query account by email")?;

        Ok(account.map(Account::from))
    }

    pub async fn get_by_id(&self, id: &str) -> Result<Option<Account>> {
        let account = Accounts::find_by_id(id.to_string())
            .one(&self.conn)
            .await
            .context("Failed to query account by ID")?;

        Ok(account.map(Account::from))
    }

    /// Get account by email together with its password hash (for login)
    pub async fn get_by_email_with_password(
        &self,
        email: &str,
    ) -> Result<Option<(Account, Option<String>)>> {
        let account = find_by_email(&self.conn, email)
            .await
            .context("Failed to query account for password verification")?;

        Ok(account.map(|a| {
            let password_hash = a.password_hash.clone();
            (Account::from(a), password_hash)
        }))
    }

    /// Inserts a password account unless the email is taken or the account
    /// would become a second administrator. Check and insert run in one
    /// transaction behind the write gate.
    pub async fn insert_exclusive(&self, new_account: NewAccount) -> Result<InsertOutcome> {
        let _guard = self.write_gate.lock().await;
        let txn = self.conn.begin().await?;

        if find_by_email(&txn, &new_account.email).await?.is_some() {
            txn.rollback().await?;
            return Ok(InsertOutcome::DuplicateEmail);
        }

        if new_account.role.is_admin() && admin_exists(&txn, None).await? {
            txn.rollback().await?;
            return Ok(InsertOutcome::AdminExists);
        }

        let now = Utc::now().to_rfc3339();
        let model = accounts::ActiveModel {
            id: Set(uuid::Uuid::new_v4().to_string()),
            email: Set(new_account.email),
            name: Set(new_account.name),
            password_hash: Set(Some(new_account.password_hash)),
            role_category: Set(Some(new_account.role.category)),
            role_sub_category: Set(Some(new_account.role.sub_category)),
            profile_completed: Set(false),
            status: Set(new_account.status),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .context("Failed to insert account")?;

        txn.commit().await?;
        Ok(InsertOutcome::Inserted(model.into()))
    }

    /// Returns the account for `email`, creating a partial one when absent.
    ///
    /// An existing account without an external subject gets `identity` linked
    /// onto it; an already linked account is never re-linked.
    pub async fn find_or_insert_partial(
        &self,
        email: &str,
        name: &str,
        identity: Option<&ExternalIdentity>,
    ) -> Result<(Account, bool)> {
        let _guard = self.write_gate.lock().await;
        let txn = self.conn.begin().await?;

        if let Some(existing) = find_by_email(&txn, email).await? {
            let account = match identity {
                Some(identity) if existing.external_subject_id.is_none() => {
                    if subject_taken(&txn, &identity.subject_id).await? {
                        warn!(
                            account_id = %existing.id,
                            "External subject already linked to another account, not linking"
                        );
                        existing
                    } else {
                        let mut active: accounts::ActiveModel = existing.into();
                        active.external_subject_id = Set(Some(identity.subject_id.clone()));
                        active.auth_provider = Set(Some(identity.provider.clone()));
                        active.updated_at = Set(Utc::now().to_rfc3339());
                        active.update(&txn).await?
                    }
                }
                _ => existing,
            };

            txn.commit().await?;
            return Ok((account.into(), false));
        }

        let identity = match identity {
            Some(identity) => {
                if subject_taken(&txn, &identity.subject_id).await? {
                    warn!(email, "External subject already linked elsewhere, creating unlinked account");
                    None
                } else {
                    Some(identity)
                }
            }
            None => None,
        };

        let now = Utc::now().to_rfc3339();
        let model = accounts::ActiveModel {
            id: Set(uuid::Uuid::new_v4().to_string()),
            email: Set(email.to_string()),
            name: Set(name.to_string()),
            external_subject_id: Set(identity.map(|i| i.subject_id.clone())),
            auth_provider: Set(identity.map(|i| i.provider.clone())),
            profile_completed: Set(false),
            status: Set(AccountStatus::Pending),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .context("Failed to insert partial account")?;

        txn.commit().await?;
        Ok((model.into(), true))
    }

    /// Sets category/sub-category, refusing to create a second administrator.
    pub async fn assign_role_exclusive(
        &self,
        id: &str,
        role: RoleAssignment,
    ) -> Result<ExclusiveUpdate> {
        let _guard = self.write_gate.lock().await;
        let txn = self.conn.begin().await?;

        let Some(model) = Accounts::find_by_id(id.to_string()).one(&txn).await? else {
            txn.rollback().await?;
            return Ok(ExclusiveUpdate::NotFound);
        };

        if role.is_admin() && admin_exists(&txn, Some(id)).await? {
            txn.rollback().await?;
            return Ok(ExclusiveUpdate::AdminExists);
        }

        let mut active: accounts::ActiveModel = model.into();
        active.role_category = Set(Some(role.category));
        active.role_sub_category = Set(Some(role.sub_category));
        active.updated_at = Set(Utc::now().to_rfc3339());
        let updated = active.update(&txn).await?;

        txn.commit().await?;
        Ok(ExclusiveUpdate::Updated(updated.into()))
    }

    /// Applies provided fields only and marks the profile completed.
    pub async fn apply_profile(&self, id: &str, changes: ProfileChanges) -> Result<ExclusiveUpdate> {
        let _guard = self.write_gate.lock().await;
        let txn = self.conn.begin().await?;

        let Some(model) = Accounts::find_by_id(id.to_string()).one(&txn).await? else {
            txn.rollback().await?;
            return Ok(ExclusiveUpdate::NotFound);
        };

        let becomes_admin = changes.category.as_deref() == Some(ADMIN_CATEGORY)
            && model.role_category.as_deref() != Some(ADMIN_CATEGORY);
        if becomes_admin && admin_exists(&txn, Some(id)).await? {
            txn.rollback().await?;
            return Ok(ExclusiveUpdate::AdminExists);
        }

        let mut active: accounts::ActiveModel = model.into();
        if let Some(name) = changes.name {
            active.name = Set(name);
        }
        if let Some(phone) = changes.phone {
            active.phone = Set(Some(phone));
        }
        if let Some(address) = changes.address {
            active.address = Set(Some(address));
        }
        if let Some(coordinates) = changes.coordinates {
            active.latitude = Set(Some(coordinates.lat));
            active.longitude = Set(Some(coordinates.lon));
        }
        if let Some(bio) = changes.bio {
            active.bio = Set(Some(bio));
        }
        if let Some(category) = changes.category {
            active.role_category = Set(Some(category));
        }
        if let Some(sub_category) = changes.sub_category {
            active.role_sub_category = Set(Some(sub_category));
        }
        if let Some(portfolio_url) = changes.portfolio_url {
            active.portfolio_url = Set(Some(portfolio_url));
        }
        if let Some(years) = changes.experience_years {
            active.experience_years = Set(Some(years));
        }
        if let Some(specialization) = changes.specialization {
            active.specialization = Set(Some(specialization));
        }
        if let Some(resume_path) = changes.resume_path {
            active.resume_path = Set(Some(resume_path));
        }
        active.profile_completed = Set(true);
        active.updated_at = Set(Utc::now().to_rfc3339());
        let updated = active.update(&txn).await?;

        txn.commit().await?;
        Ok(ExclusiveUpdate::Updated(updated.into()))
    }

    /// Replace the password hash. Returns false when the account does not exist.
    pub async fn set_password_hash(&self, id: &str, password_hash: String) -> Result<bool> {
        let result = Accounts::update_many()
            .col_expr(accounts::Column::PasswordHash, Expr::value(Some(password_hash)))
            .col_expr(accounts::Column::UpdatedAt, Expr::value(Utc::now().to_rfc3339()))
            .filter(accounts::Column::Id.eq(id))
            .exec(&self.conn)
            .await
            .context("Failed to update password hash")?;

        Ok(result.rows_affected > 0)
    }

    /// Overwrites any previous challenge in a single statement.
    pub async fn store_challenge(
        &self,
        id: &str,
        code: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<bool> {
        let result = Accounts::update_many()
            .col_expr(accounts::Column::OtpCode, Expr::value(Some(code.to_string())))
            .col_expr(
                accounts::Column::OtpExpiresAt,
                Expr::value(Some(expires_at.to_rfc3339())),
            )
            .col_expr(accounts::Column::UpdatedAt, Expr::value(Utc::now().to_rfc3339()))
            .filter(accounts::Column::Id.eq(id))
            .exec(&self.conn)
            .await
            .context("Failed to store recovery challenge")?;

        Ok(result.rows_affected > 0)
    }

    pub async fn get_challenge(&self, id: &str) -> Result<Option<StoredChallenge>> {
        let account = Accounts::find_by_id(id.to_string())
            .one(&self.conn)
            .await
            .context("Failed to query recovery challenge")?;

        let Some((code, expires_at)) = account.and_then(|a| a.otp_code.zip(a.otp_expires_at))
        else {
            return Ok(None);
        };

        let expires_at = DateTime::parse_from_rfc3339(&expires_at)
            .with_context(|| format!("Malformed challenge expiry for account {id}"))?
            .with_timezone(&Utc);

        Ok(Some(StoredChallenge { code, expires_at }))
    }

    /// Clears the challenge only if it still holds `code`. A concurrent
    /// re-issue makes this return false instead of clearing the new code.
    pub async fn clear_challenge_if_matches(&self, id: &str, code: &str) -> Result<bool> {
        let result = Accounts::update_many()
            .col_expr(accounts::Column::OtpCode, Expr::value(Option::<String>::None))
            .col_expr(accounts::Column::OtpExpiresAt, Expr::value(Option::<String>::None))
            .col_expr(accounts::Column::UpdatedAt, Expr::value(Utc::now().to_rfc3339()))
            .filter(accounts::Column::Id.eq(id))
            .filter(accounts::Column::OtpCode.eq(code))
            .exec(&self.conn)
            .await
            .context("Failed to clear recovery challenge")?;

        Ok(result.rows_affected > 0)
    }

    pub async fn set_status(&self, id: &str, status: AccountStatus) -> Result<Option<Account>> {
        let Some(model) = Accounts::find_by_id(id.to_string())
            .one(&self.conn)
            .await
            .context("Failed to query account for status update")?
        else {
            return Ok(None);
        };

        let mut active: accounts::ActiveModel = model.into();
        active.status = Set(status);
        active.updated_at = Set(Utc::now().to_rfc3339());
        let updated = active.update(&self.conn).await?;

        Ok(Some(updated.into()))
    }

    pub async fn admin_exists(&self) -> Result<bool> {
        admin_exists(&self.conn, None).await
    }
}

async fn find_by_email<C: ConnectionTrait>(conn: &C, email: &str) -> Result<Option<accounts::Model>> {
    Ok(Accounts::find()
        .filter(accounts::Column::Email.eq(email))
        .one(conn)
        .await?)
}

async fn subject_taken<C: ConnectionTrait>(conn: &C, subject_id: &str) -> Result<bool> {
    let count = Accounts::find()
        .filter(accounts::Column::ExternalSubjectId.eq(subject_id))
        .count(conn)
        .await?;

    Ok(count > 0)
}

async fn admin_exists<C: ConnectionTrait>(conn: &C, excluding: Option<&str>) -> Result<bool> {
    let mut query = Accounts::find().filter(accounts::Column::RoleCategory.eq(ADMIN_CATEGORY));
    if let Some(id) = excluding {
        query = query.filter(accounts::Column::Id.ne(id));
    }

    Ok(query.count(conn).await? > 0)
}
