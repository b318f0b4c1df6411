use anyhow::Result;
use chrono::{DateTime, Utc};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::info;

use crate::entities::accounts::AccountStatus;
use crate::models::{Account, ExternalIdentity, NewAccount, ProfileChanges, StoredChallenge};
use crate::roles::RoleAssignment;

pub mod migrator;
pub mod repositories;

pub use repositories::account::{ExclusiveUpdate, InsertOutcome};

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
    write_gate: Arc<Mutex<()>>,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.contains(":memory:") {
            let path_str = db_url.trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self {
            conn,
            write_gate: Arc::new(Mutex::new(())),
        })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn account_repo(&self) -> repositories::account::AccountRepository {
        repositories::account::AccountRepository::new(self.conn.clone(), self.write_gate.clone())
    }

    pub async fn get_account_by_email(&self, email: &str) -> Result<Option<Account>> {
        self.account_repo().get_by_email(email).await
    }

    pub async fn get_account_by_id(&self, id: &str) -> Result<Option<Account>> {
        self.account_repo().get_by_id(id).await
    }

    pub async fn get_account_with_password(
        &self,
        email: &str,
    ) -> Result<Option<(Account, Option<String>)>> {
        self.account_repo().get_by_email_with_password(email).await
    }

    pub async fn insert_account_exclusive(&self, account: NewAccount) -> Result<InsertOutcome> {
        self.account_repo().insert_exclusive(account).await
    }

    pub async fn find_or_insert_partial_account(
        &self,
        email: &str,
        name: &str,
        identity: Option<&ExternalIdentity>,
    ) -> Result<(Account, bool)> {
        self.account_repo()
            .find_or_insert_partial(email, name, identity)
            .await
    }

    pub async fn assign_role_exclusive(
        &self,
        id: &str,
        role: RoleAssignment,
    ) -> Result<ExclusiveUpdate> {
        self.account_repo().assign_role_exclusive(id, role).await
    }

    pub async fn apply_profile_update(
        &self,
        id: &str,
        changes: ProfileChanges,
    ) -> Result<ExclusiveUpdate> {
        self.account_repo().apply_profile(id, changes).await
    }

    pub async fn set_password_hash(&self, id: &str, password_hash: String) -> Result<bool> {
        self.account_repo()
            .set_password_hash(id, password_hash)
            .await
    }

    pub async fn store_challenge(
        &self,
        id: &str,
        code: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<bool> {
        self.account_repo()
            .store_challenge(id, code, expires_at)
            .await
    }

    pub async fn get_challenge(&self, id: &str) -> Result<Option<StoredChallenge>> {
        self.account_repo().get_challenge(id).await
    }

    pub async fn clear_challenge_if_matches(&self, id: &str, code: &str) -> Result<bool> {
        self.account_repo()
            .clear_challenge_if_matches(id, code)
            .await
    }

    pub async fn set_account_status(
        &self,
        id: &str,
        status: AccountStatus,
    ) -> Result<Option<Account>> {
        self.account_repo().set_status(id, status).await
    }

    pub async fn admin_exists(&self) -> Result<bool> {
        self.account_repo().admin_exists().await
    }
}
