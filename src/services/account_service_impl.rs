//! `SeaORM` implementation of the `AccountService` trait.

use async_trait::async_trait;
use tracing::info;

use crate::db::Store;
use crate::entities::accounts::AccountStatus;
use crate::models::{Account, AccountSummary};
use crate::services::account_service::AccountService;
use crate::services::onboarding_service::OnboardingError;

pub struct SeaOrmAccountService {
    store: Store,
}

impl SeaOrmAccountService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }
}

#[async_trait]
impl AccountService for SeaOrmAccountService {
    async fn get_account(&self, account_id: &str) -> Result<Account, OnboardingError> {
        self.store
            .get_account_by_id(account_id)
            .await?
            .ok_or(OnboardingError::AccountNotFound)
    }

    async fn get_summary(&self, account_id: &str) -> Result<AccountSummary, OnboardingError> {
        let account = self.get_account(account_id).await?;
        Ok((&account).into())
    }

    async fn set_status(
        &self,
        actor_id: &str,
        target_id: &str,
        status: AccountStatus,
    ) -> Result<AccountSummary, OnboardingError> {
        let actor = self
            .store
            .get_account_by_id(actor_id)
            .await?
            .ok_or(OnboardingError::Forbidden)?;

        if !actor.is_admin() {
            return Err(OnboardingError::Forbidden);
        }

        let account = self
            .store
            .set_account_status(target_id, status)
            .await?
            .ok_or(OnboardingError::AccountNotFound)?;

        info!(actor_id, target_id, status = ?status, "Account status changed");
        Ok((&account).into())
    }
}
