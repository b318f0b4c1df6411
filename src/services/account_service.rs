//! Domain service for account lookup and administration.

use crate::entities::accounts::AccountStatus;
use crate::models::{Account, AccountSummary};
use crate::services::onboarding_service::OnboardingError;

/// Domain service trait for account lookup and administration.
#[async_trait::async_trait]
pub trait AccountService: Send + Sync {
    /// Full account view for the signed-in account.
    async fn get_account(&self, account_id: &str) -> Result<Account, OnboardingError>;

    async fn get_summary(&self, account_id: &str) -> Result<AccountSummary, OnboardingError>;

    /// Changes the moderation status of `target_id`.
    ///
    /// # Errors
    ///
    /// Returns [`OnboardingError::Forbidden`] unless `actor_id` is the
    /// administrator.
    async fn set_status(
        &self,
        actor_id: &str,
        target_id: &str,
        status: AccountStatus,
    ) -> Result<AccountSummary, OnboardingError>;
}
