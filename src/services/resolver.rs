use tracing::info;

use crate::db::Store;
use crate::models::{Account, ExternalIdentity};
use crate::services::onboarding_service::OnboardingError;

/// Maps an email to its account, provisioning a partial account when none
/// exists. Never deletes or merges accounts.
#[derive(Clone)]
pub struct AccountResolver {
    store: Store,
}

impl AccountResolver {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }

    /// Returns the account and whether it was created by this call.
    ///
    /// An existing account gets `identity` linked only while it has no
    /// external subject yet. A new account carries the email, the seed name
    /// (or the email's local part) and the identity, with no role and
    /// `profile_completed = false`.
    pub async fn find_or_create_by_email(
        &self,
        email: &str,
        seed_name: Option<&str>,
        identity: Option<&ExternalIdentity>,
    ) -> Result<(Account, bool), OnboardingError> {
        let name = seed_name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| default_name(email));

        let (account, created) = self
            .store
            .find_or_insert_partial_account(email, name, identity)
            .await?;

        if created {
            info!(account_id = %account.id, "Provisioned partial account");
        }

        Ok((account, created))
    }
}

fn default_name(email: &str) -> &str {
    email.split('@').next().unwrap_or(email)
}
