//! Verifies identity-provider access tokens.
//!
//! The primary user-info endpoint is asked first; on any failure there the
//! fallback endpoint is asked exactly once. Which of the two answered is kept
//! on the result.

use serde::Serialize;
use tracing::{debug, warn};

use crate::clients::identity_provider::{
    IdentityProviderClient, IdentityProviderError, ProviderUserInfo,
};
use crate::config::IdentityProviderConfig;
use crate::services::onboarding_service::OnboardingError;

/// Which endpoint produced the verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationAttempt {
    Primary,
    Fallback,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedIdentity {
    pub external_subject_id: String,
    pub email: String,
    pub display_name: Option<String>,
    pub attempt: VerificationAttempt,
}

pub struct IdentityProviderBridge {
    client: IdentityProviderClient,
    primary_url: String,
    fallback_url: String,
    provider_name: String,
}

impl IdentityProviderBridge {
    #[must_use]
    pub fn new(client: IdentityProviderClient, config: &IdentityProviderConfig) -> Self {
        Self {
            client,
            primary_url: config.primary_userinfo_url.clone(),
            fallback_url: config.fallback_userinfo_url.clone(),
            provider_name: config.name.clone(),
        }
    }

    #[must_use]
    pub fn provider_name(&self) -> &str {
        &self.provider_name
    }

    /// Runs the primary-then-fallback sequence and reports which step ended it.
    pub async fn attempt(
        &self,
        access_token: &str,
    ) -> (VerificationAttempt, Result<ProviderUserInfo, IdentityProviderError>) {
        let primary_err = match self
            .client
            .fetch_user_info(&self.primary_url, access_token)
            .await
        {
            Ok(info) => return (VerificationAttempt::Primary, Ok(info)),
            Err(e) => e,
        };

        debug!(error = %primary_err, "Primary user-info endpoint failed, trying fallback");

        match self
            .client
            .fetch_user_info(&self.fallback_url, access_token)
            .await
        {
            Ok(info) => (VerificationAttempt::Fallback, Ok(info)),
            Err(e) => (VerificationAttempt::Failed, Err(e)),
        }
    }

    /// Resolves a token to the provider's subject, email and display name.
    ///
    /// # Errors
    ///
    /// [`OnboardingError::InvalidExternalToken`] when both endpoints fail or
    /// the answering endpoint carries no email claim.
    pub async fn verify_token(
        &self,
        access_token: &str,
    ) -> Result<VerifiedIdentity, OnboardingError> {
        let (attempt, result) = self.attempt(access_token).await;

        let info = result.map_err(|e| {
            warn!(provider = %self.provider_name, error = %e, "Identity provider verification failed");
            OnboardingError::InvalidExternalToken(provider_payload(e))
        })?;

        let email = info
            .email
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty())
            .ok_or_else(|| {
                OnboardingError::InvalidExternalToken(IdentityProviderError::MissingEmail.to_string())
            })?;

        Ok(VerifiedIdentity {
            external_subject_id: info.sub,
            email,
            display_name: info.name.filter(|n| !n.trim().is_empty()),
            attempt,
        })
    }
}

/// The provider's own error body when it sent one.
fn provider_payload(err: IdentityProviderError) -> String {
    match err {
        IdentityProviderError::Rejected { payload, .. } if !payload.is_empty() => payload,
        other => other.to_string(),
    }
}
