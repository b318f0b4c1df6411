//! `SeaORM` implementation of the `OnboardingService` trait.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::clients::geocoding::Geocoder;
use crate::config::SecurityConfig;
use crate::db::{ExclusiveUpdate, InsertOutcome, Store};
use crate::entities::accounts::AccountStatus;
use crate::models::{Account, Coordinates, ExternalIdentity, NewAccount, ProfileChanges};
use crate::roles;
use crate::services::credentials::CredentialStore;
use crate::services::identity::IdentityProviderBridge;
use crate::services::notifications::NotificationSink;
use crate::services::onboarding_service::{
    ErrorKind, OnboardingError, OnboardingOutcome, OnboardingService, ProfileForm, SignupRequest,
};
use crate::services::resolver::AccountResolver;
use crate::services::validation::{
    check_password_strength, non_blank, normalize_email, require, require_secret,
};

pub struct SeaOrmOnboardingService {
    store: Store,
    credentials: CredentialStore,
    identity: IdentityProviderBridge,
    resolver: AccountResolver,
    geocoder: Arc<dyn Geocoder>,
    notifier: Arc<dyn NotificationSink>,
    min_password_length: usize,
}

impl SeaOrmOnboardingService {
    #[must_use]
    pub fn new(
        store: Store,
        security: SecurityConfig,
        identity: IdentityProviderBridge,
        geocoder: Arc<dyn Geocoder>,
        notifier: Arc<dyn NotificationSink>,
    ) -> Self {
        let min_password_length = security.min_password_length;
        Self {
            credentials: CredentialStore::new(store.clone(), security),
            resolver: AccountResolver::new(store.clone()),
            store,
            identity,
            geocoder,
            notifier,
            min_password_length,
        }
    }

    /// Records the result of one flow in metrics and the log.
    fn observe(
        flow: &'static str,
        result: Result<OnboardingOutcome, OnboardingError>,
    ) -> Result<OnboardingOutcome, OnboardingError> {
        let outcome = match &result {
            Ok(outcome) => outcome.tag(),
            Err(e) => e.code(),
        };
        metrics::counter!("onboarding_outcomes_total", "flow" => flow, "outcome" => outcome)
            .increment(1);

        match &result {
            Ok(_) => info!(flow, outcome, "Onboarding flow finished"),
            Err(e) if e.kind() == ErrorKind::Internal => {
                error!(flow, outcome, error = %e, "Onboarding flow failed");
            }
            Err(e) => debug!(flow, outcome, error = %e, "Onboarding flow rejected"),
        }

        result
    }

    /// Fire-and-forget; delivery failures are only logged.
    fn dispatch_welcome(&self, email: String, name: String) {
        let notifier = self.notifier.clone();
        tokio::spawn(async move {
            if let Err(e) = notifier.send_welcome(&email, &name).await {
                warn!(error = %e, "Failed to send welcome notification");
            }
        });
    }

    fn dispatch_recovery_code(&self, email: String, code: String) {
        let notifier = self.notifier.clone();
        tokio::spawn(async move {
            if let Err(e) = notifier.send_recovery_code(&email, &code).await {
                warn!(error = %e, "Failed to send recovery code");
            }
        });
    }

    async fn find_account(&self, account_id: &str) -> Result<Account, OnboardingError> {
        self.store
            .get_account_by_id(account_id)
            .await?
            .ok_or(OnboardingError::AccountNotFound)
    }

    async fn signup_inner(&self, request: SignupRequest) -> Result<OnboardingOutcome, OnboardingError> {
        let name = require("name", &request.name)?;
        let email = normalize_email(&request.email)?;
        let password = require_secret("password", &request.password)?;
        let role_key = require("role", &request.role)?;
        check_password_strength(password, self.min_password_length)?;

        let role = roles::resolve(role_key);

        // Early rejection saves the hash; the insert below re-checks atomically.
        if self.store.get_account_by_email(&email).await?.is_some() {
            return Err(OnboardingError::DuplicateEmail);
        }
        if role.is_admin() && self.store.admin_exists().await? {
            return Err(OnboardingError::AdminAlreadyExists);
        }

        let password_hash = self.credentials.hash(password).await?;
        let status = if role.is_admin() {
            AccountStatus::Approved
        } else {
            AccountStatus::Pending
        };

        let account = match self
            .store
            .insert_account_exclusive(NewAccount {
                email,
                name: name.to_string(),
                password_hash,
                role,
                status,
            })
            .await?
        {
            InsertOutcome::Inserted(account) => account,
            InsertOutcome::DuplicateEmail => return Err(OnboardingError::DuplicateEmail),
            InsertOutcome::AdminExists => return Err(OnboardingError::AdminAlreadyExists),
        };

        info!(account_id = %account.id, role = role_key, "Account created");
        self.dispatch_welcome(account.email.clone(), account.name.clone());

        Ok(OnboardingOutcome::incomplete(&account))
    }

    async fn login_inner(
        &self,
        email: &str,
        password: &str,
    ) -> Result<OnboardingOutcome, OnboardingError> {
        let email = normalize_email(email)?;
        let password = require_secret("password", password)?;

        // Unknown email, provider-only account and wrong password all look alike.
        let Some((account, Some(hash))) = self.store.get_account_with_password(&email).await?
        else {
            return Err(OnboardingError::InvalidCredentials);
        };

        if !self.credentials.verify(password, &hash).await? {
            return Err(OnboardingError::InvalidCredentials);
        }

        if account.profile_completed {
            Ok(OnboardingOutcome::complete(&account))
        } else {
            Ok(OnboardingOutcome::incomplete(&account))
        }
    }

    async fn forgot_password_inner(&self, email: &str) -> Result<OnboardingOutcome, OnboardingError> {
        let email = normalize_email(email)?;

        let account = self
            .store
            .get_account_by_email(&email)
            .await?
            .ok_or(OnboardingError::AccountNotFound)?;

        let code = self.credentials.issue_challenge(&account.id).await?;
        self.dispatch_recovery_code(account.email, code);

        Ok(OnboardingOutcome::ChallengeIssued)
    }

    async fn reset_password_inner(
        &self,
        email: &str,
        code: &str,
        new_password: &str,
    ) -> Result<OnboardingOutcome, OnboardingError> {
        let email = normalize_email(email)?;
        let code = require("code", code)?;
        let new_password = require_secret("new_password", new_password)?;
        check_password_strength(new_password, self.min_password_length)?;

        let account = self
            .store
            .get_account_by_email(&email)
            .await?
            .ok_or(OnboardingError::AccountNotFound)?;

        self.credentials.consume_challenge(&account.id, code).await?;

        let password_hash = self.credentials.hash(new_password).await?;
        if !self.store.set_password_hash(&account.id, password_hash).await? {
            return Err(OnboardingError::AccountNotFound);
        }

        info!(account_id = %account.id, "Password reset");
        Ok(OnboardingOutcome::ChallengeConsumed)
    }

    async fn provider_login_inner(
        &self,
        access_token: &str,
    ) -> Result<OnboardingOutcome, OnboardingError> {
        let access_token = require("access_token", access_token)?;

        let verified = self.identity.verify_token(access_token).await?;
        debug!(attempt = ?verified.attempt, "Identity provider token verified");

        let identity = ExternalIdentity {
            subject_id: verified.external_subject_id,
            provider: self.identity.provider_name().to_string(),
        };

        let (account, created) = self
            .resolver
            .find_or_create_by_email(
                &verified.email,
                verified.display_name.as_deref(),
                Some(&identity),
            )
            .await?;

        if created || !account.profile_completed {
            Ok(OnboardingOutcome::incomplete(&account))
        } else {
            Ok(OnboardingOutcome::complete(&account))
        }
    }

    async fn select_provider_role_inner(
        &self,
        account_id: &str,
        role_key: &str,
    ) -> Result<OnboardingOutcome, OnboardingError> {
        let account_id = require("account_id", account_id)?;
        let role_key = require("role", role_key)?;

        let account = self.find_account(account_id).await?;
        if !account.is_provider_linked() {
            return Err(OnboardingError::NotProviderAccount);
        }
        // The role may be re-chosen until the onboarding form is submitted.
        if account.profile_completed {
            return Err(OnboardingError::ProfileAlreadyCompleted);
        }

        let account = match self
            .store
            .assign_role_exclusive(&account.id, roles::resolve(role_key))
            .await?
        {
            ExclusiveUpdate::Updated(account) => account,
            ExclusiveUpdate::NotFound => return Err(OnboardingError::AccountNotFound),
            ExclusiveUpdate::AdminExists => return Err(OnboardingError::AdminAlreadyExists),
        };

        self.dispatch_welcome(account.email.clone(), account.name.clone());

        // The chosen key is reported as-is, even when the catalog does not know it.
        Ok(OnboardingOutcome::Complete {
            account: (&account).into(),
            role: role_key.to_string(),
        })
    }

    async fn complete_profile_inner(
        &self,
        account_id: &str,
        form: ProfileForm,
    ) -> Result<OnboardingOutcome, OnboardingError> {
        let account_id = require("account_id", account_id)?;
        if form.experience_years.is_some_and(|years| years < 0) {
            return Err(OnboardingError::InvalidField("experience_years"));
        }

        let account = self.find_account(account_id).await?;

        let address = non_blank(form.address);
        let coordinates = match &address {
            Some(address) => self.geocode(address).await,
            None => None,
        };

        let changes = ProfileChanges {
            name: non_blank(form.name),
            phone: non_blank(form.phone),
            address,
            coordinates,
            bio: non_blank(form.bio),
            category: non_blank(form.category),
            sub_category: non_blank(form.sub_category),
            portfolio_url: non_blank(form.portfolio_url),
            experience_years: form.experience_years,
            specialization: non_blank(form.specialization),
            resume_path: non_blank(form.resume_path),
        };

        let account = match self.store.apply_profile_update(&account.id, changes).await? {
            ExclusiveUpdate::Updated(account) => account,
            ExclusiveUpdate::NotFound => return Err(OnboardingError::AccountNotFound),
            ExclusiveUpdate::AdminExists => return Err(OnboardingError::AdminAlreadyExists),
        };

        info!(account_id = %account.id, "Profile completed");
        Ok(OnboardingOutcome::complete(&account))
    }

    /// Best-effort; any failure leaves coordinates untouched.
    async fn geocode(&self, address: &str) -> Option<Coordinates> {
        match self.geocoder.resolve(address).await {
            Ok(Some(coordinates)) => Some(coordinates),
            Ok(None) => {
                debug!("Address not found by geocoder");
                None
            }
            Err(e) => {
                warn!(error = %e, "Geocoding failed, keeping previous coordinates");
                None
            }
        }
    }
}

#[async_trait]
impl OnboardingService for SeaOrmOnboardingService {
    async fn signup(&self, request: SignupRequest) -> Result<OnboardingOutcome, OnboardingError> {
        Self::observe("signup", self.signup_inner(request).await)
    }

    async fn login(&self, email: &str, password: &str) -> Result<OnboardingOutcome, OnboardingError> {
        Self::observe("login", self.login_inner(email, password).await)
    }

    async fn forgot_password(&self, email: &str) -> Result<OnboardingOutcome, OnboardingError> {
        Self::observe("forgot_password", self.forgot_password_inner(email).await)
    }

    async fn reset_password(
        &self,
        email: &str,
        code: &str,
        new_password: &str,
    ) -> Result<OnboardingOutcome, OnboardingError> {
        Self::observe(
            "reset_password",
            self.reset_password_inner(email, code, new_password).await,
        )
    }

    async fn provider_login(
        &self,
        access_token: &str,
    ) -> Result<OnboardingOutcome, OnboardingError> {
        Self::observe("provider_login", self.provider_login_inner(access_token).await)
    }

    async fn select_provider_role(
        &self,
        account_id: &str,
        role_key: &str,
    ) -> Result<OnboardingOutcome, OnboardingError> {
        Self::observe(
            "select_provider_role",
            self.select_provider_role_inner(account_id, role_key).await,
        )
    }

    async fn complete_profile(
        &self,
        account_id: &str,
        form: ProfileForm,
    ) -> Result<OnboardingOutcome, OnboardingError> {
        Self::observe(
            "complete_profile",
            self.complete_profile_inner(account_id, form).await,
        )
    }
}
