//! Domain service for identity and onboarding.
//!
//! Drives password signup, login, password recovery, identity-provider login
//! and the two profile-completion steps. Every operation ends in one of the
//! [`OnboardingOutcome`] variants or a tagged [`OnboardingError`].

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{Account, AccountSummary};
use crate::roles::FALLBACK_ROLE_KEY;
use crate::services::credentials::CredentialError;

/// Stable error families exposed to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    Conflict,
    Authentication,
    Authorization,
    NotFound,
    Challenge,
    ExternalDependency,
    Internal,
}

impl ErrorKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Conflict => "conflict",
            Self::Authentication => "authentication",
            Self::Authorization => "authorization",
            Self::NotFound => "not_found",
            Self::Challenge => "challenge",
            Self::ExternalDependency => "external_dependency",
            Self::Internal => "internal",
        }
    }
}

/// Errors specific to onboarding operations.
#[derive(Debug, Error)]
pub enum OnboardingError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Invalid value for field: {0}")]
    InvalidField(&'static str),

    #[error("Malformed email address")]
    MalformedEmail,

    #[error("Password must be at least {0} characters")]
    WeakPassword(usize),

    #[error("Account was not created through the identity provider")]
    NotProviderAccount,

    #[error("Profile is already completed")]
    ProfileAlreadyCompleted,

    #[error("An account with this email already exists")]
    DuplicateEmail,

    #[error("An administrator account already exists")]
    AdminAlreadyExists,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Not permitted")]
    Forbidden,

    #[error("Account not found")]
    AccountNotFound,

    #[error("Recovery code does not match")]
    ChallengeMismatch,

    #[error("Recovery code has expired")]
    ChallengeExpired,

    #[error("Identity provider rejected the token: {0}")]
    InvalidExternalToken(String),

    #[error("Stored credential is corrupt")]
    CorruptCredential,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl OnboardingError {
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingField(_)
            | Self::InvalidField(_)
            | Self::MalformedEmail
            | Self::WeakPassword(_)
            | Self::NotProviderAccount
            | Self::ProfileAlreadyCompleted => ErrorKind::Validation,
            Self::DuplicateEmail | Self::AdminAlreadyExists => ErrorKind::Conflict,
            Self::InvalidCredentials => ErrorKind::Authentication,
            Self::Forbidden => ErrorKind::Authorization,
            Self::AccountNotFound => ErrorKind::NotFound,
            Self::ChallengeMismatch | Self::ChallengeExpired => ErrorKind::Challenge,
            Self::InvalidExternalToken(_) => ErrorKind::ExternalDependency,
            Self::CorruptCredential | Self::Database(_) | Self::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Machine-readable code, stable across releases.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::MissingField(_) => "missing_field",
            Self::InvalidField(_) => "invalid_field",
            Self::MalformedEmail => "malformed_email",
            Self::WeakPassword(_) => "weak_password",
            Self::NotProviderAccount => "not_provider_account",
            Self::ProfileAlreadyCompleted => "profile_already_completed",
            Self::DuplicateEmail => "duplicate_email",
            Self::AdminAlreadyExists => "admin_already_exists",
            Self::InvalidCredentials => "invalid_credentials",
            Self::Forbidden => "forbidden",
            Self::AccountNotFound => "account_not_found",
            Self::ChallengeMismatch => "challenge_mismatch",
            Self::ChallengeExpired => "challenge_expired",
            Self::InvalidExternalToken(_) => "invalid_external_token",
            Self::CorruptCredential => "corrupt_credential",
            Self::Database(_) => "database",
            Self::Internal(_) => "internal",
        }
    }
}

impl From<sea_orm::DbErr> for OnboardingError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for OnboardingError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<CredentialError> for OnboardingError {
    fn from(err: CredentialError) -> Self {
        match err {
            CredentialError::Corrupt(_) => Self::CorruptCredential,
            CredentialError::ChallengeMismatch => Self::ChallengeMismatch,
            CredentialError::ChallengeExpired => Self::ChallengeExpired,
            CredentialError::AccountMissing => Self::AccountNotFound,
            CredentialError::Internal(msg) => Self::Internal(msg),
        }
    }
}

/// Successful result of an onboarding operation. Rejections travel as
/// `Err(OnboardingError)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum OnboardingOutcome {
    /// Authenticated or provisioned, but the onboarding form is still pending.
    Incomplete { account: AccountSummary },

    /// Fully authenticated and usable.
    Complete { account: AccountSummary, role: String },

    /// A recovery code was generated and handed to the mailer.
    ChallengeIssued,

    /// The password was reset.
    ChallengeConsumed,
}

impl OnboardingOutcome {
    #[must_use]
    pub fn incomplete(account: &Account) -> Self {
        Self::Incomplete {
            account: account.into(),
        }
    }

    /// `Complete` with the role derived from the stored sub-category.
    #[must_use]
    pub fn complete(account: &Account) -> Self {
        Self::Complete {
            account: account.into(),
            role: account.role_key().unwrap_or(FALLBACK_ROLE_KEY).to_string(),
        }
    }

    #[must_use]
    pub const fn tag(&self) -> &'static str {
        match self {
            Self::Incomplete { .. } => "incomplete",
            Self::Complete { .. } => "complete",
            Self::ChallengeIssued => "challenge_issued",
            Self::ChallengeConsumed => "challenge_consumed",
        }
    }

    /// The account carried by `Incomplete`/`Complete`.
    #[must_use]
    pub const fn account(&self) -> Option<&AccountSummary> {
        match self {
            Self::Incomplete { account } | Self::Complete { account, .. } => Some(account),
            Self::ChallengeIssued | Self::ChallengeConsumed => None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: String,
}

/// The detailed onboarding form. Absent or blank fields keep their stored value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProfileForm {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub bio: Option<String>,
    pub category: Option<String>,
    pub sub_category: Option<String>,
    pub portfolio_url: Option<String>,
    pub experience_years: Option<i32>,
    pub specialization: Option<String>,
    pub resume_path: Option<String>,
}

/// Domain service trait for identity and onboarding.
#[async_trait::async_trait]
pub trait OnboardingService: Send + Sync {
    /// Creates a password account and returns `Incomplete`.
    ///
    /// # Errors
    ///
    /// Returns [`OnboardingError::DuplicateEmail`] if the email is taken and
    /// [`OnboardingError::AdminAlreadyExists`] for a second admin signup.
    async fn signup(&self, request: SignupRequest) -> Result<OnboardingOutcome, OnboardingError>;

    /// Verifies email and password.
    ///
    /// # Errors
    ///
    /// Returns [`OnboardingError::InvalidCredentials`] for an unknown email and
    /// for a wrong password alike.
    async fn login(&self, email: &str, password: &str)
    -> Result<OnboardingOutcome, OnboardingError>;

    /// Issues a recovery code and mails it.
    async fn forgot_password(&self, email: &str) -> Result<OnboardingOutcome, OnboardingError>;

    /// Consumes a recovery code and replaces the password.
    async fn reset_password(
        &self,
        email: &str,
        code: &str,
        new_password: &str,
    ) -> Result<OnboardingOutcome, OnboardingError>;

    /// Logs in (or provisions) an account from an identity-provider access token.
    async fn provider_login(&self, access_token: &str)
    -> Result<OnboardingOutcome, OnboardingError>;

    /// Role selection for provider-originated accounts. Does not mark the
    /// profile completed.
    async fn select_provider_role(
        &self,
        account_id: &str,
        role_key: &str,
    ) -> Result<OnboardingOutcome, OnboardingError>;

    /// Applies the onboarding form and marks the profile completed.
    async fn complete_profile(
        &self,
        account_id: &str,
        form: ProfileForm,
    ) -> Result<OnboardingOutcome, OnboardingError>;
}
