pub mod credentials;
pub use credentials::{CredentialError, CredentialStore};

pub mod identity;
pub use identity::{IdentityProviderBridge, VerificationAttempt, VerifiedIdentity};

pub mod resolver;
pub use resolver::AccountResolver;

pub mod notifications;
pub use notifications::{LogNotifier, NotificationSink, SmtpNotifier};

pub mod storage;
pub use storage::{LocalResumeStorage, ResumeStorage};

pub mod validation;

pub mod onboarding_service;
pub mod onboarding_service_impl;
pub use onboarding_service::{
    ErrorKind, OnboardingError, OnboardingOutcome, OnboardingService, ProfileForm, SignupRequest,
};
pub use onboarding_service_impl::SeaOrmOnboardingService;

pub mod account_service;
pub mod account_service_impl;
pub use account_service::AccountService;
pub use account_service_impl::SeaOrmAccountService;
