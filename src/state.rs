use std::sync::Arc;
use tokio::sync::RwLock;

use crate::clients::geocoding::{DisabledGeocoder, Geocoder, NominatimGeocoder};
use crate::clients::identity_provider::IdentityProviderClient;
use crate::config::Config;
use crate::db::Store;
use crate::services::notifications::{self, NotificationSink};
use crate::services::{
    AccountService, IdentityProviderBridge, LocalResumeStorage, OnboardingService, ResumeStorage,
    SeaOrmAccountService, SeaOrmOnboardingService,
};

/// Build a shared HTTP client for identity-provider calls.
/// Every user-info request is bounded by `timeout_seconds`.
fn build_shared_http_client(timeout_seconds: u64) -> anyhow::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_seconds))
        .user_agent("Tradesdesk/1.0")
        .pool_max_idle_per_host(10)
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to build shared HTTP client: {e}"))
}

#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<RwLock<Config>>,

    pub store: Store,

    pub onboarding: Arc<dyn OnboardingService>,

    pub accounts: Arc<dyn AccountService>,

    pub resumes: Arc<dyn ResumeStorage>,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let notifier =
            notifications::from_config(&config.mail, config.security.challenge_ttl_minutes);

        let geocoder: Arc<dyn Geocoder> = if config.geocoding.enabled {
            Arc::new(NominatimGeocoder::new(&config.geocoding)?)
        } else {
            Arc::new(DisabledGeocoder)
        };

        Self::with_collaborators(config, notifier, geocoder).await
    }

    /// Wires the services around the given mail and geocoding collaborators.
    pub async fn with_collaborators(
        config: Config,
        notifier: Arc<dyn NotificationSink>,
        geocoder: Arc<dyn Geocoder>,
    ) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        let http_client =
            build_shared_http_client(config.identity_provider.request_timeout_seconds)?;
        let identity = IdentityProviderBridge::new(
            IdentityProviderClient::with_shared_client(http_client),
            &config.identity_provider,
        );

        let onboarding = Arc::new(SeaOrmOnboardingService::new(
            store.clone(),
            config.security.clone(),
            identity,
            geocoder,
            notifier,
        )) as Arc<dyn OnboardingService + Send + Sync + 'static>;

        let accounts = Arc::new(SeaOrmAccountService::new(store.clone()))
            as Arc<dyn AccountService + Send + Sync + 'static>;

        let resumes = Arc::new(LocalResumeStorage::new(&config.general.uploads_path))
            as Arc<dyn ResumeStorage + Send + Sync + 'static>;

        Ok(Self {
            config: Arc::new(RwLock::new(config)),
            store,
            onboarding,
            accounts,
            resumes,
        })
    }

    pub async fn config(&self) -> Config {
        self.config.read().await.clone()
    }
}
