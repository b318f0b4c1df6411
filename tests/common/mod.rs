#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tradesdesk::clients::geocoding::Geocoder;
use tradesdesk::config::Config;
use tradesdesk::models::Coordinates;
use tradesdesk::services::{NotificationSink, OnboardingService};
use tradesdesk::state::SharedState;

pub const BERLIN: Coordinates = Coordinates {
    lat: 52.52,
    lon: 13.405,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sent {
    Welcome { email: String, name: String },
    RecoveryCode { email: String, code: String },
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<Sent>>,
}

impl RecordingNotifier {
    pub fn snapshot(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    /// Waits for the latest recovery code mailed to `email`.
    pub async fn recovery_code_for(&self, email: &str) -> String {
        for _ in 0..100 {
            let code = self.snapshot().into_iter().rev().find_map(|s| match s {
                Sent::RecoveryCode { email: to, code } if to == email => Some(code),
                _ => None,
            });
            if let Some(code) = code {
                return code;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        panic!("no recovery code sent to {email}");
    }

    /// Waits until `count` notifications have been recorded.
    pub async fn wait_for(&self, count: usize) -> Vec<Sent> {
        for _ in 0..100 {
            let sent = self.snapshot();
            if sent.len() >= count {
                return sent;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        panic!("expected {count} notifications, got {:?}", self.snapshot());
    }
}

#[async_trait]
impl NotificationSink for RecordingNotifier {
    async fn send_welcome(&self, email: &str, name: &str) -> anyhow::Result<()> {
        self.sent.lock().unwrap().push(Sent::Welcome {
            email: email.to_string(),
            name: name.to_string(),
        });
        Ok(())
    }

    async fn send_recovery_code(&self, email: &str, code: &str) -> anyhow::Result<()> {
        self.sent.lock().unwrap().push(Sent::RecoveryCode {
            email: email.to_string(),
            code: code.to_string(),
        });
        Ok(())
    }
}

/// Resolves every address to [`BERLIN`] unless told to fail.
#[derive(Default)]
pub struct StubGeocoder {
    pub fail: AtomicBool,
    pub calls: AtomicUsize,
}

#[async_trait]
impl Geocoder for StubGeocoder {
    async fn resolve(&self, _address: &str) -> anyhow::Result<Option<Coordinates>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            anyhow::bail!("geocoder unavailable");
        }
        Ok(Some(BERLIN))
    }
}

/// Identity provider with a primary and a fallback user-info endpoint.
/// Tokens unknown to an endpoint get a 401 with an OAuth error body.
#[derive(Clone, Default)]
pub struct StubIdentityProvider {
    pub primary: Arc<Mutex<HashMap<String, Value>>>,
    pub fallback: Arc<Mutex<HashMap<String, Value>>>,
    pub primary_calls: Arc<AtomicUsize>,
    pub fallback_calls: Arc<AtomicUsize>,
}

impl StubIdentityProvider {
    pub fn accept(&self, token: &str, sub: &str, email: &str, name: &str) {
        self.primary.lock().unwrap().insert(
            token.to_string(),
            json!({"sub": sub, "email": email, "name": name}),
        );
    }

    pub fn accept_on_fallback(&self, token: &str, sub: &str, email: &str) {
        self.fallback
            .lock()
            .unwrap()
            .insert(token.to_string(), json!({"id": sub, "email": email}));
    }

    async fn spawn(&self) -> String {
        let router = Router::new()
            .route("/v3/userinfo", get(primary_userinfo))
            .route("/v2/userinfo", get(fallback_userinfo))
            .with_state(self.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }
}

fn bearer(headers: &HeaderMap) -> String {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .unwrap_or_default()
        .to_string()
}

fn lookup(table: &Mutex<HashMap<String, Value>>, headers: &HeaderMap) -> Response {
    match table.lock().unwrap().get(&bearer(headers)) {
        Some(body) => Json(body.clone()).into_response(),
        None => (
            StatusCode::UNAUTHORIZED,
            Json(json!({"error": "invalid_token"})),
        )
            .into_response(),
    }
}

async fn primary_userinfo(State(idp): State<StubIdentityProvider>, headers: HeaderMap) -> Response {
    idp.primary_calls.fetch_add(1, Ordering::SeqCst);
    lookup(&idp.primary, &headers)
}

async fn fallback_userinfo(
    State(idp): State<StubIdentityProvider>,
    headers: HeaderMap,
) -> Response {
    idp.fallback_calls.fetch_add(1, Ordering::SeqCst);
    lookup(&idp.fallback, &headers)
}

pub struct TestApp {
    pub shared: Arc<SharedState>,
    pub notifier: Arc<RecordingNotifier>,
    pub geocoder: Arc<StubGeocoder>,
    pub idp: StubIdentityProvider,
    root: PathBuf,
}

impl TestApp {
    pub async fn spawn() -> Self {
        let root = std::env::temp_dir().join(format!("tradesdesk_test_{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&root).unwrap();

        let idp = StubIdentityProvider::default();
        let base = idp.spawn().await;

        let mut config = Config::default();
        config.general.database_path = format!("sqlite:{}", root.join("test.db").display());
        config.general.uploads_path = root.join("uploads").display().to_string();
        config.security.argon2_memory_cost_kib = 256;
        config.security.argon2_time_cost = 1;
        config.identity_provider.primary_userinfo_url = format!("{base}/v3/userinfo");
        config.identity_provider.fallback_userinfo_url = format!("{base}/v2/userinfo");
        config.identity_provider.request_timeout_seconds = 5;
        config.server.secure_cookies = false;
        config.observability.metrics_enabled = false;

        let notifier = Arc::new(RecordingNotifier::default());
        let geocoder = Arc::new(StubGeocoder::default());

        let shared = SharedState::with_collaborators(config, notifier.clone(), geocoder.clone())
            .await
            .expect("Failed to create shared state");

        Self {
            shared: Arc::new(shared),
            notifier,
            geocoder,
            idp,
            root,
        }
    }

    pub fn onboarding(&self) -> &Arc<dyn OnboardingService> {
        &self.shared.onboarding
    }

    pub async fn router(&self) -> Router {
        let state = tradesdesk::api::create_app_state(self.shared.clone(), None);
        tradesdesk::api::router(state).await
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.root);
    }
}
