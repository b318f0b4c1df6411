use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub server: ServerConfig,

    pub security: SecurityConfig,

    pub identity_provider: IdentityProviderConfig,

    pub geocoding: GeocodingConfig,

    pub mail: MailConfig,

    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub database_path: String,

    pub log_level: String,

    /// Number of tokio worker threads (default: 2)
    /// Set to 0 to use the number of CPU cores
    pub worker_threads: usize,

    pub max_db_connections: u32,

    pub min_db_connections: u32,

    /// Root directory for uploaded resumes.
    pub uploads_path: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            database_path: "sqlite:data/tradesdesk.db".to_string(),
            log_level: "info".to_string(),
            worker_threads: 2,
            max_db_connections: 5,
            min_db_connections: 1,
            uploads_path: "uploads".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub enabled: bool,

    pub port: u16,

    pub cors_allowed_origins: Vec<String>,

    /// Whether to set the Secure flag on session cookies.
    /// Set to false for local development without HTTPS.
    pub secure_cookies: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            port: 7420,
            cors_allowed_origins: vec![
                "http://localhost:5173".to_string(),
                "http://127.0.0.1:5173".to_string(),
            ],
            secure_cookies: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Argon2 memory cost in KiB (default: 8192 = 8MB)
    pub argon2_memory_cost_kib: u32,

    /// Argon2 time cost (iterations)
    pub argon2_time_cost: u32,

    pub argon2_parallelism: u32,

    /// Validity window of a password recovery code.
    pub challenge_ttl_minutes: i64,

    pub min_password_length: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            argon2_memory_cost_kib: 8192,
            argon2_time_cost: 3,
            argon2_parallelism: 1,
            challenge_ttl_minutes: 10,
            min_password_length: 8,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityProviderConfig {
    /// Stored on linked accounts as `auth_provider`.
    pub name: String,

    pub primary_userinfo_url: String,

    /// Tried once when the primary endpoint fails for any reason.
    pub fallback_userinfo_url: String,

    /// Per-call timeout; a verification makes at most two calls.
    pub request_timeout_seconds: u64,
}

impl Default for IdentityProviderConfig {
    fn default() -> Self {
        Self {
            name: "google".to_string(),
            primary_userinfo_url: "https://www.googleapis.com/oauth2/v3/userinfo".to_string(),
            fallback_userinfo_url: "https://www.googleapis.com/oauth2/v2/userinfo".to_string(),
            request_timeout_seconds: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeocodingConfig {
    pub enabled: bool,

    /// Nominatim-compatible search endpoint
    pub base_url: String,

    /// Nominatim's usage policy requires an identifying user agent.
    pub user_agent: String,

    pub request_timeout_seconds: u64,
}

impl Default for GeocodingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: "https://nominatim.openstreetmap.org/search".to_string(),
            user_agent: "Tradesdesk/1.0".to_string(),
            request_timeout_seconds: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MailConfig {
    /// When disabled, notifications are only written to the log.
    pub enabled: bool,

    pub smtp_host: String,

    pub smtp_port: u16,

    pub username: String,

    #[serde(skip_serializing)]
    pub password: String,

    pub from_address: String,

    /// Product name used in subjects and greetings.
    pub app_name: String,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            smtp_host: "smtp.gmail.com".to_string(),
            smtp_port: 465,
            username: String::new(),
            password: String::new(),
            from_address: "Tradesdesk <no-reply@tradesdesk.local>".to_string(),
            app_name: "Tradesdesk".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub metrics_enabled: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: true,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            server: ServerConfig::default(),
            security: SecurityConfig::default(),
            identity_provider: IdentityProviderConfig::default(),
            geocoding: GeocodingConfig::default(),
            mail: MailConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let paths = Self::config_paths();

        for path in &paths {
            if path.exists() {
                info!("Loading config from: {}", path.display());
                let mut config = Self::load_from_path(path)?;
                config.apply_env_overrides();
                return Ok(config);
            }
        }

        info!("No config file found, using defaults");
        let mut config = Self::default();
        config.apply_env_overrides();
        Ok(config)
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Secrets and deployment-specific values may come from the environment
    /// (or a `.env` file) instead of the config file.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("TRADESDESK_DATABASE_URL") {
            self.general.database_path = url;
        }

        if let Ok(password) = std::env::var("TRADESDESK_SMTP_PASSWORD") {
            self.mail.password = password;
        }

        if let Some(port) = std::env::var("TRADESDESK_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
        {
            self.server.port = port;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.general.database_path.trim().is_empty() {
            anyhow::bail!("general.database_path must not be empty");
        }

        if self.server.enabled && self.server.port == 0 {
            anyhow::bail!("server.port must be non-zero");
        }

        if self.security.challenge_ttl_minutes <= 0 {
            anyhow::bail!("security.challenge_ttl_minutes must be positive");
        }

        if self.identity_provider.request_timeout_seconds == 0 {
            anyhow::bail!("identity_provider.request_timeout_seconds must be positive");
        }

        url::Url::parse(&self.identity_provider.primary_userinfo_url)
            .context("Invalid identity_provider.primary_userinfo_url")?;
        url::Url::parse(&self.identity_provider.fallback_userinfo_url)
            .context("Invalid identity_provider.fallback_userinfo_url")?;

        if self.geocoding.enabled {
            if self.geocoding.request_timeout_seconds == 0 {
                anyhow::bail!("geocoding.request_timeout_seconds must be positive");
            }
            url::Url::parse(&self.geocoding.base_url).context("Invalid geocoding.base_url")?;
        }

        if self.mail.enabled && self.mail.smtp_host.trim().is_empty() {
            anyhow::bail!("mail.smtp_host is required when mail is enabled");
        }

        Ok(())
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Config saved to: {}", path.display());
        Ok(())
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![];

        paths.push(PathBuf::from("config.toml"));

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("tradesdesk").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".tradesdesk").join("config.toml"));
        }

        paths
    }

    fn default_config_path() -> PathBuf {
        PathBuf::from("config.toml")
    }

    pub fn create_default_if_missing() -> Result<bool> {
        let path = Self::default_config_path();
        if path.exists() {
            return Ok(false);
        }

        Self::default().save_to_path(&path)?;
        Ok(true)
    }
}
