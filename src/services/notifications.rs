//! Outbound account notifications.
//!
//! Callers never await delivery on the request path; see
//! `SeaOrmOnboardingService::dispatch_welcome`.

use anyhow::{Context, Result};
use async_trait::async_trait;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use std::sync::Arc;
use tracing::info;

use crate::config::MailConfig;

#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn send_welcome(&self, email: &str, name: &str) -> Result<()>;

    async fn send_recovery_code(&self, email: &str, code: &str) -> Result<()>;
}

/// Picks the SMTP sink when mail is enabled, otherwise the log sink.
/// `challenge_ttl_minutes` is quoted in recovery mails.
pub fn from_config(config: &MailConfig, challenge_ttl_minutes: i64) -> Arc<dyn NotificationSink> {
    if config.enabled {
        Arc::new(SmtpNotifier::new(config.clone(), challenge_ttl_minutes))
    } else {
        Arc::new(LogNotifier)
    }
}

pub struct SmtpNotifier {
    config: MailConfig,
    challenge_ttl_minutes: i64,
}

impl SmtpNotifier {
    #[must_use]
    pub const fn new(config: MailConfig, challenge_ttl_minutes: i64) -> Self {
        Self {
            config,
            challenge_ttl_minutes,
        }
    }

    async fn deliver(&self, to: &str, subject: String, body: String) -> Result<()> {
        let config = self.config.clone();
        let to = to.to_string();

        tokio::task::spawn_blocking(move || send_email(&config, &to, &subject, body))
            .await
            .context("Mail task panicked")?
    }
}

#[async_trait]
impl NotificationSink for SmtpNotifier {
    async fn send_welcome(&self, email: &str, name: &str) -> Result<()> {
        let app = &self.config.app_name;
        self.deliver(email, format!("Welcome to {app}"), welcome_body(app, name))
            .await
    }

    async fn send_recovery_code(&self, email: &str, code: &str) -> Result<()> {
        let app = &self.config.app_name;
        self.deliver(
            email,
            format!("{app} password reset code"),
            recovery_body(app, code, self.challenge_ttl_minutes),
        )
        .await
    }
}

/// Blocking SMTP send; run on the blocking pool.
fn send_email(config: &MailConfig, to: &str, subject: &str, body: String) -> Result<()> {
    let creds = Credentials::new(config.username.clone(), config.password.clone());

    let transport = SmtpTransport::relay(&config.smtp_host)
        .context("SMTP relay error")?
        .port(config.smtp_port)
        .credentials(creds)
        .build();

    let email = Message::builder()
        .from(
            config
                .from_address
                .parse()
                .context("Invalid from address")?,
        )
        .to(to.parse().context("Invalid to address")?)
        .subject(subject)
        .body(body)
        .context("Failed to build email")?;

    transport.send(&email).context("SMTP send failed")?;

    info!(to, "Email sent");
    Ok(())
}

fn welcome_body(app: &str, name: &str) -> String {
    format!(
        "Hi {name},\n\nYour {app} account has been created. Sign in to finish setting up your profile.\n"
    )
}

fn recovery_body(app: &str, code: &str, ttl_minutes: i64) -> String {
    let unit = if ttl_minutes == 1 { "minute" } else { "minutes" };
    format!(
        "Your {app} password reset code is {code}.\n\nIt expires in {ttl_minutes} {unit}. If you did not ask for a reset, ignore this message.\n"
    )
}

/// Writes notifications to the log instead of sending them.
pub struct LogNotifier;

#[async_trait]
impl NotificationSink for LogNotifier {
    async fn send_welcome(&self, email: &str, name: &str) -> Result<()> {
        info!(email, name, "Welcome notification (mail disabled)");
        Ok(())
    }

    async fn send_recovery_code(&self, email: &str, _code: &str) -> Result<()> {
        info!(email, "Recovery code notification (mail disabled)");
        Ok(())
    }
}
