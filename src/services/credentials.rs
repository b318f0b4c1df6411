//! Password hashing and recovery-challenge handling.

use anyhow::Context;
use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::{Duration, Utc};
use rand::Rng;
use thiserror::Error;
use tokio::task;
use tracing::debug;

use crate::config::SecurityConfig;
use crate::db::Store;

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("Stored credential is malformed: {0}")]
    Corrupt(String),

    #[error("Recovery code does not match")]
    ChallengeMismatch,

    #[error("Recovery code has expired")]
    ChallengeExpired,

    #[error("Account not found")]
    AccountMissing,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<anyhow::Error> for CredentialError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

pub struct CredentialStore {
    store: Store,
    security: SecurityConfig,
}

impl CredentialStore {
    #[must_use]
    pub const fn new(store: Store, security: SecurityConfig) -> Self {
        Self { store, security }
    }

    /// Hashes with a fresh random salt. Runs on the blocking pool since Argon2
    /// is CPU-bound.
    pub async fn hash(&self, plaintext: &str) -> Result<String, CredentialError> {
        let password = plaintext.to_string();
        let config = self.security.clone();

        let hash = task::spawn_blocking(move || hash_password(&password, Some(&config)))
            .await
            .context("Password hashing task panicked")??;

        Ok(hash)
    }

    /// `Ok(false)` on mismatch; `Err` only when `hash` is not a valid PHC string.
    pub async fn verify(&self, plaintext: &str, hash: &str) -> Result<bool, CredentialError> {
        let password = plaintext.to_string();
        let hash = hash.to_string();

        task::spawn_blocking(move || verify_password(&password, &hash))
            .await
            .context("Password verification task panicked")?
    }

    /// Generates, persists and returns a new recovery code, replacing any
    /// previous one.
    pub async fn issue_challenge(&self, account_id: &str) -> Result<String, CredentialError> {
        let code = generate_challenge_code();
        let expires_at = Utc::now() + Duration::minutes(self.security.challenge_ttl_minutes);

        if !self
            .store
            .store_challenge(account_id, &code, expires_at)
            .await?
        {
            return Err(CredentialError::AccountMissing);
        }

        debug!(account_id, %expires_at, "Recovery challenge issued");
        Ok(code)
    }

    /// Succeeds exactly once per issued code.
    ///
    /// The code must match exactly and the window must still be open; on
    /// success both challenge fields are cleared.
    pub async fn consume_challenge(
        &self,
        account_id: &str,
        supplied_code: &str,
    ) -> Result<(), CredentialError> {
        let Some(challenge) = self.store.get_challenge(account_id).await? else {
            return Err(CredentialError::ChallengeMismatch);
        };

        if challenge.code != supplied_code {
            return Err(CredentialError::ChallengeMismatch);
        }

        if Utc::now() > challenge.expires_at {
            return Err(CredentialError::ChallengeExpired);
        }

        // Compare-and-clear: a re-issue between the read above and this write
        // leaves the new code in place and fails this consume.
        if !self
            .store
            .clear_challenge_if_matches(account_id, supplied_code)
            .await?
        {
            return Err(CredentialError::ChallengeMismatch);
        }

        debug!(account_id, "Recovery challenge consumed");
        Ok(())
    }
}

/// Hash a password using Argon2id with optional custom params.
/// If config is None, uses the library default params.
pub fn hash_password(password: &str, config: Option<&SecurityConfig>) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    let argon2 = if let Some(cfg) = config {
        let params = Params::new(
            cfg.argon2_memory_cost_kib,
            cfg.argon2_time_cost,
            cfg.argon2_parallelism,
            None,
        )
        .map_err(|e| anyhow::anyhow!("Invalid Argon2 params: {e}"))?;
        Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
    } else {
        Argon2::default()
    };

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {e}"))?;

    Ok(hash.to_string())
}

/// Parameters are read from the PHC string, so hashes made with older
/// settings still verify.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, CredentialError> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|e| CredentialError::Corrupt(e.to_string()))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// Six-digit numeric code, uniform over 100000..=999999.
#[must_use]
pub fn generate_challenge_code() -> String {
    let code: u32 = rand::rng().random_range(100_000..1_000_000);
    code.to_string()
}
