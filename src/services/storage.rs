use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::info;

/// Stores uploaded resumes and hands back a reference for the profile form.
#[async_trait]
pub trait ResumeStorage: Send + Sync {
    async fn store(&self, account_id: &str, file_name: &str, bytes: &[u8]) -> Result<String>;
}

/// Writes under `<root>/<account_id>/`.
pub struct LocalResumeStorage {
    root: PathBuf,
}

impl LocalResumeStorage {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl ResumeStorage for LocalResumeStorage {
    async fn store(&self, account_id: &str, file_name: &str, bytes: &[u8]) -> Result<String> {
        let dir = self.root.join(sanitize_file_name(account_id));
        if !dir.exists() {
            fs::create_dir_all(&dir).await?;
        }

        let stored_name = format!(
            "{}_{}",
            Utc::now().timestamp_millis(),
            sanitize_file_name(file_name)
        );
        let file_path = dir.join(stored_name);

        fs::write(&file_path, bytes)
            .await
            .with_context(|| format!("Failed to write resume to {}", file_path.display()))?;

        info!(account_id, path = %file_path.display(), size = bytes.len(), "Stored resume");
        Ok(file_path.to_string_lossy().into_owned())
    }
}

/// Keeps the final path component and replaces anything outside
/// `[A-Za-z0-9._-]`.
fn sanitize_file_name(name: &str) -> String {
    let base = Path::new(name)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();

    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();

    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "resume".to_string()
    } else {
        cleaned.to_string()
    }
}
