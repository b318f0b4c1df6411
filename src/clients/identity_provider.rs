use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;

/// The `{sub, email, name}` shape returned by OpenID Connect user-info endpoints.
/// Older endpoints name the subject `id`.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderUserInfo {
    #[serde(alias = "id")]
    pub sub: String,
    pub email: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Error)]
pub enum IdentityProviderError {
    #[error("identity provider unreachable: {0}")]
    Transport(String),

    #[error("identity provider rejected the token ({status}): {payload}")]
    Rejected { status: u16, payload: String },

    #[error("identity provider returned a malformed body: {0}")]
    MalformedBody(String),

    #[error("identity provider response has no email claim")]
    MissingEmail,
}

#[derive(Clone)]
pub struct IdentityProviderClient {
    client: Client,
}

impl IdentityProviderClient {
    #[must_use]
    pub const fn with_shared_client(client: Client) -> Self {
        Self { client }
    }

    /// Calls one user-info endpoint with `access_token` as bearer credential.
    pub async fn fetch_user_info(
        &self,
        url: &str,
        access_token: &str,
    ) -> Result<ProviderUserInfo, IdentityProviderError> {
        let response = self
            .client
            .get(url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| IdentityProviderError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let payload = response.text().await.unwrap_or_default();
            return Err(IdentityProviderError::Rejected {
                status: status.as_u16(),
                payload,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| IdentityProviderError::Transport(e.to_string()))?;

        serde_json::from_str(&body).map_err(|e| IdentityProviderError::MalformedBody(e.to_string()))
    }
}
