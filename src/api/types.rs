use serde::{Deserialize, Serialize};

use crate::roles::RoleDefinition;

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Error family, e.g. `conflict`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Machine-readable error code, e.g. `duplicate_email`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl<T> ApiResponse<T> {
    pub const fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            kind: None,
            code: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
            kind: None,
            code: None,
        }
    }

    #[must_use]
    pub fn with_code(mut self, kind: &str, code: &str) -> Self {
        self.kind = Some(kind.to_string());
        self.code = Some(code.to_string());
        self
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub new_password: String,
}

#[derive(Debug, Deserialize)]
pub struct ProviderLoginRequest {
    #[serde(default)]
    pub access_token: String,
}

#[derive(Debug, Deserialize)]
pub struct ProviderRoleRequest {
    /// Must match the session account when present.
    pub account_id: Option<String>,
    #[serde(default)]
    pub role: String,
}

#[derive(Debug, Deserialize)]
pub struct ResumeUploadQuery {
    pub filename: String,
}

#[derive(Debug, Serialize)]
pub struct ResumeUploadResponse {
    pub path: String,
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: crate::entities::accounts::AccountStatus,
}

#[derive(Debug, Serialize)]
pub struct RoleDto {
    pub key: &'static str,
    pub category: &'static str,
    pub sub_category: &'static str,
}

impl From<&RoleDefinition> for RoleDto {
    fn from(role: &RoleDefinition) -> Self {
        Self {
            key: role.key,
            category: role.category,
            sub_category: role.sub_category,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}
