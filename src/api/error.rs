use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::fmt;

use super::ApiResponse;
use crate::services::{ErrorKind, OnboardingError};

#[derive(Debug)]
pub enum ApiError {
    ValidationError(String),

    InternalError(String),

    Unauthorized(String),

    Onboarding(OnboardingError),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::Onboarding(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for ApiError {}

const fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Validation | ErrorKind::Challenge => StatusCode::BAD_REQUEST,
        ErrorKind::Conflict => StatusCode::CONFLICT,
        ErrorKind::Authentication | ErrorKind::ExternalDependency => StatusCode::UNAUTHORIZED,
        ErrorKind::Authorization => StatusCode::FORBIDDEN,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            ApiError::ValidationError(msg) => (
                StatusCode::BAD_REQUEST,
                ApiResponse::<()>::error(msg.clone()).with_code("validation", "invalid_request"),
            ),
            ApiError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiResponse::<()>::error("An internal error occurred")
                        .with_code("internal", "internal"),
                )
            }
            ApiError::Unauthorized(msg) => (
                StatusCode::UNAUTHORIZED,
                ApiResponse::<()>::error(msg.clone())
                    .with_code("authentication", "unauthenticated"),
            ),
            ApiError::Onboarding(err) => {
                let kind = err.kind();
                let message = if kind == ErrorKind::Internal {
                    tracing::error!("Onboarding internal error: {}", err);
                    "An internal error occurred".to_string()
                } else {
                    err.to_string()
                };
                (
                    status_for(kind),
                    ApiResponse::<()>::error(message).with_code(kind.as_str(), err.code()),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<OnboardingError> for ApiError {
    fn from(err: OnboardingError) -> Self {
        ApiError::Onboarding(err)
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::InternalError(err.to_string())
    }
}

impl ApiError {
    pub fn validation(msg: impl Into<String>) -> Self {
        ApiError::ValidationError(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        ApiError::InternalError(msg.into())
    }

    pub fn unauthenticated() -> Self {
        ApiError::Unauthorized("Sign in required".to_string())
    }
}
