use axum::{
    Json,
    body::Bytes,
    extract::{Query, State},
};
use std::sync::Arc;
use tower_sessions::Session;

use super::auth::session_account_id;
use super::{ApiError, ApiResponse, AppState, ResumeUploadQuery, ResumeUploadResponse};
use crate::services::{OnboardingOutcome, ProfileForm};

pub const MAX_RESUME_BYTES: usize = 10 * 1024 * 1024;

/// PUT /onboarding/profile
pub async fn complete_profile(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(form): Json<ProfileForm>,
) -> Result<Json<ApiResponse<OnboardingOutcome>>, ApiError> {
    let account_id = session_account_id(&session).await?;
    let outcome = state
        .onboarding()
        .complete_profile(&account_id, form)
        .await?;
    Ok(Json(ApiResponse::success(outcome)))
}

/// POST /onboarding/resume?filename=cv.pdf
/// Stores the raw request body; the returned path goes into the profile form.
pub async fn upload_resume(
    State(state): State<Arc<AppState>>,
    session: Session,
    Query(query): Query<ResumeUploadQuery>,
    body: Bytes,
) -> Result<Json<ApiResponse<ResumeUploadResponse>>, ApiError> {
    let account_id = session_account_id(&session).await?;

    if query.filename.trim().is_empty() {
        return Err(ApiError::validation("filename is required"));
    }
    if body.is_empty() {
        return Err(ApiError::validation("Resume body is empty"));
    }
    if body.len() > MAX_RESUME_BYTES {
        return Err(ApiError::validation("Resume exceeds 10 MiB"));
    }

    let path = state
        .shared
        .resumes
        .store(&account_id, &query.filename, &body)
        .await?;

    Ok(Json(ApiResponse::success(ResumeUploadResponse { path })))
}
