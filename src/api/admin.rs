use axum::{
    Json,
    extract::{Path, State},
};
use std::sync::Arc;
use tower_sessions::Session;

use super::auth::session_account_id;
use super::{ApiError, ApiResponse, AppState, StatusUpdateRequest};
use crate::models::AccountSummary;

/// PUT /admin/accounts/{id}/status
pub async fn set_account_status(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(id): Path<String>,
    Json(payload): Json<StatusUpdateRequest>,
) -> Result<Json<ApiResponse<AccountSummary>>, ApiError> {
    let actor_id = session_account_id(&session).await?;
    let summary = state
        .accounts()
        .set_status(&actor_id, &id, payload.status)
        .await?;
    Ok(Json(ApiResponse::success(summary)))
}
