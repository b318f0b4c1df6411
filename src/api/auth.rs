use axum::{Json, extract::State};
use std::sync::Arc;
use tower_sessions::Session;

use super::{
    ApiError, ApiResponse, AppState, ForgotPasswordRequest, LoginRequest, MessageResponse,
    ProviderLoginRequest, ProviderRoleRequest, ResetPasswordRequest,
};
use crate::models::AccountSummary;
use crate::services::{OnboardingOutcome, SignupRequest};

const SESSION_ACCOUNT_KEY: &str = "account_id";

type OutcomeResponse = Result<Json<ApiResponse<OnboardingOutcome>>, ApiError>;

// ============================================================================
// Session helpers
// ============================================================================

/// Account id of the signed-in caller.
pub async fn session_account_id(session: &Session) -> Result<String, ApiError> {
    match session.get::<String>(SESSION_ACCOUNT_KEY).await {
        Ok(Some(account_id)) => {
            tracing::Span::current().record("account_id", account_id.as_str());
            Ok(account_id)
        }
        Ok(None) => Err(ApiError::unauthenticated()),
        Err(e) => Err(ApiError::internal(format!("Failed to read session: {e}"))),
    }
}

/// Binds the session to the account carried by the outcome, if any.
async fn remember(session: &Session, outcome: &OnboardingOutcome) -> Result<(), ApiError> {
    if let Some(account) = outcome.account() {
        session
            .insert(SESSION_ACCOUNT_KEY, &account.id)
            .await
            .map_err(|e| ApiError::internal(format!("Failed to create session: {e}")))?;
    }
    Ok(())
}

async fn respond(session: &Session, outcome: OnboardingOutcome) -> OutcomeResponse {
    remember(session, &outcome).await?;
    Ok(Json(ApiResponse::success(outcome)))
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /auth/signup
pub async fn signup(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(payload): Json<SignupRequest>,
) -> OutcomeResponse {
    let outcome = state.onboarding().signup(payload).await?;
    respond(&session, outcome).await
}

/// POST /auth/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(payload): Json<LoginRequest>,
) -> OutcomeResponse {
    let outcome = state
        .onboarding()
        .login(&payload.email, &payload.password)
        .await?;
    respond(&session, outcome).await
}

/// POST /auth/forgot-password
pub async fn forgot_password(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ForgotPasswordRequest>,
) -> OutcomeResponse {
    let outcome = state.onboarding().forgot_password(&payload.email).await?;
    Ok(Json(ApiResponse::success(outcome)))
}

/// POST /auth/reset-password
pub async fn reset_password(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ResetPasswordRequest>,
) -> OutcomeResponse {
    let outcome = state
        .onboarding()
        .reset_password(&payload.email, &payload.code, &payload.new_password)
        .await?;
    Ok(Json(ApiResponse::success(outcome)))
}

/// POST /auth/provider
/// Exchange an identity-provider access token for a session.
pub async fn provider_login(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(payload): Json<ProviderLoginRequest>,
) -> OutcomeResponse {
    let outcome = state
        .onboarding()
        .provider_login(&payload.access_token)
        .await?;
    respond(&session, outcome).await
}

/// POST /auth/provider/role
/// The account always comes from the session; a body `account_id` must name
/// the same account.
pub async fn select_provider_role(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(payload): Json<ProviderRoleRequest>,
) -> OutcomeResponse {
    let account_id = session_account_id(&session).await?;

    let requested = payload.account_id.as_deref().map(str::trim);
    if requested.is_some_and(|id| !id.is_empty() && id != account_id) {
        return Err(ApiError::Unauthorized(
            "Session does not belong to this account".to_string(),
        ));
    }

    let outcome = state
        .onboarding()
        .select_provider_role(&account_id, &payload.role)
        .await?;
    Ok(Json(ApiResponse::success(outcome)))
}

/// GET /auth/me
pub async fn me(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> Result<Json<ApiResponse<AccountSummary>>, ApiError> {
    let account_id = session_account_id(&session).await?;
    let summary = state.accounts().get_summary(&account_id).await?;
    Ok(Json(ApiResponse::success(summary)))
}

/// POST /auth/logout
pub async fn logout(session: Session) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    session
        .flush()
        .await
        .map_err(|e| ApiError::internal(format!("Failed to end session: {e}")))?;

    Ok(Json(ApiResponse::success(MessageResponse {
        message: "Logged out".to_string(),
    })))
}
