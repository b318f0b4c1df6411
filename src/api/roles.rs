use axum::Json;

use super::{ApiResponse, RoleDto};
use crate::roles::ROLES;

/// GET /roles
pub async fn list_roles() -> Json<ApiResponse<Vec<RoleDto>>> {
    Json(ApiResponse::success(ROLES.iter().map(RoleDto::from).collect()))
}
