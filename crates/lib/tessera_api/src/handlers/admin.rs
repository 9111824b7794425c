//! Admin request handlers. Mounted behind the admin role filter.

use axum::Json;
use axum::extract::{Path, State};
use uuid::Uuid;

use crate::AppState;
use crate::error::AppResult;
use crate::models::User;

/// `GET /admin/users/{id}`: identity-view of any user.
pub async fn get_user_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<User>> {
    let user = state.sessions.find_user(id).await?;
    Ok(Json(user))
}
