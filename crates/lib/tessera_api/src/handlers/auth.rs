//! Authentication request handlers.

use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::{Extension, Json};

use crate::AppState;
use crate::error::AppResult;
use crate::middleware::auth::AuthenticatedUser;
use crate::models::{
    AccessGrant, AuthSession, LoginRequest, LogoutAllResponse, LogoutRequest, LogoutResponse,
    RefreshRequest, RegisterRequest, User,
};

/// `POST /auth/register`: create a new user account.
pub async fn register_handler(
    State(state): State<AppState>,
    body: Result<Json<RegisterRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<AuthSession>)> {
    let Json(body) = body?;
    let resp = state
        .sessions
        .register(
            body.email.as_deref(),
            body.password.as_deref(),
            body.name.as_deref(),
        )
        .await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

/// `POST /auth/login`: authenticate with email + password.
pub async fn login_handler(
    State(state): State<AppState>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> AppResult<Json<AuthSession>> {
    let Json(body) = body?;
    let resp = state
        .sessions
        .login(body.email.as_deref(), body.password.as_deref())
        .await?;
    Ok(Json(resp))
}

/// `POST /auth/refresh`: exchange a refresh token for a new access token.
pub async fn refresh_handler(
    State(state): State<AppState>,
    body: Result<Json<RefreshRequest>, JsonRejection>,
) -> AppResult<Json<AccessGrant>> {
    let Json(body) = body?;
    let resp = state
        .sessions
        .refresh(body.refresh_token.as_deref())
        .await?;
    Ok(Json(resp))
}

/// `POST /auth/logout`: revoke a refresh token. Requires authentication.
///
/// The body is optional; without a refresh token this is a no-op.
pub async fn logout_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    body: Result<Json<LogoutRequest>, JsonRejection>,
) -> AppResult<Json<LogoutResponse>> {
    let body = body.map(|Json(b)| b).unwrap_or_default();
    state
        .sessions
        .logout(user.0.sub, body.refresh_token.as_deref())
        .await?;
    Ok(Json(LogoutResponse {
        message: "Logged out successfully".into(),
    }))
}

/// `POST /auth/logout-all`: revoke every refresh token of the caller.
pub async fn logout_all_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> AppResult<Json<LogoutAllResponse>> {
    let revoked = state.sessions.logout_all(user.0.sub).await?;
    Ok(Json(LogoutAllResponse {
        message: "All sessions revoked".into(),
        revoked,
    }))
}

/// `GET /auth/me`: identity-view of the caller.
pub async fn me_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> AppResult<Json<User>> {
    let me = state.sessions.me(user.0.sub).await?;
    Ok(Json(me))
}
