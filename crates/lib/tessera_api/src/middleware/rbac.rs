//! Role filter middleware. Layer it inside `require_auth`.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tessera_core::auth::guard;
use tessera_core::models::auth::Role;

use super::auth::AuthenticatedUser;
use crate::error::AppError;

/// Roles admitted by a [`require_role`] layer.
#[derive(Debug, Clone)]
pub struct AllowedRoles(Arc<[Role]>);

impl AllowedRoles {
    pub fn new(roles: impl IntoIterator<Item = Role>) -> Self {
        Self(roles.into_iter().collect())
    }
}

/// Axum middleware: rejects with 401 when no `AuthenticatedUser` is attached
/// and 403 when its role is not in the allowed set.
pub async fn require_role(
    State(allowed): State<AllowedRoles>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let claims = request
        .extensions()
        .get::<AuthenticatedUser>()
        .map(|user| &user.0);

    guard::authorize(claims, &allowed.0)?;

    Ok(next.run(request).await)
}
