//! Access guard: bearer extraction, token checks and the role filter.
//!
//! Transport-agnostic: the HTTP middleware hands in the raw `Authorization`
//! header value and maps the resulting [`AuthError`] to a response.

use tracing::debug;

use super::AuthError;
use super::jwt::{JwtCodec, TokenError};
use crate::models::auth::{Role, TokenClaims, TokenKind};

const BEARER_PREFIX: &str = "Bearer ";

/// Pull the token out of an `Authorization: Bearer <token>` header value.
pub fn bearer_token(header: Option<&str>) -> Result<&str, AuthError> {
    let token = header
        .and_then(|h| h.strip_prefix(BEARER_PREFIX))
        .map(str::trim)
        .unwrap_or_default();
    if token.is_empty() {
        debug!("auth guard: missing or non-bearer authorization header");
        return Err(AuthError::MissingToken);
    }
    Ok(token)
}

/// Admit a request only if it carries a valid, unexpired access token.
pub fn authenticate(codec: &JwtCodec, header: Option<&str>) -> Result<TokenClaims, AuthError> {
    let token = bearer_token(header)?;
    let claims = codec.verify(token).map_err(|e| {
        debug!("auth guard: {e}");
        match e {
            TokenError::Expired => AuthError::TokenExpired,
            TokenError::Invalid => AuthError::InvalidToken,
        }
    })?;
    if claims.kind != TokenKind::Access {
        debug!(sub = %claims.sub, "auth guard: refresh token presented as access token");
        return Err(AuthError::InvalidTokenType);
    }
    Ok(claims)
}

/// Role filter, applied after [`authenticate`].
pub fn authorize(claims: Option<&TokenClaims>, allowed: &[Role]) -> Result<(), AuthError> {
    let claims = claims.ok_or(AuthError::Unauthenticated)?;
    match claims.role {
        Some(role) if allowed.contains(&role) => Ok(()),
        _ => {
            debug!(sub = %claims.sub, role = ?claims.role, "auth guard: role not allowed");
            Err(AuthError::Forbidden)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{Duration, Utc};
    use uuid::Uuid;

    use super::*;
    use crate::clock::ManualClock;
    use crate::config::AuthConfig;
    use crate::models::auth::User;

    fn setup() -> (JwtCodec, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::default());
        let config = AuthConfig::new("guard-test-secret-guard-test-secret").unwrap();
        (JwtCodec::new(&config, clock.clone()), clock)
    }

    fn user(role: Role) -> User {
        User {
            id: Uuid::new_v4(),
            email: "a@x.com".into(),
            name: "Ann".into(),
            role,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn bearer_token_requires_scheme() {
        assert!(matches!(bearer_token(None), Err(AuthError::MissingToken)));
        assert!(matches!(
            bearer_token(Some("Basic abc")),
            Err(AuthError::MissingToken)
        ));
        assert!(matches!(
            bearer_token(Some("Bearer ")),
            Err(AuthError::MissingToken)
        ));
        assert_eq!(bearer_token(Some("Bearer abc")).unwrap(), "abc");
    }

    #[test]
    fn access_token_is_admitted() {
        let (codec, _) = setup();
        let user = user(Role::User);
        let token = codec.mint_access(&user).unwrap().token;
        let claims = authenticate(&codec, Some(&format!("Bearer {token}"))).unwrap();
        assert_eq!(claims.sub, user.id);
    }

    #[test]
    fn refresh_token_is_rejected() {
        let (codec, _) = setup();
        let token = codec.mint_refresh(Uuid::new_v4()).unwrap().token;
        let err = authenticate(&codec, Some(&format!("Bearer {token}"))).unwrap_err();
        assert!(matches!(err, AuthError::InvalidTokenType));
    }

    #[test]
    fn expired_and_invalid_are_distinguished() {
        let (codec, clock) = setup();
        let token = codec.mint_access(&user(Role::User)).unwrap().token;
        clock.advance(Duration::hours(24));
        let err = authenticate(&codec, Some(&format!("Bearer {token}"))).unwrap_err();
        assert!(matches!(err, AuthError::TokenExpired));
        assert_eq!(err.to_string(), "Token expired");

        let err = authenticate(&codec, Some("Bearer garbage")).unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken));
        assert_eq!(err.to_string(), "Invalid token");
    }

    #[test]
    fn role_filter() {
        let (codec, _) = setup();
        let admin = codec
            .verify(&codec.mint_access(&user(Role::Admin)).unwrap().token)
            .unwrap();
        let plain = codec
            .verify(&codec.mint_access(&user(Role::User)).unwrap().token)
            .unwrap();

        assert!(authorize(Some(&admin), &[Role::Admin]).is_ok());
        assert!(authorize(Some(&plain), &[Role::User, Role::Admin]).is_ok());
        assert!(matches!(
            authorize(Some(&plain), &[Role::Admin]),
            Err(AuthError::Forbidden)
        ));
        assert!(matches!(
            authorize(None, &[Role::Admin]),
            Err(AuthError::Unauthenticated)
        ));
    }
}
