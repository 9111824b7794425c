//! JWT token generation and verification.
//!
//! All tokens are HS256 and carry a `type` claim so an access token can never
//! stand in for a refresh token or the other way round. Expiry is checked
//! against the injected [`Clock`] rather than inside `jsonwebtoken`.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use thiserror::Error;
use uuid::Uuid;

use super::AuthError;
use crate::clock::Clock;
use crate::config::AuthConfig;
use crate::models::auth::{Role, TokenClaims, TokenKind, User};

/// Why a token failed verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("token expired")]
    Expired,

    /// Malformed, wrong algorithm or bad signature.
    #[error("token invalid")]
    Invalid,
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            _ => TokenError::Invalid,
        }
    }
}

/// A freshly signed token and the moment it stops being valid.
#[derive(Debug, Clone)]
pub struct MintedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Signs and verifies access and refresh tokens.
#[derive(Clone)]
pub struct JwtCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    access_ttl: Duration,
    refresh_ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for JwtCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtCodec")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish()
    }
}

impl JwtCodec {
    pub fn new(config: &AuthConfig, clock: Arc<dyn Clock>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked against `clock` in `verify`.
        validation.validate_exp = false;
        validation.leeway = 0;

        Self {
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation,
            access_ttl: config.access_ttl,
            refresh_ttl: config.refresh_ttl,
            clock,
        }
    }

    pub fn access_ttl(&self) -> Duration {
        self.access_ttl
    }

    pub fn refresh_ttl(&self) -> Duration {
        self.refresh_ttl
    }

    /// Sign an access token carrying the user's id, email and role.
    pub fn mint_access(&self, user: &User) -> Result<MintedToken, AuthError> {
        self.mint(
            user.id,
            TokenKind::Access,
            Some((user.email.clone(), user.role)),
            self.access_ttl,
        )
    }

    /// Sign a refresh token carrying only the subject.
    pub fn mint_refresh(&self, user_id: Uuid) -> Result<MintedToken, AuthError> {
        self.mint(user_id, TokenKind::Refresh, None, self.refresh_ttl)
    }

    fn mint(
        &self,
        subject: Uuid,
        kind: TokenKind,
        identity: Option<(String, Role)>,
        ttl: Duration,
    ) -> Result<MintedToken, AuthError> {
        let now = self.clock.now();
        let iat = now.timestamp();
        let exp = iat + ttl.num_seconds();
        let (email, role) = match identity {
            Some((email, role)) => (Some(email), Some(role)),
            None => (None, None),
        };
        let claims = TokenClaims {
            sub: subject,
            email,
            role,
            kind,
            iat,
            exp,
            jti: Uuid::new_v4(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::Internal(format!("jwt encode: {e}")))?;
        let expires_at = DateTime::from_timestamp(exp, 0)
            .ok_or_else(|| AuthError::Internal(format!("jwt expiry out of range: {exp}")))?;
        Ok(MintedToken { token, expires_at })
    }

    /// Check signature and expiry, returning the claims on success.
    pub fn verify(&self, token: &str) -> Result<TokenClaims, TokenError> {
        let claims = decode::<TokenClaims>(token, &self.decoding_key, &self.validation)?.claims;
        if self.clock.now().timestamp() >= claims.exp {
            return Err(TokenError::Expired);
        }
        Ok(claims)
    }
}
