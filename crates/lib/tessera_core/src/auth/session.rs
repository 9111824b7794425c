//! Session lifecycle: register, login, refresh, logout and identity lookup.
//!
//! Session state is implicit: a session exists while its refresh record does.
//! Access tokens are never stored. Refresh tokens are not rotated on use.

use std::sync::Arc;

use sha2::{Digest, Sha256};
use tracing::{info, warn};
use uuid::Uuid;

use super::AuthError;
use super::jwt::{JwtCodec, MintedToken};
use super::password::PasswordHasher;
use crate::clock::Clock;
use crate::config::AuthConfig;
use crate::models::auth::{AccessGrant, AuthSession, NewUser, Role, TokenKind, User};
use crate::store::{CredentialStore, StoreError};

/// Minimum password length accepted at registration.
pub const MIN_PASSWORD_LEN: usize = 8;

const TOKEN_TYPE: &str = "Bearer";

/// SHA-256 hash a refresh token for storage.
pub fn hash_refresh_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Trim and lowercase an email so lookups and uniqueness are case-blind.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn present(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// Orchestrates the store, hasher and token codec.
pub struct SessionManager {
    store: Arc<dyn CredentialStore>,
    codec: JwtCodec,
    hasher: PasswordHasher,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("codec", &self.codec)
            .field("hasher", &self.hasher)
            .finish()
    }
}

impl SessionManager {
    pub fn new(
        config: &AuthConfig,
        store: Arc<dyn CredentialStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            codec: JwtCodec::new(config, clock.clone()),
            hasher: PasswordHasher::new(config.hash_cost),
            clock,
        }
    }

    /// Token codec, shared with the access guard.
    pub fn codec(&self) -> &JwtCodec {
        &self.codec
    }

    pub fn store(&self) -> &Arc<dyn CredentialStore> {
        &self.store
    }

    /// Create an identity and open its first session.
    pub async fn register(
        &self,
        email: Option<&str>,
        password: Option<&str>,
        name: Option<&str>,
    ) -> Result<AuthSession, AuthError> {
        let (Some(email), Some(password), Some(name)) = (
            present(email),
            password.filter(|p| !p.is_empty()),
            present(name),
        )
        else {
            return Err(AuthError::Validation("Missing required fields".into()));
        };

        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::WeakPassword(MIN_PASSWORD_LEN));
        }

        let email = normalize_email(email);
        if self.store.find_user_by_email(&email).await?.is_some() {
            return Err(AuthError::EmailAlreadyExists);
        }

        let password_hash = self.hasher.hash(password).await?;
        let user = self
            .store
            .create_user(NewUser {
                email,
                name: name.trim().to_string(),
                password_hash,
                role: Role::User,
            })
            .await
            .map_err(|e| match e {
                // Lost a race with a concurrent registration.
                StoreError::UniqueViolation => AuthError::EmailAlreadyExists,
                other => AuthError::Store(other),
            })?;

        info!(user_id = %user.id, email = %user.email, "user registered");
        self.open_session(user).await
    }

    /// Exchange email + password for a new session.
    pub async fn login(
        &self,
        email: Option<&str>,
        password: Option<&str>,
    ) -> Result<AuthSession, AuthError> {
        let (Some(email), Some(password)) = (present(email), password.filter(|p| !p.is_empty()))
        else {
            return Err(AuthError::Validation("Missing email or password".into()));
        };

        let email = normalize_email(email);
        // Unknown email and wrong password must be indistinguishable.
        let Some(record) = self.store.find_user_by_email(&email).await? else {
            return Err(AuthError::CredentialError);
        };
        if !self.hasher.verify(password, &record.password_hash).await? {
            return Err(AuthError::CredentialError);
        }

        info!(user_id = %record.user.id, "user logged in");
        self.open_session(record.user).await
    }

    /// Mint a new access token from a live refresh token.
    pub async fn refresh(&self, refresh_token: Option<&str>) -> Result<AccessGrant, AuthError> {
        let Some(refresh_token) = present(refresh_token).map(str::trim) else {
            return Err(AuthError::Validation("Refresh token required".into()));
        };

        let claims = self
            .codec
            .verify(refresh_token)
            .map_err(AuthError::InvalidRefreshToken)?;
        if claims.kind != TokenKind::Refresh {
            return Err(AuthError::InvalidTokenType);
        }

        let token_hash = hash_refresh_token(refresh_token);
        self.store
            .find_refresh_token(&token_hash, claims.sub, self.clock.now())
            .await?
            .ok_or(AuthError::RefreshTokenNotFound)?;

        let user = self
            .store
            .find_user_by_id(claims.sub)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        let access = self.codec.mint_access(&user)?;
        Ok(AccessGrant {
            access_token: access.token,
            expires_in: self.codec.access_ttl().num_seconds(),
            token_type: TOKEN_TYPE.to_string(),
        })
    }

    /// Revoke the given refresh token if it belongs to `user_id`.
    /// Succeeds whether or not anything matched.
    pub async fn logout(
        &self,
        user_id: Uuid,
        refresh_token: Option<&str>,
    ) -> Result<(), AuthError> {
        if let Some(token) = present(refresh_token).map(str::trim) {
            let removed = self
                .store
                .delete_refresh_tokens(&hash_refresh_token(token), user_id)
                .await?;
            info!(user_id = %user_id, removed, "user logged out");
        }
        Ok(())
    }

    /// Revoke every refresh token the user holds. Returns how many were removed.
    pub async fn logout_all(&self, user_id: Uuid) -> Result<u64, AuthError> {
        let removed = self.store.delete_all_refresh_tokens(user_id).await?;
        info!(user_id = %user_id, removed, "all sessions revoked");
        Ok(removed)
    }

    /// Identity-view of the caller.
    pub async fn me(&self, user_id: Uuid) -> Result<User, AuthError> {
        self.find_user(user_id).await
    }

    /// Identity-view of any user.
    pub async fn find_user(&self, user_id: Uuid) -> Result<User, AuthError> {
        self.store
            .find_user_by_id(user_id)
            .await?
            .ok_or_else(|| AuthError::NotFound("User".into()))
    }

    /// Mint an access + refresh pair and persist the refresh record.
    async fn open_session(&self, user: User) -> Result<AuthSession, AuthError> {
        let access = self.codec.mint_access(&user)?;
        let MintedToken {
            token: refresh_token,
            expires_at,
        } = self.codec.mint_refresh(user.id)?;

        if let Err(e) = self
            .store
            .create_refresh_token(user.id, &hash_refresh_token(&refresh_token), expires_at)
            .await
        {
            warn!(user_id = %user.id, "failed to persist refresh token: {e}");
            return Err(e.into());
        }

        Ok(AuthSession {
            user,
            access_token: access.token,
            refresh_token,
            expires_in: self.codec.access_ttl().num_seconds(),
            token_type: TOKEN_TYPE.to_string(),
        })
    }
}
