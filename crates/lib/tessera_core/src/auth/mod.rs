//! Authentication and authorization logic.
//!
//! Provides password hashing, JWT management, the access guard and the
//! session lifecycle manager that ties them to a [`CredentialStore`].
//!
//! [`CredentialStore`]: crate::store::CredentialStore

pub mod guard;
pub mod jwt;
pub mod password;
pub mod session;

use thiserror::Error;

use self::jwt::TokenError;
use crate::store::StoreError;

/// Authentication errors.
///
/// Messages are what clients see, so the credential and token variants are
/// deliberately uninformative.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{0}")]
    Validation(String),

    #[error("Password must be at least {0} characters")]
    WeakPassword(usize),

    #[error("Email already exists")]
    EmailAlreadyExists,

    #[error("Invalid credentials")]
    CredentialError,

    #[error("No token provided")]
    MissingToken,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token type")]
    InvalidTokenType,

    #[error("Invalid refresh token")]
    InvalidRefreshToken(TokenError),

    #[error("Refresh token not found or expired")]
    RefreshTokenNotFound,

    #[error("User not found")]
    UserNotFound,

    #[error("Unauthorized")]
    Unauthenticated,

    #[error("Forbidden")]
    Forbidden,

    #[error("{0} not found")]
    NotFound(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Internal error: {0}")]
    Internal(String),
}
