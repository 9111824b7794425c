//! Persistence for identities and refresh-token records.
//!
//! The session manager only talks to [`CredentialStore`]. Two backends ship
//! with the crate: [`postgres::PgStore`] for deployments and
//! [`memory::MemoryStore`] for tests and single-process runs.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::models::auth::{NewUser, RefreshTokenRecord, User, UserWithPassword};

/// Store failures.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write (duplicate email).
    #[error("unique constraint violated")]
    UniqueViolation,

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::UniqueViolation,
            _ => StoreError::Unavailable(e.to_string()),
        }
    }
}

/// Narrow interface the session lifecycle needs from persistence.
///
/// Emails passed in are already normalized by the caller.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find_user_by_email(&self, email: &str)
    -> Result<Option<UserWithPassword>, StoreError>;

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    /// Insert a new identity. Must fail with [`StoreError::UniqueViolation`]
    /// if the email is taken, even under concurrent inserts.
    async fn create_user(&self, user: NewUser) -> Result<User, StoreError>;

    async fn create_refresh_token(
        &self,
        user_id: Uuid,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<RefreshTokenRecord, StoreError>;

    /// Find a record matching digest and owner whose expiry is after `now`.
    async fn find_refresh_token(
        &self,
        token_hash: &str,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<RefreshTokenRecord>, StoreError>;

    /// Delete records matching digest and owner. Returns how many went.
    async fn delete_refresh_tokens(&self, token_hash: &str, user_id: Uuid)
    -> Result<u64, StoreError>;

    /// Delete every record owned by `user_id`. Returns how many went.
    async fn delete_all_refresh_tokens(&self, user_id: Uuid) -> Result<u64, StoreError>;

    /// Cheap connectivity check.
    async fn ping(&self) -> Result<(), StoreError>;
}
