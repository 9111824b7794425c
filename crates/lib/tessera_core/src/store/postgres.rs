//! PostgreSQL credential store.
//!
//! Schema lives in `tessera_core/migrations/`. Email uniqueness is the
//! `users_email_key` unique index, which is what settles duplicate
//! registrations racing each other.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::{CredentialStore, StoreError};
use crate::models::auth::{NewUser, RefreshTokenRecord, Role, User, UserWithPassword};

type UserRow = (Uuid, String, String, String, DateTime<Utc>);
type UserWithPasswordRow = (Uuid, String, String, String, DateTime<Utc>, String);
type RefreshRow = (Uuid, Uuid, String, DateTime<Utc>, DateTime<Utc>);

/// Credential store over a shared connection pool.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn user_from_row((id, email, name, role, created_at): UserRow) -> Result<User, StoreError> {
    let role = role
        .parse::<Role>()
        .map_err(|e| StoreError::Unavailable(format!("corrupt users.role: {e}")))?;
    Ok(User {
        id,
        email,
        name,
        role,
        created_at,
    })
}

fn refresh_from_row(
    (id, user_id, token_hash, expires_at, created_at): RefreshRow,
) -> RefreshTokenRecord {
    RefreshTokenRecord {
        id,
        user_id,
        token_hash,
        expires_at,
        created_at,
    }
}

#[async_trait]
impl CredentialStore for PgStore {
    async fn find_user_by_email(
        &self,
        email: &str,
    ) -> Result<Option<UserWithPassword>, StoreError> {
        let row = sqlx::query_as::<_, UserWithPasswordRow>(
            "SELECT id, email, name, role, created_at, password_hash FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|(id, email, name, role, created_at, password_hash)| {
            Ok(UserWithPassword {
                user: user_from_row((id, email, name, role, created_at))?,
                password_hash,
            })
        })
        .transpose()
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, email, name, role, created_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(user_from_row).transpose()
    }

    async fn create_user(&self, user: NewUser) -> Result<User, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(
            "INSERT INTO users (id, email, name, password_hash, role) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING id, email, name, role, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(&user.email)
        .bind(&user.name)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .fetch_one(&self.pool)
        .await?;
        user_from_row(row)
    }

    async fn create_refresh_token(
        &self,
        user_id: Uuid,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<RefreshTokenRecord, StoreError> {
        let row = sqlx::query_as::<_, RefreshRow>(
            "INSERT INTO refresh_tokens (id, user_id, token_hash, expires_at) \
             VALUES ($1, $2, $3, $4) \
             RETURNING id, user_id, token_hash, expires_at, created_at",
        )
        .bind(Uuid::now_v7())
        .bind(user_id)
        .bind(token_hash)
        .bind(expires_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(refresh_from_row(row))
    }

    async fn find_refresh_token(
        &self,
        token_hash: &str,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<RefreshTokenRecord>, StoreError> {
        let row = sqlx::query_as::<_, RefreshRow>(
            "SELECT id, user_id, token_hash, expires_at, created_at \
             FROM refresh_tokens \
             WHERE token_hash = $1 \
               AND user_id = $2 \
               AND expires_at > $3 \
             LIMIT 1",
        )
        .bind(token_hash)
        .bind(user_id)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(refresh_from_row))
    }

    async fn delete_refresh_tokens(
        &self,
        token_hash: &str,
        user_id: Uuid,
    ) -> Result<u64, StoreError> {
        let result =
            sqlx::query("DELETE FROM refresh_tokens WHERE token_hash = $1 AND user_id = $2")
                .bind(token_hash)
                .bind(user_id)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected())
    }

    async fn delete_all_refresh_tokens(&self, user_id: Uuid) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
