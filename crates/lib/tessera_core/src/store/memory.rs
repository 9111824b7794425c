//! In-process credential store backed by `DashMap`.
//!
//! Nothing survives a restart. Email uniqueness is enforced through a
//! `DashMap` entry on the email index, so concurrent registrations race on a
//! single shard lock rather than on a check-then-insert.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use uuid::Uuid;

use super::{CredentialStore, StoreError};
use crate::models::auth::{NewUser, RefreshTokenRecord, User, UserWithPassword};

#[derive(Debug, Default)]
pub struct MemoryStore {
    users: DashMap<Uuid, UserWithPassword>,
    emails: DashMap<String, Uuid>,
    refresh_tokens: DashMap<Uuid, RefreshTokenRecord>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of refresh records currently held, expired ones included.
    pub fn refresh_token_count(&self) -> usize {
        self.refresh_tokens.len()
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn find_user_by_email(
        &self,
        email: &str,
    ) -> Result<Option<UserWithPassword>, StoreError> {
        let Some(id) = self.emails.get(email).map(|r| *r.value()) else {
            return Ok(None);
        };
        Ok(self.users.get(&id).map(|r| r.value().clone()))
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.users.get(&id).map(|r| r.value().user.clone()))
    }

    async fn create_user(&self, new_user: NewUser) -> Result<User, StoreError> {
        match self.emails.entry(new_user.email.clone()) {
            Entry::Occupied(_) => Err(StoreError::UniqueViolation),
            Entry::Vacant(slot) => {
                let user = User {
                    id: Uuid::new_v4(),
                    email: new_user.email,
                    name: new_user.name,
                    role: new_user.role,
                    created_at: Utc::now(),
                };
                self.users.insert(
                    user.id,
                    UserWithPassword {
                        user: user.clone(),
                        password_hash: new_user.password_hash,
                    },
                );
                slot.insert(user.id);
                Ok(user)
            }
        }
    }

    async fn create_refresh_token(
        &self,
        user_id: Uuid,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<RefreshTokenRecord, StoreError> {
        let record = RefreshTokenRecord {
            id: Uuid::now_v7(),
            user_id,
            token_hash: token_hash.to_string(),
            expires_at,
            created_at: Utc::now(),
        };
        self.refresh_tokens.insert(record.id, record.clone());
        Ok(record)
    }

    async fn find_refresh_token(
        &self,
        token_hash: &str,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<RefreshTokenRecord>, StoreError> {
        Ok(self
            .refresh_tokens
            .iter()
            .find(|r| r.token_hash == token_hash && r.user_id == user_id && r.is_live(now))
            .map(|r| r.value().clone()))
    }

    async fn delete_refresh_tokens(
        &self,
        token_hash: &str,
        user_id: Uuid,
    ) -> Result<u64, StoreError> {
        let mut removed = 0;
        self.refresh_tokens.retain(|_, r| {
            let hit = r.token_hash == token_hash && r.user_id == user_id;
            removed += u64::from(hit);
            !hit
        });
        Ok(removed)
    }

    async fn delete_all_refresh_tokens(&self, user_id: Uuid) -> Result<u64, StoreError> {
        let mut removed = 0;
        self.refresh_tokens.retain(|_, r| {
            let hit = r.user_id == user_id;
            removed += u64::from(hit);
            !hit
        });
        Ok(removed)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
