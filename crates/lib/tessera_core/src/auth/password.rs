//! Password hashing via bcrypt.
//!
//! Both operations run on the blocking pool.

use tracing::warn;

use super::AuthError;

/// bcrypt hashes at the configured cost and verifies against stored hashes.
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }

    /// Hash a password with a fresh random salt.
    pub async fn hash(&self, password: &str) -> Result<String, AuthError> {
        let password = password.to_owned();
        let cost = self.cost;
        tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
            .await
            .map_err(|e| AuthError::Internal(format!("bcrypt task: {e}")))?
            .map_err(|e| AuthError::Internal(format!("bcrypt hash: {e}")))
    }

    /// Verify a password against a bcrypt hash.
    ///
    /// A malformed hash counts as a mismatch rather than an error.
    pub async fn verify(&self, password: &str, hash: &str) -> Result<bool, AuthError> {
        let password = password.to_owned();
        let hash = hash.to_owned();
        let outcome = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
            .await
            .map_err(|e| AuthError::Internal(format!("bcrypt task: {e}")))?;
        match outcome {
            Ok(matches) => Ok(matches),
            Err(e) => {
                warn!("bcrypt verify rejected stored hash: {e}");
                Ok(false)
            }
        }
    }
}
