//! Account directory: argon2-hashed user accounts and contact listing.
//!
//! Nothing in the live relay path reads from here; the relay trusts the user
//! id a connection announces.

use anyhow::{Context, Result};
use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use super::ChatRepository;
use crate::models::{Contact, User};

/// Hash a password with Argon2id and a random salt.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("failed to hash password: {e}"))?;
    Ok(hash.to_string())
}

/// Verify a password against a stored Argon2id hash.
pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let parsed =
        PasswordHash::new(hash).map_err(|e| anyhow::anyhow!("invalid password hash: {e}"))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

impl ChatRepository {
    /// Insert a new account. Returns `false` if the username is already taken,
    /// including when a concurrent registration claimed it first.
    pub async fn create_user(&self, user: &User) -> Result<bool> {
        let result = sqlx::query(
            "INSERT INTO users (id, username, email, avatar, password_hash, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&user.id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.avatar)
        .bind(&user.password_hash)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(true),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Ok(false),
            Err(e) => Err(e).context("Failed to insert user"),
        }
    }

    pub async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, email, avatar, password_hash, created_at, updated_at
             FROM users WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    /// Every account except `exclude_id`, oldest registration first.
    pub async fn list_contacts(&self, exclude_id: &str) -> Result<Vec<Contact>> {
        let contacts = sqlx::query_as::<_, Contact>(
            "SELECT id, username, avatar FROM users
             WHERE id != ?
             ORDER BY created_at ASC, username ASC",
        )
        .bind(exclude_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(contacts)
    }
}
