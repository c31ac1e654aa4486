//! Account registration and credential checks.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::Utc;
use common::{Role, UserId};
use serde::{Deserialize, Serialize};
use store::{Store, StoreError, User};
use thiserror::Error;

use crate::error::{DomainError, Result};

const MIN_PASSWORD_LEN: usize = 8;

/// Errors raised by account operations.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Username already exists")]
    UsernameTaken,

    #[error("Email already exists")]
    EmailTaken,

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Invalid {field}: {reason}")]
    InvalidInput {
        field: &'static str,
        reason: &'static str,
    },

    #[error("Password hashing failed")]
    PasswordHash,
}

/// Registration form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterUser {
    pub username: String,
    pub email: String,
    pub password: String,
    pub full_name: String,
}

impl RegisterUser {
    fn validate(&self) -> std::result::Result<(), AuthError> {
        let invalid = |field, reason| Err(AuthError::InvalidInput { field, reason });
        if self.username.trim().is_empty() {
            return invalid("username", "must not be empty");
        }
        if self.full_name.trim().is_empty() {
            return invalid("full_name", "must not be empty");
        }
        if !self.email.contains('@') {
            return invalid("email", "must be an email address");
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return invalid("password", "must be at least 8 characters");
        }
        Ok(())
    }
}

/// Creates accounts and checks credentials.
#[derive(Clone)]
pub struct AuthService<S: Store> {
    store: S,
}

impl<S: Store> AuthService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Registers a new account with the `USER` role.
    #[tracing::instrument(skip(self, form), fields(username = %form.username))]
    pub async fn register(&self, form: RegisterUser) -> Result<User> {
        let user = self.create(form, Role::User).await?;
        tracing::info!(user_id = %user.id, "user registered");
        Ok(user)
    }

    /// Makes sure an `ADMIN` account with the form's username exists.
    ///
    /// An existing administrator is returned unchanged, password included.
    /// A `USER` account holding the name fails with `UsernameTaken`.
    #[tracing::instrument(skip(self, form), fields(username = %form.username))]
    pub async fn ensure_admin(&self, form: RegisterUser) -> Result<User> {
        if let Some(existing) = self.store.find_user_by_username(form.username.trim()).await? {
            if existing.role == Role::Admin {
                return Ok(existing);
            }
            return Err(AuthError::UsernameTaken.into());
        }

        let user = self.create(form, Role::Admin).await?;
        tracing::info!(user_id = %user.id, "administrator account created");
        Ok(user)
    }

    async fn create(&self, form: RegisterUser, role: Role) -> Result<User> {
        form.validate()?;
        let username = form.username.trim().to_string();

        if self.store.find_user_by_username(&username).await?.is_some() {
            return Err(AuthError::UsernameTaken.into());
        }

        let user = User {
            id: UserId::new(),
            username,
            email: form.email.trim().to_string(),
            password_hash: hash_password(&form.password)?,
            full_name: form.full_name.trim().to_string(),
            role,
            created_at: Utc::now(),
        };
        self.store.insert_user(&user).await.map_err(|e| match e {
            StoreError::Duplicate { field: "email" } => DomainError::from(AuthError::EmailTaken),
            StoreError::Duplicate { .. } => AuthError::UsernameTaken.into(),
            other => other.into(),
        })?;
        Ok(user)
    }

    /// Returns the user if the password matches.
    #[tracing::instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &str) -> Result<User> {
        let user = self
            .store
            .find_user_by_username(username.trim())
            .await?
            .ok_or(AuthError::InvalidCredentials)?;
        verify_password(password, &user.password_hash)?;
        Ok(user)
    }
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> std::result::Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

fn verify_password(password: &str, hash: &str) -> std::result::Result<(), AuthError> {
    let parsed = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .map_err(|_| AuthError::InvalidCredentials)
}
