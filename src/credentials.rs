// ABOUTME: Credential management - password hashing, verification, and account creation
// ABOUTME: Wraps the UserStore collaborator behind bcrypt-backed verify/create operations
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Sello Sign

//! # Credential Store
//!
//! Passwords are hashed with bcrypt and verified off the async executor via
//! `spawn_blocking`. Verification failures are reported with one generic
//! message whether the username is unknown or the password is wrong, so the
//! response shape never reveals which accounts exist.

use crate::errors::{AppError, AppResult};
use crate::models::User;
use crate::storage::UserStore;
use std::sync::Arc;

/// Generic message returned for any failed credential check
pub const INVALID_CREDENTIALS: &str = "Invalid username or password";

/// Credential store backed by the injected user persistence collaborator
#[derive(Clone)]
pub struct CredentialStore {
    users: Arc<dyn UserStore>,
}

impl CredentialStore {
    #[must_use]
    pub fn new(users: Arc<dyn UserStore>) -> Self {
        Self { users }
    }

    /// Verify a username/password pair, returning the matching user
    ///
    /// # Errors
    ///
    /// Returns `AuthInvalid` with a generic message when the username is
    /// unknown or the password does not match; `InternalError` if hashing
    /// infrastructure fails.
    pub async fn verify(&self, username: &str, password: &str) -> AppResult<User> {
        let user = self
            .users
            .get_user_by_username(username)
            .await
            .map_err(|e| AppError::storage(e.to_string()))?
            .ok_or_else(|| AppError::auth_invalid(INVALID_CREDENTIALS))?;

        // Bcrypt verification is deliberately slow; run it off the executor
        let password = password.to_owned();
        let password_hash = user.password_hash.clone();
        let is_valid =
            tokio::task::spawn_blocking(move || bcrypt::verify(&password, &password_hash))
                .await
                .map_err(|e| AppError::internal(format!("Password verification task failed: {e}")))?
                .map_err(|e| AppError::internal(format!("Password verification error: {e}")))?;

        if !is_valid {
            return Err(AppError::auth_invalid(INVALID_CREDENTIALS));
        }

        Ok(user)
    }

    /// Create a new user account
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for malformed email or weak password,
    /// `DuplicateIdentity` when the username or email is already registered.
    pub async fn create(&self, username: &str, password: &str, email: &str) -> AppResult<User> {
        if username.trim().is_empty() {
            return Err(AppError::invalid_input("Username must not be empty"));
        }
        if !Self::is_valid_email(email) {
            return Err(AppError::invalid_input("Invalid email format"));
        }
        if !Self::is_valid_password(password) {
            return Err(AppError::invalid_input(
                "Password must be at least 8 characters",
            ));
        }

        if self
            .users
            .get_user_by_username(username)
            .await
            .map_err(|e| AppError::storage(e.to_string()))?
            .is_some()
        {
            return Err(AppError::duplicate_identity("Username already registered"));
        }
        if self
            .users
            .get_user_by_email(email)
            .await
            .map_err(|e| AppError::storage(e.to_string()))?
            .is_some()
        {
            return Err(AppError::duplicate_identity("Email already registered"));
        }

        let password = password.to_owned();
        let password_hash =
            tokio::task::spawn_blocking(move || bcrypt::hash(&password, bcrypt::DEFAULT_COST))
                .await
                .map_err(|e| AppError::internal(format!("Password hashing task failed: {e}")))?
                .map_err(|e| AppError::internal(format!("Password hashing error: {e}")))?;

        let user = User::new(username.to_owned(), email.to_owned(), password_hash);
        self.users
            .create_user(&user)
            .await
            .map_err(|e| AppError::storage(e.to_string()))?;

        tracing::info!("User registered: {} ({})", user.username, user.id);
        Ok(user)
    }

    /// Validate email format
    #[must_use]
    pub fn is_valid_email(email: &str) -> bool {
        if email.len() <= 5 {
            return false;
        }
        let Some(at_pos) = email.find('@') else {
            return false;
        };
        if at_pos == 0 || at_pos == email.len() - 1 {
            return false;
        }
        let domain_part = &email[at_pos + 1..];
        domain_part.contains('.')
    }

    /// Validate password strength
    #[must_use]
    pub const fn is_valid_password(password: &str) -> bool {
        password.len() >= 8
    }
}
