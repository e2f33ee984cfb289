// ABOUTME: Core data models for the auth core - user identities and token kinds
// ABOUTME: Defines the User record and the session token classification
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Sello Sign

//! # Data Models
//!
//! Core data structures shared across the auth core. The [`User`] record is
//! owned by the persistence collaborator and only reached through the
//! [`crate::storage::UserStore`] interface; this module just defines its shape.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A registered user identity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique user ID
    pub id: Uuid,
    /// Unique username used for login
    pub username: String,
    /// Unique email address
    pub email: String,
    /// Bcrypt hash of the user's password; the plaintext is never stored
    pub password_hash: String,
    /// Account creation timestamp
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Create a new user with a fresh ID
    #[must_use]
    pub fn new(username: String, email: String, password_hash: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            username,
            email,
            password_hash,
            created_at: Utc::now(),
        }
    }
}

/// Kind of session token, carried in the token claims
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    /// Short-lived token presented on protected requests
    Access,
    /// Long-lived token exchanged for a fresh pair
    Refresh,
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Access => write!(f, "access"),
            Self::Refresh => write!(f, "refresh"),
        }
    }
}
