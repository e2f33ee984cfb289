// ABOUTME: Narrow persistence interface for user identities with an in-memory backend
// ABOUTME: Defines the UserStore trait consumed by the credential layer
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Sello Sign

//! # User Storage
//!
//! Persistence is an external collaborator. The auth core only needs three
//! operations on user records, so the interface is exactly that narrow:
//! lookup by username, lookup by email, and create. Deployments back this
//! trait with their actual record store; [`MemoryUserStore`] backs tests and
//! single-process setups.

use crate::models::User;
use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Narrow persistence interface for user identities
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Look up a user by username
    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>>;

    /// Look up a user by email
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Persist a new user record, returning its ID
    async fn create_user(&self, user: &User) -> Result<Uuid>;
}

/// In-memory `UserStore` backend
#[derive(Default)]
pub struct MemoryUserStore {
    users: RwLock<HashMap<Uuid, User>>,
}

impl MemoryUserStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.username == username).cloned())
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn create_user(&self, user: &User) -> Result<Uuid> {
        let mut users = self.users.write().await;
        users.insert(user.id, user.clone());
        Ok(user.id)
    }
}
