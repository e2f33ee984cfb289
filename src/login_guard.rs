// ABOUTME: Failed-login tracking with temporary per-identity lockout
// ABOUTME: Counts consecutive failures and rejects attempts while an account is locked
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Sello Sign

//! # Login Attempt Guard
//!
//! Tracks consecutive failed login attempts per username and locks the
//! account after a threshold. The lockout window is anchored to the last
//! failure recorded before the lock; attempts made while locked are rejected
//! without being recorded, so they do not extend the ban. A lockout is
//! reported as `AccountLocked` with no hint of which attempt triggered it.
//!
//! Records live in a shared concurrent map and are swept lazily: an expired
//! record is removed the next time its username is checked.

use crate::errors::{AppError, AppResult};
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;

/// Failed attempts allowed before the account locks
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Seconds an account stays locked, measured from the last recorded failure
pub const DEFAULT_LOCKOUT_WINDOW_SECS: i64 = 300;

/// Per-identity failure record
#[derive(Debug, Clone, Copy)]
struct FailedAttempts {
    count: u32,
    last_attempt: DateTime<Utc>,
}

/// Guard enforcing temporary lockout after repeated failed logins
pub struct LoginAttemptGuard {
    attempts: DashMap<String, FailedAttempts>,
    max_attempts: u32,
    lockout_window: Duration,
}

impl LoginAttemptGuard {
    /// Create a guard with the given threshold and window
    #[must_use]
    pub fn new(max_attempts: u32, lockout_window_secs: i64) -> Self {
        Self {
            attempts: DashMap::new(),
            max_attempts,
            lockout_window: Duration::seconds(lockout_window_secs),
        }
    }

    /// Check whether a login attempt for this username may proceed
    ///
    /// # Errors
    ///
    /// Returns `AccountLocked` while the account is inside its lockout window.
    pub fn check(&self, username: &str) -> AppResult<()> {
        let now = Utc::now();

        match self.attempts.get(username) {
            // Window elapsed, the slate is clean again
            Some(record) if now - record.last_attempt >= self.lockout_window => {
                drop(record);
                self.attempts.remove(username);
                Ok(())
            }
            Some(record) if record.count >= self.max_attempts => {
                tracing::warn!("Login rejected, account locked: {username}");
                Err(AppError::account_locked())
            }
            _ => Ok(()),
        }
    }

    /// Record a failed login attempt for this username
    pub fn record_failure(&self, username: &str) {
        let now = Utc::now();
        let mut entry = self
            .attempts
            .entry(username.to_owned())
            .or_insert(FailedAttempts {
                count: 0,
                last_attempt: now,
            });

        // Attempts during an active lockout are not counted, keeping the
        // window anchored to the failure that triggered the lock
        if entry.count >= self.max_attempts && now - entry.last_attempt < self.lockout_window {
            return;
        }
        if now - entry.last_attempt >= self.lockout_window {
            entry.count = 0;
        }

        entry.count += 1;
        entry.last_attempt = now;
        if entry.count >= self.max_attempts {
            tracing::warn!(
                "Account locked after {} failed attempts: {username}",
                entry.count
            );
        }
    }

    /// Clear the failure record after a successful login
    pub fn record_success(&self, username: &str) {
        self.attempts.remove(username);
    }

    /// Number of failures currently recorded for a username
    #[must_use]
    pub fn failure_count(&self, username: &str) -> u32 {
        self.attempts.get(username).map_or(0, |r| r.count)
    }
}

impl Default for LoginAttemptGuard {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS, DEFAULT_LOCKOUT_WINDOW_SECS)
    }
}
