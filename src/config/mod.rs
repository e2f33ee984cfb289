// ABOUTME: Configuration module organizing environment-driven server settings
// ABOUTME: Re-exports the validated ServerConfig built once at startup
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Sello Sign

//! Configuration management for the Sello auth core

pub mod environment;

pub use environment::ServerConfig;
