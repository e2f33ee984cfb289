// ABOUTME: Shared utility modules for the auth core
// ABOUTME: Houses the HTTP client factory with mandatory timeouts
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Sello Sign

//! Shared utilities

pub mod http_client;
