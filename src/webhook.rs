// ABOUTME: Webhook authenticity verification via constant-time HMAC comparison
// ABOUTME: Validates provider signatures before any payload processing happens
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Sello Sign

//! # Webhook Signature Validation
//!
//! Inbound provider webhooks carry an HMAC-SHA256 signature over the raw
//! request body, base64 encoded. When the provider includes a timestamp
//! header the signed message is `timestamp \n body \n` instead. Validation
//! runs before any deserialization or side effect: an invalid or absent
//! signature aborts processing with no state change. The comparison is
//! constant-time to avoid timing side-channels.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use ring::hmac;

/// Webhook signature validation result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureValidation {
    /// Signature is valid
    Valid,
    /// Signature does not match the payload
    Invalid,
    /// Signature header is absent
    Missing,
}

impl SignatureValidation {
    /// Whether processing may continue
    #[must_use]
    pub const fn is_valid(self) -> bool {
        matches!(self, Self::Valid)
    }
}

/// Validates provider webhook signatures against the shared HMAC key
pub struct WebhookSignatureValidator {
    signing_key: String,
}

impl WebhookSignatureValidator {
    /// Create a validator for the given shared key
    #[must_use]
    pub const fn new(signing_key: String) -> Self {
        Self { signing_key }
    }

    /// Validate a webhook request signature
    ///
    /// `signature_header` is the base64 HMAC from the provider;
    /// `timestamp_header` switches the signed message to the timestamped
    /// construction when present.
    #[must_use]
    pub fn validate(
        &self,
        signature_header: Option<&str>,
        timestamp_header: Option<&str>,
        body: &[u8],
    ) -> SignatureValidation {
        let Some(signature) = signature_header else {
            tracing::warn!("Webhook rejected: signature header absent");
            return SignatureValidation::Missing;
        };

        let expected = self.compute_signature(timestamp_header, body);

        // Constant-time comparison to prevent timing attacks
        if subtle::ConstantTimeEq::ct_eq(signature.as_bytes(), expected.as_bytes()).into() {
            SignatureValidation::Valid
        } else {
            tracing::warn!("Webhook rejected: signature mismatch");
            SignatureValidation::Invalid
        }
    }

    /// Compute the base64 HMAC-SHA256 signature the provider would send
    #[must_use]
    pub fn compute_signature(&self, timestamp: Option<&str>, body: &[u8]) -> String {
        let key = hmac::Key::new(hmac::HMAC_SHA256, self.signing_key.as_bytes());
        let tag = match timestamp {
            Some(ts) => {
                let mut message = Vec::with_capacity(ts.len() + body.len() + 2);
                message.extend_from_slice(ts.as_bytes());
                message.push(b'\n');
                message.extend_from_slice(body);
                message.push(b'\n');
                hmac::sign(&key, &message)
            }
            None => hmac::sign(&key, body),
        };
        STANDARD.encode(tag.as_ref())
    }
}
