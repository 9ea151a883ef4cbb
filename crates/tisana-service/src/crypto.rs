//! Cryptographic utilities for webhook verification.
//!
//! The commerce storefront signs order webhooks with HMAC-SHA256 over the raw
//! request body; this module provides the shared primitives for checking
//! those signatures.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Compute HMAC-SHA256 and return the hex-encoded result (64 characters).
///
/// # Panics
///
/// Never panics in practice: HMAC-SHA256 accepts keys of any size per
/// RFC 2104, so `new_from_slice` only fails if the implementation is broken.
#[must_use]
pub fn hmac_sha256_hex(secret: &str, message: &str) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC-SHA256 accepts any key size");
    mac.update(message.as_bytes());
    let result = mac.finalize();

    hex::encode(result.into_bytes())
}

/// Constant-time string comparison for signature checks.
#[must_use]
pub fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }
    result == 0
}

/// Verify an order webhook signature against the raw body.
///
/// # Errors
///
/// Returns a message describing the mismatch when verification fails.
pub fn verify_order_signature(
    body: &str,
    signature: &str,
    secret: &str,
) -> Result<(), &'static str> {
    let expected = hmac_sha256_hex(secret, body);
    if constant_time_eq(&expected, signature) {
        Ok(())
    } else {
        Err("signature mismatch")
    }
}
