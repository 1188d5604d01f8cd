//! # Gateway notification signatures
//!
//! The payment gateway signs every notification it sends. The signature is the HMAC-SHA512 of the *raw* request body,
//! keyed with the merchant's secret key, and sent hex-encoded in the `x-paystack-signature` header.
//!
//! Verification must run on the exact bytes received, before any JSON parsing takes place.
use hmac::{Hmac, Mac};
use sha2::Sha512;

type HmacSha512 = Hmac<Sha512>;

/// Calculates the hex-encoded HMAC-SHA512 signature of `body`.
pub fn calculate_webhook_signature(secret: &str, body: &[u8]) -> String {
    let mut mac = hmac_for(secret);
    mac.update(body);
    hex::encode(mac.finalize().into_bytes())
}

/// Checks `signature` against the HMAC-SHA512 of `body`. The comparison of the digests runs in constant time.
///
/// Signatures that are not valid hex, or have the wrong length, are rejected.
pub fn verify_webhook_signature(secret: &str, body: &[u8], signature: &str) -> bool {
    let Ok(expected) = hex::decode(signature.trim()) else {
        return false;
    };
    let mut mac = hmac_for(secret);
    mac.update(body);
    mac.verify_slice(&expected).is_ok()
}

fn hmac_for(secret: &str) -> HmacSha512 {
    // HMAC accepts keys of any length, so this cannot fail
    match HmacSha512::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => unreachable!("HMAC can take a key of any size"),
    }
}
