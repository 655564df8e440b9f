//! Short fingerprint of the session key for startup logs.
//!
//! Operators compare fingerprints across replicas to confirm they share a key
//! without the key itself ever reaching the logs.

use actix_web::cookie::Key;
use sha2::{Digest, Sha256};

/// Bytes of the SHA-256 digest kept before hex encoding.
const FINGERPRINT_BYTES: usize = 8;

/// Hex of the first eight bytes of SHA-256 over the key's signing half.
///
/// # Examples
///
/// ```rust
/// use actix_web::cookie::Key;
/// use blog::inbound::http::session_config::fingerprint::key_fingerprint;
///
/// let fp = key_fingerprint(&Key::generate());
/// assert_eq!(fp.len(), 16);
/// ```
#[must_use]
pub fn key_fingerprint(key: &Key) -> String {
    let digest = Sha256::digest(key.signing());
    hex::encode(&digest[..FINGERPRINT_BYTES])
}
