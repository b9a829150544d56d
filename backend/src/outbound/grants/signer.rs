//! Canonical request string and HMAC signature for upstream calls.
//!
//! The upstream authenticates each request from a canonical string
//! `METHOD \n PATH \n TIMESTAMP \n BODY` keyed with the shared secret.
//! The receiver recomputes the signature from the transmitted timestamp
//! and body, so the signed bytes must be exactly the bytes sent.

use hmac::{Hmac, Mac};
use sha2::Sha256;

pub(super) type HmacSha256 = Hmac<Sha256>;

/// Authorization scheme the upstream expects.
pub(super) const AUTH_SCHEME: &str = "ZEPHR-HMAC-SHA-256";

/// Header echoing the timestamp the signature was computed over.
pub(super) const TIMESTAMP_HEADER: &str = "X-Api-Timestamp";

/// Canonical byte string the signature is computed over.
pub(super) fn canonical_string(method: &str, path: &str, timestamp: &str, body: &[u8]) -> Vec<u8> {
    let mut canonical =
        Vec::with_capacity(method.len() + path.len() + timestamp.len() + body.len() + 3);
    canonical.extend_from_slice(method.as_bytes());
    canonical.push(b'\n');
    canonical.extend_from_slice(path.as_bytes());
    canonical.push(b'\n');
    canonical.extend_from_slice(timestamp.as_bytes());
    canonical.push(b'\n');
    canonical.extend_from_slice(body);
    canonical
}

/// Hex-encoded HMAC-SHA-256 signature over the canonical string.
///
/// The keyed state is cloned per call, so the secret is only handled at
/// construction time.
pub(super) fn sign(
    mac: &HmacSha256,
    method: &str,
    path: &str,
    timestamp: &str,
    body: &[u8],
) -> String {
    let mut mac = mac.clone();
    mac.update(&canonical_string(method, path, timestamp, body));
    hex::encode(mac.finalize().into_bytes())
}

/// `Authorization` header value: `<scheme> <keyId>:<signature>`.
pub(super) fn authorization_value(key_id: &str, signature: &str) -> String {
    format!("{AUTH_SCHEME} {key_id}:{signature}")
}
