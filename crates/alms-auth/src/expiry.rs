//! Best-effort JWT expiry pre-check.
//!
//! Decodes the `exp` claim without verifying the signature, so a token that
//! has plainly expired is dropped at startup without a network round-trip.
//! Opaque (non-JWT) tokens are never considered expired here; the backend
//! remains the authority.

use base64::Engine as _;
use chrono::{DateTime, Utc};

/// The `exp` claim of a JWT, if `token` is one and carries it.
#[must_use]
pub fn decode_expiry(token: &str) -> Option<DateTime<Utc>> {
    let mut parts = token.split('.');
    let (Some(_header), Some(payload), Some(_signature), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return None;
    };
    let bytes = base64::engine::general_purpose::URL_SAFE_NO_PAD
        .decode(payload)
        .ok()?;
    let claims: serde_json::Value = serde_json::from_slice(&bytes).ok()?;
    DateTime::from_timestamp(claims.get("exp")?.as_i64()?, 0)
}

/// Whether `token` is a JWT whose expiry is at or before `now`.
#[must_use]
pub fn is_expired(token: &str, now: DateTime<Utc>) -> bool {
    decode_expiry(token).is_some_and(|exp| exp <= now)
}
