//! Bearer token inspection
//!
//! Reads the claims of a three-part token without verifying its signature.
//! The server is the authority on validity; this only decides whether a token
//! is worth sending or should be refreshed first.

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine;
use chrono::Utc;
use serde::Deserialize;

/// Seconds of headroom so a token does not expire while a request is in flight.
pub const DEFAULT_EXPIRY_SKEW_SECS: i64 = 30;

const PAYLOAD_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Claims {
    /// Expiry, seconds since the epoch
    #[serde(default)]
    pub exp: Option<f64>,
    #[serde(default)]
    pub iat: Option<f64>,
    #[serde(default)]
    pub sub: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub aud: Option<serde_json::Value>,
}

/// Decode the payload segment. `None` for anything that is not a
/// three-segment token with a JSON object payload.
pub fn decode(token: &str) -> Option<Claims> {
    let mut segments = token.split('.');
    let (Some(_header), Some(payload), Some(_signature), None) = (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) else {
        return None;
    };

    // Accept the standard alphabet too
    let payload = payload.replace('+', "-").replace('/', "_");
    let bytes = PAYLOAD_ENGINE.decode(payload).ok()?;
    let value: serde_json::Value = serde_json::from_slice(&bytes).ok()?;
    if !value.is_object() {
        return None;
    }
    serde_json::from_value(value).ok()
}

/// Claims without an `exp` are not provably expired.
pub fn claims_expired(claims: &Claims, now: i64, skew_secs: i64) -> bool {
    match claims.exp {
        Some(exp) => (now + skew_secs) as f64 >= exp,
        None => false,
    }
}

/// Undecodable tokens count as expired so callers refresh instead of failing.
pub fn is_expired(token: &str, skew_secs: i64) -> bool {
    is_expired_at(token, Utc::now().timestamp(), skew_secs)
}

pub fn is_expired_at(token: &str, now: i64, skew_secs: i64) -> bool {
    match decode(token) {
        Some(claims) => claims_expired(&claims, now, skew_secs),
        None => true,
    }
}
