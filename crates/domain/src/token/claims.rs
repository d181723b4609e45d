//! Expiry claim decoding.
//!
//! Tokens are three dot-delimited segments whose middle segment is
//! base64url-encoded JSON. Decoding never fails: anything that cannot be
//! read yields `None`, and callers treat an unknown expiry as valid.

use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

/// Base64url decoder that accepts padded and unpadded input.
const CLAIMS_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

/// Decodes the claims object carried in the token's middle segment.
fn decode_claims(raw: &str) -> Option<Map<String, Value>> {
    let mut segments = raw.split('.');
    let (_header, payload, _signature) = (segments.next()?, segments.next()?, segments.next()?);
    if segments.next().is_some() || payload.is_empty() {
        return None;
    }

    // Some issuers emit the standard alphabet; fold it onto the url-safe one.
    let normalized: String = payload
        .chars()
        .map(|c| match c {
            '+' => '-',
            '/' => '_',
            other => other,
        })
        .collect();

    let bytes = CLAIMS_ENGINE.decode(normalized).ok()?;
    match serde_json::from_slice(&bytes).ok()? {
        Value::Object(map) => Some(map),
        _ => None,
    }
}

/// Reads `exp` as seconds since the epoch. Numeric strings are accepted;
/// zero counts as missing.
fn exp_seconds(claims: &Map<String, Value>) -> Option<f64> {
    let secs = match claims.get("exp")? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    (secs.is_finite() && secs != 0.0).then_some(secs)
}

/// Decodes the expiry instant embedded in `raw`.
///
/// Returns `None` for malformed tokens, undecodable payloads and missing or
/// non-numeric `exp` claims.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn decode_expiry(raw: &str) -> Option<DateTime<Utc>> {
    let secs = exp_seconds(&decode_claims(raw)?)?;
    DateTime::from_timestamp_millis((secs * 1000.0).round() as i64)
}

/// Decodes the `sub` claim (the identity the token was issued to).
#[must_use]
pub fn decode_subject(raw: &str) -> Option<String> {
    match decode_claims(raw)?.remove("sub")? {
        Value::String(s) if !s.is_empty() => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Evaluates an expiry against `now` plus a safety skew.
///
/// An unknown expiry is never expired. Otherwise the token is expired iff
/// `now + skew >= expiry`, compared at millisecond precision.
#[must_use]
pub fn is_expired_at(
    expires_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    skew_seconds: i64,
) -> bool {
    expires_at.is_some_and(|exp| {
        now.timestamp_millis()
            .saturating_add(skew_seconds.saturating_mul(1000))
            >= exp.timestamp_millis()
    })
}
