//! Client-side bearer token decoding
//!
//! The backend issues HS256 JWTs carrying `id`, `role` and `exp` claims.
//! The client cannot verify the signature (it does not hold the secret), so
//! [`decode_claims`] only base64url-decodes the payload segment.
//!
//! # Trust boundary
//!
//! [`TokenClaims`] is unverified data. It may drive presentation (showing
//! the role, skipping a request with an obviously expired token) but never
//! authorization. The backend re-validates every request.

use std::collections::BTreeMap;

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

use crate::error::{QuerydeskError, Result};

/// base64url, accepting both padded and unpadded input.
const PAYLOAD_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Decoded, unverified JWT payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Backend user id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,

    /// Standard subject claim, used when `id` is absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,

    /// Role the token was issued for
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,

    /// Expiry, seconds since the Unix epoch. Fractional values are floored.
    #[serde(
        default,
        deserialize_with = "numeric_date",
        skip_serializing_if = "Option::is_none"
    )]
    pub exp: Option<i64>,

    /// Every other claim, kept as sent
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl TokenClaims {
    /// Role claim, if present.
    pub fn role(&self) -> Option<&str> {
        self.role.as_deref()
    }

    /// User identifier: the `id` claim rendered as text, else `sub`.
    pub fn user_id(&self) -> Option<String> {
        match &self.id {
            Some(Value::String(s)) => Some(s.clone()),
            Some(Value::Null) | None => self.sub.clone(),
            Some(other) => Some(other.to_string()),
        }
    }

    /// Expiry as a timestamp.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.exp.and_then(|exp| DateTime::from_timestamp(exp, 0))
    }

    /// Returns `true` when `exp` is present and `now` is at or past it.
    ///
    /// A token without `exp` never expires client-side.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        match self.exp {
            Some(exp) => now.timestamp() >= exp,
            None => false,
        }
    }

    /// [`Self::is_expired_at`] against the current time.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

/// NumericDate: integer or fractional seconds.
fn numeric_date<'de, D>(deserializer: D) -> std::result::Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(number) = Option::<Number>::deserialize(deserializer)? else {
        return Ok(None);
    };
    number
        .as_i64()
        .or_else(|| number.as_f64().map(|secs| secs.floor() as i64))
        .map(Some)
        .ok_or_else(|| de::Error::custom(format!("exp is not a NumericDate: {}", number)))
}

/// Decode the payload segment of a JWT without verifying it.
///
/// # Errors
///
/// Returns [`QuerydeskError::InvalidToken`] when the token does not have
/// three dot-separated segments, the payload is not base64url, or the
/// payload is not a JSON object.
///
/// # Examples
///
/// ```
/// use querydesk::auth::jwt::decode_claims;
///
/// // {"id":7,"role":"hr","exp":4102444800}
/// let token = "eyJhbGciOiJIUzI1NiJ9.eyJpZCI6Nywicm9sZSI6ImhyIiwiZXhwIjo0MTAyNDQ0ODAwfQ.sig";
/// let claims = decode_claims(token).unwrap();
/// assert_eq!(claims.role(), Some("hr"));
/// assert_eq!(claims.user_id().as_deref(), Some("7"));
/// ```
pub fn decode_claims(token: &str) -> Result<TokenClaims> {
    let segments: Vec<&str> = token.trim().split('.').collect();
    if segments.len() != 3 {
        return Err(QuerydeskError::InvalidToken(format!(
            "expected 3 segments, found {}",
            segments.len()
        ))
        .into());
    }

    let payload = PAYLOAD_ENGINE
        .decode(segments[1])
        .map_err(|e| QuerydeskError::InvalidToken(format!("payload is not base64url: {}", e)))?;

    serde_json::from_slice::<TokenClaims>(&payload).map_err(|e| {
        QuerydeskError::InvalidToken(format!("payload is not a claims object: {}", e)).into()
    })
}

/// Short, log-safe prefix of a token.
pub fn redact(token: &str) -> String {
    let prefix: String = token.chars().take(10).collect();
    format!("{}...", prefix)
}
