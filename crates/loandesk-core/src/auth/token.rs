use base64::engine::general_purpose::{STANDARD_NO_PAD, URL_SAFE_NO_PAD};
use base64::Engine as _;
use chrono::{DateTime, TimeDelta, Utc};
use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TokenError {
    #[error("token must have three dot-separated segments, found {0}")]
    Malformed(usize),

    #[error("token payload is not valid base64: {0}")]
    Encoding(#[from] base64::DecodeError),

    #[error("token payload is not valid JSON: {0}")]
    Payload(#[from] serde_json::Error),
}

/// The claims this client reads out of the token payload.
/// Everything else in the payload is ignored.
#[derive(Debug, Deserialize)]
struct Claims {
    exp: i64,
    #[serde(default)]
    sub: Option<String>,
}

/// A signed access token issued by the backend at login.
///
/// The client never verifies the signature; it only reads the expiry
/// (and the bank id, for display) from the middle segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    encoded: String,
    expiry: i64,
    subject: Option<String>,
}

impl Credential {
    /// Decode a compact `header.payload.signature` token.
    pub fn parse(encoded: &str) -> Result<Self, TokenError> {
        let segments: Vec<&str> = encoded.split('.').collect();
        if segments.len() != 3 {
            return Err(TokenError::Malformed(segments.len()));
        }

        let payload = decode_segment(segments[1])?;
        let claims: Claims = serde_json::from_slice(&payload)?;

        Ok(Self {
            encoded: encoded.to_string(),
            expiry: claims.exp,
            subject: claims.sub,
        })
    }

    /// The token exactly as the backend issued it.
    pub fn encoded(&self) -> &str {
        &self.encoded
    }

    /// Expiry as a Unix timestamp in seconds.
    pub fn expiry(&self) -> i64 {
        self.expiry
    }

    /// The `sub` claim; the backend puts the bank id there.
    pub fn subject(&self) -> Option<&str> {
        self.subject.as_deref()
    }

    /// Valid iff the expiry, in milliseconds, is strictly after `now`.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.expiry.saturating_mul(1000) > now.timestamp_millis()
    }

    pub fn is_expired(&self) -> bool {
        !self.is_valid_at(Utc::now())
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.expiry, 0)
    }

    /// Saturates at `TimeDelta::MAX`/`MIN` for expiries chrono cannot represent.
    pub fn time_until_expiry(&self) -> TimeDelta {
        let remaining = self.expiry.saturating_sub(Utc::now().timestamp());
        TimeDelta::try_seconds(remaining).unwrap_or(if remaining > 0 {
            TimeDelta::MAX
        } else {
            TimeDelta::MIN
        })
    }

    /// Get minutes remaining until expiry (for display)
    pub fn minutes_until_expiry(&self) -> i64 {
        self.time_until_expiry().num_minutes().max(0)
    }
}

/// Tokens use unpadded base64url, but tolerate padding and the standard
/// alphabet as well.
fn decode_segment(segment: &str) -> Result<Vec<u8>, base64::DecodeError> {
    let trimmed = segment.trim_end_matches('=');
    URL_SAFE_NO_PAD
        .decode(trimmed)
        .or_else(|_| STANDARD_NO_PAD.decode(trimmed))
}

#[cfg(test)]
pub(crate) fn mint_token(exp: i64) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(format!(r#"{{"sub":"acme-bank","exp":{}}}"#, exp));
    format!("{}.{}.c2lnbmF0dXJl", header, payload)
}
