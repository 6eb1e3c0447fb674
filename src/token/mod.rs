//! Bearer token inspection
//!
//! Pulls the application's bearer token out of a session snapshot and decides
//! whether it is still fresh. This is a client-side freshness check only: the
//! signature is never verified.
//!
//! Every way decoding can go wrong collapses to "expired". A false "expired"
//! costs one extra interactive login; a false "valid" hands a broken session
//! to a test. Failures are still logged so flaky suites can be diagnosed.

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;
use chrono::Utc;
use serde::Deserialize;
use std::fmt;
use thiserror::Error;

use crate::models::constants::{BEARER_PREFIX, TOKEN_ENTRY_NAME};
use crate::models::SessionSnapshot;

/// base64url that tolerates both padded and unpadded segments.
const JWT_SEGMENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Raw JWT with the `Bearer ` prefix already removed.
#[derive(Clone, PartialEq, Eq)]
pub struct BearerToken(String);

impl BearerToken {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Tokens end up in logs through Debug; keep them out.
impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BearerToken({} bytes)", self.0.len())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct TokenClaims {
    /// Expiry in seconds since the Unix epoch.
    #[serde(default)]
    pub exp: Option<f64>,
}

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("token has no payload segment")]
    MissingPayload,
    #[error("payload is not base64url: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("payload is not JSON claims: {0}")]
    Json(#[from] serde_json::Error),
}

/// Outcome of inspecting a token, kept distinct for diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenStatus {
    Valid { exp: f64 },
    Expired { exp: f64 },
    MissingExpiry,
    Undecodable { reason: String },
}

impl TokenStatus {
    pub fn is_expired(&self) -> bool {
        !matches!(self, TokenStatus::Valid { .. })
    }
}

/// Find the bearer token on the snapshot's first origin.
///
/// Returns `None` when the snapshot has no origins or the first origin has no
/// `token` entry.
pub fn extract_token(snapshot: &SessionSnapshot) -> Option<BearerToken> {
    let value = snapshot.local_storage_value(TOKEN_ENTRY_NAME)?;
    let raw = value.strip_prefix(BEARER_PREFIX).unwrap_or(value);
    Some(BearerToken::new(raw))
}

/// Decode the payload segment without checking the signature.
///
/// `Ok(None)` means the payload decoded to JSON `null`.
pub fn decode_claims(token: &BearerToken) -> Result<Option<TokenClaims>, DecodeError> {
    let payload = token
        .as_str()
        .split('.')
        .nth(1)
        .ok_or(DecodeError::MissingPayload)?;
    let bytes = JWT_SEGMENT.decode(payload)?;
    Ok(serde_json::from_slice(&bytes)?)
}

pub fn inspect(token: &BearerToken, now_secs: i64) -> TokenStatus {
    let claims = match decode_claims(token) {
        Ok(Some(claims)) => claims,
        Ok(None) => {
            tracing::warn!("bearer token payload is null; treating session as expired");
            return TokenStatus::Undecodable {
                reason: "claims are null".to_string(),
            };
        }
        Err(err) => {
            tracing::warn!(
                error = %err,
                "bearer token could not be decoded; treating session as expired"
            );
            return TokenStatus::Undecodable {
                reason: err.to_string(),
            };
        }
    };

    match claims.exp {
        None => {
            tracing::warn!("bearer token has no exp claim; treating session as expired");
            TokenStatus::MissingExpiry
        }
        Some(exp) if exp < now_secs as f64 => TokenStatus::Expired { exp },
        Some(exp) => TokenStatus::Valid { exp },
    }
}

/// Whether the token must be considered expired at `now_secs`.
pub fn is_expired_at(token: &BearerToken, now_secs: i64) -> bool {
    inspect(token, now_secs).is_expired()
}

/// Whether the token must be considered expired right now. Never fails.
pub fn is_expired(token: &BearerToken) -> bool {
    is_expired_at(token, Utc::now().timestamp())
}
