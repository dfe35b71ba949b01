//! Bearer token payload decoding.
//!
//! Only the middle (payload) segment of a token is interpreted on the client.
//! The signature is never checked here; the backend remains the authority on
//! whether a token is genuine. What the client needs is the expiry, so the
//! session gate can refuse stale tokens, and the roles, so login can pick a
//! landing page.

use std::collections::BTreeSet;

use base64::engine::general_purpose::{STANDARD_NO_PAD, URL_SAFE_NO_PAD};
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use thiserror::Error;

/// Role that routes a freshly logged-in user to the administrative landing page.
pub const ADMIN_ROLE: &str = "admin";

/// The single failure kind of the decoder. The reason is for logs only.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Malformed credential: {0}")]
pub struct MalformedCredential(pub String);

impl MalformedCredential {
    fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }
}

/// Normalized role claim. The wire format allows a bare string or a list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Roles(BTreeSet<String>);

impl Roles {
    pub fn contains(&self, role: &str) -> bool {
        self.0.contains(role)
    }

    pub fn is_admin(&self) -> bool {
        self.contains(ADMIN_ROLE)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for Roles {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// Claims extracted from a token payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenClaims {
    pub subject: Option<String>,
    pub expires_at: DateTime<Utc>,
    pub roles: Roles,
}

impl TokenClaims {
    /// A token is expired from the instant of its `exp` claim onward.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawRoles {
    One(String),
    Many(Vec<String>),
}

#[derive(Debug, Deserialize)]
struct RawClaims {
    sub: Option<String>,
    exp: Option<i64>,
    roles: Option<RawRoles>,
}

/// Decode the payload segment of `token` into [`TokenClaims`].
///
/// Either the whole payload is usable or the token is malformed; there is
/// no partial success. A payload without `exp` is malformed rather than
/// "never expires".
pub fn decode_claims(token: &str) -> Result<TokenClaims, MalformedCredential> {
    let token = token.trim();
    if token.is_empty() {
        return Err(MalformedCredential::new("empty token"));
    }

    let segments: Vec<&str> = token.split('.').collect();
    if segments.len() != 3 {
        return Err(MalformedCredential::new(format!(
            "expected 3 segments, found {}",
            segments.len()
        )));
    }

    let payload = decode_segment(segments[1])?;

    let raw: RawClaims = serde_json::from_slice(&payload)
        .map_err(|e| MalformedCredential::new(format!("payload is not a claims object: {}", e)))?;

    let exp = raw
        .exp
        .ok_or_else(|| MalformedCredential::new("missing exp claim"))?;
    let expires_at = DateTime::<Utc>::from_timestamp(exp, 0)
        .ok_or_else(|| MalformedCredential::new(format!("exp out of range: {}", exp)))?;

    let roles = match raw.roles {
        None => Roles::default(),
        Some(RawRoles::One(role)) => Roles::from_iter([role]),
        Some(RawRoles::Many(roles)) => Roles::from_iter(roles),
    };

    Ok(TokenClaims {
        subject: raw.sub,
        expires_at,
        roles,
    })
}

fn decode_segment(segment: &str) -> Result<Vec<u8>, MalformedCredential> {
    let segment = segment.trim_end_matches('=');
    if segment.is_empty() {
        return Err(MalformedCredential::new("empty payload segment"));
    }

    URL_SAFE_NO_PAD
        .decode(segment)
        .or_else(|_| STANDARD_NO_PAD.decode(segment))
        .map_err(|e| MalformedCredential::new(format!("payload is not base64: {}", e)))
}
