//! Reserved vs. custom claim separation for verified identity tokens.
//!
//! The identity authority returns every claim of a verified token in one JSON
//! object. Fields it owns (subject, email, timestamps, provider metadata) are
//! listed in [`RESERVED_CLAIMS`]; everything else is an operator-assigned
//! custom claim such as `admin: true`.
//!
//! The reserved list mirrors the authority's token shape. Review it, and bump
//! [`RESERVED_CLAIMS_VERSION`], whenever the authority SDK or token format
//! changes.

use serde_json::{Map, Value};
use thiserror::Error;

/// Revision of [`RESERVED_CLAIMS`].
pub const RESERVED_CLAIMS_VERSION: u32 = 1;

/// Claim names owned by the identity authority. Never exposed as custom claims.
pub const RESERVED_CLAIMS: [&str; 14] = [
    "aud",
    "auth_time",
    "email",
    "email_verified",
    "exp",
    "firebase",
    "iat",
    "iss",
    "sub",
    "uid",
    "phone_number",
    "name",
    "picture",
    "provider_id",
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClaimsError {
    #[error("verified token has no subject")]
    MissingSubject,
}

/// Identity projection of a token the authority has verified.
#[derive(Debug, Clone, PartialEq)]
pub struct VerifiedToken {
    pub uid: String,
    pub email: Option<String>,
    pub email_verified: bool,
    pub custom_claims: Map<String, Value>,
}

impl VerifiedToken {
    /// Split a verified claim set into identity fields and custom claims.
    ///
    /// # Errors
    /// Returns [`ClaimsError::MissingSubject`] if neither `uid` nor `sub` holds a
    /// non-empty string.
    pub fn from_claims(claims: &Map<String, Value>) -> Result<Self, ClaimsError> {
        let uid = ["uid", "sub"]
            .iter()
            .find_map(|key| non_empty_str(claims.get(*key)))
            .ok_or(ClaimsError::MissingSubject)?;

        Ok(Self {
            uid,
            email: non_empty_str(claims.get("email")),
            email_verified: claims
                .get("email_verified")
                .and_then(Value::as_bool)
                .unwrap_or(false),
            custom_claims: custom_claims(claims),
        })
    }
}

/// Everything in `claims` that is not a reserved claim.
#[must_use]
pub fn custom_claims(claims: &Map<String, Value>) -> Map<String, Value> {
    claims
        .iter()
        .filter(|(key, _)| !is_reserved(key))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

#[must_use]
pub fn is_reserved(claim: &str) -> bool {
    RESERVED_CLAIMS.contains(&claim)
}

fn non_empty_str(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
