use super::policy::{is_admin, AdminAllowlist};
use crate::identity::VerifiedToken;
use serde::Serialize;
use serde_json::{Map, Value};
use utoipa::ToSchema;

/// Identity of a verified session, rebuilt on every verification.
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    pub uid: String,
    pub email: Option<String>,
    pub email_verified: bool,
    pub is_admin: bool,
    /// Custom claims only; reserved claims are never included.
    #[schema(value_type = Object)]
    pub claims: Map<String, Value>,
}

impl SessionUser {
    #[must_use]
    pub fn from_verified(token: VerifiedToken, allowlist: &AdminAllowlist) -> Self {
        let is_admin = is_admin(
            &token.custom_claims,
            token.email.as_deref(),
            token.email_verified,
            allowlist,
        );

        Self {
            uid: token.uid,
            email: token.email,
            email_verified: token.email_verified,
            is_admin,
            claims: token.custom_claims,
        }
    }
}
