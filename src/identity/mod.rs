//! External identity authority.
//!
//! The authority verifies identity tokens, mints session credentials from them,
//! verifies those credentials, and revokes a user's outstanding tokens. It is
//! treated as a trusted oracle: this crate never decodes tokens or credentials
//! itself.

pub mod claims;
mod http;

use async_trait::async_trait;
use thiserror::Error;

pub use claims::{RESERVED_CLAIMS, RESERVED_CLAIMS_VERSION, VerifiedToken};
pub use http::{AuthorityConfig, HttpIdentityAuthority};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthorityError {
    /// The authority answered and refused the token or credential.
    #[error("rejected by identity authority (status {0})")]
    Rejected(u16),
    /// Transport failure, timeout, or server-side error.
    #[error("identity authority unavailable: {0}")]
    Unavailable(String),
    #[error("invalid identity authority response: {0}")]
    InvalidResponse(String),
}

/// Operations the session layer needs from the identity authority.
///
/// Every error is a verification failure for callers; nothing here is retried.
#[async_trait]
pub trait IdentityAuthority: Send + Sync {
    /// Verify a client-presented identity token.
    async fn verify_id_token(
        &self,
        id_token: &str,
        check_revoked: bool,
    ) -> Result<VerifiedToken, AuthorityError>;

    /// Mint a session credential from an identity token.
    async fn create_session_credential(
        &self,
        id_token: &str,
        max_age_seconds: u64,
    ) -> Result<String, AuthorityError>;

    /// Verify a session credential previously minted by the authority.
    async fn verify_session_credential(
        &self,
        credential: &str,
        check_revoked: bool,
    ) -> Result<VerifiedToken, AuthorityError>;

    /// Revoke every refresh token and session credential issued to `uid`.
    async fn revoke_refresh_tokens(&self, uid: &str) -> Result<(), AuthorityError>;
}
