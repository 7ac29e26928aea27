//! Admin privilege decision.
//!
//! Pure functions only: the inputs are already-verified claims and the
//! allowlist parsed at startup.

use serde_json::{Map, Value};
use std::collections::HashSet;

/// Emails granted admin access regardless of custom claims.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AdminAllowlist {
    emails: HashSet<String>,
}

impl AdminAllowlist {
    /// Parse a comma-separated list. Entries are trimmed and lower-cased;
    /// empty entries are dropped.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        Self {
            emails: raw
                .split(',')
                .map(normalize_email)
                .filter(|email| !email.is_empty())
                .collect(),
        }
    }

    #[must_use]
    pub fn contains(&self, email: &str) -> bool {
        self.emails.contains(&normalize_email(email))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.emails.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.emails.is_empty()
    }
}

#[must_use]
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// `(admin claim is true AND email verified) OR email is allowlisted`.
///
/// Only a JSON boolean `true` counts as the admin claim. Allowlisted emails do
/// not need to be verified.
#[must_use]
pub fn is_admin(
    claims: &Map<String, Value>,
    email: Option<&str>,
    email_verified: bool,
    allowlist: &AdminAllowlist,
) -> bool {
    let admin_claim = matches!(claims.get("admin"), Some(Value::Bool(true)));
    let allowlisted = email.is_some_and(|email| allowlist.contains(email));

    (admin_claim && email_verified) || allowlisted
}
