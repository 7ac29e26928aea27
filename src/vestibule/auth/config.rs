//! Session configuration, parsed once at startup.

use super::{cookies::CookieAttributes, gate::GateConfig, policy::AdminAllowlist};

pub const LOGIN_PATH: &str = "/login";
pub const DEFAULT_REDIRECT: &str = "/admin";
pub const API_PREFIX: &str = "/api/";
pub const DEFAULT_PROTECTED_PREFIXES: [&str; 2] = ["/admin", "/api/respond"];

const DEFAULT_SESSION_COOKIE_NAME: &str = "__session";
const DEFAULT_SESSION_MAX_AGE_SECONDS: u64 = 5 * 24 * 60 * 60;

/// Policy applied by a single login attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LoginOptions {
    pub max_age_seconds: u64,
    pub require_admin: bool,
    pub require_email_verified: bool,
}

impl Default for LoginOptions {
    fn default() -> Self {
        Self {
            max_age_seconds: DEFAULT_SESSION_MAX_AGE_SECONDS,
            require_admin: true,
            require_email_verified: true,
        }
    }
}

#[derive(Clone, Debug)]
pub struct AuthConfig {
    session_cookie_name: String,
    session_max_age_seconds: u64,
    admin_allowlist: AdminAllowlist,
    production: bool,
    cookie_domain: Option<String>,
    require_admin: bool,
    require_email_verified: bool,
    check_revoked: bool,
    protected_prefixes: Vec<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthConfig {
    #[must_use]
    pub fn new() -> Self {
        Self {
            session_cookie_name: DEFAULT_SESSION_COOKIE_NAME.to_string(),
            session_max_age_seconds: DEFAULT_SESSION_MAX_AGE_SECONDS,
            admin_allowlist: AdminAllowlist::default(),
            production: false,
            cookie_domain: None,
            require_admin: true,
            require_email_verified: true,
            check_revoked: true,
            protected_prefixes: normalize_prefixes(DEFAULT_PROTECTED_PREFIXES),
        }
    }

    #[must_use]
    pub fn with_session_cookie_name(mut self, name: String) -> Self {
        self.session_cookie_name = name;
        self
    }

    #[must_use]
    pub fn with_session_max_age_seconds(mut self, seconds: u64) -> Self {
        self.session_max_age_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_admin_emails(mut self, raw: &str) -> Self {
        self.admin_allowlist = AdminAllowlist::parse(raw);
        self
    }

    #[must_use]
    pub fn with_production(mut self, production: bool) -> Self {
        self.production = production;
        self
    }

    #[must_use]
    pub fn with_cookie_domain(mut self, domain: Option<String>) -> Self {
        self.cookie_domain = domain;
        self
    }

    #[must_use]
    pub fn with_require_admin(mut self, require_admin: bool) -> Self {
        self.require_admin = require_admin;
        self
    }

    #[must_use]
    pub fn with_require_email_verified(mut self, require_email_verified: bool) -> Self {
        self.require_email_verified = require_email_verified;
        self
    }

    #[must_use]
    pub fn with_check_revoked(mut self, check_revoked: bool) -> Self {
        self.check_revoked = check_revoked;
        self
    }

    /// Trailing slashes are stripped; empty entries and `/` are ignored.
    #[must_use]
    pub fn with_protected_prefixes<I, S>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.protected_prefixes = normalize_prefixes(prefixes);
        self
    }

    #[must_use]
    pub fn session_cookie_name(&self) -> &str {
        &self.session_cookie_name
    }

    #[must_use]
    pub fn session_max_age_seconds(&self) -> u64 {
        self.session_max_age_seconds
    }

    #[must_use]
    pub fn admin_allowlist(&self) -> &AdminAllowlist {
        &self.admin_allowlist
    }

    #[must_use]
    pub fn production(&self) -> bool {
        self.production
    }

    #[must_use]
    pub fn check_revoked(&self) -> bool {
        self.check_revoked
    }

    #[must_use]
    pub fn protected_prefixes(&self) -> &[String] {
        &self.protected_prefixes
    }

    #[must_use]
    pub fn login_options(&self) -> LoginOptions {
        LoginOptions {
            max_age_seconds: self.session_max_age_seconds,
            require_admin: self.require_admin,
            require_email_verified: self.require_email_verified,
        }
    }

    #[must_use]
    pub fn cookie_defaults(&self) -> CookieAttributes {
        CookieAttributes::defaults(self.production, self.cookie_domain.as_deref())
    }

    #[must_use]
    pub fn gate_config(&self) -> GateConfig {
        GateConfig::new(
            self.session_cookie_name.clone(),
            self.protected_prefixes.clone(),
        )
    }
}

fn normalize_prefixes<I, S>(prefixes: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    prefixes
        .into_iter()
        .map(|prefix| prefix.as_ref().trim().trim_end_matches('/').to_string())
        .filter(|prefix| prefix.starts_with('/'))
        .collect()
}
