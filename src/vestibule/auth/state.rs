use super::{config::AuthConfig, cookies::JarCookieStore};
use crate::identity::IdentityAuthority;
use axum_extra::extract::cookie::CookieJar;
use std::sync::Arc;

/// Immutable state shared by every request.
pub struct AuthState {
    config: AuthConfig,
    authority: Arc<dyn IdentityAuthority>,
    authority_origin: Option<String>,
}

impl AuthState {
    #[must_use]
    pub fn new(config: AuthConfig, authority: Arc<dyn IdentityAuthority>) -> Self {
        Self {
            config,
            authority,
            authority_origin: None,
        }
    }

    /// Origin of the identity authority, reported by `/health`.
    #[must_use]
    pub fn with_authority_origin(mut self, origin: String) -> Self {
        self.authority_origin = Some(origin);
        self
    }

    #[must_use]
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    #[must_use]
    pub fn authority(&self) -> &dyn IdentityAuthority {
        self.authority.as_ref()
    }

    #[must_use]
    pub fn authority_origin(&self) -> Option<&str> {
        self.authority_origin.as_deref()
    }

    /// Cookie store over `jar` with this deployment's cookie defaults.
    #[must_use]
    pub fn cookie_store(&self, jar: CookieJar) -> JarCookieStore {
        JarCookieStore::new(jar, self.config.cookie_defaults())
    }
}

impl std::fmt::Debug for AuthState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthState")
            .field("config", &self.config)
            .field("authority_origin", &self.authority_origin)
            .finish_non_exhaustive()
    }
}
