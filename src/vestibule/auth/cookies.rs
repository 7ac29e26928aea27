//! Cookie store adapter.
//!
//! Everything that reads or writes cookies goes through [`CookieStore`]. The
//! production implementation wraps an `axum-extra` [`CookieJar`]; writes only
//! reach the client when the handler returns the jar in its response.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde_json::Value;
use time::{Duration, OffsetDateTime};
use tracing::debug;

pub const FLASH_COOKIE_NAME: &str = "flash";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CookieAttributes {
    pub http_only: bool,
    pub secure: bool,
    pub same_site: SameSite,
    pub path: String,
    pub domain: Option<String>,
    pub max_age: Option<Duration>,
    pub expires: Option<OffsetDateTime>,
}

impl CookieAttributes {
    /// Site-wide defaults. The domain is only applied in production.
    #[must_use]
    pub fn defaults(production: bool, cookie_domain: Option<&str>) -> Self {
        Self {
            http_only: true,
            secure: production,
            same_site: SameSite::Lax,
            path: "/".to_string(),
            domain: cookie_domain
                .filter(|_| production)
                .map(str::trim)
                .filter(|domain| !domain.is_empty())
                .map(str::to_string),
            max_age: None,
            expires: None,
        }
        .normalized()
    }

    /// Caller overrides applied over `self`; a missing domain keeps the default.
    #[must_use]
    pub fn merge(&self, overrides: &CookieOverrides) -> Self {
        Self {
            http_only: overrides.http_only.unwrap_or(self.http_only),
            secure: overrides.secure.unwrap_or(self.secure),
            same_site: overrides.same_site.unwrap_or(self.same_site),
            path: overrides.path.clone().unwrap_or_else(|| self.path.clone()),
            domain: overrides.domain.clone().or_else(|| self.domain.clone()),
            max_age: overrides.max_age.or(self.max_age),
            expires: overrides.expires.or(self.expires),
        }
        .normalized()
    }

    // Browsers drop SameSite=None cookies that are not Secure.
    fn normalized(mut self) -> Self {
        if self.same_site == SameSite::None {
            self.secure = true;
        }
        self
    }

    fn build(&self, name: &str, value: &str) -> Cookie<'static> {
        let mut cookie = Cookie::build((name.to_string(), value.to_string()))
            .http_only(self.http_only)
            .secure(self.secure)
            .same_site(self.same_site)
            .path(self.path.clone())
            .build();

        if let Some(domain) = &self.domain {
            cookie.set_domain(domain.clone());
        }
        if let Some(max_age) = self.max_age {
            cookie.set_max_age(max_age);
        }
        if let Some(expires) = self.expires {
            cookie.set_expires(expires);
        }
        cookie
    }
}

/// Per-call attribute overrides. `None` keeps the default.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CookieOverrides {
    pub http_only: Option<bool>,
    pub secure: Option<bool>,
    pub same_site: Option<SameSite>,
    pub path: Option<String>,
    pub domain: Option<String>,
    pub max_age: Option<Duration>,
    pub expires: Option<OffsetDateTime>,
}

impl CookieOverrides {
    #[must_use]
    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = Some(max_age);
        self
    }

    #[must_use]
    pub fn with_same_site(mut self, same_site: SameSite) -> Self {
        self.same_site = Some(same_site);
        self
    }

    #[must_use]
    pub fn with_path(mut self, path: &str) -> Self {
        self.path = Some(path.to_string());
        self
    }
}

pub trait CookieStore: Send {
    fn get(&self, name: &str) -> Option<String>;

    fn set(&mut self, name: &str, value: &str, overrides: &CookieOverrides);

    /// Write a removal cookie using the merged path and domain.
    fn delete(&mut self, name: &str, overrides: &CookieOverrides);

    fn set_json(&mut self, name: &str, value: &Value, overrides: &CookieOverrides) {
        self.set(name, &value.to_string(), overrides);
    }

    /// Malformed JSON reads as `None`.
    fn get_json(&self, name: &str) -> Option<Value> {
        let raw = self.get(name)?;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(err) => {
                debug!("ignoring malformed JSON cookie {name}: {err}");
                None
            }
        }
    }

    fn set_flash(&mut self, message: &str) {
        self.set(FLASH_COOKIE_NAME, message, &CookieOverrides::default());
    }

    /// Read and clear the flash message.
    fn pop_flash(&mut self) -> Option<String> {
        let message = self.get(FLASH_COOKIE_NAME)?;
        self.delete(FLASH_COOKIE_NAME, &CookieOverrides::default());
        Some(message).filter(|message| !message.is_empty())
    }
}

/// [`CookieStore`] over the request's cookie jar.
#[derive(Debug)]
pub struct JarCookieStore {
    jar: CookieJar,
    defaults: CookieAttributes,
}

impl JarCookieStore {
    #[must_use]
    pub fn new(jar: CookieJar, defaults: CookieAttributes) -> Self {
        Self { jar, defaults }
    }

    /// The jar to return from the handler so pending writes reach the client.
    #[must_use]
    pub fn into_jar(self) -> CookieJar {
        self.jar
    }

    fn add(&mut self, cookie: Cookie<'static>) {
        let jar = std::mem::take(&mut self.jar);
        self.jar = jar.add(cookie);
    }
}

impl CookieStore for JarCookieStore {
    fn get(&self, name: &str) -> Option<String> {
        self.jar.get(name).map(|cookie| cookie.value().to_string())
    }

    fn set(&mut self, name: &str, value: &str, overrides: &CookieOverrides) {
        let cookie = self.defaults.merge(overrides).build(name, value);
        self.add(cookie);
    }

    fn delete(&mut self, name: &str, overrides: &CookieOverrides) {
        let mut attributes = self.defaults.merge(overrides);
        attributes.max_age = Some(Duration::ZERO);
        attributes.expires = Some(OffsetDateTime::UNIX_EPOCH);
        let cookie = attributes.build(name, "");
        self.add(cookie);
    }
}
