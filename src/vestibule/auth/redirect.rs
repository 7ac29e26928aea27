//! Redirect targets and open-redirect protection.

use super::config::{DEFAULT_REDIRECT, LOGIN_PATH};
use axum::{
    http::{header::LOCATION, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use url::{form_urlencoded, Url};

/// Why the user is being sent to the login page.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoginReason {
    Auth,
    Expired,
    Forbidden,
}

impl LoginReason {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Auth => "auth",
            Self::Expired => "expired",
            Self::Forbidden => "forbidden",
        }
    }

    #[must_use]
    pub fn parse(reason: &str) -> Option<Self> {
        match reason {
            "auth" => Some(Self::Auth),
            "expired" => Some(Self::Expired),
            "forbidden" => Some(Self::Forbidden),
            _ => None,
        }
    }

    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::Auth => "Please sign in to continue.",
            Self::Expired => "Your session expired. Please sign in again.",
            Self::Forbidden => "This account doesn't have admin access.",
        }
    }
}

/// Only same-origin relative paths are accepted: `/x` but never `//x` or
/// `https://x`. Backslashes, whitespace, and control characters are refused
/// since browsers drop or rewrite them while parsing `Location`.
#[must_use]
pub fn is_safe_next(next: &str) -> bool {
    next.starts_with('/')
        && !next.starts_with("//")
        && !next
            .chars()
            .any(|c| c == '\\' || c.is_control() || c.is_whitespace())
}

/// The post-login target, defaulting to the admin landing page.
#[must_use]
pub fn sanitize_next(next: Option<&str>) -> String {
    next.filter(|next| is_safe_next(next))
        .unwrap_or(DEFAULT_REDIRECT)
        .to_string()
}

/// First `next` parameter of a raw query string.
#[must_use]
pub fn next_from_query(query: Option<&str>) -> Option<String> {
    form_urlencoded::parse(query?.as_bytes())
        .find(|(key, _)| key == "next")
        .map(|(_, value)| value.into_owned())
}

/// `next` parameter of the page the request came from.
#[must_use]
pub fn next_from_referer(referer: &str) -> Option<String> {
    let url = Url::parse(referer).ok()?;
    url.query_pairs()
        .find(|(key, _)| key == "next")
        .map(|(_, value)| value.into_owned())
}

/// `/login?reason=<reason>&next=<path+query>`.
#[must_use]
pub fn login_location(reason: LoginReason, next: &str) -> String {
    let query = form_urlencoded::Serializer::new(String::new())
        .append_pair("reason", reason.as_str())
        .append_pair("next", next)
        .finish();
    format!("{LOGIN_PATH}?{query}")
}

/// Plain `302 Found`.
#[must_use]
pub fn found(location: &str) -> Response {
    match HeaderValue::from_str(location) {
        Ok(value) => (StatusCode::FOUND, [(LOCATION, value)]).into_response(),
        Err(_) => (
            StatusCode::FOUND,
            [(LOCATION, HeaderValue::from_static(DEFAULT_REDIRECT))],
        )
            .into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_next_accepts_relative_paths() {
        assert_eq!(sanitize_next(Some("/admin/posts?page=2")), "/admin/posts?page=2");
        assert_eq!(sanitize_next(Some("/")), "/");
    }

    #[test]
    fn sanitize_next_rejects_open_redirects() {
        for next in [
            "//evil.example",
            "https://evil.example",
            "evil.example",
            "/\\evil.example",
            "/\t/evil.example",
            "/\n/evil.example",
            "/\r//evil",
            "/ /evil.example",
            "",
        ] {
            assert_eq!(sanitize_next(Some(next)), "/admin", "{next:?} must be rejected");
        }
        assert_eq!(sanitize_next(None), "/admin");
    }

    #[test]
    fn login_location_encodes_next() {
        assert_eq!(
            login_location(LoginReason::Auth, "/admin/posts?page=2"),
            "/login?reason=auth&next=%2Fadmin%2Fposts%3Fpage%3D2"
        );
    }

    #[test]
    fn next_is_read_from_query_and_referer() {
        assert_eq!(
            next_from_query(Some("reason=auth&next=%2Fadmin%2Fposts")).as_deref(),
            Some("/admin/posts")
        );
        assert_eq!(next_from_query(Some("reason=auth")), None);
        assert_eq!(next_from_query(None), None);

        assert_eq!(
            next_from_referer("https://site.example/login?reason=auth&next=%2Fadmin%2Fedit")
                .as_deref(),
            Some("/admin/edit")
        );
        assert_eq!(next_from_referer("not a url"), None);
    }

    #[test]
    fn reasons_round_trip() {
        for reason in [LoginReason::Auth, LoginReason::Expired, LoginReason::Forbidden] {
            assert_eq!(LoginReason::parse(reason.as_str()), Some(reason));
        }
        assert_eq!(LoginReason::parse("other"), None);
    }

    #[test]
    fn found_sets_location() {
        let response = found("/admin");
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(
            response.headers().get(LOCATION).and_then(|v| v.to_str().ok()),
            Some("/admin")
        );
    }
}
