//! Edge request gate.
//!
//! Runs before every route and only looks at whether a session cookie is
//! present. It never talks to the identity authority: a forged or expired
//! cookie passes here and is rejected by the route guards.

use super::{
    config::{API_PREFIX, LOGIN_PATH},
    redirect::{found, login_location, next_from_query, sanitize_next, LoginReason},
};
use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;
use std::sync::Arc;
use tracing::debug;

#[derive(Clone, Debug)]
pub struct GateConfig {
    session_cookie_name: String,
    protected_prefixes: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GateDecision {
    Pass,
    Redirect(String),
    Unauthorized,
}

impl GateConfig {
    #[must_use]
    pub fn new(session_cookie_name: String, protected_prefixes: Vec<String>) -> Self {
        Self {
            session_cookie_name,
            protected_prefixes,
        }
    }

    #[must_use]
    pub fn is_protected(&self, path: &str) -> bool {
        self.protected_prefixes
            .iter()
            .any(|prefix| under_prefix(path, prefix))
    }

    #[must_use]
    pub fn decide(&self, path: &str, query: Option<&str>, has_session: bool) -> GateDecision {
        if path == LOGIN_PATH {
            return if has_session {
                GateDecision::Redirect(sanitize_next(next_from_query(query).as_deref()))
            } else {
                GateDecision::Pass
            };
        }

        if has_session || !self.is_protected(path) {
            return GateDecision::Pass;
        }

        if path.starts_with(API_PREFIX) {
            return GateDecision::Unauthorized;
        }

        let next = match query {
            Some(query) if !query.is_empty() => format!("{path}?{query}"),
            _ => path.to_string(),
        };
        GateDecision::Redirect(login_location(LoginReason::Auth, &next))
    }
}

// `/admin` covers `/admin` and `/admin/...`, not `/administrator`.
fn under_prefix(path: &str, prefix: &str) -> bool {
    path.strip_prefix(prefix)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}

pub async fn edge_gate(
    State(config): State<Arc<GateConfig>>,
    jar: CookieJar,
    request: Request,
    next: Next,
) -> Response {
    let has_session = jar
        .get(&config.session_cookie_name)
        .is_some_and(|cookie| !cookie.value().is_empty());

    let decision = config.decide(request.uri().path(), request.uri().query(), has_session);

    match decision {
        GateDecision::Pass => next.run(request).await,
        GateDecision::Redirect(location) => {
            debug!("edge gate redirect: {} -> {location}", request.uri().path());
            found(&location)
        }
        GateDecision::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
    }
}
