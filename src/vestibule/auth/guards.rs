//! Route guards.
//!
//! Unlike the edge gate these always verify the session with the identity
//! authority. The result is memoized in the request extensions so a request
//! is verified at most once, whichever guards it passes through.

use super::{
    redirect::{found, login_location, LoginReason},
    state::AuthState,
    user::SessionUser,
};
use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;
use std::sync::Arc;
use tracing::error;

#[derive(Clone, Debug)]
struct Resolved {
    user: Option<SessionUser>,
    credential_present: bool,
    jar: CookieJar,
}

/// The verified user, if any. Return `jar` so stale-cookie removal reaches
/// the client.
#[derive(Debug)]
pub struct MaybeUser {
    pub user: Option<SessionUser>,
    pub jar: CookieJar,
}

/// A verified user, or a redirect to the login page.
#[derive(Debug)]
pub struct RequireUser {
    pub user: SessionUser,
    pub jar: CookieJar,
}

/// A verified admin. Anyone else gets a login redirect or `404 Not Found`.
#[derive(Debug)]
pub struct RequireAdmin {
    pub user: SessionUser,
    pub jar: CookieJar,
}

#[derive(Debug)]
pub enum GuardRejection {
    Login { jar: CookieJar, location: String },
    NotFound,
    MissingState,
}

impl IntoResponse for GuardRejection {
    fn into_response(self) -> Response {
        match self {
            Self::Login { jar, location } => (jar, found(&location)).into_response(),
            Self::NotFound => StatusCode::NOT_FOUND.into_response(),
            Self::MissingState => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        }
    }
}

async fn resolve(parts: &mut Parts) -> Result<Resolved, GuardRejection> {
    if let Some(resolved) = parts.extensions.get::<Resolved>() {
        return Ok(resolved.clone());
    }

    let Some(state) = parts.extensions.get::<Arc<AuthState>>().cloned() else {
        error!("AuthState extension missing; route guards cannot verify sessions");
        return Err(GuardRejection::MissingState);
    };

    let jar = CookieJar::from_headers(&parts.headers);
    let credential_present = jar
        .get(state.config().session_cookie_name())
        .is_some_and(|cookie| !cookie.value().is_empty());

    let mut cookies = state.cookie_store(jar);
    let user = state.verify_session(&mut cookies).await;

    let resolved = Resolved {
        user,
        credential_present,
        jar: cookies.into_jar(),
    };
    parts.extensions.insert(resolved.clone());

    Ok(resolved)
}

fn login_rejection(parts: &Parts, resolved: Resolved) -> GuardRejection {
    let next = parts
        .uri
        .path_and_query()
        .map_or_else(|| parts.uri.path().to_string(), ToString::to_string);

    let reason = if resolved.credential_present {
        LoginReason::Expired
    } else {
        LoginReason::Auth
    };

    GuardRejection::Login {
        jar: resolved.jar,
        location: login_location(reason, &next),
    }
}

impl<S> FromRequestParts<S> for MaybeUser
where
    S: Send + Sync,
{
    type Rejection = GuardRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let resolved = resolve(parts).await?;
        Ok(Self {
            user: resolved.user,
            jar: resolved.jar,
        })
    }
}

impl<S> FromRequestParts<S> for RequireUser
where
    S: Send + Sync,
{
    type Rejection = GuardRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let resolved = resolve(parts).await?;
        match resolved.user.clone() {
            Some(user) => Ok(Self {
                user,
                jar: resolved.jar,
            }),
            None => Err(login_rejection(parts, resolved)),
        }
    }
}

impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
{
    type Rejection = GuardRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let RequireUser { user, jar } = RequireUser::from_request_parts(parts, state).await?;
        if user.is_admin {
            Ok(Self { user, jar })
        } else {
            Err(GuardRejection::NotFound)
        }
    }
}
