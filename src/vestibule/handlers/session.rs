//! Session endpoints: login, introspection, and logout.

use crate::vestibule::auth::{
    error::LoginFailure,
    redirect::{next_from_referer, sanitize_next},
    AuthState, LoginError, SessionUser,
};
use axum::{
    extract::{rejection::JsonRejection, Extension, Query},
    http::{header::REFERER, HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
    #[serde(default)]
    pub id_token: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct NextQuery {
    /// Same-origin path to continue to after login.
    pub next: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionResponse {
    pub ok: bool,
    pub redirect_to: String,
    pub user: SessionUser,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LogoutResponse {
    pub ok: bool,
}

#[utoipa::path(
    post,
    path = "/api/session",
    params(NextQuery),
    request_body = CreateSessionRequest,
    responses(
        (status = 200, description = "Session created; cookie set", body = CreateSessionResponse),
        (status = 400, description = "Missing identity token", body = LoginFailure),
        (status = 401, description = "Invalid or expired identity token", body = LoginFailure),
        (status = 403, description = "Email not verified or not an admin", body = LoginFailure)
    ),
    tag = "session"
)]
pub async fn create(
    state: Extension<Arc<AuthState>>,
    jar: CookieJar,
    headers: HeaderMap,
    Query(query): Query<NextQuery>,
    payload: Result<Json<CreateSessionRequest>, JsonRejection>,
) -> Response {
    let id_token = match payload {
        Ok(Json(request)) => request.id_token.unwrap_or_default(),
        Err(rejection) => {
            debug!("rejecting session request body: {rejection}");
            String::new()
        }
    };

    if id_token.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(LoginFailure::from(LoginError::InvalidToken)),
        )
            .into_response();
    }

    let next = query.next.or_else(|| {
        headers
            .get(REFERER)
            .and_then(|value| value.to_str().ok())
            .and_then(next_from_referer)
    });
    let redirect_to = sanitize_next(next.as_deref());

    let mut cookies = state.cookie_store(jar);
    match state
        .login(&mut cookies, &id_token, &state.config().login_options())
        .await
    {
        Ok(user) => (
            cookies.into_jar(),
            Json(CreateSessionResponse {
                ok: true,
                redirect_to,
                user,
            }),
        )
            .into_response(),
        Err(err) => err.into_response(),
    }
}

#[utoipa::path(
    get,
    path = "/api/session",
    responses(
        (status = 200, description = "Session is active", body = SessionUser),
        (status = 204, description = "No active session")
    ),
    tag = "session"
)]
pub async fn current(state: Extension<Arc<AuthState>>, jar: CookieJar) -> Response {
    let mut cookies = state.cookie_store(jar);
    match state.verify_session(&mut cookies).await {
        Some(user) => (cookies.into_jar(), Json(user)).into_response(),
        None => (cookies.into_jar(), StatusCode::NO_CONTENT).into_response(),
    }
}

#[utoipa::path(
    delete,
    path = "/api/session",
    responses(
        (status = 200, description = "Session revoked and cookie cleared", body = LogoutResponse)
    ),
    tag = "session"
)]
pub async fn destroy(state: Extension<Arc<AuthState>>, jar: CookieJar) -> impl IntoResponse {
    let mut cookies = state.cookie_store(jar);
    state.logout_current(&mut cookies).await;
    (cookies.into_jar(), Json(LogoutResponse { ok: true }))
}
