use crate::vestibule::auth::{config::LOGIN_PATH, AuthState, CookieStore};
use axum::{
    extract::Extension,
    response::{IntoResponse, Redirect},
};
use axum_extra::extract::cookie::CookieJar;
use std::sync::Arc;

pub const SIGNED_OUT_MESSAGE: &str = "You have been signed out.";

/// Form logout: revoke, clear the cookie, and go back to the login page.
pub async fn logout(state: Extension<Arc<AuthState>>, jar: CookieJar) -> impl IntoResponse {
    let mut cookies = state.cookie_store(jar);
    state.logout_current(&mut cookies).await;
    cookies.set_flash(SIGNED_OUT_MESSAGE);

    (cookies.into_jar(), Redirect::to(LOGIN_PATH))
}
