use crate::vestibule::auth::{redirect::LoginReason, AuthState, CookieStore};
use axum::{
    extract::{Extension, Query},
    response::{Html, IntoResponse},
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    reason: Option<String>,
    next: Option<String>,
}

/// Minimal sign-in page. Client-side sign-in posts the identity token to
/// `/api/session`.
pub async fn login_page(
    state: Extension<Arc<AuthState>>,
    jar: CookieJar,
    Query(query): Query<LoginQuery>,
) -> impl IntoResponse {
    let mut cookies = state.cookie_store(jar);

    let message = match query.reason.as_deref().and_then(LoginReason::parse) {
        Some(reason) => Some(reason.message().to_string()),
        None => cookies.pop_flash(),
    };

    let html = render(message.as_deref(), query.next.as_deref());
    (cookies.into_jar(), Html(html))
}

fn render(message: Option<&str>, next: Option<&str>) -> String {
    let message = message
        .map(|message| format!("<p role=\"status\">{}</p>\n", escape(message)))
        .unwrap_or_default();
    let next = escape(next.unwrap_or_default());

    format!(
        r#"<!doctype html>
<html lang="en">
<head><meta charset="utf-8"><title>Sign in</title></head>
<body>
<h1>Sign in</h1>
{message}<main id="sign-in" data-session-endpoint="/api/session" data-next="{next}"></main>
</body>
</html>
"#
    )
}

fn escape(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
