use crate::{vestibule::auth::AuthState, GIT_COMMIT_HASH};
use axum::{
    extract::Extension,
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;
use utoipa::ToSchema;

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct Health {
    commit: String,
    name: String,
    version: String,
    identity_authority: String,
}

#[utoipa::path(
    get,
    path = "/health",
    responses (
        (status = 200, description = "Service is running", body = Health)
    ),
    tag = "health",
)]
// axum handler for health
pub async fn health(state: Extension<Arc<AuthState>>) -> impl IntoResponse {
    let health = Health {
        commit: GIT_COMMIT_HASH.to_string(),
        name: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        identity_authority: state
            .authority_origin()
            .unwrap_or("configured")
            .to_string(),
    };

    let short_hash = health.commit.get(0..7).unwrap_or_default();

    let headers = format!("{}:{}:{}", health.name, health.version, short_hash)
        .parse::<HeaderValue>()
        .map(|x_app| {
            let mut headers = HeaderMap::new();
            headers.insert("X-App", x_app);
            headers
        })
        .unwrap_or_else(|err| {
            debug!("Failed to parse X-App header: {}", err);
            HeaderMap::new()
        });

    (StatusCode::OK, headers, Json(health))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vestibule::auth::{testing::FakeAuthority, AuthConfig};
    use anyhow::Result;
    use axum::body::to_bytes;

    #[tokio::test]
    async fn health_reports_build_and_authority() -> Result<()> {
        let state = AuthState::new(AuthConfig::new(), Arc::new(FakeAuthority::new()))
            .with_authority_origin("https://idp.example".to_string());

        let response = health(Extension(Arc::new(state))).await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("X-App"));

        let body = to_bytes(response.into_body(), usize::MAX).await?;
        let health: Health = serde_json::from_slice(&body)?;
        assert_eq!(health.name, "vestibule");
        assert_eq!(health.version, env!("CARGO_PKG_VERSION"));
        assert_eq!(health.identity_authority, "https://idp.example");
        Ok(())
    }
}
