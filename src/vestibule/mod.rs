pub mod auth;
pub mod handlers;
mod openapi;

pub use self::openapi::openapi;

use self::{
    auth::{gate::edge_gate, AuthState},
    handlers::{login_page, logout},
};
use anyhow::Result;
use axum::{
    body::Body,
    http::{HeaderName, HeaderValue, Request},
    middleware,
    routing::{get, post},
    Extension, Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    request_id::PropagateRequestIdLayer, set_header::SetRequestHeaderLayer, trace::TraceLayer,
};
use tracing::{debug_span, info, Span};
use ulid::Ulid;

const REQUEST_ID: &str = "x-request-id";

/// Full application router: documented API routes, HTML routes, the edge gate,
/// and request tracing.
#[must_use]
pub fn app(state: Arc<AuthState>) -> Router {
    let gate = Arc::new(state.config().gate_config());
    let (router, _openapi) = openapi::api_router().split_for_parts();

    router
        .route("/login", get(login_page::login_page))
        .route("/logout", post(logout::logout))
        .layer(middleware::from_fn_with_state(gate, edge_gate))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestHeaderLayer::if_not_present(
                    HeaderName::from_static(REQUEST_ID),
                    |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
                ))
                .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                    REQUEST_ID,
                )))
                .layer(TraceLayer::new_for_http().make_span_with(make_span))
                .layer(Extension(state)),
        )
}

/// Serve until ctrl-c.
/// # Errors
/// Returns an error if the listener cannot be bound or the server fails.
pub async fn new(port: u16, state: Arc<AuthState>) -> Result<()> {
    let app = app(state);

    let listener = TcpListener::bind(format!("::0:{port}")).await?;

    info!("Listening on [::]:{}", port);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Gracefully shutdown");
            }
        })
        .await?;

    Ok(())
}

// Cookie and authorization headers are never recorded.
fn make_span(request: &Request<Body>) -> Span {
    let path = request.uri().path();
    let method = request.method().as_str();
    let request_id = request
        .headers()
        .get(REQUEST_ID)
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");

    debug_span!("http-request", method, path, request_id)
}
