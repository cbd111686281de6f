use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{routing::get, Json, Router};
use tower_http::trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::Level;

use common::types::Health;

use crate::observability;
use crate::state::ServerState;

pub mod account;
pub mod manage;

pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

async fn metrics() -> (StatusCode, String) {
    observability::encode_metrics()
}

/// Newline-terminated `text/plain` body.
pub fn plain_text(status: StatusCode, body: impl Into<String>) -> Response {
    let mut body = body.into();
    body.push('\n');
    (status, body).into_response()
}

/// Build the full application router
pub fn build_router(state: ServerState) -> Router {
    Router::new()
        .route("/", get(account::index))
        .route("/register", get(account::register))
        .route("/login", get(account::login))
        .route("/logout", get(account::logout))
        .route("/manage", get(manage::manage))
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .with_state(state)
        .layer(
            TraceLayer::new_for_http()
                // one INFO span per request with method and path; headers
                // stay out because they carry the session cookie
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO).include_headers(false))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                // status and latency on completion
                .on_response(DefaultOnResponse::new().level(Level::INFO).include_headers(false))
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}
