// Web server — Axum JSON API over the analysis pipeline and store.
//
// This is the transport boundary: handlers translate HTTP bodies to
// core calls and core errors to JSON error responses. CORS is wide
// open — the service fronts a demo client and has no caller auth.

use std::sync::Arc;

use anyhow::Result;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::pipeline::Analyzer;
use crate::store::Store;

pub mod handlers;

/// Shared application state threaded through all Axum handlers.
#[derive(Clone)]
pub struct AppState {
    pub analyzer: Arc<Analyzer>,
    pub store: Arc<Store>,
}

/// Start the Axum web server and block until it exits.
pub async fn run_server(
    analyzer: Arc<Analyzer>,
    store: Arc<Store>,
    port: u16,
    bind: &str,
) -> Result<()> {
    let state = AppState { analyzer, store };
    let app = build_router(state);

    let addr = format!("{bind}:{port}");
    info!("Lantern API listening on http://{addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/analyze", post(handlers::analyze::analyze))
        .route(
            "/api/posts",
            get(handlers::posts::list_posts).post(handlers::posts::save_post),
        )
        .route(
            "/api/interactions",
            post(handlers::interactions::record_interaction),
        )
        .route("/api/export/{kind}", get(handlers::export::download))
        .route("/api/evaluate", post(handlers::evaluate::evaluate))
        .layer(
            CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods([
                    axum::http::Method::GET,
                    axum::http::Method::POST,
                    axum::http::Method::OPTIONS,
                ])
                .allow_headers([header::CONTENT_TYPE]),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Deployment health check — always returns 200 OK.
async fn health() -> impl IntoResponse {
    (
        StatusCode::OK,
        axum::Json(serde_json::json!({ "status": "ok" })),
    )
}

/// Typed JSON error response helper.
pub fn api_error(status: StatusCode, message: &str) -> Response {
    (status, axum::Json(serde_json::json!({ "error": message }))).into_response()
}
