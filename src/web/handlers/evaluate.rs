// POST /api/evaluate — batch-score toxicity predictions.
//
// Body: {"samples": [{"text": ..., "true_label": ...}, ...]}.
// Unrecognized labels are counted as mismatches; only a classifier
// capability failure fails the request.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;

use crate::eval::{self, EvalSample};
use crate::web::{api_error, AppState};

#[derive(Deserialize)]
pub struct EvaluateRequest {
    pub samples: Vec<EvalSample>,
    /// Concurrent classifier calls (default 4).
    pub concurrency: Option<usize>,
}

pub async fn evaluate(
    State(state): State<AppState>,
    Json(body): Json<EvaluateRequest>,
) -> Response {
    if body.samples.is_empty() {
        return api_error(StatusCode::BAD_REQUEST, "samples must not be empty");
    }

    let concurrency = body.concurrency.unwrap_or(4).clamp(1, 32);
    match eval::evaluate(&state.analyzer, &body.samples, concurrency, false).await {
        Ok(report) => Json(report).into_response(),
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "Evaluation failed");
            api_error(StatusCode::BAD_GATEWAY, &format!("{e:#}"))
        }
    }
}
