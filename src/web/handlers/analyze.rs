// POST /api/analyze — run the full pipeline without persisting.
//
// Capability failures surface as 502 with the failing stage in the
// message; the response is all-or-nothing, never a partial result.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;

use crate::web::{api_error, AppState};

#[derive(Deserialize)]
pub struct AnalyzeRequest {
    pub text: String,
}

/// POST /api/analyze — classify one text and return the canonical result.
pub async fn analyze(State(state): State<AppState>, Json(body): Json<AnalyzeRequest>) -> Response {
    if body.text.trim().is_empty() {
        return api_error(StatusCode::BAD_REQUEST, "text must not be empty");
    }

    match state.analyzer.analyze(&body.text).await {
        Ok(result) => Json(result).into_response(),
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "Analysis failed");
            api_error(StatusCode::BAD_GATEWAY, &format!("{e:#}"))
        }
    }
}
