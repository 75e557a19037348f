// POST /api/interactions — record a user interaction with a post.
//
// post_id is accepted without checking the posts table: referential
// looseness is part of the contract, so an interaction against an
// unknown post succeeds.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;

use crate::web::{api_error, AppState};

#[derive(Deserialize)]
pub struct InteractionRequest {
    pub post_id: String,
    /// Free-form action name, e.g. "like" or "report".
    pub action: String,
}

pub async fn record_interaction(
    State(state): State<AppState>,
    Json(body): Json<InteractionRequest>,
) -> Response {
    if body.action.trim().is_empty() {
        return api_error(StatusCode::BAD_REQUEST, "action must not be empty");
    }

    match state
        .store
        .record_interaction(&body.post_id, &body.action)
        .await
    {
        Ok(interaction) => {
            Json(serde_json::json!({ "interaction_id": interaction.id })).into_response()
        }
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "Failed to record interaction");
            api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to record interaction",
            )
        }
    }
}
