// GET /api/export/{kind} — download one mirrored CSV file.
//
// kind is "posts" or "interactions". The mirror file is regenerated on
// every store write; if no write has happened yet the mirror is built
// on demand so the download always reflects current store state.

use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::export::ExportKind;
use crate::web::{api_error, AppState};

pub async fn download(State(state): State<AppState>, Path(kind): Path<String>) -> Response {
    let kind = match ExportKind::parse(&kind) {
        Some(kind) => kind,
        None => {
            return api_error(
                StatusCode::NOT_FOUND,
                "Unknown export kind (expected posts or interactions)",
            )
        }
    };

    let path = state.store.export_path(kind);
    if !path.exists() {
        if let Err(e) = state.store.refresh_exports().await {
            tracing::error!(error = %format!("{e:#}"), "Failed to build export mirror");
            return api_error(StatusCode::INTERNAL_SERVER_ERROR, "Export unavailable");
        }
    }

    match tokio::fs::read(&path).await {
        Ok(bytes) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", kind.file_name()),
                ),
            ],
            bytes,
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, path = %path.display(), "Failed to read export file");
            api_error(StatusCode::INTERNAL_SERVER_ERROR, "Export unavailable")
        }
    }
}
