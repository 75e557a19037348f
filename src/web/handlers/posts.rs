// Post persistence handlers.
//
// POST /api/posts — save an analysis result as an immutable post row.
//   The body may carry a pre-computed result (text + all three
//   classifier fields); otherwise the pipeline runs first. Either way
//   the store write is atomic and the export mirror is rebuilt only
//   after the write succeeds.
// GET  /api/posts — every stored post, newest first.

use std::collections::BTreeMap;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;

use crate::classify::normalize::LabelScore;
use crate::pipeline::PostAnalysis;
use crate::web::{api_error, AppState};

#[derive(Deserialize)]
pub struct SaveRequest {
    pub text: String,
    /// Pre-computed classifier fields. When all three are present the
    /// pipeline is skipped and the supplied result is persisted as-is.
    pub toxicity: Option<BTreeMap<String, f64>>,
    pub fake_news: Option<LabelScore>,
    pub hate_speech: Option<LabelScore>,
}

/// POST /api/posts — analyze (if needed) and persist one post.
pub async fn save_post(State(state): State<AppState>, Json(body): Json<SaveRequest>) -> Response {
    if body.text.trim().is_empty() {
        return api_error(StatusCode::BAD_REQUEST, "text must not be empty");
    }

    let analysis = match (body.toxicity, body.fake_news, body.hate_speech) {
        (Some(toxicity), Some(fake_news), Some(hate_speech)) => {
            // Caller-supplied results land in an immutable row, so they
            // must satisfy the same invariants the pipeline guarantees:
            // lower-case labels, scores within [0, 1].
            match sanitize(PostAnalysis {
                text: body.text.clone(),
                toxicity,
                fake_news,
                hate_speech,
            }) {
                Ok(analysis) => analysis,
                Err(message) => return api_error(StatusCode::BAD_REQUEST, &message),
            }
        }
        _ => match state.analyzer.analyze(&body.text).await {
            Ok(result) => result,
            Err(e) => {
                tracing::error!(error = %format!("{e:#}"), "Analysis failed before save");
                return api_error(StatusCode::BAD_GATEWAY, &format!("{e:#}"));
            }
        },
    };

    match state.store.save_post(&analysis.text, &analysis).await {
        Ok(post) => Json(serde_json::json!({ "id": post.id })).into_response(),
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "Failed to persist post");
            api_error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to persist post")
        }
    }
}

/// Enforce the pipeline's result invariants on a caller-supplied
/// analysis: every label lower-cased, every score within [0, 1].
fn sanitize(mut analysis: PostAnalysis) -> Result<PostAnalysis, String> {
    let mut toxicity = BTreeMap::new();
    for (label, score) in std::mem::take(&mut analysis.toxicity) {
        if !(0.0..=1.0).contains(&score) {
            return Err(format!("toxicity score for '{label}' must be within [0, 1]"));
        }
        toxicity.insert(label.to_lowercase(), score);
    }
    analysis.toxicity = toxicity;

    for (field, judgement) in [
        ("fake_news", &mut analysis.fake_news),
        ("hate_speech", &mut analysis.hate_speech),
    ] {
        if !(0.0..=1.0).contains(&judgement.score) {
            return Err(format!("{field} score must be within [0, 1]"));
        }
        judgement.label = judgement.label.to_lowercase();
    }

    Ok(analysis)
}

/// GET /api/posts — stored posts, most recently created first.
pub async fn list_posts(State(state): State<AppState>) -> Response {
    match state.store.list_posts().await {
        Ok(posts) => Json(serde_json::json!({ "posts": posts })).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "DB error listing posts");
            api_error(StatusCode::INTERNAL_SERVER_ERROR, "Database error")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analysis(toxic_label: &str, toxic_score: f64) -> PostAnalysis {
        PostAnalysis {
            text: "x".to_string(),
            toxicity: BTreeMap::from([(toxic_label.to_string(), toxic_score)]),
            fake_news: LabelScore {
                label: "Fake".to_string(),
                score: 0.8,
            },
            hate_speech: LabelScore {
                label: "NOT-HATE".to_string(),
                score: 0.3,
            },
        }
    }

    #[test]
    fn test_sanitize_lowercases_all_labels() {
        let clean = sanitize(analysis("TOXIC", 0.9)).unwrap();
        assert_eq!(clean.toxicity.keys().next().unwrap(), "toxic");
        assert_eq!(clean.fake_news.label, "fake");
        assert_eq!(clean.hate_speech.label, "not-hate");
    }

    #[test]
    fn test_sanitize_rejects_out_of_range_scores() {
        assert!(sanitize(analysis("toxic", 1.5)).is_err());
        assert!(sanitize(analysis("toxic", -0.1)).is_err());

        let mut bad = analysis("toxic", 0.5);
        bad.hate_speech.score = 2.0;
        assert!(sanitize(bad).is_err());
    }

    #[test]
    fn test_sanitize_rejects_nan() {
        assert!(sanitize(analysis("toxic", f64::NAN)).is_err());
    }

    #[test]
    fn test_sanitize_keeps_valid_scores_unchanged() {
        let clean = sanitize(analysis("toxic", 0.42)).unwrap();
        assert_eq!(clean.toxicity["toxic"], 0.42);
        assert_eq!(clean.fake_news.score, 0.8);
    }
}
