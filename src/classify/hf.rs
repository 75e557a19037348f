// Hosted inference API implementations of the capability traits.
//
// Each capability maps to one model endpoint on a HuggingFace-style
// inference API: POST {base_url}/models/{model} with {"inputs": text}.
// Text-classification models answer with (possibly nested) lists of
// {label, score} records; translation models answer with
// [{"translation_text": ...}].
//
// All calls share one reqwest Client with a hard timeout, so a stalled
// model call surfaces as a capability failure instead of blocking a
// request indefinitely.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::traits::{
    LanguageDetector, RawClassification, RawLabel, TextClassifier, Translator,
};

/// Shared connection settings for all inference-backed capabilities.
#[derive(Clone)]
pub struct HfInference {
    client: Client,
    base_url: String,
    api_token: Option<String>,
}

impl HfInference {
    /// Build the shared client. `timeout` bounds every model call.
    pub fn new(base_url: &str, api_token: Option<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build inference HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_token,
        })
    }

    /// A classifier bound to one model id.
    pub fn classifier(&self, model: &str) -> HfClassifier {
        HfClassifier {
            inference: self.clone(),
            model: model.to_string(),
        }
    }

    /// A language detector backed by a language-identification model.
    pub fn detector(&self, model: &str) -> HfLanguageDetector {
        HfLanguageDetector {
            inference: self.clone(),
            model: model.to_string(),
        }
    }

    /// A translator backed by per-language-pair models. The template
    /// must contain `{source}` and `{target}` placeholders.
    pub fn translator(&self, model_template: &str) -> HfTranslator {
        HfTranslator {
            inference: self.clone(),
            model_template: model_template.to_string(),
        }
    }

    async fn post(&self, model: &str, text: &str) -> Result<reqwest::Response> {
        let url = format!("{}/models/{}", self.base_url, model);
        let mut request = self.client.post(&url).json(&InferenceRequest {
            inputs: text.to_string(),
        });
        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .with_context(|| format!("Failed to call inference API for {model}"))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Inference API returned {} for {}: {}", status, model, body);
        }
        Ok(response)
    }

    async fn classify(&self, model: &str, text: &str) -> Result<RawClassification> {
        let response = self.post(model, text).await?;
        let wire: WireClassification = response
            .json()
            .await
            .with_context(|| format!("Failed to parse classification response from {model}"))?;

        debug!(
            model = model,
            text_preview = %text.chars().take(50).collect::<String>(),
            "Classified text"
        );

        Ok(wire.into())
    }
}

/// Text classification capability bound to one model.
pub struct HfClassifier {
    inference: HfInference,
    model: String,
}

#[async_trait]
impl TextClassifier for HfClassifier {
    async fn classify(&self, text: &str) -> Result<RawClassification> {
        self.inference.classify(&self.model, text).await
    }
}

/// Language detection via a language-identification classifier.
/// The top label is the ISO 639-1 code of the dominant language.
pub struct HfLanguageDetector {
    inference: HfInference,
    model: String,
}

#[async_trait]
impl LanguageDetector for HfLanguageDetector {
    async fn detect(&self, text: &str) -> Result<String> {
        if text.trim().is_empty() {
            anyhow::bail!("Cannot detect language of empty text");
        }
        let raw = self.inference.classify(&self.model, text).await?;
        let code = match &raw {
            RawClassification::Single(r) => Some(r.label.clone()),
            RawClassification::Ranked(rs) => rs.first().map(|r| r.label.clone()),
            RawClassification::Nested(batches) => batches
                .first()
                .and_then(|b| b.first())
                .map(|r| r.label.clone()),
        };
        code.map(|c| c.to_lowercase())
            .context("Language detector returned no prediction")
    }
}

/// Translation via per-language-pair opus-mt style models.
pub struct HfTranslator {
    inference: HfInference,
    model_template: String,
}

#[async_trait]
impl Translator for HfTranslator {
    async fn translate(&self, text: &str, source: &str, target: &str) -> Result<String> {
        let model = self
            .model_template
            .replace("{source}", source)
            .replace("{target}", target);

        let response = self.inference.post(&model, text).await?;
        let translations: Vec<TranslationRecord> = response
            .json()
            .await
            .with_context(|| format!("Failed to parse translation response from {model}"))?;

        translations
            .into_iter()
            .next()
            .map(|t| t.translation_text)
            .with_context(|| format!("Translation model {model} returned no output"))
    }
}

// --- Inference API wire types ---

#[derive(Serialize)]
struct InferenceRequest {
    inputs: String,
}

/// The three classification answer shapes the API produces. Untagged so
/// serde picks whichever matches; nested must come first because a
/// nested answer also starts with '['.
#[derive(Deserialize)]
#[serde(untagged)]
enum WireClassification {
    Nested(Vec<Vec<RawLabel>>),
    Ranked(Vec<RawLabel>),
    Single(RawLabel),
}

impl From<WireClassification> for RawClassification {
    fn from(wire: WireClassification) -> Self {
        match wire {
            WireClassification::Nested(v) => RawClassification::Nested(v),
            WireClassification::Ranked(v) => RawClassification::Ranked(v),
            WireClassification::Single(r) => RawClassification::Single(r),
        }
    }
}

#[derive(Deserialize)]
struct TranslationRecord {
    translation_text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_shape_nested() {
        let json = r#"[[{"label": "toxic", "score": 0.9}, {"label": "insult", "score": 0.2}]]"#;
        let wire: WireClassification = serde_json::from_str(json).unwrap();
        match RawClassification::from(wire) {
            RawClassification::Nested(batches) => {
                assert_eq!(batches.len(), 1);
                assert_eq!(batches[0][0].label, "toxic");
            }
            other => panic!("expected nested shape, got {other:?}"),
        }
    }

    #[test]
    fn test_wire_shape_ranked() {
        let json = r#"[{"label": "hate", "score": 0.7}]"#;
        let wire: WireClassification = serde_json::from_str(json).unwrap();
        assert!(matches!(
            RawClassification::from(wire),
            RawClassification::Ranked(_)
        ));
    }

    #[test]
    fn test_wire_shape_single() {
        let json = r#"{"label": "LABEL_0", "score": 0.55}"#;
        let wire: WireClassification = serde_json::from_str(json).unwrap();
        match RawClassification::from(wire) {
            RawClassification::Single(r) => assert_eq!(r.label, "LABEL_0"),
            other => panic!("expected single shape, got {other:?}"),
        }
    }

    #[test]
    fn test_translation_record_parse() {
        let json = r#"[{"translation_text": "You are an idiot"}]"#;
        let records: Vec<TranslationRecord> = serde_json::from_str(json).unwrap();
        assert_eq!(records[0].translation_text, "You are an idiot");
    }
}
