use std::env;
use std::time::Duration;

use anyhow::Result;

/// Central configuration loaded from environment variables.
///
/// All secrets come from env vars (never hardcoded). The .env file
/// is loaded automatically at startup via dotenvy.
pub struct Config {
    pub db_path: String,
    /// Directory the CSV export mirror is written to.
    pub export_dir: String,
    /// Base URL of the hosted inference API.
    pub inference_api_url: String,
    /// Bearer token for the inference API (optional for public models).
    pub inference_api_token: Option<String>,
    /// Per-call timeout for every capability call.
    pub inference_timeout: Duration,
    /// Model ids, overridable per deployment.
    pub toxicity_model: String,
    pub fake_news_model: String,
    pub hate_speech_model: String,
    pub language_model: String,
    /// Translation model template with {source}/{target} placeholders.
    pub translation_model: String,
    /// Language that triggers translation before classification.
    pub source_lang: String,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Everything has a default except the API token, which stays
    /// optional — public inference endpoints work without one.
    pub fn load() -> Result<Self> {
        let timeout_secs: u64 = env::var("LANTERN_INFERENCE_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(30);

        Ok(Self {
            db_path: env::var("LANTERN_DB_PATH").unwrap_or_else(|_| "./lantern.db".to_string()),
            export_dir: env::var("LANTERN_EXPORT_DIR").unwrap_or_else(|_| "./exports".to_string()),
            inference_api_url: env::var("HF_API_URL")
                .unwrap_or_else(|_| "https://api-inference.huggingface.co".to_string()),
            inference_api_token: env::var("HF_API_TOKEN").ok().filter(|t| !t.is_empty()),
            inference_timeout: Duration::from_secs(timeout_secs),
            toxicity_model: env::var("LANTERN_TOXICITY_MODEL")
                .unwrap_or_else(|_| "unitary/toxic-bert".to_string()),
            fake_news_model: env::var("LANTERN_FAKE_NEWS_MODEL")
                .unwrap_or_else(|_| "mariagrandury/roberta-base-fakenews".to_string()),
            hate_speech_model: env::var("LANTERN_HATE_SPEECH_MODEL")
                .unwrap_or_else(|_| "cardiffnlp/twitter-roberta-base-hate".to_string()),
            language_model: env::var("LANTERN_LANGUAGE_MODEL")
                .unwrap_or_else(|_| "papluca/xlm-roberta-base-language-detection".to_string()),
            translation_model: env::var("LANTERN_TRANSLATION_MODEL")
                .unwrap_or_else(|_| "Helsinki-NLP/opus-mt-{source}-{target}".to_string()),
            source_lang: env::var("LANTERN_SOURCE_LANG").unwrap_or_else(|_| "ru".to_string()),
        })
    }

    /// Check that the inference API is reachable in principle.
    /// Call this before any operation that runs the classifiers.
    pub fn require_inference(&self) -> Result<()> {
        if self.inference_api_url.is_empty() {
            anyhow::bail!(
                "HF_API_URL is empty. Set it to your inference endpoint,\n\
                 or unset it to use the default public API."
            );
        }
        Ok(())
    }
}
