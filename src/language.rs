// Language gate — detects the input language and translates when needed.
//
// Posts arriving in the configured source language (Russian by default)
// are translated to English before classification, because the
// classifier models are English-only. Detection failure is fail-open:
// ambiguous or too-short text passes through untranslated rather than
// failing the whole request. Translation failure is a real capability
// failure and propagates.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::debug;

use crate::classify::traits::{LanguageDetector, Translator};

pub struct LanguageGate {
    detector: Arc<dyn LanguageDetector>,
    translator: Arc<dyn Translator>,
    /// Language that triggers translation (ISO 639-1, e.g. "ru").
    source_lang: String,
    /// Language the classifiers expect (e.g. "en").
    target_lang: String,
}

impl LanguageGate {
    pub fn new(
        detector: Arc<dyn LanguageDetector>,
        translator: Arc<dyn Translator>,
        source_lang: &str,
        target_lang: &str,
    ) -> Self {
        Self {
            detector,
            translator,
            source_lang: source_lang.to_lowercase(),
            target_lang: target_lang.to_lowercase(),
        }
    }

    /// Prepare text for classification: translate it if it's in the
    /// source language, otherwise return it unchanged.
    pub async fn prepare(&self, text: &str) -> Result<String> {
        let detected = match self.detector.detect(text).await {
            Ok(code) => code,
            Err(e) => {
                // Fail-open: treat undetectable text as already in the
                // target language and pass it through.
                debug!(error = %e, "Language detection failed, passing text through");
                return Ok(text.to_string());
            }
        };

        if detected != self.source_lang {
            return Ok(text.to_string());
        }

        debug!(detected = %detected, "Translating before classification");
        self.translator
            .translate(text, &self.source_lang, &self.target_lang)
            .await
            .context("Translation capability failed")
    }
}
