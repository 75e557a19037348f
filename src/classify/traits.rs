// Capability traits — the swap-ready abstractions for everything the
// pipeline calls out to.
//
// Classification, translation, and language detection are all black-box
// capabilities. The default implementations call a hosted inference API
// (see hf.rs); tests substitute canned implementations.

use anyhow::Result;
use async_trait::async_trait;

/// One (label, score) pair as produced by a classifier head.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RawLabel {
    pub label: String,
    pub score: f64,
}

/// The raw output of a classifier call. The shape space is small and
/// enumerable, so it's a tagged enum rather than runtime JSON inspection:
/// single-label models return one record, multi-label scans return a
/// ranked list, and the inference API wraps batch results one level deeper.
#[derive(Debug, Clone, PartialEq)]
pub enum RawClassification {
    Single(RawLabel),
    Ranked(Vec<RawLabel>),
    Nested(Vec<Vec<RawLabel>>),
}

/// Which classifier produced a raw output. Drives label normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassifierKind {
    Toxicity,
    FakeNews,
    HateSpeech,
}

impl ClassifierKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClassifierKind::Toxicity => "toxicity",
            ClassifierKind::FakeNews => "fake-news",
            ClassifierKind::HateSpeech => "hate-speech",
        }
    }
}

impl std::fmt::Display for ClassifierKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Trait for text classification capabilities. Implementations must be
/// async because the default providers are HTTP API calls.
#[async_trait]
pub trait TextClassifier: Send + Sync {
    /// Classify a single text, returning the provider's raw output shape.
    async fn classify(&self, text: &str) -> Result<RawClassification>;
}

/// Trait for the translation capability.
#[async_trait]
pub trait Translator: Send + Sync {
    /// Translate `text` from `source` to `target` (ISO 639-1 codes).
    async fn translate(&self, text: &str, source: &str, target: &str) -> Result<String>;
}

/// Trait for the language detection capability.
///
/// Detection may fail on ambiguous or very short input — callers decide
/// whether that is fatal (the Language Gate treats it as "not the
/// translated language" and passes the text through).
#[async_trait]
pub trait LanguageDetector: Send + Sync {
    /// Detect the dominant language of `text`, returning an ISO 639-1 code.
    async fn detect(&self, text: &str) -> Result<String>;
}
