// Analysis pipeline — composes the language gate and the three
// classifier capabilities into one text -> canonical result transform.
//
// The three classifier calls have no data dependency on each other and
// run concurrently; merging is deterministic regardless of completion
// order. Partial failure is strict: a post record needs all three
// fields, so any failed classifier fails the whole request with the
// failing stage named in the error chain. No retries.

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::classify::normalize::{
    normalize_fake_news, normalize_hate_speech, normalize_toxicity, toxicity_primary_label,
    LabelScore,
};
use crate::classify::traits::{ClassifierKind, TextClassifier};
use crate::language::LanguageGate;

/// The canonical result of analyzing one post.
///
/// Every score is a probability in [0, 1] and every label is lower-case
/// — the normalization layer guarantees both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostAnalysis {
    /// The text as analyzed (post-translation when the gate translated).
    pub text: String,
    /// Multi-label toxicity scores, label -> probability.
    pub toxicity: BTreeMap<String, f64>,
    pub fake_news: LabelScore,
    pub hate_speech: LabelScore,
}

/// Holds the capability handles for the process lifetime. Constructed
/// once at startup and shared — no ambient globals.
pub struct Analyzer {
    gate: LanguageGate,
    toxicity: Arc<dyn TextClassifier>,
    fake_news: Arc<dyn TextClassifier>,
    hate_speech: Arc<dyn TextClassifier>,
}

impl Analyzer {
    pub fn new(
        gate: LanguageGate,
        toxicity: Arc<dyn TextClassifier>,
        fake_news: Arc<dyn TextClassifier>,
        hate_speech: Arc<dyn TextClassifier>,
    ) -> Self {
        Self {
            gate,
            toxicity,
            fake_news,
            hate_speech,
        }
    }

    /// Run the full pipeline: gate -> classify (concurrent) -> normalize.
    pub async fn analyze(&self, text: &str) -> Result<PostAnalysis> {
        let prepared = self.gate.prepare(text).await?;

        let (tox, fake, hate) = tokio::try_join!(
            classify_stage(&*self.toxicity, &prepared, ClassifierKind::Toxicity),
            classify_stage(&*self.fake_news, &prepared, ClassifierKind::FakeNews),
            classify_stage(&*self.hate_speech, &prepared, ClassifierKind::HateSpeech),
        )?;

        Ok(PostAnalysis {
            text: prepared,
            toxicity: normalize_toxicity(&tox),
            fake_news: normalize_fake_news(&fake),
            hate_speech: normalize_hate_speech(&hate),
        })
    }

    /// Gate + toxicity classifier only, returning the top normalized
    /// label. The evaluation engine goes through this method so its
    /// normalization can never diverge from the analysis path.
    pub async fn predict_toxicity_label(&self, text: &str) -> Result<String> {
        let prepared = self.gate.prepare(text).await?;
        let raw = classify_stage(&*self.toxicity, &prepared, ClassifierKind::Toxicity).await?;
        Ok(toxicity_primary_label(&raw))
    }
}

async fn classify_stage(
    classifier: &dyn TextClassifier,
    text: &str,
    kind: ClassifierKind,
) -> Result<crate::classify::traits::RawClassification> {
    classifier
        .classify(text)
        .await
        .with_context(|| format!("{kind} classifier capability failed"))
}
