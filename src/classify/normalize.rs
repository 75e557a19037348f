// Label normalization — the adapter between raw classifier output and
// the canonical result schema.
//
// Each provider returns its own shape (single record, ranked list, or
// the inference API's nested batch list) and its own label vocabulary
// (raw identifiers like LABEL_0, or literal strings like "fake").
// Everything is funneled through here so the rest of the app only ever
// sees lower-cased labels from a known vocabulary. Unrecognized labels
// resolve to the "unknown" sentinel instead of failing the request.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::traits::{ClassifierKind, RawClassification, RawLabel};

/// Sentinel label for raw labels outside the known vocabulary.
pub const UNKNOWN_LABEL: &str = "unknown";

/// A normalized (label, score) judgement from a single-label classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelScore {
    pub label: String,
    pub score: f64,
}

/// The canonical form of one classifier's output.
#[derive(Debug, Clone, PartialEq)]
pub enum NormalizedRecord {
    /// Multi-label score map (toxicity).
    Scores(BTreeMap<String, f64>),
    /// Single top judgement (fake-news, hate-speech).
    Judgement(LabelScore),
}

/// Normalize a raw classifier output into the canonical schema.
///
/// Pure and infallible: scores pass through unmodified, labels are
/// lower-cased and remapped per classifier vocabulary, and an empty or
/// unrecognized output yields the "unknown" sentinel with score 0.0.
pub fn normalize(raw: &RawClassification, kind: ClassifierKind) -> NormalizedRecord {
    match kind {
        ClassifierKind::Toxicity => NormalizedRecord::Scores(normalize_toxicity(raw)),
        ClassifierKind::FakeNews => NormalizedRecord::Judgement(normalize_fake_news(raw)),
        ClassifierKind::HateSpeech => NormalizedRecord::Judgement(normalize_hate_speech(raw)),
    }
}

/// Toxicity is multi-label: every returned head becomes a map entry.
/// The label space is open (toxic, severe_toxic, insult, threat, ...),
/// so labels are lower-cased but not remapped.
pub fn normalize_toxicity(raw: &RawClassification) -> BTreeMap<String, f64> {
    flatten(raw)
        .iter()
        .map(|r| (r.label.to_lowercase(), r.score))
        .collect()
}

/// Fake-news: top judgement, with both identifier-style and literal
/// label vocabularies supported.
pub fn normalize_fake_news(raw: &RawClassification) -> LabelScore {
    match primary(raw) {
        Some(r) => LabelScore {
            label: map_fake_news_label(&r.label),
            score: r.score,
        },
        None => unknown_judgement(),
    }
}

/// Hate-speech: top judgement against the known hate vocabulary.
pub fn normalize_hate_speech(raw: &RawClassification) -> LabelScore {
    match primary(raw) {
        Some(r) => LabelScore {
            label: map_hate_speech_label(&r.label),
            score: r.score,
        },
        None => unknown_judgement(),
    }
}

/// The normalized label of the highest-scoring toxicity head.
/// Used by the evaluation engine so it shares this exact path with
/// the analysis pipeline.
pub fn toxicity_primary_label(raw: &RawClassification) -> String {
    primary(raw)
        .map(|r| r.label.to_lowercase())
        .unwrap_or_else(|| UNKNOWN_LABEL.to_string())
}

/// Map a raw fake-news label to the canonical vocabulary.
///
/// Identifier style (models that expose bare head indices): LABEL_0 is
/// "fake", LABEL_2 is "real", and any other index is "neutral".
/// Literal style: known labels pass through lower-cased; anything else
/// is "unknown".
fn map_fake_news_label(raw: &str) -> String {
    let lower = raw.to_lowercase();
    if lower.starts_with("label_") {
        return match lower.as_str() {
            "label_0" => "fake".to_string(),
            "label_2" => "real".to_string(),
            _ => "neutral".to_string(),
        };
    }

    const KNOWN: &[&str] = &[
        "fake",
        "real",
        "neutral",
        "satire",
        "political",
        "conspiracy",
        "true",
        "false",
        "mostly-true",
        "half-true",
        "barely-true",
        "pants-fire",
    ];
    if KNOWN.contains(&lower.as_str()) {
        lower
    } else {
        UNKNOWN_LABEL.to_string()
    }
}

/// Map a raw hate-speech label to the canonical vocabulary.
fn map_hate_speech_label(raw: &str) -> String {
    match raw.to_lowercase().as_str() {
        "hate" => "hate".to_string(),
        "not-hate" | "non-hate" | "not_hate" => "not-hate".to_string(),
        "offensive" => "offensive".to_string(),
        "normal" => "normal".to_string(),
        "neutral" => "neutral".to_string(),
        _ => UNKNOWN_LABEL.to_string(),
    }
}

/// Flatten any raw shape into a single list of records.
/// The nested shape is a batch result — we classify one text at a
/// time, so only the first batch entry is meaningful.
fn flatten(raw: &RawClassification) -> &[RawLabel] {
    match raw {
        RawClassification::Single(r) => std::slice::from_ref(r),
        RawClassification::Ranked(rs) => rs,
        RawClassification::Nested(batches) => batches.first().map(|b| b.as_slice()).unwrap_or(&[]),
    }
}

/// The highest-scoring record, regardless of shape.
fn primary(raw: &RawClassification) -> Option<&RawLabel> {
    flatten(raw)
        .iter()
        .max_by(|a, b| a.score.partial_cmp(&b.score).unwrap_or(std::cmp::Ordering::Equal))
}

fn unknown_judgement() -> LabelScore {
    LabelScore {
        label: UNKNOWN_LABEL.to_string(),
        score: 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(label: &str, score: f64) -> RawLabel {
        RawLabel {
            label: label.to_string(),
            score,
        }
    }

    #[test]
    fn test_fake_news_identifier_mapping() {
        assert_eq!(map_fake_news_label("LABEL_0"), "fake");
        assert_eq!(map_fake_news_label("LABEL_2"), "real");
        assert_eq!(map_fake_news_label("LABEL_1"), "neutral");
        assert_eq!(map_fake_news_label("LABEL_5"), "neutral");
    }

    #[test]
    fn test_fake_news_literal_labels_lowercased() {
        assert_eq!(map_fake_news_label("FAKE"), "fake");
        assert_eq!(map_fake_news_label("Real"), "real");
        assert_eq!(map_fake_news_label("satire"), "satire");
    }

    #[test]
    fn test_fake_news_unrecognized_is_unknown() {
        assert_eq!(map_fake_news_label("gibberish"), UNKNOWN_LABEL);
    }

    #[test]
    fn test_hate_speech_vocabulary() {
        assert_eq!(map_hate_speech_label("HATE"), "hate");
        assert_eq!(map_hate_speech_label("NOT-HATE"), "not-hate");
        assert_eq!(map_hate_speech_label("NOT_HATE"), "not-hate");
        assert_eq!(map_hate_speech_label("something-else"), UNKNOWN_LABEL);
    }

    #[test]
    fn test_toxicity_multi_label_map() {
        let out = RawClassification::Ranked(vec![
            raw("TOXIC", 0.97),
            raw("Insult", 0.85),
            raw("threat", 0.02),
        ]);
        let map = normalize_toxicity(&out);
        assert_eq!(map.len(), 3);
        assert_eq!(map["toxic"], 0.97);
        assert_eq!(map["insult"], 0.85);
        // Scores pass through unmodified
        assert_eq!(map["threat"], 0.02);
    }

    #[test]
    fn test_single_shape_yields_one_entry_map() {
        let out = RawClassification::Single(raw("toxic", 0.5));
        let map = normalize_toxicity(&out);
        assert_eq!(map.len(), 1);
        assert_eq!(map["toxic"], 0.5);
    }

    #[test]
    fn test_nested_shape_uses_first_batch_entry() {
        let out = RawClassification::Nested(vec![vec![
            raw("LABEL_0", 0.91),
            raw("LABEL_2", 0.09),
        ]]);
        let result = normalize_fake_news(&out);
        assert_eq!(result.label, "fake");
        assert_eq!(result.score, 0.91);
    }

    #[test]
    fn test_primary_picks_highest_score() {
        let out = RawClassification::Ranked(vec![raw("not-hate", 0.3), raw("hate", 0.7)]);
        let result = normalize_hate_speech(&out);
        assert_eq!(result.label, "hate");
        assert_eq!(result.score, 0.7);
    }

    #[test]
    fn test_empty_output_is_unknown_sentinel() {
        let out = RawClassification::Ranked(vec![]);
        let result = normalize_fake_news(&out);
        assert_eq!(result.label, UNKNOWN_LABEL);
        assert_eq!(result.score, 0.0);

        let nested = RawClassification::Nested(vec![]);
        assert_eq!(normalize_hate_speech(&nested).label, UNKNOWN_LABEL);
    }

    #[test]
    fn test_toxicity_primary_label_lowercases() {
        let out = RawClassification::Nested(vec![vec![raw("TOXIC", 0.98), raw("insult", 0.4)]]);
        assert_eq!(toxicity_primary_label(&out), "toxic");
    }

    #[test]
    fn test_normalize_dispatch() {
        let out = RawClassification::Single(raw("LABEL_2", 0.8));
        match normalize(&out, ClassifierKind::FakeNews) {
            NormalizedRecord::Judgement(j) => assert_eq!(j.label, "real"),
            other => panic!("expected judgement, got {other:?}"),
        }
        match normalize(&out, ClassifierKind::Toxicity) {
            NormalizedRecord::Scores(m) => assert_eq!(m["label_2"], 0.8),
            other => panic!("expected scores, got {other:?}"),
        }
    }
}
