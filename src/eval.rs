// Evaluation engine — scores toxicity predictions against ground truth.
//
// Each sample runs through the same gate + normalization path as live
// analysis (Analyzer::predict_toxicity_label), so evaluation can never
// diverge from what the pipeline actually produces. Metrics are the
// standard per-class precision/recall/F1 with macro and
// support-weighted summaries, all zero-division-safe: a class that
// never appears on one side reports 0.0, never an error.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};

use crate::pipeline::Analyzer;

/// One labelled evaluation sample.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvalSample {
    pub text: String,
    pub true_label: String,
}

/// Precision/recall/F1 for one class (or one averaging strategy).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    /// Number of ground-truth samples carrying this label.
    pub support: usize,
}

/// The full evaluation report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvalReport {
    pub per_class: BTreeMap<String, ClassMetrics>,
    pub accuracy: f64,
    pub macro_avg: ClassMetrics,
    pub weighted_avg: ClassMetrics,
    pub total: usize,
}

/// Run the toxicity classifier over every sample and score the
/// predictions. Classifier failures abort the run; unrecognized labels
/// are counted as mismatches, not errors.
pub async fn evaluate(
    analyzer: &Analyzer,
    samples: &[EvalSample],
    concurrency: usize,
    show_progress: bool,
) -> Result<EvalReport> {
    let pb = if show_progress {
        let pb = ProgressBar::new(samples.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("  Evaluating [{bar:30}] {pos}/{len} ({eta})")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        pb
    } else {
        ProgressBar::hidden()
    };

    // buffered (not buffer_unordered) keeps pair order aligned with the
    // input; metrics don't depend on order, but determinism is free.
    // Each future owns its sample: borrowing the iteration item from a
    // closure-built async block leaves the combined future with a
    // higher-ranked bound rustc can't prove Send at the handler boundary.
    let predictions: Vec<Result<String>> = stream::iter(samples.to_vec())
        .map(|sample| {
            let pb = &pb;
            async move {
                let predicted = analyzer
                    .predict_toxicity_label(&sample.text)
                    .await
                    .with_context(|| format!("Failed to classify sample: {}", sample.text))?;
                pb.inc(1);
                Ok(predicted)
            }
        })
        .buffered(concurrency.max(1))
        .collect()
        .await;
    pb.finish_and_clear();

    let mut pairs = Vec::with_capacity(samples.len());
    for (sample, predicted) in samples.iter().zip(predictions) {
        pairs.push((sample.true_label.to_lowercase(), predicted?.to_lowercase()));
    }

    Ok(compute_metrics(&pairs))
}

/// Compute the report from (true, predicted) label pairs. Pure.
pub fn compute_metrics(pairs: &[(String, String)]) -> EvalReport {
    let total = pairs.len();

    // Class set = every label seen on either side
    let mut classes: Vec<&str> = pairs
        .iter()
        .flat_map(|(t, p)| [t.as_str(), p.as_str()])
        .collect();
    classes.sort_unstable();
    classes.dedup();

    let mut per_class = BTreeMap::new();
    for class in classes {
        let tp = pairs.iter().filter(|(t, p)| t == class && p == class).count();
        let fp = pairs.iter().filter(|(t, p)| t != class && p == class).count();
        let fn_ = pairs.iter().filter(|(t, p)| t == class && p != class).count();

        let precision = safe_ratio(tp, tp + fp);
        let recall = safe_ratio(tp, tp + fn_);
        per_class.insert(
            class.to_string(),
            ClassMetrics {
                precision,
                recall,
                f1: f1_score(precision, recall),
                support: tp + fn_,
            },
        );
    }

    let accuracy = safe_ratio(pairs.iter().filter(|(t, p)| t == p).count(), total);

    EvalReport {
        accuracy,
        macro_avg: macro_average(&per_class, total),
        weighted_avg: weighted_average(&per_class, total),
        per_class,
        total,
    }
}

fn safe_ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

fn f1_score(precision: f64, recall: f64) -> f64 {
    if precision + recall == 0.0 {
        0.0
    } else {
        2.0 * precision * recall / (precision + recall)
    }
}

/// Unweighted mean over classes.
fn macro_average(per_class: &BTreeMap<String, ClassMetrics>, total: usize) -> ClassMetrics {
    let n = per_class.len();
    if n == 0 {
        return ClassMetrics {
            precision: 0.0,
            recall: 0.0,
            f1: 0.0,
            support: 0,
        };
    }
    ClassMetrics {
        precision: per_class.values().map(|m| m.precision).sum::<f64>() / n as f64,
        recall: per_class.values().map(|m| m.recall).sum::<f64>() / n as f64,
        f1: per_class.values().map(|m| m.f1).sum::<f64>() / n as f64,
        support: total,
    }
}

/// Mean over classes weighted by ground-truth support.
fn weighted_average(per_class: &BTreeMap<String, ClassMetrics>, total: usize) -> ClassMetrics {
    if total == 0 {
        return ClassMetrics {
            precision: 0.0,
            recall: 0.0,
            f1: 0.0,
            support: 0,
        };
    }
    let weight = |support: usize| support as f64 / total as f64;
    ClassMetrics {
        precision: per_class
            .values()
            .map(|m| m.precision * weight(m.support))
            .sum(),
        recall: per_class.values().map(|m| m.recall * weight(m.support)).sum(),
        f1: per_class.values().map(|m| m.f1 * weight(m.support)).sum(),
        support: total,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(t: &str, p: &str) -> (String, String) {
        (t.to_string(), p.to_string())
    }

    #[test]
    fn test_perfect_predictions_score_one() {
        let pairs = vec![
            pair("toxic", "toxic"),
            pair("toxic", "toxic"),
            pair("neutral", "neutral"),
        ];
        let report = compute_metrics(&pairs);
        assert_eq!(report.accuracy, 1.0);
        for (class, m) in &report.per_class {
            assert_eq!(m.precision, 1.0, "precision for {class}");
            assert_eq!(m.recall, 1.0, "recall for {class}");
            assert_eq!(m.f1, 1.0, "f1 for {class}");
        }
        assert_eq!(report.macro_avg.f1, 1.0);
        assert_eq!(report.weighted_avg.f1, 1.0);
    }

    #[test]
    fn test_never_predicted_class_scores_zero_not_error() {
        // "severe" is always misclassified as "toxic"
        let pairs = vec![pair("severe", "toxic"), pair("toxic", "toxic")];
        let report = compute_metrics(&pairs);
        let severe = &report.per_class["severe"];
        assert_eq!(severe.precision, 0.0);
        assert_eq!(severe.recall, 0.0);
        assert_eq!(severe.f1, 0.0);
        assert_eq!(severe.support, 1);
    }

    #[test]
    fn test_predicted_only_class_has_zero_support() {
        let pairs = vec![pair("toxic", "unknown")];
        let report = compute_metrics(&pairs);
        let unknown = &report.per_class["unknown"];
        assert_eq!(unknown.support, 0);
        assert_eq!(unknown.precision, 0.0);
    }

    #[test]
    fn test_mixed_precision_recall() {
        // toxic: tp=1 (t1), fp=1 (t3), fn=1 (t2)
        let pairs = vec![
            pair("toxic", "toxic"),
            pair("toxic", "neutral"),
            pair("neutral", "toxic"),
            pair("neutral", "neutral"),
        ];
        let report = compute_metrics(&pairs);
        let toxic = &report.per_class["toxic"];
        assert!((toxic.precision - 0.5).abs() < f64::EPSILON);
        assert!((toxic.recall - 0.5).abs() < f64::EPSILON);
        assert!((toxic.f1 - 0.5).abs() < f64::EPSILON);
        assert!((report.accuracy - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_weighted_average_respects_support() {
        // 3x "a" all correct, 1x "b" all wrong
        let pairs = vec![
            pair("a", "a"),
            pair("a", "a"),
            pair("a", "a"),
            pair("b", "a"),
        ];
        let report = compute_metrics(&pairs);
        // weighted recall = (1.0 * 3/4) + (0.0 * 1/4) = 0.75
        assert!((report.weighted_avg.recall - 0.75).abs() < 1e-9);
        // macro recall = (1.0 + 0.0) / 2 = 0.5
        assert!((report.macro_avg.recall - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_empty_input_is_all_zero() {
        let report = compute_metrics(&[]);
        assert_eq!(report.total, 0);
        assert_eq!(report.accuracy, 0.0);
        assert!(report.per_class.is_empty());
    }
}
