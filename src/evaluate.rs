//! Calibration against hand-labeled examples.
//!
//! Scores are bucketed into the same three-way labels annotators use, then
//! each label column gets accuracy, per-class precision/recall/F1, macro F1
//! and a confusion matrix.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::pipeline::ScoringPipeline;
use crate::render::render_evaluation_markdown;
use crate::storage::write_json;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelThresholds {
    pub sentiment_positive: f64,       // > 0.1
    pub sentiment_negative: f64,       // < -0.1
    pub opinion_moderate: f64,         // >= 0.34
    pub opinion_strong: f64,           // >= 0.67
    pub plausibility_implausible: f64, // < 0.4
    pub plausibility_plausible: f64,   // > 0.6
}

impl Default for LabelThresholds {
    fn default() -> Self {
        Self {
            sentiment_positive: 0.1,
            sentiment_negative: -0.1,
            opinion_moderate: 0.34,
            opinion_strong: 0.67,
            plausibility_implausible: 0.4,
            plausibility_plausible: 0.6,
        }
    }
}

impl LabelThresholds {
    pub fn sentiment(&self, polarity: f64) -> &'static str {
        if polarity > self.sentiment_positive {
            "Positive"
        } else if polarity < self.sentiment_negative {
            "Negative"
        } else {
            "Neutral"
        }
    }

    pub fn opinion(&self, strength: f64) -> &'static str {
        if strength >= self.opinion_strong {
            "Strong"
        } else if strength >= self.opinion_moderate {
            "Moderate"
        } else {
            "Weak"
        }
    }

    pub fn plausibility(&self, score: f64) -> &'static str {
        if score < self.plausibility_implausible {
            "Implausible"
        } else if score > self.plausibility_plausible {
            "Plausible"
        } else {
            "Ambiguous"
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledExample {
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub expected_sentiment: Option<String>,
    #[serde(default)]
    pub expected_opinion: Option<String>,
    #[serde(default)]
    pub expected_plausibility: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub label: String,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnReport {
    pub column: String,
    pub total: usize,
    pub correct: usize,
    pub accuracy: f64,
    pub macro_f1: f64,
    pub classes: Vec<ClassMetrics>,
    /// Row = actual, column = predicted, both in `labels` order.
    pub labels: Vec<String>,
    pub confusion: Vec<Vec<usize>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionError {
    pub row_index: usize,
    pub column: String,
    pub body: String,
    pub actual: String,
    pub predicted: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub input: String,
    pub strategy: String,
    pub lexicon_fingerprint: String,
    pub examples: usize,
    /// Examples without a body, or whose scoring failed.
    pub skipped: usize,
    pub columns: Vec<ColumnReport>,
    pub errors: Vec<PredictionError>,
}

pub const SENTIMENT_COLUMN: &str = "Sentiment";
pub const OPINION_COLUMN: &str = "Opinion Strength";
pub const PLAUSIBILITY_COLUMN: &str = "Plausibility";

/// "positive " -> "Positive", so hand-typed labels compare equal.
fn canonical_label(label: &str) -> String {
    let trimmed = label.trim().to_lowercase();
    let mut chars = trimmed.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

/// Metrics for one label column given (actual, predicted) pairs.
pub fn evaluate_column(column: &str, pairs: &[(String, String)]) -> ColumnReport {
    let labels: Vec<String> = pairs
        .iter()
        .flat_map(|(a, p)| [a.clone(), p.clone()])
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let index = |l: &str| labels.iter().position(|x| x == l).unwrap_or_default();

    let mut confusion = vec![vec![0usize; labels.len()]; labels.len()];
    for (actual, predicted) in pairs {
        confusion[index(actual)][index(predicted)] += 1;
    }

    let classes: Vec<ClassMetrics> = labels
        .iter()
        .enumerate()
        .map(|(i, label)| {
            let tp = confusion[i][i];
            let predicted: usize = confusion.iter().map(|row| row[i]).sum();
            let support: usize = confusion[i].iter().sum();
            let precision = ratio(tp, predicted);
            let recall = ratio(tp, support);
            let f1 = if precision + recall == 0.0 {
                0.0
            } else {
                2.0 * precision * recall / (precision + recall)
            };
            ClassMetrics {
                label: label.clone(),
                precision,
                recall,
                f1,
                support,
            }
        })
        .collect();

    let correct = pairs.iter().filter(|(a, p)| a == p).count();
    let macro_f1 = if classes.is_empty() {
        0.0
    } else {
        classes.iter().map(|c| c.f1).sum::<f64>() / classes.len() as f64
    };

    ColumnReport {
        column: column.to_string(),
        total: pairs.len(),
        correct,
        accuracy: ratio(correct, pairs.len()),
        macro_f1,
        classes,
        labels,
        confusion,
    }
}

/// Score every example and compare against whichever expected labels it carries.
pub fn evaluate_examples(
    pipeline: &ScoringPipeline,
    examples: &[LabeledExample],
    thresholds: &LabelThresholds,
    input: &str,
) -> EvaluationReport {
    let start = std::time::Instant::now();
    let mut sentiment = Vec::new();
    let mut opinion = Vec::new();
    let mut plausibility = Vec::new();
    let mut errors = Vec::new();
    let mut skipped = 0usize;

    for (row_index, ex) in examples.iter().enumerate() {
        let body = ex.body.as_deref().unwrap_or_default();
        let scores = match pipeline.score_text(body) {
            Ok(Some(scores)) => scores,
            Ok(None) => {
                skipped += 1;
                continue;
            }
            Err(e) => {
                warn!("Example left unscored - row={}, error={}", row_index, e);
                skipped += 1;
                continue;
            }
        };

        let columns = [
            (
                SENTIMENT_COLUMN,
                &ex.expected_sentiment,
                thresholds.sentiment(scores.sentiment_polarity),
                &mut sentiment,
            ),
            (
                OPINION_COLUMN,
                &ex.expected_opinion,
                thresholds.opinion(scores.opinion_strength),
                &mut opinion,
            ),
            (
                PLAUSIBILITY_COLUMN,
                &ex.expected_plausibility,
                thresholds.plausibility(scores.plausibility_score),
                &mut plausibility,
            ),
        ];
        for (column, expected, predicted, pairs) in columns {
            let Some(expected) = expected.as_deref().filter(|e| !e.trim().is_empty()) else {
                continue;
            };
            let actual = canonical_label(expected);
            if actual != predicted {
                errors.push(PredictionError {
                    row_index,
                    column: column.to_string(),
                    body: body.to_string(),
                    actual: actual.clone(),
                    predicted: predicted.to_string(),
                });
            }
            pairs.push((actual, predicted.to_string()));
        }
    }

    let columns = vec![
        evaluate_column(SENTIMENT_COLUMN, &sentiment),
        evaluate_column(OPINION_COLUMN, &opinion),
        evaluate_column(PLAUSIBILITY_COLUMN, &plausibility),
    ];
    for c in &columns {
        debug!(
            "Column evaluated - column={}, total={}, accuracy={:.3}, macro_f1={:.3}",
            c.column, c.total, c.accuracy, c.macro_f1
        );
    }
    info!(
        "Evaluation completed - examples={}, skipped={}, errors={}, duration={:.2}s",
        examples.len(),
        skipped,
        errors.len(),
        start.elapsed().as_secs_f32()
    );

    EvaluationReport {
        input: input.to_string(),
        strategy: pipeline.strategy().as_str().to_string(),
        lexicon_fingerprint: pipeline.lexicon().fingerprint().to_string(),
        examples: examples.len(),
        skipped,
        columns,
        errors,
    }
}

pub fn read_examples(path: &Path) -> Result<Vec<LabeledExample>> {
    let raw = std::fs::read(path).with_context(|| format!("Reading labeled examples from {}", path.display()))?;
    serde_json::from_slice(&raw).with_context(|| format!("Decoding labeled examples in {}", path.display()))
}

/// Writes `report.json`, `report.md` and `prediction_errors.json` into
/// `<out_root>/<input-stem>_<timestamp>/` and returns that directory.
pub fn write_report(report: &EvaluationReport, out_root: &Path, input_path: &Path) -> Result<PathBuf> {
    let stem = input_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "examples".to_string());
    let run_dir = out_root.join(format!("{}_{}", stem, Local::now().format("%Y%m%d_%H%M%S")));
    std::fs::create_dir_all(&run_dir).with_context(|| format!("Creating {}", run_dir.display()))?;

    write_json(&run_dir.join("report.json"), report)?;
    std::fs::write(run_dir.join("report.md"), render_evaluation_markdown(report))
        .with_context(|| format!("Writing report.md in {}", run_dir.display()))?;
    write_json(&run_dir.join("prediction_errors.json"), &report.errors)?;

    info!("Evaluation report written - directory={}", run_dir.display());
    Ok(run_dir)
}
