//! Classification metrics for binary fraud labels.
//!
//! Scores are positive-class probabilities; labels and predictions are 0/1.

use crate::error::{FraudError, Result};
use serde::Serialize;
use std::fmt;

/// Confusion matrix counts for the positive class
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Confusion {
    pub tp: usize,
    pub fp: usize,
    pub fn_: usize,
    pub tn: usize,
}

impl Confusion {
    pub fn new(y_true: &[u8], y_pred: &[u8], positive: u8) -> Self {
        let mut counts = Confusion::default();
        for (&t, &p) in y_true.iter().zip(y_pred) {
            match (t == positive, p == positive) {
                (true, true) => counts.tp += 1,
                (false, true) => counts.fp += 1,
                (true, false) => counts.fn_ += 1,
                (false, false) => counts.tn += 1,
            }
        }
        counts
    }

    /// TP / (TP + FP), 0 when nothing was predicted positive
    pub fn precision(&self) -> f64 {
        ratio(self.tp, self.tp + self.fp)
    }

    /// TP / (TP + FN), 0 when there are no positives
    pub fn recall(&self) -> f64 {
        ratio(self.tp, self.tp + self.fn_)
    }

    pub fn f1(&self) -> f64 {
        let (p, r) = (self.precision(), self.recall());
        if p + r == 0.0 {
            0.0
        } else {
            2.0 * p * r / (p + r)
        }
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

/// Flag every score `>= threshold`
pub fn apply_threshold(scores: &[f64], threshold: f64) -> Vec<u8> {
    scores.iter().map(|&s| u8::from(s >= threshold)).collect()
}

/// F1 score of the positive class
pub fn f1_score(y_true: &[u8], y_pred: &[u8]) -> f64 {
    Confusion::new(y_true, y_pred, 1).f1()
}

fn class_counts(y_true: &[u8]) -> (usize, usize) {
    let positives = y_true.iter().filter(|&&y| y == 1).count();
    (positives, y_true.len() - positives)
}

/// Area under the precision-recall curve as average precision.
///
/// `sum_k (R_k - R_{k-1}) * P_k` over distinct score thresholds, highest first.
pub fn average_precision(y_true: &[u8], scores: &[f64]) -> Result<f64> {
    let (positives, _) = class_counts(y_true);
    if positives == 0 {
        return Err(FraudError::UndefinedMetric {
            metric: "PR-AUC",
            reason: "no positive labels".into(),
        });
    }

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));

    let mut ap = 0.0;
    let mut tp = 0usize;
    let mut fp = 0usize;
    let mut prev_recall = 0.0;

    for (k, &i) in order.iter().enumerate() {
        if y_true[i] == 1 {
            tp += 1;
        } else {
            fp += 1;
        }
        let last_of_tie = order
            .get(k + 1)
            .map_or(true, |&next| scores[next] != scores[i]);
        if last_of_tie {
            let recall = tp as f64 / positives as f64;
            let precision = tp as f64 / (tp + fp) as f64;
            ap += (recall - prev_recall) * precision;
            prev_recall = recall;
        }
    }

    Ok(ap)
}

/// Area under the ROC curve, with tied scores sharing their average rank.
pub fn roc_auc(y_true: &[u8], scores: &[f64]) -> Result<f64> {
    let (positives, negatives) = class_counts(y_true);
    if positives == 0 || negatives == 0 {
        return Err(FraudError::UndefinedMetric {
            metric: "ROC-AUC",
            reason: "only one class present in labels".into(),
        });
    }

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[a].total_cmp(&scores[b]));

    let mut positive_rank_sum = 0.0;
    let mut start = 0;
    while start < order.len() {
        let mut end = start;
        while end + 1 < order.len() && scores[order[end + 1]] == scores[order[start]] {
            end += 1;
        }
        // Ranks are 1-based; ties get the mean of start+1 ..= end+1.
        let avg_rank = (start + end) as f64 / 2.0 + 1.0;
        let tied_positives = order[start..=end]
            .iter()
            .filter(|&&i| y_true[i] == 1)
            .count();
        positive_rank_sum += avg_rank * tied_positives as f64;
        start = end + 1;
    }

    let p = positives as f64;
    let n = negatives as f64;
    Ok((positive_rank_sum - p * (p + 1.0) / 2.0) / (p * n))
}

/// Per-class precision, recall, F1 and support
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ClassMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

/// Per-class breakdown with accuracy, macro and weighted averages
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationReport {
    pub classes: Vec<(u8, ClassMetrics)>,
    pub accuracy: f64,
    pub macro_avg: ClassMetrics,
    pub weighted_avg: ClassMetrics,
}

impl ClassificationReport {
    /// Report over every class present in either the labels or predictions
    pub fn new(y_true: &[u8], y_pred: &[u8]) -> Self {
        let mut labels: Vec<u8> = y_true.iter().chain(y_pred).copied().collect();
        labels.sort_unstable();
        labels.dedup();

        let classes: Vec<(u8, ClassMetrics)> = labels
            .iter()
            .map(|&label| {
                let confusion = Confusion::new(y_true, y_pred, label);
                (
                    label,
                    ClassMetrics {
                        precision: confusion.precision(),
                        recall: confusion.recall(),
                        f1: confusion.f1(),
                        support: confusion.tp + confusion.fn_,
                    },
                )
            })
            .collect();

        let total = y_true.len();
        let correct = y_true.iter().zip(y_pred).filter(|(t, p)| t == p).count();

        let k = classes.len().max(1) as f64;
        let macro_avg = ClassMetrics {
            precision: classes.iter().map(|(_, m)| m.precision).sum::<f64>() / k,
            recall: classes.iter().map(|(_, m)| m.recall).sum::<f64>() / k,
            f1: classes.iter().map(|(_, m)| m.f1).sum::<f64>() / k,
            support: total,
        };

        let weighted = |f: fn(&ClassMetrics) -> f64| {
            classes
                .iter()
                .map(|(_, m)| f(m) * m.support as f64)
                .sum::<f64>()
                / total.max(1) as f64
        };
        let weighted_avg = ClassMetrics {
            precision: weighted(|m| m.precision),
            recall: weighted(|m| m.recall),
            f1: weighted(|m| m.f1),
            support: total,
        };

        Self {
            classes,
            accuracy: ratio(correct, total),
            macro_avg,
            weighted_avg,
        }
    }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:>12} {:>9} {:>9} {:>9} {:>9}",
            "", "precision", "recall", "f1-score", "support"
        )?;
        writeln!(f)?;
        for (label, metrics) in &self.classes {
            write_row(f, &label.to_string(), metrics)?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "{:>12} {:>9} {:>9} {:>9.2} {:>9}",
            "accuracy", "", "", self.accuracy, self.macro_avg.support
        )?;
        write_row(f, "macro avg", &self.macro_avg)?;
        write_row(f, "weighted avg", &self.weighted_avg)
    }
}

fn write_row(f: &mut fmt::Formatter<'_>, name: &str, m: &ClassMetrics) -> fmt::Result {
    writeln!(
        f,
        "{:>12} {:>9.2} {:>9.2} {:>9.2} {:>9}",
        name, m.precision, m.recall, m.f1, m.support
    )
}
