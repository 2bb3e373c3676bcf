use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::config::MatchingConfig;
use crate::models::{DetectionResult, PhotoGroundTruth};

use super::matching::{MatchOutcome, match_boxes};

/// TP/FP/FN counts for one entity type. Derived rates are methods so
/// archived runs only store the counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scorecard {
    pub true_positives: u32,
    pub false_positives: u32,
    pub false_negatives: u32,
}

impl Scorecard {
    pub fn new(tp: u32, fp: u32, fn_count: u32) -> Self {
        Self {
            true_positives: tp,
            false_positives: fp,
            false_negatives: fn_count,
        }
    }

    fn from_outcome(outcome: &MatchOutcome) -> Self {
        Self::new(
            outcome.tp() as u32,
            outcome.fp() as u32,
            outcome.fn_count() as u32,
        )
    }

    pub fn add(&mut self, other: &Scorecard) {
        self.true_positives += other.true_positives;
        self.false_positives += other.false_positives;
        self.false_negatives += other.false_negatives;
    }

    /// `tp / (tp + fp)`, 0 when the denominator is 0 - never NaN.
    pub fn precision(&self) -> f64 {
        ratio(
            self.true_positives as f64,
            (self.true_positives + self.false_positives) as f64,
        )
    }

    /// `tp / (tp + fn)`, 0 when the denominator is 0.
    pub fn recall(&self) -> f64 {
        ratio(
            self.true_positives as f64,
            (self.true_positives + self.false_negatives) as f64,
        )
    }

    /// Harmonic mean of precision and recall, 0 when either is 0.
    pub fn f1(&self) -> f64 {
        let p = self.precision();
        let r = self.recall();
        ratio(2.0 * p * r, p + r)
    }
}

fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

/// Exact-equality text accuracy over TP-matched bib pairs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecognitionCard {
    pub matched: u32,
    pub correct: u32,
}

impl RecognitionCard {
    pub fn add(&mut self, other: &RecognitionCard) {
        self.matched += other.matched;
        self.correct += other.correct;
    }

    pub fn accuracy(&self) -> f64 {
        ratio(self.correct as f64, self.matched as f64)
    }
}

/// Legacy number-only comparison for ground truth without coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhotoStatus {
    /// All expected numbers found, no extras.
    Pass,
    /// Some overlap between expected and predicted.
    Partial,
    /// No overlap at all.
    Miss,
}

/// Everything scored for one photo.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhotoReport {
    pub photo: String,
    pub bib_localization: Scorecard,
    pub bib_recognition: RecognitionCard,
    pub face_detection: Scorecard,
    pub link_prediction: Scorecard,
    pub status: PhotoStatus,
}

/// Aggregate scorecards for a whole run; counts are summed across photos
/// before rates are derived.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregateScores {
    pub bib_localization: Scorecard,
    pub bib_recognition: RecognitionCard,
    pub face_detection: Scorecard,
    pub link_prediction: Scorecard,
}

impl AggregateScores {
    pub fn accumulate(&mut self, report: &PhotoReport) {
        self.bib_localization.add(&report.bib_localization);
        self.bib_recognition.add(&report.bib_recognition);
        self.face_detection.add(&report.face_detection);
        self.link_prediction.add(&report.link_prediction);
    }
}

/// Builds the per-photo and aggregate scorecards from matching outcomes.
pub struct ScoringEngine {
    cfg: MatchingConfig,
}

impl ScoringEngine {
    pub fn new(cfg: MatchingConfig) -> Self {
        Self { cfg }
    }

    /// Score one photo's predictions against its ground truth. A photo
    /// with no prediction scores against `DetectionResult::default()`,
    /// which turns every scored ground-truth box into an FN.
    pub fn score_photo(
        &self,
        photo: &str,
        pred: &DetectionResult,
        gt: &PhotoGroundTruth,
    ) -> PhotoReport {
        let threshold = self.cfg.iou_threshold;

        // Unscored scope tags are invisible to matching entirely: never
        // FN, never matchable. Index maps recover original gt indices for
        // link scoring.
        let scored_bibs: Vec<usize> = gt
            .bibs
            .iter()
            .enumerate()
            .filter(|(_, b)| b.scope.is_scored())
            .map(|(i, _)| i)
            .collect();
        let bib_gt_boxes: Vec<_> = scored_bibs.iter().map(|&i| gt.bibs[i].bbox).collect();
        let bib_preds: Vec<_> = pred.bibs.iter().map(|b| (b.bbox, b.confidence)).collect();
        let bib_outcome = match_boxes(&bib_preds, &bib_gt_boxes, threshold);

        let scored_faces: Vec<usize> = gt
            .faces
            .iter()
            .enumerate()
            .filter(|(_, f)| f.scope.is_scored())
            .map(|(i, _)| i)
            .collect();
        let face_gt_boxes: Vec<_> = scored_faces.iter().map(|&i| gt.faces[i].bbox).collect();
        let face_preds: Vec<_> = pred.faces.iter().map(|f| (f.bbox, f.confidence)).collect();
        let face_outcome = match_boxes(&face_preds, &face_gt_boxes, threshold);

        // Recognition: exact string equality over TP-matched bib pairs.
        // An unlabeled ground-truth box still counts in the denominator.
        let mut recognition = RecognitionCard::default();
        for pair in &bib_outcome.pairs {
            recognition.matched += 1;
            let gt_label = gt.bibs[scored_bibs[pair.ground_truth]].label.as_deref();
            if gt_label == Some(pred.bibs[pair.prediction].text.as_str()) {
                recognition.correct += 1;
            }
        }

        let link_prediction =
            score_links(pred, gt, &bib_outcome, &face_outcome, &scored_bibs, &scored_faces);

        PhotoReport {
            photo: photo.to_string(),
            bib_localization: Scorecard::from_outcome(&bib_outcome),
            bib_recognition: recognition,
            face_detection: Scorecard::from_outcome(&face_outcome),
            link_prediction,
            status: legacy_status(pred, gt),
        }
    }

    /// Score a whole run; photos present in ground truth with no
    /// prediction are handled by the caller passing an empty result.
    pub fn aggregate(reports: &[PhotoReport]) -> AggregateScores {
        let mut totals = AggregateScores::default();
        for report in reports {
            totals.accumulate(report);
        }
        totals
    }
}

/// A predicted link is TP only when both legs independently matched and
/// the ground truth links those same indices. Ground-truth links not
/// reproduced that way are FN.
fn score_links(
    pred: &DetectionResult,
    gt: &PhotoGroundTruth,
    bib_outcome: &MatchOutcome,
    face_outcome: &MatchOutcome,
    scored_bibs: &[usize],
    scored_faces: &[usize],
) -> Scorecard {
    let gt_links: BTreeSet<(usize, usize)> = gt.links.iter().copied().collect();
    let mut reproduced: BTreeSet<(usize, usize)> = BTreeSet::new();
    let mut tp = 0u32;
    let mut fp = 0u32;

    for link in &pred.links {
        let bib_leg = bib_outcome
            .matched_gt(link.bib_index)
            .map(|filtered| scored_bibs[filtered]);
        let face_leg = face_outcome
            .matched_gt(link.face_index)
            .map(|filtered| scored_faces[filtered]);

        match (bib_leg, face_leg) {
            // A second claim on an already-reproduced pair is an FP.
            (Some(gb), Some(gf)) if gt_links.contains(&(gb, gf)) && reproduced.insert((gb, gf)) => {
                tp += 1;
            }
            _ => fp += 1,
        }
    }

    let fn_count = gt_links.len() as u32 - reproduced.len() as u32;
    Scorecard::new(tp, fp, fn_count)
}

/// Set-intersection fallback for ground truth that has not been upgraded
/// with coordinates. Labels of scored boxes stand in when the legacy
/// number list is absent.
fn legacy_status(pred: &DetectionResult, gt: &PhotoGroundTruth) -> PhotoStatus {
    let expected: BTreeSet<&str> = if gt.expected_numbers.is_empty() {
        gt.bibs
            .iter()
            .filter(|b| b.scope.is_scored())
            .filter_map(|b| b.label.as_deref())
            .collect()
    } else {
        gt.expected_numbers.iter().map(String::as_str).collect()
    };
    let predicted: BTreeSet<&str> = pred.bibs.iter().map(|b| b.text.as_str()).collect();

    if expected == predicted {
        // Includes the empty/empty case: nothing missed, nothing extra.
        PhotoStatus::Pass
    } else if expected.intersection(&predicted).next().is_some() {
        PhotoStatus::Partial
    } else {
        PhotoStatus::Miss
    }
}
