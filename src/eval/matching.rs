use crate::geometry::{RectBox, iou};

/// One matched prediction/ground-truth pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchPair {
    pub prediction: usize,
    pub ground_truth: usize,
    pub iou: f32,
}

/// Outcome of one greedy matching pass. Indices refer to the slices the
/// caller passed in.
#[derive(Debug, Clone, Default)]
pub struct MatchOutcome {
    pub pairs: Vec<MatchPair>,
    pub unmatched_predictions: Vec<usize>,
    pub unmatched_ground_truth: Vec<usize>,
}

impl MatchOutcome {
    pub fn tp(&self) -> usize {
        self.pairs.len()
    }

    pub fn fp(&self) -> usize {
        self.unmatched_predictions.len()
    }

    pub fn fn_count(&self) -> usize {
        self.unmatched_ground_truth.len()
    }

    /// Ground-truth index a prediction was matched to, if any.
    pub fn matched_gt(&self, prediction: usize) -> Option<usize> {
        self.pairs
            .iter()
            .find(|p| p.prediction == prediction)
            .map(|p| p.ground_truth)
    }
}

/// Greedy IoU assignment between predictions and ground truth.
///
/// Predictions are processed in descending confidence order (stable on
/// ties, so the result is reproducible); each claims the best unmatched
/// ground-truth box whose IoU meets the threshold. This is deliberately
/// greedy rather than an optimal assignment - ties break by processing
/// order, and benchmark history depends on that behavior.
///
/// The caller passes only scored ground truth; degenerate ("no
/// coordinates yet") boxes are skipped here and never counted as FN.
pub fn match_boxes(
    predictions: &[(RectBox, f32)],
    ground_truth: &[RectBox],
    iou_threshold: f32,
) -> MatchOutcome {
    let mut order: Vec<usize> = (0..predictions.len()).collect();
    order.sort_by(|&a, &b| {
        predictions[b]
            .1
            .total_cmp(&predictions[a].1)
            .then(a.cmp(&b))
    });

    let usable: Vec<bool> = ground_truth.iter().map(|g| !g.is_degenerate()).collect();
    let mut gt_taken = vec![false; ground_truth.len()];
    let mut outcome = MatchOutcome::default();

    for pi in order {
        let (pred_box, _) = &predictions[pi];

        let mut best: Option<(usize, f32)> = None;
        for (gi, gt_box) in ground_truth.iter().enumerate() {
            if gt_taken[gi] || !usable[gi] {
                continue;
            }
            let overlap = iou(pred_box, gt_box);
            let better = match best {
                None => overlap > 0.0,
                Some((_, prev)) => overlap > prev,
            };
            if better {
                best = Some((gi, overlap));
            }
        }

        match best {
            Some((gi, overlap)) if overlap >= iou_threshold => {
                gt_taken[gi] = true;
                outcome.pairs.push(MatchPair {
                    prediction: pi,
                    ground_truth: gi,
                    iou: overlap,
                });
            }
            _ => outcome.unmatched_predictions.push(pi),
        }
    }

    for (gi, taken) in gt_taken.iter().enumerate() {
        if !taken && usable[gi] {
            outcome.unmatched_ground_truth.push(gi);
        }
    }

    outcome.unmatched_predictions.sort_unstable();
    outcome
}
