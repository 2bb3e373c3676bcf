use std::cmp::Ordering;

use crate::config::BibFilterConfig;
use crate::geometry::{QuadBox, quad_iou};
use crate::models::{BibCandidate, BibDetection, DetectionSource};

/// An OCR hit that survived the confidence floor of its pass, before
/// validation and overlap resolution. Still in pixel space.
#[derive(Debug, Clone)]
pub struct BibHit {
    pub quad: QuadBox,
    pub text: String,
    pub confidence: f32,
    pub source: DetectionSource,
    /// Index into the photo's candidate list for region-pass hits.
    pub candidate: Option<usize>,
}

/// Bib-number grammar: ASCII digits only, 1-4 of them, no leading zero,
/// value 1-9999.
pub fn is_valid_bib_number(text: &str) -> bool {
    if text.is_empty() || text.len() > 4 {
        return false;
    }
    if !text.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }
    if text.starts_with('0') {
        return false;
    }
    matches!(text.parse::<u32>(), Ok(1..=9999))
}

/// Stage C: keep hits that match the bib grammar, and for region-pass hits
/// require the hit box to cover a minimum fraction of its candidate
/// region. Invalid text is silently excluded, not an error.
pub fn validate_hits(
    hits: Vec<BibHit>,
    candidates: &[BibCandidate],
    cfg: &BibFilterConfig,
) -> Vec<BibHit> {
    hits.into_iter()
        .filter(|hit| {
            if !is_valid_bib_number(&hit.text) {
                return false;
            }
            if let Some(idx) = hit.candidate {
                let Some(candidate) = candidates.get(idx) else {
                    return false;
                };
                let region_area = candidate.region.bbox_area() as f32;
                if region_area <= 0.0 {
                    return false;
                }
                return hit.quad.area() >= cfg.min_region_area_fraction * region_area;
            }
            true
        })
        .collect()
}

/// Stage D: exhaustive pairwise overlap resolution. Hits are put into a
/// canonical order first so the surviving set does not depend on input
/// ordering; the suppression loop repeats until no pair overlaps above the
/// threshold.
pub fn resolve_overlaps(mut hits: Vec<BibHit>, cfg: &BibFilterConfig) -> Vec<BibHit> {
    hits.sort_by(canonical_order);

    loop {
        let mut suppressed = None;
        'scan: for i in 0..hits.len() {
            for j in (i + 1)..hits.len() {
                if quad_iou(&hits[i].quad, &hits[j].quad) >= cfg.overlap_iou {
                    suppressed = Some(if first_wins(&hits[i], &hits[j], cfg) { j } else { i });
                    break 'scan;
                }
            }
        }
        match suppressed {
            Some(idx) => {
                hits.remove(idx);
            }
            None => break,
        }
    }
    hits
}

/// Decide which of two overlapping hits survives; true keeps `a`.
///
/// A substring pair ("6" inside "620") prefers the longer read unless the
/// shorter read's confidence beats it by the configured ratio, which
/// recovers OCR misreads that glued extra digits onto a correct shorter
/// read. Otherwise more digits win, then higher confidence.
fn first_wins(a: &BibHit, b: &BibHit, cfg: &BibFilterConfig) -> bool {
    if a.text != b.text {
        let (longer_is_a, longer, shorter) = if a.text.len() > b.text.len() {
            (true, a, b)
        } else {
            (false, b, a)
        };
        if longer.text.len() != shorter.text.len() && longer.text.contains(shorter.text.as_str()) {
            let shorter_wins =
                shorter.confidence >= longer.confidence * cfg.substring_confidence_ratio;
            return longer_is_a != shorter_wins;
        }
    }

    match a.text.len().cmp(&b.text.len()) {
        Ordering::Greater => true,
        Ordering::Less => false,
        // Same digit count: higher confidence, then canonical order.
        Ordering::Equal => a.confidence >= b.confidence,
    }
}

/// Total order making overlap resolution independent of input ordering.
fn canonical_order(a: &BibHit, b: &BibHit) -> Ordering {
    b.text
        .len()
        .cmp(&a.text.len())
        .then(b.confidence.total_cmp(&a.confidence))
        .then_with(|| a.text.cmp(&b.text))
        .then(a.quad.corners[0][1].total_cmp(&b.quad.corners[0][1]))
        .then(a.quad.corners[0][0].total_cmp(&b.quad.corners[0][0]))
}

/// Convert surviving hits into stored detections with normalized boxes.
pub fn into_detections(hits: Vec<BibHit>, img_w: u32, img_h: u32) -> Vec<BibDetection> {
    hits.into_iter()
        .filter_map(|hit| {
            let bbox = hit.quad.bounding_rect(img_w, img_h).ok()?;
            Some(BibDetection {
                text: hit.text,
                confidence: hit.confidence,
                bbox,
                source: hit.source,
                candidate: hit.candidate,
            })
        })
        .collect()
}
