use image::GrayImage;

use crate::config::CandidateConfig;
use crate::models::{BibCandidate, Region, RejectReason};

use super::{preprocessing, regions};

/// Stage A: scan an image for bright, roughly rectangular regions that
/// could be bib plates. Every surviving region comes back as a
/// [`BibCandidate`], rejected ones with a reason attached.
pub fn search_candidates(gray: &GrayImage, cfg: &CandidateConfig) -> Vec<BibCandidate> {
    let blurred = preprocessing::apply_blur(gray, cfg.blur_sigma);
    let binary = preprocessing::binarize_bright(&blurred, cfg.binarize_threshold);
    let found = regions::find_regions(&binary, cfg.min_area_px);

    found
        .into_iter()
        .map(|region| evaluate_region(region, gray, cfg))
        .collect()
}

/// Measure one region and decide whether it passes the candidate filters.
/// Checks run cheapest-first; the first failure is recorded.
pub fn evaluate_region(region: Region, gray: &GrayImage, cfg: &CandidateConfig) -> BibCandidate {
    let (img_w, img_h) = gray.dimensions();
    let bbox = region.to_rect(img_w, img_h);
    let aspect = region.aspect_ratio();
    let (median, mean) = region_brightness(gray, &region);

    let relative_area = if img_w == 0 || img_h == 0 {
        0.0
    } else {
        region.bbox_area() as f32 / (img_w as f32 * img_h as f32)
    };

    let reject = if aspect < cfg.min_aspect || aspect > cfg.max_aspect {
        Some(RejectReason::AspectOutOfBand)
    } else if relative_area < cfg.min_relative_area || relative_area > cfg.max_relative_area {
        Some(RejectReason::RelativeSizeOutOfBand)
    } else if median < cfg.min_median_brightness {
        Some(RejectReason::LowMedianBrightness)
    } else if mean < cfg.min_mean_brightness {
        Some(RejectReason::LowMeanBrightness)
    } else {
        None
    };

    BibCandidate {
        region,
        bbox,
        median_brightness: median,
        mean_brightness: mean,
        aspect_ratio: aspect,
        reject,
    }
}

/// Median and mean brightness over a region's bounding box.
pub fn region_brightness(gray: &GrayImage, region: &Region) -> (f32, f32) {
    let (img_w, img_h) = gray.dimensions();
    let mut values: Vec<u8> = Vec::with_capacity(region.bbox_area() as usize);

    for y in region.min_y..=region.max_y.min(img_h.saturating_sub(1)) {
        for x in region.min_x..=region.max_x.min(img_w.saturating_sub(1)) {
            values.push(gray.get_pixel(x, y)[0]);
        }
    }

    if values.is_empty() {
        return (0.0, 0.0);
    }

    let sum: u64 = values.iter().map(|&v| v as u64).sum();
    let mean = sum as f32 / values.len() as f32;

    values.sort_unstable();
    let mid = values.len() / 2;
    let median = if values.len() % 2 == 0 {
        (values[mid - 1] as f32 + values[mid] as f32) / 2.0
    } else {
        values[mid] as f32
    };

    (median, mean)
}
