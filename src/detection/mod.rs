pub mod bibs;
pub mod candidates;
pub mod faces;
pub mod ocr;
pub mod preprocessing;
pub mod regions;
pub mod steps;

use image::DynamicImage;
use std::sync::Arc;

use crate::config::{BibFilterConfig, CandidateConfig};
use crate::models::{BibCandidate, BibDetection, DetectionSource};

use bibs::BibHit;
use ocr::TextReader;

/// Full bib detection pipeline for one photo: candidate search, per-region
/// OCR plus a stricter full-image fallback pass, grammar validation, and
/// overlap resolution.
pub struct BibFilterPipeline {
    candidates_cfg: CandidateConfig,
    bibs_cfg: BibFilterConfig,
    verbose: bool,
}

impl BibFilterPipeline {
    pub fn new(candidates_cfg: CandidateConfig, bibs_cfg: BibFilterConfig) -> Self {
        Self {
            candidates_cfg,
            bibs_cfg,
            verbose: false,
        }
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Stage A only, with rejected candidates included (for debugging)
    pub fn candidates(&self, img: &DynamicImage) -> Vec<BibCandidate> {
        let gray = preprocessing::to_grayscale(img);
        candidates::search_candidates(&gray, &self.candidates_cfg)
    }

    /// Run the full pipeline on an image
    pub fn detect(
        &self,
        img: &DynamicImage,
        reader: &dyn TextReader,
    ) -> anyhow::Result<Vec<BibDetection>> {
        let (img_w, img_h) = (img.width(), img.height());
        let gray = preprocessing::to_grayscale(img);

        let found = candidates::search_candidates(&gray, &self.candidates_cfg);
        if self.verbose {
            let passed = found.iter().filter(|c| c.passed()).count();
            println!(
                "Found {} candidate regions ({} passed filters)",
                found.len(),
                passed
            );
        }

        let mut hits: Vec<BibHit> = Vec::new();

        // Per-region pass
        for (idx, candidate) in found.iter().enumerate() {
            if !candidate.passed() {
                continue;
            }

            let padding = self.candidates_cfg.crop_padding;
            let x = candidate.region.min_x.saturating_sub(padding);
            let y = candidate.region.min_y.saturating_sub(padding);
            let width = (candidate.region.width() + 2 * padding).min(img_w - x);
            let height = (candidate.region.height() + 2 * padding).min(img_h - y);
            if width == 0 || height == 0 {
                continue;
            }

            let crop = img.crop_imm(x, y, width, height);
            for hit in reader.read(&crop)? {
                if hit.confidence < self.bibs_cfg.region_min_confidence {
                    continue;
                }
                if self.verbose {
                    println!(
                        "  Region {}: '{}' (confidence: {:.2})",
                        idx + 1,
                        hit.text,
                        hit.confidence
                    );
                }
                hits.push(BibHit {
                    quad: hit.quad.translate(x as f32, y as f32),
                    text: hit.text,
                    confidence: hit.confidence,
                    source: DetectionSource::RegionCandidate,
                    candidate: Some(idx),
                });
            }
        }

        // Full-image fallback recovers bibs whose region proposal was
        // missed; the stricter floor keeps it from flooding the photo.
        for hit in reader.read(img)? {
            if hit.confidence < self.bibs_cfg.fallback_min_confidence {
                continue;
            }
            hits.push(BibHit {
                quad: hit.quad,
                text: hit.text,
                confidence: hit.confidence,
                source: DetectionSource::FullImageFallback,
                candidate: None,
            });
        }

        let valid = bibs::validate_hits(hits, &found, &self.bibs_cfg);
        let resolved = bibs::resolve_overlaps(valid, &self.bibs_cfg);
        if self.verbose {
            println!("{} detections after overlap resolution", resolved.len());
        }

        Ok(bibs::into_detections(resolved, img_w, img_h))
    }
}

/// Build the inspectable candidate pipeline using the composable step
/// system; `detect --debug-out` runs this to dump per-stage images.
pub fn build_candidate_pipeline(cfg: &CandidateConfig, verbose: bool) -> crate::pipeline::Pipeline {
    use steps::*;

    crate::pipeline::Pipeline::new()
        .with_verbose(verbose)
        .add_step(Arc::new(GrayscaleStep))
        .add_step(Arc::new(BlurStep {
            sigma: cfg.blur_sigma,
        }))
        .add_step(Arc::new(BinarizeStep {
            threshold: cfg.binarize_threshold,
        }))
        .add_step(Arc::new(CandidateSearchStep { cfg: cfg.clone() }))
}
