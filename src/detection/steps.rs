use anyhow::Result;
use image::GenericImageView;

use crate::config::CandidateConfig;
use crate::detection::{candidates, preprocessing, regions};
use crate::pipeline::{PipelineContext, PipelineData, PipelineStep};

/// Convert image to grayscale
pub struct GrayscaleStep;

impl PipelineStep for GrayscaleStep {
    fn process(
        &self,
        data: Vec<PipelineData>,
        _context: &PipelineContext,
    ) -> Result<Vec<PipelineData>> {
        let mut result = Vec::new();
        for item in data {
            let gray = preprocessing::to_grayscale(&item.image);
            result.push(PipelineData {
                image: image::DynamicImage::ImageLuma8(gray),
                original: item.original.clone(),
                candidate: item.candidate.clone(),
            });
        }
        Ok(result)
    }

    fn name(&self) -> &str {
        "Grayscale Conversion"
    }
}

/// Apply Gaussian blur
pub struct BlurStep {
    pub sigma: f32,
}

impl PipelineStep for BlurStep {
    fn process(
        &self,
        data: Vec<PipelineData>,
        _context: &PipelineContext,
    ) -> Result<Vec<PipelineData>> {
        let mut result = Vec::new();
        for item in data {
            let gray = item.image.to_luma8();
            let blurred = preprocessing::apply_blur(&gray, self.sigma);
            result.push(PipelineData {
                image: image::DynamicImage::ImageLuma8(blurred),
                original: item.original.clone(),
                candidate: item.candidate.clone(),
            });
        }
        Ok(result)
    }

    fn name(&self) -> &str {
        "Gaussian Blur"
    }
}

/// Binarize on brightness so bright plate regions become solid blobs
pub struct BinarizeStep {
    pub threshold: u8,
}

impl PipelineStep for BinarizeStep {
    fn process(
        &self,
        data: Vec<PipelineData>,
        _context: &PipelineContext,
    ) -> Result<Vec<PipelineData>> {
        let mut result = Vec::new();
        for item in data {
            let gray = item.image.to_luma8();
            let binary = preprocessing::binarize_bright(&gray, self.threshold);
            result.push(PipelineData {
                image: image::DynamicImage::ImageLuma8(binary),
                original: item.original.clone(),
                candidate: item.candidate.clone(),
            });
        }
        Ok(result)
    }

    fn name(&self) -> &str {
        "Brightness Binarization"
    }
}

/// Split the binarized frame into candidate regions - one image becomes
/// one item per surviving candidate, cropped from the original photo.
pub struct CandidateSearchStep {
    pub cfg: CandidateConfig,
}

impl PipelineStep for CandidateSearchStep {
    fn process(
        &self,
        data: Vec<PipelineData>,
        context: &PipelineContext,
    ) -> Result<Vec<PipelineData>> {
        let mut result = Vec::new();

        for item in data {
            let binary = item.image.to_luma8();
            let original_gray = preprocessing::to_grayscale(&item.original);
            let (img_width, img_height) = item.original.as_ref().dimensions();

            let found = regions::find_regions(&binary, self.cfg.min_area_px);

            for region in found {
                let candidate = candidates::evaluate_region(region, &original_gray, &self.cfg);

                if let Some(reason) = candidate.reject {
                    if context.verbose {
                        println!(
                            "  Rejected region at ({}, {}): {:?}",
                            candidate.region.min_x, candidate.region.min_y, reason
                        );
                    }
                    continue;
                }

                // Pad the crop so OCR does not lose digit edges
                let padding = self.cfg.crop_padding;
                let x = candidate.region.min_x.saturating_sub(padding);
                let y = candidate.region.min_y.saturating_sub(padding);
                let width = (candidate.region.width() + 2 * padding).min(img_width - x);
                let height = (candidate.region.height() + 2 * padding).min(img_height - y);

                let cropped = item.original.crop_imm(x, y, width, height);
                result.push(PipelineData::from_candidate(
                    cropped,
                    item.original.clone(),
                    candidate,
                ));
            }
        }

        Ok(result)
    }

    fn name(&self) -> &str {
        "Candidate Search"
    }
}
