use image::DynamicImage;

use crate::config::FaceFusionConfig;
use crate::geometry::{RectBox, iou};
use crate::models::{FaceBackend, FaceBox, RawFaceBox};

/// Pluggable face detection backend. The fusion pipeline depends only on
/// this interface, never on which concrete detector is active.
pub trait FaceDetector: Send + Sync {
    fn backend(&self) -> FaceBackend;
    fn detect(&self, image: &DynamicImage) -> anyhow::Result<Vec<RawFaceBox>>;
}

/// Replays prerecorded detector output. Confidence on cascade boxes is
/// ignored by fusion, so recorded cascade runs may leave it at 0.
pub struct RecordedFaceDetector {
    backend: FaceBackend,
    boxes: Vec<RawFaceBox>,
}

impl RecordedFaceDetector {
    pub fn new(backend: FaceBackend, boxes: Vec<RawFaceBox>) -> Self {
        Self { backend, boxes }
    }

    /// Recorded cascade output: boxes only, no scores.
    pub fn cascade(boxes: Vec<RectBox>) -> Self {
        Self {
            backend: FaceBackend::Cascade,
            boxes: boxes
                .into_iter()
                .map(|bbox| RawFaceBox {
                    bbox,
                    confidence: 0.0,
                })
                .collect(),
        }
    }
}

impl FaceDetector for RecordedFaceDetector {
    fn backend(&self) -> FaceBackend {
        self.backend
    }

    fn detect(&self, _image: &DynamicImage) -> anyhow::Result<Vec<RawFaceBox>> {
        Ok(self.boxes.clone())
    }
}

/// Combines a primary neural pass with an optional cascade fallback into
/// one deduplicated face list for a photo.
pub struct FaceFusionPipeline {
    cfg: FaceFusionConfig,
}

impl FaceFusionPipeline {
    pub fn new(cfg: FaceFusionConfig) -> Self {
        Self { cfg }
    }

    /// Run both detectors against an image. The cascade is only invoked
    /// when the primary pass leaves the photo under the minimum face
    /// count.
    pub fn detect(
        &self,
        image: &DynamicImage,
        primary: &dyn FaceDetector,
        fallback: &dyn FaceDetector,
    ) -> anyhow::Result<Vec<FaceBox>> {
        let raw = primary.detect(image)?;
        self.fuse(&raw, || {
            fallback
                .detect(image)
                .map(|boxes| boxes.into_iter().map(|b| b.bbox).collect())
        })
    }

    /// Fusion core over raw detector output. Pure except for the lazy
    /// cascade call, so recorded runs replay byte-identically.
    pub fn fuse(
        &self,
        primary: &[RawFaceBox],
        cascade: impl FnOnce() -> anyhow::Result<Vec<RectBox>>,
    ) -> anyhow::Result<Vec<FaceBox>> {
        let cfg = &self.cfg;

        let mut kept = nms(
            filter_by_confidence(primary, cfg.primary_min_confidence),
            cfg.nms_iou,
        );

        // Last-resort pass, not a general substitute for the primary
        // threshold: same raw output, lower floor, capped.
        if kept.is_empty() {
            kept = nms(
                filter_by_confidence(primary, cfg.rescue_min_confidence),
                cfg.nms_iou,
            );
            kept.truncate(cfg.rescue_max_boxes);
        }

        let mut faces: Vec<FaceBox> = kept
            .into_iter()
            .map(|b| FaceBox {
                bbox: b.bbox,
                confidence: b.confidence,
                backend: FaceBackend::Neural,
            })
            .collect();

        if faces.len() < cfg.min_face_count {
            let mut added = 0;
            for bbox in cascade()? {
                if added >= cfg.max_cascade_added {
                    break;
                }
                let duplicate = faces
                    .iter()
                    .any(|f| iou(&f.bbox, &bbox) >= cfg.fallback_dedup_iou);
                if duplicate {
                    continue;
                }
                // No score from the cascade; 0.0 sorts these after every
                // scored neural box during matching.
                faces.push(FaceBox {
                    bbox,
                    confidence: 0.0,
                    backend: FaceBackend::Cascade,
                });
                added += 1;
            }
        }

        faces.truncate(cfg.max_faces);
        Ok(faces)
    }
}

fn filter_by_confidence(boxes: &[RawFaceBox], floor: f32) -> Vec<RawFaceBox> {
    boxes
        .iter()
        .filter(|b| b.confidence >= floor && !b.bbox.is_degenerate())
        .cloned()
        .collect()
}

/// Non-maximum suppression: boxes with mutual IoU above the threshold
/// collapse to the single highest-confidence box.
fn nms(mut boxes: Vec<RawFaceBox>, iou_threshold: f32) -> Vec<RawFaceBox> {
    boxes.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

    let mut kept: Vec<RawFaceBox> = Vec::with_capacity(boxes.len());
    for candidate in boxes {
        let suppressed = kept
            .iter()
            .any(|k| iou(&k.bbox, &candidate.bbox) > iou_threshold);
        if !suppressed {
            kept.push(candidate);
        }
    }
    kept
}
