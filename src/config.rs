use serde::{Deserialize, Serialize};

/// Configuration format version, bumped when field meanings change so
/// archived runs stay interpretable.
pub const CONFIG_VERSION: u32 = 1;

/// All tunable parameters of the engine, collected into one explicit
/// structure passed by reference into every pipeline stage. Snapshotted
/// into each benchmark run so parameter sweeps stay reproducible.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub version: u32,
    pub candidates: CandidateConfig,
    pub bibs: BibFilterConfig,
    pub faces: FaceFusionConfig,
    pub links: LinkConfig,
    pub matching: MatchingConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            candidates: CandidateConfig::default(),
            bibs: BibFilterConfig::default(),
            faces: FaceFusionConfig::default(),
            links: LinkConfig::default(),
            matching: MatchingConfig::default(),
        }
    }
}

/// Stage A: bright-region candidate search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateConfig {
    /// Gaussian blur sigma applied before binarization.
    pub blur_sigma: f32,
    /// Grayscale value at or above which a pixel counts as bright.
    pub binarize_threshold: u8,
    /// Minimum absolute region size in pixels.
    pub min_area_px: u32,
    /// Accepted width/height band. Bib plates are roughly square to wide.
    pub min_aspect: f32,
    pub max_aspect: f32,
    /// Accepted region size relative to the whole image.
    pub min_relative_area: f32,
    pub max_relative_area: f32,
    /// Brightness floors over the region interior. Dark text on dark
    /// backgrounds sneaks past a naive contour pass but fails these.
    pub min_median_brightness: f32,
    pub min_mean_brightness: f32,
    /// Padding around a candidate crop handed to OCR.
    pub crop_padding: u32,
}

impl Default for CandidateConfig {
    fn default() -> Self {
        Self {
            blur_sigma: 1.5,
            binarize_threshold: 170,
            min_area_px: 120,
            min_aspect: 0.5,
            max_aspect: 4.0,
            min_relative_area: 0.001,
            max_relative_area: 0.30,
            min_median_brightness: 150.0,
            min_mean_brightness: 130.0,
            crop_padding: 5,
        }
    }
}

/// Stages B-D: OCR hit filtering, validation, and overlap resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BibFilterConfig {
    /// Confidence floor for hits read out of a candidate region.
    pub region_min_confidence: f32,
    /// Stricter floor for the full-image fallback pass.
    pub fallback_min_confidence: f32,
    /// A region hit must cover at least this fraction of its candidate
    /// region; tiny numbers inside a large white area are usually spurious.
    pub min_region_area_fraction: f32,
    /// IoU at or above which two hits are considered the same bib.
    pub overlap_iou: f32,
    /// In a substring conflict the shorter read wins only if its confidence
    /// is at least this multiple of the longer read's.
    pub substring_confidence_ratio: f32,
}

impl Default for BibFilterConfig {
    fn default() -> Self {
        Self {
            region_min_confidence: 0.30,
            fallback_min_confidence: 0.60,
            min_region_area_fraction: 0.10,
            overlap_iou: 0.40,
            substring_confidence_ratio: 1.5,
        }
    }
}

/// Neural + cascade face fusion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaceFusionConfig {
    /// Confidence floor for the primary neural pass.
    pub primary_min_confidence: f32,
    /// Mutual IoU above which primary boxes collapse to one.
    pub nms_iou: f32,
    /// Lower floor for the last-resort re-read when the primary pass
    /// yields nothing.
    pub rescue_min_confidence: f32,
    pub rescue_max_boxes: usize,
    /// Below this many faces the cascade fallback fires. Tightening the
    /// primary floor therefore raises the cascade rate, and vice versa.
    pub min_face_count: usize,
    /// Cascade boxes overlapping an existing box at or above this IoU are
    /// duplicates. Not the same constant as the scoring threshold.
    pub fallback_dedup_iou: f32,
    pub max_cascade_added: usize,
    pub max_faces: usize,
}

impl Default for FaceFusionConfig {
    fn default() -> Self {
        Self {
            primary_min_confidence: 0.60,
            nms_iou: 0.45,
            rescue_min_confidence: 0.30,
            rescue_max_boxes: 3,
            min_face_count: 2,
            fallback_dedup_iou: 0.30,
            max_cascade_added: 8,
            max_faces: 16,
        }
    }
}

/// Torso-region link prediction. Offsets are in face-heights so the search
/// region scales with the face.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkConfig {
    /// Top of the search band, below the face center.
    pub torso_bottom_offset: f32,
    /// Bottom of the search band.
    pub torso_far_offset: f32,
    /// Horizontal half-width of the band.
    pub torso_half_width: f32,
    /// A bib must be at least this confident to be linked.
    pub min_bib_confidence: f32,
    /// Accumulated affinity at or above which a cluster inherits a bib.
    pub min_cluster_affinity: f32,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            torso_bottom_offset: 1.0,
            torso_far_offset: 3.5,
            torso_half_width: 0.6,
            min_bib_confidence: 0.50,
            min_cluster_affinity: 2.0,
        }
    }
}

/// Ground-truth matching for scoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchingConfig {
    /// IoU at or above which a prediction claims a ground-truth box.
    /// Distinct from `FaceFusionConfig::fallback_dedup_iou`.
    pub iou_threshold: f32,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self { iou_threshold: 0.50 }
    }
}
