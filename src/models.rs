use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::geometry::RectBox;

/// Pixel-space connected region found during candidate search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Region {
    pub label: u32,
    pub min_x: u32,
    pub min_y: u32,
    pub max_x: u32,
    pub max_y: u32,
    pub pixel_count: u32,
}

impl Region {
    pub fn width(&self) -> u32 {
        self.max_x - self.min_x + 1
    }

    pub fn height(&self) -> u32 {
        self.max_y - self.min_y + 1
    }

    /// Bounding-box area in pixels.
    pub fn bbox_area(&self) -> u32 {
        self.width() * self.height()
    }

    pub fn aspect_ratio(&self) -> f32 {
        let h = self.height() as f32;
        if h == 0.0 {
            return 0.0;
        }
        self.width() as f32 / h
    }

    /// Normalized bounding rect within an image of the given size.
    pub fn to_rect(&self, img_w: u32, img_h: u32) -> RectBox {
        if img_w == 0 || img_h == 0 {
            return RectBox::empty();
        }
        let (img_w, img_h) = (img_w as f32, img_h as f32);
        RectBox {
            x: self.min_x as f32 / img_w,
            y: self.min_y as f32 / img_h,
            w: (self.width() as f32 / img_w).min(1.0),
            h: (self.height() as f32 / img_h).min(1.0),
        }
    }
}

/// Why a candidate region was rejected before OCR.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    AspectOutOfBand,
    RelativeSizeOutOfBand,
    LowMedianBrightness,
    LowMeanBrightness,
}

/// A pre-OCR region proposal with its measured features. Rejected
/// candidates are kept around for debugging when requested.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BibCandidate {
    pub region: Region,
    pub bbox: RectBox,
    pub median_brightness: f32,
    pub mean_brightness: f32,
    pub aspect_ratio: f32,
    /// `None` means the candidate passed every filter.
    pub reject: Option<RejectReason>,
}

impl BibCandidate {
    pub fn passed(&self) -> bool {
        self.reject.is_none()
    }
}

/// Which OCR pass produced a bib detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionSource {
    RegionCandidate,
    FullImageFallback,
}

/// A validated, deduplicated bib-number detection for one photo.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BibDetection {
    /// 1-4 digits, no leading zero, value 1-9999.
    pub text: String,
    pub confidence: f32,
    pub bbox: RectBox,
    pub source: DetectionSource,
    /// Index of the candidate region the hit came from, if any.
    pub candidate: Option<usize>,
}

/// Which detector backend produced a face box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaceBackend {
    Neural,
    Cascade,
}

/// Raw detector output, before fusion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawFaceBox {
    pub bbox: RectBox,
    pub confidence: f32,
}

/// A fused, deduplicated face box for one photo.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaceBox {
    pub bbox: RectBox,
    pub confidence: f32,
    pub backend: FaceBackend,
}

/// Labeler scope tags for bib ground truth. Only `bib` and `bib_clipped`
/// participate in scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BibScope {
    Bib,
    BibClipped,
    BibObscured,
    NotBib,
}

impl BibScope {
    pub fn is_scored(self) -> bool {
        matches!(self, BibScope::Bib | BibScope::BibClipped)
    }
}

/// Labeler scope tags for face ground truth. Only `keep` is scored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaceScope {
    Keep,
    Uncertain,
    Exclude,
}

impl FaceScope {
    pub fn is_scored(self) -> bool {
        matches!(self, FaceScope::Keep)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroundTruthBib {
    pub bbox: RectBox,
    pub scope: BibScope,
    /// Bib number string, when the labeler could read it.
    #[serde(default)]
    pub label: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroundTruthFace {
    pub bbox: RectBox,
    pub scope: FaceScope,
    /// Identity name or anonymous id.
    #[serde(default)]
    pub label: Option<String>,
}

/// Hand-labeled reference data for one photo.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PhotoGroundTruth {
    #[serde(default)]
    pub bibs: Vec<GroundTruthBib>,
    #[serde(default)]
    pub faces: Vec<GroundTruthFace>,
    /// `(bib_index, face_index)` pairs into the lists above.
    #[serde(default)]
    pub links: Vec<(usize, usize)>,
    /// Legacy number-only labels for photos not yet upgraded with
    /// coordinates.
    #[serde(default)]
    pub expected_numbers: Vec<String>,
}

impl PhotoGroundTruth {
    /// Re-check box invariants after deserializing.
    pub fn validate(&self) -> Result<(), Error> {
        for b in &self.bibs {
            b.bbox.validate()?;
        }
        for f in &self.faces {
            f.bbox.validate()?;
        }
        Ok(())
    }
}

/// Which rule produced a predicted link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkRule {
    Direct,
    ClusterInheritance,
}

/// A predicted bib-face pairing with provenance for later audit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Link {
    pub bib_index: usize,
    pub face_index: usize,
    pub rule: LinkRule,
    pub bib_confidence: f32,
    pub face_confidence: f32,
}

/// Everything the engine predicts for one photo.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DetectionResult {
    #[serde(default)]
    pub bibs: Vec<BibDetection>,
    #[serde(default)]
    pub faces: Vec<FaceBox>,
    #[serde(default)]
    pub links: Vec<Link>,
}

/// Recorded raw detector output for one photo, as consumed by the `score`
/// command. Lets benchmark runs replay without the external models present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhotoInput {
    pub photo: String,
    #[serde(default)]
    pub bibs: Vec<BibDetection>,
    #[serde(default)]
    pub neural_faces: Vec<RawFaceBox>,
    /// The cascade detector reports no confidence.
    #[serde(default)]
    pub cascade_faces: Vec<RectBox>,
}

impl PhotoInput {
    pub fn validate(&self) -> Result<(), Error> {
        for b in &self.bibs {
            b.bbox.validate()?;
        }
        for f in &self.neural_faces {
            f.bbox.validate()?;
        }
        for c in &self.cascade_faces {
            c.validate()?;
        }
        Ok(())
    }
}
