use bibscore::detection::bibs::BibHit;
use bibscore::geometry::{QuadBox, RectBox};
use bibscore::models::{
    BibCandidate, BibDetection, BibScope, DetectionSource, FaceBackend, FaceBox, FaceScope,
    GroundTruthBib, GroundTruthFace, RawFaceBox, Region,
};

/// Normalized rect that must be valid; panics otherwise so fixture
/// mistakes fail loudly.
pub fn rect(x: f32, y: f32, w: f32, h: f32) -> RectBox {
    RectBox::new(x, y, w, h).expect("valid test rect")
}

/// Axis-aligned pixel-space quad.
pub fn quad(x: f32, y: f32, w: f32, h: f32) -> QuadBox {
    QuadBox::from_pixel_rect(x, y, w, h)
}

pub fn bib(text: &str, confidence: f32, bbox: RectBox) -> BibDetection {
    BibDetection {
        text: text.to_string(),
        confidence,
        bbox,
        source: DetectionSource::RegionCandidate,
        candidate: None,
    }
}

pub fn face(bbox: RectBox, confidence: f32) -> FaceBox {
    FaceBox {
        bbox,
        confidence,
        backend: FaceBackend::Neural,
    }
}

pub fn raw_face(x: f32, y: f32, w: f32, h: f32, confidence: f32) -> RawFaceBox {
    RawFaceBox {
        bbox: rect(x, y, w, h),
        confidence,
    }
}

pub fn gt_bib(bbox: RectBox, scope: BibScope, label: Option<&str>) -> GroundTruthBib {
    GroundTruthBib {
        bbox,
        scope,
        label: label.map(str::to_string),
    }
}

pub fn gt_face(bbox: RectBox, scope: FaceScope) -> GroundTruthFace {
    GroundTruthFace {
        bbox,
        scope,
        label: None,
    }
}

/// Region-pass OCR hit tied to candidate region `candidate`.
pub fn region_hit(text: &str, confidence: f32, quad: QuadBox, candidate: usize) -> BibHit {
    BibHit {
        quad,
        text: text.to_string(),
        confidence,
        source: DetectionSource::RegionCandidate,
        candidate: Some(candidate),
    }
}

/// Fallback-pass OCR hit with no candidate back-reference.
pub fn fallback_hit(text: &str, confidence: f32, quad: QuadBox) -> BibHit {
    BibHit {
        quad,
        text: text.to_string(),
        confidence,
        source: DetectionSource::FullImageFallback,
        candidate: None,
    }
}

/// Passing candidate over the given pixel bounds in a 640x480 frame.
pub fn candidate(min_x: u32, min_y: u32, max_x: u32, max_y: u32) -> BibCandidate {
    let region = Region {
        label: 1,
        min_x,
        min_y,
        max_x,
        max_y,
        pixel_count: (max_x - min_x + 1) * (max_y - min_y + 1),
    };
    let bbox = region.to_rect(640, 480);
    let aspect_ratio = region.aspect_ratio();
    BibCandidate {
        region,
        bbox,
        median_brightness: 200.0,
        mean_brightness: 190.0,
        aspect_ratio,
        reject: None,
    }
}
