use image::DynamicImage;
use ocrs::{ImageSource, OcrEngine, OcrEngineParams, TextItem};
use rten::Model;
use std::path::Path;

use crate::geometry::QuadBox;

/// A raw text hit from the OCR engine: a possibly rotated quadrilateral in
/// pixel coordinates, the text read, and the engine's confidence.
#[derive(Debug, Clone)]
pub struct OcrHit {
    pub quad: QuadBox,
    pub text: String,
    pub confidence: f32,
}

/// Capability seam for the external OCR engine. The engine core only ever
/// sees raw hits, never the concrete backend.
pub trait TextReader: Send + Sync {
    /// Read all text in an image. Hit coordinates are relative to the
    /// image passed in; callers reading a cropped region translate them
    /// back themselves.
    fn read(&self, image: &DynamicImage) -> anyhow::Result<Vec<OcrHit>>;
}

// The simple ocrs API does not expose per-line scores; hits carry a fixed
// confidence. Recorded inputs carry real scores where the engine provides
// them.
const DEFAULT_OCR_CONFIDENCE: f32 = 0.9;

/// OCR backend built on the ocrs engine.
pub struct OcrsReader {
    engine: OcrEngine,
}

impl OcrsReader {
    /// Initialize with models from the standard cache location.
    pub fn init() -> anyhow::Result<Self> {
        let home_dir = std::env::var("HOME").or_else(|_| std::env::var("USERPROFILE"))?;

        let cache_dir = Path::new(&home_dir).join(".cache/ocrs");
        let detection_model_path = cache_dir.join("text-detection.rten");
        let recognition_model_path = cache_dir.join("text-recognition.rten");

        if !detection_model_path.exists() || !recognition_model_path.exists() {
            anyhow::bail!(
                "OCR models not found. Please run: ocrs-cli --help (or download models manually)\n\
                 Expected locations:\n  - {}\n  - {}",
                detection_model_path.display(),
                recognition_model_path.display()
            );
        }

        let detection_model = Model::load_file(&detection_model_path)?;
        let recognition_model = Model::load_file(&recognition_model_path)?;

        let engine = OcrEngine::new(OcrEngineParams {
            detection_model: Some(detection_model),
            recognition_model: Some(recognition_model),
            ..Default::default()
        })?;

        Ok(Self { engine })
    }
}

impl TextReader for OcrsReader {
    fn read(&self, image: &DynamicImage) -> anyhow::Result<Vec<OcrHit>> {
        let rgb = image.to_rgb8();
        let source = ImageSource::from_bytes(rgb.as_raw(), rgb.dimensions())?;
        let input = self.engine.prepare_input(source)?;

        let word_rects = self.engine.detect_words(&input)?;
        let line_rects = self.engine.find_text_lines(&input, &word_rects);
        let lines = self.engine.recognize_text(&input, &line_rects)?;

        let mut hits = Vec::new();
        for line in lines.into_iter().flatten() {
            let text = line.to_string().trim().to_string();
            if text.is_empty() {
                continue;
            }
            let corners = line.rotated_rect().corners();
            let quad = QuadBox::new([
                [corners[0].x, corners[0].y],
                [corners[1].x, corners[1].y],
                [corners[2].x, corners[2].y],
                [corners[3].x, corners[3].y],
            ]);
            hits.push(OcrHit {
                quad,
                text,
                confidence: DEFAULT_OCR_CONFIDENCE,
            });
        }
        Ok(hits)
    }
}

/// Replays prerecorded hits; used in tests and anywhere the real engine is
/// unavailable.
pub struct RecordedTextReader {
    hits: Vec<OcrHit>,
}

impl RecordedTextReader {
    pub fn new(hits: Vec<OcrHit>) -> Self {
        Self { hits }
    }
}

impl TextReader for RecordedTextReader {
    fn read(&self, _image: &DynamicImage) -> anyhow::Result<Vec<OcrHit>> {
        Ok(self.hits.clone())
    }
}
