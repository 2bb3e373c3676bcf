use image::{DynamicImage, GrayImage, Luma};

use bibscore::config::{BibFilterConfig, CandidateConfig, FaceFusionConfig};
use bibscore::detection::ocr::{OcrHit, TextReader};
use bibscore::geometry::{QuadBox, RectBox};
use bibscore::models::{DetectionSource, FaceBackend, RawFaceBox};
use bibscore::{
    BibFilterPipeline, FaceDetector, FaceFusionPipeline, RecordedFaceDetector, RecordedTextReader,
};

fn photo_with_plate() -> DynamicImage {
    let mut img = GrayImage::from_pixel(640, 480, Luma([40u8]));
    for y in 200..260 {
        for x in 120..210 {
            img.put_pixel(x, y, Luma([230u8]));
        }
    }
    DynamicImage::ImageLuma8(img)
}

/// Answers only for candidate crops, staying silent on the full frame -
/// the shape of an OCR engine that reads the plate but nothing else.
struct CropOnlyReader {
    hit: OcrHit,
}

impl TextReader for CropOnlyReader {
    fn read(&self, image: &DynamicImage) -> anyhow::Result<Vec<OcrHit>> {
        if image.width() < 640 {
            Ok(vec![self.hit.clone()])
        } else {
            Ok(Vec::new())
        }
    }
}

#[test]
fn region_pass_detects_and_normalizes_a_plate_number() {
    let img = photo_with_plate();
    let pipeline = BibFilterPipeline::new(CandidateConfig::default(), BibFilterConfig::default());

    // Hit coordinates are relative to the padded crop.
    let reader = CropOnlyReader {
        hit: OcrHit {
            quad: QuadBox::from_pixel_rect(10.0, 15.0, 70.0, 35.0),
            text: "421".to_string(),
            confidence: 0.85,
        },
    };

    let detections = pipeline.detect(&img, &reader).unwrap();
    assert_eq!(detections.len(), 1);
    let d = &detections[0];
    assert_eq!(d.text, "421");
    assert_eq!(d.source, DetectionSource::RegionCandidate);
    assert_eq!(d.candidate, Some(0));
    // Translated back into frame space: near the plate, not the origin.
    assert!(d.bbox.x > 0.15 && d.bbox.x < 0.30);
    assert!(d.bbox.y > 0.40 && d.bbox.y < 0.50);
}

#[test]
fn fallback_pass_recovers_bibs_without_a_candidate_region() {
    // Featureless frame: no candidates, so only the full-image pass runs.
    let img = DynamicImage::ImageLuma8(GrayImage::from_pixel(640, 480, Luma([40u8])));
    let pipeline = BibFilterPipeline::new(CandidateConfig::default(), BibFilterConfig::default());

    let reader = RecordedTextReader::new(vec![OcrHit {
        quad: QuadBox::from_pixel_rect(300.0, 220.0, 80.0, 40.0),
        text: "77".to_string(),
        confidence: 0.7,
    }]);

    let detections = pipeline.detect(&img, &reader).unwrap();
    assert_eq!(detections.len(), 1);
    assert_eq!(detections[0].source, DetectionSource::FullImageFallback);
    assert_eq!(detections[0].candidate, None);
}

#[test]
fn fallback_pass_enforces_the_stricter_floor() {
    let img = DynamicImage::ImageLuma8(GrayImage::from_pixel(640, 480, Luma([40u8])));
    let pipeline = BibFilterPipeline::new(CandidateConfig::default(), BibFilterConfig::default());

    // 0.5 clears the region floor (0.3) but not the fallback floor (0.6).
    let reader = RecordedTextReader::new(vec![OcrHit {
        quad: QuadBox::from_pixel_rect(300.0, 220.0, 80.0, 40.0),
        text: "77".to_string(),
        confidence: 0.5,
    }]);

    let detections = pipeline.detect(&img, &reader).unwrap();
    assert!(detections.is_empty());
}

#[test]
fn candidates_accessor_reports_rejections_too() {
    let img = photo_with_plate();
    let pipeline = BibFilterPipeline::new(CandidateConfig::default(), BibFilterConfig::default());
    let found = pipeline.candidates(&img);
    assert_eq!(found.iter().filter(|c| c.passed()).count(), 1);
}

#[test]
fn detector_trait_path_fuses_recorded_backends() {
    let img = DynamicImage::ImageLuma8(GrayImage::from_pixel(64, 64, Luma([0u8])));
    let fusion = FaceFusionPipeline::new(FaceFusionConfig::default());

    let primary = RecordedFaceDetector::new(
        FaceBackend::Neural,
        vec![RawFaceBox {
            bbox: RectBox::new(0.10, 0.10, 0.10, 0.10).unwrap(),
            confidence: 0.9,
        }],
    );
    let fallback = RecordedFaceDetector::cascade(vec![
        RectBox::new(0.60, 0.10, 0.10, 0.10).unwrap(),
    ]);
    assert_eq!(fallback.backend(), FaceBackend::Cascade);

    let faces = fusion.detect(&img, &primary, &fallback).unwrap();
    assert_eq!(faces.len(), 2);
    assert_eq!(faces[0].backend, FaceBackend::Neural);
    assert_eq!(faces[1].backend, FaceBackend::Cascade);
}
