pub mod config;
pub mod detection;
pub mod error;
pub mod eval;
pub mod geometry;
pub mod linking;
pub mod models;
pub mod pipeline;

pub use config::EngineConfig;
pub use detection::faces::{FaceDetector, FaceFusionPipeline, RecordedFaceDetector};
pub use detection::ocr::{OcrHit, OcrsReader, RecordedTextReader, TextReader};
pub use detection::{BibFilterPipeline, build_candidate_pipeline};
pub use error::Error;
pub use eval::{BenchmarkRun, RunComparison, Scorecard, ScoringEngine, compare};
pub use geometry::{QuadBox, RectBox};
pub use linking::{ClusterContext, LinkPredictor};
pub use models::{
    BibCandidate, BibDetection, DetectionResult, FaceBox, Link, PhotoGroundTruth, PhotoInput,
};
pub use pipeline::{DebugConfig, Pipeline, PipelineContext, PipelineData, PipelineStep};
