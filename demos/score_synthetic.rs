//! End-to-end scoring walkthrough on synthetic detections: fuse recorded
//! face boxes, predict links (with cluster inheritance), score against
//! ground truth, and diff two runs.

use bibscore::eval::compare;
use bibscore::linking::ClusterContext;
use bibscore::models::{
    BibDetection, BibScope, DetectionResult, DetectionSource, FaceScope, GroundTruthBib,
    GroundTruthFace, PhotoGroundTruth, RawFaceBox,
};
use bibscore::{
    BenchmarkRun, EngineConfig, FaceFusionPipeline, LinkPredictor, RectBox, ScoringEngine,
};

fn bib(text: &str, confidence: f32, bbox: RectBox) -> BibDetection {
    BibDetection {
        text: text.to_string(),
        confidence,
        bbox,
        source: DetectionSource::RegionCandidate,
        candidate: None,
    }
}

fn main() -> anyhow::Result<()> {
    let cfg = EngineConfig::default();
    let fusion = FaceFusionPipeline::new(cfg.faces.clone());
    let linker = LinkPredictor::new(cfg.links.clone());
    let scorer = ScoringEngine::new(cfg.matching.clone());

    // Two runners; the neural pass only found one face, so the cascade
    // fallback fires and contributes the second.
    let neural = vec![RawFaceBox {
        bbox: RectBox::new(0.20, 0.10, 0.08, 0.08)?,
        confidence: 0.92,
    }];
    let cascade = vec![
        RectBox::new(0.21, 0.11, 0.08, 0.08)?, // duplicate of the neural box
        RectBox::new(0.60, 0.12, 0.08, 0.08)?,
    ];
    let faces = fusion.fuse(&neural, || Ok(cascade.clone()))?;
    println!("Fused faces: {}", faces.len());
    for f in &faces {
        println!("  {:?} at ({:.2}, {:.2})", f.backend, f.bbox.x, f.bbox.y);
    }

    let bibs = vec![
        bib("421", 0.88, RectBox::new(0.20, 0.30, 0.09, 0.06)?),
        bib("77", 0.81, RectBox::new(0.60, 0.32, 0.09, 0.06)?),
    ];

    // The left runner's face cluster has been seen wearing 421 before.
    let mut clusters = ClusterContext::new();
    clusters.record_link("cluster-a", "421", 3.0);
    let face_clusters = vec![Some("cluster-a".to_string()), None];

    let links = linker.predict(&bibs, &faces, &face_clusters, &clusters);
    println!("\nPredicted links:");
    for link in &links {
        println!(
            "  bib {} <-> face {} via {:?}",
            bibs[link.bib_index].text, link.face_index, link.rule
        );
    }

    let gt = PhotoGroundTruth {
        bibs: vec![
            GroundTruthBib {
                bbox: RectBox::new(0.20, 0.30, 0.09, 0.06)?,
                scope: BibScope::Bib,
                label: Some("421".to_string()),
            },
            GroundTruthBib {
                bbox: RectBox::new(0.60, 0.32, 0.09, 0.06)?,
                scope: BibScope::Bib,
                label: Some("77".to_string()),
            },
        ],
        faces: vec![
            GroundTruthFace {
                bbox: RectBox::new(0.20, 0.10, 0.08, 0.08)?,
                scope: FaceScope::Keep,
                label: None,
            },
            GroundTruthFace {
                bbox: RectBox::new(0.60, 0.12, 0.08, 0.08)?,
                scope: FaceScope::Keep,
                label: None,
            },
        ],
        links: vec![(0, 0), (1, 1)],
        expected_numbers: vec![],
    };

    let result = DetectionResult {
        bibs,
        faces,
        links,
    };
    let report = scorer.score_photo("race-042.jpg", &result, &gt);
    println!(
        "\nBib localization: P {:.2} R {:.2} F1 {:.2}",
        report.bib_localization.precision(),
        report.bib_localization.recall(),
        report.bib_localization.f1()
    );
    println!(
        "Link prediction:  P {:.2} R {:.2}",
        report.link_prediction.precision(),
        report.link_prediction.recall()
    );

    // Diff a run against itself: every delta comes out zero.
    let run = BenchmarkRun::build(cfg, vec![report]);
    let diff = compare(&run, &run);
    println!(
        "\nSelf-comparison F1 deltas: bib {:+.4}, face {:+.4}, link {:+.4}",
        diff.bib_localization.f1, diff.face_detection.f1, diff.link_prediction.f1
    );

    Ok(())
}
