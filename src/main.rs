use clap::{Parser, Subcommand};
use image::ImageReader;
use std::collections::BTreeMap;
use std::path::PathBuf;

use bibscore::eval::{Scorecard, ScorecardDelta};
use bibscore::linking::ClusterContext;
use bibscore::{
    BenchmarkRun, BibFilterPipeline, DetectionResult, EngineConfig, FaceFusionPipeline,
    LinkPredictor, OcrsReader, PhotoGroundTruth, PhotoInput, ScoringEngine,
    build_candidate_pipeline,
};

#[derive(Parser)]
#[command(name = "bibscore")]
#[command(about = "Detect, link, and score race bib numbers and faces")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run bib detection on a single photo
    Detect {
        /// Path to input image file
        #[arg(value_name = "IMAGE")]
        image_path: PathBuf,

        /// Enable verbose output
        #[arg(short, long)]
        verbose: bool,

        /// Save per-stage debug images to directory (must be empty)
        #[arg(long, value_name = "DIR")]
        debug_out: Option<PathBuf>,

        /// Engine configuration file (JSON); defaults are used otherwise
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,
    },

    /// Score recorded detector output against ground truth
    Score {
        /// Recorded per-photo detector output (JSON array)
        #[arg(value_name = "INPUTS")]
        inputs: PathBuf,

        /// Ground truth, photo name to labeled boxes (JSON object)
        #[arg(value_name = "TRUTH")]
        truth: PathBuf,

        /// Archive the run into this directory
        #[arg(long, value_name = "DIR")]
        archive: Option<PathBuf>,

        /// Engine configuration file (JSON); defaults are used otherwise
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Enable verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Compare a benchmark run against a stored baseline run
    Compare {
        /// Current run file
        #[arg(value_name = "CURRENT")]
        current: PathBuf,

        /// Baseline run file; omit to use the newest run in --archive
        #[arg(value_name = "BASELINE")]
        baseline: Option<PathBuf>,

        /// Archive directory to pull the newest baseline from
        #[arg(long, value_name = "DIR")]
        archive: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    match Cli::parse().command {
        Command::Detect {
            image_path,
            verbose,
            debug_out,
            config,
        } => detect(image_path, verbose, debug_out, config),
        Command::Score {
            inputs,
            truth,
            archive,
            config,
            verbose,
        } => score(inputs, truth, archive, config, verbose),
        Command::Compare {
            current,
            baseline,
            archive,
        } => compare(current, baseline, archive),
    }
}

fn load_config(path: Option<PathBuf>) -> anyhow::Result<EngineConfig> {
    match path {
        Some(path) => {
            let json = std::fs::read_to_string(&path)?;
            Ok(serde_json::from_str(&json)?)
        }
        None => Ok(EngineConfig::default()),
    }
}

fn detect(
    image_path: PathBuf,
    verbose: bool,
    debug_out: Option<PathBuf>,
    config: Option<PathBuf>,
) -> anyhow::Result<()> {
    let cfg = load_config(config)?;

    if verbose {
        println!("Loading image: {:?}", image_path);
    }
    let img = ImageReader::open(&image_path)?
        .decode()
        .map_err(|e| anyhow::anyhow!("Failed to decode image: {}", e))?;
    if verbose {
        println!("Image loaded: {}x{}\n", img.width(), img.height());
    }

    // Dump the candidate stages first when debug output was requested
    if let Some(debug_dir) = debug_out {
        let pipeline = build_candidate_pipeline(&cfg.candidates, verbose).with_debug(debug_dir)?;
        let items = pipeline.run(img.clone())?;
        println!("Candidate regions after filtering: {}", items.len());
    }

    let reader = OcrsReader::init()?;
    let pipeline = BibFilterPipeline::new(cfg.candidates, cfg.bibs).with_verbose(verbose);
    let detections = pipeline.detect(&img, &reader)?;

    println!("\n=== Bib Detection Results ===");
    println!("Total detections: {}", detections.len());

    if detections.is_empty() {
        println!("No bib numbers detected.");
    } else {
        println!("\nDetected bib numbers:");
        for d in &detections {
            println!(
                "  {} at ({:.3}, {:.3}) - confidence: {:.2} [{:?}]",
                d.text, d.bbox.x, d.bbox.y, d.confidence, d.source
            );
        }
    }

    Ok(())
}

fn score(
    inputs_path: PathBuf,
    truth_path: PathBuf,
    archive: Option<PathBuf>,
    config: Option<PathBuf>,
    verbose: bool,
) -> anyhow::Result<()> {
    let cfg = load_config(config)?;

    let inputs: Vec<PhotoInput> = serde_json::from_str(&std::fs::read_to_string(&inputs_path)?)?;
    let truth: BTreeMap<String, PhotoGroundTruth> =
        serde_json::from_str(&std::fs::read_to_string(&truth_path)?)?;

    let mut by_photo: BTreeMap<&str, &PhotoInput> = BTreeMap::new();
    for input in &inputs {
        input.validate()?;
        by_photo.insert(input.photo.as_str(), input);
    }
    for (photo, gt) in &truth {
        gt.validate()?;
        if verbose && !by_photo.contains_key(photo.as_str()) {
            println!("No prediction for {}; all ground truth counts as missed", photo);
        }
    }

    let fusion = FaceFusionPipeline::new(cfg.faces.clone());
    let linker = LinkPredictor::new(cfg.links.clone());
    let scorer = ScoringEngine::new(cfg.matching.clone());
    // Cross-photo cluster knowledge comes from the identity system; the
    // CLI scores without it.
    let clusters = ClusterContext::new();

    let mut reports = Vec::new();
    for (photo, gt) in &truth {
        let result = match by_photo.get(photo.as_str()) {
            Some(input) => {
                let faces =
                    fusion.fuse(&input.neural_faces, || Ok(input.cascade_faces.clone()))?;
                let links = linker.predict(&input.bibs, &faces, &[], &clusters);
                DetectionResult {
                    bibs: input.bibs.clone(),
                    faces,
                    links,
                }
            }
            None => DetectionResult::default(),
        };
        let report = scorer.score_photo(photo, &result, gt);
        if verbose {
            println!(
                "{}: bib {}/{}/{}, face {}/{}/{}, links {}/{}/{} ({:?})",
                photo,
                report.bib_localization.true_positives,
                report.bib_localization.false_positives,
                report.bib_localization.false_negatives,
                report.face_detection.true_positives,
                report.face_detection.false_positives,
                report.face_detection.false_negatives,
                report.link_prediction.true_positives,
                report.link_prediction.false_positives,
                report.link_prediction.false_negatives,
                report.status,
            );
        }
        reports.push(report);
    }

    let run = BenchmarkRun::build(cfg, reports);

    println!("\n=== Benchmark Run {} ===", run.id);
    println!("Photos scored: {}", run.photos.len());
    print_scorecard("Bib localization", &run.totals.bib_localization);
    println!(
        "  Bib recognition:  accuracy {:.4} ({}/{})",
        run.totals.bib_recognition.accuracy(),
        run.totals.bib_recognition.correct,
        run.totals.bib_recognition.matched
    );
    print_scorecard("Face detection", &run.totals.face_detection);
    print_scorecard("Link prediction", &run.totals.link_prediction);

    if let Some(dir) = archive {
        let path = run.archive(&dir)?;
        println!("\nArchived run to {}", path.display());
    }

    Ok(())
}

fn compare(
    current: PathBuf,
    baseline: Option<PathBuf>,
    archive: Option<PathBuf>,
) -> anyhow::Result<()> {
    let current_run = BenchmarkRun::load(&current)?;
    let baseline_run = match (baseline, archive) {
        (Some(path), _) => BenchmarkRun::load(&path)?,
        (None, Some(dir)) => BenchmarkRun::latest_in(&dir)?,
        (None, None) => anyhow::bail!("provide a baseline run file or --archive directory"),
    };

    let diff = bibscore::compare(&current_run, &baseline_run);

    println!("Current:  {} ({})", diff.current_id, current_run.created_at);
    println!("Baseline: {} ({})", diff.baseline_id, baseline_run.created_at);
    println!();
    print_delta("Bib localization", &diff.bib_localization);
    println!(
        "  Bib recognition:  Δaccuracy {:+.4}",
        diff.bib_recognition_accuracy
    );
    print_delta("Face detection", &diff.face_detection);
    print_delta("Link prediction", &diff.link_prediction);

    Ok(())
}

fn print_scorecard(name: &str, card: &Scorecard) {
    println!(
        "  {:<17} P {:.4}  R {:.4}  F1 {:.4}  (tp {}, fp {}, fn {})",
        format!("{}:", name),
        card.precision(),
        card.recall(),
        card.f1(),
        card.true_positives,
        card.false_positives,
        card.false_negatives
    );
}

fn print_delta(name: &str, delta: &ScorecardDelta) {
    println!(
        "  {:<17} ΔP {:+.4}  ΔR {:+.4}  ΔF1 {:+.4}  (Δtp {:+}, Δfp {:+}, Δfn {:+})",
        format!("{}:", name),
        delta.precision,
        delta.recall,
        delta.f1,
        delta.tp,
        delta.fp,
        delta.fn_count
    );
}
