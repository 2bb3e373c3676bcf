use bibscore::config::EngineConfig;
use bibscore::error::Error;
use bibscore::eval::scoring::{PhotoReport, PhotoStatus, RecognitionCard, Scorecard};
use bibscore::eval::{BenchmarkRun, compare};

fn report(photo: &str, bib: Scorecard, face: Scorecard, links: Scorecard) -> PhotoReport {
    PhotoReport {
        photo: photo.to_string(),
        bib_localization: bib,
        bib_recognition: RecognitionCard {
            matched: bib.true_positives,
            correct: bib.true_positives,
        },
        face_detection: face,
        link_prediction: links,
        status: PhotoStatus::Pass,
    }
}

fn run_a() -> BenchmarkRun {
    BenchmarkRun::build(
        EngineConfig::default(),
        vec![report(
            "a.jpg",
            Scorecard::new(8, 2, 3),
            Scorecard::new(5, 1, 1),
            Scorecard::new(3, 2, 2),
        )],
    )
}

fn run_b() -> BenchmarkRun {
    BenchmarkRun::build(
        EngineConfig::default(),
        vec![report(
            "a.jpg",
            Scorecard::new(9, 1, 2),
            Scorecard::new(4, 3, 2),
            Scorecard::new(3, 2, 2),
        )],
    )
}

#[test]
fn comparison_is_antisymmetric() {
    let a = run_a();
    let b = run_b();
    let ab = compare(&a, &b);
    let ba = compare(&b, &a);

    assert_eq!(ab.bib_localization.tp, -ba.bib_localization.tp);
    assert_eq!(ab.bib_localization.fp, -ba.bib_localization.fp);
    assert_eq!(ab.bib_localization.fn_count, -ba.bib_localization.fn_count);
    assert_eq!(ab.bib_localization.precision, -ba.bib_localization.precision);
    assert_eq!(ab.bib_localization.recall, -ba.bib_localization.recall);
    assert_eq!(ab.bib_localization.f1, -ba.bib_localization.f1);
    assert_eq!(ab.face_detection.precision, -ba.face_detection.precision);
    assert_eq!(ab.bib_recognition_accuracy, -ba.bib_recognition_accuracy);
}

#[test]
fn self_comparison_is_all_zero() {
    let a = run_a();
    let diff = compare(&a, &a);
    assert!(diff.bib_localization.is_zero());
    assert!(diff.face_detection.is_zero());
    assert!(diff.link_prediction.is_zero());
    assert_eq!(diff.bib_recognition_accuracy, 0.0);
}

#[test]
fn identical_counts_compare_equal_across_runs() {
    // Same numbers in two distinct runs (different ids and timestamps)
    // still produce a zero delta.
    let a = run_a();
    let b = run_a();
    assert_ne!(a.id, b.id);
    let diff = compare(&a, &b);
    assert!(diff.bib_localization.is_zero());
}

#[test]
fn run_archive_round_trips_unmodified() {
    let dir = tempfile::TempDir::new().unwrap();
    let run = run_a();

    let path = run.archive(dir.path()).unwrap();
    let loaded = BenchmarkRun::load(&path).unwrap();

    assert_eq!(loaded.id, run.id);
    assert_eq!(loaded.created_at, run.created_at);
    assert_eq!(loaded.config, run.config);
    assert_eq!(loaded.totals, run.totals);
    assert_eq!(loaded.photos.len(), 1);
    assert_eq!(loaded.photos[0].photo, "a.jpg");
}

#[test]
fn missing_baseline_is_a_distinct_error() {
    let dir = tempfile::TempDir::new().unwrap();
    let missing = dir.path().join("nope.json");
    match BenchmarkRun::load(&missing) {
        Err(Error::NoBaseline(path)) => assert_eq!(path, missing),
        other => panic!("expected NoBaseline, got {:?}", other.map(|r| r.id)),
    }
}

#[test]
fn malformed_baseline_is_not_no_baseline() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("broken.json");
    std::fs::write(&path, "{ this is not a run").unwrap();
    match BenchmarkRun::load(&path) {
        Err(Error::MalformedBaseline { path: p, .. }) => assert_eq!(p, path),
        other => panic!("expected MalformedBaseline, got {:?}", other.map(|r| r.id)),
    }
}

#[test]
fn latest_in_picks_the_newest_run() {
    let dir = tempfile::TempDir::new().unwrap();
    let older = run_a();
    let mut newer = run_b();
    // Archived runs are ordered by creation timestamp, not file name.
    newer.created_at = older.created_at + time::Duration::hours(1);

    older.archive(dir.path()).unwrap();
    newer.archive(dir.path()).unwrap();

    let latest = BenchmarkRun::latest_in(dir.path()).unwrap();
    assert_eq!(latest.id, newer.id);
}

#[test]
fn empty_archive_directory_has_no_baseline() {
    let dir = tempfile::TempDir::new().unwrap();
    assert!(matches!(
        BenchmarkRun::latest_in(dir.path()),
        Err(Error::NoBaseline(_))
    ));
}

#[test]
fn totals_are_rebuilt_from_reports() {
    let run = BenchmarkRun::build(
        EngineConfig::default(),
        vec![
            report(
                "a.jpg",
                Scorecard::new(1, 0, 0),
                Scorecard::new(1, 0, 0),
                Scorecard::new(0, 0, 0),
            ),
            report(
                "b.jpg",
                Scorecard::new(2, 1, 1),
                Scorecard::new(0, 0, 2),
                Scorecard::new(1, 0, 0),
            ),
        ],
    );
    assert_eq!(run.totals.bib_localization.true_positives, 3);
    assert_eq!(run.totals.bib_localization.false_positives, 1);
    assert_eq!(run.totals.face_detection.false_negatives, 2);
    assert_eq!(run.totals.link_prediction.true_positives, 1);
}
