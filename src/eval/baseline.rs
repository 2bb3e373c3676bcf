use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::error::Error;

use super::scoring::{AggregateScores, PhotoReport, ScoringEngine};

/// Immutable record of one evaluation pass. Built once, archived as a
/// JSON document, and loaded back unmodified for baseline comparison.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkRun {
    pub id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// Configuration snapshot so parameter sweeps stay attributable.
    pub config: EngineConfig,
    pub photos: Vec<PhotoReport>,
    pub totals: AggregateScores,
}

impl BenchmarkRun {
    pub fn build(config: EngineConfig, photos: Vec<PhotoReport>) -> Self {
        let totals = ScoringEngine::aggregate(&photos);
        Self {
            id: Uuid::new_v4(),
            created_at: OffsetDateTime::now_utc(),
            config,
            photos,
            totals,
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), Error> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Load a run from disk. A missing file is `NoBaseline`, an
    /// unparseable one `MalformedBaseline` - neither is a zero-delta
    /// result.
    pub fn load(path: &Path) -> Result<Self, Error> {
        let json = match fs::read_to_string(path) {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::NoBaseline(path.to_path_buf()));
            }
            Err(e) => return Err(e.into()),
        };
        serde_json::from_str(&json).map_err(|source| Error::MalformedBaseline {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Write this run into an archive directory as `run-<id>.json`.
    pub fn archive(&self, dir: &Path) -> Result<PathBuf, Error> {
        fs::create_dir_all(dir)?;
        let path = dir.join(format!("run-{}.json", self.id));
        self.save(&path)?;
        Ok(path)
    }

    /// Most recent archived run in a directory, by creation timestamp.
    pub fn latest_in(dir: &Path) -> Result<Self, Error> {
        let mut newest: Option<Self> = None;
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::NoBaseline(dir.to_path_buf()));
            }
            Err(e) => return Err(e.into()),
        };
        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let run = Self::load(&path)?;
            let newer = newest
                .as_ref()
                .is_none_or(|best| run.created_at > best.created_at);
            if newer {
                newest = Some(run);
            }
        }
        newest.ok_or_else(|| Error::NoBaseline(dir.to_path_buf()))
    }
}

/// Count and rate deltas for one scorecard, current minus baseline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScorecardDelta {
    pub tp: i64,
    pub fp: i64,
    pub fn_count: i64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

impl ScorecardDelta {
    fn between(
        current: &super::scoring::Scorecard,
        baseline: &super::scoring::Scorecard,
    ) -> Self {
        Self {
            tp: current.true_positives as i64 - baseline.true_positives as i64,
            fp: current.false_positives as i64 - baseline.false_positives as i64,
            fn_count: current.false_negatives as i64 - baseline.false_negatives as i64,
            precision: current.precision() - baseline.precision(),
            recall: current.recall() - baseline.recall(),
            f1: current.f1() - baseline.f1(),
        }
    }

    pub fn is_zero(&self) -> bool {
        self == &Self::default()
    }
}

/// Per-scorecard deltas between two runs. Reports magnitude and direction
/// only; whether a regression is acceptable is a human judgment call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunComparison {
    pub current_id: Uuid,
    pub baseline_id: Uuid,
    pub bib_localization: ScorecardDelta,
    pub bib_recognition_accuracy: f64,
    pub face_detection: ScorecardDelta,
    pub link_prediction: ScorecardDelta,
}

/// Diff two runs. `compare(a, b)` is the exact negation of
/// `compare(b, a)` for every delta.
pub fn compare(current: &BenchmarkRun, baseline: &BenchmarkRun) -> RunComparison {
    RunComparison {
        current_id: current.id,
        baseline_id: baseline.id,
        bib_localization: ScorecardDelta::between(
            &current.totals.bib_localization,
            &baseline.totals.bib_localization,
        ),
        bib_recognition_accuracy: current.totals.bib_recognition.accuracy()
            - baseline.totals.bib_recognition.accuracy(),
        face_detection: ScorecardDelta::between(
            &current.totals.face_detection,
            &baseline.totals.face_detection,
        ),
        link_prediction: ScorecardDelta::between(
            &current.totals.link_prediction,
            &baseline.totals.link_prediction,
        ),
    }
}
