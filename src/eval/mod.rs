pub mod baseline;
pub mod matching;
pub mod scoring;

pub use baseline::{BenchmarkRun, RunComparison, ScorecardDelta, compare};
pub use matching::{MatchOutcome, MatchPair, match_boxes};
pub use scoring::{
    AggregateScores, PhotoReport, PhotoStatus, RecognitionCard, Scorecard, ScoringEngine,
};
