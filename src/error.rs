use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by the bibscore library.
///
/// Application code (the CLI, demos) wraps these in `anyhow` at the edge.
#[derive(Debug, Error)]
pub enum Error {
    /// A box was constructed with negative extent or coordinates outside
    /// the normalized `[0, 1]` image space. Zero-area boxes are legal and
    /// mean "no coordinates yet".
    #[error("invalid box (x={x}, y={y}, w={w}, h={h}): {reason}")]
    InvalidBox {
        x: f32,
        y: f32,
        w: f32,
        h: f32,
        reason: &'static str,
    },

    /// No baseline run exists at the given location. Distinct from a
    /// zero-delta comparison result.
    #[error("no baseline run found at {0}")]
    NoBaseline(PathBuf),

    /// A baseline run exists but could not be parsed.
    #[error("malformed baseline run at {path}")]
    MalformedBaseline {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("failed to encode benchmark run")]
    Encode(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
