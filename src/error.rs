//! Error types for segment building and stream ingestion.
//!
//! Only precondition violations are errors. Malformed samples and overlapping
//! track windows are absorbed and reported through [`crate::Diagnostics`].

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors returned by the segment engine.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SegmentError {
    /// Simplification tolerance was negative or NaN.
    #[error("tolerance must be a non-negative number, got {0}")]
    InvalidTolerance(f64),

    /// A track window ends before it starts.
    #[error("track window for {track_id} ends at {end} before it starts at {start}")]
    InvertedWindow {
        track_id: String,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    /// A merged segment carried samples out of time order.
    #[error("segment {index} has samples out of time order")]
    UnorderedSegment { index: usize },

    /// A required activity stream was not supplied.
    #[error("missing required stream: {0}")]
    MissingStream(String),

    /// An activity stream does not have one value per time offset.
    #[error("stream {stream} has {actual} values, expected {expected}")]
    InconsistentStreams {
        stream: String,
        expected: usize,
        actual: usize,
    },

    /// A time offset could not be turned into a timestamp.
    #[error("invalid time offset {0}s")]
    InvalidTimestamp(f64),
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, SegmentError>;
