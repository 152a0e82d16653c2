//! # Activity Soundtrack
//!
//! Splits a recorded GPS activity into segments, one per music track that was
//! playing, and simplifies each segment's route to keep payloads small.
//!
//! This library provides:
//! - Coordinate validation that drops malformed samples
//! - Douglas-Peucker route simplification with an explicit work-stack
//! - Lockstep merging of GPS samples with track play windows
//! - Segment assembly with simplification statistics
//! - Parallel processing for batches of activities
//!
//! ## Features
//!
//! - **`parallel`** - Enable parallel processing with rayon
//! - **`full`** - Enable all features
//!
//! ## Quick Start
//!
//! ```rust
//! use activity_soundtrack::{
//!     build_activity_soundtrack, GeoSample, SegmentConfig, Track, TrackWindow,
//! };
//! use chrono::{Duration, TimeZone, Utc};
//!
//! let t0 = Utc.with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap();
//! let samples: Vec<GeoSample> = (0..10)
//!     .map(|i| GeoSample::new(t0 + Duration::seconds(i * 10), 48.8566 + i as f64 * 0.0001, 2.3522))
//!     .collect();
//!
//! let track = Track::new("track-1", "Song Title", "Artist");
//! let windows = vec![TrackWindow::new(track, t0 + Duration::seconds(30), t0 + Duration::seconds(60))];
//!
//! let result = build_activity_soundtrack(samples, windows, &SegmentConfig::default()).unwrap();
//! assert_eq!(result.stats.total_segments, 3);
//! assert_eq!(result.stats.segments_with_music, 1);
//! ```

use chrono::{DateTime, Utc};
use log::{debug, info};
use serde::{Deserialize, Serialize};

// Unified error handling
pub mod error;
pub use error::{Result, SegmentError};

// Geographic utilities (distance, bounds, unit conversion)
pub mod geo_utils;

// Coordinate validation
pub mod validate;
pub use validate::{validate_samples, ValidationReport};

// Douglas-Peucker route simplification
pub mod simplify;
pub use simplify::{simplify_indices, simplify_samples};

// Merging GPS samples with track windows
pub mod merge;
pub use merge::{merge_streams, MergeOutcome, MergeReport, RawSegment};

// Segment assembly and statistics
pub mod segments;
pub use segments::{
    assemble_segments, compute_stats, Segment, SegmentSummary, SimplificationStats,
};

// Columnar stream and listen ingestion
pub mod streams;
pub use streams::{windows_from_listens, ActivityStreams, Listen};

// ============================================================================
// Core Types
// ============================================================================

/// A single sensor reading from an activity.
///
/// # Example
/// ```
/// use activity_soundtrack::GeoSample;
/// use chrono::Utc;
///
/// let sample = GeoSample::new(Utc::now(), 48.8566, 2.3522); // Paris
/// assert!(sample.is_valid());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoSample {
    pub time: DateTime<Utc>,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub altitude: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heart_rate: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cadence: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub watts: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub velocity: Option<f32>,
    /// Cumulative distance in meters, as reported by the recording device
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

impl GeoSample {
    /// Create a sample with position only.
    pub fn new(time: DateTime<Utc>, latitude: f64, longitude: f64) -> Self {
        Self {
            time,
            latitude,
            longitude,
            altitude: None,
            heart_rate: None,
            cadence: None,
            watts: None,
            velocity: None,
            distance: None,
            temperature: None,
        }
    }

    /// Check if the sample has valid coordinates.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && self.latitude >= -90.0
            && self.latitude <= 90.0
            && self.longitude >= -180.0
            && self.longitude <= 180.0
    }
}

/// Bounding box for a set of samples.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

impl Bounds {
    /// Get the center point of the bounds as `(latitude, longitude)`.
    pub fn center(&self) -> (f64, f64) {
        (
            (self.min_lat + self.max_lat) / 2.0,
            (self.min_lng + self.max_lng) / 2.0,
        )
    }
}

/// Display metadata for a played track.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    pub id: String,
    pub name: String,
    pub artist_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub album_name: Option<String>,
}

impl Track {
    /// Create a track without album information.
    pub fn new(id: &str, name: &str, artist_name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            artist_name: artist_name.to_string(),
            album_name: None,
        }
    }

    /// Attach an album name.
    pub fn with_album(mut self, album_name: &str) -> Self {
        self.album_name = Some(album_name.to_string());
        self
    }
}

/// The interval during which one track was playing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackWindow {
    pub track: Track,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

impl TrackWindow {
    pub fn new(track: Track, start_time: DateTime<Utc>, end_time: DateTime<Utc>) -> Self {
        Self { track, start_time, end_time }
    }

    /// True when the window starts and ends at the same instant.
    pub fn is_zero_length(&self) -> bool {
        self.start_time == self.end_time
    }
}

/// Configuration for segment building.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentConfig {
    /// Tolerance for Douglas-Peucker simplification (in degrees).
    /// Smaller values preserve more detail. Default: 0.00005 (~5.5 meters)
    pub tolerance: f64,

    /// Whether to simplify each segment's points.
    /// Default: true
    pub simplify: bool,
}

impl Default for SegmentConfig {
    fn default() -> Self {
        Self {
            tolerance: 0.00005,
            simplify: true,
        }
    }
}

impl SegmentConfig {
    /// Build a config from a tolerance in meters, converted to degrees at the
    /// given reference latitude.
    ///
    /// # Example
    /// ```
    /// use activity_soundtrack::SegmentConfig;
    ///
    /// let config = SegmentConfig::with_tolerance_meters(10.0, 0.0);
    /// assert!((config.tolerance - 10.0 / 111_320.0).abs() < 1e-12);
    /// ```
    pub fn with_tolerance_meters(meters: f64, latitude: f64) -> Self {
        Self {
            tolerance: geo_utils::meters_to_degrees(meters, latitude),
            ..Self::default()
        }
    }

    fn check(&self) -> Result<()> {
        if self.simplify && (self.tolerance.is_nan() || self.tolerance < 0.0) {
            return Err(SegmentError::InvalidTolerance(self.tolerance));
        }
        Ok(())
    }
}

/// Data-quality counters for one invocation.
///
/// None of these conditions are errors; they are reported so the caller can
/// surface them upstream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostics {
    /// Samples received before validation
    pub total_samples: usize,
    /// Samples dropped for non-finite or out-of-range coordinates
    pub invalid_samples: usize,
    /// Windows truncated because a later window started before they ended
    pub overlapping_windows: usize,
    /// Windows that cover no time, either as given or after truncation
    pub zero_length_windows: usize,
    /// Windows dropped for lying entirely outside the GPS time range
    pub windows_outside_range: usize,
}

/// Result of processing one activity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivitySoundtrack {
    pub segments: Vec<Segment>,
    pub stats: SimplificationStats,
    pub diagnostics: Diagnostics,
}

/// Input for batch processing.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivityInput {
    pub activity_id: String,
    pub samples: Vec<GeoSample>,
    pub windows: Vec<TrackWindow>,
}

// ============================================================================
// Core Functions
// ============================================================================

/// Split an activity into per-track segments.
///
/// Invalid samples are dropped, the remaining samples are merged with the
/// track windows, and each segment is simplified on its own when
/// `config.simplify` is set.
///
/// # Errors
///
/// Returns an error if:
/// - `config.tolerance` is negative or NaN while simplification is enabled
/// - a track window ends before it starts
/// - a merged segment is out of time order
///
/// # Example
/// ```
/// use activity_soundtrack::{build_activity_soundtrack, SegmentConfig};
///
/// let result = build_activity_soundtrack(vec![], vec![], &SegmentConfig::default()).unwrap();
/// assert!(result.segments.is_empty());
/// assert_eq!(result.stats.reduction_ratio, 0.0);
/// ```
pub fn build_activity_soundtrack(
    samples: Vec<GeoSample>,
    windows: Vec<TrackWindow>,
    config: &SegmentConfig,
) -> Result<ActivitySoundtrack> {
    config.check()?;

    let (valid, validation) = validate_samples(samples);
    debug!(
        "Merging {} samples with {} track windows",
        valid.len(),
        windows.len()
    );

    let MergeOutcome { segments: raw, report } = merge_streams(valid, windows)?;
    let segments = assemble_segments(raw, config)?;
    let stats = compute_stats(&segments);

    info!(
        "Built {} segments ({} with music), {} -> {} points",
        stats.total_segments,
        stats.segments_with_music,
        stats.original_points,
        stats.simplified_points
    );

    Ok(ActivitySoundtrack {
        segments,
        stats,
        diagnostics: Diagnostics {
            total_samples: validation.total,
            invalid_samples: validation.invalid,
            overlapping_windows: report.overlapping_windows,
            zero_length_windows: report.zero_length_windows,
            windows_outside_range: report.windows_outside_range,
        },
    })
}

/// Process several activities one after another.
///
/// Results are returned in input order, paired with their activity ID. A
/// failure in one activity does not affect the others.
pub fn build_soundtracks_batch(
    activities: Vec<ActivityInput>,
    config: &SegmentConfig,
) -> Vec<(String, Result<ActivitySoundtrack>)> {
    activities
        .into_iter()
        .map(|activity| {
            let result = build_activity_soundtrack(activity.samples, activity.windows, config);
            (activity.activity_id, result)
        })
        .collect()
}

/// Process several activities using parallel processing.
///
/// This is the same as `build_soundtracks_batch` but uses rayon to process
/// activities concurrently. Each activity is independent, so output is
/// identical to the sequential version.
#[cfg(feature = "parallel")]
pub fn build_soundtracks_parallel(
    activities: Vec<ActivityInput>,
    config: &SegmentConfig,
) -> Vec<(String, Result<ActivitySoundtrack>)> {
    use rayon::prelude::*;

    let start = std::time::Instant::now();
    let count = activities.len();

    let results: Vec<(String, Result<ActivitySoundtrack>)> = activities
        .into_par_iter()
        .map(|activity| {
            let result = build_activity_soundtrack(activity.samples, activity.windows, config);
            (activity.activity_id, result)
        })
        .collect();

    info!("Processed {} activities in {:?}", count, start.elapsed());
    results
}

// ============================================================================
// Tests
// ============================================================================
