//! Segment assembly and simplification statistics.
//!
//! Each merged segment is simplified on its own, which keeps the shape of
//! short segments intact better than simplifying the whole route first and
//! cutting it afterwards.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::geo_utils::{compute_bounds, polyline_length};
use crate::{
    simplify_samples, Bounds, GeoSample, RawSegment, Result, SegmentConfig, SegmentError, Track,
};

/// One track (or silence) and the route recorded while it played.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// Position in the output sequence, starting at 0
    pub index: usize,
    /// Track playing during this segment, `None` when no music was playing
    pub track: Option<Track>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Samples in this segment, simplified when enabled
    pub points: Vec<GeoSample>,
    /// Figures computed from the samples before simplification
    pub summary: SegmentSummary,
}

/// Per-segment figures computed from the unsimplified samples.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SegmentSummary {
    pub original_points: usize,
    /// Haversine length of the recorded path in meters
    pub distance_meters: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounds: Option<Bounds>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_heart_rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_cadence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_watts: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_velocity: Option<f64>,
}

impl SegmentSummary {
    pub fn from_points(points: &[GeoSample]) -> Self {
        Self {
            original_points: points.len(),
            distance_meters: polyline_length(points),
            bounds: compute_bounds(points),
            avg_heart_rate: average(points.iter().filter_map(|p| p.heart_rate)),
            avg_cadence: average(points.iter().filter_map(|p| p.cadence)),
            avg_watts: average(points.iter().filter_map(|p| p.watts)),
            avg_velocity: average(points.iter().filter_map(|p| p.velocity)),
        }
    }
}

/// Aggregate counts over all segments of one activity.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SimplificationStats {
    pub total_segments: usize,
    pub segments_with_music: usize,
    pub segments_without_music: usize,
    pub original_points: usize,
    pub simplified_points: usize,
    /// Fraction of points removed: `1 - simplified / original`, 0 with no points
    pub reduction_ratio: f64,
}

/// Simplify and index merged segments.
///
/// # Errors
///
/// Returns an error if:
/// - a segment's samples are out of time order
/// - `config.tolerance` is negative or NaN while simplification is enabled
pub fn assemble_segments(raw: Vec<RawSegment>, config: &SegmentConfig) -> Result<Vec<Segment>> {
    raw.into_iter()
        .enumerate()
        .map(|(index, segment)| {
            if !segment.points.windows(2).all(|w| w[0].time <= w[1].time) {
                return Err(SegmentError::UnorderedSegment { index });
            }

            let summary = SegmentSummary::from_points(&segment.points);
            let points = if config.simplify {
                simplify_samples(segment.points, config.tolerance)?
            } else {
                segment.points
            };

            Ok(Segment {
                index,
                track: segment.track,
                start_time: segment.start_time,
                end_time: segment.end_time,
                points,
                summary,
            })
        })
        .collect()
}

/// Compute simplification statistics from assembled segments.
pub fn compute_stats(segments: &[Segment]) -> SimplificationStats {
    let total_segments = segments.len();
    let segments_with_music = segments.iter().filter(|s| s.track.is_some()).count();
    let original_points: usize = segments.iter().map(|s| s.summary.original_points).sum();
    let simplified_points: usize = segments.iter().map(|s| s.points.len()).sum();

    let reduction_ratio = if original_points > 0 {
        1.0 - simplified_points as f64 / original_points as f64
    } else {
        0.0
    };

    SimplificationStats {
        total_segments,
        segments_with_music,
        segments_without_music: total_segments - segments_with_music,
        original_points,
        simplified_points,
        reduction_ratio,
    }
}

fn average<T: Into<f64>>(values: impl Iterator<Item = T>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v.into(), count + 1));
    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}
