//! # Stream Merging
//!
//! Partitions a GPS sample stream into segments aligned to track play windows.
//!
//! ## Algorithm
//! 1. Stable-sort samples by time and windows by start time
//! 2. Truncate each window at the next window's start, so the later window wins
//!    any overlap
//! 3. Clip windows to the sample time range, dropping those entirely outside it
//! 4. Fill every uncovered interval with a no-track segment
//! 5. Walk the samples once, handing each to the segment whose interval holds it
//!
//! Segments are half-open `[start, end)` except the last one, which is closed so
//! the final sample always has a home. When there are no samples, each window
//! becomes one empty segment and no gaps are emitted.

use chrono::{DateTime, Utc};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::{GeoSample, Result, SegmentError, Track, TrackWindow};

/// A segment before simplification and indexing.
#[derive(Debug, Clone, PartialEq)]
pub struct RawSegment {
    pub track: Option<Track>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub points: Vec<GeoSample>,
}

/// Track-window irregularities resolved during merging.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeReport {
    pub overlapping_windows: usize,
    pub zero_length_windows: usize,
    pub windows_outside_range: usize,
}

/// Segments produced by [`merge_streams`] plus what had to be fixed up.
#[derive(Debug, Clone, PartialEq)]
pub struct MergeOutcome {
    pub segments: Vec<RawSegment>,
    pub report: MergeReport,
}

/// A window after overlap resolution, before clipping.
#[derive(Debug)]
struct ResolvedWindow {
    track: Track,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl ResolvedWindow {
    fn is_instant(&self) -> bool {
        self.start == self.end
    }
}

/// An interval on the output timeline, before samples are assigned.
#[derive(Debug)]
struct Slot {
    track: Option<Track>,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

/// Merge validated samples with track windows into contiguous segments.
///
/// Every sample ends up in exactly one segment, and with a non-empty sample
/// stream the segments exactly cover `[first sample, last sample]`.
///
/// # Errors
///
/// Returns [`SegmentError::InvertedWindow`] if any window ends before it starts.
///
/// # Example
/// ```
/// use activity_soundtrack::{merge_streams, GeoSample, Track, TrackWindow};
/// use chrono::{Duration, TimeZone, Utc};
///
/// let t0 = Utc.with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap();
/// let samples: Vec<GeoSample> = (0..5)
///     .map(|i| GeoSample::new(t0 + Duration::seconds(i * 10), 48.0, 2.0))
///     .collect();
/// let windows = vec![TrackWindow::new(
///     Track::new("t1", "Song", "Artist"),
///     t0 + Duration::seconds(10),
///     t0 + Duration::seconds(30),
/// )];
///
/// let outcome = merge_streams(samples, windows).unwrap();
/// let counts: Vec<usize> = outcome.segments.iter().map(|s| s.points.len()).collect();
/// assert_eq!(counts, vec![1, 2, 2]);
/// ```
pub fn merge_streams(
    mut samples: Vec<GeoSample>,
    mut windows: Vec<TrackWindow>,
) -> Result<MergeOutcome> {
    if let Some(w) = windows.iter().find(|w| w.end_time < w.start_time) {
        return Err(SegmentError::InvertedWindow {
            track_id: w.track.id.clone(),
            start: w.start_time,
            end: w.end_time,
        });
    }

    // Both sorts are stable, so input order breaks ties
    samples.sort_by_key(|s| s.time);
    windows.sort_by_key(|w| w.start_time);

    let mut report = MergeReport::default();
    let resolved = resolve_overlaps(windows, &mut report);

    let range = match (samples.first(), samples.last()) {
        (Some(first), Some(last)) => Some((first.time, last.time)),
        _ => None,
    };

    let segments = match range {
        Some((range_start, range_end)) => {
            let slots = build_timeline(resolved, range_start, range_end, &mut report);
            distribute_samples(slots, samples)
        }
        None => resolved
            .into_iter()
            .map(|w| RawSegment {
                track: Some(w.track),
                start_time: w.start,
                end_time: w.end,
                points: Vec::new(),
            })
            .collect(),
    };

    Ok(MergeOutcome { segments, report })
}

/// Truncate every window at the start of the window that follows it.
fn resolve_overlaps(windows: Vec<TrackWindow>, report: &mut MergeReport) -> Vec<ResolvedWindow> {
    let next_starts: Vec<Option<DateTime<Utc>>> = windows
        .iter()
        .skip(1)
        .map(|w| Some(w.start_time))
        .chain(std::iter::once(None))
        .collect();

    windows
        .into_iter()
        .zip(next_starts)
        .map(|(w, next_start)| {
            let mut end = w.end_time;
            if let Some(next_start) = next_start {
                if next_start < end {
                    warn!(
                        "Track window {} overlaps the next window, truncating {} -> {}",
                        w.track.id, end, next_start
                    );
                    report.overlapping_windows += 1;
                    end = next_start;
                }
            }

            let resolved = ResolvedWindow {
                track: w.track,
                start: w.start_time,
                end,
            };
            if resolved.is_instant() {
                report.zero_length_windows += 1;
            }
            resolved
        })
        .collect()
}

/// Lay windows and no-track gaps end to end over `[range_start, range_end]`.
fn build_timeline(
    windows: Vec<ResolvedWindow>,
    range_start: DateTime<Utc>,
    range_end: DateTime<Utc>,
    report: &mut MergeReport,
) -> Vec<Slot> {
    let mut slots = Vec::with_capacity(windows.len() * 2 + 1);
    let mut cursor = range_start;
    // Whether the last window really plays through the final sample
    let mut covers_end = false;

    for w in windows {
        let instant = w.is_instant();
        let inside = w.start <= range_end
            && (w.end > range_start || (instant && w.start >= range_start));
        if !inside {
            debug!(
                "Track window {} ({} - {}) lies outside the GPS range",
                w.track.id, w.start, w.end
            );
            report.windows_outside_range += 1;
            continue;
        }

        let start = w.start.max(range_start);
        let end = w.end.min(range_end);

        if start > cursor {
            slots.push(Slot { track: None, start: cursor, end: start });
        }

        covers_end = !instant && w.end > range_end;
        slots.push(Slot { track: Some(w.track), start, end });
        cursor = end;
    }

    if cursor < range_end || !covers_end {
        slots.push(Slot { track: None, start: cursor, end: range_end });
    }

    slots
}

/// Hand each time-sorted sample to its slot in a single pass.
fn distribute_samples(slots: Vec<Slot>, samples: Vec<GeoSample>) -> Vec<RawSegment> {
    let last = slots.len().saturating_sub(1);
    let mut remaining = samples.into_iter().peekable();

    slots
        .into_iter()
        .enumerate()
        .map(|(i, slot)| {
            let points: Vec<GeoSample> = if i == last {
                remaining.by_ref().collect()
            } else {
                let mut points = Vec::new();
                while let Some(sample) = remaining.next_if(|s| s.time < slot.end) {
                    points.push(sample);
                }
                points
            };

            RawSegment {
                track: slot.track,
                start_time: slot.start,
                end_time: slot.end,
                points,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(seconds: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap() + Duration::seconds(seconds)
    }

    fn samples_at(times: &[i64]) -> Vec<GeoSample> {
        times
            .iter()
            .map(|&t| GeoSample::new(at(t), 48.0 + t as f64 * 0.0001, 2.0))
            .collect()
    }

    fn window(id: &str, start: i64, end: i64) -> TrackWindow {
        TrackWindow::new(Track::new(id, "Song", "Artist"), at(start), at(end))
    }

    fn track_id(segment: &RawSegment) -> Option<&str> {
        segment.track.as_ref().map(|t| t.id.as_str())
    }

    fn point_times(segment: &RawSegment) -> Vec<DateTime<Utc>> {
        segment.points.iter().map(|p| p.time).collect()
    }

    fn bounds(segment: &RawSegment) -> (DateTime<Utc>, DateTime<Utc>) {
        (segment.start_time, segment.end_time)
    }

    /// Segments tile the sample range and every sample lands inside its segment.
    fn assert_well_formed(segments: &[RawSegment], sample_count: usize) {
        let total: usize = segments.iter().map(|s| s.points.len()).sum();
        assert_eq!(total, sample_count);

        for pair in segments.windows(2) {
            assert_eq!(pair[0].end_time, pair[1].start_time);
        }

        let last = segments.len() - 1;
        for (i, segment) in segments.iter().enumerate() {
            assert!(segment.start_time <= segment.end_time);
            for p in &segment.points {
                assert!(p.time >= segment.start_time);
                if i == last {
                    assert!(p.time <= segment.end_time);
                } else {
                    assert!(p.time < segment.end_time);
                }
            }
            assert!(segment.points.windows(2).all(|w| w[0].time <= w[1].time));
        }
    }

    #[test]
    fn test_empty_inputs() {
        let outcome = merge_streams(vec![], vec![]).unwrap();
        assert!(outcome.segments.is_empty());
        assert_eq!(outcome.report, MergeReport::default());
    }

    #[test]
    fn test_no_windows_single_segment() {
        let outcome = merge_streams(samples_at(&[0, 10, 20]), vec![]).unwrap();

        assert_eq!(outcome.segments.len(), 1);
        let segment = &outcome.segments[0];
        assert!(segment.track.is_none());
        assert_eq!(bounds(segment), (at(0), at(20)));
        assert_eq!(segment.points.len(), 3);
    }

    #[test]
    fn test_single_sample() {
        let outcome = merge_streams(samples_at(&[5]), vec![]).unwrap();
        assert_eq!(outcome.segments.len(), 1);
        assert_eq!(bounds(&outcome.segments[0]), (at(5), at(5)));
        assert_eq!(outcome.segments[0].points.len(), 1);
    }

    #[test]
    fn test_no_samples_one_segment_per_window() {
        let windows = vec![window("a", 0, 30), window("b", 60, 90), window("c", 80, 100)];
        let outcome = merge_streams(vec![], windows).unwrap();

        assert_eq!(outcome.segments.len(), 3);
        assert!(outcome.segments.iter().all(|s| s.points.is_empty()));
        assert_eq!(bounds(&outcome.segments[0]), (at(0), at(30)));
        // Overlaps are still resolved, gaps are not filled
        assert_eq!(bounds(&outcome.segments[1]), (at(60), at(80)));
        assert_eq!(bounds(&outcome.segments[2]), (at(80), at(100)));
        assert_eq!(outcome.report.overlapping_windows, 1);
    }

    #[test]
    fn test_track_in_middle() {
        let outcome = merge_streams(samples_at(&[0, 10, 20, 30, 40]), vec![window("t1", 10, 30)]).unwrap();
        let segments = &outcome.segments;

        assert_eq!(segments.len(), 3);
        assert_eq!(track_id(&segments[0]), None);
        assert_eq!(track_id(&segments[1]), Some("t1"));
        assert_eq!(track_id(&segments[2]), None);

        assert_eq!(bounds(&segments[0]), (at(0), at(10)));
        assert_eq!(bounds(&segments[1]), (at(10), at(30)));
        assert_eq!(bounds(&segments[2]), (at(30), at(40)));

        assert_eq!(point_times(&segments[0]), vec![at(0)]);
        assert_eq!(point_times(&segments[1]), vec![at(10), at(20)]);
        assert_eq!(point_times(&segments[2]), vec![at(30), at(40)]);
        assert_well_formed(segments, 5);
    }

    #[test]
    fn test_gap_without_coverage_is_empty_segment() {
        let samples = samples_at(&[0, 10, 20, 80, 90, 100]);
        let windows = vec![window("a", 0, 25), window("b", 60, 120)];
        let outcome = merge_streams(samples, windows).unwrap();
        let segments = &outcome.segments;

        assert_eq!(segments.len(), 3);
        assert_eq!(track_id(&segments[0]), Some("a"));
        assert_eq!(track_id(&segments[1]), None);
        assert_eq!(bounds(&segments[1]), (at(25), at(60)));
        assert!(segments[1].points.is_empty());
        // Clipped to the last sample, which it holds
        assert_eq!(bounds(&segments[2]), (at(60), at(100)));
        assert_eq!(point_times(&segments[2]), vec![at(80), at(90), at(100)]);
        assert_well_formed(segments, 6);
    }

    #[test]
    fn test_adjacent_windows_have_no_gap() {
        let samples = samples_at(&[0, 10, 20, 30, 40, 50]);
        let windows = vec![window("a", 0, 20), window("b", 20, 60)];
        let outcome = merge_streams(samples, windows).unwrap();

        assert_eq!(outcome.segments.len(), 2);
        assert_eq!(point_times(&outcome.segments[0]), vec![at(0), at(10)]);
        assert_eq!(outcome.segments[1].points.len(), 4);
        assert_eq!(outcome.report, MergeReport::default());
    }

    #[test]
    fn test_overlap_later_window_wins() {
        let samples = samples_at(&[0, 10, 20, 30, 40, 50]);
        let windows = vec![window("a", 0, 35), window("b", 20, 50)];
        let outcome = merge_streams(samples, windows).unwrap();
        let segments = &outcome.segments;

        assert_eq!(outcome.report.overlapping_windows, 1);
        assert_eq!(bounds(&segments[0]), (at(0), at(20)));
        assert_eq!(point_times(&segments[0]), vec![at(0), at(10)]);
        assert_eq!(track_id(&segments[1]), Some("b"));
        assert_eq!(point_times(&segments[1]), vec![at(20), at(30), at(40)]);
        assert_well_formed(segments, 6);
    }

    #[test]
    fn test_equal_starts_later_input_wins() {
        let samples = samples_at(&[0, 10, 20]);
        let windows = vec![window("first", 0, 30), window("second", 0, 30)];
        let outcome = merge_streams(samples, windows).unwrap();
        let segments = &outcome.segments;

        assert_eq!(segments.len(), 2);
        assert_eq!(track_id(&segments[0]), Some("first"));
        assert_eq!(bounds(&segments[0]), (at(0), at(0)));
        assert!(segments[0].points.is_empty());
        assert_eq!(track_id(&segments[1]), Some("second"));
        assert_eq!(segments[1].points.len(), 3);
        assert_eq!(outcome.report.overlapping_windows, 1);
        assert_eq!(outcome.report.zero_length_windows, 1);
    }

    #[test]
    fn test_contained_window_leaves_gap() {
        let samples = samples_at(&[0, 10, 20, 30, 40, 50, 60]);
        let windows = vec![window("long", 0, 100), window("short", 20, 40)];
        let outcome = merge_streams(samples, windows).unwrap();
        let segments = &outcome.segments;

        assert_eq!(segments.len(), 3);
        assert_eq!(track_id(&segments[0]), Some("long"));
        assert_eq!(bounds(&segments[0]), (at(0), at(20)));
        assert_eq!(track_id(&segments[1]), Some("short"));
        assert_eq!(track_id(&segments[2]), None);
        assert_eq!(bounds(&segments[2]), (at(40), at(60)));
        assert_well_formed(segments, 7);
    }

    #[test]
    fn test_zero_length_window_is_kept() {
        let samples = samples_at(&[0, 10, 20, 30]);
        let windows = vec![window("skip", 15, 15), window("next", 15, 40)];
        let outcome = merge_streams(samples, windows).unwrap();
        let segments = &outcome.segments;

        assert_eq!(segments.len(), 3);
        assert_eq!(track_id(&segments[1]), Some("skip"));
        assert_eq!(bounds(&segments[1]), (at(15), at(15)));
        assert!(segments[1].points.is_empty());
        assert_eq!(point_times(&segments[2]), vec![at(20), at(30)]);
        assert_eq!(outcome.report.zero_length_windows, 1);
        assert_eq!(outcome.report.overlapping_windows, 0);
        assert_well_formed(segments, 4);
    }

    #[test]
    fn test_windows_outside_range_dropped() {
        let samples = samples_at(&[100, 110, 120]);
        let windows = vec![
            window("before", 0, 50),
            window("touching", 50, 100),
            window("during", 105, 115),
            window("after", 200, 250),
        ];
        let outcome = merge_streams(samples, windows).unwrap();
        let segments = &outcome.segments;

        assert_eq!(outcome.report.windows_outside_range, 3);
        assert_eq!(segments.len(), 3);
        assert_eq!(track_id(&segments[1]), Some("during"));
        assert_eq!(bounds(&segments[0]), (at(100), at(105)));
        assert_eq!(bounds(&segments[2]), (at(115), at(120)));
        assert_well_formed(segments, 3);
    }

    #[test]
    fn test_window_starting_before_range_is_clipped() {
        let samples = samples_at(&[100, 110, 120]);
        let outcome = merge_streams(samples, vec![window("early", 50, 112)]).unwrap();
        let segments = &outcome.segments;

        assert_eq!(segments.len(), 2);
        assert_eq!(bounds(&segments[0]), (at(100), at(112)));
        assert_eq!(point_times(&segments[0]), vec![at(100), at(110)]);
        assert_eq!(point_times(&segments[1]), vec![at(120)]);
    }

    #[test]
    fn test_window_ending_at_last_sample() {
        // The window excludes its end instant, so the last sample needs its own segment
        let samples = samples_at(&[0, 10, 20]);
        let outcome = merge_streams(samples, vec![window("t", 0, 20)]).unwrap();
        let segments = &outcome.segments;

        assert_eq!(segments.len(), 2);
        assert_eq!(point_times(&segments[0]), vec![at(0), at(10)]);
        assert_eq!(track_id(&segments[1]), None);
        assert_eq!(bounds(&segments[1]), (at(20), at(20)));
        assert_eq!(point_times(&segments[1]), vec![at(20)]);
    }

    #[test]
    fn test_window_starting_at_last_sample() {
        let samples = samples_at(&[0, 10, 20]);
        let outcome = merge_streams(samples, vec![window("late", 20, 200)]).unwrap();
        let segments = &outcome.segments;

        assert_eq!(segments.len(), 2);
        assert_eq!(bounds(&segments[1]), (at(20), at(20)));
        assert_eq!(track_id(&segments[1]), Some("late"));
        assert_eq!(point_times(&segments[1]), vec![at(20)]);
        assert_eq!(outcome.report.windows_outside_range, 0);
    }

    #[test]
    fn test_zero_length_window_at_last_sample() {
        let samples = samples_at(&[0, 10, 20]);
        let outcome = merge_streams(samples, vec![window("blip", 20, 20)]).unwrap();
        let segments = &outcome.segments;

        assert_eq!(segments.len(), 3);
        assert_eq!(point_times(&segments[0]), vec![at(0), at(10)]);
        assert!(segments[1].points.is_empty());
        assert_eq!(point_times(&segments[2]), vec![at(20)]);
        assert_well_formed(segments, 3);
    }

    #[test]
    fn test_unsorted_inputs_are_sorted() {
        let samples = samples_at(&[30, 0, 20, 10]);
        let windows = vec![window("b", 20, 40), window("a", 0, 20)];
        let outcome = merge_streams(samples, windows).unwrap();
        let segments = &outcome.segments;

        assert_eq!(track_id(&segments[0]), Some("a"));
        assert_eq!(point_times(&segments[0]), vec![at(0), at(10)]);
        assert_eq!(track_id(&segments[1]), Some("b"));
        assert_eq!(point_times(&segments[1]), vec![at(20), at(30)]);
    }

    #[test]
    fn test_inverted_window_rejected() {
        let result = merge_streams(samples_at(&[0, 10]), vec![window("bad", 10, 0)]);
        match result {
            Err(SegmentError::InvertedWindow { track_id, start, end }) => {
                assert_eq!(track_id, "bad");
                assert_eq!(start, at(10));
                assert_eq!(end, at(0));
            }
            other => panic!("expected InvertedWindow, got {other:?}"),
        }
    }

    #[test]
    fn test_coverage_and_conservation() {
        let times: Vec<i64> = (0..200).map(|i| (i * 37) % 1000).collect();
        let windows = vec![
            window("a", -50, 40),
            window("b", 40, 40),
            window("c", 100, 300),
            window("d", 250, 260),
            window("e", 250, 600),
            window("f", 700, 710),
            window("g", 990, 2000),
        ];
        let outcome = merge_streams(samples_at(&times), windows).unwrap();
        let segments = &outcome.segments;

        let min = *times.iter().min().unwrap();
        let max = *times.iter().max().unwrap();
        assert_eq!(segments.first().unwrap().start_time, at(min));
        assert_eq!(segments.last().unwrap().end_time, at(max));
        assert_well_formed(segments, times.len());
    }
}
