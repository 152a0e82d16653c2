//! Ingestion of columnar activity streams and listen history.
//!
//! Fitness platforms deliver an activity as parallel arrays, one per sensor,
//! indexed by a shared array of time offsets. Listen history records only when
//! each track started. Both are converted here into the row-oriented
//! [`GeoSample`] and [`TrackWindow`] inputs of the segment engine.

use chrono::{DateTime, Duration, Utc};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::{GeoSample, Result, SegmentError, Track, TrackWindow};

/// Columnar sensor streams for one activity.
///
/// `time` holds offsets in seconds from `start_time`. Every other stream, when
/// present, must have exactly one value per offset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActivityStreams {
    pub start_time: DateTime<Utc>,
    #[serde(default)]
    pub time: Option<Vec<f64>>,
    /// `[latitude, longitude]` pairs
    #[serde(default)]
    pub latlng: Option<Vec<[f64; 2]>>,
    #[serde(default)]
    pub altitude: Option<Vec<f32>>,
    #[serde(default)]
    pub heart_rate: Option<Vec<i32>>,
    #[serde(default)]
    pub cadence: Option<Vec<i32>>,
    #[serde(default)]
    pub watts: Option<Vec<f32>>,
    #[serde(default)]
    pub velocity: Option<Vec<f32>>,
    #[serde(default)]
    pub distance: Option<Vec<f32>>,
    #[serde(default)]
    pub temperature: Option<Vec<f32>>,
}

impl ActivityStreams {
    /// Convert the streams into time-stamped samples, in stream order.
    ///
    /// Coordinates are not validated here; that happens when the samples are
    /// passed to [`crate::build_activity_soundtrack`].
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - the `time` or `latlng` stream is missing
    /// - any present stream has a different length than `time`
    /// - a time offset is not finite or falls outside the representable range
    ///
    /// # Example
    /// ```
    /// use activity_soundtrack::ActivityStreams;
    /// use chrono::Utc;
    ///
    /// let streams = ActivityStreams {
    ///     start_time: Utc::now(),
    ///     time: Some(vec![0.0, 1.0, 2.0]),
    ///     latlng: Some(vec![[48.8566, 2.3522], [48.8567, 2.3522], [48.8568, 2.3523]]),
    ///     heart_rate: Some(vec![120, 122, 125]),
    ///     ..ActivityStreams::default()
    /// };
    ///
    /// let samples = streams.into_samples().unwrap();
    /// assert_eq!(samples.len(), 3);
    /// assert_eq!(samples[2].heart_rate, Some(125));
    /// ```
    pub fn into_samples(self) -> Result<Vec<GeoSample>> {
        let time = self
            .time
            .ok_or_else(|| SegmentError::MissingStream("time".to_string()))?;
        let latlng = self
            .latlng
            .ok_or_else(|| SegmentError::MissingStream("latlng".to_string()))?;

        let expected = time.len();
        check_len("latlng", expected, Some(&latlng))?;
        check_len("altitude", expected, self.altitude.as_ref())?;
        check_len("heart_rate", expected, self.heart_rate.as_ref())?;
        check_len("cadence", expected, self.cadence.as_ref())?;
        check_len("watts", expected, self.watts.as_ref())?;
        check_len("velocity", expected, self.velocity.as_ref())?;
        check_len("distance", expected, self.distance.as_ref())?;
        check_len("temperature", expected, self.temperature.as_ref())?;

        let samples = time
            .iter()
            .zip(&latlng)
            .enumerate()
            .map(|(i, (&offset, &[lat, lng]))| {
                let mut sample = GeoSample::new(offset_to_time(self.start_time, offset)?, lat, lng);
                sample.altitude = value_at(&self.altitude, i);
                sample.heart_rate = value_at(&self.heart_rate, i);
                sample.cadence = value_at(&self.cadence, i);
                sample.watts = value_at(&self.watts, i);
                sample.velocity = value_at(&self.velocity, i);
                sample.distance = value_at(&self.distance, i);
                sample.temperature = value_at(&self.temperature, i);
                Ok(sample)
            })
            .collect::<Result<Vec<_>>>()?;

        debug!("Converted {} stream rows into samples", samples.len());
        Ok(samples)
    }
}

fn check_len<T>(stream: &str, expected: usize, values: Option<&Vec<T>>) -> Result<()> {
    match values {
        Some(values) if values.len() != expected => Err(SegmentError::InconsistentStreams {
            stream: stream.to_string(),
            expected,
            actual: values.len(),
        }),
        _ => Ok(()),
    }
}

#[inline]
fn value_at<T: Copy>(values: &Option<Vec<T>>, i: usize) -> Option<T> {
    values.as_ref().and_then(|v| v.get(i).copied())
}

/// Offsets are rounded to the nearest millisecond.
fn offset_to_time(start: DateTime<Utc>, offset: f64) -> Result<DateTime<Utc>> {
    let millis = (offset * 1000.0).round();
    if !millis.is_finite() || millis.abs() >= i64::MAX as f64 {
        return Err(SegmentError::InvalidTimestamp(offset));
    }

    Duration::try_milliseconds(millis as i64)
        .and_then(|delta| start.checked_add_signed(delta))
        .ok_or(SegmentError::InvalidTimestamp(offset))
}

/// A track that started playing at `played_at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listen {
    pub played_at: DateTime<Utc>,
    pub track: Track,
}

impl Listen {
    pub fn new(track: Track, played_at: DateTime<Utc>) -> Self {
        Self { played_at, track }
    }
}

/// Turn play-start events into track windows.
///
/// Listens are ordered by `played_at` (stable, so simultaneous listens keep
/// their input order). Each track plays until the next one starts; the last
/// plays until `activity_end`, or ends immediately if the activity ended
/// before it started.
///
/// # Example
/// ```
/// use activity_soundtrack::{windows_from_listens, Listen, Track};
/// use chrono::{Duration, Utc};
///
/// let t0 = Utc::now();
/// let listens = vec![
///     Listen::new(Track::new("b", "Second", "Artist"), t0 + Duration::minutes(3)),
///     Listen::new(Track::new("a", "First", "Artist"), t0),
/// ];
///
/// let windows = windows_from_listens(listens, t0 + Duration::minutes(10));
/// assert_eq!(windows[0].track.id, "a");
/// assert_eq!(windows[0].end_time, t0 + Duration::minutes(3));
/// assert_eq!(windows[1].end_time, t0 + Duration::minutes(10));
/// ```
pub fn windows_from_listens(mut listens: Vec<Listen>, activity_end: DateTime<Utc>) -> Vec<TrackWindow> {
    listens.sort_by_key(|l| l.played_at);

    let next_starts: Vec<DateTime<Utc>> = listens.iter().skip(1).map(|l| l.played_at).collect();
    let mut next_starts = next_starts.into_iter();

    listens
        .into_iter()
        .map(|listen| {
            let end_time = next_starts
                .next()
                .unwrap_or_else(|| activity_end.max(listen.played_at));
            TrackWindow::new(listen.track, listen.played_at, end_time)
        })
        .collect()
}
