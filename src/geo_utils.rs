//! # Geographic Utilities
//!
//! Geographic computations used when summarizing activity segments.
//!
//! ## Overview
//!
//! | Function | Description |
//! |----------|-------------|
//! | [`haversine_distance`] | Great-circle distance between two samples |
//! | [`polyline_length`] | Total length of a sample sequence in meters |
//! | [`compute_bounds`] | Bounding box of a sample sequence |
//! | [`meters_to_degrees`] | Convert meters to approximate degrees at a latitude |
//!
//! ## Example
//!
//! ```rust
//! use activity_soundtrack::{GeoSample, geo_utils};
//! use chrono::Utc;
//!
//! let now = Utc::now();
//! let track = vec![
//!     GeoSample::new(now, 51.5074, -0.1278),  // London
//!     GeoSample::new(now, 51.5080, -0.1290),
//!     GeoSample::new(now, 51.5090, -0.1300),
//! ];
//!
//! let length = geo_utils::polyline_length(&track);
//! println!("Track length: {:.0}m", length);
//!
//! let bounds = geo_utils::compute_bounds(&track).unwrap();
//! println!("Bounds: {:.4}N to {:.4}N", bounds.min_lat, bounds.max_lat);
//! ```
//!
//! ## Coordinate System
//!
//! All functions expect WGS84 coordinates (latitude/longitude in degrees), which is the
//! standard used by GPS receivers and fitness platforms.

use geo::{Distance, Haversine, Point};
use crate::{Bounds, GeoSample};

// =============================================================================
// Distance Functions
// =============================================================================

/// Calculate the great-circle distance between two samples using the Haversine formula.
///
/// Returns the distance in meters along the Earth's surface (assuming a spherical Earth
/// with radius 6,371 km).
///
/// # Example
///
/// ```rust
/// use activity_soundtrack::{GeoSample, geo_utils};
/// use chrono::Utc;
///
/// let now = Utc::now();
/// let london = GeoSample::new(now, 51.5074, -0.1278);
/// let paris = GeoSample::new(now, 48.8566, 2.3522);
///
/// let distance = geo_utils::haversine_distance(&london, &paris);
/// assert!((distance - 343_560.0).abs() < 1000.0); // ~344 km
/// ```
#[inline]
pub fn haversine_distance(p1: &GeoSample, p2: &GeoSample) -> f64 {
    let point1 = Point::new(p1.longitude, p1.latitude);
    let point2 = Point::new(p2.longitude, p2.latitude);
    Haversine::distance(point1, point2)
}

/// Calculate the total length of a sample sequence in meters.
///
/// Sums the haversine distance between consecutive samples. Empty or single-sample
/// sequences return 0.0.
pub fn polyline_length(points: &[GeoSample]) -> f64 {
    if points.len() < 2 {
        return 0.0;
    }

    points
        .windows(2)
        .map(|w| haversine_distance(&w[0], &w[1]))
        .sum()
}

/// Convert meters to approximate degrees at a given latitude.
///
/// Uses the longitude scale at the given latitude, which is the larger of the two
/// degree values, so a tolerance converted this way never under-simplifies east-west.
///
/// # Notes
///
/// - At the equator, 1 degree ≈ 111,320 meters
/// - At 45°N/S, 1 degree of longitude ≈ 78,710 meters
/// - Near the poles the cosine is clamped to 0.1 to keep the result finite
#[inline]
pub fn meters_to_degrees(meters: f64, latitude: f64) -> f64 {
    let lat_rad = latitude.to_radians();
    let meters_per_degree = 111_320.0 * lat_rad.cos().max(0.1);
    meters / meters_per_degree
}

// =============================================================================
// Bounding Box Functions
// =============================================================================

/// Compute the bounding box of a sample sequence.
///
/// Returns `None` for empty input.
///
/// # Example
///
/// ```rust
/// use activity_soundtrack::{GeoSample, geo_utils};
/// use chrono::Utc;
///
/// let now = Utc::now();
/// let track = vec![
///     GeoSample::new(now, 51.5000, -0.1300),
///     GeoSample::new(now, 51.5100, -0.1200),
///     GeoSample::new(now, 51.5050, -0.1250),
/// ];
///
/// let bounds = geo_utils::compute_bounds(&track).unwrap();
/// assert_eq!(bounds.min_lat, 51.5000);
/// assert_eq!(bounds.max_lat, 51.5100);
/// assert_eq!(bounds.min_lng, -0.1300);
/// assert_eq!(bounds.max_lng, -0.1200);
/// ```
pub fn compute_bounds(points: &[GeoSample]) -> Option<Bounds> {
    if points.is_empty() {
        return None;
    }

    let mut min_lat = f64::MAX;
    let mut max_lat = f64::MIN;
    let mut min_lng = f64::MAX;
    let mut max_lng = f64::MIN;

    for p in points {
        min_lat = min_lat.min(p.latitude);
        max_lat = max_lat.max(p.latitude);
        min_lng = min_lng.min(p.longitude);
        max_lng = max_lng.max(p.longitude);
    }

    Some(Bounds { min_lat, max_lat, min_lng, max_lng })
}

// =============================================================================
// Unit Tests
// =============================================================================
