//! # Douglas-Peucker Simplification
//!
//! Reduces the number of points in a route while preserving its shape.
//!
//! ## Algorithm
//! 1. Keep the first and last point
//! 2. Find the point farthest from the line through the current range's endpoints
//! 3. If it is farther than the tolerance, keep it and process both halves
//! 4. Otherwise drop every point strictly inside the range
//!
//! Ranges are processed from an explicit work-stack, so very long routes cannot
//! overflow the call stack.
//!
//! Distances are plain Euclidean distances on raw degree coordinates
//! (x = longitude, y = latitude). This is not a geodesic computation; at the
//! few-meter tolerances used for activity routes the distortion is negligible.

use geo::Coord;

use crate::{GeoSample, Result, SegmentError};

/// Simplify a coordinate sequence and return the indices of the kept points.
///
/// Indices are in ascending order and always include the first and last index.
/// Inputs with two or fewer points are returned whole.
///
/// # Errors
///
/// Returns [`SegmentError::InvalidTolerance`] if `tolerance` is negative or NaN.
///
/// # Example
/// ```
/// use activity_soundtrack::simplify_indices;
/// use geo::Coord;
///
/// let coords = vec![
///     Coord { x: 0.0, y: 0.0 },
///     Coord { x: 1.0, y: 0.0 },
///     Coord { x: 2.0, y: 0.0 },
///     Coord { x: 3.0, y: 1.0 },
/// ];
///
/// let kept = simplify_indices(&coords, 0.1).unwrap();
/// assert_eq!(kept, vec![0, 2, 3]);
/// ```
pub fn simplify_indices(coords: &[Coord<f64>], tolerance: f64) -> Result<Vec<usize>> {
    if tolerance.is_nan() || tolerance < 0.0 {
        return Err(SegmentError::InvalidTolerance(tolerance));
    }

    let n = coords.len();
    if n <= 2 {
        return Ok((0..n).collect());
    }

    let keep = douglas_peucker(coords, tolerance);

    Ok(keep
        .iter()
        .enumerate()
        .filter_map(|(i, &k)| if k { Some(i) } else { None })
        .collect())
}

/// Simplify a time-ordered sample sequence, keeping whole samples so that
/// sensor channels survive alongside the kept positions.
///
/// # Errors
///
/// Returns [`SegmentError::InvalidTolerance`] if `tolerance` is negative or NaN.
pub fn simplify_samples(samples: Vec<GeoSample>, tolerance: f64) -> Result<Vec<GeoSample>> {
    let coords: Vec<Coord<f64>> = samples
        .iter()
        .map(|s| Coord { x: s.longitude, y: s.latitude })
        .collect();

    let kept = simplify_indices(&coords, tolerance)?;
    if kept.len() == samples.len() {
        return Ok(samples);
    }

    let mut next = kept.into_iter().peekable();
    Ok(samples
        .into_iter()
        .enumerate()
        .filter_map(|(i, sample)| {
            if next.peek() == Some(&i) {
                next.next();
                Some(sample)
            } else {
                None
            }
        })
        .collect())
}

/// Run Douglas-Peucker over `coords` (at least 3 points) and return keep flags.
fn douglas_peucker(coords: &[Coord<f64>], tolerance: f64) -> Vec<bool> {
    let n = coords.len();
    let mut keep = vec![false; n];
    keep[0] = true;
    keep[n - 1] = true;

    let mut stack = vec![(0, n - 1)];

    while let Some((start, end)) = stack.pop() {
        if end - start <= 1 {
            continue;
        }

        let (max_idx, max_dist) = find_farthest_point(coords, start, end);

        if max_dist > tolerance {
            keep[max_idx] = true;
            stack.push((start, max_idx));
            stack.push((max_idx, end));
        }
    }

    keep
}

/// Find the point strictly inside `(start, end)` farthest from the line through
/// the range endpoints. The first point wins on ties.
fn find_farthest_point(coords: &[Coord<f64>], start: usize, end: usize) -> (usize, f64) {
    let line_start = coords[start];
    let line_end = coords[end];

    let mut max_idx = start;
    let mut max_dist = -1.0;

    for (i, &point) in coords.iter().enumerate().take(end).skip(start + 1) {
        let dist = perpendicular_distance(point, line_start, line_end);
        if dist > max_dist {
            max_dist = dist;
            max_idx = i;
        }
    }

    (max_idx, max_dist)
}

/// Distance from `point` to the infinite line through `line_start` and `line_end`.
///
/// Projects the point onto the line (dot product over squared length) and
/// measures to the projection. A zero-length line falls back to the distance
/// to `line_start`.
fn perpendicular_distance(point: Coord<f64>, line_start: Coord<f64>, line_end: Coord<f64>) -> f64 {
    let dx = line_end.x - line_start.x;
    let dy = line_end.y - line_start.y;
    let length_sq = dx * dx + dy * dy;

    if length_sq == 0.0 {
        return (point.x - line_start.x).hypot(point.y - line_start.y);
    }

    let t = ((point.x - line_start.x) * dx + (point.y - line_start.y) * dy) / length_sq;
    let proj_x = line_start.x + t * dx;
    let proj_y = line_start.y + t * dy;

    (point.x - proj_x).hypot(point.y - proj_y)
}
