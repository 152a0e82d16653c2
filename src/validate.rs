//! Coordinate validation.
//!
//! Samples with non-finite or out-of-range coordinates are dropped before
//! merging so that neither the merger nor the simplifier ever sees them.

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::GeoSample;

/// Counts from one validation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    /// Samples received
    pub total: usize,
    /// Samples dropped
    pub invalid: usize,
}

impl ValidationReport {
    pub fn valid(&self) -> usize {
        self.total - self.invalid
    }
}

/// Keep only samples with valid coordinates, preserving input order.
///
/// # Example
/// ```
/// use activity_soundtrack::{validate_samples, GeoSample};
/// use chrono::Utc;
///
/// let now = Utc::now();
/// let samples = vec![
///     GeoSample::new(now, 48.8566, 2.3522),
///     GeoSample::new(now, 91.0, 2.3522),
/// ];
///
/// let (valid, report) = validate_samples(samples);
/// assert_eq!(valid.len(), 1);
/// assert_eq!(report.invalid, 1);
/// ```
pub fn validate_samples(samples: Vec<GeoSample>) -> (Vec<GeoSample>, ValidationReport) {
    let total = samples.len();

    let valid: Vec<GeoSample> = samples
        .into_iter()
        .filter(|s| {
            let ok = s.is_valid();
            if !ok {
                debug!(
                    "Dropping sample at {} with invalid coordinates ({}, {})",
                    s.time, s.latitude, s.longitude
                );
            }
            ok
        })
        .collect();

    let report = ValidationReport {
        total,
        invalid: total - valid.len(),
    };

    if report.invalid > 0 {
        warn!(
            "Dropped {} of {} samples with invalid coordinates",
            report.invalid, report.total
        );
    }

    (valid, report)
}
