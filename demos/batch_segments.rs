//! Example of building segments for many activities at once.
//!
//! Run with: cargo run --example batch_segments --features parallel

use activity_soundtrack::{
    build_soundtracks_parallel, ActivityInput, GeoSample, SegmentConfig, Track, TrackWindow,
};
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::time::Instant;

fn main() {
    println!("Batch Segment Building Example\n");

    let day = Utc.with_ymd_and_hms(2024, 6, 1, 7, 0, 0).unwrap();
    let bases = [(51.5074, -0.1278), (48.8566, 2.3522), (40.7128, -74.0060)];

    // One activity per base location per day, each with a few tracks
    let activities: Vec<ActivityInput> = (0..60)
        .map(|i| {
            let (lat, lng) = bases[i % bases.len()];
            let start = day + Duration::days(i as i64);
            ActivityInput {
                activity_id: format!("activity-{}", i),
                samples: make_route(start, lat, lng, 2_000, 0.00001 * (i % 4) as f64),
                windows: make_windows(start, i),
            }
        })
        .collect();

    println!("Created {} activities\n", activities.len());

    let config = SegmentConfig::default();

    let start = Instant::now();
    let results = build_soundtracks_parallel(activities, &config);
    let elapsed = start.elapsed();

    println!("Processing completed in {:?}\n", elapsed);

    let mut original = 0;
    let mut simplified = 0;
    let mut failures = 0;
    for (id, result) in &results {
        match result {
            Ok(soundtrack) => {
                original += soundtrack.stats.original_points;
                simplified += soundtrack.stats.simplified_points;
            }
            Err(e) => {
                failures += 1;
                println!("  {} failed: {}", id, e);
            }
        }
    }

    println!("Stats:");
    println!("  Activities: {}", results.len());
    println!("  Failures: {}", failures);
    println!("  Points: {} -> {}", original, simplified);
}

/// A wandering route sampled every second, with noise to simulate GPS variation
fn make_route(start: DateTime<Utc>, lat: f64, lng: f64, count: usize, noise: f64) -> Vec<GeoSample> {
    (0..count)
        .map(|i| {
            let t = i as f64 / count as f64;
            let jitter = noise * (i as f64 % 2.0 - 0.5);
            GeoSample::new(
                start + Duration::seconds(i as i64),
                lat + 0.01 * t + jitter,
                lng + 0.005 * (t * 12.0).sin(),
            )
        })
        .collect()
}

/// Three-minute tracks, starting two minutes into the activity
fn make_windows(start: DateTime<Utc>, seed: usize) -> Vec<TrackWindow> {
    (0..8)
        .map(|k| {
            let track = Track::new(&format!("track-{}", (seed + k) % 20), "Song", "Artist");
            let from = start + Duration::seconds(120 + k as i64 * 180);
            TrackWindow::new(track, from, from + Duration::seconds(180))
        })
        .collect()
}
