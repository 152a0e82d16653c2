//! Basic example of splitting an activity into per-track segments.
//!
//! Run with: cargo run --example basic_segments

use activity_soundtrack::{
    build_activity_soundtrack, windows_from_listens, ActivityStreams, Listen, SegmentConfig, Track,
};
use chrono::{Duration, TimeZone, Utc};

fn main() {
    let start = Utc.with_ymd_and_hms(2024, 6, 1, 7, 30, 0).unwrap();

    // A 10 minute run sampled every 5 seconds, heading north-east through Paris
    let count = 121;
    let streams = ActivityStreams {
        start_time: start,
        time: Some((0..count).map(|i| i as f64 * 5.0).collect()),
        latlng: Some(
            (0..count)
                .map(|i| {
                    let wobble = if i % 7 == 0 { 0.00008 } else { 0.0 };
                    [48.8566 + i as f64 * 0.0001, 2.3522 + i as f64 * 0.00005 + wobble]
                })
                .collect(),
        ),
        heart_rate: Some((0..count).map(|i| 130 + (i as i32 % 25)).collect()),
        ..ActivityStreams::default()
    };

    let samples = match streams.into_samples() {
        Ok(samples) => samples,
        Err(e) => {
            println!("Could not read streams: {}", e);
            return;
        }
    };

    // Music started a minute in, with two more tracks after that
    let listens = vec![
        Listen::new(Track::new("t1", "Intro", "Band A"), start + Duration::seconds(60)),
        Listen::new(
            Track::new("t2", "Second Wind", "Band B").with_album("Long Run"),
            start + Duration::seconds(245),
        ),
        Listen::new(Track::new("t3", "Home Stretch", "Band A"), start + Duration::seconds(480)),
    ];
    let windows = windows_from_listens(listens, start + Duration::seconds(600));

    let config = SegmentConfig::with_tolerance_meters(5.0, 48.86);
    println!("Activity Soundtrack Example\n");
    println!("Config: tolerance={:.7} degrees, simplify={}\n", config.tolerance, config.simplify);

    let result = match build_activity_soundtrack(samples, windows, &config) {
        Ok(result) => result,
        Err(e) => {
            println!("Failed to build segments: {}", e);
            return;
        }
    };

    for segment in &result.segments {
        let title = match &segment.track {
            Some(track) => format!("{} - {}", track.artist_name, track.name),
            None => "(no music)".to_string(),
        };
        println!(
            "{}. {} [{} -> {}]",
            segment.index,
            title,
            segment.start_time.format("%H:%M:%S"),
            segment.end_time.format("%H:%M:%S")
        );
        println!(
            "   {} -> {} points, {:.0}m",
            segment.summary.original_points,
            segment.points.len(),
            segment.summary.distance_meters
        );
        if let Some(hr) = segment.summary.avg_heart_rate {
            println!("   avg heart rate: {:.0} bpm", hr);
        }
    }

    let stats = &result.stats;
    println!("\nStats:");
    println!("  segments: {} ({} with music)", stats.total_segments, stats.segments_with_music);
    println!(
        "  points: {} -> {} ({:.1}% removed)",
        stats.original_points,
        stats.simplified_points,
        stats.reduction_ratio * 100.0
    );
}
