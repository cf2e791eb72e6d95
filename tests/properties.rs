//! Invariant checks over synthetic animal tracks
//!
//! Run with: `cargo test --features synthetic --test properties`

use chrono::TimeDelta;
use trackprep::synthetic::SyntheticScenario;
use trackprep::{
    CoordinateSystem, GridConfig, LocationRecord, SegmentConfig, group_tracks, movement_metrics,
    pad_to_grid, segment_tracks, segment_tracks_with_stats,
};

fn configs() -> Vec<SegmentConfig> {
    vec![
        SegmentConfig::default(),
        SegmentConfig {
            max_gap: TimeDelta::minutes(90),
            min_duration: TimeDelta::zero(),
        },
        SegmentConfig {
            max_gap: TimeDelta::hours(4),
            min_duration: TimeDelta::days(3),
        },
        SegmentConfig {
            max_gap: TimeDelta::minutes(61),
            min_duration: TimeDelta::hours(12),
        },
    ]
}

fn scenarios() -> Vec<SyntheticScenario> {
    (0..4)
        .map(|seed| SyntheticScenario {
            seed,
            gap_probability: 0.02 * (seed + 1) as f64,
            ..SyntheticScenario::herd(6)
        })
        .collect()
}

fn assert_invariants(records: &[LocationRecord], config: &SegmentConfig) {
    for track in group_tracks(records.to_vec()) {
        assert!(track.span() >= config.min_duration, "{} too short", track.id);
        for w in track.records.windows(2) {
            assert!(
                w[1].time - w[0].time <= config.max_gap,
                "{} has an internal gap",
                track.id
            );
        }
    }
}

#[test]
fn test_gaps_and_spans_hold() {
    for scenario in scenarios() {
        let dataset = scenario.generate();
        for config in configs() {
            let out = segment_tracks(dataset.records.clone(), &config).unwrap();
            assert_invariants(&out, &config);
        }
    }
}

#[test]
fn test_idempotent() {
    for scenario in scenarios() {
        let dataset = scenario.generate();
        for config in configs() {
            let once = segment_tracks(dataset.records.clone(), &config).unwrap();
            let twice = segment_tracks(once.clone(), &config).unwrap();
            assert_eq!(once, twice);
        }
    }
}

#[test]
fn test_record_count_accounting() {
    for scenario in scenarios() {
        let dataset = scenario.generate();
        for config in configs() {
            let result = segment_tracks_with_stats(dataset.records.clone(), &config).unwrap();
            let stats = result.stats;

            assert_eq!(stats.input_records, dataset.records.len());
            assert_eq!(stats.output_records, result.records.len());
            assert!(stats.output_records <= stats.input_records);
            assert_eq!(
                stats.input_records - stats.output_records,
                stats.dropped_records
            );
        }
    }
}

#[test]
fn test_outages_produce_splits() {
    let dataset = SyntheticScenario {
        gap_probability: 0.05,
        ..SyntheticScenario::herd(3)
    }
    .generate();
    assert!(dataset.gap_count > 0);

    let config = SegmentConfig {
        max_gap: TimeDelta::hours(3),
        min_duration: TimeDelta::zero(),
    };
    let result = segment_tracks_with_stats(dataset.records, &config).unwrap();
    assert_eq!(result.stats.sub_tracks, 3 + dataset.gap_count);
}

#[test]
fn test_no_gaps_no_splits() {
    let dataset = SyntheticScenario::without_gaps(4).generate();
    let result = segment_tracks_with_stats(dataset.records, &SegmentConfig::default()).unwrap();
    assert_eq!(result.stats.sub_tracks, 4);
    assert_eq!(result.stats.dropped_records, 0);
}

#[test]
fn test_full_preparation_pipeline() {
    let dataset = SyntheticScenario::herd(3).generate();
    let segmented = segment_tracks(dataset.records, &SegmentConfig::default()).unwrap();
    let padded = pad_to_grid(segmented.clone(), &GridConfig::default()).unwrap();

    assert!(padded.len() >= group_tracks(segmented).len());
    for track in group_tracks(padded.clone()) {
        for w in track.records.windows(2) {
            assert_eq!(w[1].time - w[0].time, TimeDelta::hours(1));
        }
    }

    let rows = movement_metrics(padded, CoordinateSystem::Planar);
    assert!(rows.iter().any(|m| m.step.is_some()));
    assert!(rows.iter().all(|m| m.angle.is_none_or(|a| a.abs() <= std::f64::consts::PI)));
}
