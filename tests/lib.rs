//! Tests for lib.rs core types and functions

use chrono::{TimeDelta, TimeZone, Utc};
use trackprep::{LocationRecord, Track, TrackId, flatten_tracks, group_tracks};

fn minutes(m: i64) -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + TimeDelta::minutes(m)
}

#[test]
fn test_track_id_display() {
    assert_eq!(TrackId::new("A").to_string(), "A");
    assert_eq!(TrackId::segmented("A", 3).to_string(), "A_3");
    assert_eq!(TrackId::segmented("A_3", 1).to_string(), "A_3_1");
    assert!(!TrackId::from("A").is_segmented());
}

#[test]
fn test_group_tracks_first_appearance_order() {
    let records = vec![
        LocationRecord::new("B", minutes(0), 0.0, 0.0),
        LocationRecord::new("A", minutes(0), 1.0, 0.0),
        LocationRecord::new("B", minutes(5), 2.0, 0.0),
    ];
    let tracks = group_tracks(records);

    assert_eq!(tracks.len(), 2);
    assert_eq!(tracks[0].id, TrackId::new("B"));
    assert_eq!(tracks[0].len(), 2);
    assert_eq!(tracks[1].id, TrackId::new("A"));

    let flat = flatten_tracks(tracks);
    let xs: Vec<f64> = flat.iter().map(|r| r.position.unwrap().x).collect();
    assert_eq!(xs, vec![0.0, 2.0, 1.0]);
}

#[test]
fn test_segments_group_separately() {
    let mut first = LocationRecord::new("A", minutes(0), 0.0, 0.0);
    first.track_id = TrackId::segmented("A", 1);
    let mut second = LocationRecord::new("A", minutes(5), 0.0, 0.0);
    second.track_id = TrackId::segmented("A", 2);

    assert_eq!(group_tracks(vec![first, second]).len(), 2);
}

#[test]
fn test_track_span() {
    let track = Track {
        id: TrackId::new("A"),
        records: vec![
            LocationRecord::new("A", minutes(10), 0.0, 0.0),
            LocationRecord::missing("A", minutes(70)),
        ],
    };
    assert_eq!(track.span(), TimeDelta::minutes(60));
    assert_eq!(track.first_time_reversal(), None);

    let empty = Track {
        id: TrackId::new("E"),
        records: Vec::new(),
    };
    assert_eq!(empty.span(), TimeDelta::zero());
    assert!(empty.is_empty());
}

#[test]
fn test_first_time_reversal() {
    let track = Track {
        id: TrackId::new("A"),
        records: vec![
            LocationRecord::new("A", minutes(0), 0.0, 0.0),
            LocationRecord::new("A", minutes(10), 0.0, 0.0),
            LocationRecord::new("A", minutes(10), 0.0, 0.0),
            LocationRecord::new("A", minutes(5), 0.0, 0.0),
        ],
    };
    assert_eq!(track.first_time_reversal(), Some(3));
}

#[test]
fn test_record_serde_json() {
    let record = LocationRecord::new("A", minutes(0), 1.0, 2.0).with_covariate("temperature", 9.5);
    let json = serde_json::to_string(&record).unwrap();
    let back: LocationRecord = serde_json::from_str(&json).unwrap();
    assert_eq!(back, record);
}
