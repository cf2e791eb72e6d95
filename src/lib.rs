//! # Track Prep
//!
//! Preparation of animal GPS tracks for hidden Markov model (HMM) analysis.
//!
//! This library provides:
//! - Splitting of tracks wherever the sampling gap exceeds a threshold
//! - Removal of sub-tracks that are too short to model
//! - Padding of irregular tracks onto a fixed time grid with missing rows
//! - Movement metrics (step length, turning angle) per observation
//! - Explicit model specifications handed to an external HMM estimator
//! - CSV input/output of the tabular location dataset
//!
//! ## Features
//!
//! - **`parallel`** - Compute movement metrics across tracks with rayon
//! - **`synthetic`** - Synthetic animal tracks for tests and benchmarks
//! - **`cli`** - The `trackprep` command-line tool
//!
//! ## Quick Start
//!
//! ```rust
//! use chrono::{TimeDelta, TimeZone, Utc};
//! use trackprep::{LocationRecord, SegmentConfig, segment_tracks};
//!
//! let t0 = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
//! let records: Vec<LocationRecord> = [0, 30, 60, 200, 230, 260]
//!     .iter()
//!     .map(|&m| LocationRecord::new("A", t0 + TimeDelta::minutes(m), 0.0, 0.0))
//!     .collect();
//!
//! let config = SegmentConfig {
//!     max_gap: TimeDelta::minutes(120),
//!     min_duration: TimeDelta::zero(),
//! };
//! let segmented = segment_tracks(records, &config).unwrap();
//! assert_eq!(segmented[0].track_id.to_string(), "A_1");
//! assert_eq!(segmented[5].track_id.to_string(), "A_2");
//! ```

use chrono::{DateTime, TimeDelta, Utc};
use geo::Coord;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

// Unified error handling
pub mod error;
pub use error::{OptionExt, Result, TrackError};

// Distance and heading helpers for planar and geographic coordinates
pub mod geo_utils;

// Splitting tracks at sampling gaps
pub mod segment;
pub use segment::{
    SegmentConfig, SegmentStats, Segmentation, segment_tracks, segment_tracks_with_stats,
};

// Padding tracks onto a regular time grid
pub mod regularize;
pub use regularize::{GridConfig, pad_to_grid};

// Step lengths and turning angles
pub mod metrics;
pub use metrics::{CoordinateSystem, MovementRecord, movement_metrics};

// Model specifications for external HMM estimators
pub mod model;
pub use model::{AngleDistribution, ModelSpec, MovementModel, StepDistribution};

// Tabular input/output
pub mod io;

// Synthetic tracks for stress testing
#[cfg(feature = "synthetic")]
pub mod synthetic;

// ============================================================================
// Core Types
// ============================================================================

/// Identifier of a track, optionally narrowed to one of its sub-tracks.
///
/// Displays as `base` for an unsegmented track and `base_segment` once the
/// track has been split.
///
/// # Example
/// ```
/// use trackprep::TrackId;
/// assert_eq!(TrackId::new("zebra-7").to_string(), "zebra-7");
/// assert_eq!(TrackId::segmented("zebra-7", 2).to_string(), "zebra-7_2");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TrackId {
    pub base: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub segment: Option<u32>,
}

impl TrackId {
    pub fn new(base: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            segment: None,
        }
    }

    pub fn segmented(base: impl Into<String>, segment: u32) -> Self {
        Self {
            base: base.into(),
            segment: Some(segment),
        }
    }

    pub fn is_segmented(&self) -> bool {
        self.segment.is_some()
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.segment {
            Some(n) => write!(f, "{}_{}", self.base, n),
            None => f.write_str(&self.base),
        }
    }
}

impl From<&str> for TrackId {
    fn from(base: &str) -> Self {
        TrackId::new(base)
    }
}

/// A single timestamped location observation.
///
/// Coordinates are either projected (`x` easting, `y` northing) or geographic
/// (`x` longitude, `y` latitude); see [`CoordinateSystem`]. A record without
/// a position marks a missing observation on a regular time grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationRecord {
    pub track_id: TrackId,
    pub time: DateTime<Utc>,
    /// Location, or `None` for a missing observation
    pub position: Option<Coord<f64>>,
    /// Named numeric covariates (e.g. "temperature")
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub covariates: BTreeMap<String, f64>,
}

impl LocationRecord {
    /// Create an observed location without covariates.
    pub fn new(track_id: impl Into<TrackId>, time: DateTime<Utc>, x: f64, y: f64) -> Self {
        Self {
            track_id: track_id.into(),
            time,
            position: Some(Coord { x, y }),
            covariates: BTreeMap::new(),
        }
    }

    /// Create a row with no observed location.
    pub fn missing(track_id: impl Into<TrackId>, time: DateTime<Utc>) -> Self {
        Self {
            track_id: track_id.into(),
            time,
            position: None,
            covariates: BTreeMap::new(),
        }
    }

    /// Attach a covariate value.
    pub fn with_covariate(mut self, name: impl Into<String>, value: f64) -> Self {
        self.covariates.insert(name.into(), value);
        self
    }

    pub fn is_missing(&self) -> bool {
        self.position.is_none()
    }
}

/// A run of records sharing one track identifier, in input order.
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    pub id: TrackId,
    pub records: Vec<LocationRecord>,
}

impl Track {
    /// Time between the earliest and latest record, zero for empty tracks.
    pub fn span(&self) -> TimeDelta {
        let mut times = self.records.iter().map(|r| r.time);
        let Some(first) = times.next() else {
            return TimeDelta::zero();
        };
        let (min, max) = times.fold((first, first), |(lo, hi), t| (lo.min(t), hi.max(t)));
        max - min
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Index of the first record whose time is earlier than its predecessor.
    pub fn first_time_reversal(&self) -> Option<usize> {
        self.records
            .windows(2)
            .position(|w| w[1].time < w[0].time)
            .map(|i| i + 1)
    }
}

/// Group records by their full track identifier.
///
/// Tracks appear in order of their first record; records keep input order
/// within a track, so interleaved input is gathered rather than rejected.
pub fn group_tracks(records: Vec<LocationRecord>) -> Vec<Track> {
    let mut index: HashMap<TrackId, usize> = HashMap::new();
    let mut tracks: Vec<Track> = Vec::new();

    for record in records {
        let slot = *index.entry(record.track_id.clone()).or_insert_with(|| {
            tracks.push(Track {
                id: record.track_id.clone(),
                records: Vec::new(),
            });
            tracks.len() - 1
        });
        tracks[slot].records.push(record);
    }

    tracks
}

/// Flatten tracks back into one record sequence.
pub fn flatten_tracks(tracks: Vec<Track>) -> Vec<LocationRecord> {
    tracks.into_iter().flat_map(|t| t.records).collect()
}
