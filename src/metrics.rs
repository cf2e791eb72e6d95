//! Movement metrics derived from consecutive locations.
//!
//! Each observation gets the step length to the next observation of the
//! same track and the turning angle between the step arriving at it and
//! the step leaving it. These are the observation variables of a movement
//! HMM.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use geo::Coord;
use serde::{Deserialize, Serialize};

use crate::geo_utils::{
    haversine_distance, initial_bearing, planar_distance, planar_heading, wrap_angle,
};
use crate::{LocationRecord, Track, group_tracks};

/// How record coordinates are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoordinateSystem {
    /// Projected coordinates; steps in coordinate units (e.g. UTM metres).
    #[default]
    Planar,
    /// `x` longitude, `y` latitude in degrees; steps in metres.
    LatLng,
}

impl CoordinateSystem {
    /// Distance between two positions.
    pub fn distance(&self, a: &Coord<f64>, b: &Coord<f64>) -> f64 {
        match self {
            CoordinateSystem::Planar => planar_distance(a, b),
            CoordinateSystem::LatLng => haversine_distance(a, b),
        }
    }

    /// Direction of travel from `a` to `b`, counter-clockwise positive.
    pub fn heading(&self, a: &Coord<f64>, b: &Coord<f64>) -> f64 {
        match self {
            CoordinateSystem::Planar => planar_heading(a, b),
            // Bearings run clockwise from north
            CoordinateSystem::LatLng => -initial_bearing(a, b),
        }
    }
}

/// A location record with its movement metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovementRecord {
    #[serde(flatten)]
    pub record: LocationRecord,
    /// Distance to the next observation of the track
    pub step: Option<f64>,
    /// Turning angle at this observation in (-pi, pi], left turns positive
    pub angle: Option<f64>,
}

/// Compute step lengths and turning angles for every record.
///
/// Metrics are missing at track ends, next to rows without a position, and
/// for angles next to a zero-length step (no direction of travel). Records
/// are assumed to be time-ordered within each track; output follows
/// [`group_tracks`] order.
pub fn movement_metrics(
    records: Vec<LocationRecord>,
    coords: CoordinateSystem,
) -> Vec<MovementRecord> {
    let tracks = group_tracks(records);

    #[cfg(feature = "parallel")]
    let per_track: Vec<Vec<MovementRecord>> = tracks
        .into_par_iter()
        .map(|track| track_metrics(track, coords))
        .collect();

    #[cfg(not(feature = "parallel"))]
    let per_track: Vec<Vec<MovementRecord>> = tracks
        .into_iter()
        .map(|track| track_metrics(track, coords))
        .collect();

    per_track.into_iter().flatten().collect()
}

fn track_metrics(track: Track, coords: CoordinateSystem) -> Vec<MovementRecord> {
    let positions: Vec<Option<Coord<f64>>> = track.records.iter().map(|r| r.position).collect();

    // steps[i] runs from record i to record i + 1
    let steps: Vec<Option<(f64, f64)>> = positions
        .windows(2)
        .map(|w| match (w[0], w[1]) {
            (Some(a), Some(b)) => Some((coords.distance(&a, &b), coords.heading(&a, &b))),
            _ => None,
        })
        .collect();

    track
        .records
        .into_iter()
        .enumerate()
        .map(|(i, record)| {
            let outgoing = steps.get(i).copied().flatten();
            let incoming = i.checked_sub(1).and_then(|j| steps[j]);

            let angle = match (incoming, outgoing) {
                (Some((len_in, h_in)), Some((len_out, h_out)))
                    if len_in > 0.0 && len_out > 0.0 =>
                {
                    Some(wrap_angle(h_out - h_in))
                }
                _ => None,
            };

            MovementRecord {
                record,
                step: outgoing.map(|(len, _)| len),
                angle,
            }
        })
        .collect()
}
