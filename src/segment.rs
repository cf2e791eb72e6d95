//! Splitting of location tracks at sampling gaps.
//!
//! A track is cut wherever two consecutive observations are further apart
//! in time than `max_gap`. Each resulting sub-track is labelled
//! `<track>_<n>` with `n` counting from 1, and sub-tracks spanning less than
//! `min_duration` are removed together with all their records.
//!
//! Segmentation is idempotent for fixed thresholds: a track that is already
//! a sub-track and needs no further cut keeps its label.

use chrono::TimeDelta;
use log::{debug, info};
use std::collections::HashSet;

use crate::error::{Result, TrackError};
use crate::{LocationRecord, Track, TrackId, flatten_tracks, group_tracks};

/// Thresholds for splitting tracks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentConfig {
    /// Largest allowed time between consecutive observations of a sub-track.
    /// A gap exactly equal to this does not split. Must be positive.
    /// Default: 2 hours
    pub max_gap: TimeDelta,

    /// Shortest span (last minus first timestamp) a sub-track must cover to
    /// be kept. Zero keeps everything, including single-record sub-tracks.
    /// Default: 24 hours
    pub min_duration: TimeDelta,
}

impl Default for SegmentConfig {
    fn default() -> Self {
        Self {
            max_gap: TimeDelta::hours(2),
            min_duration: TimeDelta::hours(24),
        }
    }
}

impl SegmentConfig {
    /// Check that thresholds are usable.
    pub fn validate(&self) -> Result<()> {
        if self.max_gap <= TimeDelta::zero() {
            return Err(TrackError::InvalidThreshold {
                name: "max_gap",
                reason: format!("must be positive, got {}", self.max_gap),
            });
        }
        if self.min_duration < TimeDelta::zero() {
            return Err(TrackError::InvalidThreshold {
                name: "min_duration",
                reason: format!("must not be negative, got {}", self.min_duration),
            });
        }
        Ok(())
    }
}

/// Counters describing one segmentation run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SegmentStats {
    pub input_records: usize,
    pub output_records: usize,
    /// Distinct track identifiers in the input
    pub tracks_in: usize,
    /// Sub-tracks produced by splitting, before the duration filter
    pub sub_tracks: usize,
    pub dropped_sub_tracks: usize,
    pub dropped_records: usize,
}

impl SegmentStats {
    pub fn kept_sub_tracks(&self) -> usize {
        self.sub_tracks - self.dropped_sub_tracks
    }
}

/// Segmented records together with run statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct Segmentation {
    pub records: Vec<LocationRecord>,
    pub stats: SegmentStats,
}

/// Split tracks at gaps longer than `config.max_gap` and drop short sub-tracks.
///
/// Returns an empty vector when no sub-track is long enough; that is a valid
/// outcome, not an error.
///
/// # Errors
/// [`TrackError::InvalidThreshold`] for a non-positive `max_gap` or negative
/// `min_duration`, [`TrackError::NonMonotonicTime`] when times decrease within
/// a track, [`TrackError::DuplicateTrackId`] when two input tracks would share
/// a sub-track label (e.g. raw `A` mixed with an already segmented `A_1`).
pub fn segment_tracks(
    records: Vec<LocationRecord>,
    config: &SegmentConfig,
) -> Result<Vec<LocationRecord>> {
    segment_tracks_with_stats(records, config).map(|s| s.records)
}

/// Same as [`segment_tracks`], also reporting what was split and dropped.
pub fn segment_tracks_with_stats(
    records: Vec<LocationRecord>,
    config: &SegmentConfig,
) -> Result<Segmentation> {
    config.validate()?;

    let mut stats = SegmentStats {
        input_records: records.len(),
        ..Default::default()
    };

    let tracks = group_tracks(records);
    stats.tracks_in = tracks.len();

    // Labels handed out so far; a raw `A` and an existing `A_1` both claim `A_1`
    let mut labels: HashSet<TrackId> = HashSet::new();

    let mut kept: Vec<Track> = Vec::new();
    for track in tracks {
        if let Some(index) = track.first_time_reversal() {
            return Err(TrackError::NonMonotonicTime {
                track_id: track.id.to_string(),
                index,
            });
        }

        for sub in split_track(track, config.max_gap) {
            if !labels.insert(sub.id.clone()) {
                return Err(TrackError::DuplicateTrackId {
                    track_id: sub.id.to_string(),
                });
            }
            stats.sub_tracks += 1;
            let span = sub.span();
            if span < config.min_duration {
                debug!(
                    "[Segment] Dropping {} ({} records, span {} < {})",
                    sub.id,
                    sub.len(),
                    span,
                    config.min_duration
                );
                stats.dropped_sub_tracks += 1;
                stats.dropped_records += sub.len();
            } else {
                kept.push(sub);
            }
        }
    }

    let records = flatten_tracks(kept);
    stats.output_records = records.len();

    info!(
        "[Segment] {} tracks -> {} sub-tracks, kept {} ({} of {} records)",
        stats.tracks_in,
        stats.sub_tracks,
        stats.kept_sub_tracks(),
        stats.output_records,
        stats.input_records
    );

    Ok(Segmentation { records, stats })
}

/// Cut one time-ordered track wherever the gap exceeds `max_gap`.
fn split_track(track: Track, max_gap: TimeDelta) -> Vec<Track> {
    let mut pieces: Vec<Vec<LocationRecord>> = Vec::new();
    let mut current: Vec<LocationRecord> = Vec::new();

    for record in track.records {
        if let Some(prev) = current.last() {
            if record.time - prev.time > max_gap {
                pieces.push(std::mem::take(&mut current));
            }
        }
        current.push(record);
    }
    if !current.is_empty() {
        pieces.push(current);
    }

    // An existing sub-track that needs no cut keeps its label
    if track.id.is_segmented() && pieces.len() == 1 {
        return pieces
            .into_iter()
            .map(|records| Track {
                id: track.id.clone(),
                records,
            })
            .collect();
    }

    let base = if track.id.is_segmented() {
        track.id.to_string()
    } else {
        track.id.base.clone()
    };

    pieces
        .into_iter()
        .zip(1u32..)
        .map(|(mut records, n)| {
            let id = TrackId::segmented(base.clone(), n);
            for record in &mut records {
                record.track_id = id.clone();
            }
            Track { id, records }
        })
        .collect()
}
