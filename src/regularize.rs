//! Padding of irregular tracks onto a regular time grid.
//!
//! HMMs for discrete-time movement need observations at a constant
//! interval. Each observation is snapped to its nearest grid time and every
//! grid time without an observation becomes a row with no position. No
//! locations are interpolated here; continuous-time filtering of the missing
//! rows is left to the downstream estimator.

use chrono::TimeDelta;
use log::{debug, info};

use crate::error::{Result, TrackError};
use crate::{LocationRecord, Track, flatten_tracks, group_tracks};

/// Grid settings for regularization.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridConfig {
    /// Time between grid rows. Must be a whole, positive number of
    /// milliseconds.
    /// Default: 1 hour
    pub interval: TimeDelta,

    /// Upper bound on grid rows for a single track. A year-long track on a
    /// one-second grid already needs about 31.5 million rows.
    /// Default: 1,000,000
    pub max_rows_per_track: usize,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            interval: TimeDelta::hours(1),
            max_rows_per_track: 1_000_000,
        }
    }
}

impl GridConfig {
    pub fn validate(&self) -> Result<()> {
        if self.interval.num_milliseconds() <= 0 {
            return Err(TrackError::InvalidThreshold {
                name: "interval",
                reason: format!("must be at least 1ms, got {}", self.interval),
            });
        }
        if self.interval != TimeDelta::milliseconds(self.interval.num_milliseconds()) {
            return Err(TrackError::InvalidThreshold {
                name: "interval",
                reason: format!("must be a whole number of milliseconds, got {}", self.interval),
            });
        }
        Ok(())
    }
}

/// Pad every track onto a grid starting at its first observation.
///
/// Observations snap to the nearest grid time (halfway rounds up). When
/// several observations share a grid time, the closest one is kept and the
/// earliest wins ties; the others are discarded. Grid times without an
/// observation get a row with `position == None` and no covariates.
///
/// # Errors
/// [`TrackError::InvalidThreshold`] for a non-positive or fractional
/// millisecond interval, or when a track would need more than
/// `max_rows_per_track` rows, and [`TrackError::NonMonotonicTime`] when times
/// decrease within a track.
pub fn pad_to_grid(
    records: Vec<LocationRecord>,
    config: &GridConfig,
) -> Result<Vec<LocationRecord>> {
    config.validate()?;
    let interval_ms = config.interval.num_milliseconds();

    let input_len = records.len();
    let mut padded_tracks = Vec::new();
    let mut discarded = 0usize;

    for track in group_tracks(records) {
        if let Some(index) = track.first_time_reversal() {
            return Err(TrackError::NonMonotonicTime {
                track_id: track.id.to_string(),
                index,
            });
        }
        check_row_count(&track, interval_ms, config.max_rows_per_track)?;
        let (padded, dropped) = pad_track(track, interval_ms);
        discarded += dropped;
        padded_tracks.push(padded);
    }

    let records = flatten_tracks(padded_tracks);
    let missing = records.iter().filter(|r| r.is_missing()).count();
    info!(
        "[Regularize] {} records -> {} grid rows ({} missing, {} discarded duplicates)",
        input_len,
        records.len(),
        missing,
        discarded
    );

    Ok(records)
}

fn slot_of(offset_ms: i64, interval_ms: i64) -> i64 {
    (offset_ms + interval_ms / 2) / interval_ms
}

fn check_row_count(track: &Track, interval_ms: i64, max_rows: usize) -> Result<()> {
    let (Some(first), Some(last)) = (track.records.first(), track.records.last()) else {
        return Ok(());
    };
    let rows = slot_of((last.time - first.time).num_milliseconds(), interval_ms) + 1;
    if rows > max_rows as i64 {
        return Err(TrackError::InvalidThreshold {
            name: "interval",
            reason: format!(
                "track {} spans {} and would need {} grid rows, more than the limit of {}",
                track.id,
                track.span(),
                rows,
                max_rows
            ),
        });
    }
    Ok(())
}

/// Returns the padded track and the number of observations that lost their slot.
fn pad_track(track: Track, interval_ms: i64) -> (Track, usize) {
    let Some(t0) = track.records.first().map(|r| r.time) else {
        return (track, 0);
    };

    // Per grid slot: distance to the slot time and the record holding it
    let mut slots: Vec<Option<(i64, LocationRecord)>> = Vec::new();
    let mut discarded = 0usize;

    for record in track.records {
        let offset = (record.time - t0).num_milliseconds();
        let slot = slot_of(offset, interval_ms) as usize;
        let distance = (offset - slot as i64 * interval_ms).abs();

        if slots.len() <= slot {
            slots.resize_with(slot + 1, || None);
        }
        let occupied_by = slots[slot].as_ref().map(|(best, _)| *best);
        match occupied_by {
            Some(best) if best <= distance => {
                debug!("[Regularize] {} discards record at {}", track.id, record.time);
                discarded += 1;
            }
            Some(_) => {
                discarded += 1;
                slots[slot] = Some((distance, record));
            }
            None => slots[slot] = Some((distance, record)),
        }
    }

    let records = slots
        .into_iter()
        .enumerate()
        .map(|(i, slot)| {
            let time = t0 + TimeDelta::milliseconds(i as i64 * interval_ms);
            match slot {
                Some((_, mut record)) => {
                    record.time = time;
                    record
                }
                None => LocationRecord::missing(track.id.clone(), time),
            }
        })
        .collect();

    (
        Track {
            id: track.id,
            records,
        },
        discarded,
    )
}
