//! Unified error handling for track preparation.

use thiserror::Error;

/// Errors raised while preparing location tracks.
#[derive(Error, Debug)]
pub enum TrackError {
    /// Timestamps went backwards within a track.
    #[error("timestamps within track {track_id} decrease at record {index}")]
    NonMonotonicTime { track_id: String, index: usize },

    /// Two distinct input tracks would end up under the same sub-track label.
    #[error("sub-track label {track_id} is produced by more than one input track")]
    DuplicateTrackId { track_id: String },

    /// A duration or interval threshold is out of range.
    #[error("invalid {name}: {reason}")]
    InvalidThreshold { name: &'static str, reason: String },

    /// A model specification does not fit the data or is malformed.
    #[error("invalid model specification: {0}")]
    InvalidModel(String),

    /// A row of tabular input could not be interpreted.
    #[error("parse error on line {line}: {message}")]
    Parse { line: u64, message: String },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl TrackError {
    /// True for the conditions callers pass bad input into the core with
    /// (ordering or threshold violations), as opposed to I/O failures.
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            TrackError::NonMonotonicTime { .. }
                | TrackError::DuplicateTrackId { .. }
                | TrackError::InvalidThreshold { .. }
                | TrackError::InvalidModel(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, TrackError>;

/// Conversion helpers for optional values met while parsing rows.
pub trait OptionExt<T> {
    /// Turn `None` into a [`TrackError::Parse`] for the given line.
    fn ok_or_parse(self, line: u64, message: impl Into<String>) -> Result<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_parse(self, line: u64, message: impl Into<String>) -> Result<T> {
        self.ok_or_else(|| TrackError::Parse {
            line,
            message: message.into(),
        })
    }
}
