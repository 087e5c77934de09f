//! Error taxonomy for configuration and input-contract violations.
//!
//! Transient tracking anomalies (a track losing its detection for a few
//! frames) are lifecycle states, not errors, and never surface here.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TrackError {
    /// A configuration value lies outside its declared bounds. Raised at
    /// construction; the tracker is never built.
    #[error("{param} must be between {bounds}, got {value}")]
    ConfigOutOfBounds {
        param: &'static str,
        bounds: &'static str,
        value: f64,
    },

    /// A configuration option received an unrecognized choice.
    #[error("{param} must be one of {choices}")]
    InvalidChoice {
        param: &'static str,
        choices: &'static str,
    },

    /// Per-frame detection arrays disagree in length. Raised before any
    /// track state is touched.
    #[error(
        "detection arrays disagree in length: {bboxes} bboxes, {labels} labels, {scores} scores"
    )]
    LengthMismatch {
        bboxes: usize,
        labels: usize,
        scores: usize,
    },

    /// Bounding boxes are not shaped (N, 4).
    #[error("bboxes must have shape (N, 4), got {cols} columns")]
    BadBboxShape { cols: usize },

    /// Frame buffer size does not match the declared dimensions.
    #[error("frame buffer holds {actual} bytes, expected {expected} for the declared dimensions")]
    BadFrame { expected: usize, actual: usize },

    /// Frame dimensions include a zero. Such a frame has no pixels to sample
    /// and no extent to normalize against.
    #[error("frame dimensions must be nonzero, got {width}x{height}")]
    EmptyFrame { width: u32, height: u32 },
}

pub(crate) fn check_unit_interval(param: &'static str, value: f32) -> Result<(), TrackError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(TrackError::ConfigOutOfBounds {
            param,
            bounds: "[0, 1]",
            value: value as f64,
        })
    }
}

pub(crate) fn check_at_least_one(param: &'static str, value: u32) -> Result<(), TrackError> {
    if value >= 1 {
        Ok(())
    } else {
        Err(TrackError::ConfigOutOfBounds {
            param,
            bounds: "[1, +inf)",
            value: value as f64,
        })
    }
}
