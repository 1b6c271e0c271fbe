//! Error types for the tuner engine.
//!
//! The per-sample path never fails; malformed samples are simply inactive.
//! Errors only come from building an engine (configuration) and from parsing
//! note names supplied by the caller.

use std::path::PathBuf;
use thiserror::Error;

use crate::tuning::NoteName;

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors raised while loading or validating an [`EngineConfig`](crate::config::EngineConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config file {}: {source}", path.display())]
    Io {
        /// Path that was being read.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid JSON for an engine config.
    #[error("failed to parse config file {}: {source}", path.display())]
    Parse {
        /// Path that was being parsed.
        path: PathBuf,
        /// Underlying JSON failure.
        #[source]
        source: serde_json::Error,
    },

    /// Reference pitch must be finite and positive.
    #[error("invalid reference pitch: {0} Hz")]
    InvalidReferencePitch(f64),

    /// Amplitude threshold must be finite and in `[0, 1)`.
    #[error("invalid amplitude threshold: {0}")]
    InvalidAmplitudeThreshold(f64),

    /// Musical range must satisfy `0 < min < max`, both finite.
    #[error("invalid frequency range: {min} Hz to {max} Hz")]
    InvalidFrequencyRange {
        /// Lower bound in Hz.
        min: f64,
        /// Upper bound in Hz.
        max: f64,
    },

    /// Stability band half-width must be finite and non-negative.
    #[error("invalid stability threshold: {0} Hz")]
    InvalidStabilityThreshold(f64),

    /// Recentering factor must be in `(0, 1]`.
    #[error("invalid recentering smoothing factor: {0}")]
    InvalidSmoothing(f64),

    /// The cents smoothing window needs at least one slot.
    #[error("smoothing window must hold at least one sample")]
    InvalidSmoothingWindow,

    /// Target note lies outside the representable frequency range.
    #[error("target note {note}{octave} has no usable frequency ({frequency} Hz)")]
    InvalidTargetNote {
        /// Pitch class of the rejected target.
        note: NoteName,
        /// Octave of the rejected target.
        octave: i32,
        /// Frequency computed for it.
        frequency: f64,
    },
}

/// Errors raised while parsing a note such as `"C#4"` or `"Bb"`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseNoteError {
    /// Nothing to parse.
    #[error("note name is empty")]
    Empty,

    /// The pitch class is not one of the twelve known names.
    #[error("unknown note name '{0}'")]
    UnknownName(String),

    /// The octave suffix is missing or not an integer.
    #[error("invalid octave in '{0}'")]
    InvalidOctave(String),
}
