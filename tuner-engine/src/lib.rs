// tuner-engine/src/lib.rs

//! The core logic for the tuner game.
//! This crate turns a stream of `(frequency, amplitude, timestamp)` samples
//! into note readings and a "how long has this note been held" duration.
//! It is completely headless: it does no audio I/O and contains no
//! rendering code.

pub mod config;
pub mod engine;
pub mod error;
pub mod gate;
pub mod smoothing;
pub mod stability;
pub mod tuning;

pub use config::EngineConfig;
pub use engine::{EngineOutput, TunerEngine, TuningMode};
pub use error::{ConfigError, ConfigResult, ParseNoteError};
pub use gate::ActivityGate;
pub use stability::{AnchorPolicy, StabilityState, StabilityTracker};
pub use tuning::{Classification, NoteName};

use serde::{Deserialize, Serialize};

/// One raw observation from the external pitch analyzer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PitchSample {
    /// Estimated fundamental frequency in Hz.
    pub frequency_hz: f64,
    /// Normalized signal level, nominally 0.0 to 1.0.
    pub amplitude: f64,
    /// Monotonic capture time in seconds.
    pub timestamp: f64,
}

impl PitchSample {
    pub fn new(frequency_hz: f64, amplitude: f64, timestamp: f64) -> Self {
        Self {
            frequency_hz,
            amplitude,
            timestamp,
        }
    }

    /// Whether every field is finite and the amplitude is non-negative.
    ///
    /// Samples failing this check are a caller contract violation and are
    /// always treated as inactive.
    pub fn is_well_formed(&self) -> bool {
        self.frequency_hz.is_finite()
            && self.amplitude.is_finite()
            && self.amplitude >= 0.0
            && self.timestamp.is_finite()
    }
}

/// Represents the tuning result for a single sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TunerReading {
    /// The name of the nearest note.
    pub note_name: NoteName,
    /// Octave of the nearest note.
    pub octave: i32,
    /// The input frequency in Hz, passed through.
    pub frequency_hz: f64,
    /// The deviation from the nearest note in cents, in `(-50, 50]`.
    pub deviation_cents: f64,
    /// Whether the sample that produced this reading passed the activity gate.
    pub is_active: bool,
}

impl TunerReading {
    /// Builds an active reading from a classified frequency.
    pub fn from_classification(frequency_hz: f64, classification: Classification) -> Self {
        Self {
            note_name: classification.note,
            octave: classification.octave,
            frequency_hz,
            deviation_cents: classification.deviation_cents,
            is_active: true,
        }
    }

    /// The same reading, flagged as no longer backed by an active signal.
    pub fn deactivated(self) -> Self {
        Self {
            is_active: false,
            ..self
        }
    }
}
