//! # Tuner Engine
//!
//! Combines the activity gate, the pitch classifier and the stability
//! tracker into the single per-sample operation the audio layer calls.
//!
//! ## Architecture
//! - **Caller thread**: the audio layer owns a [`TunerEngine`] and calls
//!   [`TunerEngine::process`] once per sample, sequentially
//! - **Output**: each call returns an [`EngineOutput`] by value; forwarding it
//!   to a UI thread (channel, callback, polling) is up to the caller
//! - **Hot path**: no locks, no I/O, no heap allocation

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::error::{ConfigError, ConfigResult};
use crate::gate::ActivityGate;
use crate::smoothing::CentSmoother;
use crate::stability::{StabilityState, StabilityTracker};
use crate::tuning::{self, NoteName};
use crate::{PitchSample, TunerReading};

/// Tuning mode for the engine.
///
/// Determines whether deviations are only reported against the nearest note
/// or also against a note the player has been asked to hit.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum TuningMode {
    /// Nearest-note tuning only
    #[default]
    Auto,
    /// Also measure cents against a fixed target note
    Target {
        note: NoteName, // Pitch class of the target
        octave: i32,    // Octave of the target
    },
}

/// Everything the engine produces for one sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EngineOutput {
    /// Fresh reading for active samples, the previous reading flagged
    /// inactive otherwise. `None` until the first active sample.
    pub reading: Option<TunerReading>,
    /// Seconds the current note has been held.
    pub stability_seconds: f64,
    /// Cents from the target note in [`TuningMode::Target`], unbounded.
    pub target_deviation_cents: Option<f64>,
    /// Mean of the recent deviations in the current band.
    pub smoothed_cents: Option<f64>,
}

impl EngineOutput {
    /// Whether this output came from an active sample.
    pub fn is_active(&self) -> bool {
        self.reading.is_some_and(|reading| reading.is_active)
    }
}

/// The pitch classification and stability engine.
///
/// Single-writer state machine: exactly one caller feeds samples in order.
/// The engine is `Send`, so it can be moved into the thread that produces
/// samples.
#[derive(Debug, Clone)]
pub struct TunerEngine {
    config: EngineConfig,
    gate: ActivityGate,
    tracker: StabilityTracker,
    smoother: CentSmoother,
    mode: TuningMode,
    target_frequency: Option<f64>,
    last_reading: Option<TunerReading>,
}

impl TunerEngine {
    /// Builds an engine from a validated configuration.
    ///
    /// # Returns
    /// * `Ok(TunerEngine)` - Engine in its session-start state
    /// * `Err(ConfigError)` - The configuration failed validation
    pub fn new(config: EngineConfig) -> ConfigResult<Self> {
        config.validate()?;
        info!(
            "[ENGINE] A4={} Hz, gate amplitude>{} in {}..={} Hz, band ±{} Hz, anchor {:?}",
            config.reference_pitch_hz,
            config.amplitude_threshold,
            config.min_frequency_hz,
            config.max_frequency_hz,
            config.stability_threshold_hz,
            config.anchor_policy
        );
        Ok(Self {
            gate: ActivityGate::from_config(&config),
            tracker: StabilityTracker::new(config.stability_threshold_hz, config.anchor_policy),
            smoother: CentSmoother::new(config.smoothing_window),
            mode: TuningMode::Auto,
            target_frequency: None,
            last_reading: None,
            config,
        })
    }

    /// Processes a single sample from the audio layer.
    ///
    /// This function:
    /// 1. Applies the activity gate
    /// 2. For inactive samples, re-emits the previous reading flagged
    ///    inactive and leaves the stability state untouched
    /// 3. For active samples, classifies the frequency, updates the
    ///    stability band, and emits a fresh reading
    ///
    /// # Arguments
    /// * `sample` - Frequency, amplitude, and timestamp from the analyzer
    ///
    /// # Returns
    /// * `EngineOutput` - Reading, stability duration, and cents summaries
    pub fn process(&mut self, sample: PitchSample) -> EngineOutput {
        if !self.gate.is_active(&sample) {
            return self.inactive_output();
        }

        let Some(classification) =
            tuning::classify(sample.frequency_hz, self.config.reference_pitch_hz)
        else {
            // The gate only admits positive finite frequencies.
            return self.inactive_output();
        };

        let bands_before = self.tracker.bands_started();
        let stability_seconds = self.tracker.observe(sample.frequency_hz, sample.timestamp);
        if self.tracker.bands_started() != bands_before {
            // A new band means a new note; don't average it with the old one.
            self.smoother.clear();
        }

        let reading = TunerReading::from_classification(sample.frequency_hz, classification);
        let target_deviation_cents = self
            .target_frequency
            .map(|target| tuning::cents_between(sample.frequency_hz, target));
        self.smoother
            .push(target_deviation_cents.unwrap_or(reading.deviation_cents));
        self.last_reading = Some(reading);

        EngineOutput {
            reading: Some(reading),
            stability_seconds,
            target_deviation_cents,
            smoothed_cents: self.smoother.mean(),
        }
    }

    /// Switches between nearest-note and target-note tuning.
    ///
    /// # Errors
    /// [`ConfigError::InvalidTargetNote`] if the target's frequency is not
    /// finite and positive (an octave far outside the audible range). The
    /// engine keeps its previous mode in that case.
    pub fn set_mode(&mut self, mode: TuningMode) -> ConfigResult<()> {
        let target_frequency = match mode {
            TuningMode::Auto => None,
            TuningMode::Target { note, octave } => {
                let frequency =
                    tuning::note_frequency(note, octave, self.config.reference_pitch_hz);
                if !frequency.is_finite() || frequency <= 0.0 {
                    return Err(ConfigError::InvalidTargetNote {
                        note,
                        octave,
                        frequency,
                    });
                }
                Some(frequency)
            }
        };
        debug!("[ENGINE] Mode set to {:?} (target {:?} Hz)", mode, target_frequency);
        self.target_frequency = target_frequency;
        self.mode = mode;
        self.smoother.clear();
        Ok(())
    }

    /// Returns the engine to its session-start state.
    ///
    /// Call at session boundaries (stop, restart, scene teardown). The tuning
    /// mode and configuration are kept.
    pub fn reset(&mut self) {
        debug!("[ENGINE] Session reset");
        self.tracker.reset();
        self.smoother.clear();
        self.last_reading = None;
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn mode(&self) -> TuningMode {
        self.mode
    }

    /// Frequency of the current target note, if any.
    pub fn target_frequency(&self) -> Option<f64> {
        self.target_frequency
    }

    pub fn stability_state(&self) -> &StabilityState {
        self.tracker.state()
    }

    /// Number of stability bands opened since the last reset.
    pub fn bands_started(&self) -> u64 {
        self.tracker.bands_started()
    }

    /// The most recent active reading.
    pub fn last_reading(&self) -> Option<TunerReading> {
        self.last_reading
    }

    fn inactive_output(&mut self) -> EngineOutput {
        // Dropouts clear the needle average, same as losing the pitch.
        self.smoother.clear();
        EngineOutput {
            reading: self.last_reading.map(TunerReading::deactivated),
            stability_seconds: self.tracker.state().accumulated_duration(),
            target_deviation_cents: None,
            smoothed_cents: None,
        }
    }
}
