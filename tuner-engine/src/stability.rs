//! # Stability Tracking Module
//!
//! Measures how long the detected frequency has stayed inside a tolerance
//! band. Every accepted sample is compared against the band's anchor
//! frequency; leaving the band starts a new one from the offending sample.
//!
//! The tracker never looks at amplitude. Gating happens upstream and gated
//! samples must not be passed in.

use log::{debug, trace};
use serde::{Deserialize, Serialize};

/// How the band anchor behaves while samples stay inside the band.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum AnchorPolicy {
    /// The anchor stays at the frequency that opened the band. A slow
    /// glissando eventually leaves the band even though each step is small.
    #[default]
    Fixed,
    /// The anchor moves toward each in-band sample by `smoothing * delta`,
    /// so a slowly bending note can stay stable.
    Recentering {
        /// Fraction of the distance covered per sample, in `(0, 1]`.
        smoothing: f64,
    },
}

/// Band bookkeeping owned by a single [`StabilityTracker`].
///
/// `accumulated_duration` is non-zero only while `band_start` is set; both
/// are cleared together.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StabilityState {
    reference_frequency: f64,
    band_start: Option<f64>,
    accumulated_duration: f64,
}

impl StabilityState {
    /// Center of the current band in Hz (`0.0` when no band is open).
    pub fn reference_frequency(&self) -> f64 {
        self.reference_frequency
    }

    /// Timestamp at which the current band opened.
    pub fn band_start(&self) -> Option<f64> {
        self.band_start
    }

    /// Seconds spent in the current band.
    pub fn accumulated_duration(&self) -> f64 {
        self.accumulated_duration
    }

    /// Whether a band is currently open.
    pub fn has_band(&self) -> bool {
        self.band_start.is_some()
    }

    fn open_band(&mut self, frequency_hz: f64, timestamp: f64) {
        self.reference_frequency = frequency_hz;
        self.band_start = Some(timestamp);
        self.accumulated_duration = 0.0;
    }
}

/// Hysteresis filter that reports how long a note has been held.
#[derive(Debug, Clone, PartialEq)]
pub struct StabilityTracker {
    threshold_hz: f64,
    policy: AnchorPolicy,
    state: StabilityState,
    bands_started: u64,
}

impl StabilityTracker {
    /// Default band half-width in Hz.
    pub const DEFAULT_THRESHOLD_HZ: f64 = 3.0;

    pub fn new(threshold_hz: f64, policy: AnchorPolicy) -> Self {
        Self {
            threshold_hz,
            policy,
            state: StabilityState::default(),
            bands_started: 0,
        }
    }

    /// Feeds one active sample and returns the current stability duration.
    ///
    /// # Arguments
    /// * `frequency_hz` - Detected frequency of an active sample
    /// * `timestamp` - Monotonic capture time in seconds
    ///
    /// # Returns
    /// * Seconds the frequency has stayed within `threshold_hz` of the band
    ///   anchor, `0.0` on the sample that opens a band
    pub fn observe(&mut self, frequency_hz: f64, timestamp: f64) -> f64 {
        if !frequency_hz.is_finite() || !timestamp.is_finite() {
            trace!("[STABILITY] Ignoring non-finite sample ({frequency_hz} Hz @ {timestamp})");
            return self.state.accumulated_duration;
        }

        match self.state.band_start {
            None => self.start_band(frequency_hz, timestamp),
            Some(start) if timestamp < start => {
                debug!(
                    "[STABILITY] Timestamp {timestamp:.3}s precedes band start {start:.3}s; restarting band"
                );
                self.start_band(frequency_hz, timestamp);
            }
            Some(start) => {
                let drift = (frequency_hz - self.state.reference_frequency).abs();
                if drift <= self.threshold_hz {
                    if let AnchorPolicy::Recentering { smoothing } = self.policy {
                        self.state.reference_frequency +=
                            smoothing * (frequency_hz - self.state.reference_frequency);
                    }
                    self.state.accumulated_duration = timestamp - start;
                } else {
                    debug!(
                        "[STABILITY] Drift {drift:.2} Hz exceeds {:.2} Hz after {:.3}s; new band at {frequency_hz:.2} Hz",
                        self.threshold_hz, self.state.accumulated_duration
                    );
                    self.start_band(frequency_hz, timestamp);
                }
            }
        }

        self.state.accumulated_duration
    }

    /// Clears the band. Safe to call any number of times.
    pub fn reset(&mut self) {
        if self.state.has_band() {
            debug!(
                "[STABILITY] Reset after {:.3}s in band at {:.2} Hz",
                self.state.accumulated_duration, self.state.reference_frequency
            );
        }
        self.state = StabilityState::default();
        self.bands_started = 0;
    }

    pub fn state(&self) -> &StabilityState {
        &self.state
    }

    /// Number of bands opened since construction or the last reset.
    pub fn bands_started(&self) -> u64 {
        self.bands_started
    }

    pub fn threshold_hz(&self) -> f64 {
        self.threshold_hz
    }

    pub fn policy(&self) -> AnchorPolicy {
        self.policy
    }

    fn start_band(&mut self, frequency_hz: f64, timestamp: f64) {
        self.state.open_band(frequency_hz, timestamp);
        self.bands_started += 1;
    }
}

impl Default for StabilityTracker {
    fn default() -> Self {
        Self::new(Self::DEFAULT_THRESHOLD_HZ, AnchorPolicy::Fixed)
    }
}
