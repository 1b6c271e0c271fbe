//! # Activity Gate
//!
//! Decides whether a sample carries a real musical signal. Quiet samples and
//! frequencies outside the playable range are dropped before classification,
//! and they never reach the stability tracker: a gated sample is "no
//! observation", not "observed silence".

use crate::config::EngineConfig;
use crate::PitchSample;

/// Amplitude/frequency-range filter applied to every incoming sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActivityGate {
    amplitude_threshold: f64,
    min_frequency_hz: f64,
    max_frequency_hz: f64,
}

impl ActivityGate {
    /// Default minimum amplitude on a 0..1 scale.
    pub const DEFAULT_AMPLITUDE_THRESHOLD: f64 = 0.02;
    /// Default lowest accepted frequency in Hz.
    pub const DEFAULT_MIN_FREQUENCY: f64 = 20.0;
    /// Default highest accepted frequency in Hz.
    pub const DEFAULT_MAX_FREQUENCY: f64 = 2000.0;

    pub fn new(amplitude_threshold: f64, min_frequency_hz: f64, max_frequency_hz: f64) -> Self {
        Self {
            amplitude_threshold,
            min_frequency_hz,
            max_frequency_hz,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(
            config.amplitude_threshold,
            config.min_frequency_hz,
            config.max_frequency_hz,
        )
    }

    /// Returns `true` if the sample should be classified and tracked.
    ///
    /// The amplitude must be strictly above the threshold; the frequency
    /// range is inclusive at both ends. Malformed samples are never active.
    pub fn is_active(&self, sample: &PitchSample) -> bool {
        sample.is_well_formed()
            && sample.amplitude > self.amplitude_threshold
            && (self.min_frequency_hz..=self.max_frequency_hz).contains(&sample.frequency_hz)
    }

    pub fn amplitude_threshold(&self) -> f64 {
        self.amplitude_threshold
    }

    pub fn frequency_range(&self) -> (f64, f64) {
        (self.min_frequency_hz, self.max_frequency_hz)
    }
}

impl Default for ActivityGate {
    fn default() -> Self {
        Self::new(
            Self::DEFAULT_AMPLITUDE_THRESHOLD,
            Self::DEFAULT_MIN_FREQUENCY,
            Self::DEFAULT_MAX_FREQUENCY,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loud_in_range_sample_is_active() {
        let gate = ActivityGate::default();
        assert!(gate.is_active(&PitchSample::new(440.0, 0.5, 0.0)));
    }

    #[test]
    fn test_quiet_sample_is_inactive() {
        let gate = ActivityGate::default();
        assert!(!gate.is_active(&PitchSample::new(440.0, 0.01, 0.0)));
        // Threshold itself is not enough.
        assert!(!gate.is_active(&PitchSample::new(440.0, 0.02, 0.0)));
        assert!(gate.is_active(&PitchSample::new(440.0, 0.021, 0.0)));
    }

    #[test]
    fn test_frequency_range_is_inclusive() {
        let gate = ActivityGate::default();
        assert!(gate.is_active(&PitchSample::new(20.0, 0.5, 0.0)));
        assert!(gate.is_active(&PitchSample::new(2000.0, 0.5, 0.0)));
        assert!(!gate.is_active(&PitchSample::new(19.99, 0.5, 0.0)));
        assert!(!gate.is_active(&PitchSample::new(2000.01, 0.5, 0.0)));
    }

    #[test]
    fn test_malformed_samples_are_inactive() {
        let gate = ActivityGate::default();
        assert!(!gate.is_active(&PitchSample::new(f64::NAN, 0.5, 0.0)));
        assert!(!gate.is_active(&PitchSample::new(f64::INFINITY, 0.5, 0.0)));
        assert!(!gate.is_active(&PitchSample::new(440.0, f64::NAN, 0.0)));
        assert!(!gate.is_active(&PitchSample::new(440.0, -0.5, 0.0)));
        assert!(!gate.is_active(&PitchSample::new(440.0, 0.5, f64::NAN)));
        assert!(!gate.is_active(&PitchSample::new(-440.0, 0.5, 0.0)));
    }

    #[test]
    fn test_from_config() {
        let config = EngineConfig {
            amplitude_threshold: 0.1,
            min_frequency_hz: 50.0,
            max_frequency_hz: 1000.0,
            ..EngineConfig::default()
        };
        let gate = ActivityGate::from_config(&config);
        assert_eq!(gate.amplitude_threshold(), 0.1);
        assert_eq!(gate.frequency_range(), (50.0, 1000.0));
        assert!(!gate.is_active(&PitchSample::new(440.0, 0.05, 0.0)));
        assert!(!gate.is_active(&PitchSample::new(1200.0, 0.5, 0.0)));
    }
}
