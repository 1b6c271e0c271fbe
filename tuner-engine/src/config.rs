//! Engine configuration
//!
//! All tunable thresholds live in one serde-backed struct so they can be
//! loaded from a JSON file and adjusted without recompiling. Missing keys
//! fall back to the defaults below.

use log::info;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{ConfigError, ConfigResult};
use crate::gate::ActivityGate;
use crate::smoothing::CentSmoother;
use crate::stability::{AnchorPolicy, StabilityTracker};
use crate::tuning::DEFAULT_REFERENCE_PITCH;

/// Complete engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Frequency of A4 in Hz
    pub reference_pitch_hz: f64,
    /// Samples at or below this amplitude (0..1) are inactive
    pub amplitude_threshold: f64,
    /// Lowest frequency considered musical, in Hz
    pub min_frequency_hz: f64,
    /// Highest frequency considered musical, in Hz
    pub max_frequency_hz: f64,
    /// Half-width of the stability band, in Hz
    pub stability_threshold_hz: f64,
    /// Whether the band anchor is fixed or follows the note
    pub anchor_policy: AnchorPolicy,
    /// Number of recent deviations averaged into `smoothed_cents`
    pub smoothing_window: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            reference_pitch_hz: DEFAULT_REFERENCE_PITCH,
            amplitude_threshold: ActivityGate::DEFAULT_AMPLITUDE_THRESHOLD,
            min_frequency_hz: ActivityGate::DEFAULT_MIN_FREQUENCY,
            max_frequency_hz: ActivityGate::DEFAULT_MAX_FREQUENCY,
            stability_threshold_hz: StabilityTracker::DEFAULT_THRESHOLD_HZ,
            anchor_policy: AnchorPolicy::Fixed,
            smoothing_window: CentSmoother::DEFAULT_WINDOW,
        }
    }
}

impl EngineConfig {
    /// Load and validate configuration from a JSON file
    ///
    /// # Arguments
    /// * `path` - Path to JSON config file
    ///
    /// # Returns
    /// * `Ok(EngineConfig)` - Loaded configuration, defaults for missing keys
    /// * `Err(ConfigError)` - File unreadable, invalid JSON, or invalid values
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        info!("[CONFIG] Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Checks every field against its allowed range.
    pub fn validate(&self) -> ConfigResult<()> {
        if !(self.reference_pitch_hz.is_finite() && self.reference_pitch_hz > 0.0) {
            return Err(ConfigError::InvalidReferencePitch(self.reference_pitch_hz));
        }
        if !(self.amplitude_threshold.is_finite()
            && (0.0..1.0).contains(&self.amplitude_threshold))
        {
            return Err(ConfigError::InvalidAmplitudeThreshold(
                self.amplitude_threshold,
            ));
        }
        let (min, max) = (self.min_frequency_hz, self.max_frequency_hz);
        if !(min.is_finite() && max.is_finite() && min > 0.0 && min < max) {
            return Err(ConfigError::InvalidFrequencyRange { min, max });
        }
        if !(self.stability_threshold_hz.is_finite() && self.stability_threshold_hz >= 0.0) {
            return Err(ConfigError::InvalidStabilityThreshold(
                self.stability_threshold_hz,
            ));
        }
        if let AnchorPolicy::Recentering { smoothing } = self.anchor_policy {
            if !(smoothing.is_finite() && smoothing > 0.0 && smoothing <= 1.0) {
                return Err(ConfigError::InvalidSmoothing(smoothing));
            }
        }
        if self.smoothing_window == 0 {
            return Err(ConfigError::InvalidSmoothingWindow);
        }
        Ok(())
    }
}
