//! Estimator configuration, stored on disk as [ron].
//!
//! A config file looks like this:
//!
//! ```text
//! (mic_distance:0.2,speed_of_sound:343.0,normalize:false,method:Auto)
//! ```
//!
//! Every field is optional in the file; missing fields take their defaults.

use crate::correlation::CorrelationMethod;
use crate::error::DoaError;

use log::warn;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

/// Speed of sound in dry air at about 20 °C, in m/s.
pub const DEFAULT_SPEED_OF_SOUND: f64 = 343.0;

/// Microphone spacing used when nothing else is given, in meters.
pub const DEFAULT_MIC_DISTANCE: f64 = 0.2;

/// The spacings a handheld two-mic rig realistically covers. Values outside
/// are allowed but get a warning.
pub const MIC_DISTANCE_RANGE: (f64, f64) = (0.01, 1.0);

/// Geometry and processing options for the estimator.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct EstimatorConfig {
    /// Distance between the two microphones, in meters.
    pub mic_distance: f64,
    /// Propagation speed, in m/s.
    pub speed_of_sound: f64,
    /// Scale each channel to unit peak before correlating.
    pub normalize: bool,
    /// Correlation strategy.
    pub method: CorrelationMethod,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            mic_distance: DEFAULT_MIC_DISTANCE,
            speed_of_sound: DEFAULT_SPEED_OF_SOUND,
            normalize: false,
            method: CorrelationMethod::default(),
        }
    }
}

impl EstimatorConfig {
    /// Config for a given spacing, everything else default.
    pub fn with_mic_distance(mic_distance: f64) -> Self {
        Self {
            mic_distance,
            ..Self::default()
        }
    }

    /// Rejects geometry the angle computation cannot work with, and warns
    /// about a spacing outside [MIC_DISTANCE_RANGE].
    pub fn validate(&self) -> Result<(), DoaError> {
        check_geometry(self.mic_distance, self.speed_of_sound)?;

        let (lo, hi) = MIC_DISTANCE_RANGE;
        if self.mic_distance < lo || self.mic_distance > hi {
            warn!(
                "microphone distance {} m is outside the usual {}..{} m range",
                self.mic_distance, lo, hi
            );
        }
        Ok(())
    }

    /// The largest delay the geometry allows, `d / c`, in seconds.
    pub fn max_tdoa(&self) -> f64 {
        self.mic_distance / self.speed_of_sound
    }

    /// Reads a config from a RON file and validates it.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, DoaError> {
        let text = fs::read_to_string(path)?;
        let config: Self = ron::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Writes the config to a RON file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), DoaError> {
        let text = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())?;
        fs::write(path, text)?;
        Ok(())
    }
}

/// The hard half of [EstimatorConfig::validate]: both quantities must be
/// finite and positive. Never logs.
pub fn check_geometry(mic_distance: f64, speed_of_sound: f64) -> Result<(), DoaError> {
    // written so that NaN fails too
    if !(mic_distance > 0.0) || !mic_distance.is_finite() {
        return Err(DoaError::InvalidMicDistance(mic_distance));
    }
    if !(speed_of_sound > 0.0) || !speed_of_sound.is_finite() {
        return Err(DoaError::InvalidSpeedOfSound(speed_of_sound));
    }
    Ok(())
}
