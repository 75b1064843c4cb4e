//! Piano configuration
//!
//! ```ignore
//! let config = PianoConfig::new(48_000.0)
//!     .with_volume(80.0)
//!     .with_bpm(90.0)
//!     .with_seed(7);
//! let piano = Piano::new(ToneSynth::new(48_000.0), config)?;
//! ```

use crate::composer::ComposerSettings;
use crate::metronome::{DEFAULT_BPM, MAX_BPM, MIN_BPM};

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PianoConfig {
    /// Frames per second of the timeline clock
    pub sample_rate: f32,
    /// Initial master volume, 0-100
    pub volume: f32,
    /// Initial metronome tempo, clamped to 40-240
    pub bpm: f32,
    /// Chance of a chord on each composer tick
    pub chord_probability: f64,
    pub chord_delay_ms: f64,
    /// Fraction of a rhythm step a composed note is held
    pub release_ratio: f64,
    /// Seed for the composer; `None` seeds from the OS
    pub seed: Option<u64>,
}

impl PianoConfig {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            sample_rate,
            ..Self::default()
        }
    }

    pub fn with_volume(mut self, percent: f32) -> Self {
        self.volume = percent;
        self
    }

    pub fn with_bpm(mut self, bpm: f32) -> Self {
        self.bpm = bpm;
        self
    }

    pub fn with_chord_probability(mut self, probability: f64) -> Self {
        self.chord_probability = probability;
        self
    }

    pub fn with_chord_delay_ms(mut self, ms: f64) -> Self {
        self.chord_delay_ms = ms;
        self
    }

    pub fn with_release_ratio(mut self, ratio: f64) -> Self {
        self.release_ratio = ratio;
        self
    }

    /// Fix the composer's random seed for repeatable compositions
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Check every field. BPM is clamped rather than rejected.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.sample_rate.is_finite() || self.sample_rate <= 0.0 {
            return Err(ConfigError::InvalidSampleRate(self.sample_rate));
        }
        if !(0.0..=1.0).contains(&self.chord_probability) {
            return Err(ConfigError::ChordProbability(self.chord_probability));
        }
        if !self.chord_delay_ms.is_finite() || self.chord_delay_ms < 0.0 {
            return Err(ConfigError::ChordDelay(self.chord_delay_ms));
        }
        if !(self.release_ratio > 0.0 && self.release_ratio <= 1.0) {
            return Err(ConfigError::ReleaseRatio(self.release_ratio));
        }
        if !(0.0..=100.0).contains(&self.volume) {
            return Err(ConfigError::Volume(self.volume));
        }
        Ok(())
    }

    /// Tempo after clamping into the metronome's range
    pub fn clamped_bpm(&self) -> f32 {
        if self.bpm.is_nan() {
            DEFAULT_BPM
        } else {
            self.bpm.clamp(MIN_BPM, MAX_BPM)
        }
    }

    pub fn composer_settings(&self) -> ComposerSettings {
        ComposerSettings {
            chord_probability: self.chord_probability,
            chord_delay_ms: self.chord_delay_ms,
            release_ratio: self.release_ratio,
        }
    }
}

impl Default for PianoConfig {
    fn default() -> Self {
        let composer = ComposerSettings::default();
        Self {
            sample_rate: 48_000.0,
            volume: 70.0,
            bpm: DEFAULT_BPM,
            chord_probability: composer.chord_probability,
            chord_delay_ms: composer.chord_delay_ms,
            release_ratio: composer.release_ratio,
            seed: None,
        }
    }
}

/// Errors from an invalid [`PianoConfig`]
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Sample rate is zero, negative or not finite
    InvalidSampleRate(f32),
    /// Chord probability outside 0.0-1.0
    ChordProbability(f64),
    /// Chord delay negative or not finite
    ChordDelay(f64),
    /// Release ratio outside (0, 1]
    ReleaseRatio(f64),
    /// Volume outside 0-100
    Volume(f32),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::InvalidSampleRate(rate) => {
                write!(f, "Invalid sample rate: {} (must be a positive number)", rate)
            }
            ConfigError::ChordProbability(p) => {
                write!(f, "Chord probability {} is outside 0.0-1.0", p)
            }
            ConfigError::ChordDelay(ms) => {
                write!(f, "Chord delay {}ms must be zero or more", ms)
            }
            ConfigError::ReleaseRatio(ratio) => {
                write!(f, "Release ratio {} is outside (0, 1]", ratio)
            }
            ConfigError::Volume(volume) => {
                write!(f, "Volume {}% is outside 0-100", volume)
            }
        }
    }
}

impl std::error::Error for ConfigError {}
