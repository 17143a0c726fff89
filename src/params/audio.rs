//! Audio asset, noise and output stream configuration.

use std::path::PathBuf;

use crate::error::ConfigError;

/// Masking noise distribution
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NoiseKind {
    /// White noise uniformly distributed in [-amplitude, amplitude]
    Uniform { amplitude: f32 },

    /// Zero-mean Gaussian noise
    Normal { std_dev: f32 },
}

/// Masking noise generation parameters
#[derive(Debug, Clone)]
pub struct NoiseConfig {
    pub kind: NoiseKind,

    /// Fixed RNG seed; `None` seeds from the OS
    pub seed: Option<u64>,
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            kind: NoiseKind::Uniform { amplitude: 1.0 },
            seed: None,
        }
    }
}

impl NoiseConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.kind {
            NoiseKind::Uniform { amplitude } if !amplitude.is_finite() || amplitude < 0.0 => Err(
                ConfigError::invalid("noise amplitude", format!("must be >= 0, got {amplitude}")),
            ),
            NoiseKind::Normal { std_dev } if !std_dev.is_finite() || std_dev < 0.0 => Err(
                ConfigError::invalid("noise std_dev", format!("must be >= 0, got {std_dev}")),
            ),
            _ => Ok(()),
        }
    }
}

/// Clean audio asset on disk
#[derive(Debug, Clone)]
pub struct AssetConfig {
    /// WAV file looped as the clean signal
    pub path: PathBuf,

    /// Gain applied once to the loaded samples (dimensionless)
    /// The prop's recording is mastered quiet, so the coarse preset doubles it
    pub source_gain: f32,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("audio/bingbingbong.wav"),
            source_gain: 2.0,
        }
    }
}

impl AssetConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.source_gain.is_finite() || self.source_gain < 0.0 {
            return Err(ConfigError::invalid(
                "source_gain",
                format!("must be >= 0, got {}", self.source_gain),
            ));
        }
        Ok(())
    }
}

/// Output stream negotiation and supervision
#[derive(Debug, Clone)]
pub struct StreamSettings {
    /// Frames per render invocation requested from the backend
    pub block_size_frames: u32,

    /// How often the control thread checks session and stream health (milliseconds)
    pub supervise_interval_ms: u64,
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self {
            block_size_frames: audio_constants::DEFAULT_BLOCK_SIZE,
            supervise_interval_ms: 100,
        }
    }
}

impl StreamSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.block_size_frames == 0 {
            return Err(ConfigError::invalid("block_size_frames", "must be > 0"));
        }
        if self.supervise_interval_ms == 0 {
            return Err(ConfigError::invalid("supervise_interval_ms", "must be > 0"));
        }
        Ok(())
    }
}

/// Audio constants
pub mod audio_constants {
    /// Default render block size (frames)
    /// 1024 = 23ms @ 44.1kHz
    pub const DEFAULT_BLOCK_SIZE: u32 = 1024;

    /// Output samples are hard clipped to ±this value
    pub const SAMPLE_CEILING: f32 = 1.0;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noise_validation() {
        assert!(NoiseConfig::default().validate().is_ok());

        let bad = NoiseConfig {
            kind: NoiseKind::Normal { std_dev: f32::NAN },
            seed: None,
        };
        assert!(bad.validate().is_err());

        let bad = NoiseConfig {
            kind: NoiseKind::Uniform { amplitude: -0.5 },
            seed: None,
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_stream_settings_reject_zero_block() {
        let settings = StreamSettings {
            block_size_frames: 0,
            ..StreamSettings::default()
        };
        assert!(settings.validate().is_err());
    }
}
