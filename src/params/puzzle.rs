//! Puzzle calibration: targets, tolerance and hold time.

use std::time::Duration;

use crate::error::ConfigError;
use crate::session::SensorReading;

/// Full-scale reading of a 12-bit ADC
pub const FULL_SCALE_12_BIT: u32 = 4095;

/// Full-scale reading of a 10-bit ADC
pub const FULL_SCALE_10_BIT: u32 = 1023;

/// Calibration of the two potentiometers and the unlock condition
#[derive(Debug, Clone)]
pub struct PuzzleConfig {
    /// Hidden target position per channel (ADC counts)
    pub target: SensorReading,

    /// Largest per-channel deviation still counted as correct (ADC counts, inclusive)
    pub tolerance: u32,

    /// Full-scale reading of the sensor ADC, used to normalize distance
    pub full_scale: u32,

    /// Time both channels must stay in tolerance before the puzzle is solved (seconds)
    pub hold_secs: f32,

    /// Output gain applied after the clean/noise blend (dimensionless)
    /// 1.0 = unity
    pub volume_scale: f32,
}

impl Default for PuzzleConfig {
    fn default() -> Self {
        Self {
            target: SensorReading::new(0, 0),
            tolerance: 200,
            full_scale: FULL_SCALE_12_BIT,
            hold_secs: 3.0,
            volume_scale: 1.0,
        }
    }
}

impl PuzzleConfig {
    /// Required continuous hold as a monotonic-clock duration
    pub fn hold_duration(&self) -> Result<Duration, ConfigError> {
        Duration::try_from_secs_f32(self.hold_secs).map_err(|_| {
            ConfigError::invalid(
                "hold_secs",
                format!("must be a representable non-negative number of seconds, got {}", self.hold_secs),
            )
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.full_scale == 0 {
            return Err(ConfigError::invalid("full_scale", "must be > 0"));
        }
        if self.target.ch1 > self.full_scale || self.target.ch2 > self.full_scale {
            return Err(ConfigError::invalid(
                "target",
                format!(
                    "{} exceeds full scale {}",
                    self.target, self.full_scale
                ),
            ));
        }
        self.hold_duration()?;
        if !self.volume_scale.is_finite() || self.volume_scale < 0.0 {
            return Err(ConfigError::invalid(
                "volume_scale",
                format!("must be >= 0, got {}", self.volume_scale),
            ));
        }
        Ok(())
    }
}
