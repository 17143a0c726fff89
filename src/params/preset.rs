//! Deployment presets for the two prop builds.

use super::audio::{NoiseConfig, NoiseKind};
use super::puzzle::{PuzzleConfig, FULL_SCALE_10_BIT};
use super::PropConfig;
use crate::session::SensorReading;

/// Prop preset selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Preset {
    /// 12-bit ADC, wide tolerance, full-range uniform noise over a doubled source
    #[default]
    Coarse,

    /// 10-bit ADC, tight tolerance around mid-travel, quiet Gaussian hiss
    Fine,
}

impl Preset {
    /// Full configuration for this preset, with default bus and stream settings
    pub fn config(self) -> PropConfig {
        let mut config = PropConfig::default();
        match self {
            Preset::Coarse => {
                config.puzzle = PuzzleConfig::default();
                config.noise = NoiseConfig {
                    kind: NoiseKind::Uniform { amplitude: 1.0 },
                    seed: None,
                };
                config.asset.source_gain = 2.0;
            }
            Preset::Fine => {
                config.puzzle = PuzzleConfig {
                    target: SensorReading::new(500, 500),
                    tolerance: 10,
                    full_scale: FULL_SCALE_10_BIT,
                    hold_secs: 3.0,
                    volume_scale: 1.0,
                };
                config.noise = NoiseConfig {
                    kind: NoiseKind::Normal { std_dev: 0.1 },
                    seed: None,
                };
                config.asset.source_gain = 1.0;
            }
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::FULL_SCALE_12_BIT;

    #[test]
    fn test_presets_are_valid() {
        assert!(Preset::Coarse.config().validate().is_ok());
        assert!(Preset::Fine.config().validate().is_ok());
    }

    #[test]
    fn test_fine_preset_values() {
        let config = Preset::Fine.config();
        assert_eq!(config.puzzle.target, SensorReading::new(500, 500));
        assert_eq!(config.puzzle.tolerance, 10);
        assert_eq!(config.puzzle.full_scale, 1023);
        assert_eq!(config.noise.kind, NoiseKind::Normal { std_dev: 0.1 });
    }

    #[test]
    fn test_coarse_preset_values() {
        let config = Preset::Coarse.config();
        assert_eq!(config.puzzle.full_scale, FULL_SCALE_12_BIT);
        assert_eq!(config.puzzle.tolerance, 200);
        assert_eq!(config.asset.source_gain, 2.0);
    }
}
