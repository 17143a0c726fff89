//! Parameter definitions with physical units and documented semantics.
//!
//! All magic numbers are extracted here with:
//! - Physical units (ADC counts, seconds, milliseconds, frames)
//! - Documented ranges and meanings
//! - Validation before anything is started

mod audio;
mod bus;
mod preset;
mod puzzle;

// Re-export all types
pub use audio::{audio_constants, AssetConfig, NoiseConfig, NoiseKind, StreamSettings};
pub use bus::{BusConfig, Topics};
pub use preset::Preset;
pub use puzzle::{PuzzleConfig, FULL_SCALE_10_BIT, FULL_SCALE_12_BIT};

use crate::error::ConfigError;

/// Complete prop configuration
#[derive(Debug, Clone, Default)]
pub struct PropConfig {
    pub puzzle: PuzzleConfig,
    pub noise: NoiseConfig,
    pub asset: AssetConfig,
    pub stream: StreamSettings,
    pub bus: BusConfig,
}

impl PropConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.puzzle.validate()?;
        self.noise.validate()?;
        self.asset.validate()?;
        self.stream.validate()?;
        self.bus.validate()
    }
}
