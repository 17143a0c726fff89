//! Command-line argument parsing.

use std::path::PathBuf;

use clap::Parser;
use tracing::{info, warn};

use crate::error::PayloadError;
use crate::params::{NoiseKind, Preset, PropConfig};
use crate::session::SensorReading;

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "signallock")]
#[command(about = "Noise-masked audio puzzle driven by two potentiometers", long_about = None)]
pub struct Args {
    /// Prop preset: coarse (default), fine
    #[arg(long, value_name = "PRESET", default_value = "coarse")]
    pub preset: String,

    /// WAV file looped as the clean signal
    #[arg(long, value_name = "PATH")]
    pub asset: Option<PathBuf>,

    /// Gain applied to the asset on load
    #[arg(long, value_name = "GAIN")]
    pub source_gain: Option<f32>,

    /// Hidden targets as "ch1,ch2" (ADC counts)
    #[arg(long, value_name = "CH1,CH2")]
    pub target: Option<String>,

    /// Per-channel tolerance (ADC counts)
    #[arg(long, value_name = "COUNTS")]
    pub tolerance: Option<u32>,

    /// Full-scale ADC reading
    #[arg(long, value_name = "COUNTS")]
    pub full_scale: Option<u32>,

    /// Seconds the targets must be held
    #[arg(long, value_name = "SECONDS")]
    pub hold: Option<f32>,

    /// Output volume scale
    #[arg(long, value_name = "SCALE")]
    pub volume: Option<f32>,

    /// Fixed noise seed (random if omitted)
    #[arg(long, value_name = "SEED")]
    pub noise_seed: Option<u64>,

    /// Render block size (frames)
    #[arg(long, value_name = "FRAMES")]
    pub block_size: Option<u32>,

    /// MQTT broker host
    #[arg(long, value_name = "HOST")]
    pub broker: Option<String>,

    /// MQTT broker port
    #[arg(long, value_name = "PORT")]
    pub port: Option<u16>,

    /// MQTT client id
    #[arg(long, value_name = "ID")]
    pub client_id: Option<String>,

    /// Sensor values topic
    #[arg(long, value_name = "TOPIC")]
    pub values_topic: Option<String>,

    /// Session control topic
    #[arg(long, value_name = "TOPIC")]
    pub control_topic: Option<String>,

    /// Channel control topic
    #[arg(long, value_name = "TOPIC")]
    pub channel_control_topic: Option<String>,

    /// Status topic
    #[arg(long, value_name = "TOPIC")]
    pub status_topic: Option<String>,

    /// Render offline to this WAV file instead of playing (no broker needed)
    #[arg(long, value_name = "WAV")]
    pub bounce: Option<PathBuf>,

    /// Length of the offline render (seconds)
    #[arg(long, value_name = "SECONDS", default_value = "10")]
    pub bounce_secs: f32,

    /// Fixed reading for the offline render as "ch1,ch2" (defaults to the target)
    #[arg(long, value_name = "CH1,CH2")]
    pub bounce_reading: Option<String>,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, value_name = "FILTER", default_value = "info")]
    pub log: String,
}

impl Args {
    /// Parse preset from command-line arguments
    pub fn parse_preset(&self) -> Preset {
        match self.preset.to_lowercase().as_str() {
            "coarse" => {
                info!("Preset: coarse (12-bit, tolerance 200, uniform noise)");
                Preset::Coarse
            }
            "fine" => {
                info!("Preset: fine (10-bit, tolerance 10, gaussian hiss)");
                Preset::Fine
            }
            other => {
                warn!("Unknown preset '{}', using coarse", other);
                Preset::Coarse
            }
        }
    }

    /// Preset configuration with command-line overrides applied
    pub fn prop_config(&self) -> Result<PropConfig, PayloadError> {
        let mut config = self.parse_preset().config();

        if let Some(full_scale) = self.full_scale {
            config.puzzle.full_scale = full_scale;
        }
        if let Some(target) = &self.target {
            config.puzzle.target = SensorReading::parse(target, config.puzzle.full_scale)?;
        }
        if let Some(tolerance) = self.tolerance {
            config.puzzle.tolerance = tolerance;
        }
        if let Some(hold) = self.hold {
            config.puzzle.hold_secs = hold;
        }
        if let Some(volume) = self.volume {
            config.puzzle.volume_scale = volume;
        }

        if let Some(seed) = self.noise_seed {
            config.noise.seed = Some(seed);
        }
        if let Some(path) = &self.asset {
            config.asset.path = path.clone();
        }
        if let Some(gain) = self.source_gain {
            config.asset.source_gain = gain;
        }
        if let Some(block_size) = self.block_size {
            config.stream.block_size_frames = block_size;
        }

        let bus = &mut config.bus;
        override_string(&mut bus.host, &self.broker);
        override_string(&mut bus.client_id, &self.client_id);
        if let Some(port) = self.port {
            bus.port = port;
        }
        override_string(&mut bus.topics.values, &self.values_topic);
        override_string(&mut bus.topics.control, &self.control_topic);
        override_string(&mut bus.topics.channel_control, &self.channel_control_topic);
        override_string(&mut bus.topics.status, &self.status_topic);

        match config.noise.kind {
            NoiseKind::Uniform { amplitude } => info!("Noise: uniform ±{}", amplitude),
            NoiseKind::Normal { std_dev } => info!("Noise: gaussian σ {}", std_dev),
        }

        Ok(config)
    }

    /// Reading held during an offline render
    pub fn bounce_reading(&self, config: &PropConfig) -> Result<SensorReading, PayloadError> {
        match &self.bounce_reading {
            Some(reading) => SensorReading::parse(reading, config.puzzle.full_scale),
            None => Ok(config.puzzle.target),
        }
    }
}

fn override_string(field: &mut String, value: &Option<String>) {
    if let Some(value) = value {
        field.clone_from(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_use_coarse_preset() {
        let args = Args::parse_from(["signallock"]);
        let config = args.prop_config().unwrap();
        assert_eq!(config.puzzle.full_scale, 4095);
        assert_eq!(config.bus.topics.values, "potentiometer/values");
        assert!(args.bounce.is_none());
    }

    #[test]
    fn test_overrides_apply_over_preset() {
        let args = Args::parse_from([
            "signallock",
            "--preset",
            "FINE",
            "--target",
            "100,200",
            "--hold",
            "5",
            "--broker",
            "10.3.141.1",
            "--status-topic",
            "prop/status",
            "--block-size",
            "512",
        ]);
        let config = args.prop_config().unwrap();

        assert_eq!(config.puzzle.full_scale, 1023);
        assert_eq!(config.puzzle.target, SensorReading::new(100, 200));
        assert_eq!(config.puzzle.tolerance, 10);
        assert_eq!(config.puzzle.hold_secs, 5.0);
        assert_eq!(config.bus.host, "10.3.141.1");
        assert_eq!(config.bus.topics.status, "prop/status");
        assert_eq!(config.stream.block_size_frames, 512);
    }

    #[test]
    fn test_target_checked_against_full_scale() {
        let args = Args::parse_from(["signallock", "--preset", "fine", "--target", "2000,0"]);
        assert!(args.prop_config().is_err());

        let args = Args::parse_from([
            "signallock",
            "--preset",
            "fine",
            "--full-scale",
            "4095",
            "--target",
            "2000,0",
        ]);
        assert!(args.prop_config().is_ok());
    }

    #[test]
    fn test_unknown_preset_falls_back() {
        let args = Args::parse_from(["signallock", "--preset", "huge"]);
        assert_eq!(args.parse_preset(), Preset::Coarse);
    }

    #[test]
    fn test_bounce_reading_defaults_to_target() {
        let args = Args::parse_from(["signallock", "--preset", "fine", "--bounce", "out.wav"]);
        let config = args.prop_config().unwrap();
        assert_eq!(args.bounce_reading(&config).unwrap(), SensorReading::new(500, 500));

        let args = Args::parse_from(["signallock", "--bounce-reading", "1,2"]);
        let config = args.prop_config().unwrap();
        assert_eq!(args.bounce_reading(&config).unwrap(), SensorReading::new(1, 2));
    }
}
