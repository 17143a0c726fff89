//! Clean and noise sample buffers, built once per process.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use tracing::{debug, info};

use crate::error::{AssetError, ConfigError};
use crate::params::{AssetConfig, NoiseConfig, NoiseKind};

/// Immutable interleaved clean audio plus a same-shaped noise bed
#[derive(Debug)]
pub struct SignalBuffers {
    clean: Vec<f32>,
    noise: Vec<f32>,
    channels: u16,
    sample_rate: u32,
}

impl SignalBuffers {
    /// Build buffers from interleaved samples, generating the noise bed
    pub fn from_interleaved(
        clean: Vec<f32>,
        channels: u16,
        sample_rate: u32,
        noise: &NoiseConfig,
    ) -> Result<Self, AssetError> {
        noise.validate()?;
        if channels == 0 {
            return Err(AssetError::NoChannels);
        }
        if clean.is_empty() {
            return Err(AssetError::NoFrames);
        }
        if clean.len() % channels as usize != 0 {
            return Err(AssetError::Shape {
                samples: clean.len(),
                channels,
            });
        }

        let noise = generate_noise(clean.len(), noise)?;

        Ok(Self {
            clean,
            noise,
            channels,
            sample_rate,
        })
    }

    /// Load a WAV asset, widen mono to stereo and apply the source gain
    pub fn load(asset: &AssetConfig, noise: &NoiseConfig) -> Result<Self, AssetError> {
        asset.validate()?;

        let mut reader = hound::WavReader::open(&asset.path)?;
        let spec = reader.spec();
        debug!(
            "Asset format: {} ch, {} Hz, {} bit {:?}",
            spec.channels, spec.sample_rate, spec.bits_per_sample, spec.sample_format
        );

        let mut samples: Vec<f32> = match spec.sample_format {
            hound::SampleFormat::Float => reader.samples::<f32>().collect::<Result<_, _>>()?,
            hound::SampleFormat::Int => {
                let scale = 1.0 / (1_i64 << (spec.bits_per_sample.max(1) - 1)) as f32;
                reader
                    .samples::<i32>()
                    .map(|s| s.map(|v| v as f32 * scale))
                    .collect::<Result<_, _>>()?
            }
        };

        if samples.is_empty() {
            return Err(AssetError::Empty(asset.path.clone()));
        }

        let mut channels = spec.channels;
        if channels == 1 {
            samples = samples.iter().flat_map(|&s| [s, s]).collect();
            channels = 2;
        }

        if asset.source_gain != 1.0 {
            samples.iter_mut().for_each(|s| *s *= asset.source_gain);
        }

        let buffers = Self::from_interleaved(samples, channels, spec.sample_rate, noise)?;
        info!(
            "Loaded {}: {} frames x {} ch @ {}Hz ({:.1}s)",
            asset.path.display(),
            buffers.frames(),
            buffers.channels,
            buffers.sample_rate,
            buffers.duration_secs()
        );
        Ok(buffers)
    }

    /// Frames per channel; never zero
    pub fn frames(&self) -> usize {
        self.clean.len() / self.channels as usize
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn duration_secs(&self) -> f32 {
        self.frames() as f32 / self.sample_rate.max(1) as f32
    }

    pub fn clean(&self) -> &[f32] {
        &self.clean
    }

    pub fn noise(&self) -> &[f32] {
        &self.noise
    }
}

/// Independent noise for every sample of every channel
fn generate_noise(len: usize, config: &NoiseConfig) -> Result<Vec<f32>, AssetError> {
    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let noise = match config.kind {
        NoiseKind::Uniform { amplitude } => (0..len)
            .map(|_| rng.gen_range(-amplitude..=amplitude))
            .collect(),
        NoiseKind::Normal { std_dev } => {
            let normal = Normal::new(0.0_f32, std_dev)
                .map_err(|e| ConfigError::invalid("noise std_dev", e.to_string()))?;
            (0..len).map(|_| normal.sample(&mut rng)).collect()
        }
    };
    Ok(noise)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn seeded(kind: NoiseKind) -> NoiseConfig {
        NoiseConfig {
            kind,
            seed: Some(7),
        }
    }

    #[test]
    fn test_noise_matches_clean_shape() {
        let buffers = SignalBuffers::from_interleaved(
            vec![0.0; 2000],
            2,
            48000,
            &seeded(NoiseKind::Uniform { amplitude: 1.0 }),
        )
        .unwrap();

        assert_eq!(buffers.frames(), 1000);
        assert_eq!(buffers.noise().len(), buffers.clean().len());
        assert!(buffers.noise().iter().all(|n| (-1.0..=1.0).contains(n)));
    }

    #[test]
    fn test_noise_channels_are_independent() {
        let buffers = SignalBuffers::from_interleaved(
            vec![0.0; 2000],
            2,
            48000,
            &seeded(NoiseKind::Uniform { amplitude: 1.0 }),
        )
        .unwrap();

        let noise = buffers.noise();
        let identical = noise
            .chunks_exact(2)
            .filter(|frame| frame[0] == frame[1])
            .count();
        assert!(identical < 10);
    }

    #[test]
    fn test_normal_noise_spread() {
        let buffers = SignalBuffers::from_interleaved(
            vec![0.0; 20000],
            1,
            48000,
            &seeded(NoiseKind::Normal { std_dev: 0.1 }),
        )
        .unwrap();

        let noise = buffers.noise();
        let mean = noise.iter().sum::<f32>() / noise.len() as f32;
        let var = noise.iter().map(|n| (n - mean).powi(2)).sum::<f32>() / noise.len() as f32;
        assert!(mean.abs() < 0.01);
        assert!((var.sqrt() - 0.1).abs() < 0.01);
    }

    #[test]
    fn test_bad_gaussian_parameters_are_an_error() {
        let result = generate_noise(16, &seeded(NoiseKind::Normal { std_dev: f32::NAN }));
        assert!(matches!(result, Err(AssetError::Config(_))));
    }

    #[test]
    fn test_seed_is_deterministic() {
        let config = seeded(NoiseKind::Uniform { amplitude: 0.5 });
        let a = SignalBuffers::from_interleaved(vec![0.0; 64], 2, 44100, &config).unwrap();
        let b = SignalBuffers::from_interleaved(vec![0.0; 64], 2, 44100, &config).unwrap();
        assert_eq!(a.noise(), b.noise());
    }

    #[test]
    fn test_empty_source_fails_fast() {
        let result =
            SignalBuffers::from_interleaved(Vec::new(), 2, 48000, &NoiseConfig::default());
        assert!(matches!(result, Err(AssetError::NoFrames)));
    }

    #[test]
    fn test_zero_channels_rejected() {
        let result = SignalBuffers::from_interleaved(vec![0.0; 4], 0, 48000, &NoiseConfig::default());
        assert!(matches!(result, Err(AssetError::NoChannels)));
    }

    #[test]
    fn test_ragged_frames_rejected() {
        let result = SignalBuffers::from_interleaved(vec![0.0; 5], 2, 48000, &NoiseConfig::default());
        assert!(matches!(result, Err(AssetError::Shape { .. })));
    }

    fn write_wav(path: &std::path::Path, channels: u16, samples: &[i16]) {
        let spec = hound::WavSpec {
            channels,
            sample_rate: 22050,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for &s in samples {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn test_load_widens_mono_and_applies_gain() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mono.wav");
        write_wav(&path, 1, &[0, 8192, -8192]);

        let asset = AssetConfig {
            path: path.clone(),
            source_gain: 2.0,
        };
        let buffers = SignalBuffers::load(&asset, &NoiseConfig::default()).unwrap();

        assert_eq!(buffers.channels(), 2);
        assert_eq!(buffers.frames(), 3);
        assert_eq!(buffers.sample_rate(), 22050);
        assert_eq!(buffers.clean(), &[0.0, 0.0, 0.5, 0.5, -0.5, -0.5]);
    }

    #[test]
    fn test_load_empty_asset_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.wav");
        write_wav(&path, 2, &[]);

        let asset = AssetConfig {
            path,
            source_gain: 1.0,
        };
        let result = SignalBuffers::load(&asset, &NoiseConfig::default());
        assert!(matches!(result, Err(AssetError::Empty(_))));
    }

    #[test]
    fn test_load_missing_asset_fails() {
        let asset = AssetConfig {
            path: PathBuf::from("/nonexistent/prop.wav"),
            source_gain: 1.0,
        };
        assert!(matches!(
            SignalBuffers::load(&asset, &NoiseConfig::default()),
            Err(AssetError::Wav(_))
        ));
    }
}
