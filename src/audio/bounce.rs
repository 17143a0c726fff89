//! Offline rendering to a WAV file.
//!
//! Drives the same render engine as the live stream, but with a synthetic
//! clock derived from the number of frames rendered, so a bounce of N seconds
//! behaves exactly like N seconds of playback.

use std::path::Path;
use std::time::{Duration, Instant};

use tracing::info;

use super::engine::RenderEngine;
use super::system::StreamFormat;
use crate::error::AssetError;
use crate::session::Phase;

/// Outcome of an offline render
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BounceSummary {
    /// Frames written to the file
    pub frames: usize,

    /// Playback time at which the session became solved, if it did (seconds)
    pub solved_at_secs: Option<f32>,
}

/// Render `duration_secs` of audio into a 32-bit float WAV at `path`
pub fn bounce(
    engine: &mut RenderEngine,
    format: StreamFormat,
    duration_secs: f32,
    path: &Path,
) -> Result<BounceSummary, AssetError> {
    let spec = hound::WavSpec {
        channels: format.channels,
        sample_rate: format.sample_rate,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    let mut writer = hound::WavWriter::create(path, spec)?;

    let total_frames = (duration_secs.max(0.0) * format.sample_rate as f32).ceil() as usize;
    let block_frames = format.block_size_frames.max(1) as usize;
    let mut block = vec![0.0_f32; block_frames * format.channels as usize];

    let origin = Instant::now();
    let mut rendered = 0;
    let mut solved_at_secs = None;

    while rendered < total_frames {
        let frames = block_frames.min(total_frames - rendered);
        let out = &mut block[..frames * format.channels as usize];

        let elapsed = rendered as f64 / format.sample_rate.max(1) as f64;
        let result = engine.render(out, origin + Duration::from_secs_f64(elapsed));

        if solved_at_secs.is_none() && matches!(result.phase, Phase::Solved { .. }) {
            solved_at_secs = Some(elapsed as f32);
        }

        for &sample in out.iter() {
            writer.write_sample(sample)?;
        }
        rendered += frames;
    }

    writer.finalize()?;
    info!(
        "Bounced {:.1}s ({} frames) to {}",
        duration_secs,
        rendered,
        path.display()
    );

    Ok(BounceSummary {
        frames: rendered,
        solved_at_secs,
    })
}
