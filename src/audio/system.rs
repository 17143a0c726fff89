//! Output stream ownership and supervision.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

use super::buffers::SignalBuffers;
use super::engine::RenderEngine;
use crate::error::StreamError;
use crate::params::StreamSettings;
use crate::session::{Phase, SharedState};

/// Stream parameters fixed at setup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamFormat {
    pub channels: u16,
    pub sample_rate: u32,
    pub block_size_frames: u32,
}

impl StreamFormat {
    /// Device format matching the loaded buffers
    pub fn for_buffers(buffers: &SignalBuffers, settings: &StreamSettings) -> Self {
        Self {
            channels: buffers.channels(),
            sample_rate: buffers.sample_rate(),
            block_size_frames: settings.block_size_frames,
        }
    }

    /// Real-time deadline of one block
    pub fn block_period(&self) -> Duration {
        Duration::from_secs_f64(self.block_size_frames as f64 / self.sample_rate.max(1) as f64)
    }
}

/// A running output stream driving the render engine
pub struct AudioSystem {
    /// Audio output stream (kept alive)
    _stream: cpal::Stream,

    /// Set by the stream error callback
    failed: Arc<AtomicBool>,
}

impl AudioSystem {
    /// Open the default output device and start rendering
    pub fn start(
        engine: Arc<Mutex<RenderEngine>>,
        format: StreamFormat,
    ) -> Result<Self, StreamError> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or(StreamError::NoDevice)?;

        info!(
            "Audio: {} @ {}Hz, {} ch, {} frame blocks ({:.1}ms)",
            device.name().unwrap_or_else(|_| "Unknown".to_string()),
            format.sample_rate,
            format.channels,
            format.block_size_frames,
            format.block_period().as_secs_f64() * 1000.0
        );

        let config = cpal::StreamConfig {
            channels: format.channels,
            sample_rate: cpal::SampleRate(format.sample_rate),
            buffer_size: cpal::BufferSize::Fixed(format.block_size_frames),
        };

        let failed = Arc::new(AtomicBool::new(false));
        let failed_cb = Arc::clone(&failed);

        let stream = device.build_output_stream(
            &config,
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                // Only this callback locks the engine, so this never contends
                // while a single stream is open
                match engine.try_lock() {
                    Some(mut engine) => {
                        engine.render(data, Instant::now());
                    }
                    None => data.fill(0.0),
                }
            },
            move |err| {
                error!("Audio stream error: {}", err);
                failed_cb.store(true, Ordering::Release);
            },
            None,
        )?;

        stream.play()?;

        Ok(Self {
            _stream: stream,
            failed,
        })
    }

    /// Whether the backend reported an error
    pub fn has_failed(&self) -> bool {
        self.failed.load(Ordering::Acquire)
    }
}

/// Keep an output stream open exactly while the session is active.
///
/// Runs on the control side. Opens a stream when the session is armed, drops it
/// once the session goes idle, and marks the session faulted if the device
/// fails. A faulted session stays silent until the next `start`.
pub fn supervise(
    shared: &SharedState,
    engine: Arc<Mutex<RenderEngine>>,
    format: StreamFormat,
    poll: Duration,
) {
    loop {
        let opened_for = shared.session();
        if !opened_for.phase.is_active() {
            thread::sleep(poll);
            continue;
        }

        let system = match AudioSystem::start(Arc::clone(&engine), format) {
            Ok(system) => system,
            Err(e) => {
                error!("Could not open output stream: {}", e);
                fault_session(shared, opened_for.epoch);
                continue;
            }
        };

        loop {
            thread::sleep(poll);

            if system.has_failed() {
                fault_session(shared, opened_for.epoch);
                break;
            }

            let session = shared.session();
            if !session.phase.is_active() {
                if session.phase == Phase::Idle {
                    info!("Session idle, closing output stream");
                }
                break;
            }
        }

        drop(system);
    }
}

/// Fault only the session the stream was opened for
fn fault_session(shared: &SharedState, epoch: u32) {
    if shared.fault(epoch) {
        warn!("Session {} faulted; send start to retry", epoch);
    } else {
        info!("Stream failure for session {} ignored; session moved on", epoch);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::NoiseConfig;

    #[test]
    fn test_format_follows_buffers() {
        let buffers =
            SignalBuffers::from_interleaved(vec![0.0; 8], 2, 48000, &NoiseConfig::default())
                .unwrap();
        let settings = StreamSettings::default();
        let format = StreamFormat::for_buffers(&buffers, &settings);

        assert_eq!(format.channels, 2);
        assert_eq!(format.sample_rate, 48000);
        assert_eq!(format.block_size_frames, 1024);
    }

    #[test]
    fn test_block_period() {
        let format = StreamFormat {
            channels: 2,
            sample_rate: 48000,
            block_size_frames: 480,
        };
        assert_eq!(format.block_period(), Duration::from_millis(10));
    }
}
