//! Per-block render engine.
//!
//! Runs inside the audio callback: no locks, no allocation, no I/O. Reads the
//! session and sensor state once per block, decides the blend, and copies
//! looped clean/noise audio into the output.

use std::sync::Arc;
use std::time::Instant;

use crossbeam::channel::Sender;

use super::buffers::SignalBuffers;
use crate::error::ConfigError;
use crate::params::{audio_constants::SAMPLE_CEILING, PuzzleConfig};
use crate::session::{Phase, ProximityTracker, SharedState};

/// Sent from the render thread when a session becomes solved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SolvedNotice {
    pub epoch: u32,
}

/// What one render invocation did
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderedBlock {
    /// Phase the block was rendered under (after any solve in this block)
    pub phase: Phase,

    /// Clean mix weight used for the block; unchanged when silent
    pub strength: f32,

    /// Frames of audio written; 0 for a silent block
    pub frames: usize,
}

/// Blends looped clean audio with noise according to proximity
pub struct RenderEngine {
    buffers: Arc<SignalBuffers>,
    shared: Arc<SharedState>,
    tracker: ProximityTracker,
    volume_scale: f32,
    solved_tx: Sender<SolvedNotice>,

    /// Frame offset into the buffers
    cursor: usize,

    /// Epoch the tracker window belongs to
    epoch: Option<u32>,

    strength: f32,
}

impl RenderEngine {
    pub fn new(
        buffers: Arc<SignalBuffers>,
        shared: Arc<SharedState>,
        puzzle: &PuzzleConfig,
        solved_tx: Sender<SolvedNotice>,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            buffers,
            shared,
            tracker: ProximityTracker::new(puzzle)?,
            volume_scale: puzzle.volume_scale,
            solved_tx,
            cursor: 0,
            epoch: None,
            strength: 0.0,
        })
    }

    /// Render one interleaved output block
    ///
    /// `now` is a monotonic timestamp for the start of the block.
    pub fn render(&mut self, out: &mut [f32], now: Instant) -> RenderedBlock {
        let session = self.shared.session();

        // A new epoch means start/reset happened: the old window is void
        if self.epoch != Some(session.epoch) {
            self.tracker.reset();
            self.epoch = Some(session.epoch);
        }

        if !session.phase.is_active() {
            out.fill(0.0);
            return RenderedBlock {
                phase: session.phase,
                strength: self.strength,
                frames: 0,
            };
        }

        let proximity = self.tracker.update(self.shared.reading());
        let mut phase = session.phase;

        if phase == Phase::Armed
            && self.tracker.observe(now, proximity.in_tolerance)
            && self.shared.mark_solved(session.epoch)
        {
            phase = Phase::Solved { status_sent: false };
            // The notice only wakes the status thread, which reads the live
            // session; a full channel already holds a pending wake-up
            let _ = self.solved_tx.try_send(SolvedNotice {
                epoch: session.epoch,
            });
        }

        self.strength = match phase {
            Phase::Solved { .. } => 1.0,
            _ => proximity.signal_strength(),
        };

        let channels = self.buffers.channels() as usize;
        let frames = out.len() / channels;
        let (audio, remainder) = out.split_at_mut(frames * channels);
        self.mix_into(audio);
        remainder.fill(0.0);

        self.cursor = (self.cursor + frames) % self.buffers.frames();

        RenderedBlock {
            phase,
            strength: self.strength,
            frames,
        }
    }

    /// Copy `[cursor, cursor + len)` of the looped buffers into `out`,
    /// wrapping to the head as many times as needed
    fn mix_into(&self, out: &mut [f32]) {
        let clean = self.buffers.clean();
        let noise = self.buffers.noise();
        let strength = self.strength;
        let volume = self.volume_scale;

        let mut pos = self.cursor * self.buffers.channels() as usize;
        let mut written = 0;

        while written < out.len() {
            let run = (out.len() - written).min(clean.len() - pos);
            let segment = &mut out[written..written + run];

            for ((sample, c), n) in segment
                .iter_mut()
                .zip(&clean[pos..pos + run])
                .zip(&noise[pos..pos + run])
            {
                *sample = (volume * (strength * c + (1.0 - strength) * n))
                    .clamp(-SAMPLE_CEILING, SAMPLE_CEILING);
            }

            written += run;
            pos = 0;
        }
    }

    /// Current play position (frames)
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Mix weight of the most recent audible block
    pub fn strength(&self) -> f32 {
        self.strength
    }
}
