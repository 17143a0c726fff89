//! Proximity measurement and debounce.
//!
//! The tracker turns a reading into a tolerance verdict plus a normalized
//! distance, and times how long the verdict has held. Timestamps come from the
//! caller so the solved decision does not depend on block cadence.

use std::time::{Duration, Instant};

use super::SensorReading;
use crate::error::ConfigError;
use crate::params::PuzzleConfig;

/// How close a reading is to the target
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Proximity {
    /// Both channels within tolerance
    pub in_tolerance: bool,

    /// Mean normalized per-channel deviation, in [0, 1]
    pub distance: f32,
}

impl Proximity {
    /// Clean-signal mix weight for an unsolved session
    pub fn signal_strength(&self) -> f32 {
        (1.0 - self.distance).clamp(0.0, 1.0)
    }
}

/// Tolerance check plus continuous-hold timer
#[derive(Debug, Clone)]
pub struct ProximityTracker {
    target: SensorReading,
    tolerance: u32,
    full_scale: f32,
    hold: Duration,

    /// When the current run of in-tolerance readings began
    window_start: Option<Instant>,
}

impl ProximityTracker {
    pub fn new(config: &PuzzleConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            target: config.target,
            tolerance: config.tolerance,
            full_scale: config.full_scale.max(1) as f32,
            hold: config.hold_duration()?,
            window_start: None,
        })
    }

    /// Measure a reading against the target
    pub fn update(&self, reading: SensorReading) -> Proximity {
        let dev1 = reading.ch1.abs_diff(self.target.ch1);
        let dev2 = reading.ch2.abs_diff(self.target.ch2);

        let distance = (dev1 as f32 / self.full_scale + dev2 as f32 / self.full_scale) / 2.0;

        Proximity {
            in_tolerance: dev1 <= self.tolerance && dev2 <= self.tolerance,
            distance: distance.clamp(0.0, 1.0),
        }
    }

    /// Advance the hold timer; true once tolerance has held for the full duration.
    ///
    /// Level-triggered: keeps returning true on every in-tolerance call until
    /// the window is broken or [`reset`](Self::reset).
    pub fn observe(&mut self, now: Instant, in_tolerance: bool) -> bool {
        if !in_tolerance {
            self.window_start = None;
            return false;
        }
        match self.window_start {
            None => {
                self.window_start = Some(now);
                false
            }
            Some(start) => now.saturating_duration_since(start) >= self.hold,
        }
    }

    /// Forget any running window
    pub fn reset(&mut self) {
        self.window_start = None;
    }

    pub fn window_start(&self) -> Option<Instant> {
        self.window_start
    }
}
