//! Session lifecycle and the state shared between control and render threads.
//!
//! The session is one packed `AtomicU64`: the upper bits hold an epoch that
//! every `start`/`reset` bumps, the low byte holds the phase. Every transition
//! is a single compare-and-swap, so the render thread can only promote the
//! exact session it observed and a stale solve can never leak into a freshly
//! armed one.

use std::sync::atomic::{AtomicU64, Ordering};

use crossbeam::atomic::AtomicCell;

use super::SensorReading;

/// Session lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Waiting for `start`; render emits silence
    Idle,

    /// Rendering, blend follows proximity
    Armed,

    /// Clean audio unlocked; `status_sent` is set once the completed status
    /// has been claimed for publication
    Solved { status_sent: bool },

    /// The output stream failed; waiting for `start` to retry
    Faulted,
}

impl Phase {
    /// Whether the render engine produces audio in this phase
    pub fn is_active(self) -> bool {
        matches!(self, Phase::Armed | Phase::Solved { .. })
    }

    fn to_bits(self) -> u64 {
        match self {
            Phase::Idle => 0,
            Phase::Armed => 1,
            Phase::Solved { status_sent: false } => 2,
            Phase::Solved { status_sent: true } => 3,
            Phase::Faulted => 4,
        }
    }

    fn from_bits(bits: u64) -> Self {
        match bits {
            1 => Phase::Armed,
            2 => Phase::Solved { status_sent: false },
            3 => Phase::Solved { status_sent: true },
            4 => Phase::Faulted,
            _ => Phase::Idle,
        }
    }
}

/// A consistent view of the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSnapshot {
    /// Incremented by every `start` and `reset`
    pub epoch: u32,
    pub phase: Phase,
}

impl SessionSnapshot {
    fn pack(self) -> u64 {
        (u64::from(self.epoch) << 8) | self.phase.to_bits()
    }

    fn unpack(word: u64) -> Self {
        Self {
            epoch: (word >> 8) as u32,
            phase: Phase::from_bits(word & 0xff),
        }
    }
}

/// Sensor and session state crossing the control/render boundary
#[derive(Debug)]
pub struct SharedState {
    reading: AtomicCell<SensorReading>,
    session: AtomicU64,
}

impl Default for SharedState {
    fn default() -> Self {
        Self::new()
    }
}

impl SharedState {
    pub fn new() -> Self {
        Self {
            reading: AtomicCell::new(SensorReading::default()),
            session: AtomicU64::new(
                SessionSnapshot {
                    epoch: 0,
                    phase: Phase::Idle,
                }
                .pack(),
            ),
        }
    }

    /// Replace both channels at once
    pub fn store_reading(&self, reading: SensorReading) {
        self.reading.store(reading);
    }

    pub fn reading(&self) -> SensorReading {
        self.reading.load()
    }

    pub fn session(&self) -> SessionSnapshot {
        SessionSnapshot::unpack(self.session.load(Ordering::Acquire))
    }

    /// Arm a fresh session from any phase
    pub fn start(&self) -> SessionSnapshot {
        self.begin_epoch(Phase::Armed)
    }

    /// Return to idle from any phase
    pub fn reset(&self) -> SessionSnapshot {
        self.begin_epoch(Phase::Idle)
    }

    /// Armed → Solved for `epoch`. Returns false if the session moved on.
    pub fn mark_solved(&self, epoch: u32) -> bool {
        self.transition(
            epoch,
            Phase::Armed,
            Phase::Solved { status_sent: false },
        )
    }

    /// Claim the one completed-status publication for `epoch`.
    ///
    /// Exactly one caller per solved session gets `true`.
    pub fn claim_status(&self, epoch: u32) -> bool {
        self.transition(
            epoch,
            Phase::Solved { status_sent: false },
            Phase::Solved { status_sent: true },
        )
    }

    /// Mark session `epoch` faulted if it is still rendering.
    ///
    /// Returns false if the session already moved on.
    pub fn fault(&self, epoch: u32) -> bool {
        self.session
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |word| {
                let current = SessionSnapshot::unpack(word);
                (current.epoch == epoch && current.phase.is_active()).then(|| {
                    SessionSnapshot {
                        epoch,
                        phase: Phase::Faulted,
                    }
                    .pack()
                })
            })
            .is_ok()
    }

    fn begin_epoch(&self, phase: Phase) -> SessionSnapshot {
        let mut next = SessionSnapshot { epoch: 0, phase };
        // Infallible: the closure always returns Some
        let _ = self
            .session
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |word| {
                next.epoch = SessionSnapshot::unpack(word).epoch.wrapping_add(1);
                Some(next.pack())
            });
        next
    }

    fn transition(&self, epoch: u32, from: Phase, to: Phase) -> bool {
        let expected = SessionSnapshot { epoch, phase: from }.pack();
        let desired = SessionSnapshot { epoch, phase: to }.pack();
        self.session
            .compare_exchange(expected, desired, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state() {
        let shared = SharedState::new();
        assert_eq!(shared.session().phase, Phase::Idle);
        assert_eq!(shared.reading(), SensorReading::new(0, 0));
    }

    #[test]
    fn test_reading_cell_is_lock_free() {
        assert!(AtomicCell::<SensorReading>::is_lock_free());
    }

    #[test]
    fn test_start_and_reset_bump_epoch() {
        let shared = SharedState::new();
        let armed = shared.start();
        assert_eq!(armed.phase, Phase::Armed);
        assert_eq!(armed.epoch, 1);

        let idle = shared.reset();
        assert_eq!(idle.phase, Phase::Idle);
        assert_eq!(idle.epoch, 2);
        assert_eq!(shared.session(), idle);
    }

    #[test]
    fn test_no_solve_from_idle() {
        let shared = SharedState::new();
        let epoch = shared.session().epoch;
        assert!(!shared.mark_solved(epoch));
        assert_eq!(shared.session().phase, Phase::Idle);
    }

    #[test]
    fn test_solve_and_claim_once() {
        let shared = SharedState::new();
        let epoch = shared.start().epoch;

        assert!(shared.mark_solved(epoch));
        assert!(!shared.mark_solved(epoch));
        assert_eq!(
            shared.session().phase,
            Phase::Solved { status_sent: false }
        );

        assert!(shared.claim_status(epoch));
        assert!(!shared.claim_status(epoch));
        assert_eq!(shared.session().phase, Phase::Solved { status_sent: true });
    }

    #[test]
    fn test_stale_epoch_cannot_solve() {
        let shared = SharedState::new();
        let old = shared.start().epoch;
        shared.reset();
        let fresh = shared.start().epoch;

        assert!(!shared.mark_solved(old));
        assert_eq!(shared.session().phase, Phase::Armed);
        assert!(shared.mark_solved(fresh));
    }

    #[test]
    fn test_reset_clears_status_flag() {
        let shared = SharedState::new();
        let first = shared.start().epoch;
        assert!(shared.mark_solved(first));
        assert!(shared.claim_status(first));

        shared.reset();
        let second = shared.start().epoch;
        assert!(shared.mark_solved(second));
        assert!(shared.claim_status(second));
    }

    #[test]
    fn test_fault_only_when_active() {
        let shared = SharedState::new();
        assert!(!shared.fault(shared.session().epoch));

        let armed = shared.start();
        assert!(shared.fault(armed.epoch));
        assert_eq!(
            shared.session(),
            SessionSnapshot {
                epoch: armed.epoch,
                phase: Phase::Faulted
            }
        );
        assert!(!shared.session().phase.is_active());

        assert_eq!(shared.start().phase, Phase::Armed);
    }

    #[test]
    fn test_fault_ignores_later_session() {
        let shared = SharedState::new();
        let streamed = shared.start().epoch;

        // reset + start land before the device error is acted on
        shared.reset();
        let fresh = shared.start();

        assert!(!shared.fault(streamed));
        assert_eq!(shared.session(), fresh);
    }

    #[test]
    fn test_pack_round_trip_at_epoch_limit() {
        let snapshot = SessionSnapshot {
            epoch: u32::MAX,
            phase: Phase::Solved { status_sent: true },
        };
        assert_eq!(SessionSnapshot::unpack(snapshot.pack()), snapshot);
    }
}
