//! Capture engine: circular sample buffer + trigger-controlled state machine.
//!
//! The engine owns the capture buffer exclusively while a run is in
//! flight; once DONE the buffer is frozen and read-only until the next
//! arm. One `tick` models one capture-clock edge.
//!
//! ## Window math
//!
//! A window is `offset` pre-trigger samples followed by the triggering
//! sample and its successors, `length` samples in total. The engine
//! writes every tick while not idle, so the circular buffer naturally
//! retains the most recent pre-trigger samples. The triggering sample
//! counts as the first post-trigger write; once `length - offset`
//! post-trigger samples are written the engine freezes, which places
//! the triggering sample at window index `offset`. When
//! `offset == length` the post-trigger target is zero: the window is
//! purely pre-trigger and the triggering sample is not recorded.

use crate::error::{ChipError, Result};
use crate::regs::status;
use crate::trigger::TriggerCondition;

/// Capture state machine, encoded in the status register low bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureState {
    /// Never armed since reset.
    Idle,
    /// Recording, waiting for the trigger.
    Armed,
    /// Trigger fired, filling the post-trigger window.
    Triggered,
    /// Window captured; buffer frozen and readable.
    Done,
}

impl CaptureState {
    /// Status register encoding of this state.
    pub const fn to_bits(self) -> u32 {
        match self {
            Self::Idle => status::STATE_IDLE,
            Self::Armed => status::STATE_ARMED,
            Self::Triggered => status::STATE_TRIGGERED,
            Self::Done => status::STATE_DONE,
        }
    }

    /// Decode the status register low bits.
    pub const fn from_bits(bits: u32) -> Option<Self> {
        match bits & status::STATE_MASK {
            status::STATE_IDLE => Some(Self::Idle),
            status::STATE_ARMED => Some(Self::Armed),
            status::STATE_TRIGGERED => Some(Self::Triggered),
            status::STATE_DONE => Some(Self::Done),
            _ => None,
        }
    }
}

/// Pre-trigger offset and total length of one capture run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CaptureWindow {
    /// Pre-trigger samples to retain before the trigger point.
    pub offset: usize,
    /// Total samples the host will retrieve after the run.
    pub length: usize,
}

impl CaptureWindow {
    /// Validate the window against a buffer depth.
    ///
    /// # Errors
    ///
    /// Returns an error unless `offset <= length <= depth`.
    pub fn validate(&self, depth: usize) -> Result<()> {
        if self.length > depth || self.offset > self.length {
            return Err(ChipError::InvalidWindow {
                offset: self.offset,
                length: self.length,
                depth,
            });
        }
        Ok(())
    }
}

/// The analyzer's sample buffer and capture state machine.
#[derive(Debug)]
pub struct CaptureEngine {
    depth: usize,
    buffer: Vec<u64>,
    /// Next write position (circular).
    wr: usize,
    condition: TriggerCondition,
    state: CaptureState,
    window: CaptureWindow,
    /// Samples written since (and including) the triggering one.
    post_count: usize,
    /// Accepted arm commands, wrapping. Exposed through `RUN_COUNT` so
    /// a host can tell an accepted RUN from a dropped one.
    runs: u32,
}

impl CaptureEngine {
    /// Create an idle engine with a zeroed buffer of `depth` words.
    ///
    /// # Panics
    ///
    /// Panics if `depth` is zero; the depth is a compile-time constant
    /// of the hardware build, never user input.
    pub fn new(depth: usize) -> Self {
        assert!(depth > 0, "capture buffer depth must be non-zero");
        Self {
            depth,
            buffer: vec![0; depth],
            wr: 0,
            condition: TriggerCondition::ALWAYS,
            state: CaptureState::Idle,
            window: CaptureWindow::default(),
            post_count: 0,
            runs: 0,
        }
    }

    /// Buffer depth in sample words.
    pub const fn depth(&self) -> usize {
        self.depth
    }

    /// Current capture state.
    pub const fn state(&self) -> CaptureState {
        self.state
    }

    /// Currently committed trigger condition.
    pub const fn condition(&self) -> TriggerCondition {
        self.condition
    }

    /// Window of the current (or last) run.
    pub const fn window(&self) -> CaptureWindow {
        self.window
    }

    /// Count of accepted arm commands since reset, wrapping.
    pub const fn run_count(&self) -> u32 {
        self.runs
    }

    /// Commit a new trigger condition.
    ///
    /// # Errors
    ///
    /// Rejected (no-op) unless the engine is idle or done: an in-flight
    /// capture must never see a condition change.
    pub fn set_trigger(&mut self, condition: TriggerCondition) -> Result<()> {
        match self.state {
            CaptureState::Idle | CaptureState::Done => {
                self.condition = condition;
                Ok(())
            }
            state => Err(ChipError::Rejected { state }),
        }
    }

    /// Arm the engine for a new run: reset the write position, clear the
    /// trigger bookkeeping, move to ARMED.
    ///
    /// Accepted while idle or done, and also while still ARMED, since nothing
    /// has triggered yet, so restarting loses no committed capture. A
    /// re-arm while TRIGGERED is rejected.
    ///
    /// # Errors
    ///
    /// [`ChipError::InvalidWindow`] if the window does not fit the buffer;
    /// [`ChipError::Rejected`] while TRIGGERED. Either way the engine is
    /// left exactly as it was.
    pub fn arm(&mut self, window: CaptureWindow) -> Result<()> {
        if self.state == CaptureState::Triggered {
            return Err(ChipError::Rejected { state: self.state });
        }
        window.validate(self.depth)?;
        self.window = window;
        self.wr = 0;
        self.post_count = 0;
        self.runs = self.runs.wrapping_add(1);
        self.state = CaptureState::Armed;
        Ok(())
    }

    /// Advance one capture-clock edge with the current sample word.
    ///
    /// No-op while idle or done (the write position stays frozen).
    pub fn tick(&mut self, word: u64) {
        match self.state {
            CaptureState::Idle | CaptureState::Done => {}
            CaptureState::Armed => {
                if self.condition.matches(word) {
                    self.state = CaptureState::Triggered;
                    if self.post_target() > 0 {
                        self.push(word);
                        self.post_count = 1;
                    }
                    self.finish_if_filled();
                } else {
                    self.push(word);
                }
            }
            CaptureState::Triggered => {
                self.push(word);
                self.post_count += 1;
                self.finish_if_filled();
            }
        }
    }

    /// Number of valid samples readable from the frozen buffer.
    pub const fn valid_samples(&self) -> usize {
        match self.state {
            CaptureState::Done => self.window.length,
            _ => 0,
        }
    }

    /// Read the sample at `index` within the frozen window.
    ///
    /// Window index 0 is the oldest retained sample; the triggering
    /// sample sits at index `offset`. Returns `None` unless the engine
    /// is done and `index < length`.
    pub fn read(&self, index: usize) -> Option<u64> {
        if self.state != CaptureState::Done || index >= self.window.length {
            return None;
        }
        // The window is the last `length` writes before the freeze.
        let behind = self.window.length - index;
        let pos = (self.wr + self.depth - behind) % self.depth;
        Some(self.buffer[pos])
    }

    fn push(&mut self, word: u64) {
        self.buffer[self.wr] = word;
        self.wr = (self.wr + 1) % self.depth;
    }

    const fn post_target(&self) -> usize {
        self.window.length - self.window.offset
    }

    fn finish_if_filled(&mut self) {
        if self.post_count >= self.post_target() {
            self.state = CaptureState::Done;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_counter(engine: &mut CaptureEngine, start: u64, ticks: u64) {
        for t in start..start + ticks {
            engine.tick(t);
        }
    }

    #[test]
    fn idle_until_armed() {
        let mut e = CaptureEngine::new(16);
        e.tick(42);
        assert_eq!(e.state(), CaptureState::Idle);
        assert_eq!(e.valid_samples(), 0);
        assert_eq!(e.read(0), None);
    }

    #[test]
    fn empty_condition_triggers_on_first_tick() {
        let mut e = CaptureEngine::new(16);
        e.arm(CaptureWindow {
            offset: 0,
            length: 4,
        })
        .unwrap();
        assert_eq!(e.state(), CaptureState::Armed);
        e.tick(7);
        assert_eq!(e.state(), CaptureState::Triggered);
        run_counter(&mut e, 8, 3);
        assert_eq!(e.state(), CaptureState::Done);
        assert_eq!(e.valid_samples(), 4);
        assert_eq!(e.read(0), Some(7));
    }

    #[test]
    fn trigger_lands_at_window_offset() {
        let mut e = CaptureEngine::new(128);
        e.set_trigger(TriggerCondition::from_raw(1, 1)).unwrap();
        e.arm(CaptureWindow {
            offset: 32,
            length: 128,
        })
        .unwrap();

        // Even words never match bit 0; tick 51 is the first odd word
        // after 51 even ones.
        for _ in 0..51 {
            e.tick(0x100); // bit 0 clear
        }
        assert_eq!(e.state(), CaptureState::Armed);
        e.tick(0x101); // trigger
        assert_eq!(e.state(), CaptureState::Triggered);
        for _ in 0..95 {
            e.tick(0x100);
        }
        assert_eq!(e.state(), CaptureState::Done);

        assert_eq!(e.read(32), Some(0x101));
        for i in 0..32 {
            assert_eq!(e.read(i), Some(0x100), "pre-trigger sample {i}");
        }
        assert_eq!(e.read(127), Some(0x100));
        assert_eq!(e.read(128), None);
    }

    #[test]
    fn buffer_wraps_while_waiting_for_trigger() {
        let mut e = CaptureEngine::new(8);
        e.set_trigger(TriggerCondition::from_raw(0xFF, 99)).unwrap();
        e.arm(CaptureWindow {
            offset: 4,
            length: 8,
        })
        .unwrap();

        // 50 non-matching ticks wrap the buffer several times.
        run_counter(&mut e, 100, 50); // values 100..150, none == 99 in low byte
        assert_eq!(e.state(), CaptureState::Armed);
        e.tick(99);
        run_counter(&mut e, 200, 3);
        assert_eq!(e.state(), CaptureState::Done);

        // offset=4 pre-trigger samples are the most recent before 99.
        assert_eq!(e.read(4), Some(99));
        assert_eq!(e.read(3), Some(149));
        assert_eq!(e.read(0), Some(146));
        assert_eq!(e.read(7), Some(202));
    }

    #[test]
    fn done_freezes_writes() {
        let mut e = CaptureEngine::new(8);
        e.arm(CaptureWindow {
            offset: 0,
            length: 2,
        })
        .unwrap();
        e.tick(1);
        e.tick(2);
        assert_eq!(e.state(), CaptureState::Done);
        e.tick(0xDEAD);
        assert_eq!(e.read(0), Some(1));
        assert_eq!(e.read(1), Some(2));
    }

    #[test]
    fn invalid_window_rejected_without_state_change() {
        let mut e = CaptureEngine::new(8);
        let err = e
            .arm(CaptureWindow {
                offset: 0,
                length: 9,
            })
            .unwrap_err();
        assert!(matches!(err, ChipError::InvalidWindow { .. }));
        assert_eq!(e.state(), CaptureState::Idle);

        let err = e
            .arm(CaptureWindow {
                offset: 5,
                length: 4,
            })
            .unwrap_err();
        assert!(matches!(err, ChipError::InvalidWindow { .. }));
        assert_eq!(e.state(), CaptureState::Idle);
    }

    #[test]
    fn rearm_while_armed_restarts() {
        let mut e = CaptureEngine::new(8);
        e.set_trigger(TriggerCondition::from_raw(0xFF, 0xFF)).unwrap();
        e.arm(CaptureWindow {
            offset: 0,
            length: 4,
        })
        .unwrap();
        run_counter(&mut e, 0, 5); // no trigger
        assert_eq!(e.state(), CaptureState::Armed);

        e.arm(CaptureWindow {
            offset: 1,
            length: 3,
        })
        .unwrap();
        assert_eq!(e.state(), CaptureState::Armed);
        assert_eq!(e.window().length, 3);
        assert_eq!(e.run_count(), 2);
    }

    #[test]
    fn commands_rejected_while_triggered() {
        let mut e = CaptureEngine::new(8);
        e.arm(CaptureWindow {
            offset: 0,
            length: 8,
        })
        .unwrap();
        e.tick(0); // empty condition triggers immediately
        assert_eq!(e.state(), CaptureState::Triggered);

        assert!(matches!(
            e.set_trigger(TriggerCondition::ALWAYS),
            Err(ChipError::Rejected { .. })
        ));
        assert!(matches!(
            e.arm(CaptureWindow {
                offset: 0,
                length: 2
            }),
            Err(ChipError::Rejected { .. })
        ));
        assert_eq!(e.state(), CaptureState::Triggered);
        assert_eq!(e.run_count(), 1);
    }

    #[test]
    fn state_bits_roundtrip() {
        for s in [
            CaptureState::Idle,
            CaptureState::Armed,
            CaptureState::Triggered,
            CaptureState::Done,
        ] {
            assert_eq!(CaptureState::from_bits(s.to_bits()), Some(s));
        }
    }

    #[test]
    fn full_pre_trigger_window_excludes_trigger_sample() {
        // offset == length: the post-trigger target is zero, so the
        // window holds only the samples ahead of the trigger.
        let mut e = CaptureEngine::new(16);
        e.set_trigger(TriggerCondition::from_raw(0xFF, 9)).unwrap();
        e.arm(CaptureWindow {
            offset: 4,
            length: 4,
        })
        .unwrap();

        run_counter(&mut e, 5, 4); // 5, 6, 7, 8
        assert_eq!(e.state(), CaptureState::Armed);
        e.tick(9); // trigger
        assert_eq!(e.state(), CaptureState::Done);
        assert_eq!(e.valid_samples(), 4);

        assert_eq!(e.read(0), Some(5));
        assert_eq!(e.read(3), Some(8));
        assert_eq!(e.read(4), None); // trigger sample 9 is not recorded
    }

    #[test]
    fn zero_length_window_completes_immediately() {
        let mut e = CaptureEngine::new(8);
        e.arm(CaptureWindow {
            offset: 0,
            length: 0,
        })
        .unwrap();
        e.tick(5);
        assert_eq!(e.state(), CaptureState::Done);
        assert_eq!(e.valid_samples(), 0);
        assert_eq!(e.read(0), None);
    }
}
