//! Simulated analyzer backend.
//!
//! Implements [`ControlBus`] on top of the silicon model in
//! `sigscope-chip`, so the full host protocol (staged trigger writes,
//! commit, arm, status polling, auto-incrementing readback) runs
//! without hardware. Sample words come from a caller-supplied generator
//! indexed by the absolute capture-clock tick.
//!
//! Two clocking modes:
//!
//! - **Manual**: the test calls [`SimAnalyzer::step`] to advance the
//!   capture clock deterministically (default).
//! - **Free-running**: every bus transaction first advances the clock a
//!   fixed number of ticks, emulating hardware that keeps capturing
//!   while the host polls over a slow bus.

use std::fmt;

use sigscope_chip::capture::{CaptureEngine, CaptureState, CaptureWindow};
use sigscope_chip::trigger::TriggerCondition;
use sigscope_chip::regs;
use tracing::debug;

use crate::bus::ControlBus;
use crate::error::{Result, ScopeError};

/// Sample word generator: absolute tick index to sample word.
pub type SampleSource = Box<dyn FnMut(u64) -> u64 + Send>;

/// Software model of the analyzer block behind its register interface.
pub struct SimAnalyzer {
    engine: CaptureEngine,
    source: SampleSource,
    /// Absolute capture-clock tick counter.
    clock: u64,
    /// Ticks to advance per bus transaction (0 = manual stepping only).
    ticks_per_access: u64,

    // CSR file state.
    staged_mask: u64,
    staged_value: u64,
    offset: u32,
    length: u32,
    read_ptr: u32,

    transactions: u64,
}

impl fmt::Debug for SimAnalyzer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimAnalyzer")
            .field("state", &self.engine.state())
            .field("clock", &self.clock)
            .field("ticks_per_access", &self.ticks_per_access)
            .field("transactions", &self.transactions)
            .finish_non_exhaustive()
    }
}

impl SimAnalyzer {
    /// Create a simulated analyzer with a `depth`-word buffer, clocked
    /// manually via [`step`](Self::step).
    pub fn new(depth: usize, source: SampleSource) -> Self {
        Self {
            engine: CaptureEngine::new(depth),
            source,
            clock: 0,
            ticks_per_access: 0,
            staged_mask: 0,
            staged_value: 0,
            offset: 0,
            length: 0,
            read_ptr: 0,
            transactions: 0,
        }
    }

    /// Emulate a free-running capture clock: advance `ticks` before
    /// every bus transaction.
    #[must_use]
    pub fn free_running(mut self, ticks: u64) -> Self {
        self.ticks_per_access = ticks;
        self
    }

    /// Advance the capture clock by `ticks` edges.
    pub fn step(&mut self, ticks: u64) {
        for _ in 0..ticks {
            let word = (self.source)(self.clock);
            self.clock += 1;
            self.engine.tick(word);
        }
    }

    /// Current capture state (test observation point).
    pub fn capture_state(&self) -> CaptureState {
        self.engine.state()
    }

    /// Number of bus transactions served so far.
    pub const fn transaction_count(&self) -> u64 {
        self.transactions
    }

    /// Absolute capture-clock tick count.
    pub const fn clock(&self) -> u64 {
        self.clock
    }

    fn window(&self) -> CaptureWindow {
        CaptureWindow {
            offset: self.offset as usize,
            length: self.length as usize,
        }
    }

    fn selected_sample(&self) -> u64 {
        self.engine.read(self.read_ptr as usize).unwrap_or(0)
    }
}

const fn set_lo(wide: u64, lo: u32) -> u64 {
    (wide & 0xFFFF_FFFF_0000_0000) | lo as u64
}

const fn set_hi(wide: u64, hi: u32) -> u64 {
    (wide & 0x0000_0000_FFFF_FFFF) | ((hi as u64) << 32)
}

impl ControlBus for SimAnalyzer {
    fn read(&mut self, addr: usize) -> Result<u32> {
        self.transactions += 1;
        self.step(self.ticks_per_access);

        let value = match addr {
            regs::TRIGGER_MASK_LO => self.staged_mask as u32,
            regs::TRIGGER_MASK_HI => (self.staged_mask >> 32) as u32,
            regs::TRIGGER_VALUE_LO => self.staged_value as u32,
            regs::TRIGGER_VALUE_HI => (self.staged_value >> 32) as u32,
            regs::OFFSET => self.offset,
            regs::LENGTH => self.length,
            regs::CONTROL | regs::TRIGGER_COMMIT => 0,
            regs::STATUS => self.engine.state().to_bits(),
            regs::SAMPLE_COUNT => self.engine.valid_samples() as u32,
            regs::RUN_COUNT => self.engine.run_count(),
            regs::READ_PTR => self.read_ptr,
            regs::READ_DATA_LO => self.selected_sample() as u32,
            regs::READ_DATA_HI => {
                let hi = (self.selected_sample() >> 32) as u32;
                self.read_ptr += 1;
                hi
            }
            _ => {
                return Err(ScopeError::bus(format!(
                    "read from unmapped register {addr:#x}"
                )))
            }
        };
        Ok(value)
    }

    fn write(&mut self, addr: usize, value: u32) -> Result<()> {
        self.transactions += 1;
        self.step(self.ticks_per_access);

        match addr {
            regs::TRIGGER_MASK_LO => self.staged_mask = set_lo(self.staged_mask, value),
            regs::TRIGGER_MASK_HI => self.staged_mask = set_hi(self.staged_mask, value),
            regs::TRIGGER_VALUE_LO => self.staged_value = set_lo(self.staged_value, value),
            regs::TRIGGER_VALUE_HI => self.staged_value = set_hi(self.staged_value, value),
            regs::TRIGGER_COMMIT => {
                if value & 1 != 0 {
                    let cond = TriggerCondition::from_raw(self.staged_mask, self.staged_value);
                    if let Err(err) = self.engine.set_trigger(cond) {
                        // Hardware drops the commit; the host sees no state change.
                        debug!("trigger commit ignored: {err}");
                    }
                }
            }
            regs::OFFSET => self.offset = value,
            regs::LENGTH => self.length = value,
            regs::CONTROL => {
                if value & regs::control::RUN != 0 {
                    match self.engine.arm(self.window()) {
                        Ok(()) => debug!(
                            "armed: offset={} length={}",
                            self.offset, self.length
                        ),
                        Err(err) => debug!("arm ignored: {err}"),
                    }
                }
            }
            regs::READ_PTR => self.read_ptr = value,
            _ => {
                return Err(ScopeError::bus(format!(
                    "write to unmapped register {addr:#x}"
                )))
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counter_source() -> SampleSource {
        Box::new(|t| t)
    }

    #[test]
    fn commit_latches_staged_condition_atomically() {
        let mut sim = SimAnalyzer::new(16, counter_source());
        // Stage across two transactions, latch with a single commit.
        sim.write(regs::TRIGGER_MASK_LO, 0xFF).unwrap();
        sim.write(regs::TRIGGER_VALUE_LO, 0x2A).unwrap();
        sim.write(regs::TRIGGER_COMMIT, 1).unwrap();

        sim.write(regs::LENGTH, 4).unwrap();
        sim.write(regs::CONTROL, regs::control::RUN).unwrap();
        sim.step(50);
        assert_eq!(sim.capture_state(), CaptureState::Done);
        // Committed condition fired on tick 42.
        sim.write(regs::READ_PTR, 0).unwrap();
        assert_eq!(sim.read(regs::READ_DATA_LO).unwrap(), 42);
    }

    #[test]
    fn readback_auto_increments_on_hi_read() {
        let mut sim = SimAnalyzer::new(16, counter_source());
        sim.write(regs::LENGTH, 3).unwrap();
        sim.write(regs::CONTROL, regs::control::RUN).unwrap();
        sim.step(3);
        assert_eq!(sim.capture_state(), CaptureState::Done);
        assert_eq!(sim.read(regs::SAMPLE_COUNT).unwrap(), 3);

        sim.write(regs::READ_PTR, 0).unwrap();
        for expected in 0..3 {
            let lo = sim.read(regs::READ_DATA_LO).unwrap();
            let _hi = sim.read(regs::READ_DATA_HI).unwrap();
            assert_eq!(lo, expected);
        }
        assert_eq!(sim.read(regs::READ_PTR).unwrap(), 3);
    }

    #[test]
    fn lo_read_has_no_side_effect() {
        let mut sim = SimAnalyzer::new(16, counter_source());
        sim.write(regs::LENGTH, 2).unwrap();
        sim.write(regs::CONTROL, regs::control::RUN).unwrap();
        sim.step(2);
        sim.write(regs::READ_PTR, 0).unwrap();
        assert_eq!(sim.read(regs::READ_DATA_LO).unwrap(), 0);
        assert_eq!(sim.read(regs::READ_DATA_LO).unwrap(), 0);
        assert_eq!(sim.read(regs::READ_PTR).unwrap(), 0);
    }

    #[test]
    fn unmapped_register_is_a_bus_error() {
        let mut sim = SimAnalyzer::new(16, counter_source());
        assert!(matches!(
            sim.read(0x1000),
            Err(ScopeError::Bus { .. })
        ));
        assert!(matches!(
            sim.write(0x1000, 0),
            Err(ScopeError::Bus { .. })
        ));
    }

    #[test]
    fn free_running_clock_advances_on_access() {
        let mut sim = SimAnalyzer::new(16, counter_source()).free_running(8);
        assert_eq!(sim.clock(), 0);
        let _ = sim.read(regs::STATUS).unwrap();
        assert_eq!(sim.clock(), 8);
    }

    #[test]
    fn run_while_triggered_is_ignored() {
        // Trigger on word 5, long post window so we stay TRIGGERED.
        let mut sim = SimAnalyzer::new(16, counter_source());
        sim.write(regs::TRIGGER_MASK_LO, 0xFF).unwrap();
        sim.write(regs::TRIGGER_VALUE_LO, 5).unwrap();
        sim.write(regs::TRIGGER_COMMIT, 1).unwrap();
        sim.write(regs::LENGTH, 16).unwrap();
        sim.write(regs::CONTROL, regs::control::RUN).unwrap();
        assert_eq!(sim.read(regs::RUN_COUNT).unwrap(), 1);
        sim.step(7);
        assert_eq!(sim.capture_state(), CaptureState::Triggered);

        // The dropped RUN is visible to the host: the counter holds.
        sim.write(regs::CONTROL, regs::control::RUN).unwrap();
        assert_eq!(sim.capture_state(), CaptureState::Triggered);
        assert_eq!(sim.read(regs::RUN_COUNT).unwrap(), 1);
    }
}
