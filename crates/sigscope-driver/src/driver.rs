//! Host driver: configure, arm, poll, upload, save.
//!
//! The driver owns one end of the control bus and never shares memory
//! with the capture hardware; every interaction is a discrete register
//! transaction. [`ScopeDriver::wait_done`] is the only blocking point:
//! a status poll loop with exponential backoff and a caller-supplied
//! timeout. Ordering is enforced by consulting the live status register
//! before every mutating command, so a stale host-side picture can never
//! corrupt an in-flight capture. A RUN can still lose a race against a
//! firing trigger, so its acceptance is confirmed through the hardware
//! run counter rather than assumed.

use std::thread;
use std::time::{Duration, Instant};

use sigscope_chip::capture::{CaptureState, CaptureWindow};
use sigscope_chip::layout::SignalLayout;
use sigscope_chip::regs;
use sigscope_chip::trigger::TriggerCondition;
use tracing::{debug, info};

use crate::bus::ControlBus;
use crate::error::{Result, ScopeError};
use crate::trace::Trace;

/// Initial status poll interval; doubles up to [`POLL_INTERVAL_MAX`].
const POLL_INTERVAL_MIN: Duration = Duration::from_micros(100);
/// Poll backoff ceiling.
const POLL_INTERVAL_MAX: Duration = Duration::from_millis(10);

/// Host-side driver for one analyzer block.
///
/// Typical session, mirroring the capture lifecycle:
///
/// ```text
/// configure_trigger  ->  run  ->  wait_done  ->  upload  ->  save
/// ```
#[derive(Debug)]
pub struct ScopeDriver<B: ControlBus> {
    bus: B,
    layout: SignalLayout,
    depth: usize,
    sample_period_ns: u64,
    /// Window of the last accepted run; gates upload.
    window: Option<CaptureWindow>,
    /// Last uploaded capture; gates save.
    trace: Option<Trace>,
}

impl<B: ControlBus> ScopeDriver<B> {
    /// Create a driver for an analyzer with the given signal layout and
    /// buffer depth (both fixed by the hardware build).
    pub fn new(bus: B, layout: SignalLayout, depth: usize) -> Self {
        Self {
            bus,
            layout,
            depth,
            sample_period_ns: 1,
            window: None,
            trace: None,
        }
    }

    /// Set the nominal capture-clock period used for waveform timestamps.
    #[must_use]
    pub fn with_sample_period_ns(mut self, period_ns: u64) -> Self {
        self.sample_period_ns = period_ns.max(1);
        self
    }

    /// Signal layout of the monitored sample word.
    pub fn layout(&self) -> &SignalLayout {
        &self.layout
    }

    /// Capture buffer depth in sample words.
    pub const fn depth(&self) -> usize {
        self.depth
    }

    /// The last uploaded trace, if any.
    pub fn trace(&self) -> Option<&Trace> {
        self.trace.as_ref()
    }

    /// Borrow the underlying control bus (for advanced use).
    pub const fn bus(&self) -> &B {
        &self.bus
    }

    /// Configure the trigger condition: a conjunction of per-signal
    /// equality constraints; signals not named are don't-care. An empty
    /// condition triggers on the first armed tick.
    ///
    /// The condition is validated against the layout before any bus
    /// traffic, staged across the mask/value registers, then latched
    /// with a single commit write.
    ///
    /// # Errors
    ///
    /// `Configuration` for an unknown signal or overwide value (no bus
    /// writes are performed); `NotReady` while a capture is in flight;
    /// `Bus` if a register transaction fails.
    pub fn configure_trigger<'a>(
        &mut self,
        condition: impl IntoIterator<Item = (&'a str, u64)>,
    ) -> Result<()> {
        let condition = TriggerCondition::for_signals(&self.layout, condition)?;

        match self.read_state()? {
            CaptureState::Armed | CaptureState::Triggered => {
                return Err(ScopeError::not_ready(
                    "trigger reconfiguration while a capture is in flight",
                ));
            }
            CaptureState::Idle | CaptureState::Done => {}
        }

        let (mask, value) = (condition.mask(), condition.value());
        self.bus.write(regs::TRIGGER_MASK_LO, mask as u32)?;
        self.bus.write(regs::TRIGGER_MASK_HI, (mask >> 32) as u32)?;
        self.bus.write(regs::TRIGGER_VALUE_LO, value as u32)?;
        self.bus.write(regs::TRIGGER_VALUE_HI, (value >> 32) as u32)?;
        self.bus.write(regs::TRIGGER_COMMIT, 1)?;

        debug!("trigger committed: mask={mask:#x} value={value:#x}");
        Ok(())
    }

    /// Arm a capture of `length` samples with `offset` of them ahead of
    /// the trigger point.
    ///
    /// Accepted while idle, done, or still armed from a run whose
    /// trigger never fired (the stale run is restarted; this is how a
    /// capture abandoned by a `wait_done` timeout is recovered).
    ///
    /// # Errors
    ///
    /// `Configuration` unless `offset <= length <= depth` (rejected
    /// before any hardware state changes); `NotReady` while a triggered
    /// capture is completing, including a trigger that fires after the
    /// status check but before the RUN write lands (the previous run
    /// keeps going and stays uploadable); `Bus` on transaction failure.
    pub fn run(&mut self, offset: usize, length: usize) -> Result<()> {
        let window = CaptureWindow { offset, length };
        window.validate(self.depth)?;

        if self.read_state()? == CaptureState::Triggered {
            return Err(ScopeError::not_ready(
                "a triggered capture is still completing",
            ));
        }

        let runs_before = self.bus.read(regs::RUN_COUNT)?;
        self.bus.write(regs::OFFSET, offset as u32)?;
        self.bus.write(regs::LENGTH, length as u32)?;
        self.bus.write(regs::CONTROL, regs::control::RUN)?;

        // The trigger can fire between the status check and the RUN
        // write; the hardware drops the RUN in that case, so acceptance
        // is confirmed through the run counter.
        if self.bus.read(regs::RUN_COUNT)? == runs_before {
            return Err(ScopeError::not_ready(
                "RUN dropped: a capture triggered before the command landed",
            ));
        }

        self.window = Some(window);
        info!("armed: offset={offset} length={length} depth={}", self.depth);
        Ok(())
    }

    /// Block until the capture reports DONE, polling the status register
    /// with exponential backoff.
    ///
    /// # Errors
    ///
    /// `CaptureTimeout` once `timeout` elapses without a DONE
    /// observation. The driver stays usable and a subsequent [`run`]
    /// remains valid; `NotReady` if no run was issued; `Bus` on
    /// transaction failure.
    ///
    /// [`run`]: Self::run
    pub fn wait_done(&mut self, timeout: Duration) -> Result<()> {
        if self.window.is_none() {
            return Err(ScopeError::not_ready("no capture has been armed"));
        }

        let start = Instant::now();
        let mut interval = POLL_INTERVAL_MIN;

        loop {
            let state = self.read_state()?;
            if state == CaptureState::Done {
                debug!("capture done after {:?}", start.elapsed());
                return Ok(());
            }

            if start.elapsed() >= timeout {
                return Err(ScopeError::CaptureTimeout {
                    duration_ms: timeout.as_millis() as u64,
                });
            }

            thread::sleep(interval);
            interval = (interval * 2).min(POLL_INTERVAL_MAX);
        }
    }

    /// Upload the frozen capture window: exactly `length` sample words,
    /// one LO/HI register pair per word, decoded against the layout.
    ///
    /// Each register read is an independent bus transaction; bus
    /// failures abort the upload and are propagated unmodified.
    ///
    /// # Errors
    ///
    /// `NotReady` if no run was issued or the capture has not reached
    /// DONE; `Bus` on transaction failure or a sample-count disagreement
    /// between hardware and the armed window.
    pub fn upload(&mut self) -> Result<&Trace> {
        let window = self
            .window
            .ok_or_else(|| ScopeError::not_ready("no capture has been armed"))?;

        let state = self.read_state()?;
        if state != CaptureState::Done {
            return Err(ScopeError::not_ready(format!(
                "capture is {state:?}, not Done"
            )));
        }

        let available = self.bus.read(regs::SAMPLE_COUNT)? as usize;
        if available != window.length {
            return Err(ScopeError::bus(format!(
                "sample count mismatch: hardware reports {available}, window is {}",
                window.length
            )));
        }

        self.bus.write(regs::READ_PTR, 0)?;
        let mut samples = Vec::with_capacity(window.length);
        for _ in 0..window.length {
            let lo = self.bus.read(regs::READ_DATA_LO)?;
            let hi = self.bus.read(regs::READ_DATA_HI)?; // advances READ_PTR
            samples.push(u64::from(lo) | (u64::from(hi) << 32));
        }

        info!("uploaded {} samples", samples.len());
        let trace = Trace::new(self.layout.clone(), samples, self.sample_period_ns);
        Ok(self.trace.insert(trace))
    }

    /// Write the last uploaded trace as a VCD dump to `path`.
    ///
    /// # Errors
    ///
    /// `NotReady` before a successful [`upload`]; `Io` on write failure.
    ///
    /// [`upload`]: Self::upload
    pub fn save(&self, path: impl AsRef<std::path::Path>) -> Result<()> {
        let trace = self
            .trace
            .as_ref()
            .ok_or_else(|| ScopeError::not_ready("nothing uploaded yet"))?;
        trace.save(path)
    }

    /// Read and decode the capture state from the status register.
    fn read_state(&mut self) -> Result<CaptureState> {
        let status = self.bus.read(regs::STATUS)?;
        CaptureState::from_bits(status)
            .ok_or_else(|| ScopeError::bus(format!("undecodable status word {status:#x}")))
    }
}
