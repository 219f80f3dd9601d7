//! Host driver for the sigscope embedded logic analyzer.
//!
//! The analyzer block (modeled in `sigscope-chip`) captures bit-packed
//! sample words into a fixed-depth circular buffer under trigger
//! control. This crate is everything host-side: the register protocol
//! over a narrow control bus, capture orchestration, and VCD waveform
//! export.
//!
//! # Quick start
//!
//! ```no_run
//! use sigscope_driver::{ScopeDriver, SimAnalyzer};
//! use sigscope_chip::SignalLayout;
//! use std::time::Duration;
//!
//! # fn main() -> sigscope_driver::Result<()> {
//! let layout = SignalLayout::new([("source_valid", 1), ("source_data", 16)])?;
//! let bus = SimAnalyzer::new(128, Box::new(|t| t << 1)).free_running(16);
//!
//! let mut analyzer = ScopeDriver::new(bus, layout, 128);
//! analyzer.configure_trigger([("source_valid", 1)])?;
//! analyzer.run(32, 128)?;
//! analyzer.wait_done(Duration::from_secs(1))?;
//! analyzer.upload()?;
//! analyzer.save("dump.vcd")?;
//! # Ok(())
//! # }
//! ```
//!
//! # Concurrency model
//!
//! Two domains: the free-running capture hardware and this host driver.
//! They share no memory; coordination is entirely polled status reads
//! and explicit command writes, one 32-bit register per transaction.
//! [`ScopeDriver::wait_done`] is the sole blocking point.

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::cast_possible_truncation)]

pub mod backends;
mod bus;
mod driver;
mod error;
mod trace;
pub mod vcd;

/// CSR register map (re-exported from sigscope-chip).
pub mod regs {
    pub use sigscope_chip::regs::*;
}

pub use backends::SimAnalyzer;
pub use bus::ControlBus;
pub use driver::ScopeDriver;
pub use error::{Result, ScopeError};
pub use trace::Trace;

/// Commonly used types.
pub mod prelude {
    pub use crate::{ControlBus, Result, ScopeDriver, ScopeError, SimAnalyzer, Trace};
    pub use sigscope_chip::{CaptureState, SignalLayout, TriggerCondition};
}
