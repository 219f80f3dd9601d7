//! Silicon model of the sigscope embedded logic analyzer block.
//!
//! This crate has **no I/O and no bus access**: it is a pure model of the
//! analyzer hardware: the CSR register map, the bit-packed signal layout,
//! the combinational trigger matcher, and the capture engine state machine.
//! The host-side stack (`sigscope-driver`) drives this model through the
//! register protocol documented in [`regs`].
//!
//! # Crate organisation
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`regs`] | CSR register map: offsets, bit definitions, readback protocol |
//! | [`layout`] | Signal layout: bit-packing of monitored signals into sample words |
//! | [`trigger`] | Trigger condition: conjunctive equality match over a sample word |
//! | [`capture`] | Capture engine: circular buffer + IDLE/ARMED/TRIGGERED/DONE machine |

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod capture;
mod error;
pub mod layout;
pub mod regs;
pub mod trigger;

pub use capture::{CaptureEngine, CaptureState, CaptureWindow};
pub use error::{ChipError, Result};
pub use layout::{Signal, SignalLayout};
pub use trigger::TriggerCondition;
