//! Control bus abstraction.
//!
//! The analyzer is reached over a narrow register-mapped bus: one 32-bit
//! register per transaction, no bursts, no shared memory. Everything the
//! host does (trigger configuration, arming, polling, readback) goes
//! through this trait. Transports (etherbone, UART bridge, simulation)
//! implement it; the driver never sees the transport.

use std::fmt::Debug;

use crate::error::Result;

/// Register-mapped control bus: one 32-bit register per transaction.
///
/// `read` takes `&mut self` because register reads can have hardware
/// side effects (the data register advances the read pointer).
pub trait ControlBus: Debug + Send {
    /// Read the 32-bit register at `addr`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ScopeError::Bus`] if the transaction fails; the
    /// driver propagates it unmodified.
    fn read(&mut self, addr: usize) -> Result<u32>;

    /// Write the 32-bit register at `addr`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ScopeError::Bus`] if the transaction fails.
    fn write(&mut self, addr: usize, value: u32) -> Result<()>;
}
