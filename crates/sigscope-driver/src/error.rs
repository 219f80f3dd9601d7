//! Error types for host driver operations

use thiserror::Error;

/// Result type alias for driver operations
pub type Result<T> = std::result::Result<T, ScopeError>;

/// Errors that can occur while driving the analyzer.
///
/// No error leaves the capture state machine undefined: every rejected
/// command is a no-op on the hardware side.
#[derive(Debug, Error)]
pub enum ScopeError {
    /// Invalid configuration: unknown signal, bad window, overwide value.
    /// Rejected before any hardware state changes.
    #[error("Configuration error: {reason}")]
    Configuration {
        /// What was wrong with the request
        reason: String,
    },

    /// `wait_done` exceeded its timeout. The driver remains usable; the
    /// previous buffer contents (if any) are preserved but stale.
    #[error("Capture did not complete within {duration_ms}ms")]
    CaptureTimeout {
        /// Timeout that was exceeded, in milliseconds
        duration_ms: u64,
    },

    /// Operation requires a state the capture has not reached.
    #[error("Not ready: {reason}")]
    NotReady {
        /// Why the operation cannot proceed
        reason: String,
    },

    /// A register transaction failed on the underlying control bus.
    /// Propagated unmodified; retry policy belongs to the bus layer.
    #[error("Bus transaction failed: {reason}")]
    Bus {
        /// Reason reported by the bus
        reason: String,
    },

    /// I/O error while writing a waveform file
    #[error("I/O error: {source}")]
    Io {
        /// Underlying I/O error
        #[from]
        source: std::io::Error,
    },
}

impl ScopeError {
    /// Create a configuration error
    pub fn configuration(reason: impl Into<String>) -> Self {
        Self::Configuration {
            reason: reason.into(),
        }
    }

    /// Create a not-ready error
    pub fn not_ready(reason: impl Into<String>) -> Self {
        Self::NotReady {
            reason: reason.into(),
        }
    }

    /// Create a bus transaction error
    pub fn bus(reason: impl Into<String>) -> Self {
        Self::Bus {
            reason: reason.into(),
        }
    }
}

impl From<sigscope_chip::ChipError> for ScopeError {
    fn from(err: sigscope_chip::ChipError) -> Self {
        Self::Configuration {
            reason: err.to_string(),
        }
    }
}
