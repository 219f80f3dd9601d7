//! Error types for the silicon model

use thiserror::Error;

/// Result type alias for silicon-model operations
pub type Result<T> = std::result::Result<T, ChipError>;

/// Validation errors raised by the silicon model.
///
/// Every rejected command is a no-op: the capture state machine and the
/// buffer are left exactly as they were.
#[derive(Debug, Error)]
pub enum ChipError {
    /// The combined signal layout exceeds the sample word width
    #[error("Signal layout is {width} bits wide, sample word holds at most {max} bits")]
    LayoutTooWide {
        /// Total width of all declared signals
        width: u32,
        /// Sample word capacity
        max: u32,
    },

    /// A signal name appears twice in the layout
    #[error("Duplicate signal name in layout: {name}")]
    DuplicateSignal {
        /// Offending name
        name: String,
    },

    /// A signal was declared with zero width
    #[error("Signal {name} has zero width")]
    ZeroWidthSignal {
        /// Offending name
        name: String,
    },

    /// A trigger constraint references a signal not present in the layout
    #[error("Unknown signal in trigger condition: {name}")]
    UnknownSignal {
        /// Requested name
        name: String,
    },

    /// A trigger constraint value does not fit in the signal's bit width
    #[error("Trigger value {value:#x} does not fit in {width}-bit signal {name}")]
    ValueTooWide {
        /// Constrained signal name
        name: String,
        /// Requested value
        value: u64,
        /// Signal width in bits
        width: u32,
    },

    /// Capture window does not fit the buffer
    #[error("Invalid capture window: offset={offset} length={length} depth={depth}")]
    InvalidWindow {
        /// Pre-trigger sample count
        offset: usize,
        /// Total window length
        length: usize,
        /// Buffer depth
        depth: usize,
    },

    /// Command issued in a state that cannot accept it
    #[error("Command rejected in state {state:?}")]
    Rejected {
        /// Capture state at the time of the command
        state: crate::capture::CaptureState,
    },
}
