//! Control bus backends.
//!
//! Only the simulated analyzer ships here: it wires the [`crate::ControlBus`]
//! register protocol to the silicon model in `sigscope-chip`, which is
//! enough for CI, protocol validation, and the CLI demo. Hardware
//! transports (etherbone, UART bridge) live with their bus stacks and
//! implement the same trait.

pub mod sim;

pub use sim::SimAnalyzer;
