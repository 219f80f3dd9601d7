//! CSR register map for the analyzer block.
//!
//! The analyzer is controlled over a narrow register bus: one 32-bit
//! register per transaction, no burst access. Sample words are up to
//! 64 bits wide, so wide quantities (trigger mask/value, sample data)
//! are split across LO/HI register pairs.
//!
//! ## Protocol
//!
//! ```text
//! configure:  TRIGGER_MASK_LO/HI, TRIGGER_VALUE_LO/HI   staged only
//!             TRIGGER_COMMIT <- 1                       latch atomically
//! arm:        OFFSET <- o, LENGTH <- l
//!             n = RUN_COUNT
//!             CONTROL <- RUN                            reset + arm
//!             RUN_COUNT != n                            confirms acceptance
//! poll:       STATUS until state bits == DONE
//! readback:   READ_PTR <- 0
//!             repeat LENGTH times:
//!               lo = READ_DATA_LO                       no side effect
//!               hi = READ_DATA_HI                       advances READ_PTR
//! ```
//!
//! The trigger mask/value pair is staged on write and only takes effect
//! on a `TRIGGER_COMMIT` write, so a multi-transaction update can never
//! arm against a half-written condition. Commit and RUN writes are
//! ignored (no-op) while a capture is in flight with a fired trigger;
//! a RUN write while ARMED restarts the capture with the fresh window.
//!
//! `RUN_COUNT` increments on every accepted RUN. The trigger can fire
//! between a host's status poll and its RUN write; comparing `RUN_COUNT`
//! around the write tells the host whether that RUN was accepted or
//! dropped.
//!
//! Read pointer auto-increment: the pointer advances when `READ_DATA_HI`
//! is read, so LO-then-HI pairs stream the frozen buffer sequentially
//! without re-issuing `READ_PTR` per word.

// ── Trigger configuration (staged until commit) ─────────────────────────────

/// Trigger mask, bits [31:0]. A set bit constrains that sample-word bit.
pub const TRIGGER_MASK_LO: usize = 0x00;
/// Trigger mask, bits [63:32].
pub const TRIGGER_MASK_HI: usize = 0x04;
/// Trigger value, bits [31:0]. Compared against masked sample-word bits.
pub const TRIGGER_VALUE_LO: usize = 0x08;
/// Trigger value, bits [63:32].
pub const TRIGGER_VALUE_HI: usize = 0x0C;
/// Write 1 to latch the staged mask/value into the matcher.
pub const TRIGGER_COMMIT: usize = 0x10;

// ── Capture control ──────────────────────────────────────────────────────────

/// Pre-trigger sample count for the next run.
pub const OFFSET: usize = 0x14;
/// Total window length for the next run.
pub const LENGTH: usize = 0x18;
/// Control register; see [`control`].
pub const CONTROL: usize = 0x1C;

// ── Status and readback ──────────────────────────────────────────────────────

/// Status register; see [`status`]. Read-only.
pub const STATUS: usize = 0x20;
/// Number of valid samples in the frozen buffer (0 unless DONE). Read-only.
pub const SAMPLE_COUNT: usize = 0x24;
/// Window index for readback; selects which sample `READ_DATA_*` returns.
pub const READ_PTR: usize = 0x28;
/// Selected sample word, bits [31:0]. Read-only, no side effect.
pub const READ_DATA_LO: usize = 0x2C;
/// Selected sample word, bits [63:32]. Read-only; advances `READ_PTR`.
pub const READ_DATA_HI: usize = 0x30;
/// Count of accepted RUN commands, wrapping. Read-only.
pub const RUN_COUNT: usize = 0x34;

/// Control register bit definitions
pub mod control {
    /// Arm the capture engine with the configured OFFSET/LENGTH window.
    pub const RUN: u32 = 1 << 0;
}

/// Status register bit definitions
pub mod status {
    /// Capture state, encoded in bits [1:0] as the `STATE_*` values.
    pub const STATE_MASK: u32 = 0b11;

    /// Engine idle, never armed since reset (or explicitly re-idled).
    pub const STATE_IDLE: u32 = 0;
    /// Armed, recording, trigger not yet fired.
    pub const STATE_ARMED: u32 = 1;
    /// Trigger fired, filling the post-trigger window.
    pub const STATE_TRIGGERED: u32 = 2;
    /// Window captured; buffer frozen and readable.
    pub const STATE_DONE: u32 = 3;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_offsets_non_overlapping() {
        let offsets = [
            TRIGGER_MASK_LO,
            TRIGGER_MASK_HI,
            TRIGGER_VALUE_LO,
            TRIGGER_VALUE_HI,
            TRIGGER_COMMIT,
            OFFSET,
            LENGTH,
            CONTROL,
            STATUS,
            SAMPLE_COUNT,
            READ_PTR,
            READ_DATA_LO,
            READ_DATA_HI,
            RUN_COUNT,
        ];
        for (i, a) in offsets.iter().enumerate() {
            for b in &offsets[i + 1..] {
                assert_ne!(a, b, "overlapping register offsets");
            }
        }
    }

    #[test]
    fn registers_word_aligned() {
        assert_eq!(TRIGGER_MASK_LO % 4, 0);
        assert_eq!(READ_DATA_HI % 4, 0);
        assert_eq!(READ_DATA_HI, READ_DATA_LO + 4);
    }

    #[test]
    fn state_codes_fit_mask() {
        assert!(status::STATE_DONE <= status::STATE_MASK);
        assert_ne!(status::STATE_IDLE, status::STATE_DONE);
    }
}
