//! Trigger condition: conjunctive equality match over one sample word.
//!
//! The matcher is purely combinational: it looks at the current sample
//! word only, with no memory of past cycles. A condition is a mask/value
//! pair over the sample word; the trigger fires when every masked bit
//! equals the corresponding value bit. An empty condition (mask 0)
//! matches unconditionally, which is the "start capturing immediately"
//! mode.

use crate::error::{ChipError, Result};
use crate::layout::SignalLayout;

/// Bit-packed conjunctive equality constraint over a sample word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TriggerCondition {
    mask: u64,
    value: u64,
}

impl TriggerCondition {
    /// The empty condition: no constrained bits, matches every word.
    pub const ALWAYS: Self = Self { mask: 0, value: 0 };

    /// Build a condition from a raw mask/value pair as staged through the
    /// trigger registers. Value bits outside the mask are ignored.
    pub const fn from_raw(mask: u64, value: u64) -> Self {
        Self {
            mask,
            value: value & mask,
        }
    }

    /// Build a condition from per-signal equality constraints.
    ///
    /// Each `(name, value)` pair constrains one signal of `layout` to an
    /// exact value; unnamed signals are don't-care. Constraints are ANDed.
    ///
    /// # Errors
    ///
    /// Returns an error for a name not present in the layout, or a value
    /// that does not fit the signal's width.
    pub fn for_signals<'a>(
        layout: &SignalLayout,
        constraints: impl IntoIterator<Item = (&'a str, u64)>,
    ) -> Result<Self> {
        let mut mask = 0u64;
        let mut value = 0u64;

        for (name, v) in constraints {
            let signal = layout.signal(name).ok_or_else(|| ChipError::UnknownSignal {
                name: name.to_string(),
            })?;
            if signal.width < 64 && v >= (1u64 << signal.width) {
                return Err(ChipError::ValueTooWide {
                    name: name.to_string(),
                    value: v,
                    width: signal.width,
                });
            }
            mask |= signal.mask();
            value |= v << signal.offset;
        }

        Ok(Self { mask, value })
    }

    /// True iff every constrained bit of `word` equals its required value.
    pub const fn matches(&self, word: u64) -> bool {
        word & self.mask == self.value
    }

    /// True if no bits are constrained.
    pub const fn is_empty(&self) -> bool {
        self.mask == 0
    }

    /// Raw mask as staged through the trigger registers.
    pub const fn mask(&self) -> u64 {
        self.mask
    }

    /// Raw value as staged through the trigger registers.
    pub const fn value(&self) -> u64 {
        self.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout() -> SignalLayout {
        SignalLayout::new([("valid", 1), ("opcode", 4), ("data", 16)]).unwrap()
    }

    #[test]
    fn empty_condition_matches_everything() {
        let c = TriggerCondition::ALWAYS;
        assert!(c.is_empty());
        assert!(c.matches(0));
        assert!(c.matches(u64::MAX));
    }

    #[test]
    fn single_signal_equality() {
        let c = TriggerCondition::for_signals(&layout(), [("valid", 1)]).unwrap();
        assert!(c.matches(0b1));
        assert!(c.matches(0xFFFF_FFFF)); // other bits are don't-care
        assert!(!c.matches(0b0));
        assert!(!c.matches(0xFFFF_FFFE));
    }

    #[test]
    fn conjunction_over_two_signals() {
        let c =
            TriggerCondition::for_signals(&layout(), [("valid", 1), ("opcode", 0xA)]).unwrap();
        let hit = 1 | (0xA << 1);
        assert!(c.matches(hit));
        assert!(c.matches(hit | (0x1234 << 5))); // data unconstrained
        assert!(!c.matches(1 | (0xB << 1))); // opcode mismatch
        assert!(!c.matches(0xA << 1)); // valid mismatch
    }

    #[test]
    fn unknown_signal_rejected() {
        let err = TriggerCondition::for_signals(&layout(), [("nonsense", 1)]).unwrap_err();
        assert!(matches!(err, ChipError::UnknownSignal { .. }));
    }

    #[test]
    fn overwide_value_rejected() {
        let err = TriggerCondition::for_signals(&layout(), [("valid", 2)]).unwrap_err();
        assert!(matches!(err, ChipError::ValueTooWide { .. }));
    }

    #[test]
    fn raw_roundtrip_masks_value() {
        let c = TriggerCondition::from_raw(0x0F, 0xFA);
        assert_eq!(c.value(), 0x0A);
        assert!(c.matches(0xFFFF_FF0A));
    }
}
