//! Signal layout: which signals are packed into each sample word.
//!
//! The layout is fixed by the hardware build: an ordered list of
//! `(name, width)` pairs supplied by the surrounding build tooling.
//! Signals are packed LSB-first in declaration order; the total width
//! defines the sample word width and must fit the 64-bit sample word.

use std::io::{self, Write};

use crate::error::{ChipError, Result};

/// Sample word width supported by the register readback protocol.
pub const MAX_WORD_WIDTH: u32 = 64;

/// One monitored signal within the sample word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signal {
    /// Signal name as exported by the build tooling.
    pub name: String,
    /// Width in bits.
    pub width: u32,
    /// Bit offset within the sample word (LSB of this signal).
    pub offset: u32,
}

impl Signal {
    /// Bit mask of this signal within the sample word.
    pub const fn mask(&self) -> u64 {
        if self.width >= 64 {
            u64::MAX
        } else {
            ((1u64 << self.width) - 1) << self.offset
        }
    }
}

/// Fixed ordered sequence of signals defining the sample word format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignalLayout {
    signals: Vec<Signal>,
    width: u32,
}

impl SignalLayout {
    /// Build a layout from the ordered `(name, width)` list the hardware
    /// build exports.
    ///
    /// # Errors
    ///
    /// Returns an error if the total width exceeds [`MAX_WORD_WIDTH`], a
    /// name repeats, or a signal has zero width.
    pub fn new<S: Into<String>>(signals: impl IntoIterator<Item = (S, u32)>) -> Result<Self> {
        let mut packed = Vec::new();
        let mut offset = 0u32;

        for (name, width) in signals {
            let name = name.into();
            if width == 0 {
                return Err(ChipError::ZeroWidthSignal { name });
            }
            if packed.iter().any(|s: &Signal| s.name == name) {
                return Err(ChipError::DuplicateSignal { name });
            }
            packed.push(Signal {
                name,
                width,
                offset,
            });
            offset += width;
            if offset > MAX_WORD_WIDTH {
                return Err(ChipError::LayoutTooWide {
                    width: offset,
                    max: MAX_WORD_WIDTH,
                });
            }
        }

        Ok(Self {
            signals: packed,
            width: offset,
        })
    }

    /// Total sample word width in bits.
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Signals in packing order (LSB first).
    pub fn signals(&self) -> &[Signal] {
        &self.signals
    }

    /// Look up a signal by name.
    pub fn signal(&self, name: &str) -> Option<&Signal> {
        self.signals.iter().find(|s| s.name == name)
    }

    /// Extract one signal's value from a sample word.
    pub fn extract(&self, word: u64, signal: &Signal) -> u64 {
        (word & signal.mask()) >> signal.offset
    }

    /// Decode a sample word into ordered `(name, value)` pairs.
    pub fn decode(&self, word: u64) -> Vec<(&str, u64)> {
        self.signals
            .iter()
            .map(|s| (s.name.as_str(), self.extract(word, s)))
            .collect()
    }

    /// Export the layout in the CSV form the surrounding build tooling
    /// consumes: a `config` row with the data width followed by one
    /// `signal,<name>,<width>` row per signal in packing order.
    ///
    /// # Errors
    ///
    /// Returns any error from the underlying writer.
    pub fn export_csv<W: Write>(&self, w: &mut W) -> io::Result<()> {
        writeln!(w, "config,data_width,{}", self.width)?;
        for s in &self.signals {
            writeln!(w, "signal,{},{}", s.name, s.width)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn demo_layout() -> SignalLayout {
        SignalLayout::new([("valid", 1), ("addr", 7), ("data", 16)]).unwrap()
    }

    #[test]
    fn offsets_packed_lsb_first() {
        let l = demo_layout();
        assert_eq!(l.width(), 24);
        assert_eq!(l.signal("valid").unwrap().offset, 0);
        assert_eq!(l.signal("addr").unwrap().offset, 1);
        assert_eq!(l.signal("data").unwrap().offset, 8);
    }

    #[test]
    fn extract_and_decode() {
        let l = demo_layout();
        // data=0xAB, addr=0x12, valid=1
        let word = (0xABu64 << 8) | (0x12 << 1) | 1;
        assert_eq!(l.extract(word, l.signal("valid").unwrap()), 1);
        assert_eq!(l.extract(word, l.signal("addr").unwrap()), 0x12);
        assert_eq!(l.extract(word, l.signal("data").unwrap()), 0xAB);

        let decoded = l.decode(word);
        assert_eq!(decoded[0], ("valid", 1));
        assert_eq!(decoded[2], ("data", 0xAB));
    }

    #[test]
    fn full_width_signal_mask() {
        let l = SignalLayout::new([("bus", 64)]).unwrap();
        let s = l.signal("bus").unwrap();
        assert_eq!(s.mask(), u64::MAX);
        assert_eq!(l.extract(u64::MAX, s), u64::MAX);
    }

    #[test]
    fn rejects_overwide_layout() {
        let err = SignalLayout::new([("a", 32), ("b", 33)]).unwrap_err();
        assert!(matches!(err, ChipError::LayoutTooWide { width: 65, .. }));
    }

    #[test]
    fn rejects_duplicate_name() {
        let err = SignalLayout::new([("a", 4), ("a", 4)]).unwrap_err();
        assert!(matches!(err, ChipError::DuplicateSignal { .. }));
    }

    #[test]
    fn rejects_zero_width() {
        let err = SignalLayout::new([("a", 0)]).unwrap_err();
        assert!(matches!(err, ChipError::ZeroWidthSignal { .. }));
    }

    #[test]
    fn csv_export_format() {
        let l = demo_layout();
        let mut out = Vec::new();
        l.export_csv(&mut out).unwrap();
        let csv = String::from_utf8(out).unwrap();
        assert_eq!(
            csv,
            "config,data_width,24\nsignal,valid,1\nsignal,addr,7\nsignal,data,16\n"
        );
    }
}
