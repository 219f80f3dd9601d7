//! Uploaded capture data, decoded against the signal layout.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use sigscope_chip::layout::SignalLayout;

use crate::error::{Result, ScopeError};
use crate::vcd;

/// An uploaded capture: the ordered sample words of one window plus the
/// layout needed to explode them into per-signal values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trace {
    layout: SignalLayout,
    samples: Vec<u64>,
    sample_period_ns: u64,
}

impl Trace {
    /// Bundle uploaded sample words with their layout. `sample_period_ns`
    /// is the nominal capture-clock period used for waveform timestamps.
    pub fn new(layout: SignalLayout, samples: Vec<u64>, sample_period_ns: u64) -> Self {
        Self {
            layout,
            samples,
            sample_period_ns: sample_period_ns.max(1),
        }
    }

    /// Signal layout the samples were captured under.
    pub fn layout(&self) -> &SignalLayout {
        &self.layout
    }

    /// Raw bit-packed sample words, oldest first.
    pub fn samples(&self) -> &[u64] {
        &self.samples
    }

    /// Number of samples in the window.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// True if the window is empty.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Nominal sample period in nanoseconds.
    pub const fn sample_period_ns(&self) -> u64 {
        self.sample_period_ns
    }

    /// Values of one signal across the whole window, oldest first.
    ///
    /// # Errors
    ///
    /// `Configuration` if the signal is not in the layout.
    pub fn values_of(&self, name: &str) -> Result<Vec<u64>> {
        let signal = self
            .layout
            .signal(name)
            .ok_or_else(|| ScopeError::configuration(format!("unknown signal: {name}")))?;
        Ok(self
            .samples
            .iter()
            .map(|&w| self.layout.extract(w, signal))
            .collect())
    }

    /// Decode the sample at `index` into ordered `(name, value)` pairs.
    pub fn decode(&self, index: usize) -> Option<Vec<(&str, u64)>> {
        self.samples.get(index).map(|&w| self.layout.decode(w))
    }

    /// Write the trace as a VCD waveform dump to `path`.
    ///
    /// # Errors
    ///
    /// `Io` on any filesystem or write failure.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = File::create(path.as_ref())?;
        let mut out = BufWriter::new(file);
        vcd::write_vcd(self, &mut out)?;
        Ok(())
    }
}
