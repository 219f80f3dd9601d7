//! VCD waveform serialization (IEEE 1364 Value Change Dump).
//!
//! Renders an uploaded [`Trace`] as a text waveform readable by GTKWave,
//! Surfer, and other standard viewers. Output is value-change
//! compressed: the first sample dumps an initial value for every signal,
//! afterwards a timestamp block is emitted only for samples where at
//! least one signal differs from its previously recorded value, and only
//! the changed signals are re-emitted.
//!
//! The header carries fixed strings (no wall-clock date), so serializing
//! the same trace twice yields byte-identical output.

use std::io::{self, Write};

use crate::trace::Trace;

/// Generate a VCD identifier code from a sequential index.
///
/// Printable ASCII starting from `!` (0x21); multi-character codes for
/// indices >= 94.
fn make_id_code(index: usize) -> String {
    let mut result = String::new();
    let mut idx = index;
    loop {
        let c = (b'!' + u8::try_from(idx % 94).unwrap_or(0)) as char;
        result.push(c);
        idx /= 94;
        if idx == 0 {
            break;
        }
        idx -= 1;
    }
    result
}

/// Format one signal value as a VCD value-change record.
fn format_change(value: u64, width: u32, id_code: &str) -> String {
    if width == 1 {
        format!("{value}{id_code}")
    } else {
        let bits = width as usize;
        format!("b{value:0bits$b} {id_code}")
    }
}

/// Serialize `trace` as a VCD dump.
///
/// Timestamps are `sample index × sample period` in nanoseconds, so
/// consecutive samples sit at fixed period multiples.
///
/// # Errors
///
/// Returns any error from the underlying writer.
pub fn write_vcd<W: Write>(trace: &Trace, out: &mut W) -> io::Result<()> {
    let layout = trace.layout();
    let period = trace.sample_period_ns();

    writeln!(out, "$date")?;
    writeln!(out, "  sigscope capture")?;
    writeln!(out, "$end")?;
    writeln!(out, "$version")?;
    writeln!(out, "  sigscope analyzer driver")?;
    writeln!(out, "$end")?;
    writeln!(out, "$timescale")?;
    writeln!(out, "  1ns")?;
    writeln!(out, "$end")?;

    writeln!(out, "$scope module analyzer $end")?;
    let ids: Vec<String> = (0..layout.signals().len()).map(make_id_code).collect();
    for (signal, id) in layout.signals().iter().zip(&ids) {
        writeln!(out, "$var wire {} {} {} $end", signal.width, id, signal.name)?;
    }
    writeln!(out, "$upscope $end")?;
    writeln!(out, "$enddefinitions $end")?;

    let Some(&first) = trace.samples().first() else {
        return Ok(());
    };

    // Initial value for every signal, regardless of change.
    writeln!(out, "#0")?;
    writeln!(out, "$dumpvars")?;
    let mut prev: Vec<u64> = Vec::with_capacity(layout.signals().len());
    for (signal, id) in layout.signals().iter().zip(&ids) {
        let value = layout.extract(first, signal);
        writeln!(out, "{}", format_change(value, signal.width, id))?;
        prev.push(value);
    }
    writeln!(out, "$end")?;

    for (index, &word) in trace.samples().iter().enumerate().skip(1) {
        let mut stamped = false;
        for ((signal, id), last) in layout.signals().iter().zip(&ids).zip(prev.iter_mut()) {
            let value = layout.extract(word, signal);
            if value == *last {
                continue;
            }
            if !stamped {
                writeln!(out, "#{}", index as u64 * period)?;
                stamped = true;
            }
            writeln!(out, "{}", format_change(value, signal.width, id))?;
            *last = value;
        }
    }

    Ok(())
}
