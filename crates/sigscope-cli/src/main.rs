//! `sigscope`: command-line interface for the embedded logic analyzer.
//!
//! ```text
//! USAGE:
//!   sigscope capture [--output dump.vcd] [--trigger name=value ...]
//!                                    Run a capture on the simulated analyzer
//!   sigscope regs                    Print the CSR register map
//!   sigscope layout                  Export the demo signal layout as CSV
//! ```
//!
//! The capture subcommand drives the full host protocol (trigger
//! configuration, arm, status polling, readback, VCD export) against
//! the simulated analyzer backend, which is also how the protocol is
//! exercised in CI.

use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use sigscope_chip::{regs, SignalLayout};
use sigscope_driver::{ScopeDriver, SimAnalyzer};

#[derive(Parser)]
#[command(name = "sigscope", about = "Embedded logic analyzer CLI", version)]
struct Cli {
    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Run a capture against the simulated analyzer and export a VCD dump.
    Capture {
        /// Output waveform file.
        #[arg(short, long, default_value = "dump.vcd")]
        output: PathBuf,

        /// Capture buffer depth in samples.
        #[arg(long, default_value_t = 128)]
        depth: usize,

        /// Pre-trigger samples to retain.
        #[arg(long, default_value_t = 32)]
        offset: usize,

        /// Total samples to capture.
        #[arg(long, default_value_t = 128)]
        length: usize,

        /// Trigger constraints, `signal=value` (repeatable, ANDed).
        #[arg(short, long = "trigger", value_name = "NAME=VALUE")]
        triggers: Vec<String>,

        /// Tick at which the simulated stream asserts source_valid.
        #[arg(long, default_value_t = 50)]
        valid_at: u64,

        /// Nominal sample period in nanoseconds (VCD timestamps).
        #[arg(long, default_value_t = 8)]
        period_ns: u64,

        /// wait_done timeout in milliseconds.
        #[arg(long, default_value_t = 1000)]
        timeout_ms: u64,
    },
    /// Print the analyzer's CSR register map.
    Regs,
    /// Export the demo signal layout in build-tooling CSV form.
    Layout,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Cmd::Capture {
            output,
            depth,
            offset,
            length,
            triggers,
            valid_at,
            period_ns,
            timeout_ms,
        } => cmd_capture(
            &output, depth, offset, length, &triggers, valid_at, period_ns, timeout_ms,
        ),
        Cmd::Regs => cmd_regs(),
        Cmd::Layout => cmd_layout(),
    }
}

/// The demo build monitors a 16-bit streaming endpoint.
fn demo_layout() -> Result<SignalLayout> {
    SignalLayout::new([
        ("source_valid", 1),
        ("source_ready", 1),
        ("source_data", 16),
    ])
    .context("demo layout")
}

/// Synthetic stream: `source_valid` rises at `valid_at`, `source_ready`
/// deasserts every third tick, `source_data` counts.
fn demo_source(valid_at: u64) -> Box<dyn FnMut(u64) -> u64 + Send> {
    Box::new(move |t| {
        let valid = u64::from(t >= valid_at);
        let ready = u64::from(t % 3 != 0);
        let data = t & 0xFFFF;
        valid | (ready << 1) | (data << 2)
    })
}

fn parse_trigger(spec: &str) -> Result<(&str, u64)> {
    let Some((name, value)) = spec.split_once('=') else {
        bail!("trigger must be NAME=VALUE, got `{spec}`");
    };
    let value = if let Some(hex) = value.strip_prefix("0x") {
        u64::from_str_radix(hex, 16)
    } else {
        value.parse()
    }
    .with_context(|| format!("trigger value in `{spec}`"))?;
    Ok((name, value))
}

#[allow(clippy::too_many_arguments)]
fn cmd_capture(
    output: &PathBuf,
    depth: usize,
    offset: usize,
    length: usize,
    triggers: &[String],
    valid_at: u64,
    period_ns: u64,
    timeout_ms: u64,
) -> Result<()> {
    let layout = demo_layout()?;
    let bus = SimAnalyzer::new(depth, demo_source(valid_at)).free_running(16);
    let mut analyzer =
        ScopeDriver::new(bus, layout, depth).with_sample_period_ns(period_ns);

    let condition: Vec<(&str, u64)> = if triggers.is_empty() {
        vec![("source_valid", 1)]
    } else {
        triggers
            .iter()
            .map(|s| parse_trigger(s))
            .collect::<Result<_>>()?
    };

    for (name, value) in &condition {
        println!("trigger: {name} == {value:#x}");
    }

    analyzer.configure_trigger(condition.iter().copied())?;
    analyzer.run(offset, length)?;
    analyzer.wait_done(Duration::from_millis(timeout_ms))?;

    let trace = analyzer.upload()?;
    println!(
        "captured {} samples ({} pre-trigger), {} ns/sample",
        trace.len(),
        offset,
        trace.sample_period_ns()
    );

    analyzer.save(output)?;
    println!("wrote {}", output.display());
    Ok(())
}

fn cmd_regs() -> Result<()> {
    let map: &[(&str, usize)] = &[
        ("TRIGGER_MASK_LO", regs::TRIGGER_MASK_LO),
        ("TRIGGER_MASK_HI", regs::TRIGGER_MASK_HI),
        ("TRIGGER_VALUE_LO", regs::TRIGGER_VALUE_LO),
        ("TRIGGER_VALUE_HI", regs::TRIGGER_VALUE_HI),
        ("TRIGGER_COMMIT", regs::TRIGGER_COMMIT),
        ("OFFSET", regs::OFFSET),
        ("LENGTH", regs::LENGTH),
        ("CONTROL", regs::CONTROL),
        ("STATUS", regs::STATUS),
        ("SAMPLE_COUNT", regs::SAMPLE_COUNT),
        ("READ_PTR", regs::READ_PTR),
        ("READ_DATA_LO", regs::READ_DATA_LO),
        ("READ_DATA_HI", regs::READ_DATA_HI),
        ("RUN_COUNT", regs::RUN_COUNT),
    ];

    println!("sigscope CSR map (32-bit registers):");
    for (name, offset) in map {
        println!("  {offset:#06x}  {name}");
    }
    println!();
    println!("STATUS[1:0]: 0=IDLE 1=ARMED 2=TRIGGERED 3=DONE");
    println!("READ_DATA_HI read advances READ_PTR");
    println!("RUN_COUNT increments on each accepted RUN");
    Ok(())
}

fn cmd_layout() -> Result<()> {
    let layout = demo_layout()?;
    let mut stdout = std::io::stdout().lock();
    layout.export_csv(&mut stdout)?;
    stdout.flush()?;
    Ok(())
}
