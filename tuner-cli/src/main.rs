//! # Tuner CLI
//!
//! Replays a recorded pitch stream through the tuner engine and prints one
//! reading per sample.
//!
//! ## Architecture
//! - **Feed thread**: reads the stream and sends samples over a bounded
//!   crossbeam channel, in place of a live audio callback
//! - **Main thread**: owns the engine, processes samples in order, renders
//!   each output
//! - **Shutdown**: the feed closes the channel at end of input

mod feed;
mod report;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use log::info;
use std::io::{self, Write};
use std::path::PathBuf;
use tuner_engine::tuning::parse_note;
use tuner_engine::{EngineConfig, TunerEngine, TuningMode};

use report::SessionSummary;

/// Replay a (frequency, amplitude, timestamp) stream through the tuner engine.
#[derive(Debug, Parser)]
#[command(name = "tuner", version, about)]
struct Cli {
    /// Sample stream, one sample per line (JSON or "freq amp time"); "-" reads stdin
    #[arg(short, long, default_value = "-")]
    input: String,

    /// JSON engine configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the A4 reference pitch in Hz
    #[arg(long)]
    reference: Option<f64>,

    /// Override the activity gate amplitude threshold (0..1)
    #[arg(long)]
    amplitude_threshold: Option<f64>,

    /// Override the stability band half-width in Hz
    #[arg(long)]
    stability_threshold: Option<f64>,

    /// Target note to tune against, e.g. "A4" or "Bb3"
    #[arg(short, long)]
    target: Option<String>,

    /// Print a HELD marker when a note has been stable this many seconds
    #[arg(long)]
    hold_seconds: Option<f64>,

    /// Emit one JSON object per sample instead of text
    #[arg(long)]
    json: bool,

    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = build_config(&cli)?;
    let mut engine = TunerEngine::new(config).context("invalid engine configuration")?;
    if let Some(target) = &cli.target {
        let (note, octave) =
            parse_note(target).with_context(|| format!("invalid target note {target:?}"))?;
        engine
            .set_mode(TuningMode::Target { note, octave })
            .with_context(|| format!("unusable target note {target:?}"))?;
        info!(
            "[MAIN] Tuning against {note}{octave} ({:.2} Hz)",
            engine.target_frequency().unwrap_or_default()
        );
    }

    let source = feed::open_source(&cli.input)?;
    let (sample_tx, sample_rx) = crossbeam_channel::bounded(feed::CHANNEL_CAPACITY);
    let feed_handle = feed::spawn_feed(source, sample_tx);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut summary = SessionSummary::default();

    for sample in sample_rx.iter() {
        let output = engine.process(sample);
        let held = summary.record(&output, cli.hold_seconds);

        if cli.json {
            writeln!(out, "{}", report::format_json(sample.timestamp, &output)?)?;
        } else {
            writeln!(out, "{}", report::format_output(sample.timestamp, &output))?;
            if held {
                writeln!(out, "{:>11}HELD", "")?;
            }
        }
    }

    let stats = feed_handle
        .join()
        .map_err(|_| anyhow!("sample feed thread panicked"))??;
    info!(
        "[MAIN] Stream finished: {} lines, {} samples, {} skipped",
        stats.lines, stats.sent, stats.skipped
    );

    if !cli.json {
        writeln!(out)?;
        writeln!(out, "{}", summary.render(engine.bands_started()))?;
    }
    engine.reset();
    Ok(())
}

/// Loads the config file (if any) and applies command-line overrides.
/// Validation happens when the engine is built.
fn build_config(cli: &Cli) -> Result<EngineConfig> {
    let mut config = match &cli.config {
        Some(path) => EngineConfig::load_from_file(path)?,
        None => EngineConfig::default(),
    };
    if let Some(reference) = cli.reference {
        config.reference_pitch_hz = reference;
    }
    if let Some(threshold) = cli.amplitude_threshold {
        config.amplitude_threshold = threshold;
    }
    if let Some(threshold) = cli.stability_threshold {
        config.stability_threshold_hz = threshold;
    }
    Ok(config)
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_overrides_config() {
        let cli = Cli::parse_from([
            "tuner",
            "--reference",
            "442",
            "--stability-threshold",
            "1.5",
            "--amplitude-threshold",
            "0.1",
        ]);
        let config = build_config(&cli).unwrap();
        assert_eq!(config.reference_pitch_hz, 442.0);
        assert_eq!(config.stability_threshold_hz, 1.5);
        assert_eq!(config.amplitude_threshold, 0.1);
        assert_eq!(config.min_frequency_hz, 20.0);
    }

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["tuner"]);
        assert_eq!(cli.input, "-");
        assert!(!cli.json);
        assert_eq!(build_config(&cli).unwrap(), EngineConfig::default());
    }

    #[test]
    fn test_demo_stream_end_to_end() {
        let demo = include_str!("../../demos/held_note.txt");
        let (tx, rx) = crossbeam_channel::bounded(feed::CHANNEL_CAPACITY);
        let handle = feed::spawn_feed(Box::new(std::io::Cursor::new(demo.to_string())), tx);

        let mut engine = TunerEngine::new(EngineConfig::default()).unwrap();
        let mut summary = SessionSummary::default();
        for sample in rx.iter() {
            let output = engine.process(sample);
            summary.record(&output, Some(1.0));
        }
        let stats = handle.join().unwrap().unwrap();

        assert_eq!(stats.skipped, 0);
        assert_eq!(summary.samples, 109);
        assert_eq!(summary.active_samples, 104);
        // The breath doesn't break the A4 hold; the bend opens five new bands.
        assert_eq!(engine.bands_started(), 6);
        assert_eq!(summary.holds_reached, 1);
    }

    #[test]
    fn test_cli_command_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
