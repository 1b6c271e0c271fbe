//! # Sample Feed
//!
//! Stands in for the audio layer: reads a recorded pitch stream and pushes
//! one [`PitchSample`] at a time over a bounded channel to the thread that
//! owns the engine.
//!
//! Accepted line formats:
//! - JSON: `{"frequency_hz": 440.0, "amplitude": 0.3, "timestamp": 0.0}`
//! - Plain: `440.0 0.3 0.0` (whitespace or comma separated)
//!
//! Blank lines and lines starting with `#` are skipped.

use anyhow::{Context, Result, anyhow, bail};
use crossbeam_channel::Sender;
use log::{debug, warn};
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::thread::{self, JoinHandle};
use tuner_engine::PitchSample;

/// Samples buffered between the feed thread and the engine thread.
pub const CHANNEL_CAPACITY: usize = 64;

/// Counters reported by the feed thread when the stream ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeedStats {
    pub lines: usize,
    pub sent: usize,
    pub skipped: usize,
}

/// Opens the input stream; `"-"` means stdin.
pub fn open_source(input: &str) -> Result<Box<dyn Read + Send>> {
    if input == "-" {
        return Ok(Box::new(std::io::stdin()));
    }
    let file = File::open(input).with_context(|| format!("failed to open sample stream {input}"))?;
    Ok(Box::new(file))
}

/// Parses one line of the sample stream.
///
/// # Returns
/// * `Ok(Some(sample))` - A sample to feed
/// * `Ok(None)` - Blank or comment line
/// * `Err(e)` - Malformed line
pub fn parse_line(line: &str) -> Result<Option<PitchSample>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    if line.starts_with('{') {
        let sample = serde_json::from_str(line).context("invalid JSON sample")?;
        return Ok(Some(sample));
    }

    let fields: Vec<&str> = line
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|field| !field.is_empty())
        .collect();
    if fields.len() != 3 {
        bail!("expected 3 fields (frequency amplitude timestamp), found {}", fields.len());
    }
    let number = |i: usize| -> Result<f64> {
        fields[i]
            .parse::<f64>()
            .map_err(|e| anyhow!("field {} ('{}'): {e}", i + 1, fields[i]))
    };
    Ok(Some(PitchSample::new(number(0)?, number(1)?, number(2)?)))
}

/// Spawns the feed thread.
///
/// The thread stops at end of input, on a read error, or when the receiving
/// side hangs up. Malformed lines are logged and skipped.
pub fn spawn_feed(
    source: Box<dyn Read + Send>,
    sender: Sender<PitchSample>,
) -> JoinHandle<Result<FeedStats>> {
    thread::spawn(move || {
        debug!("[FEED] Starting sample feed");
        let mut stats = FeedStats::default();
        for (index, line) in BufReader::new(source).lines().enumerate() {
            let line = line.with_context(|| format!("failed to read line {}", index + 1))?;
            stats.lines += 1;
            match parse_line(&line) {
                Ok(Some(sample)) => {
                    if sender.send(sample).is_err() {
                        debug!("[FEED] Receiver closed, stopping");
                        break;
                    }
                    stats.sent += 1;
                }
                Ok(None) => {}
                Err(e) => {
                    warn!("[FEED] Skipping line {}: {e:#}", index + 1);
                    stats.skipped += 1;
                }
            }
        }
        debug!("[FEED] Feed finished: {stats:?}");
        Ok(stats)
    })
}
