//! Terminal rendering of engine output and the end-of-session summary.

use serde::Serialize;
use tuner_engine::EngineOutput;

/// One line of `--json` output.
#[derive(Debug, Serialize)]
struct JsonLine<'a> {
    timestamp: f64,
    #[serde(flatten)]
    output: &'a EngineOutput,
}

/// Formats a single engine output for display.
pub fn format_output(timestamp: f64, output: &EngineOutput) -> String {
    let mut line = format!("{timestamp:>9.3}s  ");
    match output.reading {
        Some(reading) if reading.is_active => {
            let note = format!("{}{}", reading.note_name, reading.octave);
            line.push_str(&format!(
                "{note:<4} {:>+6.1}c  ({:.2} Hz)  held {:.2}s",
                reading.deviation_cents, reading.frequency_hz, output.stability_seconds
            ));
            if let Some(smoothed) = output.smoothed_cents {
                line.push_str(&format!("  avg {smoothed:+.1}c"));
            }
            if let Some(target) = output.target_deviation_cents {
                line.push_str(&format!("  target {target:+.1}c"));
            }
        }
        Some(reading) => line.push_str(&format!(
            "--   (inactive, last {}{})  held {:.2}s",
            reading.note_name, reading.octave, output.stability_seconds
        )),
        None => line.push_str("--   (inactive)"),
    }
    line
}

/// Formats a single engine output as a JSON object.
pub fn format_json(timestamp: f64, output: &EngineOutput) -> serde_json::Result<String> {
    serde_json::to_string(&JsonLine { timestamp, output })
}

/// Running statistics for one replayed session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionSummary {
    pub samples: usize,
    pub active_samples: usize,
    pub longest_hold: f64,
    pub holds_reached: usize,
    previous_stability: f64,
}

impl SessionSummary {
    /// Records an output. Returns `true` when the stability duration crosses
    /// `hold_seconds` on this sample.
    pub fn record(&mut self, output: &EngineOutput, hold_seconds: Option<f64>) -> bool {
        self.samples += 1;
        if !output.is_active() {
            return false;
        }
        self.active_samples += 1;

        let current = output.stability_seconds;
        self.longest_hold = self.longest_hold.max(current);
        let crossed = hold_seconds
            .is_some_and(|hold| self.previous_stability < hold && current >= hold);
        if crossed {
            self.holds_reached += 1;
        }
        self.previous_stability = current;
        crossed
    }

    pub fn render(&self, bands_started: u64) -> String {
        format!(
            "samples: {} ({} active)\nbands started: {}\nlongest hold: {:.2}s\nholds reached: {}",
            self.samples, self.active_samples, bands_started, self.longest_hold, self.holds_reached
        )
    }
}
