//! # Musical Tuning Module
//!
//! This module maps frequencies onto the equal-tempered scale. It is the
//! stateless half of the engine: given a frequency it finds the nearest named
//! pitch and the signed distance to it in cents, relative to a configurable
//! reference pitch.
//!
//! ## Features
//! - Nearest-note classification for any positive frequency
//! - Deterministic half-step tie-break (ties report +50 cents against the lower note)
//! - Note to frequency conversion for target tuning
//! - Note name parsing, including enharmonic flats

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::ParseNoteError;

/// Standard concert pitch for A4 in Hz.
pub const DEFAULT_REFERENCE_PITCH: f64 = 440.0;

/// Nominal octave of the reference pitch (A4).
pub const REFERENCE_OCTAVE: i32 = 4;

/// Semitones from C up to A. Octave numbers change at C, not at A.
const SEMITONES_C_TO_A: i64 = 9;

/// One of the twelve equal-tempered pitch classes, spelled with sharps.
///
/// Variants are declared in table order starting at A, so the discriminant is
/// the number of semitones above A within one octave.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NoteName {
    #[serde(rename = "A")]
    A,
    #[serde(rename = "A#")]
    ASharp,
    #[serde(rename = "B")]
    B,
    #[serde(rename = "C")]
    C,
    #[serde(rename = "C#")]
    CSharp,
    #[serde(rename = "D")]
    D,
    #[serde(rename = "D#")]
    DSharp,
    #[serde(rename = "E")]
    E,
    #[serde(rename = "F")]
    F,
    #[serde(rename = "F#")]
    FSharp,
    #[serde(rename = "G")]
    G,
    #[serde(rename = "G#")]
    GSharp,
}

/// The 12-entry pitch class table, starting at the reference pitch's class.
pub const NOTE_NAMES: [NoteName; 12] = [
    NoteName::A,
    NoteName::ASharp,
    NoteName::B,
    NoteName::C,
    NoteName::CSharp,
    NoteName::D,
    NoteName::DSharp,
    NoteName::E,
    NoteName::F,
    NoteName::FSharp,
    NoteName::G,
    NoteName::GSharp,
];

impl NoteName {
    /// Returns the sharp spelling, e.g. `"C#"`.
    pub const fn as_str(self) -> &'static str {
        match self {
            NoteName::A => "A",
            NoteName::ASharp => "A#",
            NoteName::B => "B",
            NoteName::C => "C",
            NoteName::CSharp => "C#",
            NoteName::D => "D",
            NoteName::DSharp => "D#",
            NoteName::E => "E",
            NoteName::F => "F",
            NoteName::FSharp => "F#",
            NoteName::G => "G",
            NoteName::GSharp => "G#",
        }
    }

    /// Semitones above C within the same octave (0..12).
    pub const fn semitones_above_c(self) -> i64 {
        (self as i64 + SEMITONES_C_TO_A) % 12
    }
}

impl fmt::Display for NoteName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accepted spellings, keyed with an upper-case letter. Flats map to their
/// sharp enharmonic inside the same octave.
static NOTE_LOOKUP: Lazy<BTreeMap<&'static str, NoteName>> = Lazy::new(|| {
    let mut map: BTreeMap<&'static str, NoteName> =
        NOTE_NAMES.iter().map(|&note| (note.as_str(), note)).collect();
    map.insert("Bb", NoteName::ASharp);
    map.insert("Db", NoteName::CSharp);
    map.insert("Eb", NoteName::DSharp);
    map.insert("Gb", NoteName::FSharp);
    map.insert("Ab", NoteName::GSharp);
    map
});

impl FromStr for NoteName {
    type Err = ParseNoteError;

    /// Parses a pitch class such as `"A"`, `"c#"` or `"Bb"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let mut chars = trimmed.chars();
        let letter = chars.next().ok_or(ParseNoteError::Empty)?;
        let key: String = std::iter::once(letter.to_ascii_uppercase())
            .chain(chars)
            .collect();
        NOTE_LOOKUP
            .get(key.as_str())
            .copied()
            .ok_or_else(|| ParseNoteError::UnknownName(trimmed.to_string()))
    }
}

/// Parses a full note with octave, e.g. `"A4"`, `"C#3"`, `"Bb-1"`.
///
/// # Arguments
/// * `name` - Pitch class followed by a (possibly negative) octave number
///
/// # Returns
/// * `Ok((note, octave))` - Parsed pitch class and octave
/// * `Err(ParseNoteError)` - Unknown pitch class or malformed octave
pub fn parse_note(name: &str) -> Result<(NoteName, i32), ParseNoteError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ParseNoteError::Empty);
    }

    // The pitch class is the letter plus any accidental; the octave starts at
    // the first digit or minus sign after the letter.
    let split = trimmed
        .char_indices()
        .skip(1)
        .find(|(_, c)| c.is_ascii_digit() || *c == '-')
        .map(|(i, _)| i)
        .ok_or_else(|| ParseNoteError::InvalidOctave(trimmed.to_string()))?;

    let note = trimmed[..split].parse::<NoteName>()?;
    let octave = trimmed[split..]
        .parse::<i32>()
        .map_err(|_| ParseNoteError::InvalidOctave(trimmed.to_string()))?;
    Ok((note, octave))
}

/// Result of classifying a single frequency.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    /// Nearest equal-tempered pitch class.
    pub note: NoteName,
    /// Octave of the nearest note (scientific pitch notation).
    pub octave: i32,
    /// Signed distance from the nearest note, in `(-50, 50]`.
    pub deviation_cents: f64,
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{} {:+.1}c", self.note, self.octave, self.deviation_cents)
    }
}

/// Continuous semitone offset of `frequency_hz` from the reference.
///
/// Computed as a difference of logarithms so that subnormal inputs do not
/// underflow the ratio to zero.
fn semitones_from_reference(frequency_hz: f64, reference_pitch_hz: f64) -> f64 {
    12.0 * (frequency_hz.log2() - reference_pitch_hz.log2())
}

/// Rounds a continuous semitone offset to the nearest note.
///
/// Ties deliberately round half down: an offset of exactly `k + 0.5`
/// resolves to the lower note `k` with a deviation of `+50` cents. Rounding
/// the tie up would report `-50` against the higher note, which falls outside
/// the half-open `(-50, 50]` range readings promise; the lower note is the
/// only choice that keeps it. The returned deviation is always in that range.
///
/// # Returns
/// * `(n, deviation_cents)` - Nearest semitone index and signed cents from it
pub(crate) fn nearest_semitone(semitones: f64) -> (i64, f64) {
    let mut nearest = (semitones - 0.5).ceil();
    let mut deviation = 100.0 * (semitones - nearest);

    // Rounding in `semitones - 0.5` can land one ulp outside the half-open range.
    if deviation > 50.0 {
        nearest += 1.0;
        deviation -= 100.0;
    } else if deviation <= -50.0 {
        nearest -= 1.0;
        deviation += 100.0;
    }

    (nearest as i64, deviation)
}

/// Classifies a frequency against the equal-tempered scale.
///
/// This is a pure function: it has no state and is safe to call from any
/// thread. The caller is expected to have gated out non-musical input first,
/// but any positive finite frequency yields a finite result.
///
/// # Arguments
/// * `frequency_hz` - Frequency to classify in Hz
/// * `reference_pitch_hz` - Frequency of A4 in Hz (usually 440.0)
///
/// # Returns
/// * `Some(Classification)` - Nearest note, octave, and cent deviation
/// * `None` - Frequency or reference is non-finite or not positive
pub fn classify(frequency_hz: f64, reference_pitch_hz: f64) -> Option<Classification> {
    if !is_positive_finite(frequency_hz) || !is_positive_finite(reference_pitch_hz) {
        return None;
    }

    let semitones = semitones_from_reference(frequency_hz, reference_pitch_hz);
    let (n, deviation_cents) = nearest_semitone(semitones);

    let note = NOTE_NAMES[n.rem_euclid(12) as usize];
    let octave = REFERENCE_OCTAVE as i64 + (n + SEMITONES_C_TO_A).div_euclid(12);

    Some(Classification {
        note,
        octave: octave as i32,
        deviation_cents,
    })
}

/// Calculates the equal-tempered frequency of a named note.
///
/// # Arguments
/// * `note` - Pitch class
/// * `octave` - Octave number (A4 is the reference)
/// * `reference_pitch_hz` - Frequency of A4 in Hz
///
/// # Returns
/// * Frequency in Hz
pub fn note_frequency(note: NoteName, octave: i32, reference_pitch_hz: f64) -> f64 {
    let semitones = (octave as i64 - REFERENCE_OCTAVE as i64) * 12 + note.semitones_above_c()
        - SEMITONES_C_TO_A;
    reference_pitch_hz * 2.0_f64.powf(semitones as f64 / 12.0)
}

/// Calculates the deviation from a target frequency in cents.
///
/// Unlike [`classify`], the result is not folded into ±50: a frequency a
/// whole tone above the target reports `+200`.
///
/// # Arguments
/// * `frequency_hz` - Measured frequency in Hz
/// * `target_hz` - Target frequency in Hz
///
/// # Returns
/// * Cent deviation (positive = sharp, negative = flat). Finite for any two
///   positive finite frequencies, subnormal ones included.
pub fn cents_between(frequency_hz: f64, target_hz: f64) -> f64 {
    1200.0 * (frequency_hz.log2() - target_hz.log2())
}

fn is_positive_finite(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn classify_a440(freq: f64) -> Classification {
        classify(freq, DEFAULT_REFERENCE_PITCH).expect("positive finite input")
    }

    #[test]
    fn test_reference_pitch_is_a4() {
        let c = classify_a440(440.0);
        assert_eq!(c.note, NoteName::A);
        assert_eq!(c.octave, 4);
        assert!(c.deviation_cents.abs() < EPS);
    }

    #[test]
    fn test_one_semitone_up_is_a_sharp() {
        let c = classify_a440(440.0 * 2.0_f64.powf(1.0 / 12.0));
        assert_eq!(c.note, NoteName::ASharp);
        assert_eq!(c.octave, 4);
        assert!(c.deviation_cents.abs() < 1e-6);
    }

    #[test]
    fn test_between_a_and_a_sharp_picks_nearer() {
        // 466 Hz is ~ -0.6 cents from A#4 (466.16 Hz).
        let c = classify_a440(466.0);
        assert_eq!(c.note, NoteName::ASharp);
        assert!(c.deviation_cents < 0.0);
        assert!(c.deviation_cents.abs() < 50.0);

        // 450 Hz is ~ +38.9 cents above A4.
        let c = classify_a440(450.0);
        assert_eq!(c.note, NoteName::A);
        assert!(c.deviation_cents > 0.0);
        assert!((c.deviation_cents - 38.906).abs() < 0.01);
    }

    #[test]
    fn test_octave_changes_at_c() {
        let cases = [
            (261.6256, NoteName::C, 4),
            (246.9417, NoteName::B, 3),
            (523.2511, NoteName::C, 5),
            (493.8833, NoteName::B, 4),
            (27.5, NoteName::A, 0),
            (4186.009, NoteName::C, 8),
            (16.3516, NoteName::C, 0),
            (15.4339, NoteName::B, -1),
        ];
        for (freq, note, octave) in cases {
            let c = classify_a440(freq);
            assert_eq!((c.note, c.octave), (note, octave), "frequency {freq}");
            assert!(c.deviation_cents.abs() < 0.1, "frequency {freq}");
        }
    }

    #[test]
    fn test_custom_reference_pitch() {
        let c = classify(432.0, 432.0).unwrap();
        assert_eq!((c.note, c.octave), (NoteName::A, 4));
        assert!(c.deviation_cents.abs() < EPS);

        // 440 Hz against A=432 is ~ +31.8 cents sharp of A4.
        let c = classify(440.0, 432.0).unwrap();
        assert_eq!(c.note, NoteName::A);
        assert!((c.deviation_cents - 31.767).abs() < 0.01);
    }

    #[test]
    fn test_tie_rounds_to_lower_note() {
        assert_eq!(nearest_semitone(0.5), (0, 50.0));
        assert_eq!(nearest_semitone(-0.5), (-1, 50.0));
        assert_eq!(nearest_semitone(11.5), (11, 50.0));
        assert_eq!(nearest_semitone(-12.5), (-13, 50.0));
    }

    #[test]
    fn test_nearest_semitone_just_past_tie() {
        let (n, dev) = nearest_semitone(0.5 + 1e-9);
        assert_eq!(n, 1);
        assert!(dev < -49.99 && dev > -50.0);
    }

    #[test]
    fn test_deviation_range_holds_across_spectrum() {
        let mut freq = 1.0e-3;
        while freq < 1.0e7 {
            let c = classify_a440(freq);
            assert!(
                c.deviation_cents > -50.0 && c.deviation_cents <= 50.0,
                "frequency {freq} gave {}",
                c.deviation_cents
            );
            freq *= 1.0137;
        }
    }

    #[test]
    fn test_extreme_inputs_stay_finite() {
        for freq in [f64::MIN_POSITIVE, 5e-324, 1e-300, 1e300, f64::MAX] {
            let c = classify_a440(freq);
            assert!(c.deviation_cents.is_finite(), "frequency {freq}");
            assert!(c.deviation_cents > -50.0 && c.deviation_cents <= 50.0);
        }
    }

    #[test]
    fn test_rejects_invalid_input() {
        assert!(classify(0.0, 440.0).is_none());
        assert!(classify(-440.0, 440.0).is_none());
        assert!(classify(f64::NAN, 440.0).is_none());
        assert!(classify(f64::INFINITY, 440.0).is_none());
        assert!(classify(440.0, 0.0).is_none());
        assert!(classify(440.0, f64::NAN).is_none());
    }

    #[test]
    fn test_note_frequency_matches_classification() {
        assert!((note_frequency(NoteName::A, 4, 440.0) - 440.0).abs() < EPS);
        assert!((note_frequency(NoteName::C, 4, 440.0) - 261.6256).abs() < 1e-3);
        assert!((note_frequency(NoteName::A, 0, 440.0) - 27.5).abs() < EPS);
        assert!((note_frequency(NoteName::GSharp, 3, 440.0) - 207.6523).abs() < 1e-3);

        for &note in NOTE_NAMES.iter() {
            for octave in 0..8 {
                let c = classify_a440(note_frequency(note, octave, 440.0));
                assert_eq!((c.note, c.octave), (note, octave));
                assert!(c.deviation_cents.abs() < 1e-6);
            }
        }
    }

    #[test]
    fn test_cents_between() {
        assert!(cents_between(440.0, 440.0).abs() < EPS);
        assert!((cents_between(880.0, 440.0) - 1200.0).abs() < EPS);
        assert!((cents_between(220.0, 440.0) + 1200.0).abs() < EPS);
        assert!(cents_between(445.0, 440.0) > 0.0);
    }

    #[test]
    fn test_cents_between_subnormal_target_is_finite() {
        let tiny = f64::MIN_POSITIVE / 1024.0;
        assert!(tiny.is_subnormal());
        let cents = cents_between(440.0, tiny);
        assert!(cents.is_finite());
        assert!(cents > 1200.0 * 1000.0);
    }

    #[test]
    fn test_note_frequency_leaves_float_range_at_extreme_octaves() {
        assert_eq!(note_frequency(NoteName::C, i32::MAX, 440.0), f64::INFINITY);
        assert_eq!(note_frequency(NoteName::C, -1100, 440.0), 0.0);
    }

    #[test]
    fn test_note_name_display_and_parse() {
        assert_eq!(NoteName::CSharp.to_string(), "C#");
        assert_eq!("C#".parse::<NoteName>(), Ok(NoteName::CSharp));
        assert_eq!("c#".parse::<NoteName>(), Ok(NoteName::CSharp));
        assert_eq!("Bb".parse::<NoteName>(), Ok(NoteName::ASharp));
        assert_eq!(" g ".parse::<NoteName>(), Ok(NoteName::G));
        assert_eq!(
            "H".parse::<NoteName>(),
            Err(ParseNoteError::UnknownName("H".to_string()))
        );
        assert_eq!("".parse::<NoteName>(), Err(ParseNoteError::Empty));
    }

    #[test]
    fn test_parse_note_with_octave() {
        assert_eq!(parse_note("A4"), Ok((NoteName::A, 4)));
        assert_eq!(parse_note("C#3"), Ok((NoteName::CSharp, 3)));
        assert_eq!(parse_note("eb5"), Ok((NoteName::DSharp, 5)));
        assert_eq!(parse_note("B-1"), Ok((NoteName::B, -1)));
        assert_eq!(
            parse_note("A"),
            Err(ParseNoteError::InvalidOctave("A".to_string()))
        );
        assert_eq!(
            parse_note("A4x"),
            Err(ParseNoteError::InvalidOctave("A4x".to_string()))
        );
        assert!(matches!(parse_note("X4"), Err(ParseNoteError::UnknownName(_))));
    }

    #[test]
    fn test_classification_display() {
        let c = classify_a440(440.0);
        assert_eq!(c.to_string(), "A4 +0.0c");
    }
}
