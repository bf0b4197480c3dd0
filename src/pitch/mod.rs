//! Pitch resolution
//!
//! Turns free-text pitch input into a frequency in Hz. Two notations are
//! accepted:
//! - a plain non-negative number (`"440"`, `"261.6"`), taken as Hz
//! - a note name: letter, optional `#`/`b`, integer octave (`"a4"`, `"C#3"`, `"bb-1"`)
//!
//! Note names use twelve-tone equal temperament anchored at A0 = 27.5 Hz, so
//! `a4` resolves to exactly 440 Hz.

mod note;

pub use note::{Accidental, NoteSpec, PitchLetter};

use thiserror::Error;

/// Frequencies of every pitch-class spelling in octave 0
pub const BASE_FREQUENCIES: [(&str, f64); 17] = [
    ("c", 16.351_597_831_287_414),
    ("c#", 17.323_914_436_054_505),
    ("db", 17.323_914_436_054_505),
    ("d", 18.354_047_994_837_977),
    ("d#", 19.445_436_482_630_058),
    ("eb", 19.445_436_482_630_058),
    ("e", 20.601_722_307_054_366),
    ("f", 21.826_764_464_562_746),
    ("f#", 23.124_651_419_477_15),
    ("gb", 23.124_651_419_477_15),
    ("g", 24.499_714_748_859_326),
    ("g#", 25.956_543_598_746_574),
    ("ab", 25.956_543_598_746_574),
    ("a", 27.5),
    ("a#", 29.135_235_094_880_62),
    ("bb", 29.135_235_094_880_62),
    ("b", 30.867_706_328_507_75),
];

/// Look up the octave-0 frequency of a pitch class such as `"c#"` or `"eb"`
pub fn base_frequency(pitch_class: &str) -> Option<f64> {
    BASE_FREQUENCIES
        .iter()
        .find(|(name, _)| *name == pitch_class)
        .map(|&(_, hz)| hz)
}

/// Why a piece of text could not be resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FailureReason {
    #[error("empty input")]
    Empty,
    #[error("not a non-negative number")]
    InvalidNumber,
    #[error("does not start with a pitch letter a-g")]
    UnknownLetter,
    #[error("no such pitch class")]
    UnknownPitchClass,
    #[error("missing or invalid octave")]
    InvalidOctave,
}

/// Text that is neither a valid frequency nor a valid note name
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot resolve {input:?}: {reason}")]
pub struct ParseFailure {
    pub input: String,
    pub reason: FailureReason,
}

impl ParseFailure {
    pub(crate) fn new(input: &str, reason: FailureReason) -> Self {
        Self {
            input: input.to_string(),
            reason,
        }
    }
}

/// Resolve pitch or frequency text to Hz
///
/// Input is trimmed and lowercased first. Anything containing one of the
/// letters `a`-`g` is parsed as a note name, everything else as a number.
pub fn resolve(text: &str) -> Result<f64, ParseFailure> {
    let normalized = normalize(text);

    if normalized.is_empty() {
        return Err(ParseFailure::new(text, FailureReason::Empty));
    }

    if is_pitch_like(&normalized) {
        let note: NoteSpec = normalized
            .parse()
            .map_err(|reason| ParseFailure::new(text, reason))?;
        note.frequency()
            .ok_or_else(|| ParseFailure::new(text, FailureReason::InvalidOctave))
    } else {
        parse_hz(&normalized).ok_or_else(|| ParseFailure::new(text, FailureReason::InvalidNumber))
    }
}

/// Whether the input takes the note-name path
pub fn is_pitch_like(text: &str) -> bool {
    text.chars()
        .any(|c| PitchLetter::from_char(c.to_ascii_lowercase()).is_some())
}

/// Whether the letter heuristic agrees with the strict `letter accidental octave` grammar
///
/// Inputs such as `"4a"` or `"x-e"` are routed to the note parser because they
/// contain a pitch letter, even though they do not start with one.
pub fn is_strict(text: &str) -> bool {
    let normalized = normalize(text);
    if !is_pitch_like(&normalized) {
        return true;
    }
    normalized
        .chars()
        .next()
        .and_then(PitchLetter::from_char)
        .is_some()
}

fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

fn parse_hz(text: &str) -> Option<f64> {
    text.parse::<f64>()
        .ok()
        .filter(|hz| hz.is_finite() && *hz >= 0.0)
}
