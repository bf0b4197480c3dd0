//! Note names: letter, accidental and octave

use std::fmt;
use std::str::FromStr;

use super::{base_frequency, FailureReason};

/// The seven natural note letters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PitchLetter {
    C,
    D,
    E,
    F,
    G,
    A,
    B,
}

impl PitchLetter {
    /// Parse a lowercase letter
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'c' => Some(Self::C),
            'd' => Some(Self::D),
            'e' => Some(Self::E),
            'f' => Some(Self::F),
            'g' => Some(Self::G),
            'a' => Some(Self::A),
            'b' => Some(Self::B),
            _ => None,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            Self::C => 'c',
            Self::D => 'd',
            Self::E => 'e',
            Self::F => 'f',
            Self::G => 'g',
            Self::A => 'a',
            Self::B => 'b',
        }
    }
}

/// Sharp or flat modifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Accidental {
    #[default]
    Natural,
    Sharp,
    Flat,
}

impl Accidental {
    /// Only the literal `#` and `b` count, so an octave digit is never taken as an accidental
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '#' => Some(Self::Sharp),
            'b' => Some(Self::Flat),
            _ => None,
        }
    }

    pub fn suffix(self) -> &'static str {
        match self {
            Self::Natural => "",
            Self::Sharp => "#",
            Self::Flat => "b",
        }
    }
}

/// A parsed note name such as `c#4`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoteSpec {
    letter: PitchLetter,
    accidental: Accidental,
    octave: i32,
    base_hz: f64,
}

impl NoteSpec {
    /// Build a note, rejecting spellings outside the base table (e.g. `e#`)
    pub fn new(letter: PitchLetter, accidental: Accidental, octave: i32) -> Option<Self> {
        let key = pitch_class_key(letter, accidental);
        base_frequency(&key).map(|base_hz| Self {
            letter,
            accidental,
            octave,
            base_hz,
        })
    }

    pub fn letter(&self) -> PitchLetter {
        self.letter
    }

    pub fn accidental(&self) -> Accidental {
        self.accidental
    }

    pub fn octave(&self) -> i32 {
        self.octave
    }

    /// Pitch class spelling without the octave, e.g. `"eb"`
    pub fn pitch_class(&self) -> String {
        pitch_class_key(self.letter, self.accidental)
    }

    /// Frequency in Hz, `None` when the octave is too extreme to represent
    pub fn frequency(&self) -> Option<f64> {
        let hz = self.base_hz * 2f64.powi(self.octave);
        (hz.is_finite() && hz > 0.0).then_some(hz)
    }
}

fn pitch_class_key(letter: PitchLetter, accidental: Accidental) -> String {
    let mut key = String::with_capacity(2);
    key.push(letter.as_char());
    key.push_str(accidental.suffix());
    key
}

impl FromStr for NoteSpec {
    type Err = FailureReason;

    /// Expects already-normalized (trimmed, lowercase) text
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();

        let letter = chars
            .next()
            .and_then(PitchLetter::from_char)
            .ok_or(FailureReason::UnknownLetter)?;

        let rest = chars.as_str();
        let (accidental, octave_text) = match rest.chars().next().and_then(Accidental::from_char) {
            Some(accidental) => (accidental, &rest[1..]),
            None => (Accidental::Natural, rest),
        };

        // Checked before the octave so "e#" fails as a pitch class, not as an octave
        let key = pitch_class_key(letter, accidental);
        if base_frequency(&key).is_none() {
            return Err(FailureReason::UnknownPitchClass);
        }

        let octave = octave_text
            .parse::<i32>()
            .map_err(|_| FailureReason::InvalidOctave)?;

        NoteSpec::new(letter, accidental, octave).ok_or(FailureReason::UnknownPitchClass)
    }
}

impl fmt::Display for NoteSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.pitch_class(), self.octave)
    }
}
