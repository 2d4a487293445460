//! MIDI note values and pitch-class names.
//!
//! # Example
//! ```
//! use stimmung_midi::{parse_pitch_class, Note};
//!
//! let note = Note::new(61)?;
//! assert_eq!(note.octave(), 5);
//! assert_eq!(note.pitch_class(), 1);
//! assert_eq!(parse_pitch_class("Cis"), Some(1));
//! # Ok::<(), stimmung_midi::Error>(())
//! ```

use crate::{Error, Result};

/// Names of the twelve pitch classes, indexed from C.
pub const PITCH_CLASS_NAMES: [&str; 12] = [
    "C", "Cis", "D", "Dis", "E", "F", "Fis", "G", "Gis", "A", "Ais", "B",
];

/// A MIDI note number (0-127).
///
/// Octaves count from zero: MIDI 0-11 is octave 0, middle C (60) is octave 5.
/// Concert A (MIDI 69) is [`Note::CONCERT_A`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Note {
    midi: u8,
}

impl Note {
    pub const MIDDLE_C: Note = Note { midi: 60 };
    pub const CONCERT_A: Note = Note { midi: 69 };

    /// Fails with [`Error::NoteOutOfRange`] outside 0-127.
    pub fn new(midi: i32) -> Result<Note> {
        if !(0..=127).contains(&midi) {
            return Err(Error::NoteOutOfRange(midi));
        }
        Ok(Note { midi: midi as u8 })
    }

    pub const fn midi(self) -> u8 {
        self.midi
    }

    pub const fn octave(self) -> u8 {
        self.midi / 12
    }

    /// 0-11, where 0 = C.
    pub const fn pitch_class(self) -> u8 {
        self.midi % 12
    }

    /// Signed distance in semitones from `other` up to `self`.
    pub const fn interval_to(self, other: Note) -> i32 {
        self.midi as i32 - other.midi as i32
    }

    pub fn name(self) -> &'static str {
        PITCH_CLASS_NAMES[self.pitch_class() as usize]
    }
}

impl From<Note> for u8 {
    fn from(note: Note) -> u8 {
        note.midi
    }
}

impl TryFrom<i32> for Note {
    type Error = Error;

    fn try_from(midi: i32) -> Result<Self> {
        Note::new(midi)
    }
}

impl TryFrom<u8> for Note {
    type Error = Error;

    fn try_from(midi: u8) -> Result<Self> {
        Note::new(midi as i32)
    }
}

impl std::fmt::Display for Note {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.name(), self.octave())
    }
}

/// Name of a pitch class, or `None` above 11.
pub fn pitch_class_name(pitch_class: u8) -> Option<&'static str> {
    PITCH_CLASS_NAMES.get(pitch_class as usize).copied()
}

/// Parse a pitch class from a numeral (`"0"`..`"11"`) or a note name.
///
/// Accepts the names in [`PITCH_CLASS_NAMES`], sharps written `C#` / `Cs`,
/// flats written `Db` / `Des` / `Es` / `As` / `Bb`, and German `H` for B.
/// Case-insensitive.
pub fn parse_pitch_class(text: &str) -> Option<u8> {
    let text = text.trim();
    if let Ok(n) = text.parse::<u8>() {
        return (n < 12).then_some(n);
    }

    let lower = text.to_ascii_lowercase();
    let mut chars = lower.chars();
    let base: i32 = match chars.next()? {
        'c' => 0,
        'd' => 2,
        'e' => 4,
        'f' => 5,
        'g' => 7,
        'a' => 9,
        'b' | 'h' => 11,
        _ => return None,
    };
    let accidental = chars.as_str();

    let offset = match accidental {
        "" => 0,
        "#" | "is" => 1,
        "b" | "es" => -1,
        // German Es and As drop the vowel
        "s" if matches!(base, 4 | 9) => -1,
        "s" => 1,
        _ => return None,
    };

    Some((base + offset).rem_euclid(12) as u8)
}
