//! MIDI primitives for stimmung.
//!
//! - **[`Note`]**: a validated MIDI note number with octave, pitch class and
//!   interval arithmetic
//! - **Pitch classes**: names and parsing for the twelve pitch classes
//! - **[`ParsedMidiFile`]**: Standard MIDI File parsing (via `midly`) into a
//!   flat, time-sorted event list that a replayer can walk
//! - **[`TempoMap`]**: the file's tempo changes, for beat to seconds conversion
//!
//! # Example
//!
//! ```
//! use stimmung_midi::Note;
//!
//! let a4 = Note::new(69)?;
//! let c4 = Note::new(60)?;
//! assert_eq!(a4.interval_to(c4), 9);
//! assert_eq!(c4.pitch_class(), 0);
//! # Ok::<(), stimmung_midi::Error>(())
//! ```

pub mod error;
pub use error::{Error, Result};

mod file;
mod note;
mod tempo;

pub use file::{MidiEventType, ParsedMidiFile, TimedMidiEvent};
pub use note::{parse_pitch_class, pitch_class_name, Note, PITCH_CLASS_NAMES};
pub use tempo::{TempoMap, TempoPoint};
