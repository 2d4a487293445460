//! Error types for stimmung-midi.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("MIDI note {0} out of range (0-127)")]
    NoteOutOfRange(i32),

    #[error("MIDI parse error: {0}")]
    MidiFileParse(String),

    #[error("Unsupported MIDI timing format")]
    MidiUnsupportedTiming,
}

impl From<midly::Error> for Error {
    fn from(e: midly::Error) -> Self {
        Error::MidiFileParse(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
