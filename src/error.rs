//! Centralized error type for the stimmung umbrella crate.
//!
//! Wraps all subsystem errors so `?` propagates naturally across crate boundaries.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] stimmung_core::Error),

    #[error("Synth: {0}")]
    Synth(#[from] stimmung_synth::Error),

    #[error("MIDI: {0}")]
    Midi(#[from] stimmung_midi::Error),

    #[error("WAV: {0}")]
    Wav(#[from] hound::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
