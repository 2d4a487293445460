//! Error types for stimmung-synth.

use thiserror::Error;

/// Result type alias for stimmung-synth operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in stimmung-synth.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error (catalogue files).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Midi(#[from] stimmung_midi::Error),

    /// A deviation table that does not have exactly 12 entries.
    #[error("Temperament '{identifier}' needs 12 deviations, got {len}")]
    InvalidDeviations { identifier: String, len: usize },

    /// A catalogue entry that could not be turned into a temperament.
    #[error("Invalid temperament entry '{identifier}': {reason}")]
    InvalidEntry { identifier: String, reason: String },

    #[error("Temperament not found: {0}")]
    NotFound(String),

    /// Catalogue document could not be parsed.
    #[error("Catalogue parse error: {0}")]
    Catalogue(String),

    /// Invalid configuration parameter.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A MIDI source the replayer cannot schedule.
    #[error("Malformed MIDI source: {0}")]
    MalformedSource(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Catalogue(e.to_string())
    }
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Error::Catalogue(e.to_string())
    }
}
