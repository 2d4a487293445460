//! Error types for stimmung-core.

use thiserror::Error;

/// Error type for stimmung-core operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Invalid device: {0}")]
    InvalidDevice(String),

    #[cfg(feature = "cpal")]
    #[error("Audio device not available")]
    DeviceNotAvailable(#[from] cpal::DefaultStreamConfigError),

    #[cfg(feature = "cpal")]
    #[error("Failed to build audio stream")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[cfg(feature = "cpal")]
    #[error("Failed to play audio stream")]
    PlayStream(#[from] cpal::PlayStreamError),

    #[cfg(feature = "cpal")]
    #[error("Failed to enumerate devices")]
    DevicesError(#[from] cpal::DevicesError),

    #[cfg(feature = "cpal")]
    #[error("Failed to query supported stream configs")]
    SupportedConfigs(#[from] cpal::SupportedStreamConfigsError),

    #[cfg(feature = "cpal")]
    #[error("Failed to get device name")]
    DeviceNameError(#[from] cpal::DeviceNameError),

    #[error(transparent)]
    Synth(#[from] stimmung_synth::Error),

    #[error(transparent)]
    Midi(#[from] stimmung_midi::Error),
}

/// Result type alias.
pub type Result<T> = std::result::Result<T, Error>;
