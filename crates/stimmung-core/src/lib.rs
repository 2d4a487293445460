//! Playback runtime for stimmung.
//!
//! # Primary API
//!
//! - [`PlaybackController`] / [`PlaybackControllerBuilder`]: start, stop and
//!   retune MIDI playback, one session at a time
//! - [`PlayerFsm`]: the Stopped/Playing state machine behind the controller
//! - [`OutputBackend`] / [`AudioSink`]: where rendered audio goes
//!
//! # Feature-gated APIs
//!
//! - `"cpal"`: [`CpalOutput`] for the system audio device (enabled by default)

pub mod error;
pub use error::{Error, Result};

mod config;
pub use config::PlayerConfig;

pub mod output;
pub use output::{AudioSink, FinishedCallback, OutputBackend};

#[cfg(feature = "cpal")]
pub use output::{CpalOutput, CpalSink};

mod player;
pub use player::{
    PlaybackController, PlaybackControllerBuilder, PlaybackSession, PlaybackState, PlayerEvent,
    PlayerFsm, StateChangeCallback, TransitionResult,
};
