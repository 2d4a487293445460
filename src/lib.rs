//! # stimmung - Historical temperaments on a MIDI organ
//!
//! Hear a piece of music the way it sounded in Werckmeister's or Kirnberger's
//! tuning instead of modern equal temperament.
//!
//! ## Architecture
//!
//! stimmung is an umbrella crate that coordinates:
//! - **stimmung-midi** - MIDI note values, pitch-class names, Standard MIDI File parsing
//! - **stimmung-synth** - Temperaments, the temperament catalogue, the organ and the replayer
//! - **stimmung-core** - Playback controller, player state machine, audio output
//!
//! ## Quick Start
//!
//! ```ignore
//! use stimmung::prelude::*;
//!
//! let registry = TemperamentRegistry::defaults()?;
//! let kirnberger = registry.get("kirnberger3")?;
//! kirnberger.write().shift_to(2); // re-centre on D
//!
//! let mut player = PlaybackController::builder().build()?;
//! player.play("fugue", Arc::new(ParsedMidiFile::load("fugue.mid")?), kirnberger)?;
//!
//! while player.is_playing() {
//!     player.process_events();
//!     std::thread::sleep(std::time::Duration::from_millis(50));
//! }
//! ```
//!
//! ## Feature Flags
//!
//! - `cpal` (default) - Audio output through the system audio device

/// Re-export of stimmung-midi for direct access
pub use stimmung_midi as midi;

/// Re-export of stimmung-synth for direct access
pub use stimmung_synth as synth;

/// Re-export of stimmung-core for direct access
pub use stimmung_core as core;

// MIDI
pub use stimmung_midi::{
    parse_pitch_class, pitch_class_name, MidiEventType, Note, ParsedMidiFile, TempoMap,
    TempoPoint, TimedMidiEvent, PITCH_CLASS_NAMES,
};

// Temperaments and synthesis
pub use stimmung_synth::{
    fifths_order, ChartSeries, CircleOfFifths, OrganSynth, Replayer, SharedSynth,
    SharedTemperament, Synthesizer, Temperament, TemperamentEntry, TemperamentRegistry, A4_FREQ,
};

// Playback
pub use stimmung_core::{
    AudioSink, FinishedCallback, OutputBackend, PlaybackController, PlaybackControllerBuilder,
    PlaybackSession, PlaybackState, PlayerConfig,
};

#[cfg(feature = "cpal")]
pub use stimmung_core::CpalOutput;

pub mod error;
pub use error::{Error, Result};

mod render;
pub use render::{render_blocks, render_to_wav, RenderSummary};

/// Convenience prelude for common imports
pub mod prelude {
    pub use crate::{
        Note, ParsedMidiFile, PlaybackController, PlaybackState, PlayerConfig, SharedTemperament,
        Temperament, TemperamentRegistry,
    };

    #[cfg(feature = "cpal")]
    pub use crate::CpalOutput;

    pub use crate::{Error, Result};

    pub use std::sync::Arc;
}
