//! Temperament engine and synthesis for stimmung.
//!
//! - **[`Temperament`]** - Per-pitch-class deviations from equal temperament,
//!   shiftable roots, pitchbend and the circle-of-fifths projection
//! - **[`TemperamentRegistry`]** - JSON/TOML catalogue of named temperaments
//! - **[`Synthesizer`]** - The instrument capability the player drives
//! - **[`OrganSynth`]** - Additive organ that reads its pitches from a temperament
//! - **[`Replayer`]** - Sample-accurate MIDI file replay into a synthesizer
//!
//! # Quick Start
//!
//! ```
//! use stimmung_synth::TemperamentRegistry;
//!
//! let registry = TemperamentRegistry::defaults()?;
//! let werckmeister = registry.get("werckmeister3")?;
//!
//! werckmeister.write().shift_to(7);
//! let a4 = werckmeister.read().frequency_for_midi(69)?;
//! assert!(a4 > 430.0 && a4 < 450.0);
//! # Ok::<(), stimmung_synth::Error>(())
//! ```

pub mod error;
pub use error::{Error, Result};

mod temperament;

pub use temperament::{
    fifths_order, CircleOfFifths, SharedTemperament, Temperament, A4_FREQ, A4_NOTE,
    PITCH_CLASSES,
};

mod registry;

pub use registry::{ChartSeries, TemperamentEntry, TemperamentRegistry};

mod synth;

pub use synth::{SharedSynth, Synthesizer};

mod organ;

pub use organ::{OrganSynth, MAX_VOICES};

mod replayer;

pub use replayer::Replayer;
