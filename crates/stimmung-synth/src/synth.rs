//! The synthesizer capability the replayer drives.

use crate::SharedTemperament;
use parking_lot::Mutex;
use std::sync::Arc;

/// A polyphonic instrument whose pitches come from a temperament.
///
/// Implementations must re-read the configured temperament on every note-on
/// rather than caching frequencies, so that shifting or detuning the shared
/// temperament is heard on the next note.
pub trait Synthesizer: Send {
    fn sample_rate(&self) -> u32;

    /// Replace the temperament used for subsequent note-ons.
    fn configure_temperament(&mut self, temperament: SharedTemperament);

    /// Start a note. `velocity == 0` is treated as a note-off.
    fn note_on(&mut self, channel: u8, key: u8, velocity: u8);

    fn note_off(&mut self, channel: u8, key: u8);

    /// Release every sounding voice.
    fn all_notes_off(&mut self);

    /// Voices still producing sound, releasing ones included.
    fn active_voices(&self) -> usize;

    /// Render `min(left.len(), right.len())` frames, overwriting both buffers.
    fn render(&mut self, left: &mut [f32], right: &mut [f32]);
}

/// A synthesizer shared between the controller and the audio callback.
pub type SharedSynth = Arc<Mutex<dyn Synthesizer>>;
