//! One play-through of one MIDI source.

use crate::output::AudioSink;
use std::sync::Arc;
use stimmung_midi::ParsedMidiFile;
use stimmung_synth::SharedSynth;
use tracing::debug;

/// The synthesizer and output stream backing the current playback.
///
/// Owned exclusively by the controller; closing it stops the output and drops
/// both resources.
pub struct PlaybackSession {
    id: u64,
    source_id: String,
    midi_file: Arc<ParsedMidiFile>,
    synth: SharedSynth,
    sink: Box<dyn AudioSink>,
}

impl PlaybackSession {
    pub(crate) fn new(
        id: u64,
        source_id: String,
        midi_file: Arc<ParsedMidiFile>,
        synth: SharedSynth,
        sink: Box<dyn AudioSink>,
    ) -> Self {
        Self {
            id,
            source_id,
            midi_file,
            synth,
            sink,
        }
    }

    /// Controller-assigned id, unique per controller.
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn source_id(&self) -> &str {
        &self.source_id
    }

    pub fn midi_file(&self) -> &Arc<ParsedMidiFile> {
        &self.midi_file
    }

    pub fn synth(&self) -> &SharedSynth {
        &self.synth
    }

    /// Stop the output and release the synthesizer.
    pub fn close(mut self) {
        self.sink.stop();
        self.synth.lock().all_notes_off();
        debug!("Closed session {} ('{}')", self.id, self.source_id);
    }
}

impl std::fmt::Debug for PlaybackSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackSession")
            .field("id", &self.id)
            .field("source_id", &self.source_id)
            .field("events", &self.midi_file.events.len())
            .finish_non_exhaustive()
    }
}
