//! MIDI file replay
//!
//! Feeds the events of a [`ParsedMidiFile`] into a [`Synthesizer`] with
//! sample accuracy. Event times are mapped to frames through the file's tempo
//! map, and each render block is split at event boundaries so a note starts on
//! the exact frame its timestamp maps to.

use crate::{Error, Result, SharedSynth, Synthesizer};
use std::sync::Arc;
use stimmung_midi::{MidiEventType, ParsedMidiFile, TempoMap, TimedMidiEvent};
use tracing::{debug, trace};

/// All Sound Off
const CC_ALL_SOUND_OFF: u8 = 120;
/// All Notes Off
const CC_ALL_NOTES_OFF: u8 = 123;

/// Plays one MIDI file through one synthesizer.
pub struct Replayer {
    midi_file: Arc<ParsedMidiFile>,
    synth: SharedSynth,
    sample_rate: u32,
    /// Start frame of each event, parallel to `midi_file.events`
    event_frames: Vec<u64>,
    /// Index of the first event not yet dispatched
    next_event: usize,
    /// Frames rendered so far
    position: u64,
}

impl Replayer {
    /// Fails with [`Error::MalformedSource`] when any tempo of the file cannot
    /// be scheduled.
    pub fn new(midi_file: Arc<ParsedMidiFile>, synth: SharedSynth) -> Result<Self> {
        let tempo_map = &midi_file.tempo_map;
        if let Some(point) = tempo_map
            .points()
            .iter()
            .find(|p| !(p.bpm.is_finite() && p.bpm > 0.0))
        {
            return Err(Error::MalformedSource(format!(
                "tempo {} BPM at beat {}",
                point.bpm, point.beat
            )));
        }

        let sample_rate = synth.lock().sample_rate();
        let event_frames = midi_file
            .events
            .iter()
            .map(|event| event_frame(tempo_map, sample_rate, event))
            .collect();

        debug!(
            "Replayer ready: {} events, {:.2}s at {} Hz",
            midi_file.events.len(),
            midi_file.duration_seconds(),
            sample_rate
        );

        Ok(Self {
            midi_file,
            synth,
            sample_rate,
            event_frames,
            next_event: 0,
            position: 0,
        })
    }

    /// Render the next block into `left`/`right`.
    ///
    /// Returns `false` once every event has been dispatched and the synth has
    /// fallen silent; the block is still fully written in that case.
    pub fn render(&mut self, left: &mut [f32], right: &mut [f32]) -> bool {
        let frames = left.len().min(right.len());
        let handle = Arc::clone(&self.synth);
        let mut synth = handle.lock();
        let mut offset = 0;

        while offset < frames {
            self.dispatch_due(&mut *synth);

            let until_next = self
                .event_frames
                .get(self.next_event)
                .map(|&frame| (frame - self.position) as usize)
                .unwrap_or(usize::MAX);
            let chunk = (frames - offset).min(until_next);

            synth.render(
                &mut left[offset..offset + chunk],
                &mut right[offset..offset + chunk],
            );
            offset += chunk;
            self.position += chunk as u64;
        }

        // Events landing exactly on the block end
        self.dispatch_due(&mut *synth);

        !(self.events_exhausted() && synth.active_voices() == 0)
    }

    /// Whether every event has been dispatched and no voice is sounding.
    pub fn is_finished(&self) -> bool {
        self.events_exhausted() && self.synth.lock().active_voices() == 0
    }

    pub fn position_seconds(&self) -> f64 {
        self.position as f64 / self.sample_rate as f64
    }

    pub fn duration_seconds(&self) -> f64 {
        self.midi_file.duration_seconds()
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn midi_file(&self) -> &Arc<ParsedMidiFile> {
        &self.midi_file
    }

    fn events_exhausted(&self) -> bool {
        self.next_event >= self.midi_file.events.len()
    }

    fn dispatch_due(&mut self, synth: &mut dyn Synthesizer) {
        while let Some(&frame) = self.event_frames.get(self.next_event) {
            if frame > self.position {
                break;
            }
            dispatch(synth, &self.midi_file.events[self.next_event]);
            self.next_event += 1;
        }
    }
}

fn event_frame(tempo_map: &TempoMap, sample_rate: u32, event: &TimedMidiEvent) -> u64 {
    let seconds = tempo_map.beats_to_seconds(event.time_beats.max(0.0));
    (seconds * sample_rate as f64).round() as u64
}

fn dispatch(synth: &mut dyn Synthesizer, event: &TimedMidiEvent) {
    match event.event {
        MidiEventType::NoteOn { note, velocity } => synth.note_on(event.channel, note, velocity),
        MidiEventType::NoteOff { note, .. } => synth.note_off(event.channel, note),
        MidiEventType::ControlChange {
            controller: CC_ALL_SOUND_OFF | CC_ALL_NOTES_OFF,
            ..
        } => synth.all_notes_off(),
        other => trace!("Skipping {:?} on channel {}", other, event.channel),
    }
}
