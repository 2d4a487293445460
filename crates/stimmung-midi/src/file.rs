//! MIDI File I/O
//!
//! Standard MIDI File (SMF) parsing using the `midly` crate. All tracks are
//! merged into one time-sorted `TimedMidiEvent` list for replay, and every
//! tempo event goes into the file's [`TempoMap`].

use crate::error::{Error, Result};
use crate::tempo::TempoMap;
use midly::{MetaMessage, MidiMessage, Smf, Timing, Track, TrackEventKind};
use std::path::Path;
use tracing::debug;

/// A parsed MIDI file ready for replay
#[derive(Debug, Clone)]
pub struct ParsedMidiFile {
    /// All MIDI events with absolute timestamps in beats, sorted by time
    pub events: Vec<TimedMidiEvent>,

    /// Ticks per quarter note
    pub ticks_per_beat: u16,

    /// Tempo changes, in beats
    pub tempo_map: TempoMap,

    /// Time of the last event in beats
    pub duration_beats: f64,
}

/// A MIDI event with absolute timestamp
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimedMidiEvent {
    /// Absolute time in beats from start of file
    pub time_beats: f64,

    /// MIDI channel (0-15)
    pub channel: u8,

    pub event: MidiEventType,
}

/// MIDI event types kept for replay
///
/// Program changes and pitch bends are decoded so the event list is a
/// faithful view of the file; the organ has a single registration and takes
/// detuning from its temperament, so the replayer skips both.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MidiEventType {
    NoteOn { note: u8, velocity: u8 },
    NoteOff { note: u8, velocity: u8 },
    ControlChange { controller: u8, value: u8 },
    ProgramChange { program: u8 },
    /// -8192 to 8191
    PitchBend { value: i16 },
}

impl ParsedMidiFile {
    /// Load and parse a MIDI file from disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read(path.as_ref())?;
        Self::parse(&data)
    }

    /// Parse MIDI file from bytes
    pub fn parse(data: &[u8]) -> Result<Self> {
        let smf = Smf::parse(data)?;

        let ticks_per_beat = match smf.header.timing {
            Timing::Metrical(tpb) => tpb.as_int(),
            Timing::Timecode(_, _) => {
                return Err(Error::MidiUnsupportedTiming);
            }
        };

        debug!(
            "Parsing MIDI file: {} tracks, {} ticks per beat",
            smf.tracks.len(),
            ticks_per_beat
        );

        let mut all_events = Vec::new();
        let mut tempo_map = TempoMap::default();

        for track in smf.tracks.iter() {
            all_events.extend(Self::parse_track(track, ticks_per_beat, &mut tempo_map));
        }

        debug!(
            "Tempo: {} BPM, {} tempo points",
            tempo_map.initial_bpm(),
            tempo_map.points().len()
        );

        // Stable sort keeps per-track order for simultaneous events
        all_events.sort_by(|a, b| a.time_beats.total_cmp(&b.time_beats));

        let duration_beats = all_events.last().map(|e| e.time_beats).unwrap_or(0.0);

        debug!(
            "Parsed {} MIDI events, duration: {:.2} beats",
            all_events.len(),
            duration_beats
        );

        Ok(Self {
            events: all_events,
            ticks_per_beat,
            tempo_map,
            duration_beats,
        })
    }

    /// Tempo at the start of the file.
    pub fn tempo_bpm(&self) -> f64 {
        self.tempo_map.initial_bpm()
    }

    /// Duration in seconds, following every tempo change.
    pub fn duration_seconds(&self) -> f64 {
        self.tempo_map.beats_to_seconds(self.duration_beats)
    }

    /// Number of note-on events across all channels.
    pub fn note_count(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e.event, MidiEventType::NoteOn { .. }))
            .count()
    }

    fn parse_track(
        track: &Track,
        ticks_per_beat: u16,
        tempo_map: &mut TempoMap,
    ) -> Vec<TimedMidiEvent> {
        let mut events = Vec::new();
        let mut current_tick = 0u64;

        for event in track.iter() {
            current_tick += event.delta.as_int() as u64;
            let time_beats = current_tick as f64 / ticks_per_beat as f64;

            if let TrackEventKind::Meta(MetaMessage::Tempo(tempo)) = event.kind {
                // Microseconds per quarter note
                tempo_map.add_tempo_point(time_beats, 60_000_000.0 / tempo.as_int() as f64);
                continue;
            }

            if let Some(midi_event) = Self::convert_event(&event.kind, time_beats) {
                events.push(midi_event);
            }
        }

        events
    }

    fn convert_event(kind: &TrackEventKind, time_beats: f64) -> Option<TimedMidiEvent> {
        let TrackEventKind::Midi { channel, message } = kind else {
            // Meta events and sysex are not replayed
            return None;
        };

        let event = match message {
            MidiMessage::NoteOn { key, vel } if vel.as_int() == 0 => MidiEventType::NoteOff {
                note: key.as_int(),
                velocity: 0,
            },
            MidiMessage::NoteOn { key, vel } => MidiEventType::NoteOn {
                note: key.as_int(),
                velocity: vel.as_int(),
            },
            MidiMessage::NoteOff { key, vel } => MidiEventType::NoteOff {
                note: key.as_int(),
                velocity: vel.as_int(),
            },
            MidiMessage::Controller { controller, value } => MidiEventType::ControlChange {
                controller: controller.as_int(),
                value: value.as_int(),
            },
            MidiMessage::ProgramChange { program } => MidiEventType::ProgramChange {
                program: program.as_int(),
            },
            MidiMessage::PitchBend { bend } => MidiEventType::PitchBend {
                // u14 with center 8192
                value: bend.0.as_int() as i16 - 8192,
            },
            _ => return None,
        };

        Some(TimedMidiEvent {
            time_beats,
            channel: channel.as_int(),
            event,
        })
    }
}
