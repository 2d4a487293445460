//! Additive organ
//!
//! A small drawbar-style organ:
//! - Fixed harmonic partials summed per voice
//! - Linear attack and release ramps, no decay stage
//! - Up to [`MAX_VOICES`] voices, the oldest is stolen when full
//!
//! Pitch comes from the configured temperament at note-on time.

use crate::{Error, Result, SharedSynth, SharedTemperament, Synthesizer};
use parking_lot::Mutex;
use std::f64::consts::TAU;
use std::sync::Arc;
use stimmung_midi::Note;
use tracing::{debug, trace, warn};

/// Polyphony limit.
pub const MAX_VOICES: usize = 64;

/// Harmonic number and level of each drawbar.
const DRAWBARS: [(f64, f32); 6] = [
    (1.0, 1.0),
    (2.0, 0.6),
    (3.0, 0.4),
    (4.0, 0.3),
    (6.0, 0.15),
    (8.0, 0.1),
];

const ATTACK_SECONDS: f32 = 0.005;
const RELEASE_SECONDS: f32 = 0.03;

/// Overall output level so that a handful of voices stay below full scale.
const MASTER_GAIN: f32 = 0.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EnvelopeStage {
    Attack,
    Sustain,
    Release,
    Idle,
}

#[derive(Debug, Clone)]
struct Voice {
    channel: u8,
    key: u8,
    frequency: f64,
    /// Fundamental phase in cycles, wrapped to [0, 1)
    phase: f64,
    /// Drawbars below Nyquist
    partials: usize,
    gain: f32,
    level: f32,
    stage: EnvelopeStage,
    /// Note-on order, used for stealing
    age: u64,
}

impl Voice {
    fn is_idle(&self) -> bool {
        self.stage == EnvelopeStage::Idle
    }

    fn is_held(&self, channel: u8, key: u8) -> bool {
        self.channel == channel
            && self.key == key
            && matches!(self.stage, EnvelopeStage::Attack | EnvelopeStage::Sustain)
    }

    fn release(&mut self) {
        if !matches!(self.stage, EnvelopeStage::Idle | EnvelopeStage::Release) {
            self.stage = EnvelopeStage::Release;
        }
    }

    fn process(&mut self, sample_rate: f64, attack_step: f32, release_step: f32) -> f32 {
        match self.stage {
            EnvelopeStage::Attack => {
                self.level += attack_step;
                if self.level >= 1.0 {
                    self.level = 1.0;
                    self.stage = EnvelopeStage::Sustain;
                }
            }
            EnvelopeStage::Sustain => {}
            EnvelopeStage::Release => {
                self.level -= release_step;
                if self.level <= 0.0 {
                    self.level = 0.0;
                    self.stage = EnvelopeStage::Idle;
                    return 0.0;
                }
            }
            EnvelopeStage::Idle => return 0.0,
        }

        let mut sample = 0.0f32;
        for &(harmonic, level) in &DRAWBARS[..self.partials] {
            sample += level * (self.phase * harmonic * TAU).sin() as f32;
        }

        self.phase += self.frequency / sample_rate;
        self.phase -= self.phase.floor();

        sample * self.level * self.gain
    }
}

/// Additive organ synthesizer.
#[derive(Debug)]
pub struct OrganSynth {
    sample_rate: u32,
    temperament: SharedTemperament,
    voices: Vec<Voice>,
    next_age: u64,
    attack_step: f32,
    release_step: f32,
    /// Sum of drawbar levels, to keep one voice at unit peak
    normalisation: f32,
}

impl OrganSynth {
    /// Create an organ rendering at `sample_rate` with the given temperament.
    pub fn new(sample_rate: u32, temperament: SharedTemperament) -> Result<Self> {
        if sample_rate == 0 {
            return Err(Error::InvalidConfig(
                "sample rate must be greater than zero".to_string(),
            ));
        }

        let rate = sample_rate as f32;
        let normalisation = DRAWBARS.iter().map(|&(_, level)| level).sum();

        Ok(Self {
            sample_rate,
            temperament,
            voices: Vec::with_capacity(MAX_VOICES),
            next_age: 0,
            attack_step: 1.0 / (ATTACK_SECONDS * rate).max(1.0),
            release_step: 1.0 / (RELEASE_SECONDS * rate).max(1.0),
            normalisation,
        })
    }

    /// Wrap into the handle type the replayer expects.
    pub fn into_shared(self) -> SharedSynth {
        Arc::new(Mutex::new(self))
    }

    /// Fundamental frequencies of the voices currently held down.
    pub fn sounding_frequencies(&self) -> Vec<f64> {
        self.voices
            .iter()
            .filter(|v| matches!(v.stage, EnvelopeStage::Attack | EnvelopeStage::Sustain))
            .map(|v| v.frequency)
            .collect()
    }

    fn allocate(&mut self) -> usize {
        if let Some(idx) = self.voices.iter().position(Voice::is_idle) {
            return idx;
        }
        if self.voices.len() < MAX_VOICES {
            return self.voices.len();
        }

        // Steal the oldest voice
        let idx = self
            .voices
            .iter()
            .enumerate()
            .min_by_key(|(_, v)| v.age)
            .map(|(idx, _)| idx)
            .unwrap_or(0);
        trace!("Stealing voice {} (key {})", idx, self.voices[idx].key);
        idx
    }
}

impl Synthesizer for OrganSynth {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn configure_temperament(&mut self, temperament: SharedTemperament) {
        debug!(
            "Organ temperament set to '{}'",
            temperament.read().identifier()
        );
        self.temperament = temperament;
    }

    fn note_on(&mut self, channel: u8, key: u8, velocity: u8) {
        if velocity == 0 {
            self.note_off(channel, key);
            return;
        }

        let note = match Note::try_from(key) {
            Ok(note) => note,
            Err(e) => {
                warn!("Ignoring note-on: {}", e);
                return;
            }
        };

        // Retrigger releases the previous voice for the same key
        for voice in self.voices.iter_mut().filter(|v| v.is_held(channel, key)) {
            voice.release();
        }

        let frequency = self.temperament.read().frequency_for(note);
        let nyquist = self.sample_rate as f64 / 2.0;
        let partials = DRAWBARS
            .iter()
            .take_while(|&&(harmonic, _)| frequency * harmonic < nyquist)
            .count();

        let voice = Voice {
            channel,
            key,
            frequency,
            phase: 0.0,
            partials,
            gain: velocity.min(127) as f32 / 127.0 / self.normalisation,
            level: 0.0,
            stage: EnvelopeStage::Attack,
            age: self.next_age,
        };
        self.next_age += 1;

        let idx = self.allocate();
        if idx == self.voices.len() {
            self.voices.push(voice);
        } else {
            self.voices[idx] = voice;
        }

        trace!("Note on {} ({:.3} Hz) in voice {}", note, frequency, idx);
    }

    fn note_off(&mut self, channel: u8, key: u8) {
        for voice in self.voices.iter_mut().filter(|v| v.is_held(channel, key)) {
            voice.release();
        }
    }

    fn all_notes_off(&mut self) {
        for voice in &mut self.voices {
            voice.release();
        }
    }

    fn active_voices(&self) -> usize {
        self.voices.iter().filter(|v| !v.is_idle()).count()
    }

    fn render(&mut self, left: &mut [f32], right: &mut [f32]) {
        let frames = left.len().min(right.len());
        let sample_rate = self.sample_rate as f64;

        for i in 0..frames {
            let mut sample = 0.0;
            for voice in &mut self.voices {
                if !voice.is_idle() {
                    sample += voice.process(sample_rate, self.attack_step, self.release_step);
                }
            }

            sample *= MASTER_GAIN;
            left[i] = sample;
            right[i] = sample;
        }
    }
}
