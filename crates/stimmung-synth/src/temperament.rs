//! Historical temperaments.
//!
//! A temperament assigns each of the twelve pitch classes a deviation, in
//! cents, from 12-tone equal temperament. Shiftable temperaments can be
//! re-centred on another root by re-reading the same table at a different
//! offset; the circle-of-fifths projection reorders the active table for
//! comparative display.
//!
//! Frequencies are computed on every call from the live table, so shifting or
//! detuning a temperament that a synthesizer is holding takes effect on the
//! synthesizer's next note-on.

use crate::{Error, Result};
use parking_lot::RwLock;
use std::sync::Arc;
use stimmung_midi::Note;
use tracing::{debug, warn};

/// Reference pitch for A4.
pub const A4_FREQ: f64 = 440.0;

/// MIDI note number for A4.
pub const A4_NOTE: u8 = 69;

/// Pitch classes per octave.
pub const PITCH_CLASSES: usize = 12;

/// Semitones between neighbours on the circle of fifths.
const FIFTH: i64 = 7;

/// A temperament shared between the catalogue, the UI and a running synth.
pub type SharedTemperament = Arc<RwLock<Temperament>>;

/// One tuning system.
#[derive(Debug, Clone, PartialEq)]
pub struct Temperament {
    identifier: String,
    name: String,
    /// Deviations from equal temperament in cents, indexed from C
    base_deviations: [f64; PITCH_CLASSES],
    /// `None` marks the temperament as non-shiftable
    root_note: Option<u8>,
    current_root: Option<u8>,
    /// Rotation of `base_deviations` matching `current_root`
    active_deviations: [f64; PITCH_CLASSES],
    concert_pitch_hz: f64,
    pitchbend_cents: f64,
}

impl Temperament {
    /// Create a temperament from exactly twelve deviations (C up to B).
    ///
    /// `root_note` is the pitch class with zero deviation; pass `None` for
    /// temperaments that cannot be shifted.
    pub fn new(
        identifier: impl Into<String>,
        name: impl Into<String>,
        deviations: &[f64],
        root_note: Option<u8>,
    ) -> Result<Self> {
        let identifier = identifier.into();

        let base_deviations: [f64; PITCH_CLASSES] =
            deviations
                .try_into()
                .map_err(|_| Error::InvalidDeviations {
                    identifier: identifier.clone(),
                    len: deviations.len(),
                })?;

        if let Some(root) = root_note {
            if root as usize >= PITCH_CLASSES {
                return Err(Error::InvalidConfig(format!(
                    "root note {} of '{}' out of range (0-11)",
                    root, identifier
                )));
            }
        }

        Ok(Self {
            identifier,
            name: name.into(),
            base_deviations,
            root_note,
            current_root: root_note,
            active_deviations: base_deviations,
            concert_pitch_hz: A4_FREQ,
            pitchbend_cents: 0.0,
        })
    }

    /// 12-tone equal temperament (all deviations zero, not shiftable).
    pub fn equal() -> Self {
        Self {
            identifier: "equal".to_string(),
            name: "Equal temperament".to_string(),
            base_deviations: [0.0; PITCH_CLASSES],
            root_note: None,
            current_root: None,
            active_deviations: [0.0; PITCH_CLASSES],
            concert_pitch_hz: A4_FREQ,
            pitchbend_cents: 0.0,
        }
    }

    /// Replace the reference frequency of A4 (default 440 Hz).
    pub fn with_concert_pitch(mut self, hz: f64) -> Result<Self> {
        if !(hz.is_finite() && hz > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "concert pitch {} of '{}' must be a positive frequency",
                hz, self.identifier
            )));
        }
        self.concert_pitch_hz = hz;
        Ok(self)
    }

    pub fn into_shared(self) -> SharedTemperament {
        Arc::new(RwLock::new(self))
    }

    /// Frequency in Hz of `note` under the active table and pitchbend.
    pub fn frequency_for(&self, note: Note) -> f64 {
        let deviation = self.active_deviations[note.pitch_class() as usize] + self.pitchbend_cents;
        let semitones = note.interval_to(Note::CONCERT_A) as f64;

        let ratio = 2.0_f64.powf((semitones * 100.0 + deviation) / 1200.0);
        self.concert_pitch_hz * ratio
    }

    /// Like [`frequency_for`](Self::frequency_for), validating the MIDI number first.
    pub fn frequency_for_midi(&self, midi: i32) -> Result<f64> {
        let note = Note::new(midi)?;
        Ok(self.frequency_for(note))
    }

    /// Frequencies of all 128 MIDI notes, computed from the current state.
    pub fn frequency_table(&self) -> [f64; 128] {
        let mut table = [0.0; 128];
        for (midi, freq) in (0..).zip(table.iter_mut()) {
            if let Ok(note) = Note::new(midi) {
                *freq = self.frequency_for(note);
            }
        }
        table
    }

    pub fn is_shiftable(&self) -> bool {
        self.root_note.is_some()
    }

    /// The pitch class currently treated as root, `None` if not shiftable.
    pub fn current_root_note(&self) -> Option<u8> {
        self.current_root
    }

    /// Re-centre the temperament on `target` (0-11).
    ///
    /// Non-shiftable temperaments ignore the request. Targets outside 0-11 are
    /// logged and ignored.
    pub fn shift_to(&mut self, target: i32) {
        let Some(root) = self.root_note else {
            debug!("Ignoring shift of non-shiftable temperament '{}'", self.identifier);
            return;
        };

        if !(0..PITCH_CLASSES as i32).contains(&target) {
            warn!(
                "Could not shift temperament '{}': pitch class {} is unknown",
                self.identifier, target
            );
            return;
        }

        let rotation = (root as usize + PITCH_CLASSES - target as usize) % PITCH_CLASSES;
        for i in 0..PITCH_CLASSES {
            self.active_deviations[i] = self.base_deviations[(rotation + i) % PITCH_CLASSES];
        }
        self.current_root = Some(target as u8);

        debug!(
            "Shifted temperament '{}' to root {} (rotation {})",
            self.identifier, target, rotation
        );
    }

    /// Detune every note by `cents`. Any value is accepted.
    pub fn set_pitchbend(&mut self, cents: f64) {
        self.pitchbend_cents = cents;
    }

    pub fn pitchbend_cents(&self) -> f64 {
        self.pitchbend_cents
    }

    /// Active deviations ordered along the circle of fifths.
    ///
    /// `start` is the offset of the first key on the circle (C = 0, F = -1,
    /// G = 1, E♭ = -3).
    pub fn circle_of_fifths(&self, start: i32) -> CircleOfFifths<'_> {
        CircleOfFifths {
            deviations: &self.active_deviations,
            start,
            step: 0,
        }
    }

    /// Collected form of [`circle_of_fifths`](Self::circle_of_fifths).
    pub fn deviations_in_circle_of_fifths(&self, start: i32) -> [f64; PITCH_CLASSES] {
        let mut out = [0.0; PITCH_CLASSES];
        for (slot, value) in out.iter_mut().zip(self.circle_of_fifths(start)) {
            *slot = value;
        }
        out
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The table as constructed, indexed from C.
    pub fn base_deviations(&self) -> &[f64; PITCH_CLASSES] {
        &self.base_deviations
    }

    /// The table pitch computation reads, rotated for the current root.
    pub fn active_deviations(&self) -> &[f64; PITCH_CLASSES] {
        &self.active_deviations
    }

    /// The root the temperament was defined on.
    pub fn root_note(&self) -> Option<u8> {
        self.root_note
    }

    pub fn concert_pitch_hz(&self) -> f64 {
        self.concert_pitch_hz
    }
}

impl Default for Temperament {
    fn default() -> Self {
        Self::equal()
    }
}

/// Pitch classes in circle-of-fifths order starting at offset `start`.
pub fn fifths_order(start: i32) -> [u8; PITCH_CLASSES] {
    let mut order = [0u8; PITCH_CLASSES];
    for (step, slot) in order.iter_mut().enumerate() {
        *slot = fifths_index(start, step) as u8;
    }
    order
}

fn fifths_index(start: i32, step: usize) -> usize {
    ((start as i64 + step as i64) * FIFTH).rem_euclid(PITCH_CLASSES as i64) as usize
}

/// Lazy circle-of-fifths view over a deviation table.
///
/// Yields twelve values. Call [`Temperament::circle_of_fifths`] again to
/// start over.
#[derive(Debug, Clone)]
pub struct CircleOfFifths<'a> {
    deviations: &'a [f64; PITCH_CLASSES],
    start: i32,
    step: usize,
}

impl Iterator for CircleOfFifths<'_> {
    type Item = f64;

    fn next(&mut self) -> Option<f64> {
        if self.step >= PITCH_CLASSES {
            return None;
        }
        let index = fifths_index(self.start, self.step);
        self.step += 1;
        Some(self.deviations[index])
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = PITCH_CLASSES - self.step;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for CircleOfFifths<'_> {}
