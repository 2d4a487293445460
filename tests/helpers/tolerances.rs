//! Tolerance constants for temperament and audio tests.

/// Frequencies computed through different but equivalent formulas.
pub const FREQ_RELATIVE: f64 = 1e-12;

/// Deviations read back from a catalogue document.
pub const CENTS_EPSILON: f64 = 1e-9;

/// Silence threshold (~-80dB).
/// Values below this are considered silent.
pub const SILENCE_THRESHOLD: f32 = 0.0001;

/// Anything above this is clearly audible output from the organ.
pub const AUDIBLE_PEAK: f32 = 0.01;
