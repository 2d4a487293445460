//! Tempo map: piecewise-constant tempo over beats.
//!
//! Standard MIDI Files may change tempo anywhere; a point at beat `b` holds
//! until the next point. Before the first tempo event a file plays at
//! [`TempoMap::DEFAULT_BPM`].

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TempoPoint {
    pub beat: f64,
    pub bpm: f64,
}

/// Sorted tempo points, always starting at beat 0.
#[derive(Debug, Clone, PartialEq)]
pub struct TempoMap {
    points: Vec<TempoPoint>,
}

impl TempoMap {
    /// Tempo of a file without tempo events.
    pub const DEFAULT_BPM: f64 = 120.0;

    /// A constant tempo.
    pub fn new(bpm: f64) -> Self {
        Self {
            points: vec![TempoPoint { beat: 0.0, bpm }],
        }
    }

    /// Insert a tempo change. A point at an existing beat replaces it.
    pub fn add_tempo_point(&mut self, beat: f64, bpm: f64) {
        let beat = beat.max(0.0);
        let idx = self.points.partition_point(|p| p.beat < beat);

        match self.points.get_mut(idx) {
            Some(existing) if existing.beat == beat => existing.bpm = bpm,
            _ => self.points.insert(idx, TempoPoint { beat, bpm }),
        }
    }

    pub fn points(&self) -> &[TempoPoint] {
        &self.points
    }

    /// Tempo at the start of the file.
    pub fn initial_bpm(&self) -> f64 {
        self.points[0].bpm
    }

    /// Tempo in effect at `beat`.
    pub fn tempo_at(&self, beat: f64) -> f64 {
        let idx = self.points.partition_point(|p| p.beat <= beat);
        self.points[idx.saturating_sub(1)].bpm
    }

    pub fn is_constant(&self) -> bool {
        self.points.len() == 1
    }

    /// Seconds from the start of the file to `beats`.
    pub fn beats_to_seconds(&self, beats: f64) -> f64 {
        if self.is_constant() {
            return beats * 60.0 / self.points[0].bpm;
        }

        let mut seconds = 0.0;
        for (i, point) in self.points.iter().enumerate() {
            let segment_end = self
                .points
                .get(i + 1)
                .map(|next| next.beat)
                .unwrap_or(f64::INFINITY);

            if beats <= segment_end {
                return seconds + (beats - point.beat) * 60.0 / point.bpm;
            }
            seconds += (segment_end - point.beat) * 60.0 / point.bpm;
        }
        seconds
    }
}

impl Default for TempoMap {
    fn default() -> Self {
        Self::new(Self::DEFAULT_BPM)
    }
}
