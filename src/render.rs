//! Offline rendering of a MIDI file to a WAV file.

use crate::Result;
use std::path::Path;
use std::sync::Arc;
use stimmung_midi::ParsedMidiFile;
use stimmung_synth::{OrganSynth, Replayer, SharedTemperament};
use tracing::{debug, info, warn};

/// Frames rendered per block.
const BLOCK_SIZE: usize = 512;

/// How long notes may keep sounding past the last event before they are
/// released.
const MAX_TAIL_SECONDS: f64 = 5.0;

/// What an offline render produced.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderSummary {
    pub frames: u64,
    pub sample_rate: u32,
    pub peak: f32,
}

impl RenderSummary {
    pub fn duration_seconds(&self) -> f64 {
        self.frames as f64 / self.sample_rate as f64
    }
}

/// Render `midi_file` through a fresh organ tuned to `temperament`, calling
/// `sink` with every stereo block until the file has played out.
///
/// Notes still held [`MAX_TAIL_SECONDS`] after the last event are released.
pub fn render_blocks(
    midi_file: Arc<ParsedMidiFile>,
    temperament: SharedTemperament,
    sample_rate: u32,
    mut sink: impl FnMut(&[f32], &[f32]) -> Result<()>,
) -> Result<RenderSummary> {
    let synth = OrganSynth::new(sample_rate, temperament)?.into_shared();
    let mut replayer = Replayer::new(midi_file, Arc::clone(&synth))?;

    let tail_limit = replayer.duration_seconds() + MAX_TAIL_SECONDS;
    let mut left = vec![0.0f32; BLOCK_SIZE];
    let mut right = vec![0.0f32; BLOCK_SIZE];
    let mut summary = RenderSummary {
        frames: 0,
        sample_rate,
        peak: 0.0,
    };
    let mut released = false;

    loop {
        let more = replayer.render(&mut left, &mut right);
        sink(&left, &right)?;

        summary.frames += BLOCK_SIZE as u64;
        summary.peak = left
            .iter()
            .chain(right.iter())
            .fold(summary.peak, |peak, s| peak.max(s.abs()));

        if !more {
            break;
        }
        if !released && replayer.position_seconds() > tail_limit {
            warn!("Releasing notes still held {}s after the last event", MAX_TAIL_SECONDS);
            synth.lock().all_notes_off();
            released = true;
        }
    }

    debug!(
        "Rendered {} frames, peak {:.3}",
        summary.frames, summary.peak
    );
    Ok(summary)
}

/// Render to a 16-bit stereo WAV file at `path`.
pub fn render_to_wav(
    midi_file: Arc<ParsedMidiFile>,
    temperament: SharedTemperament,
    sample_rate: u32,
    path: impl AsRef<Path>,
) -> Result<RenderSummary> {
    let path = path.as_ref();
    let spec = hound::WavSpec {
        channels: 2,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec)?;

    let summary = render_blocks(midi_file, temperament, sample_rate, |left, right| {
        for (&l, &r) in left.iter().zip(right.iter()) {
            writer.write_sample(to_i16(l))?;
            writer.write_sample(to_i16(r))?;
        }
        Ok(())
    })?;
    writer.finalize()?;

    info!(
        "Wrote {} ({:.2}s at {} Hz)",
        path.display(),
        summary.duration_seconds(),
        sample_rate
    );
    Ok(summary)
}

fn to_i16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16
}
