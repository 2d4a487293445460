//! Offline rendering to WAV.

use crate::helpers::tolerances::AUDIBLE_PEAK;
use crate::helpers::{SmfBuilder, TEST_SAMPLE_RATE};
use stimmung::prelude::*;
use stimmung::render_blocks;

fn chord() -> Arc<ParsedMidiFile> {
    let bytes = SmfBuilder::default()
        .tempo_bpm(120.0)
        .note(60, 0.0, 1.0)
        .note(64, 0.0, 1.0)
        .note(67, 0.0, 1.0)
        .build();
    Arc::new(ParsedMidiFile::parse(&bytes).unwrap())
}

#[test]
fn test_render_to_wav_writes_stereo_pcm() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("chord.wav");
    let registry = TemperamentRegistry::defaults().unwrap();

    let summary = stimmung::render_to_wav(
        chord(),
        registry.get("meantone").unwrap(),
        TEST_SAMPLE_RATE,
        &path,
    )
    .unwrap();

    // One beat at 120 BPM plus the release
    assert!(summary.duration_seconds() >= 0.5);
    assert!(summary.duration_seconds() < 1.0);
    assert!(summary.peak > AUDIBLE_PEAK);

    let reader = hound::WavReader::open(&path).unwrap();
    let spec = reader.spec();
    assert_eq!(spec.channels, 2);
    assert_eq!(spec.sample_rate, TEST_SAMPLE_RATE);
    assert_eq!(spec.bits_per_sample, 16);
    assert_eq!(reader.duration() as u64, summary.frames);

    let samples: Vec<i16> = reader.into_samples::<i16>().map(|s| s.unwrap()).collect();
    assert!(samples.iter().any(|&s| s != 0));
}

#[test]
fn test_render_follows_shifted_temperament() {
    let equal = Temperament::equal().into_shared();
    let registry = TemperamentRegistry::defaults().unwrap();
    let meantone = registry.get("meantone").unwrap();
    meantone.write().shift_to(4);

    let collect = |temperament: SharedTemperament| {
        let mut left = Vec::new();
        render_blocks(chord(), temperament, TEST_SAMPLE_RATE, |l, _| {
            left.extend_from_slice(l);
            Ok(())
        })
        .unwrap();
        left
    };

    let tempered = collect(meantone);
    let reference = collect(equal);
    assert_eq!(tempered.len(), reference.len());
    assert_ne!(tempered, reference);
}

#[test]
fn test_render_rejects_zero_sample_rate() {
    let result = render_blocks(chord(), Temperament::equal().into_shared(), 0, |_, _| Ok(()));
    assert!(result.is_err());
}
