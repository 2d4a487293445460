//! Temperament behaviour through the public API.

use crate::helpers::tolerances::FREQ_RELATIVE;
use approx::assert_relative_eq;
use proptest::prelude::*;
use stimmung::prelude::*;
use stimmung::synth::Error as SynthError;

fn note(midi: i32) -> Note {
    Note::new(midi).unwrap()
}

#[test]
fn test_zero_deviations_hit_concert_pitch_exactly() {
    let flat = Temperament::new("zero", "Zero", &[0.0; 12], Some(0)).unwrap();
    assert_eq!(flat.frequency_for(note(69)), 440.0);
    assert_eq!(flat.frequency_for(note(81)), 880.0);
}

#[test]
fn test_note_bounds() {
    assert!(Note::new(-1).is_err());
    assert!(Note::new(128).is_err());
    assert_eq!(Note::new(0).unwrap().pitch_class(), 0);
    assert_eq!(Note::new(127).unwrap().pitch_class(), 7);
}

#[test]
fn test_deviation_lengths_rejected() {
    for len in [0, 11, 13] {
        let result = Temperament::new("bad", "Bad", &vec![1.0; len], Some(0));
        assert!(
            matches!(result, Err(SynthError::InvalidDeviations { .. })),
            "length {len} accepted"
        );
    }
}

#[test]
fn test_bundled_werckmeister_against_reference() {
    let registry = TemperamentRegistry::defaults().unwrap();
    let werckmeister = registry.get("werckmeister3").unwrap();
    let werckmeister = werckmeister.read();

    // E is 9.8 cents below equal temperament
    let e4 = werckmeister.frequency_for(note(64));
    let expected = 440.0 * 2f64.powf((-500.0 - 9.8) / 1200.0);
    assert_relative_eq!(e4, expected, max_relative = FREQ_RELATIVE);
}

#[test]
fn test_shift_moves_pure_key() {
    let registry = TemperamentRegistry::defaults().unwrap();
    let meantone = registry.get("meantone").unwrap();

    // Before shifting, C is the pure reference key
    assert_eq!(meantone.read().active_deviations()[0], 0.0);

    meantone.write().shift_to(7);
    let shifted = meantone.read();
    assert_eq!(shifted.current_root_note(), Some(7));
    assert_eq!(shifted.active_deviations()[7], 0.0);
    assert_eq!(shifted.base_deviations()[0], 0.0);
}

#[test]
fn test_equal_cannot_be_shifted() {
    let registry = TemperamentRegistry::defaults().unwrap();
    let equal = registry.get("equal").unwrap();
    let before = *equal.read().active_deviations();

    for target in -2..14 {
        equal.write().shift_to(target);
    }

    assert_eq!(equal.read().active_deviations(), &before);
    assert_eq!(equal.read().current_root_note(), None);
}

#[test]
fn test_pitchbend_and_concert_pitch_combine() {
    let mut baroque = Temperament::equal().with_concert_pitch(415.0).unwrap();
    baroque.set_pitchbend(100.0);
    // A raised by a semitone at A = 415
    assert_relative_eq!(
        baroque.frequency_for(note(69)),
        415.0 * 2f64.powf(100.0 / 1200.0),
        max_relative = FREQ_RELATIVE
    );
}

#[test]
fn test_circle_of_fifths_does_not_mutate() {
    let registry = TemperamentRegistry::defaults().unwrap();
    let kirnberger = registry.get("kirnberger3").unwrap();
    let kirnberger = kirnberger.read();

    let first = kirnberger.deviations_in_circle_of_fifths(-3);
    let second = kirnberger.deviations_in_circle_of_fifths(-3);
    assert_eq!(first, second);
    assert_eq!(
        kirnberger.deviations_in_circle_of_fifths(0)[0],
        kirnberger.active_deviations()[0]
    );
}

proptest! {
    #[test]
    fn prop_catalogue_shift_is_rotation(id_index in 0usize..7, target in 0i32..12) {
        let registry = TemperamentRegistry::defaults().unwrap();
        let ids: Vec<String> = registry.identifiers().map(str::to_string).collect();
        let temperament = registry.get(&ids[id_index % ids.len()]).unwrap();
        let mut temperament = temperament.write();

        let base = *temperament.base_deviations();
        let before = *temperament.active_deviations();
        temperament.shift_to(target);

        match temperament.root_note() {
            Some(root) => {
                prop_assert_eq!(temperament.current_root_note(), Some(target as u8));
                let rotation = ((root as i32 - target + 12) % 12) as usize;
                for i in 0..12 {
                    prop_assert_eq!(temperament.active_deviations()[i], base[(rotation + i) % 12]);
                }
            }
            None => {
                prop_assert_eq!(temperament.active_deviations(), &before);
                prop_assert_eq!(temperament.current_root_note(), None);
            }
        }
    }

    #[test]
    fn prop_projection_starts_on_c(start_shift in 0i32..12) {
        let registry = TemperamentRegistry::defaults().unwrap();
        for (_, temperament) in registry.iter() {
            temperament.write().shift_to(start_shift);
            let t = temperament.read();
            prop_assert_eq!(t.deviations_in_circle_of_fifths(0)[0], t.active_deviations()[0]);
        }
    }
}
