//! Playback controller lifecycle against a manual output backend.

use crate::helpers::tolerances::{AUDIBLE_PEAK, SILENCE_THRESHOLD};
use crate::helpers::{
    assert_has_audio, assert_silence, ManualHandle, ManualOutput, SmfBuilder, TEST_SAMPLE_RATE,
};
use std::cell::RefCell;
use std::rc::Rc;
use stimmung::prelude::*;
use stimmung::{OrganSynth, Synthesizer};

type Log = Rc<RefCell<Vec<(String, PlaybackState)>>>;

fn controller() -> (PlaybackController, ManualHandle, Log) {
    let (output, handle) = ManualOutput::new();
    let log: Log = Rc::default();
    let observer = Rc::clone(&log);

    let player = PlaybackController::builder()
        .sample_rate(TEST_SAMPLE_RATE)
        .output(output)
        .on_state_change(move |id, state| observer.borrow_mut().push((id.to_string(), state)))
        .build()
        .unwrap();

    (player, handle, log)
}

/// 120 BPM at 8 kHz: 4000 frames per beat.
fn scale() -> Arc<ParsedMidiFile> {
    let bytes = SmfBuilder::default()
        .tempo_bpm(120.0)
        .note(60, 0.0, 0.5)
        .note(62, 0.5, 0.5)
        .note(64, 1.0, 0.5)
        .build();
    Arc::new(ParsedMidiFile::parse(&bytes).unwrap())
}

fn entry(id: &str, state: PlaybackState) -> (String, PlaybackState) {
    (id.to_string(), state)
}

#[test]
fn test_stop_from_stopped_emits_nothing() {
    let (mut player, _, log) = controller();
    player.stop();
    assert!(log.borrow().is_empty());
    assert_eq!(player.state(), PlaybackState::Stopped);
}

#[test]
fn test_play_emits_single_playing() {
    let (mut player, handle, log) = controller();
    player
        .play("scale", scale(), Temperament::equal().into_shared())
        .unwrap();

    assert_eq!(*log.borrow(), vec![entry("scale", PlaybackState::Playing)]);
    assert_eq!(handle.opened(), 1);
}

#[test]
fn test_replay_orders_notifications() {
    let (mut player, handle, log) = controller();
    let registry = TemperamentRegistry::defaults().unwrap();

    player
        .play("first", scale(), registry.get("just").unwrap())
        .unwrap();
    player
        .play("second", scale(), registry.get("pythagorean").unwrap())
        .unwrap();

    assert_eq!(
        *log.borrow(),
        vec![
            entry("first", PlaybackState::Playing),
            entry("first", PlaybackState::Stopped),
            entry("second", PlaybackState::Playing),
        ]
    );
    assert!(handle.stopped(0));
    assert!(!handle.stopped(1));
}

#[test]
fn test_natural_end_returns_to_stopped() {
    let (mut player, handle, log) = controller();
    player
        .play("scale", scale(), Temperament::equal().into_shared())
        .unwrap();

    let blocks = handle.run_to_end();
    // 1.5 beats = 6000 frames plus the release tail
    assert!(blocks >= 12, "finished after {blocks} blocks");
    assert!(player.is_playing());

    player.process_events();
    assert_eq!(player.state(), PlaybackState::Stopped);
    assert_eq!(
        log.borrow().last(),
        Some(&entry("scale", PlaybackState::Stopped))
    );
}

#[test]
fn test_organ_sounds_then_falls_silent() {
    let (mut player, handle, _) = controller();
    player
        .play("scale", scale(), Temperament::equal().into_shared())
        .unwrap();

    assert_has_audio(&handle.render(2000), AUDIBLE_PEAK);

    handle.run_to_end();
    assert_silence(&handle.render(500), SILENCE_THRESHOLD);
}

#[test]
fn test_play_bytes_parses_and_plays() {
    let (mut player, _, log) = controller();
    let bytes = SmfBuilder::default().tempo_bpm(90.0).note(69, 0.0, 1.0).build();

    player
        .play_bytes("upload", &bytes, Temperament::equal().into_shared())
        .unwrap();
    assert_eq!(player.current_source(), Some("upload"));

    let midi_file = player.session().unwrap().midi_file();
    assert_eq!(midi_file.tempo_bpm().round(), 90.0);
    assert_eq!(midi_file.note_count(), 1);
    assert_eq!(log.borrow().len(), 1);
}

/// Render the frames right after a note-on in `temperament` on a bare organ.
fn reference_attack(temperament: SharedTemperament, key: u8, frames: usize) -> Vec<f32> {
    let mut organ = OrganSynth::new(TEST_SAMPLE_RATE, temperament).unwrap();
    organ.note_on(0, key, 100);
    let mut left = vec![0.0; frames];
    let mut right = vec![0.0; frames];
    organ.render(&mut left, &mut right);
    left
}

#[test]
fn test_shift_during_playback_reaches_next_note() {
    let (mut player, handle, _) = controller();
    let registry = TemperamentRegistry::defaults().unwrap();
    let werckmeister = registry.get("werckmeister3").unwrap();

    let bytes = SmfBuilder::default()
        .tempo_bpm(120.0)
        .note(69, 0.0, 0.5)
        .note(69, 1.0, 0.5)
        .build();
    let midi_file = Arc::new(ParsedMidiFile::parse(&bytes).unwrap());
    player
        .play("a", midi_file, Arc::clone(&werckmeister))
        .unwrap();

    let unshifted = reference_attack(Arc::clone(&werckmeister), 69, 512);

    // First note and its release
    handle.render(2000);
    werckmeister.write().shift_to(2);
    // Up to the second note-on at frame 4000
    handle.render(2000);
    let second_attack = handle.render(512);

    let shifted = reference_attack(Arc::clone(&werckmeister), 69, 512);
    assert_eq!(second_attack, shifted);
    assert_ne!(second_attack, unshifted);
}

#[test]
fn test_set_temperament_during_playback() {
    let (mut player, handle, log) = controller();
    let registry = TemperamentRegistry::defaults().unwrap();

    let bytes = SmfBuilder::default()
        .tempo_bpm(120.0)
        .note(64, 0.0, 0.5)
        .note(64, 1.0, 0.5)
        .build();
    let midi_file = Arc::new(ParsedMidiFile::parse(&bytes).unwrap());
    player
        .play("e", midi_file, registry.get("equal").unwrap())
        .unwrap();

    handle.render(2000);
    let just = registry.get("just").unwrap();
    player.set_temperament(Arc::clone(&just));
    handle.render(2000);
    let second_attack = handle.render(512);

    assert_eq!(second_attack, reference_attack(just, 64, 512));
    // Retuning never interrupts playback
    assert!(player.is_playing());
    assert_eq!(log.borrow().len(), 1);
}

#[test]
fn test_stale_finish_after_replay_is_ignored() {
    let (mut player, handle, _) = controller();
    player
        .play("old", scale(), Temperament::equal().into_shared())
        .unwrap();
    handle.run_to_end();

    // The old stream finished, but a new session started before the notice
    // was processed
    player
        .play("new", scale(), Temperament::equal().into_shared())
        .unwrap();
    player.process_events();

    assert!(player.is_playing());
    assert_eq!(player.current_source(), Some("new"));
}

#[test]
fn test_malformed_upload_leaves_stopped() {
    let (mut player, handle, log) = controller();
    player
        .play("scale", scale(), Temperament::equal().into_shared())
        .unwrap();

    let result = player.play_bytes("junk", b"MThd garbage", Temperament::equal().into_shared());
    assert!(result.is_err());
    assert_eq!(player.state(), PlaybackState::Stopped);
    assert!(handle.stopped(0));
    assert_eq!(
        *log.borrow(),
        vec![
            entry("scale", PlaybackState::Playing),
            entry("scale", PlaybackState::Stopped)
        ]
    );
}
