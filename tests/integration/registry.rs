//! Catalogue loading from disk and shared handles.

use crate::helpers::tolerances::CENTS_EPSILON;
use approx::assert_abs_diff_eq;
use std::sync::Arc;
use stimmung::prelude::*;
use stimmung::synth::Error as SynthError;

const CATALOGUE_TOML: &str = r#"
[young2]
name = "Young II"
deviations = [0.0, -9.8, -3.9, -5.9, -7.8, -2.0, -9.8, -2.0, -7.8, -5.9, -3.9, -9.8]
rootNote = 0

[baroque]
name = "Baroque pitch"
deviations = [0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]
concertPitch = 415.0
"#;

#[test]
fn test_load_toml_catalogue_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("temperaments.toml");
    std::fs::write(&path, CATALOGUE_TOML).unwrap();

    let registry = TemperamentRegistry::load(&path).unwrap();
    assert_eq!(registry.identifiers().collect::<Vec<_>>(), vec!["baroque", "young2"]);

    let young = registry.get("young2").unwrap();
    assert_abs_diff_eq!(young.read().base_deviations()[4], -7.8, epsilon = CENTS_EPSILON);

    let baroque = registry.get("baroque").unwrap();
    assert_eq!(baroque.read().frequency_for_midi(69).unwrap(), 415.0);
    assert!(!baroque.read().is_shiftable());
}

#[test]
fn test_one_bad_entry_rejects_document() {
    let json = r#"{
        "fine": { "deviations": [0,0,0,0,0,0,0,0,0,0,0,0] },
        "broken": { "deviations": [0,0,0,0,0,0,0,0,0,0,0,0,0] }
    }"#;

    let err = TemperamentRegistry::from_json_str(json).unwrap_err();
    match err {
        SynthError::InvalidEntry { identifier, .. } => assert_eq!(identifier, "broken"),
        other => panic!("Expected InvalidEntry, got {other:?}"),
    }
}

#[test]
fn test_unknown_identifier_is_not_found() {
    let registry = TemperamentRegistry::defaults().unwrap();
    assert!(matches!(
        registry.get("bogus"),
        Err(SynthError::NotFound(id)) if id == "bogus"
    ));
}

#[test]
fn test_registry_hands_out_the_same_temperament() {
    let registry = TemperamentRegistry::defaults().unwrap();
    let ui_handle = registry.get("vallotti").unwrap();
    let player_handle = registry.get("vallotti").unwrap();

    assert!(Arc::ptr_eq(&ui_handle, &player_handle));

    ui_handle.write().set_pitchbend(-20.0);
    assert_eq!(player_handle.read().pitchbend_cents(), -20.0);
}

#[test]
fn test_chart_series_cover_catalogue() {
    let registry = TemperamentRegistry::defaults().unwrap();
    let series = registry.chart_series(-3);
    assert_eq!(series.len(), registry.len());

    let equal = series.iter().find(|s| s.identifier == "equal").unwrap();
    assert!(equal.values.iter().all(|&v| v == 0.0));
}
