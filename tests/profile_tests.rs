use std::path::PathBuf;

use palette_profile::profile::document::ProfileDocument;
use palette_profile::profile::reader::read_profile;
use palette_profile::profile::types::{BedOrigin, BedShape, PaletteType, PrintExtruder};
use palette_profile::profile::writer::write_profile_atomic;
use palette_profile::profile::*;

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

#[test]
fn test_read_fixture_profile() {
    let profile = read_profile(&fixture_path("sample_profile.json")).expect("Failed to read fixture");

    assert_eq!(profile.id, ProfileId::from("P0c0ffee"));
    assert_eq!(profile.profile_name, "Prusa MK3S");
    assert_eq!(profile.palette_type, PaletteType::Palette2Pro);
    assert_eq!(profile.print_bed.shape, BedShape::Rectangular { x: 250.0, y: 210.0 });
    assert_eq!(profile.print_bed.origin, BedOrigin::Middle);
    assert_eq!(profile.print_extruder, PrintExtruder::Index(1));
    assert_eq!(profile.input_parsers.len(), 2);

    let cal = profile.calibration.expect("fixture is calibrated");
    assert_eq!(cal.pulses_per_mm(), 30.0);

    let violations = validate_profile(&profile, &default_limits());
    assert!(violations.is_empty(), "Fixture should be valid, got: {:?}", violations);
}

#[test]
fn test_round_trip_byte_identical() {
    let path = fixture_path("sample_profile.json");
    let raw_input = std::fs::read_to_string(&path).expect("Failed to read fixture file");

    let profile = ProfileDocument::from_json(&raw_input)
        .and_then(|doc| Ok(doc.into_profile()?))
        .expect("Failed to parse");
    let output = ProfileDocument::from_profile(&profile)
        .to_json_4space()
        .expect("Failed to serialize");

    assert_eq!(
        raw_input, output,
        "Round-trip produced different bytes.\n\
         Input length: {}, Output length: {}\n\
         First difference at byte: {}",
        raw_input.len(),
        output.len(),
        raw_input
            .bytes()
            .zip(output.bytes())
            .position(|(a, b)| a != b)
            .unwrap_or(std::cmp::min(raw_input.len(), output.len()))
    );
}

#[test]
fn test_conflicting_bed_shapes_rejected() {
    let err = read_profile(&fixture_path("conflicting_bed.json")).unwrap_err();
    assert!(
        err.to_string().contains("validation"),
        "Unexpected error: {}",
        err
    );
}

#[test]
fn test_import_document_without_origin_offsets() {
    let raw_input = std::fs::read_to_string(fixture_path("sample_profile.json")).expect("Failed to read fixture file");
    let stripped: String = raw_input
        .lines()
        .filter(|line| !line.contains("\"origin_offset_"))
        .map(|line| format!("{}\n", line))
        .collect();
    assert!(!stripped.contains("origin_offset"));

    let doc = ProfileDocument::from_json(&stripped).expect("Failed to parse");
    let profile = import_document(doc, &ProfileRegistry::new(), &default_limits())
        .expect("Middle origin without offsets should import");
    assert_eq!(profile.print_bed.origin, BedOrigin::Middle);
    assert_eq!(profile.print_bed.origin_offsets(), (125.0, 105.0));
}

#[test]
fn test_atomic_write_creates_file() {
    let profile = read_profile(&fixture_path("sample_profile.json")).expect("Failed to read fixture");

    let tmp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let target = tmp_dir.path().join("nested").join("output_profile.json");

    write_profile_atomic(&profile, &target).expect("Failed to write profile");
    assert!(target.exists(), "Written profile file should exist");

    let reparsed = read_profile(&target).expect("Written file is not a valid profile");
    assert_eq!(profile, reparsed);
}

#[test]
fn test_store_save_list_delete() {
    let tmp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let store = JsonProfileStore::new(ProfilePaths::with_root(tmp_dir.path()));

    let first = PrinterProfile::new("Ender3");
    let mut second = PrinterProfile::new("Delta");
    second.print_bed = types::PrintBed {
        shape: BedShape::Circular { diameter: 180.0 },
        origin: BedOrigin::Middle,
    };

    store.save(&first).unwrap();
    store.save(&second).unwrap();
    assert!(store.profile_path(&first.id).exists());

    let mut listed = store.list().unwrap();
    listed.sort_by(|a, b| a.profile_name.cmp(&b.profile_name));
    assert_eq!(listed, {
        let mut expected = vec![first.clone(), second.clone()];
        expected.sort_by(|a, b| a.profile_name.cmp(&b.profile_name));
        expected
    });

    store.delete(&first.id).unwrap();
    let listed = store.list().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, second.id);
}

#[test]
fn test_store_skips_unreadable_documents() {
    let tmp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let store = JsonProfileStore::new(ProfilePaths::with_root(tmp_dir.path()));
    store.save(&PrinterProfile::new("Ender3")).unwrap();

    std::fs::write(store.profiles_dir().join("garbage.json"), "{ not json").unwrap();
    std::fs::write(store.profiles_dir().join("notes.txt"), "ignored").unwrap();

    let listed = store.list().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].profile_name, "Ender3");
}

#[test]
fn test_registry_load_from_store() {
    let tmp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let store = JsonProfileStore::new(ProfilePaths::with_root(tmp_dir.path()));
    store.save(&PrinterProfile::new("Ender3")).unwrap();
    // Same name with different case: only one can be registered
    store.save(&PrinterProfile::new("ENDER3")).unwrap();
    store.save(&PrinterProfile::new("CR-10")).unwrap();

    let registry = ProfileRegistry::load(&store).unwrap();
    assert_eq!(registry.len(), 2);
    assert!(registry.active().is_some());
    assert!(registry.find_by_name("cr-10").is_some());
}
