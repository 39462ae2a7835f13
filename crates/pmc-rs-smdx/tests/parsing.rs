// crates/pmc-rs-smdx/tests/parsing.rs

use pmc_rs::PointType;
use pmc_rs_smdx::{
    Access, BlockKind, SmdxError, load_smdx_from_str, load_smdx_model, save_smdx_to_string,
};
use std::fs;
use std::path::PathBuf;

fn data_dir() -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("data");
    path
}

/// Helper function to load a test file from the `tests/data/` directory.
fn load_test_file(name: &str) -> String {
    let path = data_dir().join(name);
    fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to read test file {:?}: {}", path, e))
}

#[test]
fn test_parse_points_symbols_and_strings() {
    let model = load_smdx_from_str(&load_test_file("smdx_64010.xml")).expect("Failed to parse SMDX");

    assert_eq!(model.id, 64010);
    assert_eq!(model.name, "curve_settings");
    assert_eq!(model.length, 8);
    assert_eq!(model.label.as_deref(), Some("Curve Settings"));
    assert_eq!(model.notes, None, "Empty <notes/> must read as absent");

    assert_eq!(model.blocks.len(), 2);
    assert_eq!(model.blocks[1].kind, BlockKind::Repeating);

    let ena = model.point("Ena").expect("Ena");
    assert_eq!(ena.point_type, PointType::Enum16);
    assert_eq!(ena.access, Access::ReadWrite);
    assert!(ena.mandatory);
    assert_eq!(ena.label.as_deref(), Some("Enable"));
    let symbols: Vec<(&str, i64)> = ena.symbols.iter().map(|s| (s.id.as_str(), s.value)).collect();
    assert_eq!(symbols, vec![("DISABLED", 0), ("ENABLED", 1)]);
    assert_eq!(ena.symbols[1].label.as_deref(), Some("Enabled"));

    let hz = model.point("Hz").expect("Hz");
    assert_eq!((hz.offset, hz.size), (4, 2));
    assert_eq!(hz.scale_factor_point(), Some("Hz_SF"));
    assert_eq!(hz.units.as_deref(), Some("Hz"));
}

#[test]
fn test_round_trip() {
    let first = load_smdx_from_str(&load_test_file("smdx_64010.xml")).expect("parse");
    let xml = save_smdx_to_string(&first).expect("save");
    let second = load_smdx_from_str(&xml).expect("parse saved");
    assert_eq!(first, second, "SmdxModel mismatch after round-trip");
}

#[test]
fn test_load_from_search_path() {
    let empty = tempfile::tempdir().expect("tempdir");
    let search = vec![empty.path().to_path_buf(), data_dir()];
    let model = load_smdx_model(&search, 64010).expect("found on second directory");
    assert_eq!(model.points().count(), 7);

    let missing = load_smdx_model(&search, 1);
    assert!(matches!(missing, Err(SmdxError::ModelNotFound { id: 1, .. })));
}

#[test]
fn test_unknown_scale_factor_is_rejected() {
    let xml = load_test_file("smdx_64010.xml").replace(r#"sf="W_SF""#, r#"sf="Nope_SF""#);
    let result = load_smdx_from_str(&xml);
    assert!(
        matches!(&result, Err(SmdxError::UnknownScaleFactor { point, .. }) if point == "WMax"),
        "got {:?}",
        result
    );
}

#[test]
fn test_constant_scale_factor_is_accepted() {
    let xml = load_test_file("smdx_64010.xml").replace(r#"sf="W_SF""#, r#"sf="-2""#);
    let model = load_smdx_from_str(&xml).expect("constant sf");
    let w = model.point("WMax").expect("WMax");
    assert_eq!(w.scale_factor.as_deref(), Some("-2"));
    assert_eq!(w.scale_factor_point(), None);
}
