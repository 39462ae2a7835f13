// crates/pmc-rs-export/tests/smdx_roundtrip.rs
mod common;

use std::path::PathBuf;

use pmc_rs::Models;
use pmc_rs_export::smdx::{import_smdx, smdx_model};
use pmc_rs_smdx::{Access, load_smdx_model, save_smdx_to_string};

fn smdx_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../pmc-rs-smdx/tests/data")
}

#[test]
fn imported_model_exports_the_same_registers() {
    common::init_logging();
    let original = load_smdx_model(&[smdx_dir()], 64010).expect("load");

    let mut models = Models::new();
    let model = import_smdx(&mut models, &original).expect("import");

    let lookup = models.lookup();
    let tree = models.sunspec.tree();
    let exported = smdx_model(&lookup, tree, tree.node(model).expect("model")).expect("export");

    assert_eq!(exported.id, 64010);
    assert_eq!(exported.name, "curve_settings");
    assert_eq!(exported.length, original.length);

    let before: Vec<_> = original.points().collect();
    let after: Vec<_> = exported.points().collect();
    assert_eq!(after.len(), before.len());
    for (a, b) in after.iter().zip(&before) {
        assert_eq!(a.id, b.id);
        assert_eq!(a.offset, b.offset, "offset of {}", a.id);
        assert_eq!(a.point_type, b.point_type, "type of {}", a.id);
        assert_eq!(a.size, b.size, "size of {}", a.id);
        assert_eq!(a.scale_factor, b.scale_factor, "scale factor of {}", a.id);
        assert_eq!(a.access, b.access, "access of {}", a.id);
        assert_eq!(a.mandatory, b.mandatory, "mandatory of {}", a.id);
    }

    let ena = exported.point("Ena").expect("Ena");
    assert_eq!(ena.access, Access::ReadWrite);
    let symbols: Vec<(&str, i64)> = ena.symbols.iter().map(|s| (s.id.as_str(), s.value)).collect();
    assert_eq!(symbols, vec![("DISABLED", 0), ("ENABLED", 1)]);
    assert_eq!(exported.point("WMax").and_then(|p| p.units.as_deref()), Some("W"));
    assert_eq!(exported.point("WMax").and_then(|p| p.label.as_deref()), Some("Maximum Power"));

    let xml = save_smdx_to_string(&exported).expect("save");
    assert!(xml.contains(r#"<model id="64010" len="8" name="curve_settings">"#), "{xml}");
}
