// crates/pmc-rs-export/tests/export_all.rs
mod common;

use common::Device;
use pmc_rs_export::pmvs::load_products;
use pmc_rs_export::xlsx::Cell;
use pmc_rs_export::xlsx::can::{SHEET, can_book};
use pmc_rs_export::{ExportConfig, export_all};

#[test]
fn writes_every_output() {
    let device = Device::new();
    let dir = tempfile::tempdir().expect("tempdir");
    let config = ExportConfig::new(dir.path().join("out"));

    let written = export_all(&device.models, &config).expect("export");
    for name in [
        "c/interface.c",
        "c/interface.h",
        "c/bitfields.c",
        "c/bitfields.h",
        "c/sunspecInterfaceGen64100.c",
        "c/staticmodbusInterfaceGen.h",
        "can.sym",
        "hierarchy.json",
        "smdx_64100.xml",
        "sunspec.xlsx",
        "anomalies.xlsx",
        "can.xlsx",
    ] {
        let path = config.out_dir.join(name);
        assert!(path.is_file(), "{name} was not written");
        assert!(written.contains(&path), "{name} missing from the returned paths");
    }

    let header = std::fs::read_to_string(config.out_dir.join("c/interface.h")).expect("read");
    assert!(header.starts_with(&format!("/* {} */\n", config.banner)), "{header}");
    assert!(header.contains("#ifndef INTERFACE_H\n#define INTERFACE_H\n"));
}

#[test]
fn can_sheet_carries_product_values() {
    let device = Device::new();
    let dir = tempfile::tempdir().expect("tempdir");
    std::fs::write(
        dir.path().join("b.pmvs"),
        format!(r#"{{"values": {{"{}": "60"}}}}"#, device.frequency),
    )
    .expect("write");
    std::fs::write(
        dir.path().join("a.pmvs"),
        format!(r#"{{"name": "Europe", "values": {{"{}": "50.00"}}}}"#, device.frequency),
    )
    .expect("write");

    let products = load_products(dir.path()).expect("products");
    let names: Vec<&str> = products.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["Europe", "b"]);

    let book = can_book(&device.models.lookup(), device.models.can.tree(), &products);
    let sheet = book.sheet(SHEET).expect("sheet");
    assert_eq!(sheet.rows.len(), 1);
    assert_eq!(sheet.cell(0, "Signal").and_then(Cell::text), Some("Frequency"));
    assert_eq!(sheet.cell(0, "Message").and_then(Cell::text), Some("Status"));
    assert_eq!(sheet.cell(0, "Access Level").and_then(Cell::text), Some("factory"));
    assert_eq!(sheet.cell(0, "Path").and_then(Cell::text), Some("Grid/Frequency"));
    assert_eq!(sheet.cell(0, "Europe").and_then(Cell::text), Some("50"));
    assert_eq!(sheet.cell(0, "b").and_then(Cell::text), Some("60"));
}
