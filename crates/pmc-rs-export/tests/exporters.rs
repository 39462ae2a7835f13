// crates/pmc-rs-export/tests/exporters.rs
mod common;

use common::{Device, message, parameter, set, signal};
use pmc_rs::{Models, NodeKind, TreeKind};
use pmc_rs_export::c;
use pmc_rs_export::hierarchy::hierarchy;
use pmc_rs_export::sym::export_sym;
use pmc_rs_export::xlsx::Cell;
use pmc_rs_export::xlsx::anomalies::{ANOMALIES, RESPONSE_LEVELS, TRIGGER_TYPES, anomalies_book};
use pmc_rs_export::xlsx::sunspec::model_sheet;
use pmc_rs_export::{ExportError, Templates};
use serde_json::json;

#[test]
fn signal_comment_ends_with_access_level() {
    let device = Device::new();
    let sym = export_sym(&device.models, "pmc").expect("sym");

    let var = sym
        .lines()
        .find(|l| l.starts_with("Var=Frequency "))
        .unwrap_or_else(|| panic!("no Frequency signal in\n{sym}"));
    assert!(var.starts_with("Var=Frequency unsigned 0,16"), "{var}");
    assert!(var.ends_with("// Grid frequency <factory>"), "{var}");
    assert!(sym.starts_with("FormatVersion=5.0 // Do not edit this line!\nTitle=\"pmc\"\n"));
    assert!(sym.contains("[Status]\nID=001h\nDLC=2\n"), "{sym}");
}

#[test]
fn signal_past_message_end_is_rejected() {
    common::init_logging();
    let mut models = Models::new();
    let root = models.parameters.root();
    let temperature = parameter(&mut models, root, "Temperature");
    let status = message(&mut models, "Status", 2);
    signal(&mut models, status, temperature, 12, 8);

    let error = export_sym(&models, "pmc").expect_err("signal overruns the message");
    assert!(matches!(error, ExportError::SignalOutsideMessage { .. }), "{error}");
    let text = error.to_string();
    assert!(text.contains("[0, 15]"), "{text}");
    assert!(text.contains("[12, 19]"), "{text}");
    assert!(text.contains("Status/Temperature"), "{text}");
}

#[test]
fn sunspec_sheet_names_scale_factor_point() {
    let device = Device::new();
    let lookup = device.models.lookup();
    let tree = device.models.sunspec.tree();
    let model = tree.node(device.model).expect("model");
    let sheet = model_sheet(&lookup, tree, model).expect("sheet");

    assert_eq!(sheet.name, "64100 inverter");
    assert_eq!(sheet.rows.len(), 4);
    let row = (0..sheet.rows.len())
        .find(|r| sheet.cell(*r, "Name").and_then(Cell::text) == Some("A"))
        .expect("current row");
    assert_eq!(sheet.cell(row, "SF").and_then(Cell::text), Some("ISF"));
    assert_eq!(sheet.cell(row, "Address Offset"), Some(&Cell::Number(2.0)));
    assert_eq!(sheet.cell(row, "Type").and_then(Cell::text), Some("uint16"));
    assert_eq!(sheet.cell(row, "Units").and_then(Cell::text), Some("A"));

    // Header: model id, then the body length.
    assert_eq!(sheet.cell(0, "Value"), Some(&Cell::Number(64100.0)));
    assert_eq!(sheet.cell(1, "Value"), Some(&Cell::Number(2.0)));
    assert_eq!(sheet.cell(0, "Mandatory").and_then(Cell::text), Some("M"));
}

#[test]
fn interface_items_skip_legacy_parameters() {
    let device = Device::new();
    let files = c::generate(&device.models).expect("generate");
    let templates = Templates::new(None).expect("templates");
    let header = files.iter().find(|f| f.name == "interface.h").expect("interface.h");
    let source = files.iter().find(|f| f.name == "interface.c").expect("interface.c");
    let header = templates.render(header, "banner").expect("render");
    let source = templates.render(source, "banner").expect("render");

    assert!(header.contains("extern InterfaceItem_int16 interfaceItem_Grid_Frequency;"), "{header}");
    assert!(header.contains("extern InterfaceItem_int16 interfaceItem_Grid_Current_Scale;"));
    assert!(!header.contains("Legacy"));
    assert!(source.contains("#include \"interface.h\""));
    assert!(source.contains("// Grid/Frequency\nInterfaceItem_int16 interfaceItem_Grid_Frequency = {\n"));
    assert!(source.contains("        .accessLevel = 1,\n"), "{source}");
}

#[test]
fn sunspec_model_sources_reference_items() {
    let device = Device::new();
    let files = c::generate(&device.models).expect("generate");
    let names: Vec<&str> = files.iter().map(|f| f.name.as_str()).collect();
    for expected in [
        "sunspecInterfaceGen64100.c",
        "sunspecInterfaceGen64100.h",
        "sunspecInterfaceGen64100_manual.c",
        "sunspecInterfaceGen64100_manual.h",
    ] {
        assert!(names.contains(&expected), "{expected} missing from {names:?}");
    }

    let templates = Templates::new(None).expect("templates");
    let source = files
        .iter()
        .find(|f| f.name == "sunspecInterfaceGen64100.c")
        .map(|f| templates.render(f, "banner"))
        .expect("source")
        .expect("render");
    assert!(source.contains(".offset = 2,"), "{source}");
    assert!(source.contains(".type = SUNSPEC_TYPE_UINT16,"));
    assert!(source.contains(".item = &interfaceItem_Grid_Current,"));
    assert!(source.contains(".scaleFactor = &interfaceItem_Grid_Current_Scale,"));
}

#[test]
fn hierarchy_maps_parameters_to_signals() {
    let device = Device::new();
    let value = hierarchy(&device.models).expect("hierarchy");
    assert_eq!(value, json!({ "Grid": { "Frequency": ["Status", "Frequency"] } }));
}

#[test]
fn anomalies_book_lists_sources() {
    let mut device = Device::new();
    let models = &mut device.models;
    let root = models.anomalies.root();
    let table = models
        .add_child(TreeKind::Anomalies, root, NodeKind::AnomalyTable)
        .expect("table");
    set(models, TreeKind::Anomalies, table, "name", "Grid");
    let anomaly = models
        .add_child(TreeKind::Anomalies, table, NodeKind::Anomaly)
        .expect("anomaly");
    set(models, TreeKind::Anomalies, anomaly, "name", "Over Frequency");
    set(models, TreeKind::Anomalies, anomaly, "code", 7);
    models
        .anomalies
        .set_attribute_text(anomaly, "response_level_active", "fault")
        .expect("level");
    let source = models
        .add_child(TreeKind::Anomalies, anomaly, NodeKind::AnomalySource)
        .expect("source");
    set(models, TreeKind::Anomalies, source, "parameter_uuid", device.frequency);

    let book = anomalies_book(&device.models.lookup(), device.models.anomalies.tree());
    let names: Vec<&str> = book.sheets.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec![ANOMALIES, RESPONSE_LEVELS, TRIGGER_TYPES]);

    let sheet = book.sheet(ANOMALIES).expect("anomalies");
    assert_eq!(sheet.rows.len(), 1);
    assert_eq!(sheet.cell(0, "Table").and_then(Cell::text), Some("Grid"));
    assert_eq!(sheet.cell(0, "Name").and_then(Cell::text), Some("Over Frequency"));
    assert_eq!(sheet.cell(0, "Code"), Some(&Cell::Number(7.0)));
    assert_eq!(sheet.cell(0, "Response Level Active").and_then(Cell::text), Some("fault"));
    assert_eq!(sheet.cell(0, "Parameter").and_then(Cell::text), Some("Frequency"));
    assert_eq!(book.sheet(RESPONSE_LEVELS).map(|s| s.rows.len()), Some(4));
}
