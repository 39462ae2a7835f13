// crates/pmc-rs-export/src/c/sunspec.rs
//! Register tables of SunSpec models and skeletons for hand-coded points.

use pmc_rs::{Lookup, Node, NodeKind, Tree};

use super::bitfields;
use crate::error::Result;
use crate::names::{c_identifier, interface_item, uses_interface_item};
use crate::nested::Nested;
use crate::registers::{Register, model_id, sunspec_registers};
use crate::templates::CFile;

pub fn base_name(id: i64) -> String {
    format!("sunspecInterfaceGen{id}")
}

/// `SUNSPEC_TYPE_UINT16` and friends.
pub fn type_constant(register: &Register) -> String {
    format!("SUNSPEC_TYPE_{}", register.point_type.name().to_ascii_uppercase())
}

/// Name of a hand-coded accessor of `point`.
fn manual_function(base: &str, point: &Node, suffix: &str) -> String {
    format!("{base}_{}_{suffix}", c_identifier(&point.name()))
}

/// The interface item of the parameter behind `point`, if it has one.
fn point_item(lookup: &Lookup, point: &Node) -> Option<String> {
    point
        .uuid_attr("parameter_uuid")
        .filter(|p| uses_interface_item(lookup, *p))
        .map(|p| interface_item(lookup, p))
}

/// One `{ ... }` entry of a register table.
pub(crate) fn entry(lookup: &Lookup, tree: &Tree, base: &str, register: &Register) -> Vec<Nested> {
    let point = register.point;
    let mut fields = vec![
        Nested::line(format!(".offset = {},", register.offset)),
        Nested::line(format!(".size = {},", register.size)),
        Nested::line(format!(".type = {},", type_constant(register))),
    ];
    if register.flag("not_implemented") {
        fields.push(Nested::line(".implemented = false,"));
    } else if matches!(point.kind(), NodeKind::DataPointBitfield | NodeKind::FunctionDataBitfield) {
        let accessors = bitfields::function_base(tree, point.uuid);
        fields.push(Nested::line(format!(".getter = {accessors}_get,")));
        fields.push(Nested::line(format!(".setter = {accessors}_set,")));
    } else {
        let getter = register.flag("hand_coded_getter");
        let setter = register.flag("hand_coded_setter");
        if getter {
            fields.push(Nested::line(format!(".getter = {},", manual_function(base, point, "get"))));
        }
        if setter {
            fields.push(Nested::line(format!(".setter = {},", manual_function(base, point, "set"))));
        }
        if !(getter && setter) {
            fields.push(Nested::line(format!(
                ".item = {},",
                super::address_or_null(point_item(lookup, point))
            )));
        }
    }
    let factor = register
        .factor()
        .and_then(|f| tree.get(f))
        .and_then(|f| point_item(lookup, f));
    fields.push(Nested::line(format!(".scaleFactor = {},", super::address_or_null(factor))));

    vec![Nested::line("{"), Nested::Block(fields), Nested::line("},")]
}

fn hand_coded<'a>(registers: &[Register<'a>]) -> Vec<(&'a Node, bool, bool)> {
    let mut seen = std::collections::HashSet::new();
    registers
        .iter()
        .filter(|r| !r.flag("not_implemented"))
        .map(|r| (r.point, r.flag("hand_coded_getter"), r.flag("hand_coded_setter")))
        .filter(|(p, g, s)| (*g || *s) && seen.insert(p.uuid))
        .collect()
}

/// The four files of one SunSpec model.
pub fn generate(lookup: &Lookup, tree: &Tree, model: &Node) -> Result<Vec<CFile>> {
    let id = model_id(model);
    let base = base_name(id);
    let lookup = lookup.with(tree);
    let registers = sunspec_registers(&lookup, tree, model.uuid)?;
    let length = model.attr("length").and_then(|v| v.as_integer()).unwrap_or(0);
    let manual = hand_coded(&registers);
    let upper = base.to_ascii_uppercase();

    // Register table
    let mut table = Vec::new();
    for register in &registers {
        table.extend(entry(&lookup, tree, &base, register));
    }
    let mut source = CFile::new(format!("{base}.c"))
        .include(format!("{base}.h"))
        .include("interface.h")
        .include("bitfields.h");
    if !manual.is_empty() {
        source = source.include(format!("{base}_manual.h"));
    }
    source.body = vec![
        Nested::line(format!("const SunspecInterfaceItem {base}[{}] = {{", registers.len())),
        Nested::Block(table),
        Nested::line("};"),
    ];

    let mut header = CFile::new(format!("{base}.h"))
        .include("<stdint.h>")
        .include("sunspecInterface.h");
    header.body = vec![
        Nested::line(format!("#define {upper}_ID {id}")),
        Nested::line(format!("#define {upper}_LENGTH {length}")),
        Nested::line(format!("#define {upper}_COUNT {}", registers.len())),
        Nested::blank(),
        Nested::line(format!("extern const SunspecInterfaceItem {base}[{upper}_COUNT];")),
    ];

    // Hand-coded accessors
    let mut manual_source = CFile::new(format!("{base}_manual.c"))
        .include(format!("{base}_manual.h"))
        .include("interface.h");
    let mut manual_header = CFile::new(format!("{base}_manual.h")).include("<stdint.h>");
    for (point, getter, setter) in &manual {
        let path = tree.name_path(point.uuid).join("/");
        if *getter {
            let name = manual_function(&base, point, "get");
            manual_header.body.push(Nested::line(format!("int32_t {name}(uint16_t *registers);")));
            manual_source.body.extend([
                Nested::line(format!("// {path}: hand-coded")),
                Nested::line(format!("int32_t {name}(uint16_t *registers)")),
                Nested::line("{"),
                Nested::Block(vec![Nested::line("(void) registers;"), Nested::line("return -1;")]),
                Nested::line("}"),
                Nested::blank(),
            ]);
        }
        if *setter {
            let name = manual_function(&base, point, "set");
            manual_header.body.push(Nested::line(format!("int32_t {name}(const uint16_t *registers);")));
            manual_source.body.extend([
                Nested::line(format!("// {path}: hand-coded")),
                Nested::line(format!("int32_t {name}(const uint16_t *registers)")),
                Nested::line("{"),
                Nested::Block(vec![Nested::line("(void) registers;"), Nested::line("return -1;")]),
                Nested::line("}"),
                Nested::blank(),
            ]);
        }
    }

    Ok(vec![source, header, manual_source, manual_header])
}
