// crates/pmc-rs-export/src/c/staticmodbus.rs
//! `staticmodbusInterfaceGen.c/.h`: the fixed Modbus register map.

use pmc_rs::{Lookup, Tree};

use super::sunspec::entry;
use crate::error::Result;
use crate::nested::Nested;
use crate::registers::modbus_registers;
use crate::templates::CFile;

pub const BASE: &str = "staticmodbusInterfaceGen";

pub fn generate(lookup: &Lookup, tree: &Tree) -> Result<[CFile; 2]> {
    let lookup = lookup.with(tree);
    let registers = modbus_registers(&lookup, tree)?;
    let length: i64 = registers.iter().map(|r| r.size).sum();

    let mut table = Vec::new();
    for register in &registers {
        table.extend(entry(&lookup, tree, BASE, register));
    }
    let mut source = CFile::new(format!("{BASE}.c"))
        .include(format!("{BASE}.h"))
        .include("interface.h")
        .include("bitfields.h");
    source.body = vec![
        Nested::line(format!("const SunspecInterfaceItem {BASE}[{}] = {{", registers.len())),
        Nested::Block(table),
        Nested::line("};"),
    ];

    let mut header = CFile::new(format!("{BASE}.h"))
        .include("<stdint.h>")
        .include("sunspecInterface.h");
    header.body = vec![
        Nested::line(format!("#define STATICMODBUSINTERFACEGEN_LENGTH {length}")),
        Nested::line(format!("#define STATICMODBUSINTERFACEGEN_COUNT {}", registers.len())),
        Nested::blank(),
        Nested::line(format!("extern const SunspecInterfaceItem {BASE}[STATICMODBUSINTERFACEGEN_COUNT];")),
    ];
    Ok([source, header])
}
