// crates/pmc-rs-export/src/xlsx/sunspec.rs
//! One sheet per SunSpec model listing its registers.

use pmc_rs::{Lookup, Node, NodeKind, Tree};

use super::book::{Book, Cell, Sheet};
use crate::error::Result;
use crate::registers::{Register, model_id, sunspec_registers};

pub const COLUMNS: &[&str] = &[
    "Address Offset",
    "Block Offset",
    "Size",
    "Name",
    "Label",
    "Value",
    "Type",
    "Units",
    "SF",
    "R/W",
    "Mandatory",
    "Description",
];

/// Point id of a register: its parameter's abbreviation, or the point name.
pub fn point_id(lookup: &Lookup, point: &Node) -> String {
    point
        .uuid_attr("parameter_uuid")
        .and_then(|p| lookup.parameter_str(p, "abbreviation"))
        .filter(|a| !a.is_empty())
        .unwrap_or_else(|| point.name())
}

/// Scale-factor reference of a register: the point id of its factor point.
pub fn scale_factor(lookup: &Lookup, tree: &Tree, register: &Register) -> Option<String> {
    register
        .factor()
        .and_then(|f| tree.get(f))
        .map(|f| point_id(lookup, f))
}

pub fn read_only(lookup: &Lookup, register: &Register) -> bool {
    register
        .parameter()
        .and_then(|p| lookup.parameter_attribute(p, "read_only"))
        .and_then(|v| v.as_bool())
        .unwrap_or(true)
}

fn parameter_text(lookup: &Lookup, register: &Register, name: &str) -> Option<String> {
    register
        .parameter()
        .and_then(|p| lookup.parameter_str(p, name))
        .filter(|t| !t.is_empty())
}

pub fn model_sheet(lookup: &Lookup, tree: &Tree, model: &Node) -> Result<Sheet> {
    let lookup = lookup.with(tree);
    let id = model_id(model);
    let length = model.attr("length").and_then(|v| v.as_integer()).unwrap_or(0);
    let mut sheet = Sheet::new(format!("{id} {}", model.name()).trim().to_string(), COLUMNS).wrap("Description");

    let registers = sunspec_registers(&lookup, tree, model.uuid)?;
    let mut header_index = 0;
    for register in &registers {
        let value = if register.header {
            header_index += 1;
            match header_index {
                1 => Cell::from(id),
                2 => Cell::from(length),
                _ => Cell::Empty,
            }
        } else {
            Cell::Empty
        };
        let label = register
            .parameter()
            .map(|p| lookup.name_of(p))
            .filter(|n| !n.is_empty());
        sheet.push(vec![
            register.offset.into(),
            register.block_offset.into(),
            register.size.into(),
            point_id(&lookup, register.point).into(),
            label.into(),
            value,
            register.point_type.name().into(),
            register.units().or_else(|| parameter_text(&lookup, register, "units")).into(),
            scale_factor(&lookup, tree, register).into(),
            if read_only(&lookup, register) { "R" } else { "RW" }.into(),
            if register.flag("mandatory") || register.header { "M" } else { "O" }.into(),
            parameter_text(&lookup, register, "description").into(),
        ]);
    }
    Ok(sheet)
}

/// A workbook with one sheet per SunSpec model.
pub fn sunspec_book(lookup: &Lookup, tree: &Tree) -> Result<Book> {
    let sheets = tree
        .nodes_of_kind(NodeKind::SunSpecModel)
        .map(|model| model_sheet(lookup, tree, model))
        .collect::<Result<Vec<_>>>()?;
    Ok(Book { sheets })
}
