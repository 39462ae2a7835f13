// crates/pmc-rs-export/src/c/bitfields.rs
//! `bitfields.c` / `bitfields.h`: packing accessors for bitfield points.

use pmc_rs::layout::resolve_point_type;
use pmc_rs::{Lookup, Node, NodeKind, Tree};
use uuid::Uuid;

use crate::error::{ExportError, Result};
use crate::names::{c_identifier, interface_item};
use crate::nested::Nested;
use crate::templates::CFile;

pub const SOURCE: &str = "bitfields.c";
pub const HEADER: &str = "bitfields.h";

/// Base name of a bitfield's accessors: `bitfield_` and its path in its tree.
pub fn function_base(tree: &Tree, bitfield: Uuid) -> String {
    let path: Vec<String> = tree
        .name_path(bitfield)
        .into_iter()
        .filter(|p| !p.is_empty())
        .collect();
    format!(
        "bitfield_{}_{}",
        tree.kind().name(),
        c_identifier(&path.join("_"))
    )
}

fn int_attr(node: &Node, name: &str) -> i64 {
    node.attr(name).and_then(|v| v.as_integer()).unwrap_or(0)
}

fn mask(bits: i64) -> String {
    let mask = if bits >= 64 { u64::MAX } else { (1u64 << bits) - 1 };
    format!("0x{mask:X}u")
}

fn accessors(lookup: &Lookup, tree: &Tree, bitfield: &Node) -> Result<(Vec<Nested>, Vec<Nested>)> {
    let c_type = resolve_point_type(lookup, bitfield.uuid, bitfield.uuid_attr("type_uuid"))?.c_type();
    let base = function_base(tree, bitfield.uuid);

    let mut get = Vec::new();
    let mut set = Vec::new();
    for member in tree.child_nodes(bitfield.uuid) {
        let parameter = member.uuid_attr("parameter_uuid").ok_or(ExportError::MissingParameter {
            uuid: member.uuid,
            kind: member.kind(),
        })?;
        let item = interface_item(lookup, parameter);
        let offset = int_attr(member, "bit_offset");
        let mask = mask(int_attr(member, "bit_length"));
        get.push(Nested::line(format!(
            "value |= (({c_type}) InterfaceItem_getRaw(&{item}) & {mask}) << {offset};"
        )));
        set.push(Nested::line(format!(
            "InterfaceItem_setRaw(&{item}, (value >> {offset}) & {mask});"
        )));
    }

    let mut get_body = vec![Nested::line(format!("{c_type} value = 0;"))];
    get_body.extend(get);
    get_body.push(Nested::line("return value;"));

    let definitions = vec![
        Nested::line(format!("{c_type} {base}_get(void)")),
        Nested::line("{"),
        Nested::Block(get_body),
        Nested::line("}"),
        Nested::blank(),
        Nested::line(format!("void {base}_set({c_type} value)")),
        Nested::line("{"),
        Nested::Block(set),
        Nested::line("}"),
        Nested::blank(),
    ];
    let declarations = vec![
        Nested::line(format!("{c_type} {base}_get(void);")),
        Nested::line(format!("void {base}_set({c_type} value);")),
    ];
    Ok((definitions, declarations))
}

/// Accessors for every bitfield of `trees`.
pub fn generate(lookup: &Lookup, trees: &[&Tree]) -> Result<[CFile; 2]> {
    let mut source = CFile::new(SOURCE).include(HEADER).include("interface.h");
    let mut header = CFile::new(HEADER).include("<stdint.h>");
    for tree in trees {
        let lookup = lookup.with(tree);
        for node in tree.iter() {
            if matches!(node.kind(), NodeKind::DataPointBitfield | NodeKind::FunctionDataBitfield) {
                let (definitions, declarations) = accessors(&lookup, tree, node)?;
                source.body.extend(definitions);
                header.body.extend(declarations);
            }
        }
    }
    Ok([source, header])
}
