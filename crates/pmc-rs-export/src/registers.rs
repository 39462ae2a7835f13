// crates/pmc-rs-export/src/registers.rs
//! Flat register maps of SunSpec models and the static Modbus tree.
//!
//! Repeating-block references are flattened into the points of the block
//! they reference, placed at the reference's offset.

use std::collections::HashMap;

use pmc_rs::layout::{self, PointType};
use pmc_rs::{Lookup, Node, NodeKind, PmError, Tree};
use uuid::Uuid;

/// One laid-out point.
#[derive(Debug, Clone)]
pub struct Register<'a> {
    /// A `DataPoint`, `DataPointBitfield`, `FunctionData` or `FunctionDataBitfield`.
    pub point: &'a Node,
    /// Register address: from the start of the SunSpec model (header
    /// included), or from the start of the static Modbus map.
    pub offset: i64,
    pub block_offset: i64,
    pub size: i64,
    pub point_type: PointType,
    pub header: bool,
    /// The reference this point was reached through, if any.
    pub reference: Option<&'a Node>,
}

impl Register<'_> {
    pub fn parameter(&self) -> Option<Uuid> {
        self.point.uuid_attr("parameter_uuid")
    }

    pub fn factor(&self) -> Option<Uuid> {
        self.point.uuid_attr("factor_uuid")
    }

    pub fn flag(&self, name: &str) -> bool {
        self.point.attr(name).and_then(|v| v.as_bool()).unwrap_or(false)
    }

    pub fn units(&self) -> Option<String> {
        self.point
            .attr("units")
            .and_then(|v| v.as_str().map(str::to_string))
            .filter(|u| !u.is_empty())
    }
}

/// Layout attribute values computed from the tree's current structure.
struct LayoutIndex {
    values: HashMap<(Uuid, &'static str), i64>,
}

impl LayoutIndex {
    fn new(tree: &Tree) -> Self {
        Self {
            values: layout::compute_layout(tree)
                .into_iter()
                .map(|p| ((p.uuid, p.attribute), p.value))
                .collect(),
        }
    }

    fn get(&self, node: &Node, attribute: &'static str) -> i64 {
        self.values
            .get(&(node.uuid, attribute))
            .copied()
            .or_else(|| node.attr(attribute).and_then(|v| v.as_integer()))
            .unwrap_or(0)
    }
}

fn register<'a>(
    lookup: &Lookup,
    tree: &'a Tree,
    point: &'a Node,
    offset: i64,
    block_offset: i64,
    header: bool,
    reference: Option<&'a Node>,
) -> Result<Register<'a>, PmError> {
    let size = layout::checked_size(lookup, tree, point.uuid)?;
    let point_type = layout::resolve_point_type(lookup, point.uuid, point.uuid_attr("type_uuid"))?;
    Ok(Register {
        point,
        offset,
        block_offset,
        size,
        point_type,
        header,
        reference,
    })
}

/// Registers of one SunSpec model in address order.
pub fn sunspec_registers<'a>(lookup: &Lookup, tree: &'a Tree, model: Uuid) -> Result<Vec<Register<'a>>, PmError> {
    let index = LayoutIndex::new(tree);
    let lookup = lookup.with(tree);
    let mut out = Vec::new();
    for block in tree.child_nodes(model) {
        let header = match block.kind() {
            NodeKind::HeaderBlock => true,
            NodeKind::FixedBlock => false,
            _ => continue,
        };
        for child in tree.child_nodes(block.uuid) {
            match child.kind() {
                NodeKind::DataPoint | NodeKind::DataPointBitfield => {
                    let offset = index.get(child, "offset");
                    let block_offset = index.get(child, "block_offset");
                    out.push(register(&lookup, tree, child, offset, block_offset, header, None)?);
                }
                NodeKind::TableRepeatingBlockReference => {
                    let base = index.get(child, "offset");
                    for point_ref in tree.child_nodes(child.uuid) {
                        let original = point_ref
                            .uuid_attr("original")
                            .ok_or(PmError::NotFound(point_ref.uuid))?;
                        let point = tree.node(original)?;
                        let block_offset = index.get(point, "block_offset");
                        out.push(register(
                            &lookup,
                            tree,
                            point,
                            base + block_offset,
                            block_offset,
                            false,
                            Some(child),
                        )?);
                    }
                }
                _ => {}
            }
        }
    }
    Ok(out)
}

/// Registers of the static Modbus map in address order.
pub fn modbus_registers<'a>(lookup: &Lookup, tree: &'a Tree) -> Result<Vec<Register<'a>>, PmError> {
    let index = LayoutIndex::new(tree);
    let lookup = lookup.with(tree);
    let mut out = Vec::new();
    for child in tree.child_nodes(tree.root()) {
        match child.kind() {
            NodeKind::FunctionData | NodeKind::FunctionDataBitfield => {
                let offset = index.get(child, "block_offset");
                out.push(register(&lookup, tree, child, offset, offset, false, None)?);
            }
            NodeKind::ModbusTableRepeatingBlockReference => {
                let base = index.get(child, "block_offset");
                let block = child.uuid_attr("original").ok_or(PmError::NotFound(child.uuid))?;
                for point in tree.child_nodes(block) {
                    if point.kind() != NodeKind::FunctionData {
                        continue;
                    }
                    let block_offset = index.get(point, "block_offset");
                    out.push(register(
                        &lookup,
                        tree,
                        point,
                        base + block_offset,
                        block_offset,
                        false,
                        Some(child),
                    )?);
                }
            }
            _ => {}
        }
    }
    Ok(out)
}

/// The SunSpec model `id` attribute.
pub fn model_id(model: &Node) -> i64 {
    model.attr("id").and_then(|v| v.as_integer()).unwrap_or(0)
}
