// crates/pmc-rs/src/behavior/staticmodbus.rs
//! Static Modbus tree: one flat register map under the root.

use super::sunspec::{check_layout_drift, check_member, check_point};
use super::{Behavior, generic_move, is_generated, refused_drop};
use crate::check::Finding;
use crate::error::PmError;
use crate::expand;
use crate::expand::staticmodbus::ModbusFamily;
use crate::layout::{self, PointType};
use crate::models::Lookup;
use crate::schema::NodeKind;
use crate::schema::kinds::staticmodbus::{
    FunctionData, FunctionDataBitfield, FunctionDataBitfieldMember, ModbusTable,
};
use crate::tree::{Node, Subtree, Tree};

pub struct StaticModbusBehavior;

impl Behavior for StaticModbusBehavior {
    fn can_drop_on(&self, tree: &Tree, target: &Node, source: &Node) -> bool {
        if tree.contains(source.uuid) {
            return (source.kind() == NodeKind::ModbusTableRepeatingBlock
                && target.kind() == NodeKind::StaticModbusRoot)
                || generic_move(tree, target, source);
        }
        if is_generated(tree, target.uuid) {
            return false;
        }
        match (source.kind(), target.kind()) {
            (NodeKind::Table, NodeKind::StaticModbusRoot) => true,
            (k, NodeKind::StaticModbusRoot | NodeKind::FunctionDataBitfield) => k.is_parameter_like(),
            _ => false,
        }
    }

    fn internal_move(&self, tree: &Tree, target: &Node, source: &Node) -> bool {
        source.kind() != NodeKind::ModbusTableRepeatingBlock && generic_move(tree, target, source)
    }

    fn child_from(&self, tree: &Tree, target: &Node, source: &Node, lookup: &Lookup) -> Result<Subtree, PmError> {
        match (source.kind(), target.kind()) {
            (NodeKind::ModbusTableRepeatingBlock, NodeKind::StaticModbusRoot) => {
                Ok(layout::new_modbus_reference(tree, source.uuid))
            }
            (NodeKind::Table, NodeKind::StaticModbusRoot) => {
                let params = lookup.tree_of(source.uuid).ok_or(PmError::NotFound(source.uuid))?;
                let view = ModbusTable {
                    parameter_table_uuid: Some(source.uuid),
                };
                expand::seeded_view(&ModbusFamily, view.into(), params, source.uuid)
            }
            (k, NodeKind::FunctionDataBitfield) if k.is_parameter_like() => {
                let bit_offset = tree
                    .child_nodes(target.uuid)
                    .filter_map(|m| m.get::<FunctionDataBitfieldMember>())
                    .map(|m| m.bit_offset + m.bit_length)
                    .max()
                    .unwrap_or(0);
                Ok(Subtree::new(FunctionDataBitfieldMember {
                    name: source.name(),
                    parameter_uuid: Some(source.uuid),
                    bit_offset,
                    bit_length: 1,
                }))
            }
            (k, NodeKind::StaticModbusRoot) if k.is_parameter_like() => Ok(Subtree::new(FunctionData {
                name: source.name(),
                parameter_uuid: Some(source.uuid),
                size: 1,
                units: lookup.effective_str(source.uuid, "units"),
                ..Default::default()
            })),
            _ => Err(refused_drop(source, target)),
        }
    }

    fn addable_types(&self, tree: &Tree, node: &Node) -> Vec<NodeKind> {
        if is_generated(tree, node.uuid) {
            return Vec::new();
        }
        match node.kind() {
            NodeKind::StaticModbusRoot => vec![NodeKind::FunctionData, NodeKind::FunctionDataBitfield],
            NodeKind::FunctionDataBitfield => vec![NodeKind::FunctionDataBitfieldMember],
            _ => Vec::new(),
        }
    }

    fn new_child(&self, _tree: &Tree, parent: &Node, kind: NodeKind, lookup: &Lookup) -> Result<Subtree, PmError> {
        let child = match kind {
            NodeKind::FunctionData => Subtree::new(FunctionData {
                name: "New Function Data".into(),
                size: 1,
                ..Default::default()
            }),
            NodeKind::FunctionDataBitfield => Subtree::new(FunctionDataBitfield {
                name: "New Bitfield".into(),
                type_uuid: layout::point_type_uuid(lookup, PointType::Bitfield16),
                size: 1,
                ..Default::default()
            }),
            NodeKind::FunctionDataBitfieldMember => Subtree::new(FunctionDataBitfieldMember {
                name: "New Member".into(),
                bit_length: 1,
                ..Default::default()
            }),
            other => {
                return Err(PmError::IllegalChild {
                    parent: parent.kind(),
                    child: other,
                });
            }
        };
        Ok(child)
    }

    fn can_delete(&self, tree: &Tree, node: &Node) -> bool {
        node.uuid != tree.root() && !is_generated(tree, node.uuid)
    }

    fn check(&self, tree: &Tree, node: &Node, lookup: &Lookup, findings: &mut Vec<Finding>) {
        match node.kind() {
            NodeKind::StaticModbusRoot => check_layout_drift(tree, node.uuid, findings),
            NodeKind::FunctionData | NodeKind::FunctionDataBitfield => check_point(tree, node, lookup, findings),
            NodeKind::FunctionDataBitfieldMember => check_member(tree, node, findings),
            NodeKind::ModbusTable => {
                if node.uuid_attr("parameter_table_uuid").is_none() {
                    findings.push(Finding::error("table view is not linked to a parameter table"));
                }
            }
            NodeKind::ModbusTableRepeatingBlockReference => {
                if node.uuid_attr("original").is_none() {
                    findings.push(Finding::error("reference does not name a repeating block"));
                }
            }
            _ => {}
        }
    }
}
