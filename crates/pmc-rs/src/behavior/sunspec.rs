// crates/pmc-rs/src/behavior/sunspec.rs
//! SunSpec tree: models, header and fixed blocks, points and table views.

use uuid::Uuid;

use super::{Behavior, generic_move, is_generated, refused_drop};
use crate::check::Finding;
use crate::error::PmError;
use crate::expand;
use crate::expand::sunspec::SunSpecFamily;
use crate::layout::{self, PointType};
use crate::models::Lookup;
use crate::schema::NodeKind;
use crate::schema::kinds::sunspec::{
    DataPoint, DataPointBitfield, DataPointBitfieldMember, FixedBlock, HeaderBlock, SunSpecModel,
    SunSpecTable, TableRepeatingBlockReference,
};
use crate::tree::{Node, Subtree, Tree};

pub struct SunSpecBehavior;

/// A point referencing a parameter-ish node.
pub(crate) fn point_for(source: &Node, lookup: &Lookup) -> DataPoint {
    DataPoint {
        name: source.name(),
        parameter_uuid: Some(source.uuid),
        size: 1,
        units: lookup.effective_str(source.uuid, "units"),
        ..Default::default()
    }
}

/// The `ID` and `L` points every model starts with.
fn header(lookup: &Lookup) -> Subtree {
    let uint16 = layout::point_type_uuid(lookup, PointType::Uint16);
    let point = |name: &str| {
        Subtree::new(DataPoint {
            name: name.into(),
            type_uuid: uint16,
            size: 1,
            mandatory: true,
            ..Default::default()
        })
    };
    Subtree::new(HeaderBlock::default()).child(point("ID")).child(point("L"))
}

impl Behavior for SunSpecBehavior {
    fn can_drop_on(&self, tree: &Tree, target: &Node, source: &Node) -> bool {
        if tree.contains(source.uuid) {
            return (source.kind() == NodeKind::TableRepeatingBlock && target.kind() == NodeKind::FixedBlock)
                || generic_move(tree, target, source);
        }
        if is_generated(tree, target.uuid) {
            return false;
        }
        match (source.kind(), target.kind()) {
            (k, NodeKind::FixedBlock | NodeKind::DataPointBitfield) => k.is_parameter_like(),
            (NodeKind::Table, NodeKind::SunSpecModel) => true,
            _ => false,
        }
    }

    fn internal_move(&self, tree: &Tree, target: &Node, source: &Node) -> bool {
        source.kind() != NodeKind::TableRepeatingBlock && generic_move(tree, target, source)
    }

    fn child_from(&self, tree: &Tree, target: &Node, source: &Node, lookup: &Lookup) -> Result<Subtree, PmError> {
        match (source.kind(), target.kind()) {
            (NodeKind::TableRepeatingBlock, NodeKind::FixedBlock) => {
                Ok(Subtree::new(TableRepeatingBlockReference {
                    original: Some(source.uuid),
                    ..Default::default()
                }))
            }
            (NodeKind::Table, NodeKind::SunSpecModel) => {
                let params = lookup.tree_of(source.uuid).ok_or(PmError::NotFound(source.uuid))?;
                let view = SunSpecTable {
                    parameter_table_uuid: Some(source.uuid),
                };
                expand::seeded_view(&SunSpecFamily, view.into(), params, source.uuid)
            }
            (k, NodeKind::DataPointBitfield) if k.is_parameter_like() => {
                let bit_offset = tree
                    .child_nodes(target.uuid)
                    .filter_map(|m| m.get::<DataPointBitfieldMember>())
                    .map(|m| m.bit_offset + m.bit_length)
                    .max()
                    .unwrap_or(0);
                Ok(Subtree::new(DataPointBitfieldMember {
                    name: source.name(),
                    parameter_uuid: Some(source.uuid),
                    bit_offset,
                    bit_length: 1,
                }))
            }
            (k, NodeKind::FixedBlock) if k.is_parameter_like() => Ok(Subtree::new(point_for(source, lookup))),
            _ => Err(refused_drop(source, target)),
        }
    }

    fn addable_types(&self, tree: &Tree, node: &Node) -> Vec<NodeKind> {
        if is_generated(tree, node.uuid) {
            return Vec::new();
        }
        match node.kind() {
            NodeKind::SunSpecRoot => vec![NodeKind::SunSpecModel],
            NodeKind::SunSpecModel => vec![NodeKind::FixedBlock],
            NodeKind::FixedBlock => vec![NodeKind::DataPoint, NodeKind::DataPointBitfield],
            NodeKind::DataPointBitfield => vec![NodeKind::DataPointBitfieldMember],
            _ => Vec::new(),
        }
    }

    fn new_child(&self, tree: &Tree, parent: &Node, kind: NodeKind, lookup: &Lookup) -> Result<Subtree, PmError> {
        let child = match kind {
            NodeKind::SunSpecModel => {
                let id = tree
                    .nodes_of_kind(NodeKind::SunSpecModel)
                    .filter_map(|m| m.get::<SunSpecModel>())
                    .map(|m| m.id + 1)
                    .max()
                    .unwrap_or(1);
                Subtree::new(SunSpecModel {
                    name: "New Model".into(),
                    id,
                    length: 0,
                })
                .child(header(lookup))
                .child(Subtree::new(FixedBlock::default()))
            }
            NodeKind::FixedBlock => Subtree::new(FixedBlock::default()),
            NodeKind::DataPoint => Subtree::new(DataPoint {
                name: "New Point".into(),
                size: 1,
                ..Default::default()
            }),
            NodeKind::DataPointBitfield => Subtree::new(DataPointBitfield {
                name: "New Bitfield".into(),
                type_uuid: layout::point_type_uuid(lookup, PointType::Bitfield16),
                size: 1,
                ..Default::default()
            }),
            NodeKind::DataPointBitfieldMember => Subtree::new(DataPointBitfieldMember {
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
        if node.uuid == tree.root() || is_generated(tree, node.uuid) {
            return false;
        }
        match node.kind() {
            NodeKind::HeaderBlock => false,
            NodeKind::FixedBlock => tree
                .parent(node.uuid)
                .is_some_and(|m| tree.child_nodes(m).filter(|b| b.kind() == NodeKind::FixedBlock).count() > 1),
            _ => !tree
                .parent_node(node.uuid)
                .is_some_and(|p| p.kind() == NodeKind::HeaderBlock),
        }
    }

    fn check(&self, tree: &Tree, node: &Node, lookup: &Lookup, findings: &mut Vec<Finding>) {
        match node.kind() {
            NodeKind::SunSpecModel => check_model(tree, node, findings),
            NodeKind::DataPoint | NodeKind::DataPointBitfield => check_point(tree, node, lookup, findings),
            NodeKind::DataPointBitfieldMember => check_member(tree, node, findings),
            NodeKind::SunSpecTable => {
                if node.uuid_attr("parameter_table_uuid").is_none() {
                    findings.push(Finding::error("table view is not linked to a parameter table"));
                }
                if !tree.child_nodes(node.uuid).any(|c| c.kind() == NodeKind::TableRepeatingBlock) {
                    findings.push(Finding::information("table view has not been expanded"));
                }
            }
            NodeKind::TableRepeatingBlockReference => {
                if node.uuid_attr("original").is_none() {
                    findings.push(Finding::error("reference does not name a repeating block"));
                }
            }
            _ => {}
        }
    }
}

/// Drift of persisted layout attributes and duplicate model ids.
pub(crate) fn check_layout_drift(tree: &Tree, scope: Uuid, findings: &mut Vec<Finding>) {
    for (placement, stored) in layout::drift(tree) {
        if placement.uuid == scope || tree.is_ancestor(scope, placement.uuid) {
            findings.push(Finding::error(format!(
                "{} of {} is {stored}, layout gives {}",
                placement.attribute,
                tree.get(placement.uuid).map_or_else(String::new, Node::name),
                placement.value
            )));
        }
    }
}

fn check_model(tree: &Tree, node: &Node, findings: &mut Vec<Finding>) {
    check_layout_drift(tree, node.uuid, findings);
    let id = node.attr("id").and_then(|v| v.as_integer());
    if tree
        .nodes_of_kind(NodeKind::SunSpecModel)
        .any(|m| m.uuid != node.uuid && m.attr("id").and_then(|v| v.as_integer()) == id)
    {
        findings.push(Finding::error(format!("model id {} is used twice", id.unwrap_or(0))));
    }
}

/// Type, size and scale-factor checks shared with the static Modbus tree.
pub(crate) fn check_point(tree: &Tree, node: &Node, lookup: &Lookup, findings: &mut Vec<Finding>) {
    let parent_kind = tree.parent_node(node.uuid).map(Node::kind);
    let seed = matches!(parent_kind, Some(NodeKind::SunSpecTable | NodeKind::ModbusTable));
    match layout::checked_size(lookup, tree, node.uuid) {
        Ok(_) => {}
        Err(PmError::TypeNotFound { .. }) if seed => {
            findings.push(Finding::warning("reference point has no type yet"));
        }
        Err(PmError::TypeNotFound { type_uuid, .. }) => {
            findings.push(Finding::error(match type_uuid {
                Some(t) => format!("point has unknown type uuid {t}"),
                None => "point has no type".to_string(),
            }));
        }
        Err(e) => findings.push(Finding::error(e.to_string())),
    }
    if let Some(factor) = node.uuid_attr("factor_uuid") {
        let factor_type = tree
            .get(factor)
            .and_then(|f| layout::resolve_point_type(lookup, factor, f.uuid_attr("type_uuid")).ok());
        if factor_type != Some(PointType::Sunssf) {
            findings.push(Finding::warning("scale factor point is not of type sunssf"));
        }
    }
}

pub(crate) fn check_member(tree: &Tree, node: &Node, findings: &mut Vec<Finding>) {
    let offset = node.attr("bit_offset").and_then(|v| v.as_integer()).unwrap_or(0);
    let length = node.attr("bit_length").and_then(|v| v.as_integer()).unwrap_or(0);
    if length <= 0 {
        findings.push(Finding::warning("bitfield member has no bits"));
    }
    let size = tree
        .parent_node(node.uuid)
        .and_then(|p| p.attr("size"))
        .and_then(|v| v.as_integer())
        .unwrap_or(0);
    if offset < 0 || offset + length > 16 * size {
        findings.push(Finding::error(format!(
            "bits [{offset}, {}] do not fit a {size}-register bitfield",
            offset + length - 1
        )));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Model;
    use crate::schema::TreeKind;
    use crate::schema::kinds::parameters::{Enumeration, Enumerator, Parameter};

    fn params_with_types() -> Tree {
        let mut params = Tree::empty(TreeKind::Parameters);
        let root = params.root();
        let mut types = Subtree::new(Enumeration {
            name: layout::POINT_TYPES_ENUMERATION.into(),
        });
        for (value, ty) in PointType::ALL.iter().enumerate() {
            types = types.child(Subtree::new(Enumerator {
                name: ty.name().into(),
                value: value as i64,
                ..Default::default()
            }));
        }
        params.insert(root, None, types).expect("types");
        params
    }

    #[test]
    fn new_model_has_header_and_fixed_block() {
        let params = params_with_types();
        let lookup = Lookup::new([&params]);
        let mut model = Model::empty(TreeKind::SunSpec);
        let root = model.root();
        let m = crate::behavior::add_child(&mut model, &lookup, root, NodeKind::SunSpecModel).expect("model");

        let tree = model.tree();
        let blocks: Vec<NodeKind> = tree.child_nodes(m).map(Node::kind).collect();
        assert_eq!(blocks, vec![NodeKind::HeaderBlock, NodeKind::FixedBlock]);
        let header = tree.children(m)[0];
        let names: Vec<String> = tree.child_nodes(header).map(Node::name).collect();
        assert_eq!(names, vec!["ID", "L"]);
        assert_eq!(tree.typed::<FixedBlock>(tree.children(m)[1]).map(|f| f.offset), Some(2));

        let header_node = tree.node(header).expect("header").clone();
        assert!(!SunSpecBehavior.can_delete(tree, &header_node));
        let fixed = tree.node(tree.children(m)[1]).expect("fixed").clone();
        assert!(!SunSpecBehavior.can_delete(tree, &fixed));
    }

    #[test]
    fn unknown_type_and_mismatched_size_are_errors() {
        let params = params_with_types();
        let float32 = params
            .nodes_of_kind(NodeKind::Enumerator)
            .find(|n| n.name() == "float32")
            .map(|n| n.uuid);
        let mut tree = Tree::empty(TreeKind::SunSpec);
        let root = tree.root();
        let model = tree
            .insert(
                root,
                None,
                Subtree::new(SunSpecModel {
                    name: "m".into(),
                    id: 1,
                    length: 0,
                }),
            )
            .expect("model");
        let fixed = tree.insert(model, None, Subtree::new(FixedBlock::default())).expect("fixed");
        let untyped = tree
            .insert(fixed, None, Subtree::new(DataPoint { name: "a".into(), size: 1, ..Default::default() }))
            .expect("a");
        let short = tree
            .insert(
                fixed,
                None,
                Subtree::new(DataPoint {
                    name: "b".into(),
                    type_uuid: float32,
                    size: 1,
                    ..Default::default()
                }),
            )
            .expect("b");
        let lookup = Lookup::new([&params, &tree]);

        let mut findings = Vec::new();
        check_point(&tree, tree.node(untyped).expect("a"), &lookup, &mut findings);
        assert!(findings[0].message.contains("no type"));

        findings.clear();
        check_point(&tree, tree.node(short).expect("b"), &lookup, &mut findings);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].level, crate::check::Level::Error);
    }

    #[test]
    fn dropped_parameter_becomes_point() {
        let mut params = Tree::empty(TreeKind::Parameters);
        let root = params.root();
        let p = params
            .insert(
                root,
                None,
                Subtree::new(Parameter {
                    name: "Voltage".into(),
                    units: Some("V".into()),
                    ..Default::default()
                }),
            )
            .expect("p");
        let lookup = Lookup::new([&params]);
        let point = point_for(params.node(p).expect("p"), &lookup);
        assert_eq!(point.parameter_uuid, Some(p));
        assert_eq!(point.units.as_deref(), Some("V"));
    }
}
