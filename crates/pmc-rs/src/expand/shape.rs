// crates/pmc-rs/src/expand/shape.rs
//! The shape of an expanded parameter table as seen by the view families:
//! its reference sources, and its leaves grouped by their parent path.

use uuid::Uuid;

use super::order::LeafOrder;
use crate::error::PmError;
use crate::schema::NodeKind;
use crate::schema::kinds::parameters::TableArrayElement;
use crate::tree::{Node, Tree};

/// A parameter node that a view mirrors with one shared reference point.
#[derive(Debug, Clone, PartialEq)]
pub struct SeedSource {
    pub uuid: Uuid,
    pub kind: NodeKind,
    pub name: String,
    pub abbreviation: Option<String>,
}

impl SeedSource {
    fn from_node(node: &Node) -> Self {
        Self {
            uuid: node.uuid,
            kind: node.kind(),
            name: node.name(),
            abbreviation: node.attr("abbreviation").and_then(|v| v.as_str().map(str::to_string)),
        }
    }
}

/// One `TableArrayElement` of the expanded table.
#[derive(Debug, Clone, PartialEq)]
pub struct Leaf {
    pub uuid: Uuid,
    pub name: String,
    pub path: Vec<Uuid>,
    /// Seed source whose geometry this leaf copies.
    pub reference: Uuid,
}

/// Leaves sharing one parent `TableGroupElement`.
#[derive(Debug, Clone, PartialEq)]
pub struct LeafGroup {
    pub name: String,
    pub path: Vec<Uuid>,
    pub leaves: Vec<Leaf>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Shape {
    pub table: Uuid,
    pub seeds: Vec<SeedSource>,
    pub groups: Vec<LeafGroup>,
}

impl Shape {
    pub fn leaf_count(&self) -> usize {
        self.groups.iter().map(|g| g.leaves.len()).sum()
    }
}

fn table_node(params: &Tree, table: Uuid) -> Result<&Node, PmError> {
    let node = params.node(table)?;
    if node.kind() != NodeKind::Table {
        return Err(PmError::consistency(format!(
            "{table} is a {}, not a parameter table",
            node.kind().tag()
        )));
    }
    Ok(node)
}

/// Reference sources of a table, in table order: each array of parameters,
/// each member of an array's first group, and each parameter of a plain group.
pub fn seed_sources(params: &Tree, table: Uuid) -> Result<Vec<SeedSource>, PmError> {
    let node = table_node(params, table)?;
    let mut seeds = Vec::new();
    for child in params.child_nodes(node.uuid) {
        match child.kind() {
            NodeKind::Array => {
                let first = child.children.first().and_then(|f| params.get(*f));
                match first {
                    Some(group) if group.kind() == NodeKind::Group => seeds.extend(
                        params
                            .child_nodes(group.uuid)
                            .filter(|m| m.kind() == NodeKind::Parameter)
                            .map(SeedSource::from_node),
                    ),
                    _ => seeds.push(SeedSource::from_node(child)),
                }
            }
            NodeKind::Group => seeds.extend(
                params
                    .child_nodes(child.uuid)
                    .filter(|m| m.kind() == NodeKind::Parameter)
                    .map(SeedSource::from_node),
            ),
            _ => {}
        }
    }
    Ok(seeds)
}

/// The seed source a leaf's `original` maps to.
pub fn reference_of(params: &Tree, original: Uuid) -> Option<Uuid> {
    let node = params.get(original)?;
    let parent = params.parent_node(original)?;
    match (parent.kind(), node.kind()) {
        (NodeKind::Array, _) => Some(parent.uuid),
        (NodeKind::ArrayGroupElement, NodeKind::ArrayParameterElement) => node.uuid_attr("original"),
        _ => Some(original),
    }
}

/// Names of the `TableGroupElement`s from the table down to `uuid`.
fn group_name(params: &Tree, table: Uuid, uuid: Uuid) -> String {
    let mut names: Vec<String> = params
        .ancestors(uuid)
        .into_iter()
        .take_while(|a| *a != table)
        .filter_map(|a| params.get(a).map(Node::name))
        .collect();
    names.reverse();
    if let Some(node) = params.get(uuid) {
        names.push(node.name());
    }
    names.join("_")
}

/// Collects the leaves of an expanded table, ordered and grouped.
pub fn table_shape(params: &Tree, table: Uuid, order: &LeafOrder) -> Result<Shape, PmError> {
    let seeds = seed_sources(params, table)?;
    let mut leaves: Vec<(Uuid, Leaf)> = Vec::new();
    for uuid in params.descendants(table) {
        let Some(element) = params.typed::<TableArrayElement>(uuid) else {
            continue;
        };
        let Some(parent) = params.parent(uuid) else {
            continue;
        };
        let reference = element
            .original
            .and_then(|o| reference_of(params, o))
            .ok_or_else(|| PmError::consistency(format!("table leaf {uuid} has no original parameter")))?;
        leaves.push((
            parent,
            Leaf {
                uuid,
                name: element.name.clone(),
                path: element.path.clone(),
                reference,
            },
        ));
    }
    order.apply(table, &mut leaves, |(_, leaf)| leaf.uuid);

    let mut groups: Vec<(Uuid, LeafGroup)> = Vec::new();
    for (parent, leaf) in leaves {
        match groups.iter_mut().find(|(p, _)| *p == parent) {
            Some((_, group)) => group.leaves.push(leaf),
            None => {
                let path = params
                    .get(parent)
                    .and_then(|p| p.attr("path"))
                    .map(|v| v.uuids())
                    .unwrap_or_default();
                groups.push((
                    parent,
                    LeafGroup {
                        name: group_name(params, table, parent),
                        path,
                        leaves: vec![leaf],
                    },
                ));
            }
        }
    }
    Ok(Shape {
        table,
        seeds,
        groups: groups.into_iter().map(|(_, g)| g).collect(),
    })
}
