// crates/pmc-rs/src/expand/table.rs
//! Expansion of a parameter table into its `TableGroupElement` tree.
//!
//! The table's axis enumerations nest one grouping level per axis; under the
//! innermost level each array or group of the table gets its own group
//! element holding the `TableArrayElement` leaves. Nodes are keyed by their
//! persisted `path`, so a re-expansion keeps UUIDs and the leaves'
//! user-edited access levels.

use std::collections::HashMap;

use uuid::Uuid;

use super::ExpansionReport;
use crate::error::PmError;
use crate::log::{NodeContext, pm_info};
use crate::model::Model;
use crate::schema::kinds::parameters::{TableArrayElement, TableGroupElement};
use crate::schema::{NodeData, NodeKind, TreeKind};
use crate::tree::{Node, Subtree, Tree};

/// Previously generated nodes by path.
struct Snapshot {
    nodes: HashMap<Vec<Uuid>, (Uuid, NodeData)>,
    taken: usize,
}

impl Snapshot {
    fn collect(subtrees: Vec<Subtree>) -> Self {
        let mut nodes = HashMap::new();
        let mut stack = subtrees;
        while let Some(subtree) = stack.pop() {
            let Subtree { uuid, data, children } = subtree;
            let path = data.get("path").map(|v| v.uuids()).unwrap_or_default();
            nodes.insert(path, (uuid, data));
            stack.extend(children);
        }
        Self { nodes, taken: 0 }
    }

    fn take(&mut self, path: &[Uuid]) -> Option<(Uuid, NodeData)> {
        let found = self.nodes.remove(path);
        if found.is_some() {
            self.taken += 1;
        }
        found
    }
}

struct Builder<'a> {
    tree: &'a Tree,
    snapshot: Snapshot,
    created: usize,
}

impl Builder<'_> {
    fn group(&mut self, name: String, path: Vec<Uuid>, original: Option<Uuid>) -> Subtree {
        let data = TableGroupElement { name, path, original };
        match self.snapshot.take(&data.path) {
            Some((uuid, _)) => Subtree::with_uuid(uuid, data),
            None => {
                self.created += 1;
                Subtree::new(data)
            }
        }
    }

    fn leaf(&mut self, member: &Node, path: Vec<Uuid>, curve_index: Option<i64>) -> Subtree {
        let mut data = TableArrayElement {
            name: member.name(),
            abbreviation: member.attr("abbreviation").and_then(|v| v.as_str().map(str::to_string)),
            path,
            curve_index,
            original: Some(member.uuid),
            access_level_uuid: None,
        };
        match self.snapshot.take(&data.path) {
            Some((uuid, previous)) => {
                data.access_level_uuid = previous.get("access_level_uuid").and_then(|v| v.as_uuid());
                Subtree::with_uuid(uuid, data)
            }
            None => {
                self.created += 1;
                Subtree::new(data)
            }
        }
    }

    /// Parameters of a group or array-group element, in order.
    fn members(&self, group: Uuid) -> Vec<Node> {
        self.tree
            .child_nodes(group)
            .filter(|m| matches!(m.kind(), NodeKind::Parameter | NodeKind::ArrayParameterElement))
            .cloned()
            .collect()
    }

    /// The group elements of one combination: one per array or group of the table.
    fn row(&mut self, row_sources: &[Node], prefix: &[Uuid]) -> Vec<Subtree> {
        let mut out = Vec::new();
        for source in row_sources {
            let mut path = prefix.to_vec();
            path.push(source.uuid);
            let mut element = self.group(source.name(), path.clone(), Some(source.uuid));
            match source.kind() {
                NodeKind::Group => {
                    for member in self.members(source.uuid) {
                        let mut leaf_path = path.clone();
                        leaf_path.push(member.uuid);
                        element = element.child(self.leaf(&member, leaf_path, None));
                    }
                }
                NodeKind::Array => {
                    let elements: Vec<Node> = self.tree.child_nodes(source.uuid).cloned().collect();
                    for (index, item) in elements.iter().enumerate() {
                        let mut item_path = path.clone();
                        item_path.push(item.uuid);
                        if matches!(item.kind(), NodeKind::Group | NodeKind::ArrayGroupElement) {
                            let mut nested = self.group(item.name(), item_path.clone(), Some(item.uuid));
                            for member in self.members(item.uuid) {
                                let mut leaf_path = item_path.clone();
                                leaf_path.push(member.uuid);
                                nested = nested.child(self.leaf(&member, leaf_path, Some(index as i64)));
                            }
                            element = element.child(nested);
                        } else {
                            element = element.child(self.leaf(item, item_path, Some(index as i64)));
                        }
                    }
                }
                _ => {}
            }
            out.push(element);
        }
        out
    }

    /// One nesting level per axis, then the row.
    fn level(&mut self, axes: &[Vec<Node>], row_sources: &[Node], prefix: &[Uuid]) -> Vec<Subtree> {
        let Some((axis, rest)) = axes.split_first() else {
            return self.row(row_sources, prefix);
        };
        let mut out = Vec::new();
        for enumerator in axis {
            let mut path = prefix.to_vec();
            path.push(enumerator.uuid);
            let mut element = self.group(enumerator.name(), path.clone(), Some(enumerator.uuid));
            for child in self.level(rest, row_sources, &path) {
                element = element.child(child);
            }
            out.push(element);
        }
        out
    }
}

/// Regenerates the `TableGroupElement` tree of `table` in place.
pub(super) fn expand_in(tree: &mut Tree, table: Uuid) -> Result<ExpansionReport, PmError> {
    let node = tree.node(table)?.clone();
    if node.kind() != NodeKind::Table {
        return Err(PmError::consistency(format!(
            "{table} is a {}, not a parameter table",
            node.kind().tag()
        )));
    }
    let axes: Vec<Vec<Node>> = tree
        .child_nodes(table)
        .filter(|c| c.kind() == NodeKind::Enumeration)
        .map(|e| tree.child_nodes(e.uuid).cloned().collect())
        .collect();
    let row_sources: Vec<Node> = tree
        .child_nodes(table)
        .filter(|c| matches!(c.kind(), NodeKind::Array | NodeKind::Group))
        .cloned()
        .collect();

    let generated: Vec<Uuid> = tree
        .child_nodes(table)
        .filter(|c| c.kind() == NodeKind::TableGroupElement)
        .map(|c| c.uuid)
        .collect();
    let mut previous = Vec::new();
    for uuid in generated {
        previous.push(tree.detach(uuid)?);
    }
    let previous_count: usize = previous.iter().map(Subtree::node_count).sum();

    let frozen = tree.clone();
    let mut builder = Builder {
        tree: &frozen,
        snapshot: Snapshot::collect(previous),
        created: 0,
    };
    let children = builder.level(&axes, &row_sources, &[]);
    for child in children {
        tree.insert(table, None, child)?;
    }

    let reused = builder.snapshot.taken;
    Ok(ExpansionReport {
        view: table,
        created: builder.created,
        reused,
        removed: previous_count - reused,
        skipped_seeds: Vec::new(),
    })
}

/// Expands one parameter table of the parameter model.
pub fn expand_parameter_table(model: &mut Model, table: Uuid) -> Result<ExpansionReport, PmError> {
    if model.kind() != TreeKind::Parameters {
        return Err(PmError::consistency("parameter tables live in the parameter model"));
    }
    let report = model.transaction(table, |tree| expand_in(tree, table))?;
    pm_info!(
        NodeContext::new(TreeKind::Parameters, NodeKind::Table, table),
        "expanded table: {} created, {} reused, {} removed",
        report.created,
        report.reused,
        report.removed
    );
    Ok(report)
}
