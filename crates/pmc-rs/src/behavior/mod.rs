// crates/pmc-rs/src/behavior/mod.rs
//! Per-tree behaviour: drop rules, add menus, delete guards and checks.
//!
//! Each tree has one [`Behavior`] implementation that matches on the node
//! kinds it owns. The free functions below combine a behaviour with the
//! model's primitive mutations.

pub mod anomalies;
pub mod can;
pub mod parameters;
pub mod staticmodbus;
pub mod sunspec;

use uuid::Uuid;

use crate::check::Finding;
use crate::error::PmError;
use crate::log::{NodeContext, pm_debug, pm_info, pm_warn};
use crate::model::Model;
use crate::models::Lookup;
use crate::schema::{NodeKind, TreeKind};
use crate::tree::{Node, Subtree, Tree};

/// The per-kind operation table of one tree.
pub trait Behavior: Sync {
    /// Whether `source` may be attached under `target`, either by moving it
    /// (same tree) or by materializing a new child from it.
    fn can_drop_on(&self, tree: &Tree, target: &Node, source: &Node) -> bool;

    /// Builds the child that a drop of `source` onto `target` creates.
    fn child_from(&self, tree: &Tree, target: &Node, source: &Node, lookup: &Lookup) -> Result<Subtree, PmError>;

    /// Whether a same-tree drop moves `source` instead of copying from it.
    fn internal_move(&self, tree: &Tree, target: &Node, source: &Node) -> bool {
        generic_move(tree, target, source)
    }

    /// Whether the source is removed after a same-tree copy.
    fn remove_old_on_drop(&self, _target: &Node, _source: &Node) -> bool {
        false
    }

    /// Kinds offered when adding a new child to `node`.
    fn addable_types(&self, tree: &Tree, node: &Node) -> Vec<NodeKind>;

    /// A fresh child of `kind` for `parent`, with sensible defaults.
    fn new_child(&self, tree: &Tree, parent: &Node, kind: NodeKind, lookup: &Lookup) -> Result<Subtree, PmError>;

    fn can_delete(&self, tree: &Tree, node: &Node) -> bool;

    /// Kind-specific findings for one node.
    fn check(&self, tree: &Tree, node: &Node, lookup: &Lookup, findings: &mut Vec<Finding>);
}

pub fn behavior_for(tree: TreeKind) -> &'static dyn Behavior {
    match tree {
        TreeKind::Parameters => &parameters::ParameterBehavior,
        TreeKind::Can => &can::CanBehavior,
        TreeKind::SunSpec => &sunspec::SunSpecBehavior,
        TreeKind::StaticModbus => &staticmodbus::StaticModbusBehavior,
        TreeKind::Anomalies => &anomalies::AnomalyBehavior,
    }
}

// --- Shared predicates ---

/// Views regenerated by table expansion.
pub(crate) const TABLE_VIEWS: &[NodeKind] = &[
    NodeKind::CanTable,
    NodeKind::SunSpecTable,
    NodeKind::ModbusTable,
];

/// Whether the node was produced by expansion or mirrors another node, so
/// that it can't be edited structurally by hand.
pub fn is_generated(tree: &Tree, uuid: Uuid) -> bool {
    let Some(node) = tree.get(uuid) else {
        return false;
    };
    if matches!(
        node.kind(),
        NodeKind::TableGroupElement
            | NodeKind::TableArrayElement
            | NodeKind::TableRepeatingBlockReferenceDataPointReference
    ) {
        return true;
    }
    tree.ancestors(uuid)
        .iter()
        .filter_map(|a| tree.get(*a))
        .any(|a| TABLE_VIEWS.contains(&a.kind()) || a.kind() == NodeKind::ArrayGroupElement)
}

/// Same-tree move: the target accepts the kind, the source isn't the root,
/// and neither end is generated or part of an array.
pub fn generic_move(tree: &Tree, target: &Node, source: &Node) -> bool {
    tree.contains(source.uuid)
        && source.uuid != tree.root()
        && source.uuid != target.uuid
        && !tree.is_ancestor(source.uuid, target.uuid)
        && target.kind().allows_child(source.kind())
        && !is_generated(tree, source.uuid)
        && !is_generated(tree, target.uuid)
        && !TABLE_VIEWS.contains(&target.kind())
        && !matches!(
            target.kind(),
            NodeKind::Array | NodeKind::ArrayGroupElement | NodeKind::HeaderBlock
        )
        && !tree
            .parent_node(source.uuid)
            .is_some_and(|p| matches!(p.kind(), NodeKind::Array | NodeKind::HeaderBlock))
}

/// Smallest integer in `[first, last]` not in `used`.
pub(crate) fn next_free(used: impl IntoIterator<Item = i64>, first: i64, last: i64) -> Option<i64> {
    let used: std::collections::BTreeSet<i64> = used.into_iter().collect();
    (first..=last).find(|i| !used.contains(i))
}

fn refused_drop(source: &Node, target: &Node) -> PmError {
    PmError::IllegalDrop {
        source_uuid: source.uuid,
        source_kind: source.kind(),
        target: target.uuid,
        target_kind: target.kind(),
    }
}

// --- Operations on a model ---

/// Drops `source` onto `target` in `model`. A same-tree source is moved (or
/// copied, when the behaviour says so); a source from a registered drop
/// source is materialized through `child_from`.
pub fn drop_on(
    model: &mut Model,
    lookup: &Lookup,
    source: Uuid,
    target: Uuid,
    row: Option<usize>,
) -> Result<Uuid, PmError> {
    let behavior = behavior_for(model.kind());
    let tree = model.tree();
    let target_node = tree.node(target)?.clone();
    let ctx = NodeContext::new(model.kind(), target_node.kind(), target);

    let (source_node, internal) = match tree.get(source) {
        Some(n) => (n.clone(), true),
        None => {
            let n = lookup.resolve(source)?;
            let source_tree = n.kind().tree();
            if !model.accepts_drops_from(source_tree) {
                pm_warn!(ctx, "refused drop from unregistered {} tree", source_tree.name());
                return Err(refused_drop(n, &target_node));
            }
            (n.clone(), false)
        }
    };

    if !behavior.can_drop_on(tree, &target_node, &source_node) {
        pm_warn!(ctx, "refused drop of {} {}", source_node.kind().tag(), source);
        return Err(refused_drop(&source_node, &target_node));
    }

    if internal && behavior.internal_move(tree, &target_node, &source_node) {
        model.move_subtree(source, target, row)?;
        pm_debug!(ctx, "moved {} {}", source_node.kind().tag(), source);
        return Ok(source);
    }

    let child = behavior.child_from(tree, &target_node, &source_node, lookup)?;
    let remove_old = internal && behavior.remove_old_on_drop(&target_node, &source_node);
    let uuid = model.insert_subtree(target, row, child)?;
    if remove_old {
        model.remove_subtree(source)?;
    }
    pm_info!(ctx, "dropped {} {} as {}", source_node.kind().tag(), source, uuid);
    Ok(uuid)
}

/// Adds a new child of `kind` under `parent`, if the add menu offers it.
pub fn add_child(model: &mut Model, lookup: &Lookup, parent: Uuid, kind: NodeKind) -> Result<Uuid, PmError> {
    let behavior = behavior_for(model.kind());
    let parent_node = model.tree().node(parent)?.clone();
    if !behavior.addable_types(model.tree(), &parent_node).contains(&kind) {
        return Err(PmError::IllegalChild {
            parent: parent_node.kind(),
            child: kind,
        });
    }
    let child = behavior.new_child(model.tree(), &parent_node, kind, lookup)?;
    if model.kind() == TreeKind::Parameters {
        return parameters::add_with_propagation(model, parent, child);
    }
    model.insert_subtree(parent, None, child)
}

/// Deletes `uuid` and its descendants, if the kind allows it.
pub fn delete(model: &mut Model, uuid: Uuid) -> Result<(), PmError> {
    let behavior = behavior_for(model.kind());
    let node = model.tree().node(uuid)?.clone();
    if uuid == model.root() || !behavior.can_delete(model.tree(), &node) {
        pm_warn!(
            NodeContext::new(model.kind(), node.kind(), uuid),
            "refused delete"
        );
        return Err(PmError::CannotDelete {
            uuid,
            kind: node.kind(),
        });
    }
    if model.kind() == TreeKind::Parameters {
        return parameters::delete_with_propagation(model, uuid);
    }
    model.remove_subtree(uuid).map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_free_skips_used() {
        assert_eq!(next_free([1, 2, 4], 1, 10), Some(3));
        assert_eq!(next_free([], 5, 10), Some(5));
        assert_eq!(next_free([1, 2], 1, 2), None);
    }
}
