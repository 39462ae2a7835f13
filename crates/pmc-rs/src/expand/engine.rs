// crates/pmc-rs/src/expand/engine.rs
//! The view expansion engine shared by CAN, SunSpec and static Modbus.
//!
//! 1. Snapshot the view's children by path key.
//! 2. Detach them all.
//! 3. Re-emit one reference (seed) per seed source, reusing identities.
//! 4. Emit one group per leaf group (split into chunks by the family),
//!    reusing identities by path and chunk index.
//! 5. Emit the leaves of each chunk, copying geometry from their seed.
//! 6. Let the family finish (identifier allocation, layout).

use std::collections::HashMap;

use uuid::Uuid;

use super::shape::{Leaf, SeedSource, Shape};
use super::{ExpandOptions, ExpansionReport, ZeroBitsPolicy};
use crate::error::PmError;
use crate::log::{NodeContext, pm_warn};
use crate::schema::{AttrValue, NodeData, NodeKind};
use crate::tree::{Subtree, Tree};

/// A leaf placed inside a chunk; `position` is family-specific (CAN start bit).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placed {
    pub index: usize,
    pub position: i64,
}

/// What differs between the view trees that mirror a parameter table.
pub trait ViewFamily {
    /// Kind of the view node (`CanTable`, SunSpec or Modbus table).
    const VIEW: NodeKind;
    /// Kind of the reference points and of the leaves.
    const POINT: NodeKind;
    /// Kind of the per-group node (multiplexer or repeating block).
    const GROUP: NodeKind;

    /// Parameter table the view node is linked to.
    fn table_of(&self, view: &NodeData) -> Option<Uuid>;

    /// Seed source a reference or leaf point stands for.
    fn source_of(&self, point: &NodeData) -> Option<Uuid> {
        point.get("parameter_uuid").and_then(|v| v.as_uuid())
    }

    fn new_seed(&self, source: &SeedSource) -> NodeData;

    /// Name of the reference point for `source`; refreshed on every expansion.
    fn seed_name(&self, source: &SeedSource) -> String {
        source.name.clone()
    }

    /// Whether leaves can be laid out from this seed.
    fn seed_ready(&self, _seed: &NodeData) -> bool {
        true
    }

    /// Whether a leaf of this seed fits in one group at all.
    fn seed_fits(&self, _seed: &NodeData) -> bool {
        true
    }

    /// Splits one group's leaves into chunks; each chunk becomes one group node.
    fn pack(&self, seeds: &[&NodeData]) -> Vec<Vec<Placed>> {
        vec![
            (0..seeds.len())
                .map(|index| Placed { index, position: 0 })
                .collect(),
        ]
    }

    /// The group node of chunk `chunk`, given the previous node at that key.
    fn group(&self, name: &str, path: &[Uuid], chunk: usize, previous: Option<&NodeData>) -> NodeData;

    /// A leaf point copying `seed`'s geometry.
    fn leaf(&self, leaf: &Leaf, seed: &NodeData, position: i64) -> NodeData;

    /// Runs after the view has been rebuilt.
    fn finish(&self, _tree: &mut Tree, _view: Uuid, _created_groups: &[Uuid]) -> Result<(), PmError> {
        Ok(())
    }
}

/// Suffix of overflow chunk `chunk`: `""`, `"_A"`, `"_B"`, …
pub fn chunk_suffix(chunk: usize) -> String {
    if chunk == 0 {
        return String::new();
    }
    let mut n = chunk - 1;
    let mut letters = Vec::new();
    loop {
        letters.push(char::from(b'A' + (n % 26) as u8));
        if n < 26 {
            break;
        }
        n = n / 26 - 1;
    }
    letters.reverse();
    format!("_{}", letters.into_iter().collect::<String>())
}

/// Previous children of a view, by key.
#[derive(Default)]
struct Snapshot {
    seeds: HashMap<Uuid, (Uuid, NodeData)>,
    groups: HashMap<Vec<Uuid>, Vec<(Uuid, NodeData)>>,
    leaves: HashMap<(Vec<Uuid>, Uuid), Uuid>,
    count: usize,
}

impl Snapshot {
    fn collect<F: ViewFamily>(family: &F, children: Vec<Subtree>) -> Self {
        let mut snapshot = Self::default();
        for child in children {
            snapshot.count += child.node_count();
            if child.data.kind() == F::POINT {
                if let Some(source) = family.source_of(&child.data) {
                    snapshot.seeds.entry(source).or_insert((child.uuid, child.data));
                }
            } else if child.data.kind() == F::GROUP {
                let path = child.data.get("path").map(|v| v.uuids()).unwrap_or_default();
                for leaf in &child.children {
                    if let Some(source) = family.source_of(&leaf.data) {
                        snapshot.leaves.entry((path.clone(), source)).or_insert(leaf.uuid);
                    }
                }
                snapshot.groups.entry(path).or_default().push((child.uuid, child.data));
            }
        }
        snapshot
    }
}

/// Seeds for `shape`, reusing previous reference points by source. A reused
/// point keeps its geometry and takes its name from the source.
fn seeds_for<F: ViewFamily>(
    family: &F,
    shape: &Shape,
    snapshot: &mut Snapshot,
    report: &mut ExpansionReport,
) -> Result<Vec<(Uuid, Subtree)>, PmError> {
    shape
        .seeds
        .iter()
        .map(|source| {
            let subtree = match snapshot.seeds.remove(&source.uuid) {
                Some((uuid, mut data)) => {
                    report.reused += 1;
                    data.set("name", AttrValue::String(family.seed_name(source)))
                        .map_err(|error| PmError::Attribute { uuid, source: error })?;
                    Subtree::with_uuid(uuid, data)
                }
                None => {
                    report.created += 1;
                    Subtree::new(family.new_seed(source))
                }
            };
            Ok((source.uuid, subtree))
        })
        .collect()
}

/// Names of the seed sources in `references`, in table order.
fn seed_names(shape: &Shape, references: &[Uuid]) -> Vec<String> {
    shape
        .seeds
        .iter()
        .filter(|s| references.contains(&s.uuid))
        .map(|s| s.name.clone())
        .collect()
}

/// Rebuilds the children of `view` from `shape`.
pub fn run<F: ViewFamily>(
    family: &F,
    tree: &mut Tree,
    view: Uuid,
    shape: &Shape,
    options: &ExpandOptions,
) -> Result<ExpansionReport, PmError> {
    let view_node = tree.node(view)?.clone();
    let ctx = NodeContext::new(tree.kind(), view_node.kind(), view);
    if view_node.kind() != F::VIEW {
        return Err(PmError::consistency(format!(
            "{view} is a {}, not a {}",
            view_node.kind().tag(),
            F::VIEW.tag()
        )));
    }
    match family.table_of(&view_node.data) {
        Some(linked) if linked == shape.table => {}
        linked => {
            return Err(PmError::consistency(format!(
                "table {} does not match the view's parameter table {}",
                shape.table,
                linked.map_or_else(|| "(none)".to_string(), |u| u.to_string())
            )));
        }
    }

    let mut report = ExpansionReport {
        view,
        ..Default::default()
    };
    let previous = tree.detach_children(view)?;
    let mut snapshot = Snapshot::collect(family, previous);
    let previous_count = snapshot.count;

    let seeds = seeds_for(family, shape, &mut snapshot, &mut report)?;
    let seed_data: HashMap<Uuid, NodeData> = seeds.iter().map(|(s, t)| (*s, t.data.clone())).collect();

    // Zero-bit (or otherwise unready) and oversized references.
    let mut unready: Vec<Uuid> = Vec::new();
    let mut oversized: Vec<Uuid> = Vec::new();
    for group in &shape.groups {
        for leaf in &group.leaves {
            let seed = seed_data.get(&leaf.reference);
            let ready = seed.is_some_and(|s| family.seed_ready(s));
            if !ready && !unready.contains(&leaf.reference) {
                unready.push(leaf.reference);
            }
            if seed.is_some_and(|s| !family.seed_fits(s)) && !oversized.contains(&leaf.reference) {
                oversized.push(leaf.reference);
            }
        }
    }
    if !oversized.is_empty() {
        return Err(PmError::consistency(format!(
            "reference points are wider than a group's payload: {}",
            seed_names(shape, &oversized).join(", ")
        )));
    }
    if !unready.is_empty() {
        let names = seed_names(shape, &unready);
        match options.zero_bits {
            ZeroBitsPolicy::Abort => {
                return Err(PmError::consistency(format!(
                    "reference points cannot be laid out: {}",
                    names.join(", ")
                )));
            }
            ZeroBitsPolicy::SkipAndWarn => {
                for name in &names {
                    pm_warn!(ctx, "skipping leaves of reference {}: it has zero bits", name);
                }
                report.skipped_seeds = unready.clone();
            }
        }
    }

    for (_, seed) in seeds {
        tree.insert(view, None, seed)?;
    }

    let mut created_groups = Vec::new();
    for group in &shape.groups {
        let leaves: Vec<(&Leaf, &NodeData)> = group
            .leaves
            .iter()
            .filter(|l| !unready.contains(&l.reference))
            .filter_map(|l| seed_data.get(&l.reference).map(|s| (l, s)))
            .collect();
        if leaves.is_empty() {
            continue;
        }
        let seeds_of_leaves: Vec<&NodeData> = leaves.iter().map(|(_, s)| *s).collect();
        let mut previous_groups = snapshot.groups.remove(&group.path).unwrap_or_default().into_iter();
        for (chunk, placed) in family.pack(&seeds_of_leaves).into_iter().enumerate() {
            let previous = previous_groups.next();
            let data = family.group(&group.name, &group.path, chunk, previous.as_ref().map(|(_, d)| d));
            let mut node = match previous {
                Some((uuid, _)) => {
                    report.reused += 1;
                    Subtree::with_uuid(uuid, data)
                }
                None => {
                    report.created += 1;
                    let node = Subtree::new(data);
                    created_groups.push(node.uuid);
                    node
                }
            };
            for Placed { index, position } in placed {
                let (leaf, seed) = leaves[index];
                let data = family.leaf(leaf, seed, position);
                let child = match snapshot.leaves.remove(&(group.path.clone(), leaf.uuid)) {
                    Some(uuid) => {
                        report.reused += 1;
                        Subtree::with_uuid(uuid, data)
                    }
                    None => {
                        report.created += 1;
                        Subtree::new(data)
                    }
                };
                node = node.child(child);
            }
            tree.insert(view, None, node)?;
        }
    }

    family.finish(tree, view, &created_groups)?;
    report.removed = previous_count.saturating_sub(report.reused);
    Ok(report)
}

/// Steps 1–3 only: brings the view's reference points in line with the
/// table's seed sources and leaves its groups alone.
pub fn sync<F: ViewFamily>(family: &F, tree: &mut Tree, view: Uuid, seeds: &[SeedSource]) -> Result<(), PmError> {
    let existing: Vec<(Uuid, Option<Uuid>)> = tree
        .child_nodes(view)
        .filter(|c| c.kind() == F::POINT)
        .map(|c| (c.uuid, family.source_of(&c.data)))
        .collect();
    for (uuid, source) in &existing {
        if !source.is_some_and(|s| seeds.iter().any(|seed| seed.uuid == s)) {
            tree.detach(*uuid)?;
        }
    }
    for (row, seed) in seeds.iter().enumerate() {
        let current = existing.iter().find(|(_, s)| *s == Some(seed.uuid)).map(|(u, _)| *u);
        match current {
            Some(uuid) => tree.move_node(uuid, view, Some(row))?,
            None => {
                tree.insert(view, Some(row), Subtree::new(family.new_seed(seed)))?;
            }
        }
    }
    Ok(())
}

/// A new view node with one reference point per seed source.
pub fn seeded<F: ViewFamily>(family: &F, view: NodeData, seeds: &[SeedSource]) -> Subtree {
    seeds
        .iter()
        .fold(Subtree::new(view), |view, seed| view.child(Subtree::new(family.new_seed(seed))))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overflow_suffixes() {
        assert_eq!(chunk_suffix(0), "");
        assert_eq!(chunk_suffix(1), "_A");
        assert_eq!(chunk_suffix(2), "_B");
        assert_eq!(chunk_suffix(26), "_Z");
        assert_eq!(chunk_suffix(27), "_AA");
    }
}
