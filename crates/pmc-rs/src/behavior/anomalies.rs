// crates/pmc-rs/src/behavior/anomalies.rs
//! Anomaly tree: tables of coded anomalies and their parameter sources.

use std::collections::HashMap;

use super::{Behavior, generic_move, next_free, refused_drop};
use crate::check::Finding;
use crate::error::PmError;
use crate::models::Lookup;
use crate::schema::NodeKind;
use crate::schema::kinds::anomalies::{Anomaly, AnomalySource, AnomalyTable};
use crate::tree::{Node, Subtree, Tree};

pub struct AnomalyBehavior;

fn codes<'a>(tree: &'a Tree, parent: &'a Node) -> impl Iterator<Item = i64> + 'a {
    tree.child_nodes(parent.uuid)
        .filter_map(|n| n.attr("code").and_then(|v| v.as_integer()))
}

impl Behavior for AnomalyBehavior {
    fn can_drop_on(&self, tree: &Tree, target: &Node, source: &Node) -> bool {
        if tree.contains(source.uuid) {
            return generic_move(tree, target, source);
        }
        target.kind() == NodeKind::Anomaly && source.kind().is_parameter_like()
    }

    fn child_from(&self, _tree: &Tree, target: &Node, source: &Node, _lookup: &Lookup) -> Result<Subtree, PmError> {
        if target.kind() != NodeKind::Anomaly || !source.kind().is_parameter_like() {
            return Err(refused_drop(source, target));
        }
        Ok(Subtree::new(AnomalySource {
            name: source.name(),
            parameter_uuid: Some(source.uuid),
        }))
    }

    fn addable_types(&self, _tree: &Tree, node: &Node) -> Vec<NodeKind> {
        match node.kind() {
            NodeKind::AnomaliesRoot => vec![NodeKind::AnomalyTable],
            NodeKind::AnomalyTable => vec![NodeKind::Anomaly],
            NodeKind::Anomaly => vec![NodeKind::AnomalySource],
            _ => Vec::new(),
        }
    }

    fn new_child(&self, tree: &Tree, parent: &Node, kind: NodeKind, _lookup: &Lookup) -> Result<Subtree, PmError> {
        let code = next_free(codes(tree, parent), 0, i64::MAX).unwrap_or(0);
        let child = match kind {
            NodeKind::AnomalyTable => Subtree::new(AnomalyTable {
                name: "New Table".into(),
                abbreviation: String::new(),
                code,
            }),
            NodeKind::Anomaly => Subtree::new(Anomaly {
                name: "New Anomaly".into(),
                code,
                ..Default::default()
            }),
            NodeKind::AnomalySource => Subtree::new(AnomalySource {
                name: "New Source".into(),
                parameter_uuid: None,
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
        node.uuid != tree.root()
    }

    fn check(&self, tree: &Tree, node: &Node, _lookup: &Lookup, findings: &mut Vec<Finding>) {
        match node.kind() {
            NodeKind::AnomaliesRoot | NodeKind::AnomalyTable => {
                let mut seen: HashMap<i64, String> = HashMap::new();
                for child in tree.child_nodes(node.uuid) {
                    let Some(code) = child.attr("code").and_then(|v| v.as_integer()) else {
                        continue;
                    };
                    if let Some(previous) = seen.insert(code, child.name()) {
                        findings.push(Finding::error(format!(
                            "{previous} and {} share code {code}",
                            child.name()
                        )));
                    }
                }
                if let Some(table) = node.get::<AnomalyTable>() {
                    if table.abbreviation.is_empty() {
                        findings.push(Finding::warning("anomaly table has no abbreviation"));
                    }
                }
            }
            NodeKind::AnomalySource => {
                if node.uuid_attr("parameter_uuid").is_none() {
                    findings.push(Finding::warning("anomaly source has no parameter"));
                }
            }
            _ => {}
        }
    }
}
