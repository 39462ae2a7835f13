// crates/pmc-rs/src/check.rs
//! Side-effect-free validation producing a tree of findings.

use std::fmt;

use uuid::Uuid;

use crate::behavior;
use crate::models::Lookup;
use crate::schema::NodeKind;
use crate::tree::{Node, Tree};

/// Severity of a finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    Information,
    Warning,
    Error,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Level::Information => "information",
            Level::Warning => "warning",
            Level::Error => "error",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    pub level: Level,
    pub message: String,
}

impl Finding {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: Level::Error,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: Level::Warning,
            message: message.into(),
        }
    }

    pub fn information(message: impl Into<String>) -> Self {
        Self {
            level: Level::Information,
            message: message.into(),
        }
    }
}

/// Findings for one node and its descendants, mirroring the tree's shape.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckResult {
    pub uuid: Uuid,
    pub kind: NodeKind,
    pub name: String,
    pub findings: Vec<Finding>,
    pub children: Vec<CheckResult>,
}

impl CheckResult {
    /// Most severe level in this subtree.
    pub fn worst(&self) -> Option<Level> {
        self.findings
            .iter()
            .map(|f| f.level)
            .chain(self.children.iter().filter_map(CheckResult::worst))
            .max()
    }

    pub fn count(&self, level: Level) -> usize {
        self.findings.iter().filter(|f| f.level == level).count()
            + self.children.iter().map(|c| c.count(level)).sum::<usize>()
    }

    pub fn has_errors(&self) -> bool {
        self.count(Level::Error) > 0
    }

    /// Every finding with the node it belongs to, in pre-order.
    pub fn flatten(&self) -> Vec<(&CheckResult, &Finding)> {
        let mut out: Vec<(&CheckResult, &Finding)> = self.findings.iter().map(|f| (self, f)).collect();
        for child in &self.children {
            out.extend(child.flatten());
        }
        out
    }

    /// Drops branches without findings.
    pub fn prune(self) -> Option<CheckResult> {
        let children: Vec<CheckResult> = self.children.into_iter().filter_map(CheckResult::prune).collect();
        if self.findings.is_empty() && children.is_empty() {
            None
        } else {
            Some(CheckResult { children, ..self })
        }
    }
}

/// Checks `from` and its descendants. `lookup` should cover every tree of
/// the project (including `tree`) so references and uniqueness can be checked.
pub fn check(tree: &Tree, lookup: &Lookup, from: Uuid) -> CheckResult {
    let Some(node) = tree.get(from) else {
        return CheckResult {
            uuid: from,
            kind: tree.kind().root_kind(),
            name: String::new(),
            findings: vec![Finding::error(format!("node {from} not found"))],
            children: Vec::new(),
        };
    };
    let mut findings = Vec::new();
    structural(tree, node, lookup, &mut findings);
    references(node, lookup, &mut findings);
    behavior::behavior_for(tree.kind()).check(tree, node, lookup, &mut findings);

    CheckResult {
        uuid: from,
        kind: node.kind(),
        name: node.name(),
        findings,
        children: node.children.iter().map(|c| check(tree, lookup, *c)).collect(),
    }
}

fn structural(tree: &Tree, node: &Node, lookup: &Lookup, findings: &mut Vec<Finding>) {
    for child in &node.children {
        match tree.get(*child) {
            None => findings.push(Finding::error(format!("child {child} is missing"))),
            Some(c) => {
                if c.parent != Some(node.uuid) {
                    findings.push(Finding::error(format!("child {child} has a broken parent link")));
                }
                if !node.kind().allows_child(c.kind()) {
                    findings.push(Finding::error(format!(
                        "{} is not allowed under {}",
                        c.kind().tag(),
                        node.kind().tag()
                    )));
                }
            }
        }
    }
    let holders = lookup.trees().iter().filter(|t| t.contains(node.uuid)).count();
    if holders > 1 {
        findings.push(Finding::error(format!(
            "uuid {} is used in {holders} trees",
            node.uuid
        )));
    }
}

fn references(node: &Node, lookup: &Lookup, findings: &mut Vec<Finding>) {
    for d in node.kind().descriptors().iter().filter(|d| d.ty.is_uuid()) {
        let Some(value) = node.attr(d.name) else {
            continue;
        };
        for target in value.uuids() {
            match lookup.kind_of(target) {
                None => findings.push(Finding::error(format!(
                    "{} references unknown node {target}",
                    d.label()
                ))),
                Some(kind) if !d.meta.refs.is_empty() && !d.meta.refs.contains(&kind) => {
                    let expected: Vec<&str> = d.meta.refs.iter().map(|k| k.tag()).collect();
                    findings.push(Finding::error(format!(
                        "{} references a {} (expected {})",
                        d.label(),
                        kind.tag(),
                        expected.join(" or ")
                    )));
                }
                Some(_) => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::kinds::can::Signal;
    use crate::schema::TreeKind;
    use crate::tree::Subtree;

    #[test]
    fn dangling_reference_is_an_error() {
        let mut can = Tree::empty(TreeKind::Can);
        let root = can.root();
        let message = can
            .insert(root, None, Subtree::new(crate::schema::kinds::can::Message {
                name: "m".into(),
                length: 8,
                ..Default::default()
            }))
            .expect("message");
        can.insert(
            message,
            None,
            Subtree::new(Signal {
                name: "s".into(),
                bits: 8,
                parameter_uuid: Some(Uuid::new_v4()),
                ..Default::default()
            }),
        )
        .expect("signal");
        let lookup = Lookup::new([&can]);
        let result = check(&can, &lookup, root);
        assert!(result.has_errors());
        let flat = result.flatten();
        let messages: Vec<&str> = flat.iter().map(|(_, f)| f.message.as_str()).collect();
        assert!(
            messages.iter().any(|m| m.contains("references unknown node")),
            "got {messages:?}"
        );
    }

    #[test]
    fn prune_keeps_only_paths_to_findings() {
        let leaf = CheckResult {
            uuid: Uuid::new_v4(),
            kind: NodeKind::Signal,
            name: "s".into(),
            findings: vec![Finding::warning("zero bits")],
            children: vec![],
        };
        let clean = CheckResult {
            findings: vec![],
            ..leaf.clone()
        };
        let root = CheckResult {
            uuid: Uuid::new_v4(),
            kind: NodeKind::CanRoot,
            name: "CAN".into(),
            findings: vec![],
            children: vec![leaf, clean],
        };
        let pruned = root.prune().expect("has a finding");
        assert_eq!(pruned.children.len(), 1);
        assert_eq!(pruned.worst(), Some(Level::Warning));
    }
}
