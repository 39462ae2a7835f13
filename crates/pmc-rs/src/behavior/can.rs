// crates/pmc-rs/src/behavior/can.rs
//! CAN tree: messages, multiplexers, signals and table views.

use rust_decimal::Decimal;

use super::{Behavior, generic_move, is_generated, next_free, refused_drop};
use crate::check::Finding;
use crate::error::PmError;
use crate::expand;
use crate::expand::can::CanFamily;
use crate::models::Lookup;
use crate::schema::NodeKind;
use crate::schema::kinds::can::{
    CanTable, Message, MultiplexedMessage, MultiplexedMessageClone, Multiplexer, Signal,
};
use crate::tree::{Node, Subtree, Tree};

/// Highest multiplexer id a CAN table may allocate by default.
pub const MULTIPLEXER_ID_MAX: i64 = 0xFF;

pub struct CanBehavior;

/// Length in bytes of the frame a signal is laid out in: its nearest
/// multiplexer or message ancestor.
pub fn frame_length(tree: &Tree, signal: uuid::Uuid) -> Option<i64> {
    tree.ancestors(signal).into_iter().find_map(|a| {
        let node = tree.get(a)?;
        match node.kind() {
            NodeKind::Message | NodeKind::MultiplexedMessage | NodeKind::Multiplexer => {
                node.attr("length").and_then(|v| v.as_integer())
            }
            _ => None,
        }
    })
}

fn has_selector(tree: &Tree, message: &Node) -> bool {
    tree.child_nodes(message.uuid).any(|c| c.kind() == NodeKind::Signal)
}

/// A new signal referencing a parameter-ish node.
pub fn signal_for(source: &Node, lookup: &Lookup) -> Signal {
    Signal {
        name: source.name(),
        bits: 0,
        signed: false,
        factor: Decimal::ONE,
        start_bit: 0,
        hexadecimal_output: lookup
            .effective_attribute(source.uuid, "display_hexadecimal")
            .and_then(|v| v.as_bool())
            .unwrap_or(false),
        enumeration_uuid: lookup
            .effective_attribute(source.uuid, "enumeration_uuid")
            .and_then(|v| v.as_uuid()),
        parameter_uuid: Some(source.uuid),
    }
}

/// Multiplexer ids already in use under a multiplexed message.
fn used_multiplexer_ids(tree: &Tree, message: uuid::Uuid) -> Vec<i64> {
    tree.descendants(message)
        .into_iter()
        .filter_map(|u| tree.typed::<Multiplexer>(u))
        .map(|m| m.identifier)
        .collect()
}

impl Behavior for CanBehavior {
    fn can_drop_on(&self, tree: &Tree, target: &Node, source: &Node) -> bool {
        if tree.contains(source.uuid) {
            return generic_move(tree, target, source);
        }
        if is_generated(tree, target.uuid) {
            return false;
        }
        match (source.kind(), target.kind()) {
            (k, NodeKind::Message | NodeKind::Multiplexer) if k.is_parameter_like() => true,
            (k, NodeKind::MultiplexedMessage) if k.is_parameter_like() => !has_selector(tree, target),
            (NodeKind::Table, NodeKind::MultiplexedMessage) => has_selector(tree, target),
            _ => false,
        }
    }

    fn child_from(&self, tree: &Tree, target: &Node, source: &Node, lookup: &Lookup) -> Result<Subtree, PmError> {
        match source.kind() {
            k if k.is_parameter_like() => Ok(Subtree::new(signal_for(source, lookup))),
            NodeKind::Table => {
                let params = lookup.tree_of(source.uuid).ok_or(PmError::NotFound(source.uuid))?;
                let first = next_free(used_multiplexer_ids(tree, target.uuid), 1, MULTIPLEXER_ID_MAX)
                    .unwrap_or(MULTIPLEXER_ID_MAX);
                let view = CanTable {
                    name: source.name(),
                    parameter_uuid: Some(source.uuid),
                    multiplexer_range_first: first,
                    multiplexer_range_last: MULTIPLEXER_ID_MAX,
                };
                expand::seeded_view(&CanFamily, view.into(), params, source.uuid)
            }
            _ => Err(refused_drop(source, target)),
        }
    }

    fn addable_types(&self, tree: &Tree, node: &Node) -> Vec<NodeKind> {
        if is_generated(tree, node.uuid) {
            return Vec::new();
        }
        match node.kind() {
            NodeKind::CanRoot => NodeKind::CanRoot.valid_children().to_vec(),
            NodeKind::Message | NodeKind::Multiplexer => vec![NodeKind::Signal],
            NodeKind::MultiplexedMessage if has_selector(tree, node) => vec![NodeKind::Multiplexer],
            NodeKind::MultiplexedMessage => vec![NodeKind::Signal],
            _ => Vec::new(),
        }
    }

    fn new_child(&self, tree: &Tree, parent: &Node, kind: NodeKind, _lookup: &Lookup) -> Result<Subtree, PmError> {
        let used_frame_ids = || {
            tree.child_nodes(tree.root())
                .filter_map(|n| n.attr("identifier").and_then(|v| v.as_integer()))
                .collect::<Vec<_>>()
        };
        let child = match kind {
            NodeKind::Message => Subtree::new(Message {
                name: "New Message".into(),
                identifier: next_free(used_frame_ids(), 1, 0x7FF).unwrap_or(0),
                length: 8,
                sendable: true,
                receivable: true,
                ..Default::default()
            }),
            NodeKind::MultiplexedMessage => Subtree::new(MultiplexedMessage {
                name: "New Multiplexed Message".into(),
                identifier: next_free(used_frame_ids(), 1, 0x7FF).unwrap_or(0),
                length: 8,
                sendable: true,
                receivable: true,
                ..Default::default()
            }),
            NodeKind::MultiplexedMessageClone => Subtree::new(MultiplexedMessageClone {
                name: "New Clone".into(),
                identifier: next_free(used_frame_ids(), 1, 0x7FF).unwrap_or(0),
                ..Default::default()
            }),
            NodeKind::Multiplexer => Subtree::new(Multiplexer {
                name: "New Multiplexer".into(),
                identifier: next_free(used_multiplexer_ids(tree, parent.uuid), 0, MULTIPLEXER_ID_MAX)
                    .unwrap_or(0),
                length: 8,
                ..Default::default()
            }),
            NodeKind::Signal => Subtree::new(Signal {
                name: "New Signal".into(),
                factor: Decimal::ONE,
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
        // The selector signal stays while the message has multiplexed content.
        match tree.parent_node(node.uuid) {
            Some(parent) if parent.kind() == NodeKind::MultiplexedMessage && node.kind() == NodeKind::Signal => {
                !parent
                    .children
                    .iter()
                    .filter_map(|c| tree.get(*c))
                    .any(|c| matches!(c.kind(), NodeKind::Multiplexer | NodeKind::CanTable))
            }
            _ => true,
        }
    }

    fn check(&self, tree: &Tree, node: &Node, lookup: &Lookup, findings: &mut Vec<Finding>) {
        match node.kind() {
            NodeKind::Signal => check_signal(tree, node, lookup, findings),
            NodeKind::Message | NodeKind::MultiplexedMessage | NodeKind::MultiplexedMessageClone => {
                let identifier = node.attr("identifier").and_then(|v| v.as_integer());
                let duplicates = tree
                    .child_nodes(tree.root())
                    .filter(|n| n.uuid != node.uuid)
                    .filter(|n| n.attr("identifier").and_then(|v| v.as_integer()) == identifier)
                    .count();
                if duplicates > 0 {
                    findings.push(Finding::error(format!(
                        "frame identifier 0x{:X} is used by another message",
                        identifier.unwrap_or(0)
                    )));
                }
                if node.kind() == NodeKind::MultiplexedMessage {
                    let first = node.children.first().and_then(|c| tree.get(*c));
                    let multiplexed = node.children.len() > 1;
                    if multiplexed && !first.is_some_and(|f| f.kind() == NodeKind::Signal) {
                        findings.push(Finding::error("multiplexed message must start with its selector signal"));
                    }
                }
                if let Some(clone) = node.get::<MultiplexedMessageClone>() {
                    if clone.original.is_none() {
                        findings.push(Finding::warning("clone does not name a multiplexed message"));
                    }
                }
            }
            NodeKind::Multiplexer => {
                let identifier = node.attr("identifier").and_then(|v| v.as_integer());
                let message = tree
                    .ancestors(node.uuid)
                    .into_iter()
                    .find(|a| tree.get(*a).is_some_and(|n| n.kind() == NodeKind::MultiplexedMessage));
                if let Some(message) = message {
                    let clashes = tree
                        .descendants(message)
                        .into_iter()
                        .filter(|u| *u != node.uuid)
                        .filter_map(|u| tree.typed::<Multiplexer>(u))
                        .filter(|m| Some(m.identifier) == identifier)
                        .count();
                    if clashes > 0 {
                        findings.push(Finding::error("multiplexer identifier is used twice in the message"));
                    }
                }
            }
            NodeKind::CanTable => {
                if let Some(view) = node.get::<CanTable>() {
                    if view.parameter_uuid.is_none() {
                        findings.push(Finding::error("table view is not linked to a parameter table"));
                    }
                    if view.multiplexer_range_first > view.multiplexer_range_last {
                        findings.push(Finding::error("multiplexer range is empty"));
                    }
                }
            }
            _ => {}
        }
    }
}

fn check_signal(tree: &Tree, node: &Node, lookup: &Lookup, findings: &mut Vec<Finding>) {
    let Some(signal) = node.get::<Signal>() else {
        return;
    };
    let in_table_seeds = tree
        .parent_node(node.uuid)
        .is_some_and(|p| p.kind() == NodeKind::CanTable);
    if signal.bits == 0 {
        if in_table_seeds {
            findings.push(Finding::warning("reference signal has zero bits; its table leaves cannot be laid out"));
        } else {
            findings.push(Finding::warning("signal has zero bits"));
        }
    }
    if !in_table_seeds {
        if let Some(length) = frame_length(tree, node.uuid) {
            let last = signal.start_bit + signal.bits - 1;
            if signal.start_bit < 0 || signal.start_bit + signal.bits > 8 * length {
                findings.push(Finding::error(format!(
                    "signal bits [{}, {}] fall outside message bits [0, {}]",
                    signal.start_bit,
                    last,
                    8 * length - 1
                )));
            }
        }
    }
    if let Some(parameter) = signal.parameter_uuid {
        let legacy = !lookup
            .effective_attribute(parameter, "uses_interface_item")
            .and_then(|v| v.as_bool())
            .unwrap_or(true);
        if legacy && lookup.effective_attribute(parameter, "access_level_uuid").is_some_and(|v| !v.is_null()) {
            findings.push(Finding::information("signal carries a legacy parameter with an access level"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Model;
    use crate::schema::TreeKind;
    use crate::schema::kinds::parameters::Parameter;

    #[test]
    fn multiplexer_becomes_addable_after_selector() {
        let mut model = Model::empty(TreeKind::Can);
        let lookup = Lookup::default();
        let root = model.root();
        let message = crate::behavior::add_child(&mut model, &lookup, root, NodeKind::MultiplexedMessage)
            .expect("message");
        let node = model.tree().node(message).expect("node").clone();
        assert_eq!(CanBehavior.addable_types(model.tree(), &node), vec![NodeKind::Signal]);

        crate::behavior::add_child(&mut model, &lookup, message, NodeKind::Signal).expect("selector");
        let node = model.tree().node(message).expect("node").clone();
        assert_eq!(CanBehavior.addable_types(model.tree(), &node), vec![NodeKind::Multiplexer]);
    }

    #[test]
    fn selector_cannot_be_deleted_while_multiplexed() {
        let mut model = Model::empty(TreeKind::Can);
        let lookup = Lookup::default();
        let root = model.root();
        let message = crate::behavior::add_child(&mut model, &lookup, root, NodeKind::MultiplexedMessage)
            .expect("message");
        let selector = crate::behavior::add_child(&mut model, &lookup, message, NodeKind::Signal).expect("selector");
        crate::behavior::add_child(&mut model, &lookup, message, NodeKind::Multiplexer).expect("mux");
        assert!(crate::behavior::delete(&mut model, selector).is_err());
    }

    #[test]
    fn signal_outside_frame_is_flagged() {
        let mut tree = Tree::empty(TreeKind::Can);
        let root = tree.root();
        let message = tree
            .insert(
                root,
                None,
                Subtree::new(Message {
                    name: "m".into(),
                    length: 2,
                    ..Default::default()
                }),
            )
            .expect("message");
        let signal = tree
            .insert(
                message,
                None,
                Subtree::new(Signal {
                    name: "s".into(),
                    bits: 8,
                    start_bit: 12,
                    factor: Decimal::ONE,
                    ..Default::default()
                }),
            )
            .expect("signal");
        let lookup = Lookup::new([&tree]);
        let result = crate::check::check(&tree, &lookup, signal);
        assert!(result.has_errors());
        assert!(result.findings[0].message.contains("[12, 19]"));
        assert!(result.findings[0].message.contains("[0, 15]"));
    }

    #[test]
    fn dropped_parameter_copies_display_settings() {
        let mut params = Tree::empty(TreeKind::Parameters);
        let root = params.root();
        let p = params
            .insert(
                root,
                None,
                Subtree::new(Parameter {
                    name: "Mode".into(),
                    display_hexadecimal: true,
                    ..Default::default()
                }),
            )
            .expect("p");
        let lookup = Lookup::new([&params]);
        let source = params.node(p).expect("node");
        let signal = signal_for(source, &lookup);
        assert!(signal.hexadecimal_output);
        assert_eq!(signal.factor, Decimal::ONE);
        assert_eq!(signal.parameter_uuid, Some(p));
    }
}
