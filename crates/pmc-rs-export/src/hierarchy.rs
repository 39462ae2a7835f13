// crates/pmc-rs-export/src/hierarchy.rs
//! Parameter hierarchy as JSON, with each CAN-carried parameter replaced by
//! the `[message, signal]` pair carrying it.

use std::collections::HashMap;

use pmc_rs::{Models, Node, NodeKind, Tree};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::Result;
use crate::registry::{BuildContext, BuilderRegistry};

struct HierarchyContext<'a> {
    tree: &'a Tree,
    /// Parameter to `(frame, signal)` names; the first signal wins.
    signals: HashMap<Uuid, (String, String)>,
}

impl BuildContext for HierarchyContext<'_> {
    fn tree(&self) -> &Tree {
        self.tree
    }
}

type Registry<'a> = BuilderRegistry<HierarchyContext<'a>, Option<Value>>;

fn registry<'a>() -> Registry<'a> {
    let mut registry = BuilderRegistry::new("hierarchy");
    for kind in [
        NodeKind::Root,
        NodeKind::Group,
        NodeKind::Array,
        NodeKind::ArrayGroupElement,
        NodeKind::Table,
        NodeKind::TableGroupElement,
    ] {
        registry = registry.with(kind, branch);
    }
    for kind in [
        NodeKind::Parameter,
        NodeKind::ArrayParameterElement,
        NodeKind::TableArrayElement,
    ] {
        registry = registry.with(kind, leaf);
    }
    registry
        .with(NodeKind::Enumeration, skip)
        .with(NodeKind::AccessLevels, skip)
}

fn branch<'a>(ctx: &HierarchyContext<'a>, node: &Node, registry: &Registry<'a>) -> Result<Option<Value>> {
    let mut object = Map::new();
    for child in ctx.tree.child_nodes(node.uuid) {
        if let Some(value) = registry.build(ctx, child)? {
            object.insert(child.name(), value);
        }
    }
    Ok((!object.is_empty()).then_some(Value::Object(object)))
}

fn leaf<'a>(ctx: &HierarchyContext<'a>, node: &Node, _: &Registry<'a>) -> Result<Option<Value>> {
    Ok(ctx
        .signals
        .get(&node.uuid)
        .map(|(frame, signal)| Value::Array(vec![Value::from(frame.as_str()), Value::from(signal.as_str())])))
}

fn skip<'a>(_: &HierarchyContext<'a>, _: &Node, _: &Registry<'a>) -> Result<Option<Value>> {
    Ok(None)
}

fn signal_index(can: &Tree) -> HashMap<Uuid, (String, String)> {
    let mut index = HashMap::new();
    for signal in can.nodes_of_kind(NodeKind::Signal) {
        let Some(parameter) = signal.uuid_attr("parameter_uuid") else {
            continue;
        };
        let frame = can
            .ancestors(signal.uuid)
            .into_iter()
            .filter_map(|a| can.get(a))
            .find(|n| {
                matches!(
                    n.kind(),
                    NodeKind::Message | NodeKind::MultiplexedMessage | NodeKind::Multiplexer
                )
            })
            .map(Node::name)
            .unwrap_or_default();
        index.entry(parameter).or_insert((frame, signal.name()));
    }
    index
}

pub fn hierarchy(models: &Models) -> Result<Value> {
    let tree = models.parameters.tree();
    let ctx = HierarchyContext {
        tree,
        signals: signal_index(models.can.tree()),
    };
    Ok(registry()
        .build(&ctx, tree.root_node())?
        .unwrap_or_else(|| Value::Object(Map::new())))
}

/// Two-space indented JSON with a trailing newline.
pub fn export_hierarchy(models: &Models) -> Result<String> {
    let value = hierarchy(models)?;
    Ok(format!("{}\n", serde_json::to_string_pretty(&value)?))
}
