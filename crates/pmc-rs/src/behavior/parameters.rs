// crates/pmc-rs/src/behavior/parameters.rs
//! Parameter tree: arrays, groups, tables and enumerations.

use uuid::Uuid;

use super::{Behavior, generic_move, is_generated};
use crate::check::Finding;
use crate::error::PmError;
use crate::model::Model;
use crate::models::Lookup;
use crate::schema::kinds::parameters::{
    AccessLevels, Array, ArrayGroupElement, ArrayParameterElement, Enumeration, Enumerator, Group,
    Parameter, Table,
};
use crate::schema::{AttrValue, NodeKind};
use crate::tree::{Node, Subtree, Tree};

pub struct ParameterBehavior;

impl Behavior for ParameterBehavior {
    fn can_drop_on(&self, tree: &Tree, target: &Node, source: &Node) -> bool {
        generic_move(tree, target, source)
    }

    fn child_from(&self, _tree: &Tree, target: &Node, source: &Node, _lookup: &Lookup) -> Result<Subtree, PmError> {
        Err(super::refused_drop(source, target))
    }

    fn addable_types(&self, tree: &Tree, node: &Node) -> Vec<NodeKind> {
        if is_generated(tree, node.uuid) {
            return Vec::new();
        }
        match node.kind() {
            NodeKind::Root => NodeKind::Root.valid_children().to_vec(),
            NodeKind::Group if is_first_array_group(tree, node.uuid) => vec![NodeKind::Parameter],
            NodeKind::Group => NodeKind::Group.valid_children().to_vec(),
            NodeKind::Array if node.children.is_empty() => vec![NodeKind::Parameter, NodeKind::Group],
            NodeKind::Table => vec![NodeKind::Enumeration, NodeKind::Array, NodeKind::Group],
            NodeKind::Enumeration | NodeKind::AccessLevels => vec![NodeKind::Enumerator],
            _ => Vec::new(),
        }
    }

    fn new_child(&self, tree: &Tree, parent: &Node, kind: NodeKind, _lookup: &Lookup) -> Result<Subtree, PmError> {
        let child = match kind {
            NodeKind::Group => Subtree::new(Group {
                name: "New Group".into(),
                ..Default::default()
            }),
            NodeKind::Parameter => Subtree::new(Parameter {
                name: "New Parameter".into(),
                uses_interface_item: true,
                ..Default::default()
            }),
            NodeKind::Array => Subtree::new(Array {
                name: "New Array".into(),
                ..Default::default()
            }),
            NodeKind::Table => Subtree::new(Table {
                name: "New Table".into(),
            }),
            NodeKind::Enumeration => Subtree::new(Enumeration {
                name: "New Enumeration".into(),
            }),
            NodeKind::AccessLevels => Subtree::new(AccessLevels {
                name: "Access Levels".into(),
                ..Default::default()
            }),
            NodeKind::Enumerator => {
                let value = tree
                    .child_nodes(parent.uuid)
                    .filter_map(|n| n.get::<Enumerator>())
                    .map(|e| e.value + 1)
                    .max()
                    .unwrap_or(0);
                Subtree::new(Enumerator {
                    name: "New Enumerator".into(),
                    value,
                    ..Default::default()
                })
            }
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
        match tree.parent_node(node.uuid) {
            // Only the last element; the first goes only when it is alone.
            Some(parent) if parent.kind() == NodeKind::Array => parent.children.last() == Some(&node.uuid),
            _ => true,
        }
    }

    fn check(&self, tree: &Tree, node: &Node, lookup: &Lookup, findings: &mut Vec<Finding>) {
        match node.kind() {
            NodeKind::Parameter => check_parameter(node, lookup, findings),
            NodeKind::Array => check_array(tree, node, findings),
            NodeKind::Enumeration | NodeKind::AccessLevels => check_enumeration(tree, node, findings),
            NodeKind::Table => check_table(tree, node, findings),
            NodeKind::TableArrayElement => {
                if let Some(original) = node.uuid_attr("original") {
                    let legacy = !lookup
                        .effective_attribute(original, "uses_interface_item")
                        .and_then(|v| v.as_bool())
                        .unwrap_or(true);
                    if legacy && node.uuid_attr("access_level_uuid").is_some() {
                        findings.push(Finding::warning(
                            "access level will not be enforced on a legacy parameter",
                        ));
                    }
                }
            }
            _ => {}
        }
    }
}

fn check_parameter(node: &Node, lookup: &Lookup, findings: &mut Vec<Finding>) {
    let Some(p) = node.get::<Parameter>() else {
        return;
    };
    if let (Some(min), Some(max)) = (p.minimum, p.maximum) {
        if min > max {
            findings.push(Finding::error(format!("minimum {min} is greater than maximum {max}")));
        }
    }
    if let Some(default) = p.default {
        let below = p.minimum.is_some_and(|min| default < min);
        let above = p.maximum.is_some_and(|max| default > max);
        if below || above {
            findings.push(Finding::warning(format!("default {default} is outside the parameter range")));
        }
    }
    if !p.uses_interface_item && p.access_level_uuid.is_some() {
        findings.push(Finding::warning(
            "access level will not be enforced on a legacy parameter",
        ));
    }
    if !p.uses_interface_item && p.getter_function.is_none() && p.internal_variable.is_none() {
        findings.push(Finding::information(
            "legacy parameter has neither a getter function nor an internal variable",
        ));
    }
    if let Some(enumeration) = p.enumeration_uuid {
        if lookup.node(enumeration).is_some_and(|e| e.children.is_empty()) {
            findings.push(Finding::warning("enumeration has no enumerators"));
        }
    }
}

fn check_array(tree: &Tree, node: &Node, findings: &mut Vec<Finding>) {
    let Some(array) = node.get::<Array>() else {
        return;
    };
    if node.children.len() as i64 != array.length {
        findings.push(Finding::error(format!(
            "array length is {} but it has {} elements",
            array.length,
            node.children.len()
        )));
    }
    let Some(first) = node.children.first().and_then(|f| tree.get(*f)) else {
        return;
    };
    let element_kind = match first.kind() {
        NodeKind::Parameter => NodeKind::ArrayParameterElement,
        NodeKind::Group => NodeKind::ArrayGroupElement,
        other => {
            findings.push(Finding::error(format!("{} cannot be an array's first element", other.tag())));
            return;
        }
    };
    for element in node.children.iter().skip(1).filter_map(|e| tree.get(*e)) {
        if element.kind() != element_kind {
            findings.push(Finding::error(format!(
                "element {} is a {}, expected {}",
                element.uuid,
                element.kind().tag(),
                element_kind.tag()
            )));
        } else if element.uuid_attr("original") != Some(first.uuid) {
            findings.push(Finding::error(format!(
                "element {} does not refer to the first element",
                element.uuid
            )));
        }
    }
}

fn check_enumeration(tree: &Tree, node: &Node, findings: &mut Vec<Finding>) {
    let mut seen = std::collections::HashMap::new();
    for e in tree.child_nodes(node.uuid) {
        if let Some(enumerator) = e.get::<Enumerator>() {
            if let Some(previous) = seen.insert(enumerator.value, enumerator.name.clone()) {
                findings.push(Finding::warning(format!(
                    "enumerators {previous} and {} share value {}",
                    enumerator.name, enumerator.value
                )));
            }
        }
    }
}

fn check_table(tree: &Tree, node: &Node, findings: &mut Vec<Finding>) {
    let kinds: Vec<NodeKind> = tree.child_nodes(node.uuid).map(Node::kind).collect();
    if !kinds.contains(&NodeKind::Enumeration) {
        findings.push(Finding::warning("table has no axis enumerations"));
    }
    if !kinds.iter().any(|k| matches!(k, NodeKind::Array | NodeKind::Group)) {
        findings.push(Finding::warning("table has no arrays or groups"));
    }
    if !kinds.contains(&NodeKind::TableGroupElement) {
        findings.push(Finding::information("table has not been expanded"));
    }
}

// --- Arrays ---

/// Whether `uuid` is the first element of an array of groups.
pub(crate) fn is_first_array_group(tree: &Tree, uuid: Uuid) -> bool {
    tree.parent_node(uuid)
        .is_some_and(|p| p.kind() == NodeKind::Array && p.children.first() == Some(&uuid))
}

/// Name of element `index`: the array's named enumerator when present,
/// otherwise the first element's name suffixed with the index.
fn element_name(tree: &Tree, array: &Array, first: &Node, index: usize) -> String {
    array
        .named_enumerators_uuid
        .and_then(|e| tree.children(e).get(index).copied())
        .and_then(|e| tree.get(e))
        .map(Node::name)
        .unwrap_or_else(|| format!("{}{}", first.name(), index))
}

fn new_element(tree: &Tree, array: &Array, first: &Node, index: usize) -> Subtree {
    let name = element_name(tree, array, first, index);
    if first.kind() == NodeKind::Group {
        let mut element = Subtree::new(ArrayGroupElement {
            name,
            original: Some(first.uuid),
        });
        for member in tree.child_nodes(first.uuid).filter(|m| m.kind() == NodeKind::Parameter) {
            element = element.child(mirror_parameter(member));
        }
        element
    } else {
        Subtree::new(ArrayParameterElement {
            name,
            original: Some(first.uuid),
            ..Default::default()
        })
    }
}

fn mirror_parameter(parameter: &Node) -> Subtree {
    Subtree::new(ArrayParameterElement {
        name: parameter.name(),
        abbreviation: parameter.get::<Parameter>().and_then(|p| p.abbreviation.clone()),
        original: Some(parameter.uuid),
        ..Default::default()
    })
}

/// Grows or shrinks an array to `length` elements. Growing needs a first
/// element to copy from; shrinking removes elements from the end.
pub fn set_array_length(model: &mut Model, array_uuid: Uuid, length: usize) -> Result<(), PmError> {
    let array = model
        .tree()
        .typed::<Array>(array_uuid)
        .cloned()
        .ok_or(PmError::NotFound(array_uuid))?;
    model.transaction(array_uuid, |tree| {
        let children = tree.children(array_uuid).to_vec();
        if length < children.len() {
            for element in children.iter().skip(length).rev() {
                tree.detach(*element)?;
            }
        } else if length > children.len() {
            let first = children
                .first()
                .and_then(|f| tree.get(*f))
                .cloned()
                .ok_or_else(|| PmError::consistency("array has no first element to copy"))?;
            for index in children.len()..length {
                let element = new_element(tree, &array, &first, index);
                tree.insert(array_uuid, None, element)?;
            }
        }
        if let Some(a) = tree.typed_mut::<Array>(array_uuid) {
            a.length = length as i64;
        }
        Ok(())
    })
}

/// Inserts `child` under `parent`, keeping arrays consistent: the first
/// element of an empty array sets its length to one, and a parameter added
/// to an array's first group is mirrored into every other group element.
pub(crate) fn add_with_propagation(model: &mut Model, parent: Uuid, child: Subtree) -> Result<Uuid, PmError> {
    let tree = model.tree();
    let parent_kind = tree.node(parent)?.kind();
    let mirrored = is_first_array_group(tree, parent) && child.kind() == NodeKind::Parameter;
    if parent_kind != NodeKind::Array && !mirrored {
        return model.insert_subtree(parent, None, child);
    }
    let scope = tree.parent(parent).filter(|_| mirrored).unwrap_or(parent);
    let uuid = child.uuid;
    model.transaction(scope, |tree| {
        tree.insert(parent, None, child)?;
        if parent_kind == NodeKind::Array {
            let count = tree.children(parent).len() as i64;
            if let Some(a) = tree.typed_mut::<Array>(parent) {
                a.length = count;
            }
        } else {
            let parameter = tree.node(uuid)?.clone();
            let elements: Vec<Uuid> = tree.children(scope).iter().skip(1).copied().collect();
            for element in elements {
                tree.insert(element, None, mirror_parameter(&parameter))?;
            }
        }
        Ok(uuid)
    })
}

/// Removes `uuid`, along with its mirrors when it is a member of an array's
/// first group, and fixes the array length when it was an element.
pub(crate) fn delete_with_propagation(model: &mut Model, uuid: Uuid) -> Result<(), PmError> {
    let tree = model.tree();
    let parent = tree.parent(uuid).ok_or(PmError::NotFound(uuid))?;
    let parent_kind = tree.node(parent)?.kind();
    let mirrored = is_first_array_group(tree, parent);
    if parent_kind != NodeKind::Array && !mirrored {
        return model.remove_subtree(uuid).map(|_| ());
    }
    let scope = if mirrored { tree.parent(parent).unwrap_or(parent) } else { parent };
    model.transaction(scope, |tree| {
        if mirrored {
            let mirrors: Vec<Uuid> = tree
                .descendants(scope)
                .into_iter()
                .filter(|m| {
                    tree.get(*m).is_some_and(|n| {
                        n.kind() == NodeKind::ArrayParameterElement
                            && n.uuid_attr("original") == Some(uuid)
                    })
                })
                .collect();
            for mirror in mirrors {
                tree.detach(mirror)?;
            }
        }
        tree.detach(uuid)?;
        if parent_kind == NodeKind::Array {
            let count = tree.children(parent).len() as i64;
            if let Some(a) = tree.typed_mut::<Array>(parent) {
                a.length = count;
            }
        }
        Ok(())
    })
}

/// Sets an attribute, also renaming mirrors when a first-group member is renamed.
pub fn rename(model: &mut Model, uuid: Uuid, name: &str) -> Result<(), PmError> {
    model.set_attribute(uuid, "name", AttrValue::from(name))?;
    let mirrors: Vec<Uuid> = model
        .tree()
        .nodes_of_kind(NodeKind::ArrayParameterElement)
        .filter(|n| n.uuid_attr("original") == Some(uuid))
        .filter(|n| {
            model
                .tree()
                .parent_node(n.uuid)
                .is_some_and(|p| p.kind() == NodeKind::ArrayGroupElement)
        })
        .map(|n| n.uuid)
        .collect();
    for mirror in mirrors {
        model.set_attribute(mirror, "name", AttrValue::from(name))?;
    }
    Ok(())
}
