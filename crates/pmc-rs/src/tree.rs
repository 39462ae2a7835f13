// crates/pmc-rs/src/tree.rs
//! Arena-backed node tree.
//!
//! Nodes are stored in a `HashMap` keyed by UUID; parent and child links are
//! UUIDs as well, so cross-tree references never hold pointers. The map is
//! maintained by every mutation below, which keeps back-links, allowed child
//! kinds and UUID uniqueness intact.

use std::collections::{HashMap, HashSet};

use uuid::Uuid;

use crate::error::PmError;
use crate::schema::kinds::parameters::SHARED_ELEMENT_ATTRIBUTES;
use crate::schema::{AttrValue, KindData, NodeData, NodeKind, TreeKind};

/// A node stored in a [`Tree`].
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub uuid: Uuid,
    pub parent: Option<Uuid>,
    pub children: Vec<Uuid>,
    pub data: NodeData,
}

impl Node {
    pub fn kind(&self) -> NodeKind {
        self.data.kind()
    }

    /// The `name` attribute, or an empty string for kinds without one.
    pub fn name(&self) -> String {
        self.data
            .get("name")
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default()
    }

    pub fn get<T: KindData>(&self) -> Option<&T> {
        T::from_data(&self.data)
    }

    pub fn attr(&self, name: &str) -> Option<AttrValue> {
        self.data.get(name)
    }

    pub fn uuid_attr(&self, name: &str) -> Option<Uuid> {
        self.data.get(name).and_then(|v| v.as_uuid())
    }
}

/// A node and its descendants, detached from any tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Subtree {
    pub uuid: Uuid,
    pub data: NodeData,
    pub children: Vec<Subtree>,
}

impl Subtree {
    /// A new node with a fresh UUID.
    pub fn new(data: impl Into<NodeData>) -> Self {
        Self::with_uuid(Uuid::new_v4(), data)
    }

    pub fn with_uuid(uuid: Uuid, data: impl Into<NodeData>) -> Self {
        Self {
            uuid,
            data: data.into(),
            children: Vec::new(),
        }
    }

    pub fn child(mut self, child: Subtree) -> Self {
        self.children.push(child);
        self
    }

    pub fn kind(&self) -> NodeKind {
        self.data.kind()
    }

    /// All UUIDs in pre-order.
    pub fn uuids(&self) -> Vec<Uuid> {
        let mut out = vec![self.uuid];
        for child in &self.children {
            out.extend(child.uuids());
        }
        out
    }

    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(Subtree::node_count).sum::<usize>()
    }
}

/// One rooted tree of a project.
#[derive(Debug, Clone, PartialEq)]
pub struct Tree {
    kind: TreeKind,
    root: Uuid,
    nodes: HashMap<Uuid, Node>,
}

impl Tree {
    /// Builds a tree from a detached root. The root must be the tree's root
    /// kind and the whole subtree must satisfy the child-kind rules.
    pub fn new(kind: TreeKind, root: Subtree) -> Result<Self, PmError> {
        if root.kind() != kind.root_kind() {
            return Err(PmError::IllegalChild {
                parent: kind.root_kind(),
                child: root.kind(),
            });
        }
        let mut tree = Tree {
            kind,
            root: root.uuid,
            nodes: HashMap::new(),
        };
        validate_subtree(&root, &HashSet::new())?;
        tree.insert_unchecked(None, root);
        Ok(tree)
    }

    /// An empty tree holding only a default root.
    pub fn empty(kind: TreeKind) -> Self {
        let mut data = kind.root_kind().default_data();
        let _ = data.set("name", AttrValue::String(default_root_name(kind).to_string()));
        let root = Subtree::new(data);
        let uuid = root.uuid;
        let mut nodes = HashMap::new();
        nodes.insert(
            uuid,
            Node {
                uuid,
                parent: None,
                children: Vec::new(),
                data: root.data,
            },
        );
        Tree {
            kind,
            root: uuid,
            nodes,
        }
    }

    pub fn kind(&self) -> TreeKind {
        self.kind
    }

    pub fn root(&self) -> Uuid {
        self.root
    }

    pub fn root_node(&self) -> &Node {
        // The root is inserted on construction and can never be detached.
        &self.nodes[&self.root]
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn contains(&self, uuid: Uuid) -> bool {
        self.nodes.contains_key(&uuid)
    }

    pub fn get(&self, uuid: Uuid) -> Option<&Node> {
        self.nodes.get(&uuid)
    }

    pub fn node(&self, uuid: Uuid) -> Result<&Node, PmError> {
        self.nodes.get(&uuid).ok_or(PmError::NotFound(uuid))
    }

    /// Mutable access to a node's attributes. Structure is only changed
    /// through the insert/detach/move methods.
    pub fn data_mut(&mut self, uuid: Uuid) -> Result<&mut NodeData, PmError> {
        self.nodes
            .get_mut(&uuid)
            .map(|n| &mut n.data)
            .ok_or(PmError::NotFound(uuid))
    }

    pub fn typed<T: KindData>(&self, uuid: Uuid) -> Option<&T> {
        self.get(uuid).and_then(|n| n.get::<T>())
    }

    pub fn typed_mut<T: KindData>(&mut self, uuid: Uuid) -> Option<&mut T> {
        self.nodes
            .get_mut(&uuid)
            .and_then(|n| T::from_data_mut(&mut n.data))
    }

    pub fn children(&self, uuid: Uuid) -> &[Uuid] {
        self.nodes.get(&uuid).map_or(&[], |n| n.children.as_slice())
    }

    pub fn child_nodes(&self, uuid: Uuid) -> impl Iterator<Item = &Node> {
        self.children(uuid).iter().filter_map(|c| self.nodes.get(c))
    }

    pub fn parent(&self, uuid: Uuid) -> Option<Uuid> {
        self.nodes.get(&uuid).and_then(|n| n.parent)
    }

    pub fn parent_node(&self, uuid: Uuid) -> Option<&Node> {
        self.parent(uuid).and_then(|p| self.nodes.get(&p))
    }

    /// Index of `uuid` in its parent's child list.
    pub fn row(&self, uuid: Uuid) -> Option<usize> {
        let parent = self.parent(uuid)?;
        self.children(parent).iter().position(|c| *c == uuid)
    }

    /// Ancestors from the parent up to the root.
    pub fn ancestors(&self, uuid: Uuid) -> Vec<Uuid> {
        let mut out = Vec::new();
        let mut current = self.parent(uuid);
        while let Some(p) = current {
            out.push(p);
            current = self.parent(p);
        }
        out
    }

    pub fn is_ancestor(&self, ancestor: Uuid, uuid: Uuid) -> bool {
        self.ancestors(uuid).contains(&ancestor)
    }

    /// `uuid` and its descendants in pre-order.
    pub fn descendants(&self, uuid: Uuid) -> Vec<Uuid> {
        let mut out = Vec::new();
        let mut stack = vec![uuid];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.nodes.get(&current) {
                out.push(current);
                stack.extend(node.children.iter().rev());
            }
        }
        out
    }

    /// Every node in pre-order from the root.
    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.descendants(self.root)
            .into_iter()
            .filter_map(move |u| self.nodes.get(&u))
    }

    pub fn nodes_of_kind(&self, kind: NodeKind) -> impl Iterator<Item = &Node> {
        self.iter().filter(move |n| n.kind() == kind)
    }

    /// Names from the root's first child down to `uuid`.
    pub fn name_path(&self, uuid: Uuid) -> Vec<String> {
        let mut path: Vec<String> = self
            .ancestors(uuid)
            .into_iter()
            .rev()
            .skip(1)
            .filter_map(|a| self.get(a).map(Node::name))
            .collect();
        if let Some(node) = self.get(uuid) {
            if uuid != self.root {
                path.push(node.name());
            }
        }
        path
    }

    /// Copies `uuid` and its descendants out of the tree.
    pub fn subtree(&self, uuid: Uuid) -> Result<Subtree, PmError> {
        let node = self.node(uuid)?;
        let children = node
            .children
            .iter()
            .map(|c| self.subtree(*c))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Subtree {
            uuid,
            data: node.data.clone(),
            children,
        })
    }

    /// Attribute value with array-element semantics: shared attributes of an
    /// `ArrayParameterElement` resolve through its `original`.
    pub fn effective_attribute(&self, uuid: Uuid, name: &str) -> Option<AttrValue> {
        let node = self.get(uuid)?;
        if let Some(value) = node.attr(name) {
            return Some(value);
        }
        if node.kind() == NodeKind::ArrayParameterElement && SHARED_ELEMENT_ATTRIBUTES.contains(&name) {
            let original = node.uuid_attr("original")?;
            if original != uuid {
                return self.effective_attribute(original, name);
            }
        }
        None
    }

    /// Inserts `subtree` under `parent` at `row` (append when `None` or past the end).
    pub fn insert(&mut self, parent: Uuid, row: Option<usize>, subtree: Subtree) -> Result<Uuid, PmError> {
        let parent_kind = self.node(parent)?.kind();
        if !parent_kind.allows_child(subtree.kind()) {
            return Err(PmError::IllegalChild {
                parent: parent_kind,
                child: subtree.kind(),
            });
        }
        let existing: HashSet<Uuid> = self.nodes.keys().copied().collect();
        validate_subtree(&subtree, &existing)?;

        let uuid = subtree.uuid;
        self.insert_unchecked(Some(parent), subtree);
        if let Some(p) = self.nodes.get_mut(&parent) {
            let row = row.unwrap_or(p.children.len()).min(p.children.len());
            p.children.insert(row, uuid);
        }
        Ok(uuid)
    }

    /// Removes `uuid` and its descendants, returning them.
    pub fn detach(&mut self, uuid: Uuid) -> Result<Subtree, PmError> {
        if uuid == self.root {
            return Err(PmError::CannotDelete {
                uuid,
                kind: self.root_node().kind(),
            });
        }
        let subtree = self.subtree(uuid)?;
        if let Some(parent) = self.parent(uuid) {
            if let Some(p) = self.nodes.get_mut(&parent) {
                p.children.retain(|c| *c != uuid);
            }
        }
        for u in subtree.uuids() {
            self.nodes.remove(&u);
        }
        Ok(subtree)
    }

    /// Removes every child of `uuid`, returning them in order.
    pub fn detach_children(&mut self, uuid: Uuid) -> Result<Vec<Subtree>, PmError> {
        let children = self.node(uuid)?.children.clone();
        children.into_iter().map(|c| self.detach(c)).collect()
    }

    /// Moves `uuid` under `new_parent`. `row` indexes the target's child list
    /// after `uuid` has been taken out of its old position.
    pub fn move_node(&mut self, uuid: Uuid, new_parent: Uuid, row: Option<usize>) -> Result<(), PmError> {
        let kind = self.node(uuid)?.kind();
        let parent_kind = self.node(new_parent)?.kind();
        if uuid == self.root || uuid == new_parent || self.is_ancestor(uuid, new_parent) {
            return Err(PmError::consistency(format!(
                "cannot move {uuid} under itself or its descendant {new_parent}"
            )));
        }
        if !parent_kind.allows_child(kind) {
            return Err(PmError::IllegalChild {
                parent: parent_kind,
                child: kind,
            });
        }
        if let Some(old) = self.parent(uuid) {
            if let Some(p) = self.nodes.get_mut(&old) {
                p.children.retain(|c| *c != uuid);
            }
        }
        if let Some(p) = self.nodes.get_mut(&new_parent) {
            let row = row.unwrap_or(p.children.len()).min(p.children.len());
            p.children.insert(row, uuid);
        }
        if let Some(n) = self.nodes.get_mut(&uuid) {
            n.parent = Some(new_parent);
        }
        Ok(())
    }

    fn insert_unchecked(&mut self, parent: Option<Uuid>, subtree: Subtree) {
        let Subtree { uuid, data, children } = subtree;
        let child_ids = children.iter().map(|c| c.uuid).collect();
        self.nodes.insert(
            uuid,
            Node {
                uuid,
                parent,
                children: child_ids,
                data,
            },
        );
        for child in children {
            self.insert_unchecked(Some(uuid), child);
        }
    }
}

fn default_root_name(kind: TreeKind) -> &'static str {
    match kind {
        TreeKind::Parameters => "Parameters",
        TreeKind::Can => "CAN",
        TreeKind::SunSpec => "SunSpec",
        TreeKind::StaticModbus => "Static Modbus",
        TreeKind::Anomalies => "Anomalies",
    }
}

/// Checks child kinds and UUID uniqueness (within the subtree and against
/// `existing`) before anything is inserted.
fn validate_subtree(subtree: &Subtree, existing: &HashSet<Uuid>) -> Result<(), PmError> {
    let mut seen = HashSet::new();
    let mut stack = vec![subtree];
    while let Some(current) = stack.pop() {
        if existing.contains(&current.uuid) || !seen.insert(current.uuid) {
            return Err(PmError::consistency(format!(
                "uuid {} is already in use",
                current.uuid
            )));
        }
        for child in &current.children {
            if !current.kind().allows_child(child.kind()) {
                return Err(PmError::IllegalChild {
                    parent: current.kind(),
                    child: child.kind(),
                });
            }
            stack.push(child);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::kinds::parameters::{Group, Parameter, Root};

    fn param(name: &str) -> Subtree {
        Subtree::new(Parameter {
            name: name.to_string(),
            ..Default::default()
        })
    }

    fn group(name: &str) -> Subtree {
        Subtree::new(Group {
            name: name.to_string(),
            ..Default::default()
        })
    }

    #[test]
    fn insert_keeps_back_links_and_order() {
        let mut tree = Tree::empty(TreeKind::Parameters);
        let root = tree.root();
        let a = tree.insert(root, None, param("a")).expect("insert a");
        let b = tree.insert(root, Some(0), param("b")).expect("insert b");

        assert_eq!(tree.children(root), &[b, a]);
        assert_eq!(tree.parent(a), Some(root));
        assert_eq!(tree.row(a), Some(1));
    }

    #[test]
    fn insert_rejects_invalid_child_kind() {
        let mut tree = Tree::empty(TreeKind::Parameters);
        let root = tree.root();
        let p = tree.insert(root, None, param("p")).expect("insert");
        let result = tree.insert(p, None, param("q"));
        assert!(
            matches!(result, Err(PmError::IllegalChild { .. })),
            "Expected IllegalChild, got {:?}",
            result
        );
    }

    #[test]
    fn insert_rejects_duplicate_uuid_without_partial_insert() {
        let mut tree = Tree::empty(TreeKind::Parameters);
        let root = tree.root();
        let p = param("p");
        let dup = Subtree::with_uuid(p.uuid, p.data.clone());
        tree.insert(root, None, p).expect("first insert");
        let before = tree.node_count();

        let g = group("g").child(param("x")).child(dup);
        assert!(tree.insert(root, None, g).is_err());
        assert_eq!(tree.node_count(), before);
    }

    #[test]
    fn move_refuses_cycles() {
        let mut tree = Tree::empty(TreeKind::Parameters);
        let root = tree.root();
        let outer = tree.insert(root, None, group("outer")).expect("outer");
        let inner = tree.insert(outer, None, group("inner")).expect("inner");

        assert!(tree.move_node(outer, inner, None).is_err());
        tree.move_node(inner, root, Some(0)).expect("move inner up");
        assert_eq!(tree.children(root), &[inner, outer]);
        assert_eq!(tree.parent(inner), Some(root));
        assert!(tree.children(outer).is_empty());
    }

    #[test]
    fn detach_returns_whole_subtree() {
        let mut tree = Tree::empty(TreeKind::Parameters);
        let root = tree.root();
        let g = tree.insert(root, None, group("g").child(param("a")).child(param("b"))).expect("g");
        let detached = tree.detach(g).expect("detach");
        assert_eq!(detached.node_count(), 3);
        assert_eq!(tree.node_count(), 1);
        assert!(tree.detach(root).is_err());
    }

    #[test]
    fn new_requires_root_kind() {
        let result = Tree::new(TreeKind::Parameters, param("not a root"));
        assert!(result.is_err());
        let root = Subtree::new(Root {
            name: "Parameters".into(),
        });
        let tree = Tree::new(TreeKind::Parameters, root).expect("tree");
        assert_eq!(tree.root_node().name(), "Parameters");
    }

    #[test]
    fn name_path_skips_root() {
        let mut tree = Tree::empty(TreeKind::Parameters);
        let root = tree.root();
        let g = tree.insert(root, None, group("Grid")).expect("g");
        let p = tree.insert(g, None, param("Voltage")).expect("p");
        assert_eq!(tree.name_path(p), vec!["Grid".to_string(), "Voltage".to_string()]);
    }
}
