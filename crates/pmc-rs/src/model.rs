// crates/pmc-rs/src/model.rs
//! One tree plus its view adapter, drop-source registry and lookup cache.

use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;

use uuid::Uuid;

use crate::error::PmError;
use crate::json;
use crate::layout;
use crate::log::{NodeContext, pm_debug};
use crate::schema::{AttrValue, NodeKind, TreeKind};
use crate::tree::{Node, Subtree, Tree};

/// Callbacks a view attached to a model receives around each structural
/// change. All methods default to no-ops.
pub trait ViewAdapter {
    fn begin_insert_rows(&mut self, _parent: Uuid, _first: usize, _last: usize) {}
    fn end_insert_rows(&mut self) {}
    fn begin_remove_rows(&mut self, _parent: Uuid, _first: usize, _last: usize) {}
    fn end_remove_rows(&mut self) {}
    fn begin_move_rows(
        &mut self,
        _source_parent: Uuid,
        _first: usize,
        _last: usize,
        _destination_parent: Uuid,
        _destination_row: usize,
    ) {
    }
    fn end_move_rows(&mut self) {}
    fn data_changed(&mut self, _top_left: Uuid, _bottom_right: Uuid) {}
}

/// View adapter used when nothing is attached.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullView;

impl ViewAdapter for NullView {}

type AttributeCache = HashMap<String, HashMap<AttrValue, BTreeSet<Uuid>>>;

pub struct Model {
    tree: Tree,
    drop_sources: Vec<TreeKind>,
    view: Box<dyn ViewAdapter>,
    cache: RefCell<AttributeCache>,
}

impl fmt::Debug for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Model")
            .field("tree", &self.tree.kind())
            .field("nodes", &self.tree.node_count())
            .field("drop_sources", &self.drop_sources)
            .field("view", &"<View Adapter>")
            .finish()
    }
}

impl Model {
    pub fn new(tree: Tree) -> Self {
        Self {
            tree,
            drop_sources: Vec::new(),
            view: Box::new(NullView),
            cache: RefCell::new(HashMap::new()),
        }
    }

    pub fn empty(kind: TreeKind) -> Self {
        Self::new(Tree::empty(kind))
    }

    pub fn set_view(&mut self, view: Box<dyn ViewAdapter>) {
        self.view = view;
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn kind(&self) -> TreeKind {
        self.tree.kind()
    }

    pub fn root(&self) -> Uuid {
        self.tree.root()
    }

    pub fn node_from_uuid(&self, uuid: Uuid) -> Result<&Node, PmError> {
        self.tree.node(uuid)
    }

    /// UUIDs of nodes whose attribute `name` equals `value`. Results are
    /// cached per attribute name until the next mutation.
    pub fn nodes_by_attribute(&self, name: &str, value: &AttrValue) -> BTreeSet<Uuid> {
        let mut cache = self.cache.borrow_mut();
        let index = cache.entry(name.to_string()).or_insert_with(|| {
            let mut index: HashMap<AttrValue, BTreeSet<Uuid>> = HashMap::new();
            for node in self.tree.iter() {
                if let Some(v) = node.attr(name) {
                    index.entry(v).or_default().insert(node.uuid);
                }
            }
            index
        });
        index.get(value).cloned().unwrap_or_default()
    }

    /// Registers other trees whose nodes may be dropped here. Fails if any
    /// UUID is shared between this tree and the sources.
    pub fn add_drop_sources(&mut self, sources: &[&Tree]) -> Result<(), PmError> {
        let mut seen: HashSet<Uuid> = self.tree.iter().map(|n| n.uuid).collect();
        for source in sources {
            for node in source.iter() {
                if !seen.insert(node.uuid) {
                    return Err(PmError::consistency(format!(
                        "uuid {} appears in both the {} and {} trees",
                        node.uuid,
                        self.kind().name(),
                        source.kind().name()
                    )));
                }
            }
        }
        for source in sources {
            if !self.drop_sources.contains(&source.kind()) {
                self.drop_sources.push(source.kind());
            }
        }
        Ok(())
    }

    pub fn drop_sources(&self) -> &[TreeKind] {
        &self.drop_sources
    }

    pub fn accepts_drops_from(&self, tree: TreeKind) -> bool {
        tree == self.kind() || self.drop_sources.contains(&tree)
    }

    pub fn from_json_string(text: &str, kind: TreeKind, others: &[&Tree]) -> Result<Self, PmError> {
        let mut tree = json::from_json_string(text, kind, others)?;
        layout::refresh_offsets(&mut tree)?;
        Ok(Self::new(tree))
    }

    pub fn to_json_string(&self) -> Result<String, PmError> {
        json::to_json_string(&self.tree)
    }

    // --- Primitive mutations (view notifications + cache invalidation) ---

    pub(crate) fn insert_subtree(
        &mut self,
        parent: Uuid,
        row: Option<usize>,
        subtree: Subtree,
    ) -> Result<Uuid, PmError> {
        let count = self.tree.children(parent).len();
        let row = row.unwrap_or(count).min(count);
        self.tree.node(parent)?;
        self.view.begin_insert_rows(parent, row, row);
        let result = self.tree.insert(parent, Some(row), subtree);
        self.view.end_insert_rows();
        let uuid = result?;
        self.after_structure_change()?;
        Ok(uuid)
    }

    pub(crate) fn remove_subtree(&mut self, uuid: Uuid) -> Result<Subtree, PmError> {
        let parent = self
            .tree
            .parent(uuid)
            .ok_or(PmError::CannotDelete {
                uuid,
                kind: self.tree.node(uuid)?.kind(),
            })?;
        let row = self.tree.row(uuid).unwrap_or(0);
        self.view.begin_remove_rows(parent, row, row);
        let result = self.tree.detach(uuid);
        self.view.end_remove_rows();
        let subtree = result?;
        self.after_structure_change()?;
        Ok(subtree)
    }

    pub(crate) fn move_subtree(&mut self, uuid: Uuid, parent: Uuid, row: Option<usize>) -> Result<(), PmError> {
        let source_parent = self.tree.parent(uuid).ok_or(PmError::CannotDelete {
            uuid,
            kind: self.tree.node(uuid)?.kind(),
        })?;
        let source_row = self.tree.row(uuid).unwrap_or(0);
        let destination_row = row.unwrap_or(self.tree.children(parent).len());
        self.view
            .begin_move_rows(source_parent, source_row, source_row, parent, destination_row);
        let result = self.tree.move_node(uuid, parent, row);
        self.view.end_move_rows();
        result?;
        self.after_structure_change()?;
        Ok(())
    }

    /// Sets one attribute after checking it against the kind's descriptor.
    pub fn set_attribute(&mut self, uuid: Uuid, name: &str, value: AttrValue) -> Result<(), PmError> {
        let kind = self.tree.node(uuid)?.kind();
        let descriptor = kind.descriptor(name).ok_or_else(|| PmError::Attribute {
            uuid,
            source: crate::schema::AttrError::UnknownAttribute {
                kind: kind.tag(),
                name: name.to_string(),
            },
        })?;
        if !descriptor.accepts(&value) {
            return Err(PmError::Attribute {
                uuid,
                source: crate::schema::AttrError::TypeMismatch {
                    name: name.to_string(),
                    expected: descriptor.ty.name(),
                },
            });
        }
        self.tree
            .data_mut(uuid)?
            .set(name, value)
            .map_err(|source| PmError::Attribute { uuid, source })?;
        self.cache.borrow_mut().clear();
        if matches!(self.kind(), TreeKind::SunSpec | TreeKind::StaticModbus) {
            layout::update_layout(&mut self.tree)?;
        }
        self.view.data_changed(uuid, uuid);
        Ok(())
    }

    /// Sets an attribute from user-entered text (e.g. `0x1f` for hex fields).
    pub fn set_attribute_text(&mut self, uuid: Uuid, name: &str, text: &str) -> Result<(), PmError> {
        let kind = self.tree.node(uuid)?.kind();
        let descriptor = kind.descriptor(name).ok_or_else(|| PmError::Attribute {
            uuid,
            source: crate::schema::AttrError::UnknownAttribute {
                kind: kind.tag(),
                name: name.to_string(),
            },
        })?;
        let value = descriptor
            .parse_text(text)
            .map_err(|source| PmError::Attribute { uuid, source })?;
        self.set_attribute(uuid, name, value)
    }

    /// Runs `f` against a scratch copy of the tree and commits it only if `f`
    /// succeeds. The children of `scope` are reported to the view as replaced.
    pub fn transaction<R>(
        &mut self,
        scope: Uuid,
        f: impl FnOnce(&mut Tree) -> Result<R, PmError>,
    ) -> Result<R, PmError> {
        let mut scratch = self.tree.clone();
        let result = f(&mut scratch)?;

        let old_count = self.tree.children(scope).len();
        let new_count = scratch.children(scope).len();
        if old_count > 0 {
            self.view.begin_remove_rows(scope, 0, old_count - 1);
            self.view.end_remove_rows();
        }
        if new_count > 0 {
            self.view.begin_insert_rows(scope, 0, new_count - 1);
        }
        self.tree = scratch;
        if new_count > 0 {
            self.view.end_insert_rows();
        }
        self.after_structure_change()?;
        pm_debug!(
            NodeContext::new(self.kind(), self.kind().root_kind(), scope),
            "committed transaction ({} -> {} children)",
            old_count,
            new_count
        );
        Ok(result)
    }

    fn after_structure_change(&mut self) -> Result<(), PmError> {
        self.cache.borrow_mut().clear();
        if matches!(self.kind(), TreeKind::SunSpec | TreeKind::StaticModbus) {
            let root = self.root();
            layout::update_layout(&mut self.tree)?;
            self.view.data_changed(root, root);
        }
        Ok(())
    }

    /// Replaces the whole tree (used by project reload).
    pub fn replace_tree(&mut self, tree: Tree) {
        let root = self.root();
        let count = self.tree.children(root).len();
        if count > 0 {
            self.view.begin_remove_rows(root, 0, count - 1);
            self.view.end_remove_rows();
        }
        self.tree = tree;
        self.cache.borrow_mut().clear();
    }

    pub(crate) fn kind_of(&self, uuid: Uuid) -> Result<NodeKind, PmError> {
        Ok(self.tree.node(uuid)?.kind())
    }
}
