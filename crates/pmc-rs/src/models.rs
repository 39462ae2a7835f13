// crates/pmc-rs/src/models.rs
//! The five models of a project and cross-tree resolution.

use uuid::Uuid;

use crate::behavior;
use crate::check::{self, CheckResult};
use crate::error::PmError;
use crate::model::Model;
use crate::schema::{AttrValue, NodeKind, TreeKind};
use crate::tree::{Node, Tree};

/// Drag-and-drop payload: the dragged node's UUID as 16 raw bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DropPayload {
    pub uuid: Uuid,
}

impl DropPayload {
    pub fn new(uuid: Uuid) -> Self {
        Self { uuid }
    }

    pub fn encode(&self) -> [u8; 16] {
        *self.uuid.as_bytes()
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, PmError> {
        let raw: [u8; 16] = bytes.try_into().map_err(|_| PmError::Payload(bytes.len()))?;
        Ok(Self {
            uuid: Uuid::from_bytes(raw),
        })
    }
}

/// Longest `original` chain: table leaf, array element, parameter.
const ORIGINAL_DEPTH: usize = 4;

/// Read-only view over any subset of a project's trees, resolving UUIDs
/// across all of them.
#[derive(Debug, Clone, Default)]
pub struct Lookup<'a> {
    trees: Vec<&'a Tree>,
}

impl<'a> Lookup<'a> {
    pub fn new(trees: impl IntoIterator<Item = &'a Tree>) -> Self {
        Self {
            trees: trees.into_iter().collect(),
        }
    }

    /// A lookup over these trees plus `extra`.
    pub fn with(&self, extra: &'a Tree) -> Self {
        let mut trees = self.trees.clone();
        trees.push(extra);
        Self { trees }
    }

    pub fn tree(&self, kind: TreeKind) -> Option<&'a Tree> {
        self.trees.iter().copied().find(|t| t.kind() == kind)
    }

    pub fn parameters(&self) -> Option<&'a Tree> {
        self.tree(TreeKind::Parameters)
    }

    pub fn tree_of(&self, uuid: Uuid) -> Option<&'a Tree> {
        self.trees.iter().copied().find(|t| t.contains(uuid))
    }

    pub fn node(&self, uuid: Uuid) -> Option<&'a Node> {
        self.trees.iter().find_map(|t| t.get(uuid))
    }

    pub fn resolve(&self, uuid: Uuid) -> Result<&'a Node, PmError> {
        self.node(uuid).ok_or(PmError::NotFound(uuid))
    }

    pub fn kind_of(&self, uuid: Uuid) -> Option<NodeKind> {
        self.node(uuid).map(Node::kind)
    }

    /// The node's `name`, or an empty string when unresolved.
    pub fn name_of(&self, uuid: Uuid) -> String {
        self.node(uuid).map(Node::name).unwrap_or_default()
    }

    /// Attribute with array-element inheritance applied.
    pub fn effective_attribute(&self, uuid: Uuid, name: &str) -> Option<AttrValue> {
        self.tree_of(uuid)?.effective_attribute(uuid, name)
    }

    pub fn effective_str(&self, uuid: Uuid, name: &str) -> Option<String> {
        self.effective_attribute(uuid, name)
            .and_then(|v| v.as_str().map(str::to_string))
    }

    /// The `Parameter` a parameter-like node stands for, following
    /// `original` from table leaves and array elements.
    pub fn definition(&self, uuid: Uuid) -> Option<&'a Node> {
        let mut node = self.node(uuid)?;
        for _ in 0..ORIGINAL_DEPTH {
            match node.uuid_attr("original") {
                Some(original) if original != node.uuid => node = self.node(original)?,
                _ => return Some(node),
            }
        }
        Some(node)
    }

    /// First non-null value of `name` along the `original` chain of a
    /// parameter-like node.
    pub fn parameter_attribute(&self, uuid: Uuid, name: &str) -> Option<AttrValue> {
        let mut node = self.node(uuid)?;
        for _ in 0..ORIGINAL_DEPTH {
            if let Some(value) = node.attr(name).filter(|v| !v.is_null()) {
                return Some(value);
            }
            let original = node.uuid_attr("original").filter(|o| *o != node.uuid)?;
            node = self.node(original)?;
        }
        None
    }

    pub fn parameter_str(&self, uuid: Uuid, name: &str) -> Option<String> {
        self.parameter_attribute(uuid, name)
            .and_then(|v| v.as_str().map(str::to_string))
    }

    pub fn trees(&self) -> &[&'a Tree] {
        &self.trees
    }
}

/// The five cooperating models of a project.
#[derive(Debug)]
pub struct Models {
    pub parameters: Model,
    pub can: Model,
    pub sunspec: Model,
    pub staticmodbus: Model,
    pub anomalies: Model,
}

impl Default for Models {
    fn default() -> Self {
        Self::new()
    }
}

impl Models {
    /// Empty trees with the default drop-source registration.
    pub fn new() -> Self {
        let mut models = Self {
            parameters: Model::empty(TreeKind::Parameters),
            can: Model::empty(TreeKind::Can),
            sunspec: Model::empty(TreeKind::SunSpec),
            staticmodbus: Model::empty(TreeKind::StaticModbus),
            anomalies: Model::empty(TreeKind::Anomalies),
        };
        // Fresh v4 roots cannot collide.
        let registered = models.register_drop_sources();
        debug_assert!(registered.is_ok(), "{registered:?}");
        models
    }

    /// Registers the parameter tree as a drop source of every protocol view.
    pub fn register_drop_sources(&mut self) -> Result<(), PmError> {
        let Models {
            parameters,
            can,
            sunspec,
            staticmodbus,
            anomalies,
        } = self;
        let params = parameters.tree();
        for model in [can, sunspec, staticmodbus, anomalies] {
            model.add_drop_sources(&[params])?;
        }
        Ok(())
    }

    pub fn get(&self, kind: TreeKind) -> &Model {
        match kind {
            TreeKind::Parameters => &self.parameters,
            TreeKind::Can => &self.can,
            TreeKind::SunSpec => &self.sunspec,
            TreeKind::StaticModbus => &self.staticmodbus,
            TreeKind::Anomalies => &self.anomalies,
        }
    }

    pub fn get_mut(&mut self, kind: TreeKind) -> &mut Model {
        match kind {
            TreeKind::Parameters => &mut self.parameters,
            TreeKind::Can => &mut self.can,
            TreeKind::SunSpec => &mut self.sunspec,
            TreeKind::StaticModbus => &mut self.staticmodbus,
            TreeKind::Anomalies => &mut self.anomalies,
        }
    }

    /// Lookup over all five trees.
    pub fn lookup(&self) -> Lookup<'_> {
        Lookup::new(TreeKind::ALL.into_iter().map(|k| self.get(k).tree()))
    }

    /// Mutable access to one model and read access to the other four.
    pub fn split_mut(&mut self, target: TreeKind) -> (&mut Model, Lookup<'_>) {
        let Models {
            parameters,
            can,
            sunspec,
            staticmodbus,
            anomalies,
        } = self;
        match target {
            TreeKind::Parameters => (
                parameters,
                Lookup::new([can.tree(), sunspec.tree(), staticmodbus.tree(), anomalies.tree()]),
            ),
            TreeKind::Can => (
                can,
                Lookup::new([parameters.tree(), sunspec.tree(), staticmodbus.tree(), anomalies.tree()]),
            ),
            TreeKind::SunSpec => (
                sunspec,
                Lookup::new([parameters.tree(), can.tree(), staticmodbus.tree(), anomalies.tree()]),
            ),
            TreeKind::StaticModbus => (
                staticmodbus,
                Lookup::new([parameters.tree(), can.tree(), sunspec.tree(), anomalies.tree()]),
            ),
            TreeKind::Anomalies => (
                anomalies,
                Lookup::new([parameters.tree(), can.tree(), sunspec.tree(), staticmodbus.tree()]),
            ),
        }
    }

    pub fn node(&self, uuid: Uuid) -> Result<&Node, PmError> {
        TreeKind::ALL
            .into_iter()
            .find_map(|k| self.get(k).tree().get(uuid))
            .ok_or(PmError::NotFound(uuid))
    }

    // --- Edits that may need other trees ---

    /// Drops the node named by `payload` onto `target` in the `tree` model.
    pub fn drop(&mut self, tree: TreeKind, payload: &[u8], target: Uuid, row: Option<usize>) -> Result<Uuid, PmError> {
        let payload = DropPayload::decode(payload)?;
        let (model, lookup) = self.split_mut(tree);
        behavior::drop_on(model, &lookup, payload.uuid, target, row)
    }

    pub fn add_child(&mut self, tree: TreeKind, parent: Uuid, kind: NodeKind) -> Result<Uuid, PmError> {
        let (model, lookup) = self.split_mut(tree);
        behavior::add_child(model, &lookup, parent, kind)
    }

    pub fn delete(&mut self, tree: TreeKind, uuid: Uuid) -> Result<(), PmError> {
        behavior::delete(self.get_mut(tree), uuid)
    }

    /// Runs `check()` over every tree.
    pub fn check(&self) -> Vec<CheckResult> {
        let lookup = self.lookup();
        TreeKind::ALL
            .into_iter()
            .map(|k| {
                let tree = self.get(k).tree();
                check::check(tree, &lookup, tree.root())
            })
            .collect()
    }
}
