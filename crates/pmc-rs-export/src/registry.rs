// crates/pmc-rs-export/src/registry.rs
//! Kind-dispatched builder registries.
//!
//! An exporter declares one builder per node kind it understands. Building a
//! node looks its kind up and runs the builder, which may recurse into the
//! node's children through the same registry.

use std::collections::HashMap;

use pmc_rs::{Node, NodeKind, Tree};

use crate::error::{ExportError, Result};

/// Anything a builder reads the node's tree through.
pub trait BuildContext {
    fn tree(&self) -> &Tree;
}

pub type Builder<Ctx, Out> = fn(&Ctx, &Node, &BuilderRegistry<Ctx, Out>) -> Result<Out>;

pub struct BuilderRegistry<Ctx, Out> {
    name: &'static str,
    builders: HashMap<NodeKind, Builder<Ctx, Out>>,
}

impl<Ctx: BuildContext, Out> BuilderRegistry<Ctx, Out> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            builders: HashMap::new(),
        }
    }

    pub fn with(mut self, kind: NodeKind, builder: Builder<Ctx, Out>) -> Self {
        self.builders.insert(kind, builder);
        self
    }

    pub fn handles(&self, kind: NodeKind) -> bool {
        self.builders.contains_key(&kind)
    }

    pub fn build(&self, ctx: &Ctx, node: &Node) -> Result<Out> {
        let builder = self.builders.get(&node.kind()).ok_or(ExportError::NoBuilder {
            registry: self.name,
            kind: node.kind(),
        })?;
        builder(ctx, node, self)
    }

    /// Builds every child of `node` in tree order.
    pub fn build_children(&self, ctx: &Ctx, node: &Node) -> Result<Vec<Out>> {
        ctx.tree()
            .child_nodes(node.uuid)
            .map(|child| self.build(ctx, child))
            .collect()
    }

    /// Builds the children this registry has a builder for, skipping the rest.
    pub fn build_known_children(&self, ctx: &Ctx, node: &Node) -> Result<Vec<Out>> {
        ctx.tree()
            .child_nodes(node.uuid)
            .filter(|child| self.handles(child.kind()))
            .map(|child| self.build(ctx, child))
            .collect()
    }
}
