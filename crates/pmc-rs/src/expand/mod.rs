// crates/pmc-rs/src/expand/mod.rs
//! Table expansion.
//!
//! A parameter `Table` is first expanded in the parameter tree
//! ([`expand_parameter_table`]) into `TableGroupElement`/`TableArrayElement`
//! nodes. Each protocol view linked to the table (`CanTable`, SunSpec or
//! Modbus table) is then rebuilt from those leaves by [`expand_view`].
//! Both passes keep the UUIDs of nodes whose path already existed, so
//! expanding twice changes nothing.

pub mod can;
pub mod engine;
pub mod order;
pub mod shape;
pub mod staticmodbus;
pub mod sunspec;
pub mod table;

use uuid::Uuid;

use crate::error::PmError;
use crate::log::{NodeContext, pm_info};
use crate::models::Models;
use crate::schema::{NodeData, NodeKind, TreeKind};
use crate::tree::{Subtree, Tree};

pub use engine::ViewFamily;
pub use order::LeafOrder;
pub use shape::{Leaf, LeafGroup, SeedSource, Shape, seed_sources, table_shape};
pub use table::expand_parameter_table;

/// What to do when a leaf's reference signal has zero bits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ZeroBitsPolicy {
    /// Fail the expansion before touching the view.
    #[default]
    Abort,
    /// Skip the leaves of that reference and warn once per reference.
    SkipAndWarn,
}

#[derive(Debug, Clone, Default)]
pub struct ExpandOptions {
    pub zero_bits: ZeroBitsPolicy,
    pub leaf_order: LeafOrder,
}

impl ExpandOptions {
    /// Default policy with the embedded leaf-order overrides.
    pub fn with_embedded_order() -> Result<Self, PmError> {
        Ok(Self {
            leaf_order: LeafOrder::embedded()?,
            ..Default::default()
        })
    }
}

/// Outcome of one expansion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpansionReport {
    /// The expanded table or view node.
    pub view: Uuid,
    pub created: usize,
    pub reused: usize,
    pub removed: usize,
    /// References whose leaves were skipped.
    pub skipped_seeds: Vec<Uuid>,
}

/// A new view node for `table`, holding one reference point per seed source.
pub fn seeded_view<F: ViewFamily>(family: &F, view: NodeData, params: &Tree, table: Uuid) -> Result<Subtree, PmError> {
    let seeds = seed_sources(params, table)?;
    Ok(engine::seeded(family, view, &seeds))
}

fn view_kind(tree: TreeKind) -> Result<NodeKind, PmError> {
    match tree {
        TreeKind::Can => Ok(NodeKind::CanTable),
        TreeKind::SunSpec => Ok(NodeKind::SunSpecTable),
        TreeKind::StaticModbus => Ok(NodeKind::ModbusTable),
        other => Err(PmError::consistency(format!("the {} tree has no table views", other.name()))),
    }
}

/// The parameter table a view node is linked to.
fn linked_table(models: &Models, tree: TreeKind, view: Uuid) -> Result<Option<Uuid>, PmError> {
    let data = &models.get(tree).tree().node(view)?.data;
    Ok(match tree {
        TreeKind::Can => can::CanFamily.table_of(data),
        TreeKind::SunSpec => sunspec::SunSpecFamily.table_of(data),
        TreeKind::StaticModbus => staticmodbus::ModbusFamily.table_of(data),
        _ => None,
    })
}

fn run_family<F: ViewFamily>(
    family: &F,
    models: &mut Models,
    tree: TreeKind,
    view: Uuid,
    table: Uuid,
    options: &ExpandOptions,
) -> Result<ExpansionReport, PmError> {
    let (model, lookup) = models.split_mut(tree);
    let params = lookup
        .parameters()
        .ok_or_else(|| PmError::consistency("no parameter tree to expand from"))?;
    let shape = table_shape(params, table, &options.leaf_order)?;
    model.transaction(view, |scratch| engine::run(family, scratch, view, &shape, options))
}

/// Rebuilds the view `view` of `tree` from its parameter table. When `table`
/// is given it must match the table the view is linked to.
pub fn expand_view(
    models: &mut Models,
    tree: TreeKind,
    view: Uuid,
    table: Option<Uuid>,
    options: &ExpandOptions,
) -> Result<ExpansionReport, PmError> {
    view_kind(tree)?;
    let linked = linked_table(models, tree, view)?;
    let table = match (table, linked) {
        (Some(given), Some(linked)) if given != linked => {
            return Err(PmError::consistency(format!(
                "table {given} does not match the view's parameter table {linked}"
            )));
        }
        (Some(given), _) => given,
        (None, Some(linked)) => linked,
        (None, None) => {
            return Err(PmError::consistency(format!("view {view} is not linked to a parameter table")));
        }
    };
    let report = match tree {
        TreeKind::Can => run_family(&can::CanFamily, models, tree, view, table, options)?,
        TreeKind::SunSpec => run_family(&sunspec::SunSpecFamily, models, tree, view, table, options)?,
        _ => run_family(&staticmodbus::ModbusFamily, models, tree, view, table, options)?,
    };
    let ctx = NodeContext::new(tree, models.get(tree).tree().node(view)?.kind(), view);
    pm_info!(
        ctx,
        "expanded view: {} created, {} reused, {} removed",
        report.created,
        report.reused,
        report.removed
    );
    Ok(report)
}

/// Brings a view's reference points in line with its table's arrays and
/// group parameters, leaving generated groups alone. Never fails on zero bits.
pub fn sync_seeds(models: &mut Models, tree: TreeKind, view: Uuid) -> Result<(), PmError> {
    view_kind(tree)?;
    let table = linked_table(models, tree, view)?
        .ok_or_else(|| PmError::consistency(format!("view {view} is not linked to a parameter table")))?;
    let (model, lookup) = models.split_mut(tree);
    let params = lookup
        .parameters()
        .ok_or_else(|| PmError::consistency("no parameter tree to expand from"))?;
    let seeds = seed_sources(params, table)?;
    model.transaction(view, |scratch| match tree {
        TreeKind::Can => engine::sync(&can::CanFamily, scratch, view, &seeds),
        TreeKind::SunSpec => engine::sync(&sunspec::SunSpecFamily, scratch, view, &seeds),
        _ => engine::sync(&staticmodbus::ModbusFamily, scratch, view, &seeds),
    })
}

/// Expands every parameter table, then every view linked to a table.
pub fn expand_all(models: &mut Models, options: &ExpandOptions) -> Result<Vec<ExpansionReport>, PmError> {
    let mut reports = Vec::new();
    let tables: Vec<Uuid> = models
        .parameters
        .tree()
        .nodes_of_kind(NodeKind::Table)
        .map(|n| n.uuid)
        .collect();
    for table in tables {
        reports.push(expand_parameter_table(&mut models.parameters, table)?);
    }
    for tree in [TreeKind::Can, TreeKind::SunSpec, TreeKind::StaticModbus] {
        let kind = view_kind(tree)?;
        let views: Vec<Uuid> = models.get(tree).tree().nodes_of_kind(kind).map(|n| n.uuid).collect();
        for view in views {
            reports.push(expand_view(models, tree, view, None, options)?);
        }
    }
    Ok(reports)
}
