// crates/pmc-rs-export/src/c/mod.rs
//! Generated C: interface items, bitfield accessors and register tables.

pub mod bitfields;
pub mod interface;
pub mod staticmodbus;
pub mod sunspec;

use pmc_rs::{Lookup, Models, NodeKind, Tree};

use crate::error::Result;
use crate::registry::BuildContext;
use crate::templates::CFile;

/// A tree being exported and a lookup over the whole project.
pub struct CContext<'a> {
    pub tree: &'a Tree,
    pub lookup: Lookup<'a>,
}

impl BuildContext for CContext<'_> {
    fn tree(&self) -> &Tree {
        self.tree
    }
}

/// Every C file of the project, in a stable order.
pub fn generate(models: &Models) -> Result<Vec<CFile>> {
    let lookup = models.lookup();
    let mut files = Vec::new();
    files.extend(interface::generate(&lookup, models.parameters.tree())?);
    files.extend(bitfields::generate(
        &lookup,
        &[models.sunspec.tree(), models.staticmodbus.tree()],
    )?);
    let sunspec = models.sunspec.tree();
    for model in sunspec.nodes_of_kind(NodeKind::SunSpecModel) {
        files.extend(sunspec::generate(&lookup, sunspec, model)?);
    }
    files.extend(staticmodbus::generate(&lookup, models.staticmodbus.tree())?);
    Ok(files)
}

/// `NULL`, or the address of `name`.
pub(crate) fn address_or_null(name: Option<String>) -> String {
    name.map_or_else(|| "NULL".to_string(), |n| format!("&{n}"))
}
