// crates/pmc-rs-export/src/lib.rs
//! Exporters for parameter models.
//!
//! Every exporter reads a [`Models`] snapshot and never mutates it. Each
//! output is a pure function of the trees; [`export_all`] writes the full set
//! into an output directory.

pub mod c;
pub mod config;
pub mod error;
pub mod hierarchy;
pub mod names;
pub mod nested;
pub mod pmvs;
pub mod registers;
pub mod registry;
pub mod smdx;
pub mod sym;
pub mod templates;
pub mod xlsx;

use std::path::{Path, PathBuf};

use log::info;
use pmc_rs::{Models, NodeKind};
use pmc_rs_smdx::{save_smdx_to_string, smdx_file_name};

pub use config::ExportConfig;
pub use error::{ExportError, Result};
pub use nested::{Nested, format_nested_lists};
pub use registry::{BuildContext, BuilderRegistry};
pub use templates::{CFile, Templates};

pub const C_DIR: &str = "c";
pub const SYM_FILE: &str = "can.sym";
pub const HIERARCHY_FILE: &str = "hierarchy.json";
pub const SUNSPEC_BOOK: &str = "sunspec.xlsx";
pub const ANOMALIES_BOOK: &str = "anomalies.xlsx";
pub const CAN_BOOK: &str = "can.xlsx";

fn write(path: &Path, contents: &str) -> Result<PathBuf> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|e| ExportError::io(dir, e))?;
    }
    std::fs::write(path, contents).map_err(|e| ExportError::io(path, e))?;
    Ok(path.to_path_buf())
}

/// Renders and writes every generated C file into `dir`.
pub fn export_c(models: &Models, config: &ExportConfig, dir: &Path) -> Result<Vec<PathBuf>> {
    let templates = Templates::new(config.template_dir.as_deref())?;
    c::generate(models)?
        .iter()
        .map(|file| write(&dir.join(&file.name), &templates.render(file, &config.banner)?))
        .collect()
}

/// Runs every exporter and returns the paths written, in order.
///
/// Stops at the first failing exporter; files written before it stay.
pub fn export_all(models: &Models, config: &ExportConfig) -> Result<Vec<PathBuf>> {
    let out = &config.out_dir;
    std::fs::create_dir_all(out).map_err(|e| ExportError::io(out, e))?;
    let lookup = models.lookup();
    let mut written = Vec::new();

    written.extend(export_c(models, config, &out.join(C_DIR))?);
    written.push(write(&out.join(SYM_FILE), &sym::export_sym(models, &config.sym_title)?)?);
    written.push(write(&out.join(HIERARCHY_FILE), &hierarchy::export_hierarchy(models)?)?);

    let sunspec = models.sunspec.tree();
    for model in sunspec.nodes_of_kind(NodeKind::SunSpecModel) {
        let smdx = smdx::smdx_model(&lookup, sunspec, model)?;
        written.push(write(&out.join(smdx_file_name(smdx.id)), &save_smdx_to_string(&smdx)?)?);
    }

    let books = [
        (SUNSPEC_BOOK, xlsx::sunspec::sunspec_book(&lookup, sunspec)?),
        (
            ANOMALIES_BOOK,
            xlsx::anomalies::anomalies_book(&lookup, models.anomalies.tree()),
        ),
        (CAN_BOOK, {
            let products = match &config.pmvs_dir {
                Some(dir) => pmvs::load_products(dir)?,
                None => Vec::new(),
            };
            xlsx::can::can_book(&lookup, models.can.tree(), &products)
        }),
    ];
    for (name, book) in books {
        let path = out.join(name);
        book.save(&path)?;
        written.push(path);
    }

    info!("Exported {} files to {}", written.len(), out.display());
    Ok(written)
}
